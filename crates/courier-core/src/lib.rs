// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier webhook service.
//!
//! This crate provides the canonical message types, the error taxonomy, and
//! the adapter traits that the storage backend and the outbound messaging
//! client implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CourierError;
pub use types::{
    AdapterType, Attachment, Direction, EventKind, HealthStatus, LedgerEntry, MediaInfo,
    MessageKind, MessagePatch, MessageRecord, MessageStatus, ProcessingOutcome,
    ProcessingResult, SortOrder,
};

pub use traits::{MessageStore, OutboundSender, PluginAdapter, StorageAdapter, WebhookLedger};
