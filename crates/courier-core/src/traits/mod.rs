// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for Courier's external collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod sender;
pub mod storage;

pub use adapter::PluginAdapter;
pub use sender::OutboundSender;
pub use storage::{MessageStore, StorageAdapter, WebhookLedger};
