// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook normalization and reconciliation for Courier.
//!
//! Inbound provider events flow through [`pipeline::WebhookPipeline`]:
//! ledger append, [`classifier`], [`projector`] (using [`timestamp`]),
//! store write, ledger annotation. [`outbound::OutboundService`] records
//! accepted outbound sends into the same history.

pub mod classifier;
pub mod outbound;
pub mod pipeline;
pub mod projector;
pub mod timestamp;

pub use classifier::classify;
pub use outbound::OutboundService;
pub use pipeline::{IngestReport, WebhookPipeline, bounded};
pub use projector::{Projection, RecordOperation, project};
pub use timestamp::{IntoEpochMillis, NormalizedTimestamp, TimestampSource, normalize};
