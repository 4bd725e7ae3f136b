// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier webhook service.

use thiserror::Error;

/// The primary error type used across all Courier adapter traits and core operations.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A partial update addressed a document that does not exist.
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// The composite filter+sort capability is not available (index missing or building).
    #[error("index {index} is unavailable")]
    IndexUnavailable { index: String },

    /// An inbound event lacks fields required by its classified kind.
    #[error("malformed {kind} event: {reason}")]
    MalformedEvent { kind: String, reason: String },

    /// The outbound messaging API rejected or failed a send.
    #[error("outbound send failed: {message}")]
    OutboundSendFailed {
        message: String,
        /// HTTP status returned by the provider, if a response was received.
        status: Option<u16>,
        /// Provider-supplied error detail.
        detail: Option<String>,
    },

    /// A collaborator call exceeded its bound.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        CourierError::Storage { source: err.into() }
    }

    /// Returns true when the failure must surface as a 500 to the HTTP caller.
    ///
    /// Malformed events and missing update targets are acknowledged to the
    /// provider instead, so they report false.
    pub fn is_transport_failure(&self) -> bool {
        !matches!(
            self,
            CourierError::MalformedEvent { .. }
                | CourierError::NotFound { .. }
                | CourierError::IndexUnavailable { .. }
        )
    }
}
