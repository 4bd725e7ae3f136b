// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound messaging API seam.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{SendReceipt, SessionMessageRequest, TemplateMessageRequest};

/// Sends messages through the third-party messaging provider.
///
/// Calls are synchronous from the caller's perspective: a returned
/// [`SendReceipt`] means the provider accepted the message.
#[async_trait]
pub trait OutboundSender: PluginAdapter {
    /// Sends a free-form session message.
    async fn send_session_message(
        &self,
        request: &SessionMessageRequest,
    ) -> Result<SendReceipt, CourierError>;

    /// Sends a pre-approved template message.
    async fn send_template_message(
        &self,
        request: &TemplateMessageRequest,
    ) -> Result<SendReceipt, CourierError>;
}
