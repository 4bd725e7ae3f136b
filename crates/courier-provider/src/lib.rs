// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging provider adapter for Courier.
//!
//! This crate implements [`OutboundSender`] for the provider's HTTP
//! send-message API: free-form session messages and pre-approved templates.

pub mod client;
pub mod types;

use async_trait::async_trait;
use courier_config::model::ProviderConfig;
use courier_core::traits::{OutboundSender, PluginAdapter};
use courier_core::types::{
    AdapterType, HealthStatus, SendReceipt, SessionMessageRequest, TemplateMessageRequest,
};
use courier_core::CourierError;
use tracing::info;

pub use crate::client::ProviderClient;
use crate::types::SendResponse;

/// Provider sender implementing [`OutboundSender`].
pub struct ProviderSender {
    client: ProviderClient,
}

impl ProviderSender {
    /// Creates a sender from validated provider configuration.
    ///
    /// Fails with [`CourierError::Config`] when the base URL or token is absent.
    pub fn new(config: &ProviderConfig) -> Result<Self, CourierError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| CourierError::Config("provider.base_url is not set".into()))?;
        let api_token = config
            .api_token
            .as_deref()
            .ok_or_else(|| CourierError::Config("provider.api_token is not set".into()))?;
        let client = ProviderClient::new(base_url, api_token, config.call_timeout())?;
        info!(base_url = %client.base_url(), "provider sender initialized");
        Ok(Self { client })
    }

    pub fn from_client(client: ProviderClient) -> Self {
        Self { client }
    }
}

fn receipt(reply: SendResponse) -> SendReceipt {
    SendReceipt {
        message_id: reply.message_id(),
        raw: reply.body,
    }
}

#[async_trait]
impl PluginAdapter for ProviderSender {
    fn name(&self) -> &str {
        "provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Sender
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        Ok(())
    }
}

#[async_trait]
impl OutboundSender for ProviderSender {
    async fn send_session_message(
        &self,
        request: &SessionMessageRequest,
    ) -> Result<SendReceipt, CourierError> {
        self.client.send_session(request).await.map(receipt)
    }

    async fn send_template_message(
        &self,
        request: &TemplateMessageRequest,
    ) -> Result<SendReceipt, CourierError> {
        self.client.send_template(request).await.map(receipt)
    }
}
