// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the provider's send-message API.
//!
//! Provides [`ProviderClient`], which builds authenticated requests against a
//! tenant base URL and turns replies into [`SendResponse`]s or
//! [`CourierError::OutboundSendFailed`].

use std::time::Duration;

use courier_core::CourierError;
use courier_core::types::{SessionMessageRequest, TemplateMessageRequest};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::types::{SendResponse, TemplateMessageBody};

/// HTTP client for provider API communication.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ProviderClient {
    /// Creates a client for the tenant at `base_url`, authenticating with `api_token`.
    pub fn new(base_url: &str, api_token: &str, timeout: Duration) -> Result<Self, CourierError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| CourierError::Config(format!("invalid provider base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CourierError::Config(format!(
                "provider base URL {base_url} cannot carry a path"
            )));
        }

        let token = api_token.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| CourierError::Config(format!("invalid API token header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| CourierError::OutboundSendFailed {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                detail: None,
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /api/v1/sendSessionMessage/{waId}?messageText=...`
    pub async fn send_session(
        &self,
        request: &SessionMessageRequest,
    ) -> Result<SendResponse, CourierError> {
        let mut url = self.endpoint(&["api", "v1", "sendSessionMessage", &request.wa_id])?;
        url.query_pairs_mut().append_pair("messageText", &request.text);
        self.execute(self.client.post(url), "session").await
    }

    /// `POST /api/v1/sendTemplateMessage?whatsappNumber=...` with a JSON body.
    pub async fn send_template(
        &self,
        request: &TemplateMessageRequest,
    ) -> Result<SendResponse, CourierError> {
        let mut url = self.endpoint(&["api", "v1", "sendTemplateMessage"])?;
        url.query_pairs_mut().append_pair("whatsappNumber", &request.wa_id);
        let body = TemplateMessageBody {
            template_name: &request.template_name,
            broadcast_name: &request.broadcast_name,
            parameters: &request.parameters,
        };
        self.execute(self.client.post(url).json(&body), "template").await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CourierError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CourierError::Config("provider base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        kind: &str,
    ) -> Result<SendResponse, CourierError> {
        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!(kind, status = %status, "provider response received");

        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        let reply = SendResponse { body };

        if !status.is_success() {
            return Err(CourierError::OutboundSendFailed {
                message: format!("provider returned {status} for {kind} send"),
                status: Some(status.as_u16()),
                detail: Some(reply.detail()),
            });
        }
        if !reply.accepted() {
            return Err(CourierError::OutboundSendFailed {
                message: format!("provider rejected {kind} send"),
                status: Some(status.as_u16()),
                detail: Some(reply.detail()),
            });
        }
        Ok(reply)
    }

    fn transport_error(&self, e: reqwest::Error) -> CourierError {
        if e.is_timeout() {
            return CourierError::Timeout {
                duration: self.timeout,
            };
        }
        CourierError::OutboundSendFailed {
            message: format!("HTTP request failed: {e}"),
            status: None,
            detail: None,
        }
    }
}
