//! HTTP webhook sink.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

use super::{DeliveryResult, NotificationSink, SuccessPolicy};

/// Default connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default overall request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Webhook payload: the message is the only field.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts `{"content": message}` to the destination URL.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: Client,
    policy: SuccessPolicy,
}

impl WebhookSink {
    /// Create a sink with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(policy: SuccessPolicy) -> Result<Self, reqwest::Error> {
        Self::with_timeouts(policy, CONNECT_TIMEOUT, REQUEST_TIMEOUT)
    }

    /// Create a sink with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeouts(
        policy: SuccessPolicy,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, policy })
    }

    #[must_use]
    pub fn policy(&self) -> SuccessPolicy {
        self.policy
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, destination: &Url, message: &str) -> DeliveryResult {
        let response = match self
            .client
            .post(destination.clone())
            .json(&WebhookPayload { content: message })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %destination, error = %e, "Webhook request failed");
                return DeliveryResult::TransportFailure(e.to_string());
            }
        };

        let status = response.status().as_u16();
        if self.policy.is_success(status) {
            return DeliveryResult::Delivered { status };
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(url = %destination, status, "Webhook rejected message");
        DeliveryResult::Rejected { status, body }
    }
}
