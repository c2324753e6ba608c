//! Notification delivery to webhook endpoints.
//!
//! Delivery is best effort: no retries, no queueing. Every outcome,
//! including transport failures, comes back as a [`DeliveryResult`] value.

mod webhook;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

pub use webhook::WebhookSink;

/// Which HTTP statuses count as a successful delivery.
///
/// 204 is a success under every policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuccessPolicy {
    /// Only 204 No Content.
    #[default]
    Strict,
    /// 200 OK or 204 No Content.
    Lenient,
}

impl SuccessPolicy {
    #[must_use]
    pub fn is_success(self, status: u16) -> bool {
        match self {
            Self::Strict => status == 204,
            Self::Lenient => matches!(status, 200 | 204),
        }
    }
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    /// The endpoint accepted the message.
    Delivered { status: u16 },
    /// The endpoint answered with a non-success status.
    Rejected { status: u16, body: String },
    /// The request never got an answer.
    TransportFailure(String),
}

impl DeliveryResult {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

impl fmt::Display for DeliveryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered { status } => write!(f, "delivered ({status})"),
            Self::Rejected { status, body } => write!(f, "rejected ({status}): {body}"),
            Self::TransportFailure(error) => write!(f, "transport failure: {error}"),
        }
    }
}

/// Something that can deliver a rendered message to a destination.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver `message` to `destination`. Must not panic.
    async fn deliver(&self, destination: &Url, message: &str) -> DeliveryResult;
}
