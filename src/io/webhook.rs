//! Webhook notification delivery
//!
//! One JSON message per candidate, POSTed to the configured endpoint.
//! Response classification:
//! - status < 400: delivered
//! - 400..500: rejected, logged, run continues
//! - >= 500 (or no response at all): fatal, aborts the dispatch loop

use crate::domain::types::{NotificationCandidate, NotificationOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_ICON_EMOJI: &str = ":yum:";
pub const DEFAULT_TEXT_TEMPLATE: &str = "[ポケモンレーダー] {name} が 現れました";
const NAME_PLACEHOLDER: &str = "{name}";

/// Log client-side rejection (cold path)
#[cold]
fn log_rejected(species_id: i32, status: u16, reason: &str) {
    warn!(species_id = species_id, status = status, reason = %reason, "webhook_rejected");
}

/// Webhook message wire format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub url: String,
    pub channel: String,
    pub icon_emoji: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub image_url: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DestinationError {
    #[error("webhook destination must be <base_url>@<channel>, got {0:?}")]
    MissingChannel(String),
    #[error("webhook destination has an empty base url")]
    EmptyUrl,
}

/// Where notifications go, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    base_url: String,
    channel: String,
}

impl Destination {
    pub fn new(base_url: impl Into<String>, channel: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), channel: channel.into() }
    }

    /// Parse `base_url@channel`. The split happens at the last `@` so a base
    /// URL with userinfo still works. A bare channel name becomes a direct
    /// message target (`@name`); `#channel` and `@user` pass through.
    pub fn parse(raw: &str) -> Result<Self, DestinationError> {
        let raw = raw.trim();
        let Some((base, channel)) = raw.rsplit_once('@') else {
            return Err(DestinationError::MissingChannel(raw.to_string()));
        };

        if base.is_empty() {
            return Err(DestinationError::EmptyUrl);
        }
        if channel.is_empty() {
            return Err(DestinationError::MissingChannel(raw.to_string()));
        }

        let channel = if channel.starts_with('#') || channel.starts_with('@') {
            channel.to_string()
        } else {
            format!("@{}", channel)
        };

        Ok(Self { base_url: base.to_string(), channel })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

/// Display settings for rendered messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    pub icon_emoji: String,
    pub text_template: String,
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self {
            icon_emoji: DEFAULT_ICON_EMOJI.to_string(),
            text_template: DEFAULT_TEXT_TEMPLATE.to_string(),
        }
    }
}

impl MessageTemplate {
    pub fn render_text(&self, display_name: &str) -> String {
        self.text_template.replace(NAME_PLACEHOLDER, display_name)
    }
}

/// Response as seen by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

/// Outbound HTTP seam; mocked in tests
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport with a shared connection pool
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        Ok(TransportResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        })
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("webhook server error: {status} {reason}")]
    Server { status: u16, reason: String },
    #[error("webhook transport failed: {0}")]
    Transport(#[from] TransportError),
    #[error("failed to encode webhook message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Serializes candidates and delivers them, one call per candidate.
///
/// Holds no per-call state; the destination and template are fixed at
/// construction.
pub struct NotificationDispatcher<T> {
    transport: T,
    destination: Destination,
    template: MessageTemplate,
}

impl<T: WebhookTransport> NotificationDispatcher<T> {
    pub fn new(transport: T, destination: Destination, template: MessageTemplate) -> Self {
        Self { transport, destination, template }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the wire message for a candidate
    pub fn message_for(&self, candidate: &NotificationCandidate) -> WebhookMessage {
        WebhookMessage {
            url: self.destination.base_url.clone(),
            channel: self.destination.channel.clone(),
            icon_emoji: self.template.icon_emoji.clone(),
            text: self.template.render_text(candidate.display_name()),
            attachments: vec![Attachment { image_url: candidate.image_url().to_string() }],
        }
    }

    /// Deliver one candidate and classify the response
    pub async fn deliver(&self, candidate: &NotificationCandidate) -> Result<NotificationOutcome, DispatchError> {
        let species_id = candidate.entity_id();
        let message = self.message_for(candidate);
        let body = serde_json::to_vec(&message)?;
        let start = Instant::now();

        debug!(species_id = %species_id, bytes = body.len(), "webhook_posting");

        let response = self.transport.post_json(&self.destination.base_url, body).await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        match response.status {
            status if status < 400 => {
                info!(
                    species_id = %species_id,
                    name = %candidate.display_name(),
                    status = status,
                    latency_ms = latency_ms,
                    "notification_delivered"
                );
                Ok(NotificationOutcome::delivered(species_id))
            }
            status if status < 500 => {
                log_rejected(species_id.0, status, &response.reason);
                Ok(NotificationOutcome::rejected(species_id, format!("{} {}", status, response.reason)))
            }
            status => Err(DispatchError::Server { status, reason: response.reason }),
        }
    }
}
