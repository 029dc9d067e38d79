//! # WA Core
//!
//! Core traits and types for the wakit WhatsApp gateway.
//!
//! This crate provides the building blocks shared by the provider client and
//! the web adapters:
//! - [`MessagingClient`] trait for sending outbound messages
//! - [`normalize_address`] for the `whatsapp:` channel prefix
//! - Common types for requests, responses, and errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use wa_core::{normalize_address, MessagingClient, SendRequest};
//!
//! let to = normalize_address("+1234567890");
//! let response = client.send(SendRequest {
//!     to: &to,
//!     from: "whatsapp:+14155238886",
//!     text: "Hello world!",
//!     media_urls: &[],
//! }).await?;
//! ```

use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Channel prefix the provider expects on WhatsApp addresses.
pub const CHANNEL_PREFIX: &str = "whatsapp:";

/// Errors that can occur while talking to the messaging provider
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing or empty credentials; fatal at construction
    #[error("configuration error: {0}")]
    Configuration(String),
    /// HTTP communication error
    #[error("http error: {0}")]
    Http(String),
    /// Authentication/authorization error
    #[error("authentication error: {0}")]
    Auth(String),
    /// Invalid request parameters or payload
    #[error("invalid request: {0}")]
    Invalid(String),
    /// Provider rejected the request
    #[error("provider error: {0}")]
    Provider(String),
    /// Unexpected error occurred
    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl GatewayError {
    /// Whether this error should stop initialization.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::Configuration(_))
    }
}

/// HTTP status code for web responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    PayloadTooLarge = 413,
}

impl HttpStatus {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendRequest<'a> {
    pub to: &'a str,
    pub from: &'a str,
    pub text: &'a str,
    /// Attachments, passed through to the provider untouched.
    pub media_urls: &'a [String],
}

#[derive(Debug, Clone, Serialize)]
pub struct SendResponse {
    pub id: String,
    /// Name of the backend/provider that produced the response, e.g. "twilio".
    pub provider: &'static str,
    /// Raw provider payload for debugging / audit.
    pub raw: serde_json::Value,
}

/// Normalized inbound message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: Option<String>,
    pub from: String,
    pub to: String,
    pub text: String,
    pub media_urls: Vec<String>,
    pub received_at: OffsetDateTime,
    pub provider: &'static str,
}

/// Generic webhook response that can be converted to any framework's response type
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    pub status: HttpStatus,
    pub body: String,
    pub content_type: String,
}

impl WebhookResponse {
    pub fn xml(body: String) -> Self {
        Self {
            status: HttpStatus::Ok,
            body,
            content_type: "text/xml".to_string(),
        }
    }

    pub fn xml_with_status(status: HttpStatus, body: String) -> Self {
        Self {
            status,
            ..Self::xml(body)
        }
    }
}

#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Stable provider key, e.g. "twilio".
    fn provider(&self) -> &'static str;

    /// Send a single message, with or without attachments.
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, GatewayError>;
}

/// Utility to create a pseudo id if a provider doesn't return one.
pub fn fallback_id() -> String {
    Uuid::new_v4().to_string()
}

/// Prefix `address` with [`CHANNEL_PREFIX`] unless it already carries it.
pub fn normalize_address(address: &str) -> String {
    if address.starts_with(CHANNEL_PREFIX) {
        address.to_string()
    } else {
        format!("{CHANNEL_PREFIX}{address}")
    }
}

/// Lightweight header representation to avoid tying the core to any HTTP framework.
pub type Headers = Vec<(String, String)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_prefix() {
        assert_eq!(normalize_address("+15550001111"), "whatsapp:+15550001111");
        assert_eq!(normalize_address(""), "whatsapp:");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_address("+15550001111");
        assert_eq!(normalize_address(&once), once);
        assert_eq!(
            normalize_address("whatsapp:+15550001111"),
            "whatsapp:+15550001111"
        );
    }

    #[test]
    fn only_configuration_errors_are_fatal() {
        assert!(GatewayError::Configuration("x".into()).is_fatal());
        assert!(!GatewayError::Http("x".into()).is_fatal());
        assert!(!GatewayError::Provider("x".into()).is_fatal());
    }

    #[test]
    fn xml_response_defaults() {
        let resp = WebhookResponse::xml("<Response />".into());
        assert_eq!(resp.status.as_u16(), 200);
        assert_eq!(resp.content_type, "text/xml");

        let resp = WebhookResponse::xml_with_status(HttpStatus::PayloadTooLarge, String::new());
        assert_eq!(resp.status.as_u16(), 413);
        assert_eq!(resp.content_type, "text/xml");
    }

    #[test]
    fn fallback_ids_are_unique() {
        assert_ne!(fallback_id(), fallback_id());
    }
}
