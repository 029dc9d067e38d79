use std::sync::Arc;

use tracing::warn;
use wa_core::{Headers, HttpStatus, WebhookResponse};
use wa_twilio::WhatsAppGateway;

/// Default cap on webhook bodies (1MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Framework-agnostic webhook processor that turns an inbound HTTP request into
/// the TwiML reply the provider expects.
#[derive(Clone, Debug)]
pub struct WebhookProcessor {
    gateway: Arc<WhatsAppGateway>,
    max_body_size: usize,
}

impl WebhookProcessor {
    pub fn new(gateway: Arc<WhatsAppGateway>) -> Self {
        Self {
            gateway,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    pub fn gateway(&self) -> &WhatsAppGateway {
        &self.gateway
    }

    /// Process an incoming webhook request. The body is always a TwiML document.
    pub fn process_webhook(&self, headers: Headers, body: &[u8]) -> WebhookResponse {
        if body.len() > self.max_body_size {
            warn!(
                size = body.len(),
                limit = self.max_body_size,
                "webhook body over limit"
            );
            return self.reject_oversized();
        }
        if let Some(ct) = content_type(&headers) {
            if !ct.starts_with("application/x-www-form-urlencoded") {
                warn!(content_type = ct, "unexpected webhook content type");
            }
        }
        WebhookResponse::xml(self.gateway.handle_webhook_body(body))
    }

    /// Response for a body over [`max_body_size`](Self::max_body_size).
    pub fn reject_oversized(&self) -> WebhookResponse {
        WebhookResponse::xml_with_status(
            HttpStatus::PayloadTooLarge,
            self.gateway.fallback_document(),
        )
    }
}

fn content_type(headers: &Headers) -> Option<&str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
        .map(|(_, v)| v.as_str())
}

/// Helper trait for framework adapters to convert headers
pub trait HeaderConverter {
    type HeaderType;

    fn to_generic_headers(headers: &Self::HeaderType) -> Headers;
}

/// Helper trait for framework adapters to convert responses
pub trait ResponseConverter {
    type ResponseType;

    fn from_webhook_response(response: WebhookResponse) -> Self::ResponseType;
}
