//! The WhatsApp gateway: outbound sends through a [`MessagingClient`] and
//! TwiML replies for inbound webhooks.
//!
//! Outbound calls come in two flavours. `try_send_*` return the provider
//! outcome as a `Result`; `send_*` collapse it into a `bool` after logging the
//! failure, for callers that only care whether the provider accepted the
//! message.
//!
//! Inbound handling never fails: whatever goes wrong while building the reply,
//! the provider receives a well-formed TwiML document.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{error, info, instrument};
use wa_core::{
    normalize_address, GatewayError, InboundMessage, MessagingClient, SendRequest, SendResponse,
};

use crate::credentials::TwilioCredentials;
use crate::inbound::TwilioInbound;
use crate::twiml::MessagingResponse;
use crate::TwilioClient;

/// Reply sent when the inbound payload could not be turned into a reply.
pub const FALLBACK_REPLY: &str = "Sorry, an error occurred processing your message.";

/// Last-resort document if even the fallback fails to render.
const EMPTY_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response />"#;

/// Produces the reply document for an inbound message.
pub trait ReplyHandler: Send + Sync {
    fn reply(&self, message: &InboundMessage) -> Result<MessagingResponse, GatewayError>;
}

/// Default handler: echoes the inbound body back behind a fixed prefix.
#[derive(Debug, Clone)]
pub struct EchoReply {
    prefix: String,
}

impl EchoReply {
    pub const DEFAULT_PREFIX: &'static str = "Received your message: ";

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for EchoReply {
    fn default() -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX)
    }
}

impl ReplyHandler for EchoReply {
    fn reply(&self, message: &InboundMessage) -> Result<MessagingResponse, GatewayError> {
        Ok(MessagingResponse::new().message(format!("{}{}", self.prefix, message.text)))
    }
}

/// Owns the provider client handle for its whole lifetime. Cheap to share
/// behind an `Arc`; nothing is mutated after construction.
#[derive(Clone)]
pub struct WhatsAppGateway {
    client: Arc<dyn MessagingClient>,
    from: String,
    replies: Arc<dyn ReplyHandler>,
    fallback: String,
}

impl std::fmt::Debug for WhatsAppGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppGateway")
            .field("provider", &self.client.provider())
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

impl WhatsAppGateway {
    pub fn new(client: Arc<dyn MessagingClient>, from: impl Into<String>) -> Self {
        Self {
            client,
            from: from.into(),
            replies: Arc::new(EchoReply::default()),
            fallback: FALLBACK_REPLY.to_string(),
        }
    }

    /// Build a gateway backed by Twilio from `TWILIO_*` environment variables.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_credentials(TwilioCredentials::from_env()?)
    }

    pub fn from_credentials(credentials: TwilioCredentials) -> Result<Self, GatewayError> {
        let from = credentials.from_address().to_string();
        let client = TwilioClient::new(credentials)?;
        info!(from = %from, "WhatsApp gateway initialized");
        Ok(Self::new(Arc::new(client), from))
    }

    pub fn with_reply_handler(mut self, handler: Arc<dyn ReplyHandler>) -> Self {
        self.replies = handler;
        self
    }

    pub fn with_fallback_reply(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }

    #[instrument(skip(self, body), fields(provider = self.client.provider()))]
    pub async fn try_send_message(
        &self,
        to: &str,
        body: &str,
    ) -> Result<SendResponse, GatewayError> {
        self.dispatch(to, body, &[]).await
    }

    #[instrument(skip(self, body), fields(provider = self.client.provider()))]
    pub async fn try_send_media(
        &self,
        to: &str,
        body: &str,
        media_url: &str,
    ) -> Result<SendResponse, GatewayError> {
        self.dispatch(to, body, &[media_url.to_string()]).await
    }

    /// Returns `true` when the provider accepted the message. Failures are logged.
    pub async fn send_message(&self, to: &str, body: &str) -> bool {
        match self.try_send_message(to, body).await {
            Ok(res) => {
                info!(sid = %res.id, "WhatsApp message sent");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to send WhatsApp message");
                false
            }
        }
    }

    /// Like [`send_message`](Self::send_message) with a single attachment.
    pub async fn send_media(&self, to: &str, body: &str, media_url: &str) -> bool {
        match self.try_send_media(to, body, media_url).await {
            Ok(res) => {
                info!(sid = %res.id, "WhatsApp media message sent");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to send WhatsApp media");
                false
            }
        }
    }

    async fn dispatch(
        &self,
        to: &str,
        body: &str,
        media_urls: &[String],
    ) -> Result<SendResponse, GatewayError> {
        let to = normalize_address(to);
        self.client
            .send(SendRequest {
                to: &to,
                from: &self.from,
                text: body,
                media_urls,
            })
            .await
    }

    /// Build the TwiML reply for an already-decoded webhook payload.
    pub fn handle_incoming(&self, payload: &HashMap<String, String>) -> String {
        self.respond(TwilioInbound::from_map(payload).into())
    }

    /// Build the TwiML reply for a raw form-encoded webhook body.
    pub fn handle_webhook_body(&self, body: &[u8]) -> String {
        match TwilioInbound::from_form(body) {
            Ok(inbound) => self.respond(inbound.into()),
            Err(e) => {
                error!(error = %e, "Error handling incoming WhatsApp message");
                self.fallback_document()
            }
        }
    }

    /// The reply used whenever an inbound message cannot be handled.
    pub fn fallback_document(&self) -> String {
        MessagingResponse::new()
            .message(self.fallback.as_str())
            .to_xml()
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to render fallback reply");
                EMPTY_RESPONSE.to_string()
            })
    }

    fn respond(&self, message: InboundMessage) -> String {
        info!(from = %message.from, body = %message.text, "Received WhatsApp message");
        // A panicking handler must not take the webhook task down with it.
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.replies.reply(&message).and_then(|doc| doc.to_xml())
        }))
        .unwrap_or_else(|panic| Err(GatewayError::Unexpected(panic_message(panic.as_ref()))));

        match outcome {
            Ok(xml) => xml,
            Err(e) => {
                error!(error = %e, "Error handling incoming WhatsApp message");
                self.fallback_document()
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload");
    format!("reply handler panicked: {}", detail)
}
