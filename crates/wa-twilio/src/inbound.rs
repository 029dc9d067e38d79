use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use wa_core::{GatewayError, InboundMessage};

use crate::PROVIDER;

/// Fields Twilio posts for an inbound WhatsApp message. Everything is optional
/// on the wire; `From` and `Body` fall back to empty strings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TwilioInbound {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "To", default)]
    pub to: String,
    #[serde(rename = "MessageSid")]
    pub message_sid: Option<String>,
    #[serde(rename = "ProfileName")]
    pub profile_name: Option<String>,
    #[serde(rename = "WaId")]
    pub wa_id: Option<String>,
    #[serde(rename = "NumMedia")]
    pub num_media: Option<String>,
    #[serde(rename = "MediaUrl0")]
    pub media_url0: Option<String>,
    #[serde(rename = "MediaContentType0")]
    pub media_content_type0: Option<String>,
}

impl TwilioInbound {
    /// Build from an already-decoded key/value payload. Unknown keys are ignored.
    pub fn from_map(payload: &HashMap<String, String>) -> Self {
        let get = |key: &str| payload.get(key).cloned();
        Self {
            from: get("From").unwrap_or_default(),
            body: get("Body").unwrap_or_default(),
            to: get("To").unwrap_or_default(),
            message_sid: get("MessageSid"),
            profile_name: get("ProfileName"),
            wa_id: get("WaId"),
            num_media: get("NumMedia"),
            media_url0: get("MediaUrl0"),
            media_content_type0: get("MediaContentType0"),
        }
    }

    /// Decode an `application/x-www-form-urlencoded` webhook body.
    pub fn from_form(body: &[u8]) -> Result<Self, GatewayError> {
        serde_urlencoded::from_bytes(body)
            .map_err(|e| GatewayError::Invalid(format!("form decode: {}", e)))
    }
}

impl From<TwilioInbound> for InboundMessage {
    fn from(t: TwilioInbound) -> Self {
        InboundMessage {
            id: t.message_sid,
            from: t.from,
            to: t.to,
            text: t.body,
            media_urls: t.media_url0.into_iter().collect(),
            received_at: OffsetDateTime::now_utc(),
            provider: PROVIDER,
        }
    }
}
