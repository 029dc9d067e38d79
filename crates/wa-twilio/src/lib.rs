//! # WA Twilio
//!
//! Twilio backend for wakit: a REST client for the Messages API, credential
//! loading, inbound webhook parsing, TwiML replies and the [`WhatsAppGateway`]
//! that ties them together.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use wa_core::{GatewayError, MessagingClient, SendRequest, SendResponse};

pub mod credentials;
pub mod gateway;
pub mod inbound;
pub mod twiml;

pub use credentials::TwilioCredentials;
pub use gateway::{EchoReply, ReplyHandler, WhatsAppGateway, FALLBACK_REPLY};
pub use inbound::TwilioInbound;
pub use twiml::{Message, MessagingResponse};

pub const PROVIDER: &str = "twilio";

pub const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Twilio REST client.
#[derive(Clone, Debug)]
pub struct TwilioClient {
    credentials: TwilioCredentials,
    /// API base URL; override for testing/mocking.
    base_url: String,
    http: reqwest::Client,
}

impl TwilioClient {
    pub fn new(credentials: TwilioCredentials) -> Result<Self, GatewayError> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        credentials: TwilioCredentials,
        base_url: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        if credentials.account_sid().is_empty() || credentials.auth_token().is_empty() {
            return Err(GatewayError::Configuration(
                "account sid and auth token are required".into(),
            ));
        }
        Ok(Self {
            credentials,
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        })
    }

    pub fn credentials(&self) -> &TwilioCredentials {
        &self.credentials
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.credentials.account_sid()
        )
    }
}

/// Form fields for `POST .../Messages.json`. `MediaUrl` repeats once per attachment.
fn send_form<'a>(req: &SendRequest<'a>) -> Vec<(&'static str, &'a str)> {
    let mut form = vec![("From", req.from), ("To", req.to), ("Body", req.text)];
    form.extend(req.media_urls.iter().map(|url| ("MediaUrl", url.as_str())));
    form
}

#[derive(Debug, Deserialize)]
struct TwilioApiError {
    code: Option<i64>,
    message: Option<String>,
}

fn provider_error(status: reqwest::StatusCode, body: &str) -> GatewayError {
    let detail = match serde_json::from_str::<TwilioApiError>(body) {
        Ok(TwilioApiError {
            code: Some(code),
            message: Some(message),
        }) => format!("{} {}", code, message),
        _ => body.to_string(),
    };
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        GatewayError::Auth(format!("HTTP {}: {}", status, detail))
    } else {
        GatewayError::Provider(format!("HTTP {}: {}", status, detail))
    }
}

#[async_trait]
impl MessagingClient for TwilioClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, GatewayError> {
        debug!(
            to = req.to,
            media = req.media_urls.len(),
            "posting message to Twilio"
        );
        let res = self
            .http
            .post(self.messages_url())
            .basic_auth(
                self.credentials.account_sid(),
                Some(self.credentials.auth_token()),
            )
            .form(&send_form(&req))
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!(%status, "Twilio rejected message");
            return Err(provider_error(status, &body));
        }

        let raw_text = res
            .text()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;
        let raw_json: serde_json::Value = serde_json::from_str(&raw_text)
            .unwrap_or_else(|_| serde_json::json!({ "raw": raw_text }));

        let id = raw_json
            .get("sid")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(wa_core::fallback_id);

        Ok(SendResponse {
            id,
            provider: PROVIDER,
            raw: raw_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> TwilioCredentials {
        TwilioCredentials::new("AC123", "token", "whatsapp:+14155238886").unwrap()
    }

    #[test]
    fn form_repeats_media_url() {
        let media = vec!["https://a/1.png".to_string(), "https://a/2.png".to_string()];
        let req = SendRequest {
            to: "whatsapp:+1",
            from: "whatsapp:+2",
            text: "hi",
            media_urls: &media,
        };
        let form = send_form(&req);
        assert_eq!(form[0], ("From", "whatsapp:+2"));
        assert_eq!(form[1], ("To", "whatsapp:+1"));
        assert_eq!(form[2], ("Body", "hi"));
        assert_eq!(
            form.iter().filter(|(k, _)| *k == "MediaUrl").count(),
            2
        );
    }

    #[test]
    fn messages_url_ignores_trailing_slash() {
        let client = TwilioClient::with_base_url(creds(), "http://localhost:1234/").unwrap();
        assert_eq!(client.credentials().account_sid(), "AC123");
        assert_eq!(
            client.messages_url(),
            "http://localhost:1234/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn error_mapping() {
        let body = r#"{"code": 21211, "message": "Invalid 'To' Phone Number", "status": 400}"#;
        let err = provider_error(reqwest::StatusCode::BAD_REQUEST, body);
        match err {
            GatewayError::Provider(msg) => {
                assert!(msg.contains("400"));
                assert!(msg.contains("21211"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = provider_error(reqwest::StatusCode::UNAUTHORIZED, "nope");
        assert!(matches!(err, GatewayError::Auth(_)));
    }

    #[tokio::test]
    async fn send_returns_sid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .and(header_exists("authorization"))
            .and(body_string_contains("Body=hello"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({ "sid": "SM42", "status": "queued" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = TwilioClient::with_base_url(creds(), server.uri()).unwrap();
        let res = client
            .send(SendRequest {
                to: "whatsapp:+15550001111",
                from: "whatsapp:+14155238886",
                text: "hello",
                media_urls: &[],
            })
            .await
            .unwrap();
        assert_eq!(res.id, "SM42");
        assert_eq!(res.provider, "twilio");
    }

    #[tokio::test]
    async fn send_without_sid_uses_fallback_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("accepted"))
            .mount(&server)
            .await;

        let client = TwilioClient::with_base_url(creds(), server.uri()).unwrap();
        let res = client
            .send(SendRequest {
                to: "whatsapp:+1",
                from: "whatsapp:+2",
                text: "x",
                media_urls: &[],
            })
            .await
            .unwrap();
        assert!(!res.id.is_empty());
        assert_eq!(res.raw["raw"], "accepted");
    }
}
