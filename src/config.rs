use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use tracing::info;

use wa_core::GatewayError;
use wa_twilio::{EchoReply, TwilioClient, TwilioCredentials, WhatsAppGateway};
use wa_web_generic::WebhookProcessor;

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Twilio API configuration (credentials come from `TWILIO_*` variables)
    pub twilio: TwilioConfig,
    /// Inbound reply configuration
    pub reply: ReplyConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
}

/// Twilio API configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TwilioConfig {
    /// REST API base URL (default: https://api.twilio.com)
    pub api_base_url: String,
    /// Sender override; when unset the `TWILIO_WHATSAPP_FROM` value (or the sandbox sender) is used
    pub from_address: Option<String>,
}

/// Inbound reply configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReplyConfig {
    /// Text placed before the echoed body
    pub echo_prefix: String,
    /// Message sent when an inbound message cannot be handled
    pub fallback_text: String,
}

/// Security configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    /// Maximum webhook body size in bytes (default: 1MB)
    pub max_body_size: usize,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: json or pretty (default: json)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            api_base_url: wa_twilio::DEFAULT_BASE_URL.to_string(),
            from_address: None,
        }
    }
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            echo_prefix: EchoReply::DEFAULT_PREFIX.to_string(),
            fallback_text: wa_twilio::FALLBACK_REPLY.to_string(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: wa_web_generic::DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(Config::try_from(&AppConfig::default())?)
            // Add configuration file based on environment
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local configuration file (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with WAKIT__)
            .add_source(Environment::with_prefix("WAKIT").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Build a Twilio-backed gateway from `TWILIO_*` credentials and this configuration.
    pub fn build_gateway(&self) -> Result<WhatsAppGateway, GatewayError> {
        self.build_gateway_with(TwilioCredentials::from_env()?)
    }

    pub fn build_gateway_with(
        &self,
        mut credentials: TwilioCredentials,
    ) -> Result<WhatsAppGateway, GatewayError> {
        if let Some(from) = &self.twilio.from_address {
            credentials = credentials.with_from_address(from.clone());
        }
        let from = credentials.from_address().to_string();
        let client = TwilioClient::with_base_url(credentials, self.twilio.api_base_url.clone())?;
        info!(from = %from, api = %self.twilio.api_base_url, "WhatsApp gateway initialized");
        Ok(WhatsAppGateway::new(Arc::new(client), from)
            .with_reply_handler(Arc::new(EchoReply::with_prefix(
                self.reply.echo_prefix.clone(),
            )))
            .with_fallback_reply(self.reply.fallback_text.clone()))
    }

    /// Webhook processor over `gateway`, honouring the configured body limit.
    pub fn webhook_processor(&self, gateway: WhatsAppGateway) -> WebhookProcessor {
        WebhookProcessor::new(Arc::new(gateway)).with_max_body_size(self.security.max_body_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.twilio.api_base_url, "https://api.twilio.com");
        assert_eq!(config.reply.echo_prefix, "Received your message: ");
        assert_eq!(config.security.max_body_size, 1024 * 1024);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn defaults_survive_config_round_trip() {
        let loaded: AppConfig = Config::builder()
            .add_source(Config::try_from(&AppConfig::default()).unwrap())
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(loaded.server.host, "0.0.0.0");
        assert!(loaded.twilio.from_address.is_none());
    }

    #[test]
    fn gateway_uses_configured_sender_and_reply() {
        let mut config = AppConfig::default();
        config.twilio.from_address = Some("whatsapp:+15550009999".into());
        config.reply.echo_prefix = "Got: ".into();

        let creds = TwilioCredentials::new("AC1", "tok", "whatsapp:+14155238886").unwrap();
        let gateway = config.build_gateway_with(creds).unwrap();
        assert_eq!(gateway.from_address(), "whatsapp:+15550009999");

        let xml = gateway.handle_incoming(&[("Body".to_string(), "hi".to_string())].into());
        assert!(xml.contains("<Message>Got: hi</Message>"));
    }

    #[test]
    fn processor_takes_body_limit() {
        let mut config = AppConfig::default();
        config.security.max_body_size = 512;
        let creds = TwilioCredentials::new("AC1", "tok", "whatsapp:+1").unwrap();
        let processor = config.webhook_processor(config.build_gateway_with(creds).unwrap());
        assert_eq!(processor.max_body_size(), 512);
    }
}
