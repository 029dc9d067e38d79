//! # WA Kit
//!
//! A small WhatsApp gateway for Rust applications, built on Twilio's
//! Messages API.
//!
//! ## Features
//!
//! - **Outbound messages**: text and media via the Twilio REST API
//! - **Inbound webhooks**: TwiML replies that never fail, with a pluggable reply handler
//! - **Framework agnostic**: a generic webhook processor plus an Axum adapter
//! - **Configuration**: layered files and environment variables
//! - **Observability**: structured logging with `tracing`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wakit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_WHATSAPP_FROM
//!     let gateway = WhatsAppGateway::from_env()?;
//!
//!     if !gateway.send_message("+1234567890", "Hello from WA Kit!").await {
//!         eprintln!("message was not accepted, see logs");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! use wakit::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! wakit::telemetry::init_tracing(&config.logging)?;
//! let gateway = config.build_gateway()?;
//! ```

pub mod config;
pub mod telemetry;

pub use self::config::AppConfig;

/// Common imports for WA Kit usage
pub mod prelude {
    pub use crate::config::{
        AppConfig, LoggingConfig, ReplyConfig, SecurityConfig, ServerConfig, TwilioConfig,
    };
    pub use crate::telemetry::init_tracing;
    pub use wa_core::*;
    pub use wa_twilio::{
        EchoReply, Message, MessagingResponse, ReplyHandler, TwilioClient, TwilioCredentials,
        WhatsAppGateway,
    };
    pub use wa_web_axum::{AppState, WEBHOOK_PATH, router};
    pub use wa_web_generic::WebhookProcessor;
}
