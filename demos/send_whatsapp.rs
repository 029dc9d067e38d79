//! Send a WhatsApp message (optionally with one attachment) through Twilio.
//!
//! Credentials come from `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN` and
//! `TWILIO_WHATSAPP_FROM`.
use wakit::prelude::*;

use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;

    let to = arg_or_env("--to", "WHATSAPP_TO")?;
    let text = arg_or_env("--text", "WHATSAPP_TEXT")?;
    let media = arg_or_env("--media", "WHATSAPP_MEDIA").ok();

    let gateway = config.build_gateway()?;
    let res = match media {
        Some(url) => gateway.try_send_media(&to, &text, &url).await?,
        None => gateway.try_send_message(&to, &text).await?,
    };
    println!(
        "Sent via {} with id {}\nRaw: {}",
        res.provider,
        res.id,
        serde_json::to_string_pretty(&res.raw)?
    );
    Ok(())
}

fn arg_or_env(flag: &str, env_key: &str) -> Result<String, String> {
    let args: Vec<String> = env::args().collect();
    if let Some(idx) = args.iter().position(|a| a == flag) {
        if idx + 1 < args.len() {
            return Ok(args[idx + 1].clone());
        }
    }
    env::var(env_key).map_err(|_| format!("missing {} (arg {} or env {})", flag, flag, env_key))
}
