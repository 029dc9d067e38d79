//! Run a tiny Axum server that answers Twilio's WhatsApp webhook with TwiML.
//! Point the sandbox "When a message comes in" URL at `http://<host>:<port>/webhooks/whatsapp`.

use tracing::info;
use wakit::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;

    let gateway = config.build_gateway()?;
    let app = router(AppState {
        processor: config.webhook_processor(gateway),
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, path = WEBHOOK_PATH, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
