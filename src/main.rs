//! linehook webhook receiver.
//!
//! Loads configuration, builds the reply client and dispatcher, and serves
//! the webhook endpoint until CTRL+C or SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use linehook_api::{default_routes, AppState, Config};
use linehook_core::{Dispatcher, SignatureVerifier};
use linehook_reply::LineReplyClient;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting linehook webhook receiver");

    let config = Config::load()?;
    let addr = config.parse_server_addr()?;
    info!(
        server_addr = %addr,
        channel_secret = %config.channel_secret_masked(),
        api_base_url = %config.api_base_url,
        reply_timeout_secs = config.reply_timeout,
        "Configuration loaded"
    );

    let verifier = SignatureVerifier::new(&config.channel_secret)
        .context("Failed to initialize signature verifier")?;
    let client = LineReplyClient::new(config.to_client_config())
        .context("Failed to initialize reply client")?;

    let routes = default_routes();
    info!(routes = routes.len(), "Routing table built");

    let dispatcher = Dispatcher::new(routes, Arc::new(client));
    let state = AppState::new(verifier, dispatcher);

    linehook_api::start_server(state, config.to_http_limits(), addr)
        .await
        .context("HTTP server failed")?;

    info!("linehook shutdown complete");
    Ok(())
}

/// Initializes tracing from `RUST_LOG`, falling back to a debug filter for
/// this service.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,linehook=debug,tower_http=debug"));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
