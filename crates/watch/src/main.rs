//! `deepguard-watch` -- terminal scan overlay for the DeepGuard API.
//!
//! Loads the website list, requests a global scan once, then polls
//! `/api/v1/scan-results` and prints per-site status until Ctrl-C.
//!
//! # Environment variables
//!
//! | Variable           | Default                 | Description                 |
//! |--------------------|-------------------------|-----------------------------|
//! | `DEEPGUARD_URL`    | `http://localhost:5000` | Base URL of the API server  |
//! | `POLL_INTERVAL_MS` | `2000`                  | Delay between results polls |

use std::sync::Arc;

use anyhow::bail;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deepguard_watch::client::HttpScanApi;
use deepguard_watch::config::WatchConfig;
use deepguard_watch::render;
use deepguard_watch::session::{OverlaySession, SessionState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deepguard_watch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = WatchConfig::from_env();
    tracing::info!(
        base_url = %config.base_url,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "Starting deepguard-watch",
    );

    let api = Arc::new(HttpScanApi::new(config.base_url.clone()));
    let mut session = OverlaySession::new(api, config.poll_interval);

    if let SessionState::Error(message) = session.open().await {
        render::print_error(message);
        bail!("website list unavailable");
    }

    let token = session.cancellation_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl-C, closing overlay");
                token.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to install Ctrl-C handler"),
        }
    });

    session.run(render::print_ready).await;
    tracing::info!("Overlay closed");
    Ok(())
}
