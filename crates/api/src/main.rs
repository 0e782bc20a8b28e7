//! Basket - grocery list sync runner
//!
//! Loads configuration, connects to the list service, keeps the target list
//! cached and refreshed until interrupted.

use std::io::Write as _;

use anyhow::Context as _;
use basket_app::{logging, AppContext};
use basket_infra::config;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before logging so RUST_LOG from the file applies
    let dotenv = dotenvy::dotenv();
    logging::init();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => info!("no .env file found"),
        Err(e) => warn!(error = %e, "could not load .env file"),
    }

    info!(version = env!("CARGO_PKG_VERSION"), "basket starting");

    let config = config::load().context("failed to load configuration")?;
    let mut ctx = match AppContext::new(config).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %format!("{e:#}"), "startup failed");
            return Err(e);
        }
    };

    let snapshot = ctx.cache.snapshot();
    let rendered = serde_json::to_string_pretty(snapshot.as_ref())?;
    writeln!(std::io::stdout().lock(), "{rendered}")?;
    info!(
        list = %snapshot.name,
        items = snapshot.items.len(),
        unchecked = snapshot.unchecked_count(),
        "initial snapshot loaded"
    );

    ctx.start().await?;
    info!("running; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    ctx.shutdown().await?;
    if ctx.client.refresh_token().is_some() {
        // Rotation invalidated the configured token
        warn!("refresh token was rotated; the configured token is no longer valid");
    }

    info!("basket stopped");
    Ok(())
}
