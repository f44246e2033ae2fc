//! Entry point of the `static-kas` server
use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use kas_server::{
    config::{Config, PrinterOptions, ShortNames},
    index::DumpIndex,
    router::{router, AppState},
};
use tracing_subscriber::EnvFilter;

/// How long open watch and follow streams may linger after a shutdown request
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let index = DumpIndex::build(&config.base_dir, &ShortNames::default())
        .await
        .with_context(|| format!("failed to index {}", config.base_dir.display()))?;
    let app = router(Arc::new(AppState::new(index, PrinterOptions::default())));

    let listener = tokio::net::TcpListener::bind(config.listen_address)
        .await
        .with_context(|| format!("failed to listen on {}", config.listen_address))?;
    tracing::info!(address = %config.listen_address, "serving dump");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    // watch and follow responses never finish on their own
    tokio::select! {
        res = server => res.context("server failed")?,
        _ = async {
            shutdown_signal().await;
            tokio::time::sleep(SHUTDOWN_GRACE).await;
        } => tracing::warn!("closing streams still open after shutdown"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
