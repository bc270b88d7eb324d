//! `public-suggestions` service binary.
//!
//! Usage: `public-suggestions [CONFIG_TOML]`. Without a file the built-in
//! defaults are used; deployment environment variables override either.

use std::path::PathBuf;

use public_suggestions::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = ServiceConfig::load(config_path.as_deref())
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.app.log_level)),
        )
        .init();

    tracing::info!(
        name = %config.app.name,
        port = config.app.port,
        "public-suggestions starting"
    );

    let server = public_suggestions::start(&config).await.map_err(|e| {
        tracing::error!(error = %e, "public-suggestions failed to start");
        anyhow::anyhow!("public-suggestions failed: {e}")
    })?;

    wait_for_signal().await;
    tracing::info!("[Shutdown] public-suggestions is shutting down");

    server.shutdown();
    if tokio::time::timeout(std::time::Duration::from_secs(10), server.wait())
        .await
        .is_err()
    {
        tracing::warn!("in-flight requests did not finish within 10s");
    }

    tracing::info!("public-suggestions shut down cleanly");
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => tracing::warn!(error = %e, "SIGTERM handler unavailable"),
        }
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    }
}
