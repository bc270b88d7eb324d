//! HTTP listener lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use suggest_aggregator::Aggregator;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::AppConfig;
use crate::error::{Result, ServiceError};
use crate::web::{self, AppState};

/// A running suggestions HTTP server.
pub struct SuggestionsServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl SuggestionsServer {
    /// Start the HTTP server.
    ///
    /// Binds to `{app.host}:{app.port}` (use port `0` for auto-assign) and
    /// begins serving in a background tokio task.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(aggregator: Arc<Aggregator>, app: &AppConfig) -> Result<Self> {
        let state = AppState {
            aggregator,
            app: Arc::new(app.clone()),
        };
        let router = web::router(state);

        let bind_addr = format!("{}:{}", app.host, app.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| ServiceError::Startup(format!("bind {bind_addr} failed: {e}")))?;

        let addr = listener
            .local_addr()
            .map_err(|e| ServiceError::Startup(format!("failed to get local addr: {e}")))?;

        info!(system_code = %app.system_code, "suggestions server listening on http://{addr}");

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        let handle = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await;
            if let Err(e) = served {
                tracing::error!("suggestions server error: {e}");
            }
        });

        Ok(Self {
            addr,
            shutdown,
            handle,
        })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Stop accepting connections and let in-flight requests finish.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Wait for the serve loop to exit after [`shutdown`](Self::shutdown).
    pub async fn wait(mut self) {
        if let Err(e) = (&mut self.handle).await {
            if !e.is_cancelled() {
                tracing::error!("suggestions server task failed: {e}");
            }
        }
    }
}

impl Drop for SuggestionsServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
