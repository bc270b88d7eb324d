//! Public suggestions service.
//!
//! Serves `POST /content/suggest`, fanning each request out to the
//! configured suggestion providers through [`suggest_aggregator`] and
//! returning one ordered list of canonical concepts.
//!
//! # Architecture
//!
//! - **config**: defaults, TOML file and deployment environment overrides
//! - **web**: axum handlers for the suggestion and operational endpoints
//! - **server**: listener lifecycle (start, address, graceful shutdown)

pub mod config;
pub mod error;
pub mod server;
pub mod web;

pub use config::{AppConfig, ServiceConfig};
pub use error::{Result, ServiceError};
pub use server::SuggestionsServer;

use std::sync::Arc;

use suggest_aggregator::Aggregator;

/// Build the aggregator and start serving.
///
/// # Errors
///
/// Returns an error if the aggregator cannot be built from `config` or the
/// listener cannot bind.
pub async fn start(config: &ServiceConfig) -> Result<SuggestionsServer> {
    let aggregator = Aggregator::from_config(&config.aggregator_config())?;
    tracing::info!(
        providers = ?aggregator.provider_names(),
        "aggregator ready"
    );
    SuggestionsServer::start(Arc::new(aggregator), &config.app).await
}
