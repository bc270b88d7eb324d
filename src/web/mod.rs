//! HTTP surface: the suggestion endpoint and the operational endpoints.
//!
//! ## Endpoints
//!
//! - `POST /content/suggest` aggregate suggestions for a content payload
//! - `GET /__health` dependency health report
//! - `GET /__gtg` good-to-go probe
//! - `GET /__build-info` package name and version

pub mod handler;
pub mod health;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use suggest_aggregator::Aggregator;

use crate::config::AppConfig;

/// Path of the suggestion endpoint.
pub const SUGGEST_PATH: &str = "/content/suggest";
/// Path of the health report.
pub const HEALTH_PATH: &str = "/__health";
/// Path of the good-to-go probe.
pub const GTG_PATH: &str = "/__gtg";
/// Path of the build information endpoint.
pub const BUILD_INFO_PATH: &str = "/__build-info";

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// The aggregation engine.
    pub aggregator: Arc<Aggregator>,
    /// Service identity reported by the health endpoint.
    pub app: Arc<AppConfig>,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(SUGGEST_PATH, post(handler::suggest))
        .route(HEALTH_PATH, get(health::health))
        .route(GTG_PATH, get(health::gtg))
        .route(BUILD_INFO_PATH, get(health::build_info))
        .with_state(state)
}
