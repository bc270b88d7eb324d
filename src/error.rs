//! Error types for the public suggestions service.

use suggest_aggregator::SuggestError;

/// Top-level error type for service wiring and startup.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration could not be loaded or is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The HTTP listener could not be started.
    #[error("startup error: {0}")]
    Startup(String),

    /// The aggregation engine could not be built.
    #[error("aggregator error: {0}")]
    Aggregator(#[from] SuggestError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ServiceError>;
