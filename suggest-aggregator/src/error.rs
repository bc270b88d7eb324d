//! Error types for the suggest-aggregator crate.
//!
//! Messages are stable and never include request payloads, so they are
//! safe to log and to surface in HTTP error bodies.

/// Errors that can occur while aggregating concept suggestions.
#[derive(Debug, thiserror::Error)]
pub enum SuggestError {
    /// A provider answered HTTP 204: it has nothing to suggest for this content.
    #[error("{0} returned HTTP 204")]
    NoContent(String),

    /// A provider rejected the payload with HTTP 400.
    #[error("{0} returned HTTP 400")]
    BadRequest(String),

    /// A provider answered with any other unexpected status.
    #[error("provider error: {0}")]
    Provider(String),

    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// An upstream response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The concordance lookup failed. Fatal to the aggregate request.
    #[error("concordance error: {0}")]
    Concordance(String),

    /// The broader-concepts lookup failed.
    #[error("broader concepts error: {0}")]
    Broader(String),

    /// The denylist could not be refreshed.
    #[error("denylist error: {0}")]
    Denylist(String),

    /// The caller cancelled the request while a remote call was in flight.
    #[error("request cancelled: {0}")]
    Cancelled(String),

    /// Invalid aggregator configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SuggestError {
    /// Whether this is a "soft" provider outcome (HTTP 204 / HTTP 400).
    ///
    /// Soft errors mean the provider contributed nothing; they are logged at
    /// warn level instead of error level.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::NoContent(_) | Self::BadRequest(_))
    }
}

/// Convenience type alias for suggest-aggregator results.
pub type Result<T> = std::result::Result<T, SuggestError>;
