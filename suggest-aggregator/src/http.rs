//! Shared HTTP client and header helpers for upstream calls.
//!
//! One [`reqwest::Client`] is built at startup and cloned into every
//! upstream client so connection pools are shared across dependencies.

use crate::config::HttpSettings;
use crate::error::SuggestError;
use crate::types::RequestContext;
use std::time::Duration;

/// User-Agent sent on every upstream request.
pub const USER_AGENT: &str = "UPP public-suggestions-api";

/// Header carrying the transaction id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Header carrying the calling system.
pub const ORIGIN_HEADER: &str = "X-Origin";

/// Header carrying the debug flag.
pub const DEBUG_HEADER: &str = "debug";

/// Build the [`reqwest::Client`] shared by every upstream dependency.
///
/// The client has:
/// - An overall per-request timeout (the only deadline a provider call gets)
/// - A connect timeout equal to the request timeout
/// - A bounded idle pool per host
///
/// # Errors
///
/// Returns [`SuggestError::Http`] if the client cannot be constructed.
pub fn build_client(settings: &HttpSettings) -> Result<reqwest::Client, SuggestError> {
    let timeout = Duration::from_secs(settings.timeout_seconds);
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .pool_max_idle_per_host(settings.max_idle_per_host)
        .tcp_keepalive(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SuggestError::Http(format!("failed to build HTTP client: {e}")))
}

/// Attach the transaction id and, when present, the debug flag.
pub(crate) fn with_request_headers(
    request: reqwest::RequestBuilder,
    ctx: &RequestContext,
) -> reqwest::RequestBuilder {
    let request = request
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .header(REQUEST_ID_HEADER, &ctx.transaction_id);
    match ctx.debug.as_deref() {
        Some(debug) if !debug.is_empty() => request.header(DEBUG_HEADER, debug),
        _ => request,
    }
}

/// Build `{base}{endpoint}` with the given repeated query pairs.
///
/// # Errors
///
/// Returns [`SuggestError::Config`] if the joined URL does not parse.
pub(crate) fn url_with_query(
    base: &str,
    endpoint: &str,
    pairs: &[(&str, &str)],
) -> Result<url::Url, SuggestError> {
    let mut url = url::Url::parse(&format!("{base}{endpoint}"))
        .map_err(|e| SuggestError::Config(format!("invalid URL {base}{endpoint}: {e}")))?;
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs.iter().copied());
    }
    Ok(url)
}
