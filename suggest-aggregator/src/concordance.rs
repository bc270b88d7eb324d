//! Batch resolution of concept UUIDs against the concordance store.
//!
//! The concordance store is the single blocking dependency of the pipeline:
//! any failure here fails the whole aggregate request.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::config::EndpointConfig;
use crate::error::SuggestError;
use crate::health::DependencyCheck;
use crate::http;
use crate::types::{Concept, RequestContext};

const IDS_PARAM: &str = "ids";

#[derive(Debug, Default, Deserialize)]
struct ConcordanceResponse {
    #[serde(default)]
    concepts: HashMap<String, Concept>,
}

/// Client for the internal concordances API.
#[derive(Debug, Clone)]
pub struct ConcordanceClient {
    endpoint: EndpointConfig,
    client: reqwest::Client,
}

impl ConcordanceClient {
    /// Create a client for the given endpoint.
    pub fn new(endpoint: EndpointConfig, client: reqwest::Client) -> Self {
        Self { endpoint, client }
    }

    /// Resolve `uuids` to canonical concepts, keyed by UUID.
    ///
    /// Duplicates are removed before the call (first occurrence wins the
    /// position). An empty input returns an empty map without touching the
    /// network. UUIDs missing from the response are simply absent from the
    /// result.
    ///
    /// # Errors
    ///
    /// - [`SuggestError::Concordance`] on transport failure, non-200 status or
    ///   an undecodable body
    /// - [`SuggestError::Cancelled`] if `ctx.cancel` fires first
    pub async fn resolve(
        &self,
        uuids: &[String],
        ctx: &RequestContext,
    ) -> Result<HashMap<String, Concept>, SuggestError> {
        let ids = dedup(uuids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut pairs: Vec<(&str, &str)> = ids.iter().map(|id| (IDS_PARAM, *id)).collect();
        pairs.push(("include_deprecated", "false"));
        let url = http::url_with_query(&self.endpoint.base_url, &self.endpoint.endpoint, &pairs)?;

        tracing::debug!(
            transaction_id = %ctx.transaction_id,
            count = ids.len(),
            "resolving concordances"
        );

        tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => {
                Err(SuggestError::Cancelled("concordance lookup".into()))
            }
            result = self.fetch(url, ctx) => result,
        }
    }

    async fn fetch(
        &self,
        url: url::Url,
        ctx: &RequestContext,
    ) -> Result<HashMap<String, Concept>, SuggestError> {
        let response = http::with_request_headers(self.client.get(url), ctx)
            .send()
            .await
            .map_err(|e| SuggestError::Concordance(format!("request failed: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SuggestError::Concordance(format!(
                "non 200 status code returned: {}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SuggestError::Concordance(format!("response read failed: {e}")))?;
        let decoded: ConcordanceResponse = serde_json::from_slice(&body)
            .map_err(|e| SuggestError::Concordance(format!("invalid response body: {e}")))?;
        Ok(decoded.concepts)
    }

    /// Liveness probe description.
    pub fn check(&self) -> DependencyCheck {
        DependencyCheck::new(
            "internal-concordances",
            "internal-concordances",
            "Suggestions won't work",
            &self.endpoint.base_url,
            self.client.clone(),
        )
    }
}

/// Remove duplicates while keeping first-seen order.
fn dedup(ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect()
}
