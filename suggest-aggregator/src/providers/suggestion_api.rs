//! HTTP client for the suggestion provider contract.
//!
//! Providers accept the content payload on `POST {base}{endpoint}` and
//! answer `{"suggestions": [...]}`. HTTP 204 and 400 are expected answers
//! for content a provider has nothing to say about.

use async_trait::async_trait;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::SuggestError;
use crate::health::DependencyCheck;
use crate::http::{self, ORIGIN_HEADER};
use crate::provider::{Capability, Suggester};
use crate::types::{RequestContext, Suggestion, SuggestionsResponse};

/// A suggestion provider reached over HTTP.
#[derive(Clone)]
pub struct SuggestionApi {
    name: String,
    system_code: String,
    business_impact: String,
    base_url: String,
    endpoint: String,
    capabilities: Vec<Capability>,
    client: reqwest::Client,
}

impl std::fmt::Debug for SuggestionApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionApi")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl SuggestionApi {
    /// Authors provider: people suggested as authors of the content.
    pub fn authors(base_url: &str, endpoint: &str, client: reqwest::Client) -> Self {
        Self {
            name: "Authors Suggestion API".into(),
            system_code: "authors-suggestion-api".into(),
            business_impact: "Suggesting authors from Concept Search won't work".into(),
            base_url: base_url.into(),
            endpoint: endpoint.into(),
            capabilities: vec![Capability::Author],
            client,
        }
    }

    /// Ontotext provider: people, organisations, locations and topics.
    pub fn ontotext(base_url: &str, endpoint: &str, client: reqwest::Client) -> Self {
        Self {
            name: "Ontotext Suggestion API".into(),
            system_code: "ontotext-suggestion-api".into(),
            business_impact:
                "Suggesting locations, organisations, people and topics from Ontotext won't work"
                    .into(),
            base_url: base_url.into(),
            endpoint: endpoint.into(),
            capabilities: vec![
                Capability::Location,
                Capability::Organisation,
                Capability::Person,
                Capability::Topic,
            ],
            client,
        }
    }

    /// Build the provider described by a config entry.
    pub fn from_config(config: &ProviderConfig, client: reqwest::Client) -> Self {
        match config.kind {
            ProviderKind::Authors => Self::authors(&config.base_url, &config.endpoint, client),
            ProviderKind::Ontotext => Self::ontotext(&config.base_url, &config.endpoint, client),
        }
    }

    fn map_status(&self, status: reqwest::StatusCode) -> SuggestError {
        match status.as_u16() {
            204 => SuggestError::NoContent(self.name.clone()),
            400 => SuggestError::BadRequest(self.name.clone()),
            code => SuggestError::Provider(format!("{} returned HTTP {code}", self.name)),
        }
    }
}

#[async_trait]
impl Suggester for SuggestionApi {
    async fn suggest(
        &self,
        payload: &[u8],
        ctx: &RequestContext,
    ) -> Result<Vec<Suggestion>, SuggestError> {
        let url = format!("{}{}", self.base_url, self.endpoint);
        tracing::trace!(provider = %self.name, %url, "requesting suggestions");

        let mut request = http::with_request_headers(self.client.post(&url), ctx)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_vec());
        if let Some(origin) = ctx.origin.as_deref().filter(|o| !o.is_empty()) {
            request = request.header(ORIGIN_HEADER, origin);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SuggestError::Http(format!("{} request failed: {e}", self.name)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(self.map_status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SuggestError::Http(format!("{} response read failed: {e}", self.name)))?;

        let decoded: SuggestionsResponse = serde_json::from_slice(&body)
            .map_err(|e| SuggestError::Decode(format!("{} response: {e}", self.name)))?;

        tracing::debug!(
            provider = %self.name,
            count = decoded.suggestions.len(),
            "provider returned suggestions"
        );
        Ok(decoded.suggestions)
    }

    fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Option<DependencyCheck> {
        Some(DependencyCheck::new(
            &self.system_code,
            &self.name,
            &self.business_impact,
            &self.base_url,
            self.client.clone(),
        ))
    }
}
