//! Upstream dependency configuration with sensible defaults.
//!
//! [`AggregatorConfig`] names every service the aggregator talks to and the
//! order in which providers are merged. The defaults match the in-cluster
//! service names, so only overrides need to be supplied.

use serde::{Deserialize, Serialize};

use crate::error::SuggestError;

/// Settings for the shared HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout in seconds. Bounds every provider call.
    pub timeout_seconds: u64,
    /// Maximum idle pooled connections kept per upstream host.
    pub max_idle_per_host: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            max_idle_per_host: 128,
        }
    }
}

/// Location of one upstream endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Scheme, host and port, e.g. `http://public-things-api:8080`.
    pub base_url: String,
    /// Path appended to `base_url` for the main call.
    pub endpoint: String,
}

impl EndpointConfig {
    /// Build an endpoint from its two parts.
    pub fn new(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Which deployed suggestion provider a configured entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Suggests authors (people under `hasAuthor`).
    Authors,
    /// NLP tagger suggesting people, organisations, locations and topics.
    Ontotext,
}

/// One provider in the ordered provider list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider variant.
    pub kind: ProviderKind,
    /// Scheme, host and port.
    pub base_url: String,
    /// Suggestion endpoint path.
    pub endpoint: String,
}

/// Configuration for the whole aggregation pipeline.
///
/// Use [`Default::default()`] for the in-cluster defaults, or construct with
/// field overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Shared HTTP client settings.
    pub http: HttpSettings,
    /// Providers in merge order. Position in this list is the ordering key.
    pub providers: Vec<ProviderConfig>,
    /// Concordance store.
    pub concordance: EndpointConfig,
    /// Broader-relationships source.
    pub broader: EndpointConfig,
    /// Global denylist.
    pub denylist: EndpointConfig,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            http: HttpSettings::default(),
            providers: vec![
                ProviderConfig {
                    kind: ProviderKind::Authors,
                    base_url: "http://authors-suggestion-api:8080".into(),
                    endpoint: "/content/suggest/authors".into(),
                },
                ProviderConfig {
                    kind: ProviderKind::Ontotext,
                    base_url: "http://ontotext-suggestion-api:8080".into(),
                    endpoint: "/content/suggest/ontotext".into(),
                },
            ],
            concordance: EndpointConfig::new(
                "http://internal-concordances:8080",
                "/internalconcordances",
            ),
            broader: EndpointConfig::new("http://public-things-api:8080", "/things"),
            denylist: EndpointConfig::new(
                "http://concept-suggestions-blacklister:8080",
                "/blacklist",
            ),
        }
    }
}

impl AggregatorConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `http.timeout_seconds` must be greater than 0
    /// - `providers` must not be empty
    /// - every base URL must be non-empty
    pub fn validate(&self) -> Result<(), SuggestError> {
        if self.http.timeout_seconds == 0 {
            return Err(SuggestError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.providers.is_empty() {
            return Err(SuggestError::Config(
                "at least one provider must be configured".into(),
            ));
        }
        for (i, provider) in self.providers.iter().enumerate() {
            if provider.base_url.trim().is_empty() {
                return Err(SuggestError::Config(format!(
                    "provider {i} has an empty base_url"
                )));
            }
        }
        for (label, endpoint) in [
            ("concordance", &self.concordance),
            ("broader", &self.broader),
            ("denylist", &self.denylist),
        ] {
            if endpoint.base_url.trim().is_empty() {
                return Err(SuggestError::Config(format!(
                    "{label} base_url must not be empty"
                )));
            }
        }
        Ok(())
    }
}
