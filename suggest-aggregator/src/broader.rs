//! Broader-concept exclusion.
//!
//! When a concept and one of its broader ancestors are suggested in the same
//! batch, the ancestor is redundant: only the narrower concept is kept. The
//! check runs over the combined set from every provider, because the
//! redundancy often spans two providers.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::config::EndpointConfig;
use crate::error::SuggestError;
use crate::health::DependencyCheck;
use crate::http;
use crate::types::{uuid_of, ProviderResults, RequestContext};

#[derive(Debug, Default, Deserialize)]
struct BroaderResponse {
    #[serde(default)]
    things: HashMap<String, Thing>,
}

#[derive(Debug, Default, Deserialize)]
struct Thing {
    #[serde(default, rename = "broaderConcepts")]
    broader_concepts: Vec<BroaderConcept>,
}

#[derive(Debug, Default, Deserialize)]
struct BroaderConcept {
    #[serde(default)]
    id: String,
}

/// Client for the public things API, used to drop broader concepts.
#[derive(Debug, Clone)]
pub struct BroaderExcluder {
    endpoint: EndpointConfig,
    client: reqwest::Client,
}

impl BroaderExcluder {
    /// Create an excluder for the given endpoint.
    pub fn new(endpoint: EndpointConfig, client: reqwest::Client) -> Self {
        Self { endpoint, client }
    }

    /// Remove suggestions whose concept is broader than another suggested concept.
    ///
    /// Returns the filtered results and no error on success. When the remote
    /// lookup fails the input is returned untouched alongside the error; the
    /// caller decides what to do with it.
    pub async fn exclude(
        &self,
        results: ProviderResults,
        ctx: &RequestContext,
    ) -> (ProviderResults, Option<SuggestError>) {
        let mut seen = HashSet::new();
        let uuids: Vec<String> = results
            .values()
            .flatten()
            .map(|s| s.uuid().to_owned())
            .filter(|u| seen.insert(u.clone()))
            .collect();

        if uuids.is_empty() {
            return (results, None);
        }

        let broader = match self.fetch_broader(&uuids, ctx).await {
            Ok(broader) => broader,
            Err(err) => return (results, Some(err)),
        };
        if broader.is_empty() {
            return (results, None);
        }

        let filtered = results
            .into_iter()
            .map(|(position, suggestions)| {
                let kept = suggestions
                    .into_iter()
                    .filter(|s| {
                        let excluded = broader.contains(s.uuid());
                        if excluded && ctx.is_debug() {
                            tracing::info!(
                                transaction_id = %ctx.transaction_id,
                                excluded_id = %s.concept.id,
                                excluded_pref_label = %s.concept.pref_label,
                                "broader concept excluded"
                            );
                        }
                        !excluded
                    })
                    .collect();
                (position, kept)
            })
            .collect();

        (filtered, None)
    }

    /// UUIDs that are broader than at least one of `uuids`.
    async fn fetch_broader(
        &self,
        uuids: &[String],
        ctx: &RequestContext,
    ) -> Result<HashSet<String>, SuggestError> {
        let base = self.endpoint.base_url.trim_end_matches('/');
        let path = format!("/{}", self.endpoint.endpoint.trim_matches('/'));

        let mut pairs: Vec<(&str, &str)> = uuids.iter().map(|u| ("uuid", u.as_str())).collect();
        pairs.push(("showRelationship", "broader"));
        pairs.push(("showRelationship", "broaderTransitive"));
        let url = http::url_with_query(base, &path, &pairs)?;

        let response = http::with_request_headers(self.client.get(url), ctx)
            .send()
            .await
            .map_err(|e| SuggestError::Broader(format!("request failed: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SuggestError::Broader(format!(
                "non 200 status code returned: {}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SuggestError::Broader(format!("response read failed: {e}")))?;
        let decoded: BroaderResponse = serde_json::from_slice(&body)
            .map_err(|e| SuggestError::Broader(format!("invalid response body: {e}")))?;

        Ok(decoded
            .things
            .into_values()
            .flat_map(|thing| thing.broader_concepts)
            .map(|broader| uuid_of(&broader.id).to_owned())
            .collect())
    }

    /// Liveness probe description.
    pub fn check(&self) -> DependencyCheck {
        DependencyCheck::new(
            "public-things-api",
            "public-things-api",
            "Excluding broader concepts will not work",
            &self.endpoint.base_url,
            self.client.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Concept, Suggestion, PREDICATE_MENTIONS};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn suggestion(uuid: &str) -> Suggestion {
        Suggestion::new(
            PREDICATE_MENTIONS,
            Concept {
                id: format!("http://www.ft.com/thing/{uuid}"),
                pref_label: uuid.to_uppercase(),
                ..Default::default()
            },
        )
    }

    fn results(groups: &[&[&str]]) -> ProviderResults {
        groups
            .iter()
            .enumerate()
            .map(|(i, uuids)| (i, uuids.iter().map(|u| suggestion(u)).collect()))
            .collect()
    }

    fn uuids(results: &ProviderResults, position: usize) -> Vec<String> {
        results[&position].iter().map(|s| s.uuid().to_owned()).collect()
    }

    fn excluder_for(server: &MockServer) -> BroaderExcluder {
        BroaderExcluder::new(
            EndpointConfig::new(format!("{}/", server.uri()), "/things/"),
            reqwest::Client::new(),
        )
    }

    #[tokio::test]
    async fn removes_broader_concept_across_providers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/things"))
            .and(query_param("uuid", "narrow"))
            .and(query_param("showRelationship", "broaderTransitive"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "things": {
                    "narrow": {
                        "id": "http://www.ft.com/thing/narrow",
                        "broaderConcepts": [{"id": "http://www.ft.com/thing/wide"}]
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (filtered, err) = excluder_for(&server)
            .exclude(
                results(&[&["wide", "other"], &["narrow"]]),
                &RequestContext::new("tid"),
            )
            .await;
        assert!(err.is_none());
        assert_eq!(uuids(&filtered, 0), vec!["other"]);
        assert_eq!(uuids(&filtered, 1), vec!["narrow"]);
    }

    #[tokio::test]
    async fn no_relationships_returns_input_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"things": {}})))
            .mount(&server)
            .await;

        let input = results(&[&["a", "b"], &["c"]]);
        let (filtered, err) = excluder_for(&server)
            .exclude(input.clone(), &RequestContext::new("tid"))
            .await;
        assert!(err.is_none());
        assert_eq!(filtered, input);
    }

    #[tokio::test]
    async fn empty_input_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let (filtered, err) = excluder_for(&server)
            .exclude(results(&[&[], &[]]), &RequestContext::new("tid"))
            .await;
        assert!(err.is_none());
        assert!(filtered.values().all(Vec::is_empty));
    }

    #[tokio::test]
    async fn failure_returns_input_with_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let input = results(&[&["a"], &["b"]]);
        let (filtered, err) = excluder_for(&server)
            .exclude(input.clone(), &RequestContext::new("tid"))
            .await;
        assert_eq!(filtered, input);
        let err = err.expect("remote failure is reported");
        assert!(matches!(err, SuggestError::Broader(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn sends_each_uuid_once_with_both_relationships() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"things": {}})))
            .expect(1)
            .mount(&server)
            .await;

        excluder_for(&server)
            .exclude(results(&[&["a", "b"], &["a"]]), &RequestContext::new("tid"))
            .await;

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(
            requests[0].url.query(),
            Some("uuid=a&uuid=b&showRelationship=broader&showRelationship=broaderTransitive")
        );
    }
}
