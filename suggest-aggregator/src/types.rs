//! Core types: concepts, suggestions, and the per-request context.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// Ontology type URI for people.
pub const PERSON_TYPE: &str = "http://www.ft.com/ontology/person/Person";
/// Ontology type URI for organisations.
pub const ORGANISATION_TYPE: &str = "http://www.ft.com/ontology/organisation/Organisation";
/// Ontology type URI for locations.
pub const LOCATION_TYPE: &str = "http://www.ft.com/ontology/Location";
/// Ontology type URI for topics.
pub const TOPIC_TYPE: &str = "http://www.ft.com/ontology/Topic";

/// Annotation predicate: the concept is mentioned in the content.
pub const PREDICATE_MENTIONS: &str = "http://www.ft.com/ontology/annotation/mentions";
/// Annotation predicate: the concept authored the content.
pub const PREDICATE_HAS_AUTHOR: &str = "http://www.ft.com/ontology/annotation/hasAuthor";

/// A canonical concept as held by the concordance store.
///
/// Identity is [`Concept::id`], a URI whose last path segment is a UUID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Concept {
    /// Concept URI, e.g. `http://www.ft.com/thing/<uuid>`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Public API URL for the concept.
    #[serde(rename = "apiUrl", skip_serializing_if = "String::is_empty")]
    pub api_url: String,
    /// Ontology type URI.
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub concept_type: String,
    /// Preferred human-readable label.
    #[serde(rename = "prefLabel", skip_serializing_if = "String::is_empty")]
    pub pref_label: String,
    /// Whether the concept is a staff author.
    #[serde(rename = "isFTAuthor", skip_serializing_if = "is_false")]
    pub is_ft_author: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Concept {
    /// The UUID of this concept: the last path segment of its id.
    pub fn uuid(&self) -> &str {
        uuid_of(&self.id)
    }
}

/// Extract the last path segment of a concept URI.
///
/// Trailing slashes are ignored, so `http://x/thing/abc/` yields `abc`.
pub fn uuid_of(id: &str) -> &str {
    let trimmed = id.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// A concept proposed by a provider under a given predicate.
///
/// On the wire the concept fields sit next to `predicate` in one flat object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Relation under which the concept applies (mentions, hasAuthor, ...).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub predicate: String,
    /// The suggested concept.
    #[serde(flatten)]
    pub concept: Concept,
}

impl Suggestion {
    /// Build a suggestion from a predicate and a concept.
    pub fn new(predicate: impl Into<String>, concept: Concept) -> Self {
        Self {
            predicate: predicate.into(),
            concept,
        }
    }

    /// Shorthand for `self.concept.uuid()`.
    pub fn uuid(&self) -> &str {
        self.concept.uuid()
    }
}

/// Response body shared by providers and by the aggregate endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    /// Ordered suggestions. Always serialised as an array.
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

/// Suggestions keyed by the provider's position in the configured list.
///
/// The position is the sole ordering key for the final merge.
pub type ProviderResults = BTreeMap<usize, Vec<Suggestion>>;

/// Per-request metadata threaded through every upstream call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Transaction id, propagated as `X-Request-Id`.
    pub transaction_id: String,
    /// Calling system, propagated as `X-Origin` to providers.
    pub origin: Option<String>,
    /// Debug flag, propagated as the `debug` header and enabling verbose logs.
    pub debug: Option<String>,
    /// Cancels in-flight concordance and denylist calls.
    pub cancel: CancellationToken,
}

impl RequestContext {
    /// A context with the given transaction id and no flags.
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            origin: None,
            debug: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the origin system.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Set the debug flag.
    pub fn with_debug(mut self, debug: impl Into<String>) -> Self {
        self.debug = Some(debug.into());
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Whether verbose debug logging was requested.
    pub fn is_debug(&self) -> bool {
        self.debug.as_deref().is_some_and(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(uuid: &str) -> Concept {
        Concept {
            id: format!("http://www.ft.com/thing/{uuid}"),
            api_url: format!("http://api.ft.com/people/{uuid}"),
            concept_type: PERSON_TYPE.into(),
            pref_label: "Lawrence Summers".into(),
            is_ft_author: true,
        }
    }

    #[test]
    fn uuid_is_last_path_segment() {
        let concept = person("9a5e3b4a-55da-498c-816f-9c534e1392bd");
        assert_eq!(concept.uuid(), "9a5e3b4a-55da-498c-816f-9c534e1392bd");
    }

    #[test]
    fn uuid_ignores_trailing_slash() {
        assert_eq!(uuid_of("http://www.ft.com/thing/abc/"), "abc");
    }

    #[test]
    fn uuid_of_bare_value_is_itself() {
        assert_eq!(uuid_of("abc"), "abc");
    }

    #[test]
    fn suggestion_serialises_flat() {
        let suggestion = Suggestion::new(PREDICATE_HAS_AUTHOR, person("u1"));
        let json = serde_json::to_value(&suggestion).expect("serialize");
        assert_eq!(json["predicate"], PREDICATE_HAS_AUTHOR);
        assert_eq!(json["id"], "http://www.ft.com/thing/u1");
        assert_eq!(json["apiUrl"], "http://api.ft.com/people/u1");
        assert_eq!(json["type"], PERSON_TYPE);
        assert_eq!(json["isFTAuthor"], true);
    }

    #[test]
    fn empty_fields_are_omitted() {
        let suggestion = Suggestion::new(
            PREDICATE_MENTIONS,
            Concept {
                id: "http://www.ft.com/thing/u2".into(),
                ..Default::default()
            },
        );
        let json = serde_json::to_value(&suggestion).expect("serialize");
        assert!(json.get("apiUrl").is_none());
        assert!(json.get("isFTAuthor").is_none());
    }

    #[test]
    fn provider_payload_deserialises_with_missing_fields() {
        let raw = r#"{"suggestions":[{"id":"http://www.ft.com/thing/u3","type":"http://www.ft.com/ontology/Location"}]}"#;
        let resp: SuggestionsResponse = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(resp.suggestions.len(), 1);
        assert_eq!(resp.suggestions[0].predicate, "");
        assert_eq!(resp.suggestions[0].concept.concept_type, LOCATION_TYPE);
        assert!(!resp.suggestions[0].concept.is_ft_author);
    }

    #[test]
    fn empty_response_serialises_as_array() {
        let json = serde_json::to_string(&SuggestionsResponse::default()).expect("serialize");
        assert_eq!(json, r#"{"suggestions":[]}"#);
    }

    #[test]
    fn request_context_builders() {
        let ctx = RequestContext::new("tid_1")
            .with_origin("spark")
            .with_debug("true");
        assert_eq!(ctx.transaction_id, "tid_1");
        assert_eq!(ctx.origin.as_deref(), Some("spark"));
        assert!(ctx.is_debug());
        assert!(!RequestContext::new("tid_2").is_debug());
    }
}
