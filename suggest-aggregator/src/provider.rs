//! Trait definition for pluggable suggestion providers.
//!
//! Each upstream tagger implements [`Suggester`] so the orchestrator can hold
//! a fixed, ordered list of heterogeneous providers behind one interface.

use async_trait::async_trait;

use crate::error::SuggestError;
use crate::health::DependencyCheck;
use crate::types::{
    LOCATION_TYPE, ORGANISATION_TYPE, PERSON_TYPE, PREDICATE_HAS_AUTHOR, RequestContext,
    Suggestion, TOPIC_TYPE,
};

/// What kind of concept a provider is trusted to produce.
///
/// A closed set: adding a capability forces every `match` below to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// People, under any predicate.
    Person,
    /// Locations.
    Location,
    /// Organisations.
    Organisation,
    /// Topics.
    Topic,
    /// People under the `hasAuthor` predicate only.
    Author,
}

impl Capability {
    /// Whether a suggestion with this type and predicate falls under the capability.
    pub fn accepts(&self, concept_type: &str, predicate: &str) -> bool {
        match self {
            Self::Person => concept_type == PERSON_TYPE,
            Self::Location => concept_type == LOCATION_TYPE,
            Self::Organisation => concept_type == ORGANISATION_TYPE,
            Self::Topic => concept_type == TOPIC_TYPE,
            Self::Author => concept_type == PERSON_TYPE && predicate == PREDICATE_HAS_AUTHOR,
        }
    }

    /// Whether any of `capabilities` accepts the suggestion.
    pub fn any_accepts(capabilities: &[Capability], suggestion: &Suggestion) -> bool {
        capabilities.iter().any(|c| {
            c.accepts(&suggestion.concept.concept_type, &suggestion.predicate)
        })
    }
}

/// An upstream suggestion provider.
///
/// Implementors own their transport and status handling:
///
/// - send the payload verbatim with transaction/origin propagation
/// - map HTTP 204 and 400 to the soft [`SuggestError::NoContent`] /
///   [`SuggestError::BadRequest`] kinds
/// - map every other failure to a hard error
///
/// All implementations must be `Send + Sync` for concurrent fan-out.
#[async_trait]
pub trait Suggester: Send + Sync {
    /// Ask the provider for suggestions for `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`SuggestError`] if the provider fails; the orchestrator treats
    /// any error as an empty contribution.
    async fn suggest(
        &self,
        payload: &[u8],
        ctx: &RequestContext,
    ) -> Result<Vec<Suggestion>, SuggestError>;

    /// Keep only the suggestions this provider is trusted to produce.
    fn filter(&self, suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
        let capabilities = self.capabilities();
        suggestions
            .into_iter()
            .filter(|s| Capability::any_accepts(capabilities, s))
            .collect()
    }

    /// Capabilities declared by this provider.
    fn capabilities(&self) -> &[Capability];

    /// Display name used in logs and errors.
    fn name(&self) -> &str;

    /// Liveness probe description, if the provider exposes one.
    fn check(&self) -> Option<DependencyCheck> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Concept, PREDICATE_MENTIONS};

    fn suggestion(concept_type: &str, predicate: &str) -> Suggestion {
        Suggestion::new(
            predicate,
            Concept {
                id: "http://www.ft.com/thing/x".into(),
                concept_type: concept_type.into(),
                ..Default::default()
            },
        )
    }

    /// A mock provider for testing trait bounds and the default filter.
    struct MockProvider {
        capabilities: Vec<Capability>,
        results: Vec<Suggestion>,
    }

    #[async_trait]
    impl Suggester for MockProvider {
        async fn suggest(
            &self,
            _payload: &[u8],
            _ctx: &RequestContext,
        ) -> Result<Vec<Suggestion>, SuggestError> {
            if self.results.is_empty() {
                return Err(SuggestError::NoContent("mock".into()));
            }
            Ok(self.results.clone())
        }

        fn capabilities(&self) -> &[Capability] {
            &self.capabilities
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn person_accepts_any_predicate() {
        assert!(Capability::Person.accepts(PERSON_TYPE, PREDICATE_MENTIONS));
        assert!(Capability::Person.accepts(PERSON_TYPE, PREDICATE_HAS_AUTHOR));
        assert!(!Capability::Person.accepts(LOCATION_TYPE, PREDICATE_MENTIONS));
    }

    #[test]
    fn author_requires_person_and_has_author() {
        assert!(Capability::Author.accepts(PERSON_TYPE, PREDICATE_HAS_AUTHOR));
        assert!(!Capability::Author.accepts(PERSON_TYPE, PREDICATE_MENTIONS));
        assert!(!Capability::Author.accepts(ORGANISATION_TYPE, PREDICATE_HAS_AUTHOR));
    }

    #[test]
    fn type_capabilities_match_their_uri() {
        assert!(Capability::Location.accepts(LOCATION_TYPE, ""));
        assert!(Capability::Organisation.accepts(ORGANISATION_TYPE, ""));
        assert!(Capability::Topic.accepts(TOPIC_TYPE, ""));
        assert!(!Capability::Topic.accepts(LOCATION_TYPE, ""));
    }

    #[test]
    fn default_filter_keeps_declared_capabilities_in_order() {
        let provider = MockProvider {
            capabilities: vec![Capability::Location, Capability::Organisation],
            results: vec![],
        };
        let input = vec![
            suggestion(ORGANISATION_TYPE, PREDICATE_MENTIONS),
            suggestion(PERSON_TYPE, PREDICATE_MENTIONS),
            suggestion(LOCATION_TYPE, PREDICATE_MENTIONS),
        ];
        let kept = provider.filter(input);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].concept.concept_type, ORGANISATION_TYPE);
        assert_eq!(kept[1].concept.concept_type, LOCATION_TYPE);
    }

    #[test]
    fn no_capabilities_filters_everything() {
        let provider = MockProvider {
            capabilities: vec![],
            results: vec![],
        };
        assert!(provider
            .filter(vec![suggestion(PERSON_TYPE, PREDICATE_MENTIONS)])
            .is_empty());
    }

    #[test]
    fn mock_provider_is_object_safe_and_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn Suggester>();
        let boxed: Box<dyn Suggester> = Box::new(MockProvider {
            capabilities: vec![Capability::Person],
            results: vec![],
        });
        assert_eq!(boxed.name(), "mock");
        assert!(boxed.check().is_none());
    }

    #[tokio::test]
    async fn mock_provider_propagates_errors() {
        let provider = MockProvider {
            capabilities: vec![Capability::Person],
            results: vec![],
        };
        let err = provider
            .suggest(b"{}", &RequestContext::new("tid_test"))
            .await
            .unwrap_err();
        assert!(err.is_soft());
    }
}
