//! Pure pipeline steps over position-indexed provider results.
//!
//! Kept free of I/O so the ordering and rehydration rules can be tested
//! without mock servers.

use std::collections::HashMap;

use crate::types::{Concept, ProviderResults, Suggestion};

/// UUIDs of every suggestion, in provider order then suggestion order.
///
/// Duplicates are kept; the concordance client deduplicates before its call.
pub fn collect_uuids(results: &ProviderResults) -> Vec<String> {
    results
        .values()
        .flatten()
        .map(|s| s.uuid().to_owned())
        .collect()
}

/// Replace partial provider concepts with canonical ones.
///
/// Suggestions whose UUID was not resolved, or resolved to a concept
/// without an id, are dropped. Predicates are kept from the provider.
pub fn rehydrate(results: ProviderResults, resolved: &HashMap<String, Concept>) -> ProviderResults {
    results
        .into_iter()
        .map(|(position, suggestions)| {
            let kept = suggestions
                .into_iter()
                .filter_map(|s| {
                    let concept = resolved.get(s.uuid())?;
                    if concept.id.is_empty() {
                        return None;
                    }
                    Some(Suggestion::new(s.predicate, concept.clone()))
                })
                .collect();
            (position, kept)
        })
        .collect()
}

/// Concatenate provider slices in position order, keeping allowed suggestions.
///
/// Within-provider order is preserved. Cross-provider duplicates are kept.
pub fn merge_ordered<F>(results: ProviderResults, allowed: F) -> Vec<Suggestion>
where
    F: Fn(&Suggestion) -> bool,
{
    results
        .into_values()
        .flatten()
        .filter(|s| allowed(s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PERSON_TYPE, PREDICATE_HAS_AUTHOR, PREDICATE_MENTIONS};

    fn partial(uuid: &str, predicate: &str) -> Suggestion {
        Suggestion::new(
            predicate,
            Concept {
                id: format!("http://www.ft.com/thing/{uuid}"),
                pref_label: "provider label".into(),
                ..Default::default()
            },
        )
    }

    fn canonical(uuid: &str) -> Concept {
        Concept {
            id: format!("http://www.ft.com/thing/{uuid}"),
            api_url: format!("http://api.ft.com/people/{uuid}"),
            concept_type: PERSON_TYPE.into(),
            pref_label: format!("Canonical {uuid}"),
            is_ft_author: false,
        }
    }

    fn labels(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.uuid()).collect()
    }

    #[test]
    fn collect_uuids_in_provider_order_with_duplicates() {
        let mut results = ProviderResults::new();
        results.insert(1, vec![partial("c", PREDICATE_MENTIONS)]);
        results.insert(
            0,
            vec![partial("a", PREDICATE_MENTIONS), partial("c", PREDICATE_MENTIONS)],
        );
        assert_eq!(collect_uuids(&results), vec!["a", "c", "c"]);
    }

    #[test]
    fn rehydrate_replaces_concept_and_keeps_predicate() {
        let mut results = ProviderResults::new();
        results.insert(0, vec![partial("a", PREDICATE_HAS_AUTHOR)]);
        let resolved = HashMap::from([("a".to_owned(), canonical("a"))]);

        let out = rehydrate(results, &resolved);
        let s = &out[&0][0];
        assert_eq!(s.predicate, PREDICATE_HAS_AUTHOR);
        assert_eq!(s.concept, canonical("a"));
    }

    #[test]
    fn rehydrate_drops_unresolved_and_empty_concepts() {
        let mut results = ProviderResults::new();
        results.insert(
            0,
            vec![
                partial("a", PREDICATE_MENTIONS),
                partial("missing", PREDICATE_MENTIONS),
                partial("blank", PREDICATE_MENTIONS),
            ],
        );
        let resolved = HashMap::from([
            ("a".to_owned(), canonical("a")),
            ("blank".to_owned(), Concept::default()),
        ]);

        let out = rehydrate(results, &resolved);
        assert_eq!(labels(&out[&0]), vec!["a"]);
    }

    #[test]
    fn rehydrate_keeps_empty_provider_slots() {
        let mut results = ProviderResults::new();
        results.insert(0, vec![]);
        results.insert(1, vec![partial("x", PREDICATE_MENTIONS)]);
        let out = rehydrate(results, &HashMap::new());
        assert_eq!(out.len(), 2);
        assert!(out.values().all(Vec::is_empty));
    }

    #[test]
    fn merge_preserves_provider_then_suggestion_order() {
        let mut results = ProviderResults::new();
        results.insert(1, vec![partial("c", PREDICATE_MENTIONS)]);
        results.insert(
            0,
            vec![partial("a", PREDICATE_MENTIONS), partial("b", PREDICATE_MENTIONS)],
        );
        let merged = merge_ordered(results, |_| true);
        assert_eq!(labels(&merged), vec!["a", "b", "c"]);
    }

    #[test]
    fn merge_keeps_cross_provider_duplicates() {
        let mut results = ProviderResults::new();
        results.insert(0, vec![partial("a", PREDICATE_HAS_AUTHOR)]);
        results.insert(1, vec![partial("a", PREDICATE_MENTIONS)]);
        let merged = merge_ordered(results, |_| true);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].predicate, PREDICATE_HAS_AUTHOR);
        assert_eq!(merged[1].predicate, PREDICATE_MENTIONS);
    }

    #[test]
    fn merge_applies_predicate() {
        let mut results = ProviderResults::new();
        results.insert(
            0,
            vec![partial("a", PREDICATE_MENTIONS), partial("b", PREDICATE_MENTIONS)],
        );
        let merged = merge_ordered(results, |s| s.uuid() != "a");
        assert_eq!(labels(&merged), vec!["b"]);
    }
}
