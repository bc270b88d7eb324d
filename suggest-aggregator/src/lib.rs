//! # suggest-aggregator
//!
//! Aggregates concept suggestions from several independent upstream
//! providers into one ordered list.
//!
//! ## Design
//!
//! - Queries every configured provider concurrently; a failing provider
//!   contributes nothing but never fails the request
//! - Resolves every suggested concept against the concordance store, the one
//!   dependency whose failure fails the request
//! - Drops concepts that are broader than another suggested concept, and
//!   concepts on a cached global denylist
//! - Merges results strictly in configured provider order
//!
//! This crate has no network listener. It is a library driven by an HTTP
//! service.

pub mod broader;
pub mod concordance;
pub mod config;
pub mod denylist;
pub mod error;
pub mod health;
pub mod http;
pub mod orchestrator;
pub mod payload;
pub mod provider;
pub mod providers;
pub mod types;

pub use config::{AggregatorConfig, EndpointConfig, HttpSettings, ProviderConfig, ProviderKind};
pub use error::{Result, SuggestError};
pub use health::{CheckOutcome, DependencyCheck};
pub use orchestrator::Aggregator;
pub use provider::{Capability, Suggester};
pub use types::{Concept, RequestContext, Suggestion, SuggestionsResponse};

/// Run every dependency probe concurrently.
///
/// Outcomes are returned in the order of `checks`.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> suggest_aggregator::Result<()> {
/// let aggregator = suggest_aggregator::Aggregator::from_config(&Default::default())?;
/// let outcomes = suggest_aggregator::probe_all(&aggregator.health_checks()).await;
/// for outcome in &outcomes {
///     println!("{}: {}", outcome.name, outcome.ok);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn probe_all(checks: &[DependencyCheck]) -> Vec<CheckOutcome> {
    futures::future::join_all(checks.iter().map(DependencyCheck::probe)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probe_all_keeps_check_order() {
        let client = reqwest::Client::new();
        let checks = vec![
            DependencyCheck::new("first", "first", "impact", "http://127.0.0.1:1", client.clone()),
            DependencyCheck::new("second", "second", "impact", "http://127.0.0.1:1", client),
        ];
        let outcomes = probe_all(&checks).await;
        let ids: Vec<&str> = outcomes.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert!(outcomes.iter().all(|o| !o.ok));
    }

    #[tokio::test]
    async fn probe_all_with_no_checks_is_empty() {
        assert!(probe_all(&[]).await.is_empty());
    }
}
