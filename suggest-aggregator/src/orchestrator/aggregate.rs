//! The aggregation pipeline: concurrent provider fan-out, concordance
//! resolution, exclusion, ordered merge.
//!
//! Every configured provider is queried concurrently, each tagged with its
//! position in the provider list. Provider failures are logged and count as
//! an empty contribution. The concordance lookup is the only step whose
//! failure fails the request.

use std::sync::Arc;

use crate::broader::BroaderExcluder;
use crate::concordance::ConcordanceClient;
use crate::config::AggregatorConfig;
use crate::denylist::DenylistCache;
use crate::error::SuggestError;
use crate::health::DependencyCheck;
use crate::http;
use crate::payload;
use crate::provider::Suggester;
use crate::providers::SuggestionApi;
use crate::types::{ProviderResults, RequestContext, Suggestion, SuggestionsResponse};

use super::merge::{collect_uuids, merge_ordered, rehydrate};

/// Aggregates suggestions from an ordered list of providers.
///
/// Holds no per-request state. The denylist cache is the only state shared
/// between concurrent calls to [`aggregate`](Self::aggregate).
pub struct Aggregator {
    concordance: ConcordanceClient,
    broader: BroaderExcluder,
    denylist: Arc<DenylistCache>,
    suggesters: Vec<Arc<dyn Suggester>>,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("concordance", &self.concordance)
            .field("broader", &self.broader)
            .field("denylist", &self.denylist)
            .field("providers", &self.provider_names())
            .finish()
    }
}

impl Aggregator {
    /// Assemble an aggregator from its collaborators.
    ///
    /// The order of `suggesters` is the merge order of the response.
    pub fn new(
        concordance: ConcordanceClient,
        broader: BroaderExcluder,
        denylist: Arc<DenylistCache>,
        suggesters: Vec<Arc<dyn Suggester>>,
    ) -> Self {
        Self {
            concordance,
            broader,
            denylist,
            suggesters,
        }
    }

    /// Build every upstream client from configuration.
    ///
    /// All clients share one connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`SuggestError::Config`] if the configuration is invalid, or
    /// [`SuggestError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AggregatorConfig) -> Result<Self, SuggestError> {
        config.validate()?;
        let client = http::build_client(&config.http)?;

        let suggesters = config
            .providers
            .iter()
            .map(|p| Arc::new(SuggestionApi::from_config(p, client.clone())) as Arc<dyn Suggester>)
            .collect();

        Ok(Self::new(
            ConcordanceClient::new(config.concordance.clone(), client.clone()),
            BroaderExcluder::new(config.broader.clone(), client.clone()),
            Arc::new(DenylistCache::new(config.denylist.clone(), client)),
            suggesters,
        ))
    }

    /// The shared denylist cache, e.g. to force a refresh.
    pub fn denylist(&self) -> &Arc<DenylistCache> {
        &self.denylist
    }

    /// Provider names in merge order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.suggesters.iter().map(|s| s.name()).collect()
    }

    /// Liveness probes for every upstream dependency.
    ///
    /// Providers come first in merge order, followed by the concordance
    /// store, the broader-concepts source and the denylist.
    pub fn health_checks(&self) -> Vec<DependencyCheck> {
        let mut checks: Vec<DependencyCheck> =
            self.suggesters.iter().filter_map(|s| s.check()).collect();
        checks.push(self.concordance.check());
        checks.push(self.broader.check());
        checks.push(self.denylist.check());
        checks
    }

    /// Run the full pipeline for one content payload.
    ///
    /// # Pipeline
    ///
    /// 1. Clean the payload text fields (non-article payloads pass through)
    /// 2. Query every provider concurrently, alongside a denylist refresh
    ///    when the cache is dirty
    /// 3. Resolve every suggested UUID against the concordance store
    /// 4. Replace provider concepts with canonical ones, dropping unresolved
    /// 5. Drop concepts broader than another suggested concept
    /// 6. Apply each provider's capability filter to its own slice
    /// 7. Drop denylisted concepts and merge in provider order
    ///
    /// # Errors
    ///
    /// Returns the concordance error (including [`SuggestError::Cancelled`])
    /// if step 3 fails. No other step fails the request.
    pub async fn aggregate(
        &self,
        payload: &[u8],
        ctx: &RequestContext,
    ) -> Result<SuggestionsResponse, SuggestError> {
        let prepared = payload::prepare(payload);
        tracing::debug!(
            transaction_id = %ctx.transaction_id,
            payload = %String::from_utf8_lossy(&prepared),
            "aggregating suggestions"
        );

        let fan_out = futures::future::join_all(self.suggesters.iter().enumerate().map(
            |(position, provider)| {
                let payload: &[u8] = &prepared;
                async move {
                    let suggestions = query_provider(provider.as_ref(), payload, ctx).await;
                    (position, suggestions)
                }
            },
        ));
        let (outcomes, refreshed) = tokio::join!(fan_out, self.denylist.ensure_fresh(ctx));

        if let Err(e) = refreshed {
            tracing::warn!(
                transaction_id = %ctx.transaction_id,
                error = %e,
                "denylist refresh failed, using cached list"
            );
        }

        let results: ProviderResults = outcomes.into_iter().collect();

        let uuids = collect_uuids(&results);
        let resolved = self.concordance.resolve(&uuids, ctx).await.map_err(|e| {
            tracing::error!(
                transaction_id = %ctx.transaction_id,
                error = %e,
                "concordance lookup failed"
            );
            e
        })?;
        let results = rehydrate(results, &resolved);

        let (results, broader_err) = self.broader.exclude(results, ctx).await;
        if let Some(e) = broader_err {
            tracing::warn!(
                transaction_id = %ctx.transaction_id,
                error = %e,
                "broader concept exclusion failed, continuing unfiltered"
            );
        }

        let results: ProviderResults = results
            .into_iter()
            .map(|(position, suggestions)| match self.suggesters.get(position) {
                Some(provider) => (position, provider.filter(suggestions)),
                None => (position, suggestions),
            })
            .collect();

        let suggestions = merge_ordered(results, |s| {
            let allowed = self.denylist.is_allowed(&s.concept.id);
            if !allowed && ctx.is_debug() {
                tracing::info!(
                    transaction_id = %ctx.transaction_id,
                    concept_id = %s.concept.id,
                    "denylisted concept excluded"
                );
            }
            allowed
        });

        tracing::debug!(
            transaction_id = %ctx.transaction_id,
            count = suggestions.len(),
            "aggregation complete"
        );
        Ok(SuggestionsResponse { suggestions })
    }
}

/// Query one provider, turning any failure into an empty contribution.
async fn query_provider(
    provider: &dyn Suggester,
    payload: &[u8],
    ctx: &RequestContext,
) -> Vec<Suggestion> {
    match provider.suggest(payload, ctx).await {
        Ok(suggestions) => {
            tracing::debug!(
                transaction_id = %ctx.transaction_id,
                provider = provider.name(),
                count = suggestions.len(),
                "provider returned suggestions"
            );
            suggestions
        }
        Err(e) if e.is_soft() => {
            tracing::warn!(
                transaction_id = %ctx.transaction_id,
                provider = provider.name(),
                error = %e,
                "provider returned no suggestions"
            );
            Vec::new()
        }
        Err(e) => {
            tracing::error!(
                transaction_id = %ctx.transaction_id,
                provider = provider.name(),
                error = %e,
                "provider query failed"
            );
            Vec::new()
        }
    }
}
