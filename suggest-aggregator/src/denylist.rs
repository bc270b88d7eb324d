//! Cached global denylist of concept UUIDs.
//!
//! The list is fetched lazily on first use and then reused until someone
//! asks for a refresh. It is the only state shared between concurrent
//! requests: readers take the read lock, a refresh swaps the list under the
//! write lock after the remote fetch has completed.
//!
//! Refreshes are serialised by an async mutex. A caller that needs a fresh
//! list while another refresh is in flight waits for it rather than reading
//! the stale list.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::EndpointConfig;
use crate::error::SuggestError;
use crate::health::DependencyCheck;
use crate::http;
use crate::types::RequestContext;

#[derive(Debug, Default, Deserialize)]
struct DenylistResponse {
    #[serde(default)]
    uuids: Vec<String>,
}

/// In-memory denylist with explicit, caller-driven refresh.
///
/// Staleness is tracked as two generations: `requested` is bumped by
/// [`mark_dirty`](Self::mark_dirty) and `loaded` records the request
/// generation the cached list satisfies. The cache is dirty while
/// `loaded < requested`.
#[derive(Debug)]
pub struct DenylistCache {
    endpoint: EndpointConfig,
    client: reqwest::Client,
    denied: RwLock<Vec<String>>,
    requested: AtomicU64,
    loaded: AtomicU64,
    refresh_lock: Mutex<()>,
}

impl DenylistCache {
    /// Create an empty cache. It starts dirty, so the first use fetches.
    pub fn new(endpoint: EndpointConfig, client: reqwest::Client) -> Self {
        Self {
            endpoint,
            client,
            denied: RwLock::new(Vec::new()),
            requested: AtomicU64::new(1),
            loaded: AtomicU64::new(0),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Whether `concept_id` may be suggested.
    ///
    /// A concept is denied when its id contains any denylisted UUID. An
    /// empty (or never populated) list allows everything.
    pub fn is_allowed(&self, concept_id: &str) -> bool {
        match self.denied.read() {
            Ok(denied) => !denied
                .iter()
                .any(|uuid| !uuid.is_empty() && concept_id.contains(uuid.as_str())),
            Err(_) => {
                tracing::error!("denylist lock poisoned, allowing concept");
                true
            }
        }
    }

    /// Whether the next [`ensure_fresh`](Self::ensure_fresh) will fetch.
    pub fn is_dirty(&self) -> bool {
        self.loaded.load(Ordering::Acquire) < self.requested.load(Ordering::Acquire)
    }

    /// Force a fetch on next use.
    ///
    /// A refresh already in flight does not satisfy this request.
    pub fn mark_dirty(&self) {
        self.requested.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of denied UUIDs currently cached.
    pub fn len(&self) -> usize {
        self.denied.read().map(|d| d.len()).unwrap_or(0)
    }

    /// Whether the cached list is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refresh only if the cache is dirty.
    ///
    /// If another refresh is in flight this waits for it, and fetches again
    /// only when that refresh failed or the cache was marked dirty meanwhile.
    ///
    /// # Errors
    ///
    /// Same as [`refresh`](Self::refresh).
    pub async fn ensure_fresh(&self, ctx: &RequestContext) -> Result<(), SuggestError> {
        if !self.is_dirty() {
            return Ok(());
        }
        let _permit = self.acquire(ctx).await?;
        if !self.is_dirty() {
            return Ok(());
        }
        self.refresh_locked(ctx).await
    }

    /// Fetch the current denylist and replace the cached one.
    ///
    /// Waits for any refresh already in flight. On failure the previous list
    /// stays in place and the cache stays dirty.
    ///
    /// # Errors
    ///
    /// - [`SuggestError::Denylist`] on transport failure, non-200 status or
    ///   an undecodable body
    /// - [`SuggestError::Cancelled`] if `ctx.cancel` fires first
    pub async fn refresh(&self, ctx: &RequestContext) -> Result<(), SuggestError> {
        let _permit = self.acquire(ctx).await?;
        self.refresh_locked(ctx).await
    }

    async fn acquire(
        &self,
        ctx: &RequestContext,
    ) -> Result<tokio::sync::MutexGuard<'_, ()>, SuggestError> {
        tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => {
                Err(SuggestError::Cancelled("denylist refresh".into()))
            }
            permit = self.refresh_lock.lock() => Ok(permit),
        }
    }

    /// Caller must hold `refresh_lock`.
    async fn refresh_locked(&self, ctx: &RequestContext) -> Result<(), SuggestError> {
        let target = self.requested.load(Ordering::Acquire);

        let uuids = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => {
                return Err(SuggestError::Cancelled("denylist refresh".into()));
            }
            result = self.fetch(ctx) => result?,
        };

        let count = uuids.len();
        let mut denied = self
            .denied
            .write()
            .map_err(|_| SuggestError::Denylist("denylist lock poisoned".into()))?;
        *denied = uuids;
        drop(denied);
        self.loaded.fetch_max(target, Ordering::AcqRel);

        tracing::info!(
            transaction_id = %ctx.transaction_id,
            count,
            "denylist refreshed"
        );
        Ok(())
    }

    async fn fetch(&self, ctx: &RequestContext) -> Result<Vec<String>, SuggestError> {
        let url = format!("{}{}", self.endpoint.base_url, self.endpoint.endpoint);
        let response = http::with_request_headers(self.client.get(&url), ctx)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SuggestError::Denylist(format!("request failed: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SuggestError::Denylist(format!(
                "concept-suggestions-blacklister returned HTTP {}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SuggestError::Denylist(format!("response read failed: {e}")))?;
        let decoded: DenylistResponse = serde_json::from_slice(&body)
            .map_err(|e| SuggestError::Denylist(format!("invalid response body: {e}")))?;
        Ok(decoded.uuids)
    }

    /// Liveness probe description.
    pub fn check(&self) -> DependencyCheck {
        DependencyCheck::new(
            "concept-suggestions-blacklister",
            "concept-suggestions-blacklister",
            "Suggestions vetoing will not work",
            &self.endpoint.base_url,
            self.client.clone(),
        )
    }
}
