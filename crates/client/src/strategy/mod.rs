//! Strategy executors.
//!
//! ### network-only
//! Fetch and return verbatim. Never touches the store.
//!
//! ### cache-first
//! Serve the active generation's entry when present, without revalidation.
//! On a miss, fetch, store a copy, return. If the fetch is rejected, CSS and
//! JS requests get an empty stub of the right content type; anything else
//! propagates the failure.
//!
//! ### network-first
//! Fetch, store a copy, return the live response (4xx/5xx included). If the
//! fetch is rejected: the stored entry, then the offline document, then an
//! inline offline page.
//!
//! Store failures are logged and swallowed; they never cost the caller a
//! response.

mod offline;

use std::sync::Arc;

use offgrid_core::{CacheStore, Error, Generation, RequestDescriptor, Response, Strategy};
use url::Url;

pub use offline::{OfflineFallback, stub_for_extension};

/// Runs the three strategies against a store and a network.
pub struct Executor {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn crate::fetch::Network>,
    fallback: OfflineFallback,
}

impl Executor {
    pub fn new(
        store: Arc<dyn CacheStore>, network: Arc<dyn crate::fetch::Network>, fallback: OfflineFallback,
    ) -> Self {
        Self { store, network, fallback }
    }

    /// Serve `request` with `strategy` against the `generation` store.
    pub async fn execute(
        &self, strategy: Strategy, generation: &Generation, request: &RequestDescriptor,
    ) -> Result<Response, Error> {
        match strategy {
            Strategy::NetworkOnly => self.network_only(request).await,
            Strategy::CacheFirst => self.cache_first(generation, request).await,
            Strategy::NetworkFirst => self.network_first(generation, request).await,
        }
    }

    pub async fn network_only(&self, request: &RequestDescriptor) -> Result<Response, Error> {
        self.network.fetch(request).await
    }

    pub async fn cache_first(&self, generation: &Generation, request: &RequestDescriptor) -> Result<Response, Error> {
        if let Some(cached) = self.lookup(generation, request.locator(), request).await {
            tracing::debug!(url = %request.url, %generation, "cache-first hit");
            return Ok(cached);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_copy(generation, request, &response).await;
                Ok(response)
            }
            Err(Error::NetworkFailure(reason)) => match request.extension().and_then(stub_for_extension) {
                Some(stub) => {
                    tracing::debug!(url = %request.url, %reason, "cache-first miss offline, serving empty stub");
                    Ok(stub)
                }
                None => Err(Error::NetworkFailure(reason)),
            },
            Err(e) => Err(e),
        }
    }

    pub async fn network_first(&self, generation: &Generation, request: &RequestDescriptor) -> Result<Response, Error> {
        let reason = match self.network.fetch(request).await {
            Ok(response) => {
                self.store_copy(generation, request, &response).await;
                return Ok(response);
            }
            Err(Error::NetworkFailure(reason)) => reason,
            Err(e) => return Err(e),
        };

        if let Some(cached) = self.lookup(generation, request.locator(), request).await {
            tracing::debug!(url = %request.url, %reason, "network-first offline, serving cached entry");
            return Ok(cached);
        }

        if let Some(document) = self.fallback.document.as_ref()
            && let Some(cached) = self.lookup(generation, document.as_str(), request).await
        {
            tracing::debug!(url = %request.url, document = %document, "network-first offline, serving offline document");
            return Ok(cached);
        }

        tracing::debug!(url = %request.url, %reason, "network-first offline, serving inline offline page");
        Ok(self.fallback.inline_page())
    }

    /// Active-store lookup; store failures read as a miss.
    async fn lookup(&self, generation: &Generation, locator: &str, request: &RequestDescriptor) -> Option<Response> {
        match self.store.match_entry(generation.as_str(), "GET", locator).await {
            Ok(found) => found.map(|snapshot| snapshot.response),
            Err(e) => {
                tracing::warn!(url = %request.url, %generation, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Store a copy of a fetched response. Never fails the caller.
    async fn store_copy(&self, generation: &Generation, request: &RequestDescriptor, response: &Response) {
        if !request.is_get() {
            return;
        }

        match self
            .store
            .put_entry(generation.as_str(), &request.method, request.locator(), response)
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::debug!(url = %request.url, %generation, "store no longer exists, response not cached"),
            Err(e) => tracing::warn!(url = %request.url, %generation, error = %e, "failed to cache response"),
        }
    }
}

/// Resolve the configured offline document against the scope.
pub fn offline_document(scope: &Url, locator: Option<&str>) -> Result<Option<Url>, Error> {
    locator
        .map(|l| offgrid_core::locator::resolve(scope, l).map_err(|e| Error::InvalidLocator(format!("{l}: {e}"))))
        .transpose()
}
