//! Request routing policy.
//!
//! Every intercepted request is mapped to a [`Route`] by an ordered rule list;
//! the first rule that matches wins:
//!
//! 1. non-`GET` methods and non-http(s) schemes pass through untouched
//! 2. realtime-backend hosts (and configured realtime locators) → network-only
//! 3. `Accept` containing `text/html` → network-first
//! 4. static-asset file extensions → cache-first
//! 5. everything else → network-first

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::request::RequestDescriptor;

/// Default static-asset extensions served cache-first.
pub const DEFAULT_STATIC_EXTENSIONS: &[&str] =
    &["css", "js", "png", "jpg", "jpeg", "svg", "gif", "woff", "woff2", "ttf", "eot", "ico"];

/// Default realtime-backend domains (auth, datastore, object storage).
pub const DEFAULT_REALTIME_DOMAINS: &[&str] = &["googleapis.com", "firebaseio.com", "firebasestorage.app"];

/// How a request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    NetworkOnly,
    NetworkFirst,
    CacheFirst,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::NetworkOnly => "network-only",
            Strategy::NetworkFirst => "network-first",
            Strategy::CacheFirst => "cache-first",
        }
    }
}

/// Classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted; the host performs the request itself.
    PassThrough,
    Handle(Strategy),
}

/// The routing table.
#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    realtime_domains: Vec<String>,
    realtime_locators: HashSet<String>,
    static_extensions: HashSet<String>,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_REALTIME_DOMAINS.iter().map(|d| d.to_string()),
            std::iter::empty::<String>(),
            DEFAULT_STATIC_EXTENSIONS.iter().map(|e| e.to_string()),
        )
    }
}

impl RoutingPolicy {
    /// Build a policy table.
    ///
    /// `realtime_locators` must already be resolved to absolute URLs.
    pub fn new(
        realtime_domains: impl IntoIterator<Item = String>, realtime_locators: impl IntoIterator<Item = String>,
        static_extensions: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            realtime_domains: realtime_domains
                .into_iter()
                .map(|d| d.trim().trim_start_matches('.').to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            realtime_locators: realtime_locators.into_iter().collect(),
            static_extensions: static_extensions.into_iter().collect(),
        }
    }

    /// Classify a request. Total and side-effect free.
    pub fn classify(&self, request: &RequestDescriptor) -> Route {
        if !request.is_get() || !matches!(request.url.scheme(), "http" | "https") {
            return Route::PassThrough;
        }

        if self.is_realtime(request) {
            return Route::Handle(Strategy::NetworkOnly);
        }

        if request.accept.as_deref().is_some_and(|a| a.contains("text/html")) {
            return Route::Handle(Strategy::NetworkFirst);
        }

        if request.extension().is_some_and(|ext| self.static_extensions.contains(ext)) {
            return Route::Handle(Strategy::CacheFirst);
        }

        Route::Handle(Strategy::NetworkFirst)
    }

    /// Whether the request targets the realtime backend and must never be persisted.
    pub fn is_realtime(&self, request: &RequestDescriptor) -> bool {
        if self.realtime_locators.contains(request.locator()) {
            return true;
        }

        let Some(host) = request.url.host_str() else {
            return false;
        };

        self.realtime_domains
            .iter()
            .any(|domain| host == domain || host.strip_suffix(domain.as_str()).is_some_and(|p| p.ends_with('.')))
    }
}
