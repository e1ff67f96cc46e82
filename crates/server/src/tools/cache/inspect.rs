//! cache_inspect tool implementation.
//!
//! Reports lifecycle state, every store with its entry count, and optionally
//! one stored entry.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use offgrid_client::{Agent, LifecycleState};
use offgrid_core::{CacheDb, CacheStore};

use crate::tools::json_result;

/// Parameters for the cache_inspect tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheInspectParams {
    /// Absolute locator to look up in the active store.
    #[serde(default)]
    pub locator: Option<String>,
}

#[derive(Debug, Serialize)]
struct StoreSummary {
    name: String,
    entries: u64,
}

#[derive(Debug, Serialize)]
struct EntrySummary {
    store: String,
    locator: String,
    status: u16,
    content_type: Option<String>,
    body_bytes: usize,
    stored_at: String,
}

#[derive(Debug, Serialize)]
struct CacheInspectOutput {
    lifecycle: LifecycleState,
    stores: Vec<StoreSummary>,
    entry: Option<EntrySummary>,
}

/// Implementation of the cache_inspect tool.
pub async fn inspect_impl(
    agent: &Agent, cache: &CacheDb, params: CacheInspectParams,
) -> Result<CallToolResult, McpError> {
    let lifecycle = agent.lifecycle().state().await;

    let mut stores = Vec::new();
    for name in cache.store_names().await? {
        let entries = cache.entry_count(&name).await?;
        stores.push(StoreSummary { name, entries });
    }

    let entry = match (&lifecycle.active, params.locator.as_deref()) {
        (Some(active), Some(locator)) => cache
            .match_entry(active.as_str(), "GET", locator.trim())
            .await?
            .map(|snapshot| EntrySummary {
                content_type: snapshot.response.content_type().map(String::from),
                body_bytes: snapshot.response.body.len(),
                status: snapshot.response.status,
                store: snapshot.store,
                locator: snapshot.locator,
                stored_at: snapshot.stored_at,
            }),
        _ => None,
    };

    json_result(&CacheInspectOutput { lifecycle, stores, entry })
}
