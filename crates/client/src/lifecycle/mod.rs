//! Generation lifecycle.
//!
//! `Idle → Installing → Installed → Activating → Active`, and round again on
//! the next deploy. [`LifecycleState::active`] is the single authoritative
//! "current generation" the strategies read; only [`Lifecycle`] writes it.
//!
//! Installing and activating are separate triggers from the host runtime.
//! Install must have completed for a generation before activate can pick it.
//! The state itself is not persisted; after a restart [`Lifecycle::resume`]
//! picks the configured generation back up from the store.

use std::sync::Arc;

use futures_util::future::{join_all, try_join_all};
use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

use offgrid_core::{AssetManifest, CacheStore, Error, Generation, RequestDescriptor};

use crate::fetch::Network;

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    #[default]
    Idle,
    Installing,
    Installed,
    Activating,
    Active,
}

/// Snapshot of the lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LifecycleState {
    pub phase: Phase,
    /// Generation whose store serves requests.
    pub active: Option<Generation>,
    /// Installed generation waiting for activation.
    pub waiting: Option<Generation>,
    /// Readiness to supersede the running generation without waiting for pages to close.
    pub skip_waiting: bool,
    /// Whether open pages are being intercepted.
    pub controlling: bool,
}

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub generation: Generation,
    pub shell_cached: usize,
    pub external_cached: usize,
    /// External locators that could not be cached, with the reason.
    pub external_skipped: Vec<(String, String)>,
    pub skip_waiting: bool,
}

/// Outcome of an activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    pub generation: Generation,
    /// Stale store names removed.
    pub deleted: Vec<String>,
}

/// Owns the generation state machine.
pub struct Lifecycle {
    state: RwLock<LifecycleState>,
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
}

impl Lifecycle {
    pub fn new(store: Arc<dyn CacheStore>, network: Arc<dyn Network>) -> Self {
        Self { state: RwLock::new(LifecycleState::default()), store, network }
    }

    pub async fn state(&self) -> LifecycleState {
        self.state.read().await.clone()
    }

    pub async fn active_generation(&self) -> Option<Generation> {
        self.state.read().await.active.clone()
    }

    /// Create and populate the store for `generation`.
    ///
    /// Every shell locator must fetch with a 2xx status and be stored. External
    /// locators are best-effort. Realtime locators are never fetched.
    ///
    /// # Errors
    ///
    /// Returns `InstallationIncomplete` if the store cannot be opened or any
    /// shell asset fails. The active generation, if any, is left untouched.
    pub async fn install(&self, generation: &Generation, manifest: &AssetManifest) -> Result<InstallReport, Error> {
        let previous_phase = {
            let mut state = self.state.write().await;
            std::mem::replace(&mut state.phase, Phase::Installing)
        };
        tracing::info!(%generation, shell = manifest.shell.len(), external = manifest.external.len(), "installing");

        let result = self.populate(generation, manifest).await;

        let mut state = self.state.write().await;
        match result {
            Ok((shell_cached, external_cached, external_skipped)) => {
                state.waiting = Some(generation.clone());
                state.skip_waiting = true;
                state.phase = Phase::Installed;
                tracing::info!(%generation, shell_cached, external_cached, "installed, ready to take over");
                Ok(InstallReport {
                    generation: generation.clone(),
                    shell_cached,
                    external_cached,
                    external_skipped,
                    skip_waiting: true,
                })
            }
            Err(reason) => {
                state.phase = previous_phase;
                let keep = state.active.as_ref() == Some(generation) || state.waiting.as_ref() == Some(generation);
                drop(state);

                tracing::warn!(%generation, %reason, "install incomplete");
                if !keep && let Err(e) = self.store.delete_store(generation.as_str()).await {
                    tracing::warn!(%generation, error = %e, "failed to discard incomplete store");
                }
                Err(Error::InstallationIncomplete { generation: generation.to_string(), reason })
            }
        }
    }

    async fn populate(
        &self, generation: &Generation, manifest: &AssetManifest,
    ) -> Result<(usize, usize, Vec<(String, String)>), String> {
        self.store
            .open_store(generation.as_str())
            .await
            .map_err(|e| format!("cannot open store: {e}"))?;

        let shell = try_join_all(manifest.shell.iter().map(|url| self.cache_asset(generation, url))).await?;

        let external = join_all(manifest.external.iter().map(|url| async move {
            self.cache_asset(generation, url)
                .await
                .map_err(|reason| (url.as_str().to_string(), reason))
        }))
        .await;

        let mut cached = 0;
        let mut skipped = Vec::new();
        for outcome in external {
            match outcome {
                Ok(()) => cached += 1,
                Err((url, reason)) => {
                    tracing::warn!(%generation, %url, %reason, "external asset not cached");
                    skipped.push((url, reason));
                }
            }
        }

        Ok((shell.len(), cached, skipped))
    }

    async fn cache_asset(&self, generation: &Generation, url: &Url) -> Result<(), String> {
        let request = RequestDescriptor::get(url.clone());
        let response = self
            .network
            .fetch(&request)
            .await
            .map_err(|e| format!("{url}: {e}"))?;

        if !response.is_success() {
            return Err(format!("{url}: status {}", response.status));
        }

        let written = self
            .store
            .put_entry(generation.as_str(), &request.method, request.locator(), &response)
            .await
            .map_err(|e| format!("{url}: {e}"))?;
        if !written {
            return Err(format!("{url}: store {generation} no longer exists"));
        }
        Ok(())
    }

    /// Take over with the waiting generation and delete every other store.
    ///
    /// With nothing waiting, the active generation is re-asserted and stale
    /// stores are collected again.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if nothing has ever been installed, or if the
    /// waiting generation's store was deleted after its install completed.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let (generation, from_waiting, previous_phase) = {
            let mut state = self.state.write().await;
            let previous_phase = state.phase;
            let waiting = state.waiting.take();
            let (generation, from_waiting) = match (waiting, state.active.clone()) {
                (Some(waiting), _) => (waiting, true),
                (None, Some(active)) => (active, false),
                (None, None) => return Err(Error::InvalidState("no installed generation to activate".into())),
            };
            state.phase = Phase::Activating;
            (generation, from_waiting, previous_phase)
        };
        tracing::info!(%generation, "activating");

        if from_waiting && !self.store_exists(&generation).await {
            let mut state = self.state.write().await;
            state.phase = previous_phase;
            tracing::warn!(%generation, "installed store is gone, not activating");
            return Err(Error::InvalidState(format!("store {generation} no longer exists, install again")));
        }

        let mut deleted = Vec::new();
        match self.store.store_names().await {
            Ok(names) => {
                for name in names.into_iter().filter(|n| n != generation.as_str()) {
                    match self.store.delete_store(&name).await {
                        Ok(_) => {
                            tracing::info!(store = %name, "removed old cache");
                            deleted.push(name);
                        }
                        Err(e) => tracing::warn!(store = %name, error = %e, "failed to remove old cache"),
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "cannot enumerate stores, skipping cleanup"),
        }

        let mut state = self.state.write().await;
        state.active = Some(generation.clone());
        state.skip_waiting = false;
        state.controlling = true;
        state.phase = Phase::Active;
        tracing::info!(%generation, "active, controlling open pages");

        Ok(ActivateReport { generation, deleted })
    }

    /// Whether the generation's store exists. An unreadable store list counts
    /// as present; activation then proceeds as before.
    async fn store_exists(&self, generation: &Generation) -> bool {
        match self.store.store_names().await {
            Ok(names) => names.iter().any(|n| n == generation.as_str()),
            Err(e) => {
                tracing::warn!(%generation, error = %e, "cannot enumerate stores, assuming store exists");
                true
            }
        }
    }

    /// Collapse the wait: activate the waiting generation now, if there is one.
    pub async fn skip_waiting(&self) -> Result<Option<ActivateReport>, Error> {
        let waiting = {
            let mut state = self.state.write().await;
            state.skip_waiting = true;
            state.waiting.is_some()
        };

        if waiting { self.activate().await.map(Some) } else { Ok(None) }
    }

    /// Take over with `generation` if a complete copy of it survives in the
    /// store from an earlier run: its store exists and holds every shell asset.
    ///
    /// Returns whether the generation was resumed. Does nothing once a
    /// generation is active.
    pub async fn resume(&self, generation: &Generation, manifest: &AssetManifest) -> Result<bool, Error> {
        if self.state.read().await.active.is_some() {
            return Ok(false);
        }
        if !self.store.store_names().await?.iter().any(|n| n == generation.as_str()) {
            return Ok(false);
        }
        for url in &manifest.shell {
            if self.store.match_entry(generation.as_str(), "GET", url.as_str()).await?.is_none() {
                tracing::info!(%generation, %url, "stored generation is incomplete, not resuming");
                return Ok(false);
            }
        }

        let mut state = self.state.write().await;
        if state.active.is_some() {
            return Ok(false);
        }
        state.active = Some(generation.clone());
        state.controlling = true;
        state.phase = Phase::Active;
        tracing::info!(%generation, "resumed stored generation");
        Ok(true)
    }

    /// Delete the active generation's store. Requests keep routing to the
    /// now-missing store (misses, no-op writes) until the next install.
    pub async fn clear_active(&self) -> Result<bool, Error> {
        let Some(generation) = self.active_generation().await else {
            return Ok(false);
        };
        let deleted = self.store.delete_store(generation.as_str()).await?;
        tracing::info!(%generation, deleted, "cleared active cache");
        Ok(deleted)
    }
}
