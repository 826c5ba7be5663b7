//! Indexer registry
//!
//! Single source of truth for the indexers known to the backend and the
//! subset that is enabled. The state lives in a `watch` channel: every
//! mutation wakes the subscribers, which re-read the latest snapshot.
//!
//! Concurrent calls are not ordered against each other. Whichever response
//! arrives last is applied last.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::watch;

use crate::backend::api::BackendClient;
use crate::backend::error::Result;
use crate::backend::types::{Config, Indexer, SearchResult, TestOutcome};
use crate::config::ConsoleConfig;
use crate::search::SearchClient;
use crate::session::SessionStore;

/// Point-in-time view of the registry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrySnapshot {
    pub indexers: Vec<Indexer>,
    /// Always a subset of the ids in `indexers`
    pub enabled: BTreeSet<String>,
}

impl RegistrySnapshot {
    fn replace(&mut self, indexers: Vec<Indexer>) {
        self.enabled = indexers
            .iter()
            .filter(|i| i.enabled)
            .map(|i| i.id.clone())
            .collect();
        self.indexers = indexers;
    }

    /// Mark `id` enabled. Unknown ids are left alone.
    fn enable(&mut self, id: &str) -> bool {
        let Some(indexer) = self.indexers.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        indexer.enabled = true;
        self.enabled.insert(id.to_string())
    }

    fn disable(&mut self, id: &str) -> bool {
        if let Some(indexer) = self.indexers.iter_mut().find(|i| i.id == id) {
            indexer.enabled = false;
        }
        self.enabled.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Indexer> {
        self.indexers.iter().find(|i| i.id == id)
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.contains(id)
    }

    pub fn enabled_indexers(&self) -> Vec<Indexer> {
        self.indexers
            .iter()
            .filter(|i| self.is_enabled(&i.id))
            .cloned()
            .collect()
    }

    /// Known indexers that can still be added (configured and enabled)
    pub fn addable_indexers(&self) -> Vec<Indexer> {
        self.indexers
            .iter()
            .filter(|i| !self.is_enabled(&i.id))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct IndexerRegistry {
    backend: BackendClient,
    search: SearchClient,
    state: Arc<watch::Sender<RegistrySnapshot>>,
}

impl IndexerRegistry {
    pub fn new(config: ConsoleConfig, session: SessionStore) -> Self {
        Self::with_backend(BackendClient::new(config, session))
    }

    pub fn with_backend(backend: BackendClient) -> Self {
        let (state, _) = watch::channel(RegistrySnapshot::default());
        Self {
            search: SearchClient::new(backend.clone()),
            backend,
            state: Arc::new(state),
        }
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    pub fn session(&self) -> &SessionStore {
        self.backend.session()
    }

    /// Receiver that is woken on every registry change
    pub fn subscribe(&self) -> watch::Receiver<RegistrySnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.state.borrow().clone()
    }

    pub fn indexers(&self) -> Vec<Indexer> {
        self.state.borrow().indexers.clone()
    }

    pub fn get(&self, id: &str) -> Option<Indexer> {
        self.state.borrow().get(id).cloned()
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.state.borrow().is_enabled(id)
    }

    /// Forget everything, e.g. after logout
    pub fn reset(&self) {
        self.state.send_replace(RegistrySnapshot::default());
    }

    /// Reload the indexer list. Does nothing without a session token.
    pub async fn load_indexers(&self) -> Result<Vec<Indexer>> {
        if !self.session().is_authenticated() {
            tracing::warn!("load_indexers called without a session token");
            return Ok(self.indexers());
        }

        let indexers = self.backend.list_indexers().await?;
        tracing::info!("Loaded {} indexers", indexers.len());
        self.state.send_modify(|s| s.replace(indexers.clone()));
        Ok(indexers)
    }

    pub async fn fetch_config(&self, indexer_id: &str) -> Result<Config> {
        self.backend.fetch_config(indexer_id).await
    }

    /// PATCH `config` for `indexer`.
    ///
    /// A patch asserting `enabled: "true"` marks the indexer enabled before
    /// the request goes out. If the request then fails, that speculative
    /// change is reverted. A successful patch asserting `enabled: "false"`
    /// removes it from the enabled set.
    pub async fn save_config(&self, indexer: &Indexer, mut config: Config) -> Result<()> {
        let dropped = config.retain_known(indexer);
        if !dropped.is_empty() {
            tracing::warn!("Dropping unknown config keys for {}: {:?}", indexer.id, dropped);
        }

        let speculative =
            config.enabled() == Some(true) && self.state.send_if_modified(|s| s.enable(&indexer.id));

        match self.backend.patch_config(&indexer.id, &config).await {
            Ok(()) => {
                if config.enabled() == Some(false) {
                    self.state.send_if_modified(|s| s.disable(&indexer.id));
                }
                tracing::info!("Saved config for {}", indexer.id);
                Ok(())
            }
            Err(err) => {
                if speculative {
                    self.state.send_if_modified(|s| s.disable(&indexer.id));
                    tracing::warn!("Save failed for {}, reverted enable: {}", indexer.id, err);
                } else {
                    tracing::warn!("Save failed for {}: {}", indexer.id, err);
                }
                Err(err)
            }
        }
    }

    /// Run the backend's test for `indexer`. Never changes the enabled set.
    pub async fn test_indexer(&self, indexer: &Indexer) -> Result<TestOutcome> {
        let outcome = self.backend.test_indexer(&indexer.id).await?;
        if outcome.ok {
            tracing::info!("Test of {} passed", indexer.id);
        } else {
            tracing::warn!("Test of {} failed: {}", indexer.id, outcome.error.as_deref().unwrap_or("unknown error"));
        }
        Ok(outcome)
    }

    pub async fn disable_indexer(&self, indexer: &Indexer) -> Result<()> {
        let mut patch = Config::new();
        patch.set_enabled(false);
        self.save_config(indexer, patch).await
    }

    pub async fn search(&self, indexer: &Indexer, keywords: &str) -> Result<Vec<SearchResult>> {
        self.search.search(indexer, keywords).await
    }
}
