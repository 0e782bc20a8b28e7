//! Snapshot cache for the target list
//!
//! Readers always see a complete snapshot: refreshes build the replacement
//! off to the side and install it with a single pointer swap. Mutations are
//! forwarded to the remote store and, when accepted, followed by a refetch so
//! the cache reflects what the service actually holds.

use std::sync::Arc;

use async_trait::async_trait;
use basket_domain::{ListSnapshot, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

/// Remote operations the cache depends on
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Fetch the list whose name equals `target_name` exactly.
    async fn fetch_list(&self, target_name: &str) -> Result<ListSnapshot>;

    async fn add_item(&self, list_id: &str, name: &str) -> Result<()>;

    async fn remove_item(&self, list_id: &str, item_id: &str) -> Result<()>;

    async fn set_checked(&self, list_id: &str, item_id: &str, checked: bool) -> Result<()>;
}

/// An installed snapshot with its bookkeeping
#[derive(Debug, Clone)]
pub struct CachedSnapshot {
    pub snapshot: Arc<ListSnapshot>,
    pub refreshed_at: DateTime<Utc>,
    /// Increments on every successful install, starting at 1
    pub generation: u64,
}

/// Cache of one named list backed by a [`ListStore`]
pub struct SyncCache {
    store: Arc<dyn ListStore>,
    target_list_name: String,
    current: RwLock<Arc<CachedSnapshot>>,
}

impl SyncCache {
    /// Fetch the target list and build a cache around it.
    ///
    /// # Errors
    /// Propagates the initial fetch error; no cache exists without a first
    /// successful snapshot.
    #[instrument(skip(store))]
    pub async fn initialize(store: Arc<dyn ListStore>, target_list_name: &str) -> Result<Self> {
        let snapshot = store.fetch_list(target_list_name).await?;
        info!(
            list_id = %snapshot.id,
            items = snapshot.items.len(),
            "initial snapshot loaded"
        );

        Ok(Self {
            store,
            target_list_name: target_list_name.to_string(),
            current: RwLock::new(Arc::new(CachedSnapshot {
                snapshot: Arc::new(snapshot),
                refreshed_at: Utc::now(),
                generation: 1,
            })),
        })
    }

    pub fn target_list_name(&self) -> &str {
        &self.target_list_name
    }

    /// Latest installed snapshot.
    pub fn snapshot(&self) -> Arc<ListSnapshot> {
        Arc::clone(&self.current.read().snapshot)
    }

    /// Latest installed snapshot together with when it was fetched.
    pub fn current(&self) -> Arc<CachedSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.current.read().refreshed_at
    }

    /// Refetch the target list and install it.
    ///
    /// On failure the previous snapshot stays installed.
    ///
    /// # Errors
    /// Propagates the fetch error.
    #[instrument(skip(self), fields(list = %self.target_list_name))]
    pub async fn refresh(&self) -> Result<Arc<ListSnapshot>> {
        let snapshot = match self.store.fetch_list(&self.target_list_name).await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(err) => {
                warn!(error = %err, kind = err.kind().label(), "refresh failed; keeping previous snapshot");
                return Err(err);
            }
        };

        let generation = self.install(Arc::clone(&snapshot));
        debug!(generation, items = snapshot.items.len(), "snapshot installed");
        Ok(snapshot)
    }

    /// Add an item to the target list, then refresh.
    ///
    /// # Errors
    /// The mutation error if the store rejects it, otherwise any refresh
    /// error.
    pub async fn add_item(&self, name: &str) -> Result<Arc<ListSnapshot>> {
        let list_id = self.list_id();
        self.store.add_item(&list_id, name).await?;
        self.refresh().await
    }

    /// Remove an item from the target list, then refresh.
    pub async fn remove_item(&self, item_id: &str) -> Result<Arc<ListSnapshot>> {
        let list_id = self.list_id();
        self.store.remove_item(&list_id, item_id).await?;
        self.refresh().await
    }

    /// Set an item's checked flag, then refresh.
    pub async fn set_checked(&self, item_id: &str, checked: bool) -> Result<Arc<ListSnapshot>> {
        let list_id = self.list_id();
        self.store.set_checked(&list_id, item_id, checked).await?;
        self.refresh().await
    }

    fn list_id(&self) -> String {
        self.current.read().snapshot.id.clone()
    }

    fn install(&self, snapshot: Arc<ListSnapshot>) -> u64 {
        let mut current = self.current.write();
        let generation = current.generation + 1;
        *current = Arc::new(CachedSnapshot { snapshot, refreshed_at: Utc::now(), generation });
        generation
    }
}

impl std::fmt::Debug for SyncCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.current.read();
        f.debug_struct("SyncCache")
            .field("target_list_name", &self.target_list_name)
            .field("generation", &current.generation)
            .field("refreshed_at", &current.refreshed_at)
            .finish_non_exhaustive()
    }
}
