//! Application context - wires client, cache and refresh scheduler

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use basket_domain::Config;
use basket_infra::{Client, RefreshScheduler, RefreshSchedulerConfig, SyncCache};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::logging::log_outcome;

/// Application context - owns every long-lived component
pub struct AppContext {
    pub config: Config,
    pub client: Arc<Client>,
    pub cache: Arc<SyncCache>,
    /// `None` when periodic refresh is disabled in config
    scheduler: Option<RefreshScheduler>,
    shutdown: CancellationToken,
}

impl AppContext {
    /// Connect to the service and load the target list.
    ///
    /// Fails if the credentials are missing or rejected, or if the target
    /// list cannot be fetched. No background work is started here; call
    /// [`AppContext::start`] for that.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let shutdown = CancellationToken::new();
        let credentials = config.credentials().context("no usable credentials configured")?;

        let started = Instant::now();
        let connected = Client::builder()
            .service(config.service.clone())
            .credentials(credentials)
            .cancellation(shutdown.child_token())
            .connect()
            .await;
        log_outcome("connect", started.elapsed(), &connected);
        let client = Arc::new(connected.context("failed to connect to list service")?);

        let started = Instant::now();
        let initialized = SyncCache::initialize(client.clone(), &config.sync.target_list_name).await;
        log_outcome("initialize_cache", started.elapsed(), &initialized);
        let cache = Arc::new(initialized.with_context(|| {
            format!("failed to load list {:?}", config.sync.target_list_name)
        })?);

        let scheduler = config.sync.enabled.then(|| {
            RefreshScheduler::new(cache.clone(), RefreshSchedulerConfig::from(&config.sync))
                .with_parent(shutdown.clone())
        });

        info!(
            mode = ?client.mode(),
            list = %config.sync.target_list_name,
            items = cache.snapshot().items.len(),
            periodic_refresh = scheduler.is_some(),
            "application context ready"
        );

        Ok(Self { config, client, cache, scheduler, shutdown })
    }

    /// Start periodic refresh if it is enabled.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        match self.scheduler.as_mut() {
            Some(scheduler) => {
                scheduler.start().await.context("failed to start refresh scheduler")?;
            }
            None => debug!("periodic refresh disabled"),
        }
        Ok(())
    }

    /// Whether the periodic refresh loop is currently running.
    pub fn is_refreshing(&self) -> bool {
        self.scheduler.as_ref().is_some_and(RefreshScheduler::is_running)
    }

    /// Token cancelled by [`AppContext::shutdown`].
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop the refresh loop and abort in-flight requests.
    ///
    /// Idempotent. The cache keeps its last snapshot and stays readable.
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        info!("shutdown called on AppContext");

        if let Some(scheduler) = self.scheduler.as_mut() {
            if scheduler.is_running() {
                scheduler.stop().await.context("failed to stop refresh scheduler")?;
            }
        }
        self.shutdown.cancel();

        debug!(
            generation = self.cache.current().generation,
            refreshed_at = %self.cache.refreshed_at(),
            rotated_token_held = self.client.refresh_token().is_some(),
            "final cache state"
        );
        Ok(())
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}
