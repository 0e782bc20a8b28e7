//! Periodic cache refresh
//!
//! Runs [`RefreshTarget::refresh`] on a fixed period until stopped. Ticks
//! are measured from `start`, not from the end of the previous refresh, so
//! fetch latency does not stretch the period. A refresh that overruns a tick
//! delays the next one instead of triggering a burst. A failed refresh is
//! logged and the next tick proceeds normally; the loop never exits on its
//! own.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use basket_infra::scheduling::{RefreshScheduler, RefreshSchedulerConfig, RefreshTarget};
//!
//! # async fn example(target: Arc<dyn RefreshTarget>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut scheduler =
//!     RefreshScheduler::new(target, RefreshSchedulerConfig { interval: Duration::from_secs(600) });
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use basket_domain::{Result, SyncConfig};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{SchedulerError, SchedulerResult};
use crate::sync::SyncCache;

const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Something that can be refreshed on a timer
#[async_trait]
pub trait RefreshTarget: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn refresh(&self) -> Result<()>;
}

#[async_trait]
impl RefreshTarget for SyncCache {
    fn name(&self) -> &str {
        self.target_list_name()
    }

    async fn refresh(&self) -> Result<()> {
        Self::refresh(self).await.map(|_| ())
    }
}

/// Configuration for the refresh scheduler
#[derive(Debug, Clone)]
pub struct RefreshSchedulerConfig {
    /// Period between refresh starts; must be non-zero
    pub interval: Duration,
}

impl Default for RefreshSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600), // 10 minutes
        }
    }
}

impl From<&SyncConfig> for RefreshSchedulerConfig {
    fn from(config: &SyncConfig) -> Self {
        Self { interval: config.refresh_interval() }
    }
}

/// Interval-driven refresh loop with explicit lifecycle
pub struct RefreshScheduler {
    target: Arc<dyn RefreshTarget>,
    config: RefreshSchedulerConfig,
    parent: Option<CancellationToken>,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl RefreshScheduler {
    pub fn new(target: Arc<dyn RefreshTarget>, config: RefreshSchedulerConfig) -> Self {
        Self {
            target,
            config,
            parent: None,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Tie the loop to an outer token: cancelling `parent` stops it too.
    #[must_use]
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.cancellation_token = parent.child_token();
        self.parent = Some(parent);
        self
    }

    /// Spawn the background loop.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if the loop is active, `InvalidInterval` if
    /// the configured interval is zero
    #[instrument(skip(self), fields(refresh_target = %self.target.name()))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }
        if self.config.interval.is_zero() {
            return Err(SchedulerError::InvalidInterval);
        }

        // Fresh token so the scheduler can be restarted after stop
        self.cancellation_token = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };

        let target = Arc::clone(&self.target);
        let interval = self.config.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::refresh_loop(target, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!(interval_secs = interval.as_secs(), "Refresh scheduler started");
        Ok(())
    }

    /// Cancel the loop and wait for it to finish.
    ///
    /// A refresh already in flight is abandoned; the cache only ever installs
    /// complete snapshots, so dropping it midway leaves the previous one.
    ///
    /// # Errors
    ///
    /// Returns `NotRunning` if the loop is not active, `Timeout` if it does
    /// not finish in time.
    #[instrument(skip(self), fields(refresh_target = %self.target.name()))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            match tokio::time::timeout(JOIN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "Refresh task panicked");
                    return Err(SchedulerError::TaskJoinFailed(e.to_string()));
                }
                Err(_) => {
                    warn!("Refresh task did not complete within timeout");
                    return Err(SchedulerError::Timeout(JOIN_TIMEOUT));
                }
            }
        }

        info!("Refresh scheduler stopped");
        Ok(())
    }

    /// Whether the background task exists and has not finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    async fn refresh_loop(
        target: Arc<dyn RefreshTarget>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        // First tick one full period out; the cache was just populated
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Refresh loop cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let result = tokio::select! {
                        () = cancel.cancelled() => {
                            debug!("Refresh abandoned by cancellation");
                            break;
                        }
                        result = target.refresh() => result,
                    };
                    match result {
                        Ok(()) => debug!(refresh_target = target.name(), "Periodic refresh completed"),
                        Err(e) => warn!(
                            refresh_target = target.name(),
                            error = %e,
                            kind = e.kind().label(),
                            "Periodic refresh failed"
                        ),
                    }
                }
            }
        }
    }
}

/// Ensure the loop is stopped when the scheduler is dropped
impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() && self.is_running() {
            warn!("RefreshScheduler dropped while running; cancelling");
        }
        self.cancellation_token.cancel();
    }
}
