//! Sync coordinator: single-flight snapshot synchronization with a
//! periodic background loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use studium_core::defaults::{SYNC_EVENT_CAPACITY, SYNC_INTERVAL_SECS};
use studium_core::{
    merge, Connectivity, ContentSection, Entity, Error, RemoteContentSource, Result,
    SyncReport, SyncableContent,
};
use studium_store::LocalContentStore;

/// Configuration for the sync coordinator.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Seconds between periodic sync attempts.
    pub sync_interval_secs: u64,
    /// Whether the background loop runs at all.
    pub enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval_secs: SYNC_INTERVAL_SECS,
            enabled: true,
        }
    }
}

impl SyncConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `STUDIUM_SYNC_ENABLED` | `true` | Enable/disable the background loop |
    /// | `STUDIUM_SYNC_INTERVAL_SECS` | `900` | Seconds between sync attempts |
    pub fn from_env() -> Self {
        let enabled = std::env::var("STUDIUM_SYNC_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let sync_interval_secs = std::env::var("STUDIUM_SYNC_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(SYNC_INTERVAL_SECS)
            .max(1);

        Self {
            sync_interval_secs,
            enabled,
        }
    }

    /// Set the sync interval.
    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.sync_interval_secs = secs;
        self
    }

    /// Enable or disable the background loop.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the sync coordinator.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A sync attempt began.
    SyncStarted,
    /// A sync attempt finished and the snapshot was replaced.
    SyncCompleted { entity_count: usize },
    /// A sync attempt failed; the snapshot was left untouched.
    SyncFailed { error: String },
    /// Background loop started.
    CoordinatorStarted,
    /// Background loop stopped.
    CoordinatorStopped,
}

/// Handle for controlling a running coordinator loop.
pub struct SyncHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<SyncEvent>,
}

impl SyncHandle {
    /// Signal the background loop to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for coordinator events.
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_rx.resubscribe()
    }
}

/// Coordinates snapshot synchronization between a remote content source and
/// the local offline store.
///
/// At most one sync runs at a time. A call that arrives while another sync is
/// in flight is rejected immediately rather than queued, so callers never
/// stack up behind a slow network.
pub struct SyncCoordinator {
    content: LocalContentStore,
    remote: Arc<dyn RemoteContentSource>,
    connectivity: Arc<dyn Connectivity>,
    config: SyncConfig,
    in_flight: Arc<Semaphore>,
    event_tx: broadcast::Sender<SyncEvent>,
}

impl SyncCoordinator {
    pub fn new(
        content: LocalContentStore,
        remote: Arc<dyn RemoteContentSource>,
        connectivity: Arc<dyn Connectivity>,
        config: SyncConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(SYNC_EVENT_CAPACITY);
        Self {
            content,
            remote,
            connectivity,
            config,
            in_flight: Arc::new(Semaphore::new(1)),
            event_tx,
        }
    }

    /// Get a receiver for coordinator events.
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    /// Attempt one synchronization pass.
    ///
    /// Failures are reported, not thrown: the returned [`SyncReport`] carries
    /// `success = false` and a user-facing message. The local snapshot is only
    /// replaced after the whole pass succeeds.
    #[instrument(skip(self), fields(subsystem = "sync", op = "sync_content"))]
    pub async fn sync_content(&self) -> SyncReport {
        let _permit = match self.in_flight.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                debug!("Rejecting sync attempt, another sync is in flight");
                return SyncReport::fail(Error::SyncInProgress.to_string());
            }
        };

        let _ = self.event_tx.send(SyncEvent::SyncStarted);

        match self.perform_sync().await {
            Ok(merged) => {
                info!(
                    entity_count = merged.entity_count(),
                    last_sync = merged.last_sync_timestamp,
                    "Sync completed"
                );
                let _ = self.event_tx.send(SyncEvent::SyncCompleted {
                    entity_count: merged.entity_count(),
                });
                SyncReport::ok(merged)
            }
            Err(e) => {
                warn!(error = %e, "Sync failed");
                let message = Self::report_message(&e);
                let _ = self.event_tx.send(SyncEvent::SyncFailed {
                    error: message.clone(),
                });
                SyncReport::fail(message)
            }
        }
    }

    /// Alias for callers that want to bypass any scheduling concerns and sync
    /// right now. Still subject to the single-flight guard.
    pub async fn force_sync(&self) -> SyncReport {
        self.sync_content().await
    }

    async fn perform_sync(&self) -> Result<SyncableContent> {
        if !self.connectivity.is_connected().await {
            return Err(Error::Offline);
        }

        let local = self.content.load().await?;
        let since = local.as_ref().map(|c| c.last_sync_timestamp).unwrap_or(0);

        let remote = self.remote.fetch_since(since).await?;
        let merged = merge(local.as_ref(), remote, Utc::now().timestamp_millis());
        self.content.replace(&merged).await?;
        Ok(merged)
    }

    /// Map internal errors onto the stable messages callers match on.
    fn report_message(error: &Error) -> String {
        match error {
            Error::Offline | Error::SyncInProgress => error.to_string(),
            _ => "Sync failed".to_string(),
        }
    }

    /// Current local snapshot, `None` before the first successful sync.
    pub async fn local_content(&self) -> Result<Option<SyncableContent>> {
        self.content.load().await
    }

    /// Whether offline content is available.
    pub async fn is_content_available_offline(&self) -> Result<bool> {
        self.content.is_available().await
    }

    /// One entity section from the offline snapshot.
    pub async fn offline_content(&self, section: ContentSection) -> Result<Vec<Entity>> {
        self.content.section(section).await
    }

    /// Drop the local snapshot entirely.
    pub async fn clear_local_content(&self) -> Result<()> {
        self.content.clear().await
    }

    /// Start the periodic background loop and return a handle for control.
    ///
    /// The loop performs an immediate sync, then one per configured interval
    /// until shut down.
    pub fn start(self) -> SyncHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        let coordinator = Arc::new(self);
        let coordinator_clone = coordinator.clone();

        tokio::spawn(async move {
            coordinator_clone.run(&mut shutdown_rx).await;
        });

        SyncHandle {
            shutdown_tx,
            event_rx,
        }
    }

    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Sync coordinator is disabled, not starting");
            return;
        }

        info!(
            interval_secs = self.config.sync_interval_secs,
            "Sync coordinator started"
        );
        let _ = self.event_tx.send(SyncEvent::CoordinatorStarted);

        let interval = Duration::from_secs(self.config.sync_interval_secs);

        // Initial sync so a fresh session does not wait a full interval.
        let report = self.sync_content().await;
        debug!(success = report.success, "Initial sync pass finished");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Sync coordinator received shutdown signal");
                    break;
                }
                _ = sleep(interval) => {
                    let report = self.sync_content().await;
                    debug!(success = report.success, "Periodic sync pass finished");
                }
            }
        }

        let _ = self.event_tx.send(SyncEvent::CoordinatorStopped);
        info!("Sync coordinator stopped");
    }
}
