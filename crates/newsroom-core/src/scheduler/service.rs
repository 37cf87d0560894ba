use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::curation::{CurationPipeline, CycleReport};
use crate::snapshot::SnapshotStore;
use crate::{Error, Result};

use super::tasks::refresh_snapshot;

/// Events emitted by the scheduler for whoever is listening
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// A new snapshot has been published
    SnapshotRefreshed { curated: usize, failed_sources: usize },
    /// A background cycle failed; the previous snapshot is still served
    Error { task: String, message: String },
}

/// Background service that rebuilds the snapshot on a fixed interval
pub struct SchedulerService {
    pipeline: Arc<CurationPipeline>,
    store: Arc<SnapshotStore>,
    refresh_interval: Duration,
    event_tx: Option<mpsc::UnboundedSender<SchedulerEvent>>,
    // one cycle at a time, whether scheduled or manual
    refresh_lock: Mutex<()>,
}

impl SchedulerService {
    /// Create a new scheduler service. An interval of zero disables periodic runs.
    pub fn new(pipeline: Arc<CurationPipeline>, store: Arc<SnapshotStore>, refresh_interval: Duration) -> Self {
        Self {
            pipeline,
            store,
            refresh_interval,
            event_tx: None,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Set the event sender for refresh notifications
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    fn send_event(&self, event: SchedulerEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                warn!("Failed to send scheduler event: receiver dropped");
            }
        }
    }

    /// Run refresh cycles until the shutdown signal flips to `true`.
    ///
    /// A cycle still running when shutdown arrives is dropped unpublished.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        if self.refresh_interval.is_zero() {
            info!("Background scheduler disabled (refresh_interval_secs = 0)");
            shutdown_requested(&mut shutdown).await;
            return;
        }

        info!("Scheduler started: refresh={}s", self.refresh_interval.as_secs());

        let mut refresh_interval = tokio::time::interval(self.refresh_interval);
        refresh_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        // Skip the first tick (fires immediately)
        refresh_interval.tick().await;

        loop {
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => {
                    info!("Scheduler received shutdown signal");
                    break;
                }
                _ = refresh_interval.tick() => {}
            }

            debug!("Running scheduled snapshot refresh");
            tokio::select! {
                result = self.refresh_now() => self.log_scheduled(result),
                _ = shutdown_requested(&mut shutdown) => {
                    info!("Scheduler received shutdown signal, abandoning running refresh");
                    break;
                }
            }
        }

        info!("Scheduler stopped");
    }

    fn log_scheduled(&self, result: Result<CycleReport>) {
        match result {
            Ok(report) => {
                info!(
                    "Scheduled refresh: {} articles curated, {} sources failed",
                    report.curated_total(),
                    report.failed_sources_total()
                );
            }
            Err(Error::RefreshInProgress) => {
                debug!("Skipping scheduled refresh, another cycle is running");
            }
            Err(e) => {
                error!("Scheduled refresh failed, keeping previous snapshot: {}", e);
            }
        }
    }

    /// Run a single refresh immediately.
    ///
    /// Returns [`Error::RefreshInProgress`] without waiting if a cycle is
    /// already running.
    pub async fn refresh_now(&self) -> Result<CycleReport> {
        let _guard = self.refresh_lock.try_lock().map_err(|_| Error::RefreshInProgress)?;

        match refresh_snapshot(&self.pipeline, &self.store).await {
            Ok(report) => {
                self.send_event(SchedulerEvent::SnapshotRefreshed {
                    curated: report.curated_total(),
                    failed_sources: report.failed_sources_total(),
                });
                Ok(report)
            }
            Err(e) => {
                self.send_event(SchedulerEvent::Error {
                    task: "refresh".to_string(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

/// Resolve once the flag is `true` or the sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::curation::pipeline_tests::{config_with, pipeline};
    use crate::feed::aggregator::tests::{rss, StaticSource};
    use crate::snapshot::CurationSnapshot;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("newsroom-test-{}", uuid::Uuid::new_v4()))
            .join("curated_news.json")
    }

    fn scheduler(source: StaticSource, interval: Duration) -> SchedulerService {
        let config = config_with(&[("general", &["https://general.test/rss"])]);
        let store = Arc::new(SnapshotStore::new(temp_path(), CurationSnapshot::empty(["general"])));
        SchedulerService::new(pipeline(&config, source, "- point"), store, interval)
    }

    fn working_source() -> StaticSource {
        StaticSource::default().with(
            "https://general.test/rss",
            rss(&[("Headline", "body text here", "https://general.test/1")]),
        )
    }

    #[tokio::test]
    async fn test_refresh_now_publishes_and_notifies() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = scheduler(working_source(), Duration::from_secs(60)).with_event_sender(tx);

        let report = service.refresh_now().await.unwrap();
        assert_eq!(report.curated_total(), 1);
        assert_eq!(service.store().category("general").unwrap()[0].title, "Headline");

        match rx.recv().await {
            Some(SchedulerEvent::SnapshotRefreshed { curated, failed_sources }) => {
                assert_eq!(curated, 1);
                assert_eq!(failed_sources, 0);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let _ = std::fs::remove_dir_all(service.store().path().parent().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refresh_is_rejected() {
        let source = working_source().hang("https://general.test/rss");
        let service = Arc::new(scheduler(source, Duration::from_secs(60)));

        let first = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.refresh_now().await })
        };
        // let the first cycle take the lock and block on the hung feed
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(matches!(service.refresh_now().await, Err(Error::RefreshInProgress)));
        first.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_refreshes_on_interval_and_stops() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = Arc::new(scheduler(working_source(), Duration::from_secs(3600)).with_event_sender(tx));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.run(shutdown_rx).await })
        };

        // nothing runs on the immediate first tick
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(matches!(rx.recv().await, Some(SchedulerEvent::SnapshotRefreshed { .. })));

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let _ = std::fs::remove_dir_all(service.store().path().parent().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_waits_for_shutdown() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = scheduler(working_source(), Duration::ZERO).with_event_sender(tx);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let run = service.run(shutdown_rx);
        tokio::pin!(run);

        tokio::select! {
            _ = &mut run => panic!("scheduler exited before shutdown"),
            _ = tokio::time::sleep(Duration::from_secs(86_400)) => {}
        }
        assert!(rx.try_recv().is_err());

        shutdown_tx.send(true).unwrap();
        run.await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_running_refresh() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        // the feed hangs until the 5s fetch timeout, keeping the cycle busy
        let source = working_source().hang("https://general.test/rss");
        let service = Arc::new(scheduler(source, Duration::from_secs(3600)).with_event_sender(tx));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.run(shutdown_rx).await })
        };

        // first scheduled cycle starts at 3600s and is blocked on the feed
        tokio::time::sleep(Duration::from_secs(3601)).await;
        shutdown_tx.send(true).unwrap();

        // stops well before the cycle could have finished
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler ignored shutdown during a refresh")
            .unwrap();

        assert!(rx.try_recv().is_err());
        assert!(service.store().category("general").unwrap().is_empty());
    }
}
