use std::sync::Arc;

use crate::curation::{CurationPipeline, CycleReport};
use crate::snapshot::{CurationSnapshot, SnapshotStore};
use crate::Result;

/// Where the startup snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Read from the persisted file
    Loaded,
    /// Built by a full pipeline run
    Refreshed,
    /// Neither worked; every category starts empty
    Empty,
}

/// Run one full cycle, publish the result and persist it.
///
/// On error nothing is published. A failed write after a successful swap is
/// logged and the new snapshot stays live.
pub async fn refresh_snapshot(pipeline: &Arc<CurationPipeline>, store: &SnapshotStore) -> Result<CycleReport> {
    let (snapshot, report) = pipeline.run_cycle().await?;

    store.replace(snapshot);

    if let Err(e) = store.persist_async().await {
        tracing::error!("Failed to persist refreshed snapshot: {}", e);
    }

    Ok(report)
}

/// Populate the store before serving begins: persisted copy first, else a
/// synchronous refresh, else an empty snapshot over the configured categories.
pub async fn bootstrap_snapshot(pipeline: &Arc<CurationPipeline>, store: &SnapshotStore) -> BootstrapOutcome {
    match store.load_async().await {
        Ok(_) => return BootstrapOutcome::Loaded,
        Err(e) => {
            tracing::info!("No usable persisted snapshot ({}), building one now", e);
        }
    }

    match refresh_snapshot(pipeline, store).await {
        Ok(report) => {
            tracing::info!("Initial snapshot built with {} articles", report.curated_total());
            BootstrapOutcome::Refreshed
        }
        Err(e) => {
            tracing::error!("Initial refresh failed, starting with an empty snapshot: {}", e);
            store.replace(CurationSnapshot::empty(pipeline.category_names()));
            BootstrapOutcome::Empty
        }
    }
}
