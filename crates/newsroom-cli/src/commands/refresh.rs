use std::sync::Arc;

use anyhow::Result;

use newsroom_core::{
    scheduler::refresh_snapshot,
    AppConfig, CurationPipeline, CurationSnapshot, SnapshotStore,
};

pub async fn run(config: &AppConfig) -> Result<()> {
    println!("Refreshing {} categories...\n", config.categories.len());

    let pipeline = Arc::new(CurationPipeline::from_config(config)?);
    let store = SnapshotStore::new(config.snapshot_path(), CurationSnapshot::empty(config.category_names()));

    let report = refresh_snapshot(&pipeline, &store).await?;

    for category in &report.categories {
        println!(
            "  {:<14} fetched {:>3}, distinct {:>3}, curated {}",
            category.category, category.fetched, category.distinct, category.curated
        );
        for failure in &category.failed_sources {
            println!("    [FAILED] {}: {}", failure.url, failure.reason);
        }
    }

    let elapsed = report.finished_at - report.started_at;
    println!(
        "\nRefresh complete in {}s. {} articles curated, saved to {}",
        elapsed.num_seconds(),
        report.curated_total(),
        store.path().display()
    );

    Ok(())
}
