use anyhow::{Context, Result};

use newsroom_core::{AppConfig, CurationSnapshot, SnapshotStore};

use super::print_article;

pub fn run(config: &AppConfig, query: &str) -> Result<()> {
    let store = SnapshotStore::new(config.snapshot_path(), CurationSnapshot::default());
    store
        .load()
        .context("No curated snapshot yet. Run `newsroom refresh` first")?;

    let results = store.search(query);

    if results.is_empty() {
        println!("No articles match '{}'.", query);
        return Ok(());
    }

    println!("{} matches for '{}':\n", results.len(), query);
    for (index, article) in results.iter().enumerate() {
        print_article(index, article);
    }

    Ok(())
}
