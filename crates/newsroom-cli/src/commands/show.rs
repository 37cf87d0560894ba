use anyhow::{Context, Result};

use newsroom_core::{AppConfig, CurationSnapshot, SnapshotStore};

use super::print_article;

pub fn run(config: &AppConfig, category: &str) -> Result<()> {
    let store = SnapshotStore::new(config.snapshot_path(), CurationSnapshot::default());
    store
        .load()
        .context("No curated snapshot yet. Run `newsroom refresh` first")?;

    let articles = store.category(category)?;

    if articles.is_empty() {
        println!("No curated articles in '{}' right now.", category);
        return Ok(());
    }

    println!("{} ({} articles):\n", category, articles.len());
    for (index, article) in articles.iter().enumerate() {
        print_article(index, article);
    }

    Ok(())
}
