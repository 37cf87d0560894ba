use anyhow::Result;

use newsroom_core::{snapshot::load_snapshot, AppConfig};

pub fn run(config: &AppConfig) -> Result<()> {
    // counts are informational; a missing snapshot just leaves them out
    let snapshot = load_snapshot(&config.snapshot_path()).ok();

    println!("Categories ({}):\n", config.categories.len());

    for (name, feeds) in &config.categories {
        let curated = snapshot
            .as_ref()
            .and_then(|s| s.get(name))
            .map(|articles| format!(", {} curated", articles.len()))
            .unwrap_or_default();

        println!("  {} - {} feeds{}", name, feeds.len(), curated);
        for url in feeds {
            println!("    {}", url);
        }
        println!();
    }

    Ok(())
}
