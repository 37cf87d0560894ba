use anyhow::{bail, Result};

use newsroom_core::AppConfig;

pub fn init(force: bool) -> Result<()> {
    let path = AppConfig::config_path();

    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    AppConfig::default().save()?;
    println!("Wrote default configuration to {}", path.display());
    println!("Set OPENAI_API_KEY (or ai.openai_api_key) before running `newsroom refresh`.");

    Ok(())
}

pub fn path() -> Result<()> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}
