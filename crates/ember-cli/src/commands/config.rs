//! Config command - resolve, validate and print the runtime configuration

use anyhow::{Context, Result};
use ember_runtime::GameConfig;
use std::path::Path;

/// Resolve the config from an optional file plus `EMBER_*` overrides
pub fn load(path: Option<&str>) -> Result<GameConfig> {
    let config = match path {
        Some(path) => GameConfig::load_from_file(Path::new(path))
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => GameConfig::from_env().context("Invalid configuration from environment")?,
    };
    Ok(config)
}

pub fn run(path: Option<&str>) -> Result<()> {
    let config = load(path)?;
    let rendered = config
        .to_toml_string()
        .context("Failed to serialize config")?;
    print!("{rendered}");
    Ok(())
}
