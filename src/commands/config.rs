use crate::config::Config;
use anyhow::Result;
use std::path::Path;

pub fn show_config(config: &Config, path: &Path) -> Result<()> {
    let origin = if path.exists() { "" } else { " (not found, using defaults)" };
    crate::blog!("Config", "{}{}", path.display(), origin);
    crate::blog!("Metadata", "{}", config.metadata_path().display());
    crate::blog!("Engine", "{} (index {})", config.retrieval.endpoint, config.retrieval.index);
    println!("\n{}", config.to_toml()?);
    Ok(())
}
