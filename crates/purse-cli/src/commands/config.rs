use anyhow::{Context, Result};
use purse_core::config::PurseConfig;
use std::path::Path;

/// Prints the resolved configuration as TOML, headed by the file it came from.
pub fn show(config: &PurseConfig, source: &Path) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render config as TOML")?;
    println!("# {}", source.display());
    print!("{}", rendered);
    Ok(())
}
