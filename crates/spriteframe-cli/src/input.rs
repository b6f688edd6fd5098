//! Loading and saving the project's render configuration.

use anyhow::{Context, Result};
use spriteframe_core::config::CONFIG_FILE_NAME;
use spriteframe_core::RenderConfig;
use std::path::{Path, PathBuf};

/// Config path used when none is given: `spriteframe.json` beside the project.
pub fn default_config_path(project: &Path) -> PathBuf {
    project
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(CONFIG_FILE_NAME)
}

/// Resolves an optional `--config` argument.
pub fn config_path(project: &Path, config: Option<&str>) -> PathBuf {
    config
        .map(PathBuf::from)
        .unwrap_or_else(|| default_config_path(project))
}

/// Reads a configuration file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<RenderConfig> {
    if !path.exists() {
        log::warn!(
            "No configuration at {}; using defaults",
            path.display()
        );
        return Ok(RenderConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = RenderConfig::from_json(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Writes a configuration file as pretty JSON.
pub fn save_config(path: &Path, config: &RenderConfig) -> Result<()> {
    let json = config.to_json_pretty()?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("failed to write config {}", path.display()))?;
    Ok(())
}
