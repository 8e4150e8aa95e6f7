use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default autoforge data directory: ~/.autoforge
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".autoforge"))
}

/// Load configuration with layered lookup, then apply environment
/// credential overrides.
pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.autoforge/config.toml (highest)
    let data_dir = get_data_dir()?;
    let home_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = if home_config.exists() {
        let s = std::fs::read_to_string(&home_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else if local_config.exists() {
        let s = std::fs::read_to_string(local_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else {
        AppConfig::default()
    };

    cfg.github.apply_env();

    // Default the event sink into the data directory when enabled without
    // an explicit path.
    if cfg.events.enabled && cfg.events.path.trim().is_empty() {
        let events_dir = data_dir.join("events");
        std::fs::create_dir_all(&events_dir)?;
        cfg.events.path = events_dir
            .join("run.events.jsonl")
            .to_string_lossy()
            .to_string();
    }

    // Default the log directory into the data directory.
    if cfg.logging.file
        && cfg
            .logging
            .directory
            .as_ref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    Ok(cfg)
}
