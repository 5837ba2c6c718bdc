//! Configuration loader for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` by default)
//! and deserializes it into [`ParleyConfig`]. Falls back to defaults when
//! the file is missing or malformed, then applies environment overrides.

use std::path::{Path, PathBuf};

use parley_types::config::ParleyConfig;

/// Overrides the data directory.
pub const DATA_DIR_ENV: &str = "PARLEY_DATA_DIR";

/// Supplies the Anthropic API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// `1` or `true` selects the mock model backend.
pub const MOCK_ENV: &str = "PARLEY_MOCK";

/// Resolve the data directory: `PARLEY_DATA_DIR`, else `~/.parley`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".parley")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ParleyConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> ParleyConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ParleyConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ParleyConfig::default();
        }
    };

    match toml::from_str::<ParleyConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ParleyConfig::default()
        }
    }
}

/// Apply environment overrides on top of a loaded config.
///
/// `lookup` is `std::env::var(..).ok()` in production.
pub fn apply_env_overrides<F>(mut config: ParleyConfig, lookup: F) -> ParleyConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
        config.llm.api_key = Some(key);
    }
    if let Some(flag) = lookup(MOCK_ENV) {
        config.llm.mock = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }
    config
}

/// Load `{data_dir}/config.toml` and apply process environment overrides.
pub async fn load(data_dir: &Path) -> ParleyConfig {
    let config = load_config(data_dir).await;
    apply_env_overrides(config, |name| std::env::var(name).ok())
}
