//! Configuration loading and credential resolution
//!
//! Resolution order for every setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: defaults are used and a warning is logged.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "ARTNET_CONFIG";

/// Environment variable for the Last.fm API key
pub const LASTFM_API_KEY_ENV: &str = "ARTNET_LASTFM_API_KEY";

/// Environment variable for the Spotify client id
pub const SPOTIFY_CLIENT_ID_ENV: &str = "ARTNET_SPOTIFY_CLIENT_ID";

/// Environment variable for the Spotify client secret
pub const SPOTIFY_CLIENT_SECRET_ENV: &str = "ARTNET_SPOTIFY_CLIENT_SECRET";

/// Top-level TOML configuration
///
/// Every field is optional so that CLI flags and compiled defaults can fill gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub network: NetworkSection,
    pub sources: SourcesSection,
    pub credentials: CredentialsSection,
    pub cache: CacheSection,
    pub logging: LoggingConfig,
}

/// `[network]` section: working-set and edge thresholds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    pub top_n: Option<usize>,
    pub min_plays: Option<u64>,
    pub min_similarity: Option<f64>,
    pub max_genres: Option<usize>,
    pub provider_timeout_secs: Option<u64>,
    pub fuzzy_threshold: Option<f64>,
}

/// `[sources]` section: per-source enable flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesSection {
    pub lastfm: Option<bool>,
    pub deezer: Option<bool>,
    pub musicbrainz: Option<bool>,
    pub spotify: Option<bool>,
}

/// `[credentials]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsSection {
    pub lastfm_api_key: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
}

/// `[cache]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub dir: Option<PathBuf>,
    pub negative_cache_hours: Option<u64>,
    pub response_cache_days: Option<u64>,
    pub similarity_cache_days: Option<u64>,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Load a TOML config file
///
/// # Returns
/// Parsed config, or defaults if the file does not exist.
///
/// # Errors
/// - `Error::Io` if the file exists but cannot be read
/// - `Error::Toml` if it is not a valid config document
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Parse TOML failed");
        Error::from(e)
    })?;

    info!(path = %path.display(), "Loaded TOML config");
    Ok(config)
}

/// Resolve which config file to read (CLI → ENV → platform default)
///
/// Returns `None` when no explicit path was given and the default file does not exist.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// Platform config file location: `<config_dir>/artnet/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("artnet").join("config.toml"))
}

/// Platform cache directory: `<cache_dir>/artnet`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("artnet"))
        .unwrap_or_else(|| PathBuf::from("./artnet_cache"))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve a credential from CLI → ENV → TOML
///
/// Invalid (blank) values are skipped at every tier. A warning is logged when the
/// credential is present in more than one tier.
///
/// # Arguments
/// * `label` - Human-readable credential name for logging
/// * `cli_arg` - Value passed on the command line
/// * `env_var_name` - Environment variable to consult
/// * `toml_value` - Value from the TOML `[credentials]` section
pub fn resolve_credential(
    label: &str,
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    let env_value = std::env::var(env_var_name).ok();

    let tiers = [
        ("command line", cli_arg),
        ("environment", env_value.as_deref()),
        ("TOML", toml_value),
    ];

    let present: Vec<&str> = tiers
        .iter()
        .filter(|(_, v)| v.map(is_valid_key).unwrap_or(false))
        .map(|(tier, _)| *tier)
        .collect();

    if present.len() > 1 {
        warn!(
            credential = label,
            "Credential found in multiple sources: {}. Using {} (highest priority).",
            present.join(", "),
            present[0]
        );
    }

    tiers
        .iter()
        .find_map(|(tier, value)| match value {
            Some(v) if is_valid_key(v) => {
                info!(credential = label, source = *tier, "Credential resolved");
                Some(v.trim().to_string())
            }
            _ => None,
        })
}
