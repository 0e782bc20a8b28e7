//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Environment variables, when any credential variable is set
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//!
//! Once a credential variable is present the environment is authoritative:
//! a conflicting or malformed environment is an error, never a reason to
//! read a file instead. Both sources are checked with [`Config::validate`].
//!
//! ## Environment Variables
//! - `BASKET_EMAIL` / `BASKET_PASSWORD`: password login
//! - `BASKET_REFRESH_TOKEN`: refresh-token login (exclusive with the above)
//! - `BASKET_BASE_URL`: service origin
//! - `BASKET_TIMEOUT_SECONDS`: per-request deadline
//! - `BASKET_TARGET_LIST`: name of the list to cache
//! - `BASKET_REFRESH_INTERVAL`: seconds between background refreshes
//! - `BASKET_SYNC_ENABLED`: whether the background refresh runs (true/false)
//!
//! Only the credentials are required; everything else falls back to the
//! defaults in [`basket_domain::Config`].
//!
//! ## File Locations
//! `basket.toml`, `basket.json`, `config.toml`, `config.json`, first in the
//! current working directory and then next to the executable.

use std::path::{Path, PathBuf};

use basket_domain::{Config, CredentialsConfig, Result, SyncError};

const FILE_NAMES: [&str; 4] = ["basket.toml", "basket.json", "config.toml", "config.json"];
const CREDENTIAL_VARS: [&str; 3] = ["BASKET_EMAIL", "BASKET_PASSWORD", "BASKET_REFRESH_TOKEN"];

/// Load configuration, preferring the environment over files.
///
/// # Errors
/// Returns `SyncError::Config` if the environment carries credentials but is
/// invalid, or if no credentials are in the environment and no valid config
/// file is found.
pub fn load() -> Result<Config> {
    if CREDENTIAL_VARS.iter().any(|var| env_opt(var).is_some()) {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    tracing::debug!("No credential variables in environment, trying config file");
    load_from_file(None)
}

/// Load configuration from `BASKET_*` environment variables.
///
/// # Errors
/// Returns `SyncError::Config` if no credential variables are set, a
/// numeric variable does not parse, or the result fails validation.
pub fn load_from_env() -> Result<Config> {
    let credentials = CredentialsConfig {
        email: env_opt("BASKET_EMAIL"),
        password: env_opt("BASKET_PASSWORD"),
        refresh_token: env_opt("BASKET_REFRESH_TOKEN"),
    };
    if credentials.email.is_none()
        && credentials.password.is_none()
        && credentials.refresh_token.is_none()
    {
        return Err(SyncError::Config(
            "Missing required environment variable: BASKET_EMAIL or BASKET_REFRESH_TOKEN"
                .to_string(),
        ));
    }
    // Mode conflicts are reported here rather than at first use
    credentials.resolve()?;

    let mut config = Config::default();

    if let Some(url) = env_opt("BASKET_BASE_URL") {
        config.service.base_url = url;
    }
    if let Some(timeout) = env_u64("BASKET_TIMEOUT_SECONDS")? {
        config.service.timeout_seconds = timeout;
    }
    if let Some(name) = env_opt("BASKET_TARGET_LIST") {
        config.sync.target_list_name = name;
    }
    if let Some(interval) = env_u64("BASKET_REFRESH_INTERVAL")? {
        config.sync.refresh_interval_seconds = interval;
    }
    config.sync.enabled = env_bool("BASKET_SYNC_ENABLED", config.sync.enabled);
    config.credentials = Some(credentials);
    config.validate()?;

    Ok(config)
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `SyncError::Config` if the file is missing, unreadable,
/// malformed, or fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SyncError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SyncError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SyncError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration text, choosing the format by file extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SyncError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the working directory, then beside the
/// executable.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        dirs.push(exe_dir);
    }

    probe_in(&dirs)
}

fn probe_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Non-empty environment variable.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    env_opt(key)
        .map(|v| {
            v.parse::<u64>().map_err(|e| SyncError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
