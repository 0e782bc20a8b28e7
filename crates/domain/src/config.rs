//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SyncError};
use crate::types::Credentials;

/// Default remote service origin
pub const DEFAULT_BASE_URL: &str = "https://www.anylist.com";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default, skip_serializing)]
    pub credentials: Option<CredentialsConfig>,
}

/// Remote service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub api_version: String,
}

/// Cache refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Exact, case-sensitive name of the list to serve
    pub target_list_name: String,
    pub refresh_interval_seconds: u64,
    /// Whether the periodic refresh task runs at all
    pub enabled: bool,
}

/// Raw credential fields as they appear in config sources
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
            api_version: "3".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            target_list_name: "Groceries".to_string(),
            refresh_interval_seconds: 600,
            enabled: true,
        }
    }
}

impl ServiceConfig {
    /// Per-request deadline.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl SyncConfig {
    /// Interval between timer-driven refreshes.
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }
}

impl Config {
    /// Reject settings that would make the client unusable.
    ///
    /// # Errors
    /// Returns `SyncError::Config` for an empty base URL, a zero request
    /// timeout, or a zero refresh interval.
    pub fn validate(&self) -> Result<()> {
        if self.service.base_url.trim().is_empty() {
            return Err(SyncError::Config("service.base_url must not be empty".to_string()));
        }
        if self.service.timeout_seconds == 0 {
            return Err(SyncError::Config(
                "service.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.sync.refresh_interval_seconds == 0 {
            return Err(SyncError::Config(
                "sync.refresh_interval_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the configured authentication mode.
    ///
    /// # Errors
    /// Returns `SyncError::Config` if no credentials are configured, if both a
    /// password pair and a refresh token are given, or if only half of the
    /// password pair is present.
    pub fn credentials(&self) -> Result<Credentials> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| SyncError::Config("No credentials configured".to_string()))?;
        creds.resolve()
    }
}

impl CredentialsConfig {
    /// Turn raw fields into exactly one authentication mode.
    ///
    /// # Errors
    /// Returns `SyncError::Config` when the fields do not describe exactly one
    /// mode.
    pub fn resolve(&self) -> Result<Credentials> {
        let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_owned);

        match (non_empty(&self.email), non_empty(&self.password), non_empty(&self.refresh_token)) {
            (Some(email), Some(password), None) => Ok(Credentials::Password { email, password }),
            (None, None, Some(token)) => Ok(Credentials::RefreshToken(token)),
            (None, None, None) => Err(SyncError::Config("No credentials configured".to_string())),
            (_, _, Some(_)) => Err(SyncError::Config(
                "Password and refresh token credentials are mutually exclusive".to_string(),
            )),
            _ => Err(SyncError::Config("Email and password must be set together".to_string())),
        }
    }
}
