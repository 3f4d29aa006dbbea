//! Connection profiles
//!
//! An alias names an S3-compatible endpoint together with the credentials
//! and client tuning used to reach it. Aliases are stored in the config file
//! and turned into a store client by the S3 adapter.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ConfigManager;
use crate::error::{Error, Result};

/// How bucket names are placed in request URLs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketLookup {
    /// Path style for custom endpoints, virtual hosts otherwise
    #[default]
    Auto,
    /// `https://host/bucket/key`
    Path,
    /// `https://bucket.host/key`
    Dns,
}

impl BucketLookup {
    /// Whether requests to `endpoint` put the bucket in the path
    pub fn force_path_style(self, custom_endpoint: bool) -> bool {
        match self {
            BucketLookup::Path => true,
            BucketLookup::Dns => false,
            BucketLookup::Auto => custom_endpoint,
        }
    }
}

impl FromStr for BucketLookup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(BucketLookup::Auto),
            "path" => Ok(BucketLookup::Path),
            "dns" => Ok(BucketLookup::Dns),
            other => Err(Error::Config(format!(
                "unknown bucket lookup '{other}', expected auto, path or dns"
            ))),
        }
    }
}

impl fmt::Display for BucketLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BucketLookup::Auto => "auto",
            BucketLookup::Path => "path",
            BucketLookup::Dns => "dns",
        })
    }
}

/// Retry policy for store requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, the first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    100
}

fn default_max_backoff() -> u64 {
    10_000
}

impl RetryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

/// Connect and read timeouts for store requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,

    #[serde(default = "default_read_timeout")]
    pub read_ms: u64,
}

fn default_connect_timeout() -> u64 {
    5_000
}

fn default_read_timeout() -> u64 {
    30_000
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn read(&self) -> Duration {
        Duration::from_millis(self.read_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout(),
            read_ms: default_read_timeout(),
        }
    }
}

/// A named S3-compatible endpoint with credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,

    /// Endpoint URL, `http://` or `https://`
    pub endpoint: String,

    pub access_key: String,

    pub secret_key: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default)]
    pub bucket_lookup: BucketLookup,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutConfig>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Alias {
    /// Create an alias with default region, lookup and tuning
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: default_region(),
            bucket_lookup: BucketLookup::default(),
            retry: None,
            timeout: None,
        }
    }

    /// Parsed endpoint, rejecting anything but http(s)
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(Error::Config(format!(
                "alias '{}': unsupported endpoint scheme '{scheme}'",
                self.name
            ))),
        }
    }

    /// Check the alias is usable before it is stored or connected
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.contains(['/', ' ']) {
            return Err(Error::Config(format!(
                "invalid alias name '{}'",
                self.name
            )));
        }
        self.endpoint_url()?;
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(Error::Config(format!(
                "alias '{}': access key and secret key are required",
                self.name
            )));
        }
        Ok(())
    }

    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn timeout_config(&self) -> TimeoutConfig {
        self.timeout.clone().unwrap_or_default()
    }
}

/// Reads and writes aliases in the config file
pub struct AliasManager {
    config_manager: ConfigManager,
}

impl AliasManager {
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Manager over the default config location
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_manager: ConfigManager::new()?,
        })
    }

    pub fn list(&self) -> Result<Vec<Alias>> {
        Ok(self.config_manager.load()?.aliases)
    }

    pub fn get(&self, name: &str) -> Result<Alias> {
        self.config_manager
            .load()?
            .aliases
            .into_iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::AliasNotFound(name.to_string()))
    }

    /// Alias `name`, or the configured default when `name` is `None`
    pub fn resolve(&self, name: Option<&str>) -> Result<Alias> {
        if let Some(name) = name {
            return self.get(name);
        }
        let config = self.config_manager.load()?;
        let default = config.defaults.alias.ok_or_else(|| {
            Error::Config("no alias given and no default alias configured".into())
        })?;
        config
            .aliases
            .into_iter()
            .find(|a| a.name == default)
            .ok_or(Error::AliasNotFound(default))
    }

    /// Add or replace an alias, optionally making it the default
    pub fn set(&self, alias: Alias, make_default: bool) -> Result<()> {
        alias.validate()?;
        let mut config = self.config_manager.load()?;

        config.aliases.retain(|a| a.name != alias.name);
        if make_default {
            config.defaults.alias = Some(alias.name.clone());
        }
        config.aliases.push(alias);

        self.config_manager.save(&config)
    }

    /// Remove an alias, clearing the default if it pointed at it
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let before = config.aliases.len();
        config.aliases.retain(|a| a.name != name);
        if config.aliases.len() == before {
            return Err(Error::AliasNotFound(name.to_string()));
        }
        if config.defaults.alias.as_deref() == Some(name) {
            config.defaults.alias = None;
        }
        self.config_manager.save(&config)
    }
}
