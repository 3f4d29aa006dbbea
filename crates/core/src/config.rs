//! Configuration file
//!
//! TOML file holding aliases and CLI defaults, stored at
//! `<config dir>/bucketfs/config.toml` or under `$BUCKETFS_CONFIG_DIR`.
//! The `schema_version` field gates migrations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::alias::Alias;
use crate::error::{Error, Result};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "BUCKETFS_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Seven days, the longest lifetime S3 accepts for presigned URLs
const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub schema_version: u32,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub aliases: Vec<Alias>,
}

/// CLI defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// Alias used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Show spinners for long operations
    #[serde(default = "default_true")]
    pub progress: bool,

    /// Lifetime of presigned URLs when not given explicitly
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_secs: u64,
}

fn default_output() -> String {
    "human".to_string()
}

fn default_true() -> bool {
    true
}

fn default_presign_expiry() -> u64 {
    DEFAULT_PRESIGN_EXPIRY_SECS
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            alias: None,
            output: default_output(),
            progress: true,
            presign_expiry_secs: DEFAULT_PRESIGN_EXPIRY_SECS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            aliases: Vec::new(),
        }
    }
}

/// Loads and saves the config file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the default location
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("bucketfs"),
        };
        Ok(Self::with_path(config_dir.join(CONFIG_FILE)))
    }

    /// Manager for an explicit file path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config, or the default one if the file does not exist yet
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade bfs.",
                config.schema_version, SCHEMA_VERSION
            )));
        }
        if config.schema_version < SCHEMA_VERSION {
            return Ok(migrate(config));
        }
        Ok(config)
    }

    /// Write the config, creating parent directories. The file is made
    /// readable by its owner only since it holds secret keys.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&self.config_path, toml::to_string_pretty(config)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.config_path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %self.config_path.display(), "configuration saved");
        Ok(())
    }
}

/// Bring an older config up to [`SCHEMA_VERSION`]
fn migrate(mut config: Config) -> Config {
    // Version 0 files predate the defaults table; serde defaults fill it in.
    config.schema_version = SCHEMA_VERSION;
    config
}
