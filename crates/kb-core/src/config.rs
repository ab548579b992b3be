//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! image, database and network sections. Every section defaults sensibly so
//! a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::network::DEFAULT_SERVER_DOMAIN;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub images: ImageConfig,
    pub database: DatabaseConfig,
    pub network: NetworkConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.images.max_size == 0 {
            warnings.push("images.max_size is 0; every downsize call will be rejected".into());
        }
        if self.images.max_width == 0 {
            warnings.push("images.max_width is 0; box-fit downsizing will be rejected".into());
        }
        if self.images.max_height == 0 {
            warnings.push("images.max_height is 0; box-fit downsizing will be rejected".into());
        }

        for (i, host) in self.network.allowed_hosts.iter().enumerate() {
            if host.trim().is_empty() {
                warnings.push(format!("network.allowed_hosts[{i}] is empty"));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Image storage and downsizing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub storage_dir: PathBuf,
    /// Ceiling for the longer side of stored thumbnails and avatars.
    pub max_size: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./data/images"),
            max_size: 512,
            max_width: 1024,
            max_height: 1024,
        }
    }
}

/// SQLite database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/kitbag.db"),
        }
    }
}

/// Host resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub allowed_hosts: Vec<String>,
    #[serde(default = "default_domain")]
    pub default_domain: String,
}

fn default_domain() -> String {
    DEFAULT_SERVER_DOMAIN.into()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: Vec::new(),
            default_domain: default_domain(),
        }
    }
}
