//! Bridge configuration - arena sizing, identity policy and logging
//!
//! Loaded from TOML; every section and field has a default so an empty file
//! (or no file at all) is a valid configuration.

use crate::error::{BridgeError, Result};
use crate::identity::TierPolicy;
use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub arena: ArenaConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Size of the first backing block, in bytes
    #[serde(default = "default_initial_block")]
    pub initial_block_size: usize,

    /// Upper bound for the doubling growth of later blocks
    #[serde(default = "default_max_block")]
    pub max_block_size: usize,

    /// Fill released memory with a sentinel so stale reads are visible
    #[serde(default = "default_poison")]
    pub poison_on_release: bool,

    /// Arenas kept warm by an `ArenaPool`
    #[serde(default = "default_max_pooled")]
    pub max_pooled: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub tier_policy: TierPolicy,

    #[serde(default = "default_capacity")]
    pub initial_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub spans: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            identity: IdentityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_block_size: default_initial_block(),
            max_block_size: default_max_block(),
            poison_on_release: default_poison(),
            max_pooled: default_max_pooled(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            tier_policy: TierPolicy::default(),
            initial_capacity: default_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            file: None,
            spans: false,
        }
    }
}

fn default_initial_block() -> usize {
    4 * 1024
}

fn default_max_block() -> usize {
    1024 * 1024
}

fn default_poison() -> bool {
    cfg!(debug_assertions)
}

fn default_max_pooled() -> usize {
    8
}

fn default_capacity() -> usize {
    64
}

fn default_level() -> String {
    "info".to_string()
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_block_size == 0 {
            return Err(BridgeError::invalid_argument(
                "arena.initial_block_size must be greater than zero",
            ));
        }
        if self.max_block_size < self.initial_block_size {
            return Err(BridgeError::invalid_argument(format!(
                "arena.max_block_size ({}) is smaller than arena.initial_block_size ({})",
                self.max_block_size, self.initial_block_size
            )));
        }
        Ok(())
    }
}

impl LoggingConfig {
    /// Translate into the logging layer's own config
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: crate::logging::parse_level(&self.level),
            file_output: self.file.is_some(),
            log_path: self.file.clone(),
            json_format: self.json,
            show_spans: self.spans,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BridgeError::invalid_argument(format!(
                "failed to read config {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| BridgeError::invalid_argument(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.arena.validate()
    }

    /// Render the default configuration as TOML
    pub fn generate_default() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# failed to generate config"))
    }
}
