//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - lshforest.toml (default configuration)
//! - lshforest.local.toml (git-ignored local overrides)
//! - Environment variables (LSHFOREST_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # lshforest.toml
//! [forest]
//! max_k = 4
//! max_l = 64
//! hash_value_size = "medium"
//!
//! [ensemble]
//! num_partitions = 8
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! LSHFOREST_FOREST__MAX_L=32
//! LSHFOREST_LOGGING__FORMAT=json
//! ```

use crate::error::{LshError, Result};
use crate::hash_key::HashValueSize;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub forest: ForestConfig,
    #[serde(default)]
    pub ensemble: EnsembleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Shape of a single LSH Forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Hash values per band (maximum K usable at query time)
    #[serde(default = "default_max_k")]
    pub max_k: usize,

    /// Number of bands (maximum L usable at query time)
    #[serde(default = "default_max_l")]
    pub max_l: usize,

    /// Bytes kept from each hash value when building keys
    #[serde(default)]
    pub hash_value_size: HashValueSize,

    /// Worker threads for per-band parallelism
    /// 0 = share the global rayon pool
    #[serde(default)]
    pub num_threads: usize,
}

/// LSH Ensemble partitioning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Number of domain-size partitions built by bootstrap
    #[serde(default = "default_num_partitions")]
    pub num_partitions: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_max_k() -> usize {
    4
}
fn default_max_l() -> usize {
    64
}
fn default_num_partitions() -> usize {
    8
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. lshforest.toml (base configuration)
    /// 2. lshforest.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (LSHFOREST_* prefix)
    pub fn load() -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Toml::file("lshforest.toml"))
            .merge(Toml::file("lshforest.local.toml"))
            .merge(Env::prefixed("LSHFOREST_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from specific file path
    pub fn from_file(path: &str) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("LSHFOREST_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject shapes no index can be built with.
    pub fn validate(&self) -> Result<()> {
        self.forest.validate()?;
        if self.ensemble.num_partitions == 0 {
            return Err(LshError::InvalidParameter(
                "ensemble.num_partitions must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_k == 0 {
            return Err(LshError::InvalidParameter(
                "forest.max_k must be > 0".to_string(),
            ));
        }
        if self.max_l == 0 {
            return Err(LshError::InvalidParameter(
                "forest.max_l must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of hash values a signature must carry: `max_k * max_l`.
    pub fn signature_len(&self) -> usize {
        self.max_k * self.max_l
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            max_k: default_max_k(),
            max_l: default_max_l(),
            hash_value_size: HashValueSize::default(),
            num_threads: 0,
        }
    }
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        EnsembleConfig {
            num_partitions: default_num_partitions(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
