//! Configuration management for the presale SDK
//!
//! Built-in defaults describe the two presale deployments. `presale.toml` /
//! `presale.json` files and `PRESALE_*` environment variables override them.

pub mod env;
pub mod networks;

pub use env::{
    parse_chain_id, EnvironmentConfig, LoggingEnvConfig, NetworkEnvConfig, TransactionEnvConfig,
    DEFAULT_GAS_BUFFER_PERCENT, ENV_CONFIG_DIR,
};
pub use networks::{ConfiguredNetworks, NetworkConfig};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Error;

/// Resolved settings used by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresaleConfig {
    pub networks: ConfiguredNetworks,
    /// Headroom added on top of gas estimates, in percent
    pub gas_buffer_percent: u64,
    pub log_level: String,
    pub log_format: String,
}

impl Default for PresaleConfig {
    fn default() -> Self {
        Self {
            networks: ConfiguredNetworks::default(),
            gas_buffer_percent: DEFAULT_GAS_BUFFER_PERCENT,
            log_level: "info".to_string(),
            log_format: "compact".to_string(),
        }
    }
}

impl PresaleConfig {
    /// Load from files and environment variables
    pub fn load() -> Result<Self, Error> {
        Self::from_env_config(&EnvironmentConfig::load()?)
    }

    /// Load from the given directories and environment variables
    pub fn load_from_paths(search_paths: &[PathBuf]) -> Result<Self, Error> {
        Self::from_env_config(&EnvironmentConfig::load_from_paths(search_paths)?)
    }

    pub fn from_env_config(env_config: &EnvironmentConfig) -> Result<Self, Error> {
        Ok(Self {
            networks: env_config.networks()?,
            gas_buffer_percent: env_config.get_gas_buffer_percent(),
            log_level: env_config.get_log_level(),
            log_format: env_config.get_log_format(),
        })
    }

    /// Default location for `init-config`
    pub fn default_path() -> PathBuf {
        std::env::var(ENV_CONFIG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
            .join("presale.toml")
    }
}
