use alloy_primitives::Address;
use config::{Config as ConfigLoader, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::networks::{ConfiguredNetworks, NetworkConfig};
use crate::error::Error;
use crate::protocols::presale::network::ChainIndex;

/// Environment variable prefixes for different configuration sections
const ENV_NETWORK_PREFIX: &str = "PRESALE_NETWORK";
const ENV_TX_PREFIX: &str = "PRESALE_TX";
const ENV_LOG_PREFIX: &str = "PRESALE_LOG";

/// Directory searched first for configuration files
pub const ENV_CONFIG_DIR: &str = "PRESALE_CONFIG_DIR";

/// Configuration file names to try (in order of preference)
const CONFIG_FILES: [&str; 2] = ["presale.toml", "presale.json"];

/// Default gas estimate headroom, in percent
pub const DEFAULT_GAS_BUFFER_PERCENT: u64 = 20;

/// Overrides for one presale network; unset fields keep the built-in default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEnvConfig {
    pub name: Option<String>,
    pub chain_id: Option<u64>,
    pub currency_symbol: Option<String>,
    pub rpc_url: Option<String>,
    /// Hex address of the presale contract
    pub presale_address: Option<String>,
}

/// Transaction submission settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEnvConfig {
    /// Headroom added on top of the node's gas estimate, in percent
    pub gas_buffer_percent: Option<u64>,
}

/// Logging configuration from environment/files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingEnvConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: Option<String>,
    /// Log format (compact, pretty, json)
    pub format: Option<String>,
}

/// Complete environment configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Overrides for the two networks, by chain index
    #[serde(default)]
    pub networks: [NetworkEnvConfig; 2],
    #[serde(default)]
    pub transaction: TransactionEnvConfig,
    #[serde(default)]
    pub logging: LoggingEnvConfig,
    /// Configuration file paths that were loaded
    #[serde(skip)]
    pub loaded_files: Vec<String>,
}

impl EnvironmentConfig {
    /// Load configuration from files, then environment variables
    pub fn load() -> Result<Self, Error> {
        Self::load_from_paths(&Self::search_paths())
    }

    /// Load from the given directories, then environment variables
    pub fn load_from_paths(search_paths: &[PathBuf]) -> Result<Self, Error> {
        let mut env_config = Self::default();

        // Environment variables take precedence over files
        env_config.load_from_env()?;
        env_config.load_from_files(search_paths)?;

        env_config.validate()?;
        Ok(env_config)
    }

    /// Directories searched for configuration files
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(dir) = env::var(ENV_CONFIG_DIR) {
            paths.push(PathBuf::from(dir));
        }
        paths.push(PathBuf::from("config"));
        paths.push(PathBuf::from("."));
        paths
    }

    fn load_from_files(&mut self, search_paths: &[PathBuf]) -> Result<(), Error> {
        for search_path in search_paths {
            for config_file in CONFIG_FILES {
                let file_path = search_path.join(config_file);
                let display = file_path.to_string_lossy().to_string();
                if file_path.exists() && !self.loaded_files.contains(&display) {
                    self.load_config_file(&file_path)?;
                    self.loaded_files.push(display);
                }
            }
        }
        Ok(())
    }

    /// Load a specific configuration file; values already set are kept
    pub fn load_config_file(&mut self, file_path: &Path) -> Result<(), Error> {
        let file_format = match file_path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        };

        let settings = ConfigLoader::builder()
            .add_source(File::from(file_path).format(file_format))
            .build()
            .map_err(|e| Error::Config(format!("Failed to load config file: {}", e)))?;

        if let Ok(networks) = settings.get::<Vec<NetworkEnvConfig>>("networks") {
            if networks.len() > 2 {
                return Err(Error::Config(format!(
                    "{} lists {} networks; exactly two are supported",
                    file_path.display(),
                    networks.len()
                )));
            }
            for (index, network) in networks.into_iter().enumerate() {
                self.merge_network_config(index, network);
            }
        }

        if let Ok(transaction) = settings.get::<TransactionEnvConfig>("transaction") {
            self.merge_transaction_config(transaction);
        }

        if let Ok(logging) = settings.get::<LoggingEnvConfig>("logging") {
            self.merge_logging_config(logging);
        }

        Ok(())
    }

    fn load_from_env(&mut self) -> Result<(), Error> {
        for index in ChainIndex::ALL {
            self.load_network_env(index)?;
        }

        if let Ok(buffer) = env::var(format!("{}_GAS_BUFFER_PERCENT", ENV_TX_PREFIX)) {
            let buffer = buffer.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("Invalid gas buffer percent '{}'", buffer))
            })?;
            self.transaction.gas_buffer_percent = Some(buffer);
        }

        if let Ok(level) = env::var(format!("{}_LEVEL", ENV_LOG_PREFIX)) {
            self.logging.level = Some(level);
        }
        if let Ok(format) = env::var(format!("{}_FORMAT", ENV_LOG_PREFIX)) {
            self.logging.format = Some(format);
        }

        Ok(())
    }

    /// `PRESALE_NETWORK_<index>_<FIELD>`
    fn load_network_env(&mut self, index: ChainIndex) -> Result<(), Error> {
        let prefix = format!("{}_{}", ENV_NETWORK_PREFIX, index.as_usize());
        let network = &mut self.networks[index.as_usize()];

        if let Ok(name) = env::var(format!("{}_NAME", prefix)) {
            network.name = Some(name);
        }

        if let Ok(chain_id) = env::var(format!("{}_CHAIN_ID", prefix)) {
            network.chain_id = Some(parse_chain_id(&chain_id)?);
        }

        if let Ok(symbol) = env::var(format!("{}_CURRENCY_SYMBOL", prefix)) {
            network.currency_symbol = Some(symbol);
        }

        if let Ok(rpc_url) = env::var(format!("{}_RPC_URL", prefix)) {
            network.rpc_url = Some(rpc_url);
        }

        if let Ok(address) = env::var(format!("{}_PRESALE_ADDRESS", prefix)) {
            network.presale_address = Some(address);
        }

        Ok(())
    }

    /// Merge network configuration (file config is overridden by env)
    fn merge_network_config(&mut self, index: usize, file_config: NetworkEnvConfig) {
        let network = &mut self.networks[index];
        if network.name.is_none() {
            network.name = file_config.name;
        }
        if network.chain_id.is_none() {
            network.chain_id = file_config.chain_id;
        }
        if network.currency_symbol.is_none() {
            network.currency_symbol = file_config.currency_symbol;
        }
        if network.rpc_url.is_none() {
            network.rpc_url = file_config.rpc_url;
        }
        if network.presale_address.is_none() {
            network.presale_address = file_config.presale_address;
        }
    }

    fn merge_transaction_config(&mut self, file_config: TransactionEnvConfig) {
        if self.transaction.gas_buffer_percent.is_none() {
            self.transaction.gas_buffer_percent = file_config.gas_buffer_percent;
        }
    }

    fn merge_logging_config(&mut self, file_config: LoggingEnvConfig) {
        if self.logging.level.is_none() {
            self.logging.level = file_config.level;
        }
        if self.logging.format.is_none() {
            self.logging.format = file_config.format;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Error> {
        self.networks()?;

        if let Some(buffer) = self.transaction.gas_buffer_percent {
            if buffer > 100 {
                return Err(Error::Config(
                    "Gas buffer must be between 0 and 100 percent".to_string(),
                ));
            }
        }

        if let Some(ref level) = self.logging.level {
            let valid_levels = ["error", "warn", "info", "debug", "trace"];
            if !valid_levels.contains(&level.as_str()) {
                return Err(Error::Config(format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    level, valid_levels
                )));
            }
        }

        if let Some(ref format) = self.logging.format {
            let valid_formats = ["compact", "pretty", "json"];
            if !valid_formats.contains(&format.as_str()) {
                return Err(Error::Config(format!(
                    "Invalid log format '{}'. Must be one of: {:?}",
                    format, valid_formats
                )));
            }
        }

        Ok(())
    }

    /// Built-in deployments with every override applied
    pub fn networks(&self) -> Result<ConfiguredNetworks, Error> {
        let mut networks = ConfiguredNetworks::default();
        for index in ChainIndex::ALL {
            apply_overrides(networks.get_mut(index), &self.networks[index.as_usize()])?;
        }
        networks.validate()?;
        Ok(networks)
    }

    /// Get gas buffer with fallback
    pub fn get_gas_buffer_percent(&self) -> u64 {
        self.transaction
            .gas_buffer_percent
            .unwrap_or(DEFAULT_GAS_BUFFER_PERCENT)
    }

    /// Get log level with fallback
    pub fn get_log_level(&self) -> String {
        self.logging
            .level
            .clone()
            .unwrap_or_else(|| "info".to_string())
    }

    /// Get log format with fallback
    pub fn get_log_format(&self) -> String {
        self.logging
            .format
            .clone()
            .unwrap_or_else(|| "compact".to_string())
    }

    /// Configuration with every field filled from the built-in defaults
    pub fn generate_default_config() -> Self {
        let defaults = ConfiguredNetworks::default();
        let mut config = Self::default();

        for (index, network) in defaults.iter() {
            config.networks[index.as_usize()] = NetworkEnvConfig {
                name: Some(network.name.clone()),
                chain_id: Some(network.chain_id),
                currency_symbol: Some(network.currency_symbol.clone()),
                rpc_url: Some(network.rpc_url.clone()),
                presale_address: network.presale_address.map(|a| a.to_checksum(None)),
            };
        }
        config.transaction.gas_buffer_percent = Some(DEFAULT_GAS_BUFFER_PERCENT);
        config.logging.level = Some("info".to_string());
        config.logging.format = Some("compact".to_string());

        config
    }

    /// Save configuration to file
    pub fn save_to_file(&self, file_path: &Path) -> Result<(), Error> {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(file_path, content)?;
        Ok(())
    }
}

fn apply_overrides(network: &mut NetworkConfig, overrides: &NetworkEnvConfig) -> Result<(), Error> {
    if let Some(ref name) = overrides.name {
        network.name = name.clone();
    }
    if let Some(chain_id) = overrides.chain_id {
        network.chain_id = chain_id;
    }
    if let Some(ref symbol) = overrides.currency_symbol {
        network.currency_symbol = symbol.clone();
    }
    if let Some(ref rpc_url) = overrides.rpc_url {
        network.rpc_url = rpc_url.clone();
    }
    if let Some(ref address) = overrides.presale_address {
        // An empty value removes the deployment
        network.presale_address = if address.trim().is_empty() {
            None
        } else {
            Some(Address::from_str(address.trim()).map_err(|e| {
                Error::Config(format!("Invalid presale address '{}': {}", address, e))
            })?)
        };
    }
    Ok(())
}

/// Decimal or `0x`-prefixed hex chain id
pub fn parse_chain_id(value: &str) -> Result<u64, Error> {
    let value = value.trim();
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse::<u64>(),
    };
    parsed.map_err(|_| Error::Config(format!("Invalid chain id '{}'", value)))
}
