use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::protocols::presale::network::ChainIndex;

/// One presale deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Human-readable network name
    pub name: String,
    /// EVM chain id reported by the wallet provider
    pub chain_id: u64,
    /// Native currency symbol, e.g. "BNB"
    pub currency_symbol: String,
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Presale contract; `None` when nothing is deployed on this chain
    pub presale_address: Option<Address>,
}

impl NetworkConfig {
    /// Ropsten, no presale deployed
    pub fn ropsten() -> Self {
        Self {
            name: "Ropsten".to_string(),
            chain_id: 0x3,
            currency_symbol: "ETH".to_string(),
            rpc_url: "https://rpc.ankr.com/eth_ropsten".to_string(),
            presale_address: None,
        }
    }

    /// BNB Smart Chain
    pub fn bsc() -> Self {
        Self {
            name: "BNB Smart Chain".to_string(),
            chain_id: 0x38,
            currency_symbol: "BNB".to_string(),
            rpc_url: "https://bsc-dataseed.binance.org".to_string(),
            presale_address: Some(address!("A5c8E773B9887EEa7a42C7Efe8a997e31219F456")),
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("Network name must not be empty".to_string()));
        }
        if self.currency_symbol.trim().is_empty() {
            return Err(Error::Config(format!(
                "Currency symbol for network '{}' must not be empty",
                self.name
            )));
        }
        if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "RPC URL for network '{}' must start with http:// or https://",
                self.name
            )));
        }
        Ok(())
    }
}

/// The two deployments the presale runs on, in a fixed order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguredNetworks {
    networks: [NetworkConfig; 2],
}

impl Default for ConfiguredNetworks {
    fn default() -> Self {
        Self {
            networks: [NetworkConfig::ropsten(), NetworkConfig::bsc()],
        }
    }
}

impl ConfiguredNetworks {
    /// Build and validate a pair
    pub fn new(first: NetworkConfig, second: NetworkConfig) -> Result<Self, Error> {
        let networks = Self {
            networks: [first, second],
        };
        networks.validate()?;
        Ok(networks)
    }

    pub fn get(&self, index: ChainIndex) -> &NetworkConfig {
        &self.networks[index.as_usize()]
    }

    pub fn get_mut(&mut self, index: ChainIndex) -> &mut NetworkConfig {
        &mut self.networks[index.as_usize()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChainIndex, &NetworkConfig)> {
        ChainIndex::ALL.into_iter().zip(self.networks.iter())
    }

    /// Find the deployment for a chain id
    pub fn find(&self, chain_id: u64) -> Option<(ChainIndex, &NetworkConfig)> {
        self.iter().find(|(_, network)| network.chain_id == chain_id)
    }

    pub fn validate(&self) -> Result<(), Error> {
        for network in &self.networks {
            network.validate()?;
        }
        if self.networks[0].chain_id == self.networks[1].chain_id {
            return Err(Error::Config(format!(
                "Both networks use chain id {}; they must differ",
                self.networks[0].chain_id
            )));
        }
        Ok(())
    }
}
