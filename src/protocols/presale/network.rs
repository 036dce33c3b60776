//! Chain resolution for the two configured presale deployments.

use crate::config::networks::{ConfiguredNetworks, NetworkConfig};
use crate::error::Error;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a deployment in the configured pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainIndex {
    First = 0,
    Second = 1,
}

impl ChainIndex {
    pub const ALL: [ChainIndex; 2] = [ChainIndex::First, ChainIndex::Second];

    pub fn as_usize(self) -> usize {
        self as usize
    }
}

/// The deployment a wallet is bound to for the lifetime of one connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkBinding {
    pub chain_index: ChainIndex,
    pub chain_id: u64,
    pub name: String,
    pub currency_symbol: String,
    pub rpc_url: String,
    pub presale_address: Option<Address>,
}

impl NetworkBinding {
    fn from_config(chain_index: ChainIndex, config: &NetworkConfig) -> Self {
        Self {
            chain_index,
            chain_id: config.chain_id,
            name: config.name.clone(),
            currency_symbol: config.currency_symbol.clone(),
            rpc_url: config.rpc_url.clone(),
            presale_address: config.presale_address,
        }
    }

    /// Presale contract address, or a configuration error when this chain
    /// has no deployment
    pub fn require_presale_address(&self) -> Result<Address, Error> {
        self.presale_address.ok_or_else(|| {
            Error::Config(format!(
                "No presale contract configured for network '{}' (chain id {})",
                self.name, self.chain_id
            ))
        })
    }

    /// Input adornment for the deposit amount, e.g. `$BNB`
    pub fn currency_adornment(&self) -> String {
        format!("${}", self.currency_symbol)
    }
}

/// Outcome of matching the wallet's chain id against the configured pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkResolution {
    /// No provider reported a chain; nothing may be read
    Uninitialized,
    /// The wallet is on one of the configured chains
    Recognized(NetworkBinding),
    /// The wallet is on some other chain; reads are suppressed
    Unrecognized { chain_id: u64 },
}

impl NetworkResolution {
    pub fn binding(&self) -> Option<&NetworkBinding> {
        match self {
            NetworkResolution::Recognized(binding) => Some(binding),
            _ => None,
        }
    }

    /// The bound network, or `ChainUnrecognized` for anything else
    pub fn require_binding(&self) -> Result<&NetworkBinding, Error> {
        match self {
            NetworkResolution::Recognized(binding) => Ok(binding),
            NetworkResolution::Unrecognized { chain_id } => Err(Error::ChainUnrecognized {
                chain_id: Some(*chain_id),
            }),
            NetworkResolution::Uninitialized => Err(Error::ChainUnrecognized { chain_id: None }),
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, NetworkResolution::Recognized(_))
    }

    /// Warning to surface for this resolution, if any
    pub fn warning(&self) -> Option<String> {
        match self {
            NetworkResolution::Unrecognized { chain_id } => Some(
                Error::ChainUnrecognized {
                    chain_id: Some(*chain_id),
                }
                .to_string(),
            ),
            _ => None,
        }
    }

    /// Label for the currently selected chain
    pub fn selected_chain_label(&self) -> String {
        match self {
            NetworkResolution::Recognized(binding) => binding.currency_adornment(),
            NetworkResolution::Unrecognized { .. } => "Unknown".to_string(),
            NetworkResolution::Uninitialized => "Unrecognized chain".to_string(),
        }
    }
}

impl fmt::Display for NetworkResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkResolution::Uninitialized => write!(f, "uninitialized"),
            NetworkResolution::Recognized(binding) => {
                write!(f, "{} (chain id {})", binding.name, binding.chain_id)
            }
            NetworkResolution::Unrecognized { chain_id } => {
                write!(f, "unrecognized (chain id {})", chain_id)
            }
        }
    }
}

/// Map the chain id reported by the wallet provider to a configured deployment
pub fn resolve_network(
    networks: &ConfiguredNetworks,
    reported_chain_id: Option<u64>,
) -> NetworkResolution {
    let Some(chain_id) = reported_chain_id else {
        return NetworkResolution::Uninitialized;
    };

    ChainIndex::ALL
        .iter()
        .find(|index| networks.get(**index).chain_id == chain_id)
        .map(|index| {
            NetworkResolution::Recognized(NetworkBinding::from_config(
                *index,
                networks.get(*index),
            ))
        })
        .unwrap_or(NetworkResolution::Unrecognized { chain_id })
}
