pub mod client;
pub mod config;
pub mod error;
pub mod protocols;
pub mod wallet;

// Main client exports
pub use client::{PresaleClient, PresaleClientBuilder};
pub use config::{ConfiguredNetworks, NetworkConfig, PresaleConfig};
pub use error::Error;
pub use wallet::EvmWallet;

// Presale state machine exports
pub use protocols::presale::{
    derive_phase, read_all, resolve_network, ActionDispatcher, ActionOutcome, NativeAmount,
    NetworkBinding, NetworkResolution, Phase, PresaleAction, PresaleConnector, PresaleContract,
    PresaleSession, PresaleSnapshot, PresaleView, ReadOutcome, TokenAmount, WalletState,
};

// EVM transport exports
pub use protocols::evm::{EvmClient, EvmPresaleConnector, Presale};

// Re-export primitives used throughout the public API
pub use alloy_primitives::{Address, B256, U256};
