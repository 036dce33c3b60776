//! EVM transport for the presale SDK
//!
//! JSON-RPC client, EIP-1559 transaction building and the presale contract
//! binding. Everything chain-specific lives here; the `presale` module only
//! sees the `PresaleContract` trait.

pub mod client;
pub mod contracts;
pub mod tx;
pub mod types;

pub use client::EvmClient;
pub use contracts::{EvmPresaleConnector, Presale};
pub use tx::{Eip1559Transaction, SignedEip1559Transaction};
pub use types::{EvmCallRequest, EvmError, EvmTransactionRequest, FeeData};
