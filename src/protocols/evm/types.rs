//! EVM request types and errors
//!
//! Read calls go out as `eth_call`; state-changing calls are described by an
//! `EvmTransactionRequest` before fees, nonce and signature are attached.

use crate::error::Error;
use alloy_primitives::{Address, Bytes, U256};
use alloy_rpc_types_eth::TransactionRequest;

/// Read-only contract call
#[derive(Debug, Clone)]
pub struct EvmCallRequest {
    /// Target contract address
    pub to: Address,
    /// ABI-encoded call data
    pub data: Bytes,
}

impl EvmCallRequest {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
        }
    }

    pub(crate) fn to_rpc(&self) -> TransactionRequest {
        TransactionRequest::default()
            .to(self.to)
            .input(self.data.clone().into())
    }
}

/// State-changing contract call prior to signing
#[derive(Debug, Clone)]
pub struct EvmTransactionRequest {
    /// Sender, used for gas estimation
    pub from: Address,
    /// Target contract
    pub to: Address,
    /// Native value attached, in wei
    pub value: U256,
    /// ABI-encoded call data
    pub data: Bytes,
    /// Chain ID for replay protection
    pub chain_id: u64,
}

impl EvmTransactionRequest {
    pub fn new(chain_id: u64, from: Address, to: Address) -> Self {
        Self {
            from,
            to,
            value: U256::ZERO,
            data: Bytes::new(),
            chain_id,
        }
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    pub(crate) fn to_rpc(&self) -> TransactionRequest {
        TransactionRequest::default()
            .from(self.from)
            .to(self.to)
            .value(self.value)
            .input(self.data.clone().into())
    }
}

/// EIP-1559 fee parameters, in wei per gas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeData {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl FeeData {
    /// Fees from the latest base fee and a priority tip; the cap allows the
    /// base fee to double before the transaction stops being includable
    pub fn from_base_fee(base_fee: u128, priority_fee: u128) -> Self {
        Self {
            max_fee_per_gas: base_fee.saturating_mul(2).saturating_add(priority_fee),
            max_priority_fee_per_gas: priority_fee,
        }
    }
}

/// Gas limit with `buffer_percent` headroom on top of the estimate
pub fn apply_gas_buffer(estimate: u64, buffer_percent: u64) -> u64 {
    estimate.saturating_add(estimate.saturating_mul(buffer_percent) / 100)
}

/// EVM-specific errors
#[derive(Debug, thiserror::Error)]
pub enum EvmError {
    #[error("ABI encoding/decoding error: {0}")]
    AbiError(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Transaction failed: {0}")]
    TransactionError(String),

    #[error("Gas estimation failed: {0}")]
    GasEstimationError(String),

    #[error("Chain id mismatch: endpoint reports {actual}, expected {expected}")]
    ChainIdMismatch { expected: u64, actual: u64 },
}

impl From<EvmError> for Error {
    fn from(err: EvmError) -> Self {
        match err {
            EvmError::RpcError(msg) => Error::Rpc(msg),
            other => Error::Evm(other.to_string()),
        }
    }
}

/// Address derivation helpers
pub mod utils {
    use super::*;
    use tiny_keccak::{Hasher, Keccak};

    /// Derive an Ethereum address from an uncompressed secp256k1 public key
    /// (65 bytes, 0x04 prefix): the last 20 bytes of its Keccak-256 hash.
    pub fn eth_address_from_pubkey_uncompressed(pubkey: &[u8]) -> Result<Address, Error> {
        if pubkey.len() != 65 || pubkey[0] != 0x04 {
            return Err(Error::Wallet(
                "Invalid uncompressed public key format".to_string(),
            ));
        }

        let mut hasher = Keccak::v256();
        hasher.update(&pubkey[1..]);
        let mut hash = [0u8; 32];
        hasher.finalize(&mut hash);

        Ok(Address::from_slice(&hash[12..]))
    }
}
