//! EVM Client for the presale SDK
//!
//! Read-only calls, fee and nonce queries, and signed transaction submission
//! over a JSON-RPC HTTP endpoint.

use crate::config::DEFAULT_GAS_BUFFER_PERCENT;
use crate::error::Error;
use crate::protocols::evm::tx::Eip1559Transaction;
use crate::protocols::evm::types::{
    apply_gas_buffer, EvmCallRequest, EvmError, EvmTransactionRequest, FeeData,
};
use crate::wallet::EvmWallet;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use alloy_rpc_types_eth::BlockNumberOrTag;
use alloy_sol_types::SolCall;
use alloy_transport_http::{Client, Http};
use tracing::debug;

/// EVM Client for blockchain interactions
#[derive(Clone)]
pub struct EvmClient {
    provider: RootProvider<Http<Client>>,
    /// Chain ID for transaction signing
    chain_id: u64,
}

impl std::fmt::Debug for EvmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmClient")
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

impl EvmClient {
    /// Create a client for `rpc_url`, signing for `chain_id`
    pub fn new(rpc_url: &str, chain_id: u64) -> Result<Self, Error> {
        let url = reqwest::Url::parse(rpc_url)
            .map_err(|e| Error::Config(format!("Invalid RPC URL: {}", e)))?;
        let provider = ProviderBuilder::new().on_http(url);

        Ok(Self { provider, chain_id })
    }

    /// Create a client and take the chain id from the endpoint
    pub async fn connect(rpc_url: &str) -> Result<Self, Error> {
        let mut client = Self::new(rpc_url, 0)?;
        client.chain_id = client.get_chain_id().await?;
        Ok(client)
    }

    /// The chain id this client signs for
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Chain id reported by the endpoint
    pub async fn get_chain_id(&self) -> Result<u64, Error> {
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| EvmError::RpcError(e.to_string()))?;
        Ok(chain_id)
    }

    /// Fail when the endpoint serves a different chain than configured
    pub async fn verify_chain_id(&self) -> Result<(), Error> {
        let actual = self.get_chain_id().await?;
        if actual != self.chain_id {
            return Err(EvmError::ChainIdMismatch {
                expected: self.chain_id,
                actual,
            }
            .into());
        }
        Ok(())
    }

    /// Execute a read-only contract call
    pub async fn call(&self, request: EvmCallRequest) -> Result<Bytes, Error> {
        let tx_request = request.to_rpc();

        let result = self
            .provider
            .call(&tx_request)
            .await
            .map_err(|e| EvmError::RpcError(e.to_string()))?;

        Ok(result)
    }

    /// Call a contract method (read-only)
    pub async fn call_contract<T: SolCall>(
        &self,
        contract_address: Address,
        call: T,
    ) -> Result<T::Return, Error> {
        let request = EvmCallRequest::new(contract_address, call.abi_encode());
        let result = self.call(request).await?;
        let decoded = T::abi_decode_returns(&result, false).map_err(|e| {
            EvmError::AbiError(format!("Failed to decode {} result: {}", T::SIGNATURE, e))
        })?;
        Ok(decoded)
    }

    /// Estimate gas for a transaction
    pub async fn estimate_gas(&self, request: &EvmTransactionRequest) -> Result<u64, Error> {
        let gas = self
            .provider
            .estimate_gas(&request.to_rpc())
            .await
            .map_err(|e| EvmError::GasEstimationError(e.to_string()))?;

        Ok(gas)
    }

    /// Get the current gas price (legacy)
    pub async fn get_gas_price(&self) -> Result<u128, Error> {
        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| EvmError::RpcError(e.to_string()))?;

        Ok(gas_price)
    }

    /// EIP-1559 fees from the latest block's base fee and median tip
    pub async fn get_fee_data(&self) -> Result<FeeData, Error> {
        let fee_history = self
            .provider
            .get_fee_history(1, BlockNumberOrTag::Latest, &[50.0])
            .await
            .map_err(|e| EvmError::RpcError(e.to_string()))?;

        let base_fee = fee_history.base_fee_per_gas.last().copied();
        let reward = fee_history
            .reward
            .as_ref()
            .and_then(|r| r.last())
            .and_then(|r| r.first())
            .copied();

        match (base_fee, reward) {
            (Some(base_fee), Some(reward)) => Ok(FeeData::from_base_fee(base_fee, reward)),
            _ => {
                // Chains without a fee market: pay the legacy gas price as both cap and tip
                let gas_price = self.get_gas_price().await?;
                Ok(FeeData {
                    max_fee_per_gas: gas_price,
                    max_priority_fee_per_gas: gas_price,
                })
            }
        }
    }

    /// Pending nonce for `address`
    pub async fn get_transaction_count(&self, address: Address) -> Result<u64, Error> {
        let nonce = self
            .provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| EvmError::RpcError(e.to_string()))?;

        Ok(nonce)
    }

    /// Submit a signed transaction; returns once the node accepts it
    pub async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, Error> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| EvmError::TransactionError(e.to_string()))?;

        Ok(*pending.tx_hash())
    }

    /// Sign and submit a contract call from `wallet`.
    ///
    /// `value` is attached as native currency. The gas estimate gets
    /// `gas_buffer_percent` headroom (20% when unset). No receipt is awaited.
    pub async fn send_contract_call<T: SolCall>(
        &self,
        contract_address: Address,
        call: T,
        wallet: &EvmWallet,
        value: Option<U256>,
        gas_buffer_percent: Option<u64>,
    ) -> Result<B256, Error> {
        let request = EvmTransactionRequest::new(self.chain_id, wallet.address(), contract_address)
            .value(value.unwrap_or(U256::ZERO))
            .data(call.abi_encode());

        let (nonce, fees, estimate) = futures::try_join!(
            self.get_transaction_count(wallet.address()),
            self.get_fee_data(),
            self.estimate_gas(&request),
        )?;
        let gas_limit = apply_gas_buffer(
            estimate,
            gas_buffer_percent.unwrap_or(DEFAULT_GAS_BUFFER_PERCENT),
        );

        debug!(
            "{} to {}: nonce={}, gas_limit={}, max_fee={}, tip={}",
            T::SIGNATURE,
            contract_address,
            nonce,
            gas_limit,
            fees.max_fee_per_gas,
            fees.max_priority_fee_per_gas
        );

        let tx = Eip1559Transaction::from_request(&request, nonce, gas_limit, fees);
        let signed = wallet.sign_eip1559(&tx)?;
        let tx_hash = self.send_raw_transaction(signed.raw()).await?;

        if tx_hash != signed.hash() {
            debug!(
                "Node returned hash {} for locally computed {}",
                tx_hash,
                signed.hash()
            );
        }
        Ok(tx_hash)
    }
}
