//! Presale contract helpers
//!
//! Binds the presale ABI to an `EvmClient` and exposes it through the
//! `PresaleContract` trait used by the reader and the dispatcher.
//!
//! # Example
//!
//! ```rust,no_run
//! use presale_sdk::protocols::evm::client::EvmClient;
//! use presale_sdk::protocols::evm::contracts::Presale;
//! use presale_sdk::protocols::presale::PresaleContract;
//! use alloy_primitives::address;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EvmClient::new("https://bsc-dataseed.binance.org", 56)?;
//! let presale = Presale::new(client, address!("A5c8E773B9887EEa7a42C7Efe8a997e31219F456"));
//!
//! let info = presale.presale_info().await?;
//! println!("Rate: {} tokens per BNB", info.token_rate);
//! # Ok(())
//! # }
//! ```

use crate::error::Error;
use crate::protocols::evm::client::EvmClient;
use crate::protocols::presale::amount::NativeAmount;
use crate::protocols::presale::contract::{PresaleConnector, PresaleContract};
use crate::protocols::presale::network::NetworkBinding;
use crate::protocols::presale::types::{RawBuyerInfo, RawPresaleInfo, RawSaleStatus, RawTokenInfo};
use crate::wallet::EvmWallet;
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

sol! {
    #[derive(Debug)]
    interface IPresale {
        // View functions
        function presale_info() external view returns (
            address sale_token,
            uint256 token_rate,
            uint256 raise_min,
            uint256 raise_max,
            uint256 softcap,
            uint256 hardcap,
            uint256 presale_start,
            uint256 presale_end
        );
        function tokeninfo() external view returns (
            string name,
            string symbol,
            uint256 totalsupply,
            uint256 decimal
        );
        function status() external view returns (uint256 raised_amount, uint256 sold_amount);
        function buyers(address account) external view returns (uint256 base, uint256 sale);
        function presaleStatus() external view returns (uint256);

        // State-changing functions
        function userDeposit() external payable;
        function userWithdrawTokens() external;
        function userWithdrawBaseTokens() external;
    }
}

/// Presale contract helper
#[derive(Debug, Clone)]
pub struct Presale {
    client: EvmClient,
    address: Address,
    signer: Option<Arc<EvmWallet>>,
    gas_buffer_percent: Option<u64>,
}

impl Presale {
    /// Read-only helper for the contract at `address`
    pub fn new(client: EvmClient, address: Address) -> Self {
        Self {
            client,
            address,
            signer: None,
            gas_buffer_percent: None,
        }
    }

    /// Sign state-changing calls with `wallet`
    pub fn with_signer(mut self, wallet: Arc<EvmWallet>) -> Self {
        self.signer = Some(wallet);
        self
    }

    /// Gas headroom for state-changing calls, in percent
    pub fn with_gas_buffer(mut self, percent: u64) -> Self {
        self.gas_buffer_percent = Some(percent);
        self
    }

    /// Get contract address
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn client(&self) -> &EvmClient {
        &self.client
    }

    async fn send<T: SolCall>(&self, call: T, value: Option<U256>) -> Result<B256, Error> {
        let wallet = self.signer.as_ref().ok_or(Error::WalletUnconnected)?;
        debug!("Sending {} to presale {}", T::SIGNATURE, self.address);
        self.client
            .send_contract_call(self.address, call, wallet, value, self.gas_buffer_percent)
            .await
    }
}

#[async_trait]
impl PresaleContract for Presale {
    async fn presale_info(&self) -> Result<RawPresaleInfo, Error> {
        let call = IPresale::presale_infoCall {};
        let result = self.client.call_contract(self.address, call).await?;
        Ok(RawPresaleInfo {
            sale_token: result.sale_token,
            token_rate: result.token_rate,
            raise_min: result.raise_min,
            raise_max: result.raise_max,
            softcap: result.softcap,
            hardcap: result.hardcap,
            presale_start: result.presale_start,
            presale_end: result.presale_end,
        })
    }

    async fn token_info(&self) -> Result<RawTokenInfo, Error> {
        let call = IPresale::tokeninfoCall {};
        let result = self.client.call_contract(self.address, call).await?;
        Ok(RawTokenInfo {
            name: result.name,
            symbol: result.symbol,
            totalsupply: result.totalsupply,
            decimal: result.decimal,
        })
    }

    async fn status(&self) -> Result<RawSaleStatus, Error> {
        let call = IPresale::statusCall {};
        let result = self.client.call_contract(self.address, call).await?;
        Ok(RawSaleStatus {
            raised_amount: result.raised_amount,
            sold_amount: result.sold_amount,
        })
    }

    async fn buyers(&self, account: Address) -> Result<RawBuyerInfo, Error> {
        let call = IPresale::buyersCall { account };
        let result = self.client.call_contract(self.address, call).await?;
        Ok(RawBuyerInfo {
            base: result.base,
            sale: result.sale,
        })
    }

    async fn presale_status(&self) -> Result<U256, Error> {
        let call = IPresale::presaleStatusCall {};
        let result = self.client.call_contract(self.address, call).await?;
        Ok(result._0)
    }

    async fn user_deposit(&self, value: NativeAmount) -> Result<B256, Error> {
        self.send(IPresale::userDepositCall {}, Some(value.raw()))
            .await
    }

    async fn user_withdraw_tokens(&self) -> Result<B256, Error> {
        self.send(IPresale::userWithdrawTokensCall {}, None).await
    }

    async fn user_withdraw_base_tokens(&self) -> Result<B256, Error> {
        self.send(IPresale::userWithdrawBaseTokensCall {}, None)
            .await
    }
}

/// Connects to the presale deployment of a resolved network over JSON-RPC
#[derive(Debug, Clone, Default)]
pub struct EvmPresaleConnector {
    signer: Option<Arc<EvmWallet>>,
    gas_buffer_percent: Option<u64>,
}

impl EvmPresaleConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signer(mut self, wallet: Arc<EvmWallet>) -> Self {
        self.signer = Some(wallet);
        self
    }

    pub fn with_gas_buffer(mut self, percent: u64) -> Self {
        self.gas_buffer_percent = Some(percent);
        self
    }

    /// Typed helper for the network's presale contract
    pub fn presale(&self, binding: &NetworkBinding) -> Result<Presale, Error> {
        let address = binding.require_presale_address()?;
        let client = EvmClient::new(&binding.rpc_url, binding.chain_id)?;

        let mut presale = Presale::new(client, address);
        if let Some(wallet) = &self.signer {
            presale = presale.with_signer(wallet.clone());
        }
        if let Some(percent) = self.gas_buffer_percent {
            presale = presale.with_gas_buffer(percent);
        }
        Ok(presale)
    }
}

#[async_trait]
impl PresaleConnector for EvmPresaleConnector {
    /// Refuses an endpoint that serves a different chain than `binding`
    async fn connect(&self, binding: &NetworkBinding) -> Result<Arc<dyn PresaleContract>, Error> {
        let presale = self.presale(binding)?;
        presale.client().verify_chain_id().await?;
        debug!(
            "Connected to presale {} on chain {}",
            presale.address(),
            binding.chain_id
        );
        let presale: Arc<dyn PresaleContract> = Arc::new(presale);
        Ok(presale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfiguredNetworks;
    use crate::protocols::presale::network::resolve_network;
    use alloy_sol_types::SolValue;
    use tiny_keccak::{Hasher, Keccak};

    fn selector(signature: &str) -> [u8; 4] {
        let mut hasher = Keccak::v256();
        hasher.update(signature.as_bytes());
        let mut hash = [0u8; 32];
        hasher.finalize(&mut hash);
        [hash[0], hash[1], hash[2], hash[3]]
    }

    #[test]
    fn test_selectors_match_contract_signatures() {
        assert_eq!(IPresale::presale_infoCall::SELECTOR, selector("presale_info()"));
        assert_eq!(IPresale::tokeninfoCall::SELECTOR, selector("tokeninfo()"));
        assert_eq!(IPresale::statusCall::SELECTOR, selector("status()"));
        assert_eq!(IPresale::buyersCall::SELECTOR, selector("buyers(address)"));
        assert_eq!(IPresale::presaleStatusCall::SELECTOR, selector("presaleStatus()"));
        assert_eq!(IPresale::userDepositCall::SELECTOR, selector("userDeposit()"));
        assert_eq!(
            IPresale::userWithdrawTokensCall::SELECTOR,
            selector("userWithdrawTokens()")
        );
        assert_eq!(
            IPresale::userWithdrawBaseTokensCall::SELECTOR,
            selector("userWithdrawBaseTokens()")
        );
    }

    #[test]
    fn test_buyers_call_encodes_account() {
        let account = Address::repeat_byte(0xab);
        let encoded = IPresale::buyersCall { account }.abi_encode();
        assert_eq!(encoded.len(), 4 + 32);
        assert_eq!(&encoded[16..36], account.as_slice());
    }

    #[test]
    fn test_decode_tokeninfo_return() {
        let encoded = (
            "Andromeda".to_string(),
            "ADM".to_string(),
            U256::from(1_000_000u64),
            U256::from(9u8),
        )
            .abi_encode_params();
        let decoded = IPresale::tokeninfoCall::abi_decode_returns(&encoded, true).unwrap();
        assert_eq!(decoded.name, "Andromeda");
        assert_eq!(decoded.symbol, "ADM");
        assert_eq!(decoded.decimal, U256::from(9u8));
    }

    #[tokio::test]
    async fn test_connector_requires_deployment() {
        let networks = ConfiguredNetworks::default();
        let connector = EvmPresaleConnector::new();

        let ropsten = resolve_network(&networks, Some(0x3));
        let result = connector.connect(ropsten.binding().unwrap()).await;
        assert!(matches!(result, Err(Error::Config(_))));

        let bsc = resolve_network(&networks, Some(0x38));
        let presale = connector.presale(bsc.binding().unwrap()).unwrap();
        assert_eq!(presale.client().chain_id(), 0x38);
    }

    #[tokio::test]
    async fn test_connector_checks_endpoint_chain() {
        let networks = ConfiguredNetworks::default();
        let mut binding = resolve_network(&networks, Some(0x38)).binding().cloned().unwrap();
        binding.rpc_url = "http://127.0.0.1:1".to_string();

        // Nothing listens there, so the chain id query is what fails
        let result = EvmPresaleConnector::new().connect(&binding).await;
        assert!(matches!(result, Err(Error::Rpc(_))));
    }

    #[tokio::test]
    async fn test_writes_without_signer_fail_before_rpc() {
        let client = EvmClient::new("http://127.0.0.1:1", 56).unwrap();
        let presale = Presale::new(client, Address::repeat_byte(0x01));
        assert!(matches!(
            presale.user_withdraw_tokens().await,
            Err(Error::WalletUnconnected)
        ));
    }
}
