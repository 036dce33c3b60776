use crate::error::Error;
use crate::protocols::presale::amount::NativeAmount;
use crate::protocols::presale::network::NetworkBinding;
use crate::protocols::presale::types::{
    RawBuyerInfo, RawPresaleInfo, RawSaleStatus, RawTokenInfo,
};
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use std::sync::Arc;

/// Presale contract surface consumed by the reader and the dispatcher.
///
/// Implemented over JSON-RPC by `protocols::evm::contracts::Presale`; the
/// methods mirror the contract's function names.
#[async_trait]
pub trait PresaleContract: Send + Sync {
    async fn presale_info(&self) -> Result<RawPresaleInfo, Error>;

    async fn token_info(&self) -> Result<RawTokenInfo, Error>;

    async fn status(&self) -> Result<RawSaleStatus, Error>;

    async fn buyers(&self, account: Address) -> Result<RawBuyerInfo, Error>;

    /// Raw phase code
    async fn presale_status(&self) -> Result<U256, Error>;

    /// Deposit `value` of native currency. Returns once the provider has
    /// accepted the transaction.
    async fn user_deposit(&self, value: NativeAmount) -> Result<B256, Error>;

    /// Claim purchased tokens after a successful sale
    async fn user_withdraw_tokens(&self) -> Result<B256, Error>;

    /// Reclaim the native deposit after a failed sale
    async fn user_withdraw_base_tokens(&self) -> Result<B256, Error>;
}

/// Produces a contract handle bound to one resolved network
#[async_trait]
pub trait PresaleConnector: Send + Sync {
    async fn connect(&self, binding: &NetworkBinding) -> Result<Arc<dyn PresaleContract>, Error>;
}
