use crate::protocols::presale::amount::{NativeAmount, TokenAmount};
use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The on-chain reads performed during one info cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadCall {
    /// `presale_info()`
    PresaleInfo,
    /// `tokeninfo()`
    TokenInfo,
    /// `status()`
    Status,
    /// `buyers(account)`
    Buyers,
    /// `presaleStatus()`
    PresaleStatus,
}

impl ReadCall {
    /// Contract method name
    pub fn method(&self) -> &'static str {
        match self {
            ReadCall::PresaleInfo => "presale_info",
            ReadCall::TokenInfo => "tokeninfo",
            ReadCall::Status => "status",
            ReadCall::Buyers => "buyers",
            ReadCall::PresaleStatus => "presaleStatus",
        }
    }

    /// Message shown when this read fails
    pub fn failure_message(&self) -> &'static str {
        match self {
            ReadCall::PresaleInfo => "Get Presale Information Error",
            ReadCall::TokenInfo => "Get Token Information Error",
            ReadCall::Status => "Get Status Information Error",
            ReadCall::Buyers => "Get Buyers Information Error",
            ReadCall::PresaleStatus => "Get Status Error",
        }
    }
}

impl fmt::Display for ReadCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// User actions a presale phase can permit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresaleAction {
    /// Deposit native currency (`userDeposit`)
    Buy,
    /// Claim purchased tokens (`userWithdrawTokens`)
    Claim,
    /// Withdraw the native deposit after a failed sale (`userWithdrawBaseTokens`)
    Withdraw,
}

impl PresaleAction {
    /// Button label
    pub fn label(&self) -> &'static str {
        match self {
            PresaleAction::Buy => "Buy",
            PresaleAction::Claim => "Claim",
            PresaleAction::Withdraw => "Withdraw",
        }
    }

    /// Contract method submitted for this action
    pub fn method(&self) -> &'static str {
        match self {
            PresaleAction::Buy => "userDeposit",
            PresaleAction::Claim => "userWithdrawTokens",
            PresaleAction::Withdraw => "userWithdrawBaseTokens",
        }
    }

    pub fn requires_amount(&self) -> bool {
        matches!(self, PresaleAction::Buy)
    }

    fn noun(&self) -> &'static str {
        match self {
            PresaleAction::Buy => "Deposit",
            PresaleAction::Claim => "Claim",
            PresaleAction::Withdraw => "Withdraw",
        }
    }

    pub fn success_message(&self) -> String {
        format!("{} done successfully", self.noun())
    }

    pub fn failure_message(&self) -> String {
        format!("{} failed", self.noun())
    }
}

impl fmt::Display for PresaleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

// ========== Raw contract views ==========

/// `presale_info()` as returned by the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPresaleInfo {
    pub sale_token: Address,
    pub token_rate: U256,
    pub raise_min: U256,
    pub raise_max: U256,
    pub softcap: U256,
    pub hardcap: U256,
    pub presale_start: U256,
    pub presale_end: U256,
}

/// `tokeninfo()` as returned by the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTokenInfo {
    pub name: String,
    pub symbol: String,
    pub totalsupply: U256,
    pub decimal: U256,
}

/// `status()` as returned by the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSaleStatus {
    pub raised_amount: U256,
    pub sold_amount: U256,
}

/// `buyers(account)` as returned by the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBuyerInfo {
    pub base: U256,
    pub sale: U256,
}

// ========== Normalized views ==========

/// Sale terms with native amounts at 18 decimals and UTC deadlines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTerms {
    pub sale_token: Address,
    /// Tokens received per one unit of native currency
    pub token_rate: U256,
    pub soft_cap: NativeAmount,
    pub hard_cap: NativeAmount,
    pub min_contribution: NativeAmount,
    pub max_contribution: NativeAmount,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl SaleTerms {
    /// Native cost of one whole token, `None` when the rate is zero
    pub fn token_price(&self) -> Option<NativeAmount> {
        NativeAmount::per_token_at_rate(self.token_rate)
    }
}

/// Sale token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: TokenAmount,
    /// 10% of the total supply is offered in the sale
    pub sale_supply: TokenAmount,
}

/// Aggregate sale progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleStatus {
    pub raised_amount: NativeAmount,
    pub sold_amount: TokenAmount,
}

/// Participation of the connected account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerStatus {
    pub invested: NativeAmount,
    pub allocated: TokenAmount,
}

impl BuyerStatus {
    pub fn has_participated(&self) -> bool {
        !self.invested.is_zero() || !self.allocated.is_zero()
    }
}

/// A read that failed during an info cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadFailure {
    pub call: ReadCall,
    pub reason: String,
}

impl ReadFailure {
    pub fn message(&self) -> &'static str {
        self.call.failure_message()
    }
}

/// Result of a dispatched action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The phase permits no action; nothing was sent
    NoOp,
    /// The provider accepted the transaction for submission
    Submitted { action: PresaleAction, tx_hash: B256 },
}

impl ActionOutcome {
    /// Message shown after the dispatch, if any
    pub fn message(&self) -> Option<String> {
        match self {
            ActionOutcome::NoOp => None,
            ActionOutcome::Submitted { action, .. } => Some(action.success_message()),
        }
    }
}
