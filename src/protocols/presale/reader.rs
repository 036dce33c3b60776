//! One info cycle against a bound presale contract.
//!
//! Reads are sequenced by dependency: sale terms and token metadata are
//! independent and run together; `status()` and `buyers()` need the token's
//! decimals and run after it; `presaleStatus()` runs once `status()` has
//! succeeded. A failed read is recorded and everything depending on it is
//! skipped, while sections that already succeeded stay in the snapshot.

use crate::error::Error;
use crate::protocols::presale::amount::{NativeAmount, TokenAmount, MAX_DECIMALS};
use crate::protocols::presale::contract::PresaleContract;
use crate::protocols::presale::network::NetworkBinding;
use crate::protocols::presale::phase::{derive_phase, Phase};
use crate::protocols::presale::types::{
    BuyerStatus, PresaleAction, RawBuyerInfo, RawPresaleInfo, RawSaleStatus, RawTokenInfo,
    ReadCall, ReadFailure, SaleStatus, SaleTerms, TokenInfo,
};
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// Share of the token supply offered in the sale, in percent
pub const SALE_SUPPLY_PERCENT: u64 = 10;

/// Everything one info cycle learned, replaced as a whole on the next cycle
#[derive(Debug, Clone, Serialize)]
pub struct PresaleSnapshot {
    pub network: NetworkBinding,
    pub account: Address,
    pub terms: Option<SaleTerms>,
    pub token: Option<TokenInfo>,
    pub status: Option<SaleStatus>,
    pub buyer: Option<BuyerStatus>,
    pub phase: Option<Phase>,
    pub failures: Vec<ReadFailure>,
    pub read_at: DateTime<Utc>,
}

impl PresaleSnapshot {
    fn new(network: NetworkBinding, account: Address) -> Self {
        Self {
            network,
            account,
            terms: None,
            token: None,
            status: None,
            buyer: None,
            phase: None,
            failures: Vec::new(),
            read_at: Utc::now(),
        }
    }

    /// True when every read succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// First failure message, the one surfaced to the user
    pub fn alert(&self) -> Option<&'static str> {
        self.failures.first().map(|f| f.message())
    }

    /// Phase for gating; a cycle that never reached `presaleStatus()` gates nothing
    pub fn phase_or_inactive(&self) -> Phase {
        self.phase.unwrap_or(Phase::Inactive)
    }

    pub fn permitted_action(&self) -> Option<PresaleAction> {
        self.phase_or_inactive().permitted_action()
    }

    fn record<T>(&mut self, call: ReadCall, result: Result<T, Error>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    "Presale read {} failed on chain {}: {}",
                    call.method(),
                    self.network.chain_id,
                    e
                );
                self.failures.push(ReadFailure {
                    call,
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}

/// Run one info cycle for `account` against `contract`.
///
/// Fails only when no account is connected; every on-chain failure is
/// reported inside the returned snapshot.
pub async fn read_all(
    contract: &dyn PresaleContract,
    network: &NetworkBinding,
    account: Option<Address>,
) -> Result<PresaleSnapshot, Error> {
    let account = account.ok_or(Error::WalletUnconnected)?;
    debug!(
        "Reading presale state for {} on {} (chain id {})",
        account, network.name, network.chain_id
    );

    let mut snapshot = PresaleSnapshot::new(network.clone(), account);

    let (terms, token) = futures::join!(read_terms(contract), read_token(contract));
    snapshot.terms = snapshot.record(ReadCall::PresaleInfo, terms);
    snapshot.token = snapshot.record(ReadCall::TokenInfo, token);

    let Some(decimals) = snapshot.token.as_ref().map(|t| t.decimals) else {
        return Ok(snapshot);
    };

    let (status, buyer) = futures::join!(
        read_status(contract, decimals),
        read_buyer(contract, account, decimals)
    );
    snapshot.status = snapshot.record(ReadCall::Status, status);
    snapshot.buyer = snapshot.record(ReadCall::Buyers, buyer);

    if snapshot.status.is_some() {
        let phase = contract.presale_status().await.map(derive_phase);
        snapshot.phase = snapshot.record(ReadCall::PresaleStatus, phase);
    }

    debug!(
        "Presale read finished: phase={:?}, failures={}",
        snapshot.phase,
        snapshot.failures.len()
    );
    Ok(snapshot)
}

async fn read_terms(contract: &dyn PresaleContract) -> Result<SaleTerms, Error> {
    normalize_terms(contract.presale_info().await?)
}

async fn read_token(contract: &dyn PresaleContract) -> Result<TokenInfo, Error> {
    normalize_token(contract.token_info().await?)
}

async fn read_status(contract: &dyn PresaleContract, decimals: u8) -> Result<SaleStatus, Error> {
    normalize_status(contract.status().await?, decimals)
}

async fn read_buyer(
    contract: &dyn PresaleContract,
    account: Address,
    decimals: u8,
) -> Result<BuyerStatus, Error> {
    normalize_buyer(contract.buyers(account).await?, decimals)
}

/// Native amounts at 18 decimals, deadlines as UTC
pub fn normalize_terms(raw: RawPresaleInfo) -> Result<SaleTerms, Error> {
    Ok(SaleTerms {
        sale_token: raw.sale_token,
        token_rate: raw.token_rate,
        soft_cap: NativeAmount::from_raw(raw.softcap),
        hard_cap: NativeAmount::from_raw(raw.hardcap),
        min_contribution: NativeAmount::from_raw(raw.raise_min),
        max_contribution: NativeAmount::from_raw(raw.raise_max),
        start_time: utc_from_unix(raw.presale_start)?,
        end_time: utc_from_unix(raw.presale_end)?,
    })
}

pub fn normalize_token(raw: RawTokenInfo) -> Result<TokenInfo, Error> {
    let decimals = token_decimals(raw.decimal)?;
    let total_supply = TokenAmount::new(raw.totalsupply, decimals)?;
    Ok(TokenInfo {
        name: raw.name,
        symbol: raw.symbol,
        decimals,
        sale_supply: total_supply.percent(SALE_SUPPLY_PERCENT),
        total_supply,
    })
}

/// Raised amount in native units, sold amount at the token's scale
pub fn normalize_status(raw: RawSaleStatus, decimals: u8) -> Result<SaleStatus, Error> {
    Ok(SaleStatus {
        raised_amount: NativeAmount::from_raw(raw.raised_amount),
        sold_amount: TokenAmount::new(raw.sold_amount, decimals)?,
    })
}

/// Invested amount in native units, allocation at the token's scale
pub fn normalize_buyer(raw: RawBuyerInfo, decimals: u8) -> Result<BuyerStatus, Error> {
    Ok(BuyerStatus {
        invested: NativeAmount::from_raw(raw.base),
        allocated: TokenAmount::new(raw.sale, decimals)?,
    })
}

fn token_decimals(raw: U256) -> Result<u8, Error> {
    if raw > U256::from(MAX_DECIMALS) {
        return Err(Error::Units(format!(
            "token reports {} decimals (maximum {})",
            raw, MAX_DECIMALS
        )));
    }
    Ok(raw.to::<u8>())
}

fn utc_from_unix(raw: U256) -> Result<DateTime<Utc>, Error> {
    let secs = i64::try_from(raw)
        .map_err(|_| Error::Other(format!("timestamp {} is out of range", raw)))?;
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| Error::Other(format!("timestamp {} is out of range", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn raw_terms() -> RawPresaleInfo {
        RawPresaleInfo {
            sale_token: Address::repeat_byte(0x11),
            token_rate: U256::from(1000u64),
            raise_min: U256::from(100_000_000_000_000_000u64),
            raise_max: U256::from(5_000_000_000_000_000_000u128),
            softcap: U256::from(50_000_000_000_000_000_000u128),
            hardcap: U256::from(100_000_000_000_000_000_000u128),
            presale_start: U256::from(1_646_492_400u64),
            presale_end: U256::from(1_647_097_200u64),
        }
    }

    #[test]
    fn test_normalize_terms_uses_native_scale_and_utc() {
        let terms = normalize_terms(raw_terms()).unwrap();
        assert_eq!(terms.min_contribution.to_string(), "0.1");
        assert_eq!(terms.max_contribution.to_string(), "5.0");
        assert_eq!(terms.soft_cap.to_string(), "50.0");
        assert_eq!(terms.hard_cap.to_string(), "100.0");
        assert_eq!(terms.start_time.day(), 5);
        assert_eq!(terms.start_time.hour(), 15);
        assert_eq!(terms.token_price().unwrap().to_string(), "0.001");
    }

    #[test]
    fn test_normalize_terms_rejects_absurd_timestamps() {
        let mut raw = raw_terms();
        raw.presale_end = U256::MAX;
        assert!(normalize_terms(raw).is_err());
    }

    #[test]
    fn test_normalize_token_derives_sale_supply() {
        let token = normalize_token(RawTokenInfo {
            name: "Andromeda".to_string(),
            symbol: "ADM".to_string(),
            totalsupply: U256::from(1_000_000_000_000_000u64),
            decimal: U256::from(9u8),
        })
        .unwrap();
        assert_eq!(token.decimals, 9);
        assert_eq!(token.total_supply.to_string(), "1000000.0");
        assert_eq!(token.sale_supply.to_string(), "100000.0");
    }

    #[test]
    fn test_normalize_token_rejects_oversized_decimals() {
        let result = normalize_token(RawTokenInfo {
            name: "Broken".to_string(),
            symbol: "BRK".to_string(),
            totalsupply: U256::from(1u8),
            decimal: U256::from(300u16),
        });
        assert!(matches!(result, Err(Error::Units(_))));
    }

    #[test]
    fn test_buyer_allocation_uses_token_decimals() {
        let buyer = normalize_buyer(
            RawBuyerInfo {
                base: U256::from(2_500_000_000_000_000_000u128),
                sale: U256::from(2_500_000u64),
            },
            6,
        )
        .unwrap();
        assert_eq!(buyer.invested.to_string(), "2.5");
        assert_eq!(buyer.allocated.to_string(), "2.5");
        assert_eq!(buyer.allocated.decimals(), 6);
        assert!(buyer.has_participated());
    }
}
