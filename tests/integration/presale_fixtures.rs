//! Test fixtures for presale integration tests
//!
//! An in-memory `PresaleContract` that counts every call, can fail selected
//! reads, and can hold a read or a deposit open until the test releases it.

#![allow(dead_code)]

use alloy_primitives::{address, Address, B256, U256};
use async_trait::async_trait;
use presale_sdk::protocols::presale::{
    NativeAmount, NetworkBinding, PresaleConnector, PresaleContract, RawBuyerInfo,
    RawPresaleInfo, RawSaleStatus, RawTokenInfo, ReadCall,
};
use presale_sdk::Error;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const BSC_CHAIN_ID: u64 = 0x38;
pub const ROPSTEN_CHAIN_ID: u64 = 0x3;

pub const MOCK_SALE_TOKEN: Address = address!("4444444444444444444444444444444444444444");
pub const MOCK_BUYER: Address = address!("2222222222222222222222222222222222222222");
pub const MOCK_OTHER_BUYER: Address = address!("2323232323232323232323232323232323232323");

/// 5 Mar 2022 15:00 UTC
pub const PRESALE_START: u64 = 1_646_492_400;
/// 12 Mar 2022 15:00 UTC
pub const PRESALE_END: u64 = 1_647_097_200;

const ETHER: u128 = 1_000_000_000_000_000_000;

/// Per-method call counters
#[derive(Debug, Default)]
pub struct CallCounts {
    pub presale_info: AtomicUsize,
    pub token_info: AtomicUsize,
    pub status: AtomicUsize,
    pub buyers: AtomicUsize,
    pub presale_status: AtomicUsize,
    pub deposits: AtomicUsize,
    pub claims: AtomicUsize,
    pub withdrawals: AtomicUsize,
}

impl CallCounts {
    pub fn reads(&self) -> usize {
        self.presale_info.load(Ordering::SeqCst)
            + self.token_info.load(Ordering::SeqCst)
            + self.status.load(Ordering::SeqCst)
            + self.buyers.load(Ordering::SeqCst)
            + self.presale_status.load(Ordering::SeqCst)
    }

    pub fn actions(&self) -> usize {
        self.deposits.load(Ordering::SeqCst)
            + self.claims.load(Ordering::SeqCst)
            + self.withdrawals.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.reads() + self.actions()
    }
}

/// Holds a call open until released; `entered` fires once the call is waiting
#[derive(Debug, Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl Gate {
    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Debug)]
pub struct MockPresale {
    phase_code: U256,
    decimals: u8,
    failing: HashSet<ReadCall>,
    reject_actions: bool,
    read_gate: Option<Gate>,
    deposit_gate: Option<Gate>,
    pub calls: CallCounts,
    deposits: Mutex<Vec<U256>>,
}

impl MockPresale {
    /// Healthy sale reporting `phase_code` from `presaleStatus()`
    pub fn new(phase_code: u64) -> Self {
        Self {
            phase_code: U256::from(phase_code),
            decimals: 18,
            failing: HashSet::new(),
            reject_actions: false,
            read_gate: None,
            deposit_gate: None,
            calls: CallCounts::default(),
            deposits: Mutex::new(Vec::new()),
        }
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    /// Make `call` revert
    pub fn failing(mut self, call: ReadCall) -> Self {
        self.failing.insert(call);
        self
    }

    /// Revert every state-changing call
    pub fn rejecting_actions(mut self) -> Self {
        self.reject_actions = true;
        self
    }

    /// Hold `presale_info()` at `gate`
    pub fn with_read_gate(mut self, gate: Gate) -> Self {
        self.read_gate = Some(gate);
        self
    }

    /// Hold `userDeposit()` at `gate`
    pub fn with_deposit_gate(mut self, gate: Gate) -> Self {
        self.deposit_gate = Some(gate);
        self
    }

    /// Values sent with accepted deposits
    pub fn deposits(&self) -> Vec<U256> {
        self.deposits.lock().unwrap().clone()
    }

    fn check(&self, call: ReadCall) -> Result<(), Error> {
        if self.failing.contains(&call) {
            return Err(Error::Evm(format!("{} reverted", call.method())));
        }
        Ok(())
    }

    fn token_units(&self, whole: u64) -> U256 {
        U256::from(whole) * U256::from(10u64).pow(U256::from(self.decimals))
    }

    fn action_result(&self, tag: u8) -> Result<B256, Error> {
        if self.reject_actions {
            return Err(Error::Evm("execution reverted".to_string()));
        }
        Ok(B256::repeat_byte(tag))
    }
}

#[async_trait]
impl PresaleContract for MockPresale {
    async fn presale_info(&self) -> Result<RawPresaleInfo, Error> {
        self.calls.presale_info.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.read_gate {
            gate.pass().await;
        }
        self.check(ReadCall::PresaleInfo)?;
        Ok(RawPresaleInfo {
            sale_token: MOCK_SALE_TOKEN,
            token_rate: U256::from(1000u64),
            raise_min: U256::from(ETHER / 10),
            raise_max: U256::from(5 * ETHER),
            softcap: U256::from(50 * ETHER),
            hardcap: U256::from(100 * ETHER),
            presale_start: U256::from(PRESALE_START),
            presale_end: U256::from(PRESALE_END),
        })
    }

    async fn token_info(&self) -> Result<RawTokenInfo, Error> {
        self.calls.token_info.fetch_add(1, Ordering::SeqCst);
        self.check(ReadCall::TokenInfo)?;
        Ok(RawTokenInfo {
            name: "Andromeda".to_string(),
            symbol: "ADM".to_string(),
            totalsupply: self.token_units(1_000_000),
            decimal: U256::from(self.decimals),
        })
    }

    async fn status(&self) -> Result<RawSaleStatus, Error> {
        self.calls.status.fetch_add(1, Ordering::SeqCst);
        self.check(ReadCall::Status)?;
        Ok(RawSaleStatus {
            raised_amount: U256::from(12 * ETHER),
            sold_amount: self.token_units(12_000),
        })
    }

    async fn buyers(&self, _account: Address) -> Result<RawBuyerInfo, Error> {
        self.calls.buyers.fetch_add(1, Ordering::SeqCst);
        self.check(ReadCall::Buyers)?;
        Ok(RawBuyerInfo {
            base: U256::from(2 * ETHER),
            sale: self.token_units(2_000),
        })
    }

    async fn presale_status(&self) -> Result<U256, Error> {
        self.calls.presale_status.fetch_add(1, Ordering::SeqCst);
        self.check(ReadCall::PresaleStatus)?;
        Ok(self.phase_code)
    }

    async fn user_deposit(&self, value: NativeAmount) -> Result<B256, Error> {
        self.calls.deposits.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.deposit_gate {
            gate.pass().await;
        }
        let tx_hash = self.action_result(0xd0)?;
        self.deposits.lock().unwrap().push(value.raw());
        Ok(tx_hash)
    }

    async fn user_withdraw_tokens(&self) -> Result<B256, Error> {
        self.calls.claims.fetch_add(1, Ordering::SeqCst);
        self.action_result(0xc1)
    }

    async fn user_withdraw_base_tokens(&self) -> Result<B256, Error> {
        self.calls.withdrawals.fetch_add(1, Ordering::SeqCst);
        self.action_result(0xb2)
    }
}

/// Hands out the same mock for every network and counts connections
#[derive(Debug)]
pub struct MockConnector {
    pub contract: Arc<MockPresale>,
    pub connections: AtomicUsize,
}

impl MockConnector {
    pub fn new(contract: MockPresale) -> Self {
        Self {
            contract: Arc::new(contract),
            connections: AtomicUsize::new(0),
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PresaleConnector for MockConnector {
    async fn connect(&self, _binding: &NetworkBinding) -> Result<Arc<dyn PresaleContract>, Error> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        let contract: Arc<dyn PresaleContract> = self.contract.clone();
        Ok(contract)
    }
}
