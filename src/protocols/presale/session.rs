//! Per-connection presale state.
//!
//! The session owns the wallet state, the resolved network, the latest
//! snapshot and the deposit input. Every wallet or network change bumps a
//! generation counter; a read started under an older generation is dropped
//! when it completes instead of overwriting newer state.

use crate::config::networks::ConfiguredNetworks;
use crate::error::Error;
use crate::protocols::presale::contract::{PresaleConnector, PresaleContract};
use crate::protocols::presale::dispatcher::ActionDispatcher;
use crate::protocols::presale::network::{resolve_network, NetworkBinding, NetworkResolution};
use crate::protocols::presale::phase::Phase;
use crate::protocols::presale::reader::{read_all, PresaleSnapshot};
use crate::protocols::presale::types::ActionOutcome;
use alloy_primitives::Address;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Deposit amount shown before the user types anything
pub const DEFAULT_DEPOSIT_AMOUNT: &str = "1";

/// What the wallet connector reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalletState {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
}

impl WalletState {
    pub fn connected(account: Address, chain_id: u64) -> Self {
        Self {
            account: Some(account),
            chain_id: Some(chain_id),
        }
    }

    pub fn is_disconnected(&self) -> bool {
        self.account.is_none() && self.chain_id.is_none()
    }
}

/// Captured at the start of a read; commits only while still current
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadTicket {
    generation: u64,
    pub account: Address,
    pub network: NetworkBinding,
}

impl ReadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of committing a finished read
#[derive(Debug, Clone)]
pub enum ReadOutcome {
    Applied(Arc<PresaleSnapshot>),
    /// The wallet or network changed while the read was running
    Stale,
}

impl ReadOutcome {
    pub fn snapshot(&self) -> Option<&Arc<PresaleSnapshot>> {
        match self {
            ReadOutcome::Applied(snapshot) => Some(snapshot),
            ReadOutcome::Stale => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, ReadOutcome::Stale)
    }
}

#[derive(Debug)]
struct SessionState {
    generation: u64,
    wallet: WalletState,
    resolution: NetworkResolution,
    snapshot: Option<Arc<PresaleSnapshot>>,
    deposit_amount: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            generation: 0,
            wallet: WalletState::default(),
            resolution: NetworkResolution::Uninitialized,
            snapshot: None,
            deposit_amount: DEFAULT_DEPOSIT_AMOUNT.to_string(),
        }
    }
}

pub struct PresaleSession {
    networks: ConfiguredNetworks,
    state: RwLock<SessionState>,
    dispatcher: ActionDispatcher,
}

impl PresaleSession {
    pub fn new(networks: ConfiguredNetworks) -> Self {
        Self {
            networks,
            state: RwLock::new(SessionState::default()),
            dispatcher: ActionDispatcher::new(),
        }
    }

    pub fn networks(&self) -> &ConfiguredNetworks {
        &self.networks
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a wallet/network change reported by the connector.
    ///
    /// Any change invalidates in-flight reads and clears the snapshot. A full
    /// disconnect also resets the deposit input.
    pub fn update_wallet(&self, wallet: WalletState) -> NetworkResolution {
        let mut state = self.write_state();
        if state.wallet == wallet {
            return state.resolution.clone();
        }

        state.generation += 1;
        state.wallet = wallet;
        state.resolution = resolve_network(&self.networks, wallet.chain_id);
        state.snapshot = None;
        if wallet.is_disconnected() {
            state.deposit_amount = DEFAULT_DEPOSIT_AMOUNT.to_string();
        }

        info!(
            "Wallet changed (generation {}): account={:?}, network={}",
            state.generation, wallet.account, state.resolution
        );
        state.resolution.clone()
    }

    /// Drop everything, as on provider disconnect
    pub fn reset(&self) {
        let mut state = self.write_state();
        let generation = state.generation + 1;
        *state = SessionState {
            generation,
            ..SessionState::default()
        };
        debug!("Session reset (generation {})", generation);
    }

    pub fn wallet(&self) -> WalletState {
        self.read_state().wallet
    }

    pub fn resolution(&self) -> NetworkResolution {
        self.read_state().resolution.clone()
    }

    pub fn generation(&self) -> u64 {
        self.read_state().generation
    }

    /// Latest committed snapshot
    pub fn snapshot(&self) -> Option<Arc<PresaleSnapshot>> {
        self.read_state().snapshot.clone()
    }

    /// Phase of the latest snapshot; `Inactive` until one has been read
    pub fn phase(&self) -> Phase {
        self.read_state()
            .snapshot
            .as_ref()
            .map(|s| s.phase_or_inactive())
            .unwrap_or(Phase::Inactive)
    }

    pub fn deposit_amount(&self) -> String {
        self.read_state().deposit_amount.clone()
    }

    pub fn set_deposit_amount(&self, amount: impl Into<String>) {
        self.write_state().deposit_amount = amount.into();
    }

    /// Start a read for the current wallet and network
    pub fn begin_read(&self) -> Result<ReadTicket, Error> {
        let state = self.read_state();
        let account = state.wallet.account.ok_or(Error::WalletUnconnected)?;
        let network = state.resolution.require_binding()?.clone();
        Ok(ReadTicket {
            generation: state.generation,
            account,
            network,
        })
    }

    /// Store `snapshot` unless the wallet or network changed since `ticket`
    pub fn commit(&self, ticket: &ReadTicket, snapshot: PresaleSnapshot) -> ReadOutcome {
        let mut state = self.write_state();
        if ticket.generation != state.generation {
            debug!(
                "Discarding stale presale read (generation {}, current {})",
                ticket.generation, state.generation
            );
            return ReadOutcome::Stale;
        }
        let snapshot = Arc::new(snapshot);
        state.snapshot = Some(snapshot.clone());
        ReadOutcome::Applied(snapshot)
    }

    /// Run one info cycle against `contract` and commit it
    pub async fn refresh_with(&self, contract: &dyn PresaleContract) -> Result<ReadOutcome, Error> {
        let ticket = self.begin_read()?;
        let snapshot = read_all(contract, &ticket.network, Some(ticket.account)).await?;
        Ok(self.commit(&ticket, snapshot))
    }

    /// Connect to the bound deployment, then run one info cycle
    pub async fn refresh(&self, connector: &dyn PresaleConnector) -> Result<ReadOutcome, Error> {
        let ticket = self.begin_read()?;
        let contract = connector.connect(&ticket.network).await?;
        let snapshot = read_all(contract.as_ref(), &ticket.network, Some(ticket.account)).await?;
        Ok(self.commit(&ticket, snapshot))
    }

    /// Dispatch the action permitted by the latest snapshot against `contract`
    pub async fn dispatch_with(&self, contract: &dyn PresaleContract) -> Result<ActionOutcome, Error> {
        let (phase, wallet, resolution, amount) = self.action_inputs();
        self.dispatcher
            .dispatch(contract, phase, wallet.account, &resolution, Some(&amount))
            .await
    }

    /// Guard the permitted action, connect, then submit it
    pub async fn dispatch(&self, connector: &dyn PresaleConnector) -> Result<ActionOutcome, Error> {
        let (phase, wallet, resolution, amount) = self.action_inputs();
        let Some(prepared) =
            self.dispatcher
                .prepare(phase, wallet.account, &resolution, Some(&amount))?
        else {
            return Ok(ActionOutcome::NoOp);
        };
        let binding = resolution.require_binding()?;
        let contract = connector.connect(binding).await?;
        self.dispatcher.submit(contract.as_ref(), prepared).await
    }

    fn action_inputs(&self) -> (Phase, WalletState, NetworkResolution, String) {
        let state = self.read_state();
        let phase = state
            .snapshot
            .as_ref()
            .map(|s| s.phase_or_inactive())
            .unwrap_or(Phase::Inactive);
        (
            phase,
            state.wallet,
            state.resolution.clone(),
            state.deposit_amount.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> PresaleSession {
        PresaleSession::new(ConfiguredNetworks::default())
    }

    #[test]
    fn test_begin_read_requires_account_and_network() {
        let session = session();
        assert!(matches!(session.begin_read(), Err(Error::WalletUnconnected)));

        session.update_wallet(WalletState::connected(Address::repeat_byte(1), 97));
        assert!(matches!(
            session.begin_read(),
            Err(Error::ChainUnrecognized { chain_id: Some(97) })
        ));

        session.update_wallet(WalletState::connected(Address::repeat_byte(1), 0x38));
        let ticket = session.begin_read().unwrap();
        assert_eq!(ticket.network.currency_symbol, "BNB");
        assert_eq!(ticket.generation(), session.generation());
    }

    #[test]
    fn test_unchanged_wallet_keeps_generation() {
        let session = session();
        let wallet = WalletState::connected(Address::repeat_byte(1), 0x38);
        session.update_wallet(wallet);
        let generation = session.generation();
        session.update_wallet(wallet);
        assert_eq!(session.generation(), generation);
    }

    #[test]
    fn test_disconnect_resets_deposit_amount() {
        let session = session();
        session.update_wallet(WalletState::connected(Address::repeat_byte(1), 0x38));
        session.set_deposit_amount("4.2");

        session.update_wallet(WalletState::connected(Address::repeat_byte(2), 0x38));
        assert_eq!(session.deposit_amount(), "4.2");

        session.update_wallet(WalletState::default());
        assert_eq!(session.deposit_amount(), DEFAULT_DEPOSIT_AMOUNT);
        assert_eq!(session.resolution(), NetworkResolution::Uninitialized);
    }

    #[test]
    fn test_reset_bumps_generation() {
        let session = session();
        session.update_wallet(WalletState::connected(Address::repeat_byte(1), 0x38));
        session.set_deposit_amount("3");
        let before = session.generation();

        session.reset();
        assert_eq!(session.generation(), before + 1);
        assert_eq!(session.wallet(), WalletState::default());
        assert_eq!(session.deposit_amount(), "1");
        assert!(session.snapshot().is_none());
        assert_eq!(session.phase(), Phase::Inactive);
    }
}
