use crate::error::Error;
use crate::protocols::presale::amount::NativeAmount;
use crate::protocols::presale::contract::PresaleContract;
use crate::protocols::presale::network::NetworkResolution;
use crate::protocols::presale::phase::Phase;
use crate::protocols::presale::types::{ActionOutcome, PresaleAction};
use alloy_primitives::Address;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// An action that passed every guard and is ready to submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparedAction {
    pub action: PresaleAction,
    pub account: Address,
    /// Deposit value; set only for `Buy`
    pub value: Option<NativeAmount>,
}

/// Turns the current phase into its single permitted contract call.
///
/// At most one submission is in flight per dispatcher.
#[derive(Debug, Default)]
pub struct ActionDispatcher {
    busy: AtomicBool,
}

impl ActionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a submission is currently in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run the guards for `phase` without touching the network.
    ///
    /// Returns `Ok(None)` when the phase permits no action. Otherwise checks,
    /// in order, the connected account, the network and (for a buy) the amount.
    pub fn prepare(
        &self,
        phase: Phase,
        account: Option<Address>,
        network: &NetworkResolution,
        amount: Option<&str>,
    ) -> Result<Option<PreparedAction>, Error> {
        let Some(action) = phase.permitted_action() else {
            debug!("Phase {} permits no action", phase);
            return Ok(None);
        };

        let account = account.ok_or(Error::WalletUnconnected)?;
        network.require_binding()?;

        let value = if action.requires_amount() {
            Some(parse_deposit(amount)?)
        } else {
            None
        };

        Ok(Some(PreparedAction {
            action,
            account,
            value,
        }))
    }

    /// Guard and submit the action permitted by `phase`.
    ///
    /// Success means the provider accepted the transaction; receipts are not
    /// awaited.
    pub async fn dispatch(
        &self,
        contract: &dyn PresaleContract,
        phase: Phase,
        account: Option<Address>,
        network: &NetworkResolution,
        amount: Option<&str>,
    ) -> Result<ActionOutcome, Error> {
        match self.prepare(phase, account, network, amount)? {
            Some(prepared) => self.submit(contract, prepared).await,
            None => Ok(ActionOutcome::NoOp),
        }
    }

    /// Submit an already guarded action
    pub async fn submit(
        &self,
        contract: &dyn PresaleContract,
        prepared: PreparedAction,
    ) -> Result<ActionOutcome, Error> {
        let action = prepared.action;
        let _busy = BusyGuard::acquire(&self.busy).ok_or(Error::ActionInFlight { action })?;

        info!(
            "Submitting {} for {}{}",
            action.method(),
            prepared.account,
            prepared
                .value
                .map(|v| format!(" with value {}", v))
                .unwrap_or_default()
        );

        let result = match (action, prepared.value) {
            (PresaleAction::Buy, Some(value)) => contract.user_deposit(value).await,
            (PresaleAction::Buy, None) => {
                return Err(Error::InvalidAmount("no deposit amount".to_string()))
            }
            (PresaleAction::Claim, _) => contract.user_withdraw_tokens().await,
            (PresaleAction::Withdraw, _) => contract.user_withdraw_base_tokens().await,
        };

        match result {
            Ok(tx_hash) => {
                info!("{} accepted: {}", action.method(), tx_hash);
                Ok(ActionOutcome::Submitted { action, tx_hash })
            }
            // Missing signer or chain keeps its guard message
            Err(e @ (Error::WalletUnconnected | Error::ChainUnrecognized { .. })) => {
                warn!("{} rejected: {}", action.method(), e);
                Err(e)
            }
            Err(e) => {
                warn!("{} failed: {}", action.method(), e);
                Err(Error::ActionFailure {
                    action,
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Parse the deposit input; it must be a positive native amount
pub fn parse_deposit(amount: Option<&str>) -> Result<NativeAmount, Error> {
    let input = amount.ok_or_else(|| Error::InvalidAmount("amount is missing".to_string()))?;
    let value = NativeAmount::parse(input)?;
    if value.is_zero() {
        return Err(Error::InvalidAmount(format!(
            "amount must be greater than zero: {}",
            input.trim()
        )));
    }
    Ok(value)
}

/// Holds the busy flag for the duration of one submission
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::networks::ConfiguredNetworks;
    use crate::protocols::presale::network::resolve_network;
    use alloy_primitives::U256;

    fn bnb() -> NetworkResolution {
        resolve_network(&ConfiguredNetworks::default(), Some(0x38))
    }

    #[test]
    fn test_parse_deposit() {
        assert_eq!(
            parse_deposit(Some("2.5")).unwrap().raw(),
            U256::from(2_500_000_000_000_000_000u128)
        );
        for bad in ["0", "0.0", "-1", "", "abc"] {
            assert!(matches!(
                parse_deposit(Some(bad)),
                Err(Error::InvalidAmount(_))
            ));
        }
        assert!(matches!(parse_deposit(None), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn test_prepare_guard_order() {
        let dispatcher = ActionDispatcher::new();
        let account = Some(Address::repeat_byte(0xaa));
        let unknown = resolve_network(&ConfiguredNetworks::default(), Some(97));

        // account is checked before the network and the amount
        assert!(matches!(
            dispatcher.prepare(Phase::Active, None, &unknown, Some("0")),
            Err(Error::WalletUnconnected)
        ));
        // network before amount
        assert!(matches!(
            dispatcher.prepare(Phase::Active, account, &unknown, Some("0")),
            Err(Error::ChainUnrecognized { chain_id: Some(97) })
        ));
        assert!(matches!(
            dispatcher.prepare(Phase::Active, account, &bnb(), Some("0")),
            Err(Error::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_prepare_ignores_amount_for_claim_and_withdraw() {
        let dispatcher = ActionDispatcher::new();
        let account = Some(Address::repeat_byte(0xaa));

        let claim = dispatcher
            .prepare(Phase::Successful, account, &bnb(), Some("not a number"))
            .unwrap()
            .unwrap();
        assert_eq!(claim.action, PresaleAction::Claim);
        assert!(claim.value.is_none());

        let withdraw = dispatcher
            .prepare(Phase::Failed, account, &bnb(), None)
            .unwrap()
            .unwrap();
        assert_eq!(withdraw.action, PresaleAction::Withdraw);
    }

    #[test]
    fn test_prepare_without_permitted_action() {
        let dispatcher = ActionDispatcher::new();
        let uninitialized = NetworkResolution::Uninitialized;
        for phase in [Phase::Inactive, Phase::Unrecognized(U256::from(9u8))] {
            assert_eq!(
                dispatcher
                    .prepare(phase, None, &uninitialized, Some("-3"))
                    .unwrap(),
                None
            );
        }
    }

    #[tokio::test]
    async fn test_unsigned_contract_reports_wallet_unconnected() {
        use crate::protocols::evm::{EvmClient, Presale};

        let dispatcher = ActionDispatcher::new();
        let client = EvmClient::new("http://127.0.0.1:1", 0x38).unwrap();
        let presale = Presale::new(client, Address::repeat_byte(0x01));
        let account = Some(Address::repeat_byte(0xaa));

        let err = dispatcher
            .dispatch(&presale, Phase::Active, account, &bnb(), Some("1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WalletUnconnected));
        assert_eq!(err.to_string(), "Wallet is unconnected");

        let err = dispatcher
            .dispatch(&presale, Phase::Successful, account, &bnb(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WalletUnconnected));
        assert!(!dispatcher.is_busy());
    }

    #[test]
    fn test_busy_guard_releases_on_drop() {
        let flag = AtomicBool::new(false);
        {
            let _guard = BusyGuard::acquire(&flag).unwrap();
            assert!(BusyGuard::acquire(&flag).is_none());
        }
        assert!(BusyGuard::acquire(&flag).is_some());
    }
}
