//! Presale SDK Client
//!
//! Main entry point: owns the configuration, the optional signer and the
//! participation session, and connects to the bound deployment on demand.

use crate::config::PresaleConfig;
use crate::error::Error;
use crate::protocols::evm::client::EvmClient;
use crate::protocols::evm::contracts::EvmPresaleConnector;
use crate::protocols::presale::{
    ActionOutcome, NetworkResolution, Phase, PresaleAction, PresaleConnector, PresaleSession,
    PresaleView, ReadOutcome, WalletState,
};
use crate::wallet::EvmWallet;
use alloy_primitives::Address;
use std::sync::Arc;
use tracing::{debug, info};

/// Main presale client
pub struct PresaleClient {
    /// Resolved configuration
    config: PresaleConfig,

    /// Optional wallet for signing transactions
    wallet: Option<Arc<EvmWallet>>,

    /// Account to read for when no wallet is loaded
    watch_account: Option<Address>,

    /// Participation state for the connected wallet
    session: PresaleSession,

    /// Produces contract handles for the bound network
    connector: Arc<dyn PresaleConnector>,
}

impl PresaleClient {
    pub fn config(&self) -> &PresaleConfig {
        &self.config
    }

    pub fn wallet(&self) -> Option<&Arc<EvmWallet>> {
        self.wallet.as_ref()
    }

    pub fn session(&self) -> &PresaleSession {
        &self.session
    }

    /// Account the session reads and acts for
    pub fn account(&self) -> Option<Address> {
        self.wallet
            .as_ref()
            .map(|w| w.address())
            .or(self.watch_account)
    }

    /// Bind the session to `chain_id` as reported by the wallet provider
    pub fn connect_chain(&self, chain_id: Option<u64>) -> NetworkResolution {
        let account = self.account();
        self.session.update_wallet(WalletState { account, chain_id })
    }

    /// Ask `rpc_url` for its chain id and bind the session to it
    pub async fn connect_rpc(&self, rpc_url: &str) -> Result<NetworkResolution, Error> {
        let chain_id = EvmClient::connect(rpc_url).await?.chain_id();
        debug!("{} reports chain id {}", rpc_url, chain_id);
        Ok(self.connect_chain(Some(chain_id)))
    }

    /// Endpoint of the first configured network with a presale deployment
    pub fn default_rpc_url(&self) -> Option<&str> {
        self.config
            .networks
            .iter()
            .find(|(_, network)| network.presale_address.is_some())
            .map(|(_, network)| network.rpc_url.as_str())
    }

    /// Forget the wallet binding and the last snapshot
    pub fn disconnect(&self) {
        self.session.reset();
    }

    /// Run one info cycle for the bound network
    pub async fn refresh(&self) -> Result<ReadOutcome, Error> {
        self.session.refresh(self.connector.as_ref()).await
    }

    /// Display model of the latest snapshot
    pub fn view(&self) -> Option<PresaleView> {
        self.session
            .snapshot()
            .map(|snapshot| PresaleView::from_snapshot(&snapshot))
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    /// Dispatch whatever the current phase permits
    pub async fn dispatch(&self) -> Result<ActionOutcome, Error> {
        self.session.dispatch(self.connector.as_ref()).await
    }

    /// Deposit `amount` of native currency while the sale is active
    pub async fn buy(&self, amount: &str) -> Result<ActionOutcome, Error> {
        self.session.set_deposit_amount(amount);
        self.perform(PresaleAction::Buy).await
    }

    /// Claim allocated tokens after a successful sale
    pub async fn claim(&self) -> Result<ActionOutcome, Error> {
        self.perform(PresaleAction::Claim).await
    }

    /// Withdraw the deposit after a failed sale
    pub async fn withdraw(&self) -> Result<ActionOutcome, Error> {
        self.perform(PresaleAction::Withdraw).await
    }

    async fn perform(&self, action: PresaleAction) -> Result<ActionOutcome, Error> {
        let phase = self.session.phase();
        if phase.permitted_action() != Some(action) {
            return Err(Error::ActionUnavailable { action, phase });
        }
        let outcome = self.dispatch().await?;
        if let Some(message) = outcome.message() {
            info!("{}", message);
        }
        Ok(outcome)
    }
}

/// Builder for creating PresaleClient instances
#[derive(Default)]
pub struct PresaleClientBuilder {
    config: Option<PresaleConfig>,
    wallet: Option<Arc<EvmWallet>>,
    watch_account: Option<Address>,
    connector: Option<Arc<dyn PresaleConnector>>,
}

impl PresaleClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration
    pub fn with_config(mut self, config: PresaleConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the wallet
    pub fn with_wallet(mut self, wallet: Arc<EvmWallet>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Read presale data for `account` without a signer
    pub fn with_account(mut self, account: Address) -> Self {
        self.watch_account = Some(account);
        self
    }

    /// Replace the JSON-RPC connector, e.g. with an in-memory contract
    pub fn with_connector(mut self, connector: Arc<dyn PresaleConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Build with the given configuration, or the built-in defaults
    pub fn build(self) -> Result<PresaleClient, Error> {
        let config = self.config.unwrap_or_default();
        config.networks.validate()?;

        let connector = match self.connector {
            Some(connector) => connector,
            None => {
                let mut connector =
                    EvmPresaleConnector::new().with_gas_buffer(config.gas_buffer_percent);
                if let Some(wallet) = &self.wallet {
                    connector = connector.with_signer(wallet.clone());
                }
                Arc::new(connector)
            }
        };

        Ok(PresaleClient {
            session: PresaleSession::new(config.networks.clone()),
            config,
            wallet: self.wallet,
            watch_account: self.watch_account,
            connector,
        })
    }

    /// Build with configuration loaded from files and the environment
    pub fn build_auto(mut self) -> Result<PresaleClient, Error> {
        if self.config.is_none() {
            self.config = Some(PresaleConfig::load()?);
        }
        self.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_chain_without_wallet() {
        let client = PresaleClientBuilder::new().build().unwrap();
        let resolution = client.connect_chain(Some(0x38));
        assert!(resolution.is_recognized());
        assert_eq!(client.session().wallet().account, None);

        let watched = PresaleClientBuilder::new()
            .with_account(Address::repeat_byte(0x11))
            .build()
            .unwrap();
        watched.connect_chain(Some(0x3));
        assert_eq!(
            watched.session().wallet().account,
            Some(Address::repeat_byte(0x11))
        );
        assert_eq!(
            client.default_rpc_url(),
            Some("https://bsc-dataseed.binance.org")
        );
    }

    #[tokio::test]
    async fn test_actions_require_matching_phase() {
        let client = PresaleClientBuilder::new().build().unwrap();
        client.connect_chain(Some(0x38));

        let err = client.claim().await.unwrap_err();
        assert!(err.to_string().contains("Sale is not Active"));
    }
}
