use thiserror::Error;

use crate::protocols::presale::phase::Phase;
use crate::protocols::presale::types::PresaleAction;

/// Errors surfaced by the presale SDK.
///
/// The `Display` string of every variant is the message shown to the user;
/// none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Wallet is unconnected")]
    WalletUnconnected,

    #[error("Selected chain is unrecognized")]
    ChainUnrecognized { chain_id: Option<u64> },

    #[error("{}", .action.failure_message())]
    ActionFailure { action: PresaleAction, reason: String },

    #[error("Please enter a valid amount")]
    InvalidAmount(String),

    #[error("{action} is not available: {}", .phase.label())]
    ActionUnavailable { action: PresaleAction, phase: Phase },

    #[error("{action} is already in progress")]
    ActionInFlight { action: PresaleAction },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("EVM error: {0}")]
    Evm(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Unit conversion error: {0}")]
    Units(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Underlying cause for action failures, for logs rather than users.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Error::ActionFailure { reason, .. } => Some(reason.as_str()),
            Error::InvalidAmount(reason) => Some(reason.as_str()),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(format!("Failed to serialize config: {}", err))
    }
}
