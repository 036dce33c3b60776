/// Presale Protocol Module
/// Chain resolution, contract reads, phase derivation and action dispatch
/// for a phased native-currency presale deployed on two networks

pub mod amount;
pub mod contract;
pub mod dispatcher;
pub mod network;
pub mod phase;
pub mod reader;
pub mod session;
pub mod types;
pub mod view;

pub use amount::{format_units, parse_units, NativeAmount, TokenAmount, NATIVE_DECIMALS};
pub use contract::{PresaleConnector, PresaleContract};
pub use dispatcher::{parse_deposit, ActionDispatcher, PreparedAction};
pub use network::{resolve_network, ChainIndex, NetworkBinding, NetworkResolution};
pub use phase::{derive_phase, Phase, PhaseDescriptor, Tone, PHASE_TABLE};
pub use reader::{read_all, PresaleSnapshot, SALE_SUPPLY_PERCENT};
pub use session::{PresaleSession, ReadOutcome, ReadTicket, WalletState, DEFAULT_DEPOSIT_AMOUNT};
pub use types::{
    ActionOutcome, BuyerStatus, PresaleAction, RawBuyerInfo, RawPresaleInfo, RawSaleStatus,
    RawTokenInfo, ReadCall, ReadFailure, SaleStatus, SaleTerms, TokenInfo,
};
pub use view::{format_deadline, DisplayRow, DisplaySection, PhaseView, PresaleView};
