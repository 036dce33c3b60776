/// EVM contract interfaces
///
/// Type-safe bindings generated with the Alloy `sol!` macro.
pub mod presale;

pub use presale::{EvmPresaleConnector, IPresale, Presale};
