/// Protocol modules for the presale SDK
/// `presale` holds the participation state machine; `evm` talks to the chain
pub mod evm;
pub mod presale;
