//! EVM network primitives (Sepolia by default)

pub mod rpc;
pub mod transaction;
pub mod wallet;

pub use rpc::{EvmRpc, EvmRpcClient};
pub use transaction::TxParams;
pub use wallet::{parse_address, EvmWallet};
