//! Solana network primitives
//!
//! - `address`: associated token account derivation
//! - `instruction`: instruction encoding and signing
//! - `rpc`: JSON-RPC client
//! - `wallet`: the [`WalletOps`](crate::wallet::WalletOps) implementation

pub mod address;
pub mod instruction;
pub mod rpc;
pub mod wallet;

pub use address::{derive_associated_address, parse_pubkey};
pub use rpc::{AccountSummary, SignatureRecord, SolanaRpc, SolanaRpcClient};
pub use wallet::{parse_keypair, SolanaWallet};
