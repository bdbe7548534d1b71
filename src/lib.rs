//! Wallet Ops Library
//!
//! Solana and EVM wallet primitives with the USDG transfer limiter.

pub mod cli;
pub mod config;
pub mod error;
pub mod evm;
pub mod policy;
pub mod solana;
pub mod token;
pub mod tools;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use tools::{SendOutcome, WalletToolbox};
