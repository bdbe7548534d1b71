//! Core types for wallet operations

use serde::Serialize;
use std::fmt;

use crate::token::Chain;

/// Freshly generated wallet
///
/// The private key is handed to the caller exactly once; nothing in this crate
/// keeps a copy. `Debug` masks it so it never lands in a log line.
#[derive(Clone, Serialize)]
pub struct NewWallet {
    pub chain: Chain,

    /// Chain-native public address (base58 on Solana, EIP-55 hex on EVM)
    pub address: String,

    /// Base58 64-byte keypair on Solana, `0x`-prefixed hex on EVM
    pub private_key: String,
}

impl fmt::Debug for NewWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewWallet")
            .field("chain", &self.chain)
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Balance in both raw and human units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balance {
    pub symbol: &'static str,
    pub base_units: u128,
    pub amount: rust_decimal::Decimal,
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.symbol)
    }
}
