//! Last-created wallet per chain
//!
//! One slot per chain, holding only the public address. Each `record`
//! overwrites the slot; there is no history and no expiry. An instance is
//! owned by a session (usually a `WalletToolbox`) rather than being global.

use dashmap::DashMap;
use tracing::debug;

use crate::token::Chain;

#[derive(Debug, Default)]
pub struct WalletTracker {
    slots: DashMap<Chain, String>,
}

impl WalletTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot for `chain`
    pub fn record(&self, chain: Chain, address: impl Into<String>) {
        let address = address.into();
        debug!("Last {} wallet is now {}", chain, address);
        self.slots.insert(chain, address);
    }

    pub fn last_created(&self, chain: Chain) -> Option<String> {
        self.slots.get(&chain).map(|entry| entry.value().clone())
    }

    pub fn clear(&self) {
        self.slots.clear();
    }
}
