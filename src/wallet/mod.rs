//! Chain-agnostic wallet primitives
//!
//! Each chain implements [`WalletOps`]; the USDG limiter and the toolbox only
//! ever see this trait.
//!
//! ```text
//! WalletToolbox → policy::decide → WalletOps ─┬─ SolanaWallet → SolanaRpc
//!                                             └─ EvmWallet    → EvmRpc
//! ```
//!
//! Every operation is attempted exactly once. Approval from the limiter is
//! advisory; `transfer_token` never checks limits itself.

pub mod tracker;
pub mod types;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::token::Chain;

pub use tracker::WalletTracker;
pub use types::{Balance, NewWallet};

#[async_trait]
pub trait WalletOps: Send + Sync {
    fn chain(&self) -> Chain;

    /// Generate a keypair and record its address as this chain's last wallet
    async fn create_wallet(&self) -> Result<NewWallet>;

    /// Request test-network native funds. `Ok(false)` when the faucet refuses.
    async fn fund_from_faucet(&self, address: &str, amount: Option<Decimal>) -> Result<bool>;

    /// Create the account that lets `owner` hold `token`, returning the
    /// submission signature
    async fn create_associated_account(&self, owner: &str, token: &str) -> Result<String>;

    /// Move `amount` (human units) of `token` from the funding wallet to
    /// `destination`, returning the signature or transaction hash
    async fn transfer_token(&self, destination: &str, amount: Decimal, token: &str)
        -> Result<String>;

    /// Raw base-unit balance; a missing token account reads as zero
    async fn get_balance(&self, address: &str, token: &str) -> Result<u128>;

    fn last_created_wallet(&self) -> Option<String>;

    /// Public address of the configured funding wallet
    fn funding_address(&self) -> Result<String>;
}
