//! Tool surface for an external orchestrator
//!
//! One `WalletToolbox` per session. It owns the last-wallet tracker shared by
//! both chains and composes the primitives the way callers are expected to:
//! USDG goes through the limiter first, and Solana token transfers create the
//! destination's associated account before sending.

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{Config, Secrets};
use crate::error::{Error, Result};
use crate::evm::EvmWallet;
use crate::policy::{decide, RejectionReason, TransferDecision};
use crate::solana::{SignatureRecord, SolanaWallet};
use crate::token::{from_base_units, is_rate_limited, lookup, Chain};
use crate::wallet::{Balance, NewWallet, WalletOps, WalletTracker};

/// Result of a guarded send
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SendOutcome {
    Sent {
        /// Signature or hash of the transfer itself
        signature: String,
        /// Signature of the associated account creation, Solana tokens only
        account_signature: Option<String>,
    },
    /// Refused by the USDG limiter; nothing was submitted
    Rejected(RejectionReason),
}

/// Steps taken by [`WalletToolbox::onboard_wallet`]
#[derive(Debug, Clone)]
pub struct OnboardReport {
    pub wallet: NewWallet,
    pub outcome: SendOutcome,
    /// Balance of the new wallet after the send
    pub balance: Balance,
}

pub struct WalletToolbox {
    solana: SolanaWallet,
    evm: EvmWallet,
    tracker: Arc<WalletTracker>,
}

impl WalletToolbox {
    pub fn new(solana: SolanaWallet, evm: EvmWallet, tracker: Arc<WalletTracker>) -> Self {
        Self {
            solana,
            evm,
            tracker,
        }
    }

    /// Both chains over HTTP, sharing one tracker
    pub fn from_config(config: &Config, secrets: &Secrets) -> Result<Self> {
        let tracker = Arc::new(WalletTracker::new());
        let solana = SolanaWallet::from_config(&config.solana, secrets, tracker.clone())?;
        let evm = EvmWallet::from_config(&config.evm, secrets, tracker.clone())?;
        Ok(Self::new(solana, evm, tracker))
    }

    pub fn wallet(&self, chain: Chain) -> &dyn WalletOps {
        match chain {
            Chain::Solana => &self.solana,
            Chain::Evm => &self.evm,
        }
    }

    pub fn solana(&self) -> &SolanaWallet {
        &self.solana
    }

    pub async fn create_wallet(&self, chain: Chain) -> Result<NewWallet> {
        self.wallet(chain).create_wallet().await
    }

    pub fn last_created_wallet(&self, chain: Chain) -> Option<String> {
        self.tracker.last_created(chain)
    }

    pub async fn balance(&self, chain: Chain, address: &str, token: &str) -> Result<Balance> {
        let info = lookup(chain, token)?;
        let base_units = self.wallet(chain).get_balance(address, info.symbol).await?;

        Ok(Balance {
            symbol: info.symbol,
            base_units,
            amount: from_base_units(info, base_units)?,
        })
    }

    /// Balance of the most recently created wallet on `chain`
    pub async fn last_wallet_balance(&self, chain: Chain, token: &str) -> Result<Balance> {
        let address = self.last_created_wallet(chain).ok_or_else(|| {
            Error::UnsupportedOperation(format!("No {} wallet has been created yet", chain))
        })?;
        self.balance(chain, &address, token).await
    }

    pub async fn fund_from_faucet(
        &self,
        chain: Chain,
        address: &str,
        amount: Option<Decimal>,
    ) -> Result<bool> {
        self.wallet(chain).fund_from_faucet(address, amount).await
    }

    pub async fn create_token_account(
        &self,
        chain: Chain,
        owner: &str,
        token: &str,
    ) -> Result<String> {
        self.wallet(chain).create_associated_account(owner, token).await
    }

    /// Run the USDG limiter without sending anything
    pub async fn check_transfer(
        &self,
        chain: Chain,
        destination: &str,
        token: &str,
        amount: Decimal,
    ) -> Result<TransferDecision> {
        decide(self.wallet(chain), destination, token, amount).await
    }

    /// Limiter, then associated account (Solana tokens), then the transfer
    pub async fn send_token(
        &self,
        chain: Chain,
        destination: &str,
        amount: Decimal,
        token: &str,
    ) -> Result<SendOutcome> {
        let info = lookup(chain, token)?;
        let wallet = self.wallet(chain);

        if is_rate_limited(info.token) {
            if let TransferDecision::Rejected(reason) =
                decide(wallet, destination, info.symbol, amount).await?
            {
                warn!("Not sending {} {}: {}", amount, info.symbol, reason);
                return Ok(SendOutcome::Rejected(reason));
            }
        }

        let account_signature = if chain == Chain::Solana && !info.token.is_native() {
            Some(wallet.create_associated_account(destination, info.symbol).await?)
        } else {
            None
        };

        let signature = wallet.transfer_token(destination, amount, info.symbol).await?;
        info!("Guarded send of {} {} complete", amount, info.symbol);

        Ok(SendOutcome::Sent {
            signature,
            account_signature,
        })
    }

    /// Create a wallet, send it `amount` of `token`, then read its balance
    ///
    /// Every step after the first resolves the wallet through the
    /// last-created slot, so this only works within one toolbox.
    pub async fn onboard_wallet(
        &self,
        chain: Chain,
        amount: Decimal,
        token: &str,
    ) -> Result<OnboardReport> {
        lookup(chain, token)?;
        let wallet = self.create_wallet(chain).await?;

        let address = self.last_created_wallet(chain).ok_or_else(|| {
            Error::UnsupportedOperation(format!("No {} wallet has been created yet", chain))
        })?;
        let outcome = self.send_token(chain, &address, amount, token).await?;
        let balance = self.last_wallet_balance(chain, token).await?;

        Ok(OnboardReport {
            wallet,
            outcome,
            balance,
        })
    }

    pub fn funding_address(&self, chain: Chain) -> Result<String> {
        self.wallet(chain).funding_address()
    }

    /// Signature history; Solana only
    pub async fn recent_signatures(
        &self,
        chain: Chain,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>> {
        if chain != Chain::Solana {
            return Err(Error::UnsupportedOperation(format!(
                "Signature history is not available on {}",
                chain
            )));
        }
        self.solana.recent_signatures(address, limit).await
    }
}
