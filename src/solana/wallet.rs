//! Solana wallet primitives
//!
//! Every operation that spends is paid and signed by the configured funding
//! keypair. Flow for anything that touches the chain:
//!
//! ```text
//! build instruction → latest blockhash → sign → sendTransaction
//! ```
//!
//! A blockhash failure is a build error, a send failure is a submission error.

use async_trait::async_trait;
use rust_decimal::Decimal;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::address::{
    associated_token_program_id, derive_associated_address, mint_of, parse_pubkey,
    token_program_of,
};
use super::instruction::{self, serialize_transaction, sign_transaction};
use super::rpc::{SignatureRecord, SolanaRpc, SolanaRpcClient};
use crate::config::{Secrets, SolanaConfig, SOLANA_FUNDING_KEY_ENV};
use crate::error::{Error, Result};
use crate::token::{lookup, to_base_units_u64, token_info, Chain, Token, TokenInfo};
use crate::wallet::{NewWallet, WalletOps, WalletTracker};

/// Parse a keypair from base58 or a JSON byte array (solana-keygen format)
pub fn parse_keypair(encoded: &str) -> Result<Keypair> {
    let encoded = encoded.trim();

    let bytes: Vec<u8> = if encoded.starts_with('[') {
        serde_json::from_str(encoded)
            .map_err(|e| Error::Config(format!("Invalid keypair byte array: {}", e)))?
    } else {
        bs58::decode(encoded)
            .into_vec()
            .map_err(|e| Error::Config(format!("Invalid base58 keypair: {}", e)))?
    };

    Keypair::from_bytes(&bytes).map_err(|e| Error::Config(format!("Invalid keypair: {}", e)))
}

pub struct SolanaWallet {
    rpc: Arc<dyn SolanaRpc>,
    funding: Option<Keypair>,
    tracker: Arc<WalletTracker>,
    config: SolanaConfig,
}

impl SolanaWallet {
    pub fn new(
        rpc: Arc<dyn SolanaRpc>,
        funding: Option<Keypair>,
        tracker: Arc<WalletTracker>,
        config: SolanaConfig,
    ) -> Self {
        Self {
            rpc,
            funding,
            tracker,
            config,
        }
    }

    /// Wallet backed by the HTTP client and the funding key from `secrets`
    pub fn from_config(
        config: &SolanaConfig,
        secrets: &Secrets,
        tracker: Arc<WalletTracker>,
    ) -> Result<Self> {
        let rpc = SolanaRpcClient::new(&config.rpc_url, Duration::from_millis(config.timeout_ms))?;
        let funding = secrets
            .solana_funding_key
            .as_deref()
            .map(parse_keypair)
            .transpose()?;

        Ok(Self::new(Arc::new(rpc), funding, tracker, config.clone()))
    }

    fn funding_keypair(&self) -> Result<&Keypair> {
        self.funding.as_ref().ok_or_else(|| {
            Error::InsufficientConfiguration(format!("{} is not set", SOLANA_FUNDING_KEY_ENV))
        })
    }

    fn token(&self, symbol: &str) -> Result<&'static TokenInfo> {
        lookup(Chain::Solana, symbol)
    }

    /// Blockhash, sign with the funding key, submit
    async fn submit(&self, instructions: &[Instruction]) -> Result<String> {
        let payer = self.funding_keypair()?;

        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| Error::TransactionBuild(format!("Failed to get blockhash: {}", e)))?;

        let transaction = sign_transaction(instructions, payer, blockhash)?;
        let wire = serialize_transaction(&transaction)?;

        debug!(
            "Submitting transaction with {} instruction(s), {} bytes",
            instructions.len(),
            wire.len()
        );

        self.rpc
            .send_transaction(&wire)
            .await
            .map_err(|e| Error::Submission(e.to_string()))
    }

    /// Native SOL transfer from the funding wallet
    pub async fn transfer_sol(&self, destination: &str, amount: Decimal) -> Result<String> {
        let payer = self.funding_keypair()?;
        let to = parse_pubkey(destination)?;
        let lamports = to_base_units_u64(token_info(Chain::Solana, Token::Native), amount)?;

        let ix = instruction::native_transfer(&payer.pubkey(), &to, lamports);
        let signature = self.submit(&[ix]).await?;

        info!("Sent {} SOL to {} (sig: {})", amount, to, signature);
        Ok(signature)
    }

    /// Recent transaction signatures touching `address`
    pub async fn recent_signatures(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>> {
        let address = parse_pubkey(address)?;
        self.rpc.get_signatures_for_address(&address, limit).await
    }

    /// Whether the associated account of `owner` for `token` exists on-chain
    pub async fn associated_account_exists(&self, owner: &str, token: &str) -> Result<bool> {
        let info = self.token(token)?;
        let account = derive_associated_address(&parse_pubkey(owner)?, info)?;
        Ok(self.rpc.get_account_info(&account).await?.is_some())
    }

    /// All token accounts `owner` holds for `token`
    pub async fn token_accounts(&self, owner: &str, token: &str) -> Result<Vec<String>> {
        let info = self.token(token)?;
        let owner = parse_pubkey(owner)?;
        self.rpc
            .get_token_accounts_by_owner(&owner, &mint_of(info)?)
            .await
    }

    /// Associated account address without touching the chain
    pub fn associated_address(&self, owner: &str, token: &str) -> Result<String> {
        let info = self.token(token)?;
        Ok(derive_associated_address(&parse_pubkey(owner)?, info)?.to_string())
    }
}

#[async_trait]
impl WalletOps for SolanaWallet {
    fn chain(&self) -> Chain {
        Chain::Solana
    }

    async fn create_wallet(&self) -> Result<NewWallet> {
        let keypair = Keypair::new();
        let address = keypair.pubkey().to_string();

        self.tracker.record(Chain::Solana, address.clone());
        info!("Created Solana wallet {}", address);

        Ok(NewWallet {
            chain: Chain::Solana,
            address,
            private_key: keypair.to_base58_string(),
        })
    }

    async fn fund_from_faucet(&self, address: &str, amount: Option<Decimal>) -> Result<bool> {
        if !self.config.is_devnet() {
            return Err(Error::InsufficientConfiguration(format!(
                "Faucet is only available on devnet, configured network is {}",
                self.config.network
            )));
        }

        let to = match parse_pubkey(address) {
            Ok(to) => to,
            Err(e) => {
                warn!("Faucet request not sent: {}", e);
                return Ok(false);
            }
        };
        let amount = amount.unwrap_or(self.config.faucet_default_sol);
        let lamports = to_base_units_u64(token_info(Chain::Solana, Token::Native), amount)?;

        match self.rpc.request_airdrop(&to, lamports).await {
            Ok(signature) => {
                info!("Airdropped {} SOL to {} (sig: {})", amount, to, signature);
                Ok(true)
            }
            Err(e) => {
                warn!("Faucet refused {} SOL for {}: {}", amount, to, e);
                Ok(false)
            }
        }
    }

    async fn create_associated_account(&self, owner: &str, token: &str) -> Result<String> {
        let info = self.token(token)?;
        if info.token.is_native() {
            return Err(Error::UnsupportedOperation(
                "SOL is held directly by the wallet, no token account needed".to_string(),
            ));
        }

        let payer = self.funding_keypair()?;
        let owner = parse_pubkey(owner)?;
        let mint = mint_of(info)?;
        let token_program = token_program_of(info)?;
        let account = derive_associated_address(&owner, info)?;

        let ix = instruction::create_associated_account(
            &associated_token_program_id()?,
            &payer.pubkey(),
            &account,
            &owner,
            &mint,
            &token_program,
        );

        let signature = self.submit(&[ix]).await?;
        info!(
            "Created {} account {} for {} (sig: {})",
            info.symbol, account, owner, signature
        );

        // Give the account time to land before anything transfers into it
        tokio::time::sleep(Duration::from_millis(self.config.ata_settle_ms)).await;

        Ok(signature)
    }

    async fn transfer_token(
        &self,
        destination: &str,
        amount: Decimal,
        token: &str,
    ) -> Result<String> {
        let info = self.token(token)?;
        if info.token.is_native() {
            return self.transfer_sol(destination, amount).await;
        }

        let payer = self.funding_keypair()?;
        let owner = payer.pubkey();
        let destination = parse_pubkey(destination)?;

        let mint = mint_of(info)?;
        let token_program = token_program_of(info)?;
        let source = derive_associated_address(&owner, info)?;
        let target = derive_associated_address(&destination, info)?;

        let units = to_base_units_u64(info, amount)?;
        let decimals = u8::try_from(info.decimals)
            .map_err(|_| Error::TransactionBuild(format!("{} decimals out of range", info.symbol)))?;

        let ix = instruction::transfer_checked(
            &token_program,
            &source,
            &mint,
            &target,
            &owner,
            units,
            decimals,
        );

        let signature = self.submit(&[ix]).await?;
        info!(
            "Sent {} {} to {} (sig: {})",
            amount, info.symbol, destination, signature
        );
        Ok(signature)
    }

    async fn get_balance(&self, address: &str, token: &str) -> Result<u128> {
        let info = self.token(token)?;
        let owner = parse_pubkey(address)?;

        if info.token.is_native() {
            return Ok(self.rpc.get_balance(&owner).await? as u128);
        }

        let account = derive_associated_address(&owner, info)?;
        Ok(self.rpc.get_token_account_balance(&account).await? as u128)
    }

    fn last_created_wallet(&self) -> Option<String> {
        self.tracker.last_created(Chain::Solana)
    }

    fn funding_address(&self) -> Result<String> {
        Ok(self.funding_keypair()?.pubkey().to_string())
    }
}
