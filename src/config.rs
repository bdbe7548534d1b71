//! Configuration loading and validation

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Environment variable holding the Solana funding keypair (base58)
pub const SOLANA_FUNDING_KEY_ENV: &str = "SOLANA_FUNDING_WALLET_PRIVATE_KEY";
/// Environment variable holding the EVM funding key (hex)
pub const EVM_FUNDING_KEY_ENV: &str = "EVM_FUNDING_WALLET_PRIVATE_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub solana: SolanaConfig,
    pub evm: EvmConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolanaConfig {
    #[serde(default = "default_solana_rpc_url")]
    pub rpc_url: String,
    /// Cluster name; the faucet only works on "devnet"
    #[serde(default = "default_network")]
    pub network: String,
    /// Wait after submitting an associated account creation
    #[serde(default = "default_ata_settle_ms")]
    pub ata_settle_ms: u64,
    /// Airdrop size when the caller gives none, in SOL
    #[serde(default = "default_faucet_sol")]
    pub faucet_default_sol: Decimal,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl SolanaConfig {
    pub fn is_devnet(&self) -> bool {
        self.network.eq_ignore_ascii_case("devnet")
    }
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_solana_rpc_url(),
            network: default_network(),
            ata_settle_ms: default_ata_settle_ms(),
            faucet_default_sol: default_faucet_sol(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvmConfig {
    #[serde(default = "default_evm_rpc_url")]
    pub rpc_url: String,
    /// Wait after fetching the nonce, before building
    #[serde(default = "default_nonce_delay_ms")]
    pub nonce_delay_ms: u64,
    #[serde(default = "default_native_gas_limit")]
    pub native_gas_limit: u64,
    #[serde(default = "default_token_gas_limit")]
    pub token_gas_limit: u64,
    /// Added on top of the node's gas price for token transfers
    #[serde(default = "default_gas_price_margin_pct")]
    pub gas_price_margin_pct: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for EvmConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_evm_rpc_url(),
            nonce_delay_ms: default_nonce_delay_ms(),
            native_gas_limit: default_native_gas_limit(),
            token_gas_limit: default_token_gas_limit(),
            gas_price_margin_pct: default_gas_price_margin_pct(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

// Default value functions
fn default_solana_rpc_url() -> String {
    std::env::var("SOLANA_RPC_URL").unwrap_or_else(|_| "https://api.devnet.solana.com".into())
}

fn default_evm_rpc_url() -> String {
    std::env::var("ETH_RPC_URL")
        .unwrap_or_else(|_| "https://ethereum-sepolia-rpc.publicnode.com".into())
}

fn default_network() -> String {
    "devnet".into()
}

fn default_ata_settle_ms() -> u64 {
    5000
}

fn default_faucet_sol() -> Decimal {
    Decimal::new(5, 2)
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_nonce_delay_ms() -> u64 {
    1000
}

fn default_native_gas_limit() -> u64 {
    21_000
}

fn default_token_gas_limit() -> u64 {
    100_000
}

fn default_gas_price_margin_pct() -> u64 {
    10
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("solana.rpc_url", default_solana_rpc_url())?
            .set_default("solana.network", default_network())?
            .set_default("solana.ata_settle_ms", default_ata_settle_ms() as i64)?
            .set_default("solana.faucet_default_sol", default_faucet_sol().to_string())?
            .set_default("solana.timeout_ms", default_timeout_ms() as i64)?
            .set_default("evm.rpc_url", default_evm_rpc_url())?
            .set_default("evm.nonce_delay_ms", default_nonce_delay_ms() as i64)?
            .set_default("evm.native_gas_limit", default_native_gas_limit() as i64)?
            .set_default("evm.token_gas_limit", default_token_gas_limit() as i64)?
            .set_default("evm.gas_price_margin_pct", default_gas_price_margin_pct() as i64)?
            .set_default("evm.timeout_ms", default_timeout_ms() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix WALLET_OPS_)
            .add_source(
                config::Environment::with_prefix("WALLET_OPS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.solana.rpc_url.trim().is_empty() {
            anyhow::bail!("solana.rpc_url cannot be empty");
        }

        if self.evm.rpc_url.trim().is_empty() {
            anyhow::bail!("evm.rpc_url cannot be empty");
        }

        if self.solana.faucet_default_sol <= Decimal::ZERO {
            anyhow::bail!("faucet_default_sol must be positive");
        }

        if self.solana.timeout_ms == 0 || self.evm.timeout_ms == 0 {
            anyhow::bail!("timeout_ms must be positive");
        }

        if self.evm.gas_price_margin_pct > 100 {
            anyhow::bail!("gas_price_margin_pct cannot exceed 100");
        }

        if self.evm.native_gas_limit == 0 || self.evm.token_gas_limit == 0 {
            anyhow::bail!("gas limits must be positive");
        }

        if !self.solana.is_devnet() {
            tracing::warn!(
                "Solana network is '{}' - the faucet will be unavailable",
                self.solana.network
            );
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Solana:
    rpc_url: {}
    network: {}
    ata_settle: {}ms
    faucet_default: {} SOL
    timeout: {}ms
  EVM:
    rpc_url: {}
    nonce_delay: {}ms
    gas_limits: native {} / token {}
    gas_price_margin: {}%
    timeout: {}ms
"#,
            mask_url(&self.solana.rpc_url),
            self.solana.network,
            self.solana.ata_settle_ms,
            self.solana.faucet_default_sol,
            self.solana.timeout_ms,
            mask_url(&self.evm.rpc_url),
            self.evm.nonce_delay_ms,
            self.evm.native_gas_limit,
            self.evm.token_gas_limit,
            self.evm.gas_price_margin_pct,
            self.evm.timeout_ms,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            solana: SolanaConfig::default(),
            evm: EvmConfig::default(),
        }
    }
}

/// Funding wallet key material, read from the environment only
#[derive(Clone, Default)]
pub struct Secrets {
    pub solana_funding_key: Option<String>,
    pub evm_funding_key: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            solana_funding_key: non_empty_env(SOLANA_FUNDING_KEY_ENV),
            evm_funding_key: non_empty_env(EVM_FUNDING_KEY_ENV),
        }
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "***" } else { "(not set)" };
        f.debug_struct("Secrets")
            .field("solana_funding_key", &mask(&self.solana_funding_key))
            .field("evm_funding_key", &mask(&self.evm_funding_key))
            .finish()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}
