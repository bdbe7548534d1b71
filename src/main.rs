//! Wallet Ops - Solana and EVM wallet primitives from the command line
//!
//! Devnet and Sepolia only. Funding keys come from the environment:
//! `SOLANA_FUNDING_WALLET_PRIVATE_KEY` and `EVM_FUNDING_WALLET_PRIVATE_KEY`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::error;

// Use the library crate
use wallet_ops::cli::commands;
use wallet_ops::config::{Config, Secrets};
use wallet_ops::token::Chain;
use wallet_ops::WalletToolbox;

/// Wallet Ops - create, fund and transfer on Solana devnet and EVM testnets
#[derive(Parser)]
#[command(name = "wallet-ops")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "wallet-ops.toml")]
    config: String,

    /// Network: solana or evm
    #[arg(long, global = true, default_value = "solana")]
    chain: Chain,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new wallet
    CreateWallet,

    /// Request devnet SOL from the faucet
    Faucet {
        /// Address to fund
        address: String,

        /// Amount in SOL (default from config)
        #[arg(long)]
        amount: Option<Decimal>,
    },

    /// Create the associated token account for a wallet
    CreateTokenAccount {
        /// Token symbol: USDC, PYUSD, USDG
        token: String,

        /// Owner address
        owner: String,
    },

    /// Send tokens from the funding wallet (USDG limits apply)
    Transfer {
        /// Amount in human units, e.g. 0.1
        amount: Decimal,

        /// Token symbol
        token: String,

        /// Destination address
        #[arg(long)]
        to: String,
    },

    /// Create a wallet, send it tokens from the funding wallet, show its balance
    Onboard {
        /// Amount in human units, e.g. 0.1
        amount: Decimal,

        /// Token symbol
        #[arg(default_value = "USDG")]
        token: String,
    },

    /// Show a token balance
    Balance {
        /// Address to query
        address: String,

        /// Token symbol (default: the chain's native asset)
        token: Option<String>,
    },

    /// Check a USDG transfer against the limits without sending
    CheckLimit {
        /// Destination address
        destination: String,

        /// Amount in human units
        amount: Decimal,

        #[arg(long, default_value = "USDG")]
        token: String,
    },

    /// Show the funding wallet address
    FundingAddress,

    /// Show recent transaction signatures (Solana)
    Signatures {
        address: String,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// List supported tokens
    Tokens,

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wallet_ops=info".parse()?),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let toolbox = match WalletToolbox::from_config(&config, &Secrets::from_env()) {
        Ok(toolbox) => toolbox,
        Err(e) => {
            error!("Failed to initialize wallets: {}", e);
            std::process::exit(1);
        }
    };

    let chain = cli.chain;

    // Execute command
    let result = match cli.command {
        Commands::CreateWallet => commands::create_wallet(&toolbox, chain).await,
        Commands::Faucet { address, amount } => {
            commands::faucet(&toolbox, chain, &address, amount).await
        }
        Commands::CreateTokenAccount { token, owner } => {
            commands::create_token_account(&toolbox, chain, &owner, &token).await
        }
        Commands::Transfer { amount, token, to } => {
            commands::transfer(&toolbox, chain, &to, amount, &token).await
        }
        Commands::Onboard { amount, token } => {
            commands::onboard(&toolbox, chain, amount, &token).await
        }
        Commands::Balance { address, token } => {
            commands::balance(&toolbox, chain, &address, token.as_deref()).await
        }
        Commands::CheckLimit {
            destination,
            amount,
            token,
        } => commands::check_limit(&toolbox, chain, &destination, amount, &token).await,
        Commands::FundingAddress => commands::funding_address(&toolbox, chain),
        Commands::Signatures { address, limit } => {
            commands::signatures(&toolbox, chain, &address, limit).await
        }
        Commands::Tokens => commands::tokens(chain),
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
