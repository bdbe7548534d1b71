//! CLI command implementations

use anyhow::Result;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::Config;
use crate::token::{lookup, supported_symbols, token_info, Chain, Token};
use crate::tools::{SendOutcome, WalletToolbox};

/// Generate a keypair and print it once
pub async fn create_wallet(toolbox: &WalletToolbox, chain: Chain) -> Result<()> {
    let wallet = toolbox.create_wallet(chain).await?;

    println!("\n=== NEW {} WALLET ===\n", chain.as_str().to_uppercase());
    println!("Address:     {}", wallet.address);
    println!("Private key: {}", wallet.private_key);
    println!("\nStore the private key now. It is not saved anywhere.");
    Ok(())
}

pub async fn faucet(
    toolbox: &WalletToolbox,
    chain: Chain,
    address: &str,
    amount: Option<Decimal>,
) -> Result<()> {
    if toolbox.fund_from_faucet(chain, address, amount).await? {
        println!("Airdrop requested for {}", address);
    } else {
        warn!("Faucet did not fund {}", address);
        println!("Faucet refused the request (rate limited or unavailable). Try again later.");
    }
    Ok(())
}

pub async fn create_token_account(
    toolbox: &WalletToolbox,
    chain: Chain,
    owner: &str,
    token: &str,
) -> Result<()> {
    let signature = toolbox.create_token_account(chain, owner, token).await?;

    println!("Token account created for {} ({})", owner, token.to_uppercase());
    println!("Signature: {}", signature);
    Ok(())
}

/// Guarded transfer: USDG limits first, then the send
pub async fn transfer(
    toolbox: &WalletToolbox,
    chain: Chain,
    destination: &str,
    amount: Decimal,
    token: &str,
) -> Result<()> {
    info!("Transferring {} {} to {} on {}", amount, token, destination, chain);

    let outcome = toolbox.send_token(chain, destination, amount, token).await?;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &SendOutcome) {
    match outcome {
        SendOutcome::Sent {
            signature,
            account_signature,
        } => {
            if let Some(account_signature) = account_signature {
                println!("Token account: {}", account_signature);
            }
            println!("Transfer sent: {}", signature);
        }
        SendOutcome::Rejected(reason) => {
            println!("{}", reason.message());
        }
    }
}

/// Create a wallet and fund it with `token` in one run
pub async fn onboard(
    toolbox: &WalletToolbox,
    chain: Chain,
    amount: Decimal,
    token: &str,
) -> Result<()> {
    let report = toolbox.onboard_wallet(chain, amount, token).await?;

    println!("\n=== NEW {} WALLET ===\n", chain.as_str().to_uppercase());
    println!("Address:     {}", report.wallet.address);
    println!("Private key: {}", report.wallet.private_key);
    println!();
    print_outcome(&report.outcome);
    println!("Balance:     {}", report.balance);
    println!("\nStore the private key now. It is not saved anywhere.");
    Ok(())
}

pub async fn balance(
    toolbox: &WalletToolbox,
    chain: Chain,
    address: &str,
    token: Option<&str>,
) -> Result<()> {
    let token = token.unwrap_or(token_info(chain, Token::Native).symbol);
    let balance = toolbox.balance(chain, address, token).await?;

    println!("{}: {} ({} base units)", address, balance, balance.base_units);
    Ok(())
}

/// Dry-run the USDG limiter against a destination
pub async fn check_limit(
    toolbox: &WalletToolbox,
    chain: Chain,
    destination: &str,
    amount: Decimal,
    token: &str,
) -> Result<()> {
    let decision = toolbox
        .check_transfer(chain, destination, token, amount)
        .await?;

    match decision.rejection() {
        Some(reason) => {
            println!("REJECTED [{}]", reason.code());
            println!("{}", reason.message());
        }
        None => println!("APPROVED"),
    }
    Ok(())
}

pub fn funding_address(toolbox: &WalletToolbox, chain: Chain) -> Result<()> {
    println!("{}", toolbox.funding_address(chain)?);
    Ok(())
}

pub async fn signatures(
    toolbox: &WalletToolbox,
    chain: Chain,
    address: &str,
    limit: usize,
) -> Result<()> {
    let records = toolbox.recent_signatures(chain, address, limit).await?;

    println!("\n=== RECENT SIGNATURES ({}) ===\n", address);
    if records.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!("{:<90} {:<12} {}", "SIGNATURE", "SLOT", "STATUS");
    println!("{}", "-".repeat(112));
    for record in records {
        println!(
            "{:<90} {:<12} {}",
            record.signature,
            record.slot,
            if record.failed { "failed" } else { "ok" }
        );
    }
    Ok(())
}

pub fn tokens(chain: Chain) -> Result<()> {
    println!("\n=== {} TOKENS ===\n", chain.as_str().to_uppercase());
    for symbol in supported_symbols(chain) {
        let info = lookup(chain, symbol)?;
        println!(
            "{:<6} {:>2} dp  {}",
            info.symbol,
            info.decimals,
            info.address.unwrap_or("(native)")
        );
    }
    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}
