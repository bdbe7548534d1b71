//! Associated token account derivation
//!
//! The address is a PDA of the associated token account program seeded with
//! (owner, token program, mint). It has to match what the on-chain program
//! derives bit for bit, otherwise balance queries silently report "not found".

use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::token::registry::{TokenInfo, ASSOCIATED_TOKEN_PROGRAM_ID};

/// Parse a base58 address
pub fn parse_pubkey(address: &str) -> Result<Pubkey> {
    Pubkey::from_str(address.trim())
        .map_err(|e| Error::InvalidAddress(format!("{}: {}", address, e)))
}

/// Associated token account program ID as Pubkey
pub fn associated_token_program_id() -> Result<Pubkey> {
    parse_pubkey(ASSOCIATED_TOKEN_PROGRAM_ID)
}

/// Mint address of a token; native SOL has none
pub fn mint_of(info: &TokenInfo) -> Result<Pubkey> {
    let mint = info.address.ok_or_else(|| {
        Error::UnsupportedOperation(format!("{} has no mint account", info.symbol))
    })?;
    parse_pubkey(mint)
}

/// Program that owns accounts of this token
pub fn token_program_of(info: &TokenInfo) -> Result<Pubkey> {
    let program = info.program.ok_or_else(|| {
        Error::UnknownToken(format!("{} has no owning program on Solana", info.symbol))
    })?;
    parse_pubkey(program)
}

/// Derive an associated account from raw components
pub fn derive_associated_address_with_program(
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
    associated_program: &Pubkey,
) -> Pubkey {
    let seeds = &[owner.as_ref(), token_program.as_ref(), mint.as_ref()];
    Pubkey::find_program_address(seeds, associated_program).0
}

/// Derive the associated token account for `owner` holding `info`
pub fn derive_associated_address(owner: &Pubkey, info: &TokenInfo) -> Result<Pubkey> {
    let mint = mint_of(info)?;
    let token_program = token_program_of(info)?;
    let associated_program = associated_token_program_id()?;

    Ok(derive_associated_address_with_program(
        owner,
        &mint,
        &token_program,
        &associated_program,
    ))
}
