//! Instruction and transaction building
//!
//! Amounts handed to these builders are already in base units; nothing here
//! knows about human-readable token amounts.

use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    system_instruction, system_program, sysvar,
    transaction::Transaction,
};

use crate::error::{Error, Result};

/// Token program instruction tag for TransferChecked
pub const TRANSFER_CHECKED_TAG: u8 = 12;

/// Associated token account program instruction tag for CreateIdempotent
pub const CREATE_IDEMPOTENT_TAG: u8 = 1;

/// Native SOL transfer
pub fn native_transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    system_instruction::transfer(from, to, lamports)
}

/// Token program TransferChecked
///
/// Data layout: tag (1) + amount (u64 LE) + decimals (1).
pub fn transfer_checked(
    token_program: &Pubkey,
    source: &Pubkey,
    mint: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
    amount: u64,
    decimals: u8,
) -> Instruction {
    let mut data = Vec::with_capacity(10);
    data.push(TRANSFER_CHECKED_TAG);
    data.extend_from_slice(&amount.to_le_bytes());
    data.push(decimals);

    // Order matters! Must match the token program's account list
    let accounts = vec![
        AccountMeta::new(*source, false),               // source
        AccountMeta::new_readonly(*mint, false),        // mint
        AccountMeta::new(*destination, false),          // destination
        AccountMeta::new_readonly(*owner, true),        // owner (signer)
    ];

    Instruction {
        program_id: *token_program,
        accounts,
        data,
    }
}

/// Associated token account creation, paid by `payer`
pub fn create_associated_account(
    associated_program: &Pubkey,
    payer: &Pubkey,
    associated_account: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*payer, true),                          // payer (signer)
        AccountMeta::new(*associated_account, false),            // new account
        AccountMeta::new_readonly(*owner, false),                // wallet owner
        AccountMeta::new_readonly(*mint, false),                 // mint
        AccountMeta::new_readonly(system_program::ID, false),    // system_program
        AccountMeta::new_readonly(*token_program, false),        // token_program
        AccountMeta::new_readonly(sysvar::rent::ID, false),      // rent
    ];

    Instruction {
        program_id: *associated_program,
        accounts,
        data: vec![CREATE_IDEMPOTENT_TAG],
    }
}

/// Build a transaction paid and signed by `payer`
pub fn sign_transaction(
    instructions: &[Instruction],
    payer: &Keypair,
    recent_blockhash: Hash,
) -> Result<Transaction> {
    if instructions.is_empty() {
        return Err(Error::TransactionBuild("No instructions".to_string()));
    }

    let mut transaction = Transaction::new_with_payer(instructions, Some(&payer.pubkey()));
    transaction
        .try_sign(&[payer], recent_blockhash)
        .map_err(|e| Error::TransactionBuild(format!("Signing failed: {}", e)))?;

    if !transaction.is_signed() {
        return Err(Error::TransactionBuild(
            "Transaction requires signers other than the fee payer".to_string(),
        ));
    }

    Ok(transaction)
}

/// Wire bytes of a signed transaction
pub fn serialize_transaction(transaction: &Transaction) -> Result<Vec<u8>> {
    bincode::serialize(transaction)
        .map_err(|e| Error::TransactionBuild(format!("Serialization failed: {}", e)))
}
