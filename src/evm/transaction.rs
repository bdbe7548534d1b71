//! Legacy transaction building and signing
//!
//! Token transfers call `transfer(address,uint256)` on the token contract;
//! balances read `balanceOf(address)`. All transactions are legacy (type 0)
//! with an explicit chain id, so signatures follow EIP-155.

use ethers::abi::{self, ParamType, Token as AbiToken};
use ethers::signers::LocalWallet;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use ethers::utils::id;

use crate::error::{Error, Result};

pub const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";
pub const BALANCE_OF_SIGNATURE: &str = "balanceOf(address)";

/// Everything a transaction needs from the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxParams {
    pub nonce: U256,
    pub gas_price: U256,
    pub chain_id: u64,
}

/// `gas_price * (100 + margin_pct) / 100`
pub fn apply_gas_margin(gas_price: U256, margin_pct: u64) -> U256 {
    gas_price * U256::from(100 + margin_pct) / U256::from(100u64)
}

fn calldata(signature: &str, args: &[AbiToken]) -> Bytes {
    let mut data = id(signature).to_vec();
    data.extend(abi::encode(args));
    data.into()
}

/// Calldata for `transfer(to, amount)`
pub fn transfer_calldata(to: Address, amount: U256) -> Bytes {
    calldata(
        TRANSFER_SIGNATURE,
        &[AbiToken::Address(to), AbiToken::Uint(amount)],
    )
}

/// Calldata for `balanceOf(owner)`
pub fn balance_of_calldata(owner: Address) -> Bytes {
    calldata(BALANCE_OF_SIGNATURE, &[AbiToken::Address(owner)])
}

/// Decode a single `uint256` return value
pub fn decode_uint(output: &[u8]) -> Result<U256> {
    let mut tokens = abi::decode(&[ParamType::Uint(256)], output)
        .map_err(|e| Error::Rpc(format!("Invalid uint256 return data: {}", e)))?;

    tokens
        .pop()
        .and_then(AbiToken::into_uint)
        .ok_or_else(|| Error::Rpc("Empty uint256 return data".to_string()))
}

/// Plain value transfer
pub fn native_transfer_request(
    from: Address,
    to: Address,
    value: U256,
    params: TxParams,
    gas_limit: u64,
) -> TransactionRequest {
    TransactionRequest::new()
        .from(from)
        .to(to)
        .value(value)
        .nonce(params.nonce)
        .gas(gas_limit)
        .gas_price(params.gas_price)
        .chain_id(params.chain_id)
}

/// ERC-20 transfer; the transaction goes to the contract, `to` is in calldata
pub fn token_transfer_request(
    from: Address,
    contract: Address,
    to: Address,
    amount: U256,
    params: TxParams,
    gas_limit: u64,
) -> TransactionRequest {
    TransactionRequest::new()
        .from(from)
        .to(contract)
        .value(U256::zero())
        .data(transfer_calldata(to, amount))
        .nonce(params.nonce)
        .gas(gas_limit)
        .gas_price(params.gas_price)
        .chain_id(params.chain_id)
}

/// Sign a request and return the raw RLP bytes ready for `eth_sendRawTransaction`
pub fn sign_request(wallet: &LocalWallet, request: TransactionRequest) -> Result<Bytes> {
    if request.chain_id.is_none() {
        return Err(Error::TransactionBuild("Missing chain id".to_string()));
    }

    let typed = TypedTransaction::Legacy(request);
    let signature = wallet
        .sign_transaction_sync(&typed)
        .map_err(|e| Error::TransactionBuild(format!("Signing failed: {}", e)))?;

    Ok(typed.rlp_signed(&signature))
}
