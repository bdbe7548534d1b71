//! Solana JSON-RPC client
//!
//! Thin request/response layer against a single endpoint. Every call is a
//! single attempt; nothing here retries.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use solana_account_decoder::{parse_token::UiTokenAmount, UiAccount};
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_client::rpc_request::RpcRequest;
use solana_client::rpc_response::{
    Response, RpcBlockhash, RpcConfirmedTransactionStatusWithSignature, RpcKeyedAccount,
};
use solana_sdk::commitment_config::CommitmentLevel;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

/// Substring the node uses when a token account does not exist
const ACCOUNT_NOT_FOUND: &str = "could not find account";

/// Signature history entry
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureRecord {
    pub signature: String,
    pub slot: u64,
    pub failed: bool,
    pub block_time: Option<i64>,
}

impl From<RpcConfirmedTransactionStatusWithSignature> for SignatureRecord {
    fn from(status: RpcConfirmedTransactionStatusWithSignature) -> Self {
        Self {
            signature: status.signature,
            slot: status.slot,
            failed: status.err.is_some(),
            block_time: status.block_time,
        }
    }
}

/// Minimal view of an on-chain account
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSummary {
    pub lamports: u64,
    pub owner: String,
    pub executable: bool,
}

impl From<UiAccount> for AccountSummary {
    fn from(account: UiAccount) -> Self {
        Self {
            lamports: account.lamports,
            owner: account.owner,
            executable: account.executable,
        }
    }
}

/// Operations the wallet layer needs from a Solana node
#[async_trait]
pub trait SolanaRpc: Send + Sync {
    /// Lamport balance of an address
    async fn get_balance(&self, address: &Pubkey) -> Result<u64>;

    /// Raw token amount held by a token account; 0 if the account does not exist
    async fn get_token_account_balance(&self, account: &Pubkey) -> Result<u64>;

    async fn get_latest_blockhash(&self) -> Result<Hash>;

    /// Submit signed wire bytes, returning the transaction signature
    async fn send_transaction(&self, wire: &[u8]) -> Result<String>;

    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>>;

    /// Devnet airdrop, returning the airdrop transaction signature
    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<String>;

    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<AccountSummary>>;

    /// Token accounts held by `owner` for `mint`
    async fn get_token_accounts_by_owner(&self, owner: &Pubkey, mint: &Pubkey)
        -> Result<Vec<String>>;
}

/// JSON-RPC error object, kept verbatim
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    pub fn is_account_not_found(&self) -> bool {
        self.message.to_lowercase().contains(ACCOUNT_NOT_FOUND)
    }

    fn into_error(self, method: &str) -> Error {
        let raw = json!({
            "code": self.code,
            "message": self.message,
            "data": self.data,
        });
        Error::Rpc(format!("{} failed: {}", method, raw))
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcReply<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

impl<T> JsonRpcReply<T> {
    fn into_outcome(self, method: &str) -> Result<std::result::Result<T, RpcErrorObject>> {
        if let Some(error) = self.error {
            return Ok(Err(error));
        }
        self.result
            .map(Ok)
            .ok_or_else(|| Error::Rpc(format!("{} returned no result", method)))
    }
}

/// Interpret a getTokenAccountBalance reply, mapping "not found" to zero
fn token_balance_from_reply(
    method: &str,
    outcome: std::result::Result<Response<UiTokenAmount>, RpcErrorObject>,
) -> Result<u64> {
    match outcome {
        Ok(response) => response
            .value
            .amount
            .parse::<u64>()
            .map_err(|e| Error::Serialization(format!("Invalid token amount: {}", e))),
        Err(error) if error.is_account_not_found() => {
            debug!("Token account not found, balance is 0");
            Ok(0)
        }
        Err(error) => Err(error.into_error(method)),
    }
}

/// HTTP JSON-RPC implementation of [`SolanaRpc`]
pub struct SolanaRpcClient {
    client: Client,
    url: String,
}

impl SolanaRpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one JSON-RPC request and split the reply into result or error object
    async fn call<T: DeserializeOwned>(
        &self,
        request: RpcRequest,
        params: Value,
    ) -> Result<std::result::Result<T, RpcErrorObject>> {
        let method = request.to_string();
        let body = request.build_request_json(1, params);

        debug!("RPC {} -> {}", method, self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Rpc(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Rpc(format!("{} HTTP {}: {}", method, status, body)));
        }

        let reply: JsonRpcReply<T> = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse {} reply: {}", method, e)))?;

        reply.into_outcome(&method)
    }

    /// Like `call`, but any error object becomes `Error::Rpc`
    async fn call_ok<T: DeserializeOwned>(&self, request: RpcRequest, params: Value) -> Result<T> {
        let method = request.to_string();
        self.call(request, params)
            .await?
            .map_err(|error| error.into_error(&method))
    }
}

#[async_trait]
impl SolanaRpc for SolanaRpcClient {
    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        let response: Response<u64> = self
            .call_ok(RpcRequest::GetBalance, json!([address.to_string()]))
            .await?;
        Ok(response.value)
    }

    async fn get_token_account_balance(&self, account: &Pubkey) -> Result<u64> {
        let request = RpcRequest::GetTokenAccountBalance;
        let method = request.to_string();
        let outcome = self.call(request, json!([account.to_string()])).await?;
        token_balance_from_reply(&method, outcome)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        let response: Response<RpcBlockhash> =
            self.call_ok(RpcRequest::GetLatestBlockhash, json!([])).await?;
        Hash::from_str(&response.value.blockhash)
            .map_err(|e| Error::Serialization(format!("Invalid blockhash: {}", e)))
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<String> {
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            preflight_commitment: Some(CommitmentLevel::Processed),
            ..RpcSendTransactionConfig::default()
        };
        let encoded = bs58::encode(wire).into_string();

        self.call_ok(RpcRequest::SendTransaction, json!([encoded, config]))
            .await
    }

    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>> {
        let statuses: Vec<RpcConfirmedTransactionStatusWithSignature> = self
            .call_ok(
                RpcRequest::GetSignaturesForAddress,
                json!([address.to_string(), { "limit": limit }]),
            )
            .await?;
        Ok(statuses.into_iter().map(SignatureRecord::from).collect())
    }

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<String> {
        self.call_ok(
            RpcRequest::RequestAirdrop,
            json!([address.to_string(), lamports]),
        )
        .await
    }

    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<AccountSummary>> {
        let response: Response<Option<UiAccount>> = self
            .call_ok(
                RpcRequest::GetAccountInfo,
                json!([address.to_string(), { "encoding": "base64" }]),
            )
            .await?;
        Ok(response.value.map(AccountSummary::from))
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<String>> {
        let response: Response<Vec<RpcKeyedAccount>> = self
            .call_ok(
                RpcRequest::GetTokenAccountsByOwner,
                json!([
                    owner.to_string(),
                    { "mint": mint.to_string() },
                    { "encoding": "jsonParsed" }
                ]),
            )
            .await?;
        Ok(response.value.into_iter().map(|keyed| keyed.pubkey).collect())
    }
}
