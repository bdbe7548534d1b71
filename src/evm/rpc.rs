//! EVM JSON-RPC client

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, H256, U256};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

/// Operations the wallet layer needs from an EVM node
#[async_trait]
pub trait EvmRpc: Send + Sync {
    /// Wei balance
    async fn get_balance(&self, address: Address) -> Result<U256>;

    /// Next nonce for `address` (latest block)
    async fn get_transaction_count(&self, address: Address) -> Result<U256>;

    async fn get_gas_price(&self) -> Result<U256>;

    async fn get_chain_id(&self) -> Result<u64>;

    /// Read-only contract call
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Submit signed RLP bytes, returning the transaction hash
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256>;
}

/// [`EvmRpc`] over an ethers HTTP provider
pub struct EvmRpcClient {
    provider: Provider<Http>,
    timeout: Duration,
}

impl EvmRpcClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| Error::Config(format!("Invalid EVM RPC URL {}: {}", url, e)))?;

        Ok(Self { provider, timeout })
    }

    /// Single attempt bounded by the configured timeout
    async fn bounded<T, F>(&self, method: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, ethers::providers::ProviderError>> + Send,
    {
        debug!("EVM RPC {}", method);
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| Error::Rpc(format!("{} failed: {}", method, e))),
            Err(_) => Err(Error::Rpc(format!(
                "{} timed out after {}ms",
                method,
                self.timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl EvmRpc for EvmRpcClient {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        self.bounded("eth_getBalance", self.provider.get_balance(address, None))
            .await
    }

    async fn get_transaction_count(&self, address: Address) -> Result<U256> {
        self.bounded(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address, None),
        )
        .await
    }

    async fn get_gas_price(&self) -> Result<U256> {
        self.bounded("eth_gasPrice", self.provider.get_gas_price())
            .await
    }

    async fn get_chain_id(&self) -> Result<u64> {
        let id = self
            .bounded("eth_chainId", self.provider.get_chainid())
            .await?;
        if id > U256::from(u64::MAX) {
            return Err(Error::Rpc(format!("Chain id {} out of range", id)));
        }
        Ok(id.as_u64())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let request: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.bounded("eth_call", self.provider.call(&request, None))
            .await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256> {
        let pending = self
            .bounded(
                "eth_sendRawTransaction",
                self.provider.send_raw_transaction(raw),
            )
            .await?;
        Ok(pending.tx_hash())
    }
}
