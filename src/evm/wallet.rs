//! EVM wallet primitives
//!
//! No faucet and no associated accounts: token balances and transfers talk
//! to the token contract directly with the owner's main address.

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::rpc::{EvmRpc, EvmRpcClient};
use super::transaction::{
    apply_gas_margin, balance_of_calldata, decode_uint, native_transfer_request, sign_request,
    token_transfer_request, TxParams,
};
use crate::config::{EvmConfig, Secrets, EVM_FUNDING_KEY_ENV};
use crate::error::{Error, Result};
use crate::token::{lookup, to_base_units, Chain, TokenInfo};
use crate::wallet::{NewWallet, WalletOps, WalletTracker};

/// Parse a `0x`-prefixed (or bare) hex address
pub fn parse_address(address: &str) -> Result<Address> {
    Address::from_str(address.trim())
        .map_err(|e| Error::InvalidAddress(format!("{}: {}", address, e)))
}

/// Parse a hex private key
pub fn parse_private_key(key: &str) -> Result<LocalWallet> {
    key.trim()
        .parse::<LocalWallet>()
        .map_err(|e| Error::Config(format!("Invalid EVM private key: {}", e)))
}

/// `0x`-prefixed hex of the raw 32-byte secret
pub fn encode_private_key(wallet: &LocalWallet) -> String {
    format!("0x{}", hex::encode(wallet.signer().to_bytes()))
}

fn u256_to_u128(value: U256) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(Error::InvalidAmount(format!("{} does not fit in u128", value)));
    }
    Ok(value.as_u128())
}

pub struct EvmWallet {
    rpc: Arc<dyn EvmRpc>,
    funding: Option<LocalWallet>,
    tracker: Arc<WalletTracker>,
    config: EvmConfig,
}

impl EvmWallet {
    pub fn new(
        rpc: Arc<dyn EvmRpc>,
        funding: Option<LocalWallet>,
        tracker: Arc<WalletTracker>,
        config: EvmConfig,
    ) -> Self {
        Self {
            rpc,
            funding,
            tracker,
            config,
        }
    }

    /// Wallet backed by the HTTP provider and the funding key from `secrets`
    pub fn from_config(
        config: &EvmConfig,
        secrets: &Secrets,
        tracker: Arc<WalletTracker>,
    ) -> Result<Self> {
        let rpc = EvmRpcClient::new(&config.rpc_url, Duration::from_millis(config.timeout_ms))?;
        let funding = secrets
            .evm_funding_key
            .as_deref()
            .map(parse_private_key)
            .transpose()?;

        Ok(Self::new(Arc::new(rpc), funding, tracker, config.clone()))
    }

    fn funding_wallet(&self) -> Result<&LocalWallet> {
        self.funding.as_ref().ok_or_else(|| {
            Error::InsufficientConfiguration(format!("{} is not set", EVM_FUNDING_KEY_ENV))
        })
    }

    fn token(&self, symbol: &str) -> Result<&'static TokenInfo> {
        lookup(Chain::Evm, symbol)
    }

    fn contract_of(info: &TokenInfo) -> Result<Address> {
        let contract = info.address.ok_or_else(|| {
            Error::UnsupportedOperation(format!("{} has no token contract", info.symbol))
        })?;
        parse_address(contract)
    }

    /// Nonce, then the fixed pause, then gas price and chain id
    async fn tx_params(&self, sender: Address, with_margin: bool) -> Result<TxParams> {
        let nonce = self
            .rpc
            .get_transaction_count(sender)
            .await
            .map_err(|e| Error::TransactionBuild(format!("Failed to get nonce: {}", e)))?;

        // Fixed pause between nonce fetch and build
        tokio::time::sleep(Duration::from_millis(self.config.nonce_delay_ms)).await;

        let gas_price = self
            .rpc
            .get_gas_price()
            .await
            .map_err(|e| Error::TransactionBuild(format!("Failed to get gas price: {}", e)))?;
        let gas_price = if with_margin {
            apply_gas_margin(gas_price, self.config.gas_price_margin_pct)
        } else {
            gas_price
        };

        let chain_id = self
            .rpc
            .get_chain_id()
            .await
            .map_err(|e| Error::TransactionBuild(format!("Failed to get chain id: {}", e)))?;

        debug!(
            "Tx params for {:?}: nonce {}, gas price {}, chain {}",
            sender, nonce, gas_price, chain_id
        );

        Ok(TxParams {
            nonce,
            gas_price,
            chain_id,
        })
    }
}

#[async_trait]
impl WalletOps for EvmWallet {
    fn chain(&self) -> Chain {
        Chain::Evm
    }

    async fn create_wallet(&self) -> Result<NewWallet> {
        let wallet = LocalWallet::new(&mut rand::thread_rng());
        let address = to_checksum(&wallet.address(), None);

        self.tracker.record(Chain::Evm, address.clone());
        info!("Created EVM wallet {}", address);

        Ok(NewWallet {
            chain: Chain::Evm,
            address,
            private_key: encode_private_key(&wallet),
        })
    }

    async fn fund_from_faucet(&self, _address: &str, _amount: Option<Decimal>) -> Result<bool> {
        Err(Error::UnsupportedOperation(
            "EVM networks have no faucet".to_string(),
        ))
    }

    async fn create_associated_account(&self, _owner: &str, _token: &str) -> Result<String> {
        Err(Error::UnsupportedOperation(
            "EVM tokens need no associated account".to_string(),
        ))
    }

    async fn transfer_token(
        &self,
        destination: &str,
        amount: Decimal,
        token: &str,
    ) -> Result<String> {
        let info = self.token(token)?;
        let wallet = self.funding_wallet()?;
        let from = wallet.address();
        let to = parse_address(destination)?;
        let units = U256::from(to_base_units(info, amount)?);

        let request = if info.token.is_native() {
            let params = self.tx_params(from, false).await?;
            native_transfer_request(from, to, units, params, self.config.native_gas_limit)
        } else {
            let contract = Self::contract_of(info)?;
            let params = self.tx_params(from, true).await?;
            token_transfer_request(from, contract, to, units, params, self.config.token_gas_limit)
        };

        let raw = sign_request(wallet, request)?;
        let hash = self
            .rpc
            .send_raw_transaction(raw)
            .await
            .map_err(|e| Error::Submission(e.to_string()))?;

        let hash = format!("{:#x}", hash);
        info!(
            "Sent {} {} to {} (tx: {})",
            amount,
            info.symbol,
            to_checksum(&to, None),
            hash
        );
        Ok(hash)
    }

    async fn get_balance(&self, address: &str, token: &str) -> Result<u128> {
        let info = self.token(token)?;
        let owner = parse_address(address)?;

        if info.token.is_native() {
            return u256_to_u128(self.rpc.get_balance(owner).await?);
        }

        let contract = Self::contract_of(info)?;
        let output = self.rpc.call(contract, balance_of_calldata(owner)).await?;
        u256_to_u128(decode_uint(&output)?)
    }

    fn last_created_wallet(&self) -> Option<String> {
        self.tracker.last_created(Chain::Evm)
    }

    fn funding_address(&self) -> Result<String> {
        Ok(to_checksum(&self.funding_wallet()?.address(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEvmNode;
    use crate::token::{from_base_units, token_info, Token};
    use ethers::types::NameOrAddress;

    const SEPOLIA: u64 = 11_155_111;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn quick_config() -> EvmConfig {
        EvmConfig {
            nonce_delay_ms: 0,
            ..EvmConfig::default()
        }
    }

    fn setup() -> (Arc<MockEvmNode>, EvmWallet, Address) {
        let node = Arc::new(MockEvmNode::new(SEPOLIA, U256::from(20_000_000_000u64)));
        let funding = LocalWallet::new(&mut rand::thread_rng());
        let address = funding.address();
        node.fund(address, U256::exp10(18));

        let wallet = EvmWallet::new(
            node.clone(),
            Some(funding),
            Arc::new(WalletTracker::new()),
            quick_config(),
        );
        (node, wallet, address)
    }

    #[test]
    fn test_private_key_round_trip() {
        let wallet = LocalWallet::new(&mut rand::thread_rng());
        let encoded = encode_private_key(&wallet);
        assert!(encoded.starts_with("0x"));
        assert_eq!(encoded.len(), 66);

        let restored = parse_private_key(&encoded).unwrap();
        assert_eq!(restored.address(), wallet.address());
        assert!(parse_private_key("0xzz").is_err());
    }

    #[test]
    fn test_u256_narrowing() {
        assert_eq!(u256_to_u128(U256::from(5u64)).unwrap(), 5);
        assert!(u256_to_u128(U256::MAX).is_err());
    }

    #[tokio::test]
    async fn test_create_wallet_is_checksummed_and_tracked() {
        let (_, wallet, _) = setup();
        let created = wallet.create_wallet().await.unwrap();

        let parsed = parse_address(&created.address).unwrap();
        assert_eq!(created.address, to_checksum(&parsed, None));
        assert_eq!(wallet.last_created_wallet(), Some(created.address.clone()));

        let key = parse_private_key(&created.private_key).unwrap();
        assert_eq!(key.address(), parsed);
    }

    #[tokio::test]
    async fn test_faucet_fails_fast() {
        let (node, wallet, _) = setup();
        let target = to_checksum(&Address::random(), None);

        assert!(matches!(
            wallet.fund_from_faucet(&target, None).await,
            Err(Error::UnsupportedOperation(_))
        ));
        assert!(matches!(
            wallet.create_associated_account(&target, "USDG").await,
            Err(Error::UnsupportedOperation(_))
        ));
        assert_eq!(node.nonce_queries(), 0);
        assert!(node.sent().is_empty());
    }

    #[tokio::test]
    async fn test_native_transfer_uses_plain_gas() {
        let (node, wallet, funding) = setup();
        node.set_nonce(funding, 3);
        let target = Address::random();

        let hash = wallet
            .transfer_token(&format!("{:?}", target), dec("0.05"), "ETH")
            .await
            .unwrap();
        assert!(hash.starts_with("0x"));
        assert_eq!(hash.len(), 66);

        let sent = node.sent();
        assert_eq!(sent.len(), 1);
        let (request, sender) = &sent[0];
        assert_eq!(*sender, funding);
        assert_eq!(request.nonce, Some(U256::from(3u64)));
        assert_eq!(request.gas, Some(U256::from(21_000u64)));
        assert_eq!(request.gas_price, Some(U256::from(20_000_000_000u64)));
        assert_eq!(request.chain_id, Some(SEPOLIA.into()));

        let balance = wallet
            .get_balance(&format!("{:?}", target), "ETH")
            .await
            .unwrap();
        assert_eq!(balance, 50_000_000_000_000_000);
    }

    #[tokio::test]
    async fn test_token_transfer_adds_gas_margin() {
        let (node, wallet, funding) = setup();
        let usdc = token_info(Chain::Evm, Token::Usdc);
        let contract = parse_address(usdc.address.unwrap()).unwrap();
        node.seed_token(contract, funding, U256::from(10_000_000u64));

        let target = Address::random();
        wallet
            .transfer_token(&format!("{:?}", target), dec("1.25"), "USDC")
            .await
            .unwrap();

        let (request, _) = node.sent().remove(0);
        assert_eq!(request.to, Some(NameOrAddress::Address(contract)));
        assert_eq!(request.gas, Some(U256::from(100_000u64)));
        assert_eq!(request.gas_price, Some(U256::from(22_000_000_000u64)));

        let raw = wallet
            .get_balance(&format!("{:?}", target), "USDC")
            .await
            .unwrap();
        assert_eq!(from_base_units(usdc, raw).unwrap(), dec("1.25"));
    }

    #[tokio::test]
    async fn test_consecutive_transfers_use_fresh_nonces() {
        let (node, wallet, _) = setup();
        let target = format!("{:?}", Address::random());

        wallet.transfer_token(&target, dec("0.001"), "ETH").await.unwrap();
        wallet.transfer_token(&target, dec("0.001"), "ETH").await.unwrap();

        let nonces: Vec<_> = node.sent().iter().map(|(r, _)| r.nonce).collect();
        assert_eq!(nonces, vec![Some(U256::zero()), Some(U256::one())]);
        assert_eq!(node.nonce_queries(), 2);
    }

    #[tokio::test]
    async fn test_nonce_delay_is_awaited() {
        let node = Arc::new(MockEvmNode::new(SEPOLIA, U256::from(1u64)));
        let funding = LocalWallet::new(&mut rand::thread_rng());
        node.fund(funding.address(), U256::exp10(18));
        let wallet = EvmWallet::new(
            node,
            Some(funding),
            Arc::new(WalletTracker::new()),
            EvmConfig {
                nonce_delay_ms: 50,
                ..EvmConfig::default()
            },
        );

        let started = std::time::Instant::now();
        wallet
            .transfer_token(&format!("{:?}", Address::random()), dec("0.001"), "ETH")
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_missing_token_balance_is_zero() {
        let (_, wallet, _) = setup();
        let fresh = format!("{:?}", Address::random());
        assert_eq!(wallet.get_balance(&fresh, "USDG").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_submission_failure() {
        let (node, wallet, _) = setup();
        node.reject_sends(true);
        let result = wallet
            .transfer_token(&format!("{:?}", Address::random()), dec("0.001"), "ETH")
            .await;
        assert!(matches!(result, Err(Error::Submission(_))));
    }

    #[tokio::test]
    async fn test_missing_funding_key() {
        let node = Arc::new(MockEvmNode::new(SEPOLIA, U256::one()));
        let wallet = EvmWallet::new(
            node.clone(),
            None,
            Arc::new(WalletTracker::new()),
            quick_config(),
        );
        assert!(matches!(
            wallet.transfer_token(&format!("{:?}", Address::random()), dec("1"), "USDG").await,
            Err(Error::InsufficientConfiguration(_))
        ));
        assert!(wallet.funding_address().is_err());
        assert_eq!(node.nonce_queries(), 0);
    }
}
