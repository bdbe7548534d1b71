//! In-memory chain doubles for tests
//!
//! `MockSolanaLedger` decodes the wire transactions it is sent and applies
//! system transfers, associated account creation and `TransferChecked`.
//! `MockEvmNode` decodes signed legacy transactions and applies native and
//! ERC-20 transfers. Both count what they were asked so tests can assert
//! that a call never reached the network.

use async_trait::async_trait;
use ethers::abi::{self, ParamType};
use ethers::types::{Address, Bytes, NameOrAddress, TransactionRequest, H256, U256};
use ethers::utils::{keccak256, rlp::Rlp};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction::SystemInstruction;
use solana_sdk::system_program;
use solana_sdk::transaction::Transaction;
use spl_token::instruction::TokenInstruction;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::evm::rpc::EvmRpc;
use crate::evm::transaction::{BALANCE_OF_SIGNATURE, TRANSFER_SIGNATURE};
use crate::solana::address::{associated_token_program_id, derive_associated_address};
use crate::solana::rpc::{AccountSummary, SignatureRecord, SolanaRpc};
use crate::token::registry::{TokenInfo, TOKEN_2022_PROGRAM_ID};

const LAMPORTS_PER_SIGNATURE: u64 = 5_000;

#[derive(Debug, Clone)]
struct TokenAccount {
    mint: Pubkey,
    owner: Pubkey,
    program: Pubkey,
    amount: u64,
}

#[derive(Default)]
struct LedgerState {
    lamports: HashMap<Pubkey, u64>,
    token_accounts: HashMap<Pubkey, TokenAccount>,
    history: HashMap<Pubkey, Vec<SignatureRecord>>,
    transactions: Vec<Transaction>,
    slot: u64,
}

impl LedgerState {
    fn debit(&mut self, account: &Pubkey, lamports: u64) -> bool {
        let balance = self.lamports.entry(*account).or_insert(0);
        if *balance < lamports {
            return false;
        }
        *balance -= lamports;
        true
    }

    /// Apply every instruction; an on-chain failure rolls nothing back but is
    /// reported so the signature can be marked failed
    fn apply(&mut self, transaction: &Transaction) -> bool {
        let keys = &transaction.message.account_keys;
        let token_2022 = Pubkey::from_str(TOKEN_2022_PROGRAM_ID).unwrap();
        let ata_program = associated_token_program_id().unwrap();

        let fee = LAMPORTS_PER_SIGNATURE * transaction.signatures.len() as u64;
        if !self.debit(&keys[0], fee) {
            return false;
        }

        for ix in &transaction.message.instructions {
            let program = keys[ix.program_id_index as usize];
            let accounts: Vec<Pubkey> = ix.accounts.iter().map(|i| keys[*i as usize]).collect();

            let ok = if program == system_program::ID {
                match bincode::deserialize::<SystemInstruction>(&ix.data) {
                    Ok(SystemInstruction::Transfer { lamports }) => {
                        if self.debit(&accounts[0], lamports) {
                            *self.lamports.entry(accounts[1]).or_insert(0) += lamports;
                            true
                        } else {
                            false
                        }
                    }
                    _ => false,
                }
            } else if program == ata_program {
                self.token_accounts
                    .entry(accounts[1])
                    .or_insert_with(|| TokenAccount {
                        mint: accounts[3],
                        owner: accounts[2],
                        program: accounts[5],
                        amount: 0,
                    });
                true
            } else if program == spl_token::ID || program == token_2022 {
                match TokenInstruction::unpack(&ix.data) {
                    Ok(TokenInstruction::TransferChecked { amount, .. }) => {
                        self.transfer_tokens(&accounts[0], &accounts[2], &accounts[1], amount)
                    }
                    _ => false,
                }
            } else {
                false
            };

            if !ok {
                return false;
            }
        }
        true
    }

    fn transfer_tokens(&mut self, source: &Pubkey, target: &Pubkey, mint: &Pubkey, amount: u64) -> bool {
        let source_ok = matches!(
            self.token_accounts.get(source),
            Some(account) if account.mint == *mint && account.amount >= amount
        );
        let target_ok = matches!(
            self.token_accounts.get(target),
            Some(account) if account.mint == *mint
        );
        if !(source_ok && target_ok) {
            return false;
        }

        if let Some(account) = self.token_accounts.get_mut(source) {
            account.amount -= amount;
        }
        if let Some(account) = self.token_accounts.get_mut(target) {
            account.amount += amount;
        }
        true
    }
}

/// Solana devnet stand-in
#[derive(Default)]
pub struct MockSolanaLedger {
    state: Mutex<LedgerState>,
    token_balance_queries: AtomicUsize,
    refuse_airdrops: AtomicBool,
    fail_blockhash: AtomicBool,
    reject_sends: AtomicBool,
}

impl MockSolanaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fund(&self, account: &Pubkey, lamports: u64) {
        let mut state = self.state.lock().unwrap();
        *state.lamports.entry(*account).or_insert(0) += lamports;
    }

    /// Create (or top up) the associated account of `owner` for `info`
    pub fn seed_token_account(&self, owner: &Pubkey, info: &TokenInfo, amount: u64) {
        let address = derive_associated_address(owner, info).unwrap();
        let mint = Pubkey::from_str(info.address.unwrap()).unwrap();
        let program = Pubkey::from_str(info.program.unwrap()).unwrap();

        let mut state = self.state.lock().unwrap();
        state
            .token_accounts
            .entry(address)
            .or_insert_with(|| TokenAccount {
                mint,
                owner: *owner,
                program,
                amount: 0,
            })
            .amount += amount;
    }

    pub fn submitted_count(&self) -> usize {
        self.state.lock().unwrap().transactions.len()
    }

    /// Accepted transactions, oldest first
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().transactions.clone()
    }

    pub fn last_transaction(&self) -> Option<Transaction> {
        self.state.lock().unwrap().transactions.last().cloned()
    }

    pub fn token_balance_queries(&self) -> usize {
        self.token_balance_queries.load(Ordering::SeqCst)
    }

    pub fn refuse_airdrops(&self, refuse: bool) {
        self.refuse_airdrops.store(refuse, Ordering::SeqCst);
    }

    pub fn fail_blockhash(&self, fail: bool) {
        self.fail_blockhash.store(fail, Ordering::SeqCst);
    }

    pub fn reject_sends(&self, reject: bool) {
        self.reject_sends.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl SolanaRpc for MockSolanaLedger {
    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        let state = self.state.lock().unwrap();
        Ok(state.lamports.get(address).copied().unwrap_or(0))
    }

    async fn get_token_account_balance(&self, account: &Pubkey) -> Result<u64> {
        self.token_balance_queries.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state
            .token_accounts
            .get(account)
            .map(|a| a.amount)
            .unwrap_or(0))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        if self.fail_blockhash.load(Ordering::SeqCst) {
            return Err(Error::Rpc("getLatestBlockhash failed: node is behind".into()));
        }
        Ok(Hash::new_unique())
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<String> {
        if self.reject_sends.load(Ordering::SeqCst) {
            return Err(Error::Rpc("sendTransaction failed: blockhash not found".into()));
        }

        let transaction: Transaction = bincode::deserialize(wire)
            .map_err(|e| Error::Rpc(format!("failed to deserialize transaction: {}", e)))?;
        transaction
            .verify()
            .map_err(|e| Error::Rpc(format!("signature verification failed: {}", e)))?;

        let signature = transaction.signatures[0].to_string();
        let mut state = self.state.lock().unwrap();
        let failed = !state.apply(&transaction);
        state.slot += 1;

        let record = SignatureRecord {
            signature: signature.clone(),
            slot: state.slot,
            failed,
            block_time: None,
        };
        for key in &transaction.message.account_keys {
            state.history.entry(*key).or_default().insert(0, record.clone());
        }
        state.transactions.push(transaction);

        Ok(signature)
    }

    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .history
            .get(address)
            .map(|records| records.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<String> {
        if self.refuse_airdrops.load(Ordering::SeqCst) {
            return Err(Error::Rpc("requestAirdrop failed: 429 Too Many Requests".into()));
        }
        self.fund(address, lamports);
        Ok(Signature::new_unique().to_string())
    }

    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<AccountSummary>> {
        let state = self.state.lock().unwrap();
        if let Some(account) = state.token_accounts.get(address) {
            return Ok(Some(AccountSummary {
                lamports: 2_039_280,
                owner: account.program.to_string(),
                executable: false,
            }));
        }
        Ok(state.lamports.get(address).map(|lamports| AccountSummary {
            lamports: *lamports,
            owner: system_program::ID.to_string(),
            executable: false,
        }))
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .token_accounts
            .iter()
            .filter(|(_, a)| a.owner == *owner && a.mint == *mint)
            .map(|(address, _)| address.to_string())
            .collect())
    }
}

#[derive(Default)]
struct NodeState {
    balances: HashMap<Address, U256>,
    token_balances: HashMap<(Address, Address), U256>,
    nonces: HashMap<Address, U256>,
    sent: Vec<(TransactionRequest, Address)>,
}

/// EVM testnet stand-in
pub struct MockEvmNode {
    state: Mutex<NodeState>,
    gas_price: U256,
    chain_id: u64,
    nonce_queries: AtomicUsize,
    balance_calls: AtomicUsize,
    reject_sends: AtomicBool,
}

impl MockEvmNode {
    pub fn new(chain_id: u64, gas_price: U256) -> Self {
        Self {
            state: Mutex::new(NodeState::default()),
            gas_price,
            chain_id,
            nonce_queries: AtomicUsize::new(0),
            balance_calls: AtomicUsize::new(0),
            reject_sends: AtomicBool::new(false),
        }
    }

    pub fn fund(&self, address: Address, wei: U256) {
        let mut state = self.state.lock().unwrap();
        *state.balances.entry(address).or_default() += wei;
    }

    pub fn seed_token(&self, contract: Address, owner: Address, amount: U256) {
        let mut state = self.state.lock().unwrap();
        *state.token_balances.entry((contract, owner)).or_default() += amount;
    }

    pub fn set_nonce(&self, address: Address, nonce: u64) {
        self.state.lock().unwrap().nonces.insert(address, U256::from(nonce));
    }

    /// Decoded transactions with their recovered sender, oldest first
    pub fn sent(&self) -> Vec<(TransactionRequest, Address)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn nonce_queries(&self) -> usize {
        self.nonce_queries.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn reject_sends(&self, reject: bool) {
        self.reject_sends.store(reject, Ordering::SeqCst);
    }
}

fn selector(signature: &str) -> [u8; 4] {
    ethers::utils::id(signature)
}

#[async_trait]
impl EvmRpc for MockEvmNode {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        let state = self.state.lock().unwrap();
        Ok(state.balances.get(&address).copied().unwrap_or_default())
    }

    async fn get_transaction_count(&self, address: Address) -> Result<U256> {
        self.nonce_queries.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state.nonces.get(&address).copied().unwrap_or_default())
    }

    async fn get_gas_price(&self) -> Result<U256> {
        Ok(self.gas_price)
    }

    async fn get_chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        if data.len() < 4 || data[..4] != selector(BALANCE_OF_SIGNATURE) {
            return Err(Error::Rpc("execution reverted".into()));
        }
        self.balance_calls.fetch_add(1, Ordering::SeqCst);

        let decoded = abi::decode(&[ParamType::Address], &data[4..])
            .map_err(|e| Error::Rpc(format!("bad calldata: {}", e)))?;
        let owner = decoded[0].clone().into_address().unwrap_or_default();

        let state = self.state.lock().unwrap();
        let balance = state.token_balances.get(&(to, owner)).copied().unwrap_or_default();
        Ok(abi::encode(&[abi::Token::Uint(balance)]).into())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256> {
        if self.reject_sends.load(Ordering::SeqCst) {
            return Err(Error::Rpc("replacement transaction underpriced".into()));
        }

        let rlp = Rlp::new(raw.as_ref());
        let (request, signature) = TransactionRequest::decode_signed_rlp(&rlp)
            .map_err(|e| Error::Rpc(format!("invalid raw transaction: {}", e)))?;
        let sender = signature
            .recover(request.sighash())
            .map_err(|e| Error::Rpc(format!("invalid signature: {}", e)))?;

        let to = match &request.to {
            Some(NameOrAddress::Address(address)) => *address,
            _ => return Err(Error::Rpc("missing recipient".into())),
        };
        let data = request.data.clone().unwrap_or_default();

        let mut state = self.state.lock().unwrap();
        *state.nonces.entry(sender).or_default() += U256::one();

        if data.is_empty() {
            let value = request.value.unwrap_or_default();
            let balance = state.balances.entry(sender).or_default();
            if *balance >= value {
                *balance -= value;
                *state.balances.entry(to).or_default() += value;
            }
        } else if data.len() >= 4 && data[..4] == selector(TRANSFER_SIGNATURE) {
            let decoded = abi::decode(&[ParamType::Address, ParamType::Uint(256)], &data[4..])
                .map_err(|e| Error::Rpc(format!("bad calldata: {}", e)))?;
            let recipient = decoded[0].clone().into_address().unwrap_or_default();
            let amount = decoded[1].clone().into_uint().unwrap_or_default();

            let balance = state.token_balances.entry((to, sender)).or_default();
            if *balance >= amount {
                *balance -= amount;
                *state.token_balances.entry((to, recipient)).or_default() += amount;
            }
        }

        state.sent.push((request, sender));
        Ok(H256::from(keccak256(raw.as_ref())))
    }
}
