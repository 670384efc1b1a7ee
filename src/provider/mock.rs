//! Scriptable in-memory wallet
//!
//! Behaves like an injected browser extension: accounts become visible to
//! `eth_accounts` only after authorization, `eth_requestAccounts` can approve,
//! reject, report a pending request or hang, and events are emitted on demand.
//! Contract reads and transactions are answered by handlers registered per
//! 4-byte selector, which is where demo data lives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use alloy_consensus::{Eip658Value, Receipt, ReceiptEnvelope};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rpc_types_eth::{Log, TransactionReceipt};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::{
    Capability, EventHandler, Eip1193Provider, ListenerId, ListenerSet, ProviderEvent,
    WalletEventKind,
};
use crate::constants::*;
use crate::error::ProviderError;

const MOCK_GAS_USED: u64 = 21_000;
const MOCK_GAS_PRICE: u128 = 1_000_000_000;

/// How the wallet answers `eth_requestAccounts`
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectBehavior {
    Approve,
    Reject,
    AlreadyPending,
    /// Never answer, like a popup the user ignores
    Hang,
    Fail(String),
}

/// A transaction received through `eth_sendTransaction`
#[derive(Debug, Clone, PartialEq)]
pub struct SentTransaction {
    pub hash: B256,
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl SentTransaction {
    pub fn selector(&self) -> Option<[u8; 4]> {
        selector_of(&self.data)
    }
}

/// A log entry placed in a mock receipt
#[derive(Debug, Clone, PartialEq)]
pub struct MockLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Outcome of a mined mock transaction
#[derive(Debug, Clone, PartialEq)]
pub enum TxOutcome {
    Success(Vec<MockLog>),
    Revert,
    /// Rejected before being mined
    Fail(ProviderError),
}

type CallHandler = Arc<dyn Fn(&[u8]) -> Result<Bytes, ProviderError> + Send + Sync>;
type TxHandler = Arc<dyn Fn(&SentTransaction) -> TxOutcome + Send + Sync>;

struct MockState {
    accounts: Vec<Address>,
    authorized: bool,
    chain_id: u64,
    balance: U256,
    connect_behavior: ConnectBehavior,
    call_handlers: HashMap<[u8; 4], CallHandler>,
    tx_handlers: HashMap<[u8; 4], TxHandler>,
    transactions: Vec<SentTransaction>,
    receipts: HashMap<B256, Value>,
    /// Receipt lookups answered with `null` before a transaction shows as mined
    pending_polls: u32,
    receipt_polls: HashMap<B256, u32>,
    requests: Vec<String>,
}

pub struct MockWallet {
    state: Mutex<MockState>,
    listeners: ListenerSet,
    metamask: bool,
    coinbase: bool,
    missing: Vec<Capability>,
    providers: Vec<Arc<dyn Eip1193Provider>>,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWallet {
    /// Unbranded wallet on Ethereum mainnet with no accounts
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                accounts: Vec::new(),
                authorized: false,
                chain_id: 1,
                balance: U256::ZERO,
                connect_behavior: ConnectBehavior::Approve,
                call_handlers: HashMap::new(),
                tx_handlers: HashMap::new(),
                transactions: Vec::new(),
                receipts: HashMap::new(),
                pending_polls: 0,
                receipt_polls: HashMap::new(),
                requests: Vec::new(),
            }),
            listeners: ListenerSet::new(),
            metamask: false,
            coinbase: false,
            missing: Vec::new(),
            providers: Vec::new(),
        }
    }

    pub fn metamask() -> Self {
        Self {
            metamask: true,
            ..Self::new()
        }
    }

    pub fn coinbase() -> Self {
        Self {
            coinbase: true,
            ..Self::new()
        }
    }

    /// Simulate a vendor object lacking one of the required methods
    pub fn without_capability(mut self, capability: Capability) -> Self {
        self.missing.push(capability);
        self
    }

    /// Expose several injected providers under this object
    pub fn with_providers(mut self, providers: Vec<Arc<dyn Eip1193Provider>>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        self.set_accounts(accounts);
        self
    }

    /// Accounts already authorized for this site (silent reconnect succeeds)
    pub fn pre_authorized(self) -> Self {
        self.state().authorized = true;
        self
    }

    pub fn with_chain_id(self, chain_id: u64) -> Self {
        self.state().chain_id = chain_id;
        self
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state().accounts = accounts;
    }

    pub fn set_connect_behavior(&self, behavior: ConnectBehavior) {
        self.state().connect_behavior = behavior;
    }

    pub fn set_balance(&self, balance: U256) {
        self.state().balance = balance;
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state().chain_id = chain_id;
    }

    /// Site permission revoked, e.g. after an extension reload
    pub fn revoke(&self) {
        self.state().authorized = false;
    }

    pub fn is_authorized(&self) -> bool {
        self.state().authorized
    }

    /// Keep new transactions pending for `polls` receipt lookups
    pub fn set_pending_polls(&self, polls: u32) {
        self.state().pending_polls = polls;
    }

    /// Answer `eth_call` for a selector; the handler receives the full calldata
    pub fn on_call<F>(&self, selector: [u8; 4], handler: F)
    where
        F: Fn(&[u8]) -> Result<Bytes, ProviderError> + Send + Sync + 'static,
    {
        self.state().call_handlers.insert(selector, Arc::new(handler));
    }

    /// Decide the outcome of transactions calling a selector (default: success, no logs)
    pub fn on_transaction<F>(&self, selector: [u8; 4], handler: F)
    where
        F: Fn(&SentTransaction) -> TxOutcome + Send + Sync + 'static,
    {
        self.state().tx_handlers.insert(selector, Arc::new(handler));
    }

    pub fn sent_transactions(&self) -> Vec<SentTransaction> {
        self.state().transactions.clone()
    }

    /// Methods received through `request`, in order
    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    pub fn request_count(&self, method: &str) -> usize {
        self.state().requests.iter().filter(|m| *m == method).count()
    }

    pub fn listener_count(&self, kind: WalletEventKind) -> usize {
        self.listeners.count(kind)
    }

    /// Fire a wallet event, updating internal state the way a real wallet would
    pub fn emit(&self, event: ProviderEvent) -> usize {
        {
            let mut state = self.state();
            match &event {
                ProviderEvent::AccountsChanged(accounts) => {
                    state.authorized = !accounts.is_empty();
                    state.accounts = accounts.clone();
                }
                ProviderEvent::ChainChanged(chain_id) => {
                    if let Some(id) = parse_chain_id(chain_id) {
                        state.chain_id = id;
                    }
                }
                ProviderEvent::Connect { .. } | ProviderEvent::Disconnect(_) => {}
            }
        }
        self.listeners.emit(&event)
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn visible_accounts(state: &MockState) -> Value {
        if state.authorized {
            json!(state.accounts)
        } else {
            json!([])
        }
    }

    fn call(&self, params: &Value) -> Result<Value, ProviderError> {
        let data = tx_field_bytes(params, "data")?;
        let selector = selector_of(&data)
            .ok_or_else(|| ProviderError::new(-32602, "eth_call without selector"))?;
        let handler = self
            .state()
            .call_handlers
            .get(&selector)
            .cloned()
            .ok_or_else(|| ProviderError::new(-32000, "execution reverted"))?;
        let output = handler(&data)?;
        Ok(json!(output))
    }

    fn send_transaction(&self, params: &Value) -> Result<Value, ProviderError> {
        let from = tx_field_address(params, "from")?;
        let to = tx_field_address(params, "to")?;
        let data = tx_field_bytes(params, "data")?;
        let value = tx_field_u256(params, "value")?;

        let mut state = self.state();
        if !state.authorized || !state.accounts.contains(&from) {
            return Err(ProviderError::new(
                ERROR_CODE_UNAUTHORIZED,
                "The requested account has not been authorized by the user.",
            ));
        }

        let nonce = state.transactions.len() as u64 + 1;
        let hash = B256::left_padding_from(&nonce.to_be_bytes());
        let tx = SentTransaction {
            hash,
            from,
            to,
            data,
            value,
        };
        let outcome = tx
            .selector()
            .and_then(|s| state.tx_handlers.get(&s).cloned())
            .map(|handler| handler(&tx))
            .unwrap_or(TxOutcome::Success(Vec::new()));

        let (success, logs) = match outcome {
            TxOutcome::Fail(err) => return Err(err),
            TxOutcome::Revert => (false, Vec::new()),
            TxOutcome::Success(logs) => (true, logs),
        };
        let receipt = mined_receipt(&tx, nonce, success, logs);
        let receipt = serde_json::to_value(&receipt)
            .map_err(|e| ProviderError::internal(format!("receipt encoding: {}", e)))?;
        state.receipts.insert(hash, receipt);
        state.transactions.push(tx);
        Ok(json!(hash))
    }
}

#[async_trait]
impl Eip1193Provider for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let behavior = {
            let mut state = self.state();
            state.requests.push(method.to_string());
            state.connect_behavior.clone()
        };

        if method == METHOD_REQUEST_ACCOUNTS && behavior == ConnectBehavior::Hang {
            return std::future::pending::<Result<Value, ProviderError>>().await;
        }

        match method {
            METHOD_ACCOUNTS => Ok(Self::visible_accounts(&self.state())),
            METHOD_REQUEST_ACCOUNTS => match behavior {
                ConnectBehavior::Approve => {
                    let mut state = self.state();
                    state.authorized = true;
                    Ok(Self::visible_accounts(&state))
                }
                ConnectBehavior::Reject => Err(ProviderError::user_rejected()),
                ConnectBehavior::AlreadyPending => Err(ProviderError::already_pending()),
                ConnectBehavior::Hang => Err(ProviderError::internal("request abandoned")),
                ConnectBehavior::Fail(message) => Err(ProviderError::internal(message)),
            },
            METHOD_CHAIN_ID => Ok(json!(format!("{:#x}", self.state().chain_id))),
            METHOD_GET_BALANCE => Ok(json!(self.state().balance)),
            METHOD_CALL => self.call(&first_param(&params)),
            METHOD_SEND_TRANSACTION => self.send_transaction(&first_param(&params)),
            METHOD_GET_RECEIPT => {
                let hash: B256 = serde_json::from_value(first_param(&params))
                    .map_err(|e| ProviderError::new(-32602, e.to_string()))?;
                let mut state = self.state();
                let pending_polls = state.pending_polls;
                let polls = state.receipt_polls.entry(hash).or_insert(0);
                *polls += 1;
                if *polls <= pending_polls {
                    return Ok(Value::Null);
                }
                Ok(state.receipts.get(&hash).cloned().unwrap_or(Value::Null))
            }
            other => Err(ProviderError::new(
                -32601,
                format!("The method {} does not exist/is not available", other),
            )),
        }
    }

    fn on(&self, kind: WalletEventKind, handler: EventHandler) -> ListenerId {
        self.listeners.add(kind, handler)
    }

    fn remove_listener(&self, kind: WalletEventKind, id: ListenerId) -> bool {
        self.listeners.remove(kind, id)
    }

    fn supports(&self, capability: Capability) -> bool {
        !self.missing.contains(&capability)
    }

    fn is_metamask(&self) -> bool {
        self.metamask
    }

    fn is_coinbase_wallet(&self) -> bool {
        self.coinbase
    }

    fn providers(&self) -> Vec<Arc<dyn Eip1193Provider>> {
        self.providers.clone()
    }
}

/// Receipt of `tx` mined alone in block `block_number`
fn mined_receipt(
    tx: &SentTransaction,
    block_number: u64,
    success: bool,
    logs: Vec<MockLog>,
) -> TransactionReceipt {
    let block_hash = keccak256(block_number.to_be_bytes());
    let logs = logs
        .into_iter()
        .enumerate()
        .map(|(index, log)| Log {
            inner: alloy_primitives::Log::new_unchecked(log.address, log.topics, log.data),
            block_hash: Some(block_hash),
            block_number: Some(block_number),
            transaction_hash: Some(tx.hash),
            transaction_index: Some(0),
            log_index: Some(index as u64),
            ..Default::default()
        })
        .collect();
    let receipt = Receipt {
        status: Eip658Value::Eip658(success),
        cumulative_gas_used: MOCK_GAS_USED,
        logs,
    };

    TransactionReceipt {
        inner: ReceiptEnvelope::Eip1559(receipt.with_bloom()),
        transaction_hash: tx.hash,
        transaction_index: Some(0),
        block_hash: Some(block_hash),
        block_number: Some(block_number),
        gas_used: MOCK_GAS_USED,
        effective_gas_price: MOCK_GAS_PRICE,
        blob_gas_used: None,
        blob_gas_price: None,
        from: tx.from,
        to: Some(tx.to),
        contract_address: None,
    }
}

fn selector_of(data: &[u8]) -> Option<[u8; 4]> {
    data.get(..4).and_then(|s| s.try_into().ok())
}

fn first_param(params: &Value) -> Value {
    params.get(0).cloned().unwrap_or(Value::Null)
}

fn tx_field_bytes(tx: &Value, field: &str) -> Result<Bytes, ProviderError> {
    match tx.get(field) {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| ProviderError::new(-32602, format!("invalid {}: {}", field, e))),
        None => Ok(Bytes::new()),
    }
}

fn tx_field_address(tx: &Value, field: &str) -> Result<Address, ProviderError> {
    let v = tx
        .get(field)
        .ok_or_else(|| ProviderError::new(-32602, format!("missing {}", field)))?;
    serde_json::from_value(v.clone())
        .map_err(|e| ProviderError::new(-32602, format!("invalid {}: {}", field, e)))
}

fn tx_field_u256(tx: &Value, field: &str) -> Result<U256, ProviderError> {
    match tx.get(field) {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| ProviderError::new(-32602, format!("invalid {}: {}", field, e))),
        None => Ok(U256::ZERO),
    }
}
