//! Account-bound signer over an EIP-1193 provider
//!
//! Mirrors what a browser dapp gets from an ethers `JsonRpcSigner`: the
//! selected account, network lookup, native balance, `eth_call` and
//! transaction submission with receipt polling.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
pub use alloy_rpc_types_eth::{Log, TransactionReceipt};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ReceiptPolling;
use crate::constants::{
    network_name, parse_chain_id, METHOD_ACCOUNTS, METHOD_CALL, METHOD_CHAIN_ID,
    METHOD_GET_BALANCE, METHOD_GET_RECEIPT, METHOD_SEND_TRANSACTION, UNKNOWN_NETWORK,
};
use crate::error::{Result, Web3Error};
use crate::provider::{parse_accounts, Eip1193Provider};
use crate::registry::NetworkInfo;
use crate::units::format_ether_4;

/// `eth_call` against the latest block, optionally from an account
pub async fn provider_call(
    provider: &dyn Eip1193Provider,
    from: Option<Address>,
    to: Address,
    data: Bytes,
) -> Result<Bytes> {
    let mut tx = json!({ "to": to, "data": data });
    if let Some(from) = from {
        tx["from"] = json!(from);
    }
    let raw = provider.request(METHOD_CALL, json!([tx, "latest"])).await?;
    decode(raw, "eth_call")
}

/// Resolve the provider's chain into a named network
pub async fn provider_network(provider: &dyn Eip1193Provider) -> Result<NetworkInfo> {
    let raw = provider.request(METHOD_CHAIN_ID, json!([])).await?;
    let chain_id = raw
        .as_str()
        .and_then(parse_chain_id)
        .or_else(|| raw.as_u64())
        .ok_or_else(|| Web3Error::invalid_response(format!("eth_chainId returned {}", raw)))?;

    Ok(NetworkInfo {
        name: network_name(chain_id).unwrap_or(UNKNOWN_NETWORK).to_string(),
        chain_id,
    })
}

fn decode<T: for<'de> Deserialize<'de>>(raw: Value, method: &str) -> Result<T> {
    serde_json::from_value(raw)
        .map_err(|e| Web3Error::invalid_response(format!("{}: {}", method, e)))
}

#[derive(Clone)]
pub struct WalletSigner {
    provider: Arc<dyn Eip1193Provider>,
    address: Address,
    receipts: ReceiptPolling,
}

impl fmt::Debug for WalletSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSigner")
            .field("address", &self.address)
            .field("receipts", &self.receipts)
            .finish_non_exhaustive()
    }
}

impl WalletSigner {
    pub fn new(provider: Arc<dyn Eip1193Provider>, address: Address, receipts: ReceiptPolling) -> Self {
        Self {
            provider,
            address,
            receipts,
        }
    }

    /// Same provider, different account
    pub fn with_address(&self, address: Address) -> Self {
        Self {
            provider: self.provider.clone(),
            address,
            receipts: self.receipts,
        }
    }

    pub fn provider(&self) -> &Arc<dyn Eip1193Provider> {
        &self.provider
    }

    /// The account this signer was built for, without asking the wallet
    pub fn cached_address(&self) -> Address {
        self.address
    }

    /// The signer's account, verified against the wallet's authorized accounts
    ///
    /// Fails once the wallet stops exposing the account (locked, permission
    /// revoked, extension reloaded).
    pub async fn address(&self) -> Result<Address> {
        let raw = self.provider.request(METHOD_ACCOUNTS, json!([])).await?;
        let accounts = parse_accounts(&raw)?;
        if accounts.contains(&self.address) {
            Ok(self.address)
        } else {
            Err(Web3Error::NotConnected(format!(
                "account {} is no longer authorized",
                self.address
            )))
        }
    }

    pub async fn network(&self) -> Result<NetworkInfo> {
        provider_network(self.provider.as_ref()).await
    }

    pub async fn balance_wei(&self) -> Result<U256> {
        let raw = self
            .provider
            .request(METHOD_GET_BALANCE, json!([self.address, "latest"]))
            .await?;
        decode(raw, "eth_getBalance")
    }

    /// Native balance in ether with 4 decimals, "0" when it cannot be read
    pub async fn balance(&self) -> String {
        match self.balance_wei().await {
            Ok(wei) => format_ether_4(wei),
            Err(e) => {
                log::error!("Error getting balance: {}", e);
                "0".to_string()
            }
        }
    }

    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        provider_call(self.provider.as_ref(), Some(self.address), to, data).await
    }

    pub async fn send_transaction(&self, to: Address, data: Bytes, value: U256) -> Result<B256> {
        let mut tx = json!({ "from": self.address, "to": to, "data": data });
        if !value.is_zero() {
            tx["value"] = json!(value);
        }
        let raw = self
            .provider
            .request(METHOD_SEND_TRANSACTION, json!([tx]))
            .await?;
        let hash: B256 = decode(raw, "eth_sendTransaction")?;
        log::info!("📤 Transaction submitted: {}", hash);
        Ok(hash)
    }

    /// Poll for the receipt until mined
    ///
    /// Without an attempt budget this waits as long as the transaction stays
    /// pending.
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let raw = self
                .provider
                .request(METHOD_GET_RECEIPT, json!([hash]))
                .await?;

            if !raw.is_null() {
                let receipt: TransactionReceipt = decode(raw, "eth_getTransactionReceipt")?;
                if !receipt.inner.status() {
                    log::warn!("❌ Transaction {} reverted", hash);
                    return Err(Web3Error::TransactionReverted(hash.to_string()));
                }
                log::info!("✅ Transaction {} confirmed (attempt {})", hash, attempt);
                return Ok(receipt);
            }

            if let Some(max_attempts) = self.receipts.max_attempts {
                if attempt >= max_attempts {
                    return Err(Web3Error::ReceiptTimeout {
                        hash: hash.to_string(),
                        attempts: max_attempts,
                    });
                }
            }

            log::debug!("Receipt for {} not available yet (attempt {})", hash, attempt);
            tokio::time::sleep(self.receipts.interval).await;
        }
    }

    /// Send and wait for confirmation
    pub async fn transact(&self, to: Address, data: Bytes, value: U256) -> Result<TransactionReceipt> {
        let hash = self.send_transaction(to, data, value).await?;
        self.wait_for_receipt(hash).await
    }
}
