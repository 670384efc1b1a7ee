//! JSON-RPC over HTTP provider
//!
//! Stands in for the injected wallet when running outside a browser, e.g.
//! against a development node with unlocked accounts or the `rpc-mock` server.
//! HTTP cannot push events, so [`HttpProvider::poll`] diffs accounts and
//! chain id against the previous observation and fires listeners itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use alloy_json_rpc::{Id, Request, Response, ResponsePayload};
use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::{
    parse_accounts, EventHandler, Eip1193Provider, ListenerId, ListenerSet, ProviderEvent,
    WalletEventKind,
};
use crate::constants::{
    ERROR_CODE_DISCONNECTED, METHOD_ACCOUNTS, METHOD_CHAIN_ID, METHOD_REQUEST_ACCOUNTS,
};
use crate::error::ProviderError;

/// Last state seen by [`HttpProvider::poll`]
#[derive(Debug, Default)]
struct Observed {
    accounts: Option<Vec<Address>>,
    chain_id: Option<String>,
    reachable: Option<bool>,
}

pub struct HttpProvider {
    url: String,
    /// reqwest::Client is internally Arc-based
    client: reqwest::Client,
    next_id: AtomicU64,
    listeners: ListenerSet,
    observed: Mutex<Observed>,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
            listeners: ListenerSet::new(),
            observed: Mutex::new(Observed::default()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let params = match params {
            Value::Null => json!([]),
            other => other,
        };
        let id = Id::from(self.next_id.fetch_add(1, Ordering::Relaxed));
        let body = Request::new(method.to_string(), id, params);

        log::debug!("→ {} {}", self.url, method);
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(ERROR_CODE_DISCONNECTED, format!("RPC unreachable: {}", e))
            })?;

        let status = response.status();
        let parsed: Response<Value, Value> = response.json().await.map_err(|e| {
            ProviderError::internal(format!("Invalid JSON-RPC response (HTTP {}): {}", status, e))
        })?;
        into_result(parsed)
    }

    /// Compare accounts and chain id against the last poll and emit the differences
    ///
    /// Returns the events that were emitted. The first successful poll only
    /// records a baseline (plus `connect`).
    pub async fn poll(&self) -> Vec<ProviderEvent> {
        let accounts = self
            .send(METHOD_ACCOUNTS, json!([]))
            .await
            .and_then(|v| parse_accounts(&v));
        let chain_id = self
            .send(METHOD_CHAIN_ID, json!([]))
            .await
            .map(|v| v.as_str().unwrap_or_default().to_string());

        let mut events = Vec::new();
        {
            let mut observed = self
                .observed
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            match (accounts, chain_id) {
                (Ok(accounts), Ok(chain_id)) => {
                    if observed.reachable != Some(true) {
                        events.push(ProviderEvent::Connect {
                            chain_id: chain_id.clone(),
                        });
                    }
                    if let Some(previous) = &observed.accounts {
                        if *previous != accounts {
                            events.push(ProviderEvent::AccountsChanged(accounts.clone()));
                        }
                    }
                    if let Some(previous) = &observed.chain_id {
                        if *previous != chain_id {
                            events.push(ProviderEvent::ChainChanged(chain_id.clone()));
                        }
                    }
                    observed.accounts = Some(accounts);
                    observed.chain_id = Some(chain_id);
                    observed.reachable = Some(true);
                }
                (Err(err), _) | (_, Err(err)) => {
                    if observed.reachable == Some(true) {
                        log::warn!("RPC endpoint {} became unreachable: {}", self.url, err);
                        events.push(ProviderEvent::Disconnect(Some(err)));
                    }
                    observed.reachable = Some(false);
                }
            }
        }

        for event in &events {
            self.listeners.emit(event);
        }
        events
    }
}

#[async_trait]
impl Eip1193Provider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        // Node-managed accounts are already authorized, there is no prompt to show
        let method = if method == METHOD_REQUEST_ACCOUNTS {
            METHOD_ACCOUNTS
        } else {
            method
        };
        self.send(method, params).await
    }

    fn on(&self, kind: WalletEventKind, handler: EventHandler) -> ListenerId {
        self.listeners.add(kind, handler)
    }

    fn remove_listener(&self, kind: WalletEventKind, id: ListenerId) -> bool {
        self.listeners.remove(kind, id)
    }
}

fn into_result(response: Response<Value, Value>) -> Result<Value, ProviderError> {
    match response.payload {
        ResponsePayload::Success(result) => Ok(result),
        ResponsePayload::Failure(err) => Err(ProviderError {
            code: err.code,
            message: err.message.into_owned(),
            data: err.data,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let body = Request::new("eth_chainId", Id::from(7), json!([]));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert_eq!(value["method"], "eth_chainId");
        assert_eq!(value["params"], json!([]));
    }

    #[test]
    fn test_error_response_keeps_code_and_data() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":4001,"message":"User rejected","data":{"reason":"popup closed"}}}"#;
        let parsed: Response<Value, Value> = serde_json::from_str(raw).unwrap();
        let err = into_result(parsed).unwrap_err();
        assert_eq!(err.code, 4001);
        assert_eq!(err.message, "User rejected");
        assert_eq!(err.data, Some(json!({ "reason": "popup closed" })));
    }

    #[test]
    fn test_null_result_is_success() {
        let raw = r#"{"jsonrpc":"2.0","id":2,"result":null}"#;
        let parsed: Response<Value, Value> = serde_json::from_str(raw).unwrap();
        assert_eq!(into_result(parsed).unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_provider_error() {
        let provider = HttpProvider::new("http://127.0.0.1:1");
        let err = provider
            .request(METHOD_CHAIN_ID, Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.code, ERROR_CODE_DISCONNECTED);
        // First poll against a dead endpoint records a baseline without events
        assert!(provider.poll().await.is_empty());
    }
}
