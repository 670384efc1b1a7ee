//! Injected wallet provider boundary (EIP-1193)
//!
//! Wallet vendors inject objects of varying shape. Everything the rest of the
//! crate needs is captured by [`Eip1193Provider`]; conformance is checked once
//! at the boundary by [`validate_provider`] and non-conforming providers are
//! treated as absent.
//!
//! - `http` - JSON-RPC over HTTP for node-managed accounts
//! - `mock` - scriptable in-memory wallet for tests and demos
//! - `listeners` - listener bookkeeping shared by both

use std::fmt;
use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::Value;

use crate::constants::{
    EVENT_ACCOUNTS_CHANGED, EVENT_CHAIN_CHANGED, EVENT_CONNECT, EVENT_DISCONNECT,
};
use crate::error::{ConnectError, ProviderError};

pub mod http;
pub mod listeners;
pub mod mock;

pub use http::HttpProvider;
pub use listeners::ListenerSet;
pub use mock::{ConnectBehavior, MockLog, MockWallet, SentTransaction, TxOutcome};

/// Wallet-originated events the connection layer subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletEventKind {
    AccountsChanged,
    ChainChanged,
    Connect,
    Disconnect,
}

impl WalletEventKind {
    pub const ALL: [WalletEventKind; 4] = [
        WalletEventKind::AccountsChanged,
        WalletEventKind::ChainChanged,
        WalletEventKind::Disconnect,
        WalletEventKind::Connect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountsChanged => EVENT_ACCOUNTS_CHANGED,
            Self::ChainChanged => EVENT_CHAIN_CHANGED,
            Self::Connect => EVENT_CONNECT,
            Self::Disconnect => EVENT_DISCONNECT,
        }
    }
}

impl fmt::Display for WalletEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a wallet event
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    /// New chain id as reported by the wallet (hex string)
    ChainChanged(String),
    Connect { chain_id: String },
    Disconnect(Option<ProviderError>),
}

impl ProviderEvent {
    pub fn kind(&self) -> WalletEventKind {
        match self {
            Self::AccountsChanged(_) => WalletEventKind::AccountsChanged,
            Self::ChainChanged(_) => WalletEventKind::ChainChanged,
            Self::Connect { .. } => WalletEventKind::Connect,
            Self::Disconnect(_) => WalletEventKind::Disconnect,
        }
    }
}

pub type EventHandler = Arc<dyn Fn(&ProviderEvent) + Send + Sync>;

/// Handle returned by [`Eip1193Provider::on`], used to remove the listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// The three capabilities a provider must expose to be usable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Request,
    On,
    RemoveListener,
}

impl Capability {
    pub const REQUIRED: [Capability; 3] =
        [Capability::Request, Capability::On, Capability::RemoveListener];
}

/// EIP-1193 provider capability surface
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    /// JSON-RPC `request({method, params})`
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Subscribe to a wallet event
    fn on(&self, kind: WalletEventKind, handler: EventHandler) -> ListenerId;

    /// Unsubscribe; returns false if the listener was not registered
    fn remove_listener(&self, kind: WalletEventKind, id: ListenerId) -> bool;

    /// Whether the injected object actually exposes `capability`
    fn supports(&self, _capability: Capability) -> bool {
        true
    }

    fn is_metamask(&self) -> bool {
        false
    }

    fn is_coinbase_wallet(&self) -> bool {
        false
    }

    /// Sub-providers when several extensions inject under one namespace
    fn providers(&self) -> Vec<Arc<dyn Eip1193Provider>> {
        Vec::new()
    }
}

/// Check that a provider exposes request, on and removeListener
pub fn validate_provider(provider: &dyn Eip1193Provider) -> Result<(), ConnectError> {
    if Capability::REQUIRED.iter().all(|c| provider.supports(*c)) {
        Ok(())
    } else {
        Err(ConnectError::InvalidProvider)
    }
}

pub fn is_valid_provider(provider: &dyn Eip1193Provider) -> bool {
    validate_provider(provider).is_ok()
}

pub fn has_multiple_providers(provider: &dyn Eip1193Provider) -> bool {
    !provider.providers().is_empty()
}

/// Provider-type tag stored with the session
pub fn provider_type(provider: &dyn Eip1193Provider) -> &'static str {
    if provider.is_metamask() {
        "metamask"
    } else if provider.is_coinbase_wallet() {
        "coinbase"
    } else {
        "unknown"
    }
}

/// Pick the provider to talk to from the injected object
///
/// With several injected providers, a valid MetaMask provider wins, then the
/// first valid provider of any vendor. Whatever is picked must pass
/// [`validate_provider`].
pub fn select_provider(
    ethereum: &Arc<dyn Eip1193Provider>,
) -> Result<Arc<dyn Eip1193Provider>, ConnectError> {
    let providers = ethereum.providers();
    if !providers.is_empty() {
        log::debug!("Multiple providers detected: {}", providers.len());

        if let Some(metamask) = providers
            .iter()
            .find(|p| p.is_metamask() && is_valid_provider(p.as_ref()))
        {
            log::debug!("Using MetaMask provider");
            return Ok(metamask.clone());
        }

        if let Some(first) = providers.iter().find(|p| is_valid_provider(p.as_ref())) {
            log::debug!("Using alternative provider: {}", provider_type(first.as_ref()));
            return Ok(first.clone());
        }
    }

    validate_provider(ethereum.as_ref())?;
    Ok(ethereum.clone())
}

/// Parse the result of `eth_accounts` / `eth_requestAccounts`
pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, ProviderError> {
    serde_json::from_value(value.clone())
        .map_err(|e| ProviderError::internal(format!("Malformed accounts response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_prefers_metamask_among_multiple() {
        let coinbase: Arc<dyn Eip1193Provider> = Arc::new(MockWallet::coinbase());
        let metamask: Arc<dyn Eip1193Provider> = Arc::new(MockWallet::metamask());
        let ethereum: Arc<dyn Eip1193Provider> =
            Arc::new(MockWallet::new().with_providers(vec![coinbase, metamask]));

        let selected = select_provider(&ethereum).unwrap();
        assert_eq!(provider_type(selected.as_ref()), "metamask");
    }

    #[test]
    fn test_select_skips_invalid_metamask() {
        let broken: Arc<dyn Eip1193Provider> =
            Arc::new(MockWallet::metamask().without_capability(Capability::RemoveListener));
        let coinbase: Arc<dyn Eip1193Provider> = Arc::new(MockWallet::coinbase());
        let ethereum: Arc<dyn Eip1193Provider> =
            Arc::new(MockWallet::new().with_providers(vec![broken, coinbase]));

        let selected = select_provider(&ethereum).unwrap();
        assert_eq!(provider_type(selected.as_ref()), "coinbase");
    }

    #[test]
    fn test_provider_missing_capability_is_rejected() {
        let ethereum: Arc<dyn Eip1193Provider> =
            Arc::new(MockWallet::metamask().without_capability(Capability::On));
        assert_eq!(
            select_provider(&ethereum).err(),
            Some(ConnectError::InvalidProvider)
        );
    }
}
