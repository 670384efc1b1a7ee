//! Provider registry: the single active wallet session
//!
//! Holds the provider, signer, address, network and provider-type tag of the
//! current connection. The address lives inside the session, and a session
//! exists only while the status is `Connected`, so "address present iff
//! connected" holds by construction.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use alloy_primitives::Address;
use serde::Serialize;

use crate::provider::Eip1193Provider;
use crate::signer::WalletSigner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub name: String,
    pub chain_id: u64,
}

/// Snapshot of the connection as seen by the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub address: Option<Address>,
    pub provider_type: Option<String>,
    pub network_info: Option<NetworkInfo>,
}

impl ConnectionState {
    fn disconnected(status: ConnectionStatus) -> Self {
        Self {
            status,
            address: None,
            provider_type: None,
            network_info: None,
        }
    }
}

/// Live handles of a connected wallet
#[derive(Clone)]
pub struct ActiveSession {
    pub provider: Arc<dyn Eip1193Provider>,
    pub signer: WalletSigner,
    pub network_info: NetworkInfo,
    pub provider_type: String,
}

impl ActiveSession {
    pub fn address(&self) -> Address {
        self.signer.cached_address()
    }
}

enum RegistryState {
    Idle(ConnectionStatus),
    Connected(ActiveSession),
}

pub struct ProviderRegistry {
    state: RwLock<RegistryState>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::Idle(ConnectionStatus::Disconnected)),
        }
    }

    pub fn state(&self) -> ConnectionState {
        match &*self.read() {
            RegistryState::Idle(status) => ConnectionState::disconnected(*status),
            RegistryState::Connected(session) => ConnectionState {
                status: ConnectionStatus::Connected,
                address: Some(session.address()),
                provider_type: Some(session.provider_type.clone()),
                network_info: Some(session.network_info.clone()),
            },
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        match &*self.read() {
            RegistryState::Idle(status) => *status,
            RegistryState::Connected(_) => ConnectionStatus::Connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(&*self.read(), RegistryState::Connected(_))
    }

    pub fn session(&self) -> Option<ActiveSession> {
        match &*self.read() {
            RegistryState::Connected(session) => Some(session.clone()),
            RegistryState::Idle(_) => None,
        }
    }

    pub fn provider(&self) -> Option<Arc<dyn Eip1193Provider>> {
        self.session().map(|s| s.provider)
    }

    pub fn signer(&self) -> Option<WalletSigner> {
        self.session().map(|s| s.signer)
    }

    pub fn address(&self) -> Option<Address> {
        self.session().map(|s| s.address())
    }

    pub fn network_info(&self) -> Option<NetworkInfo> {
        self.session().map(|s| s.network_info)
    }

    pub fn provider_type(&self) -> Option<String> {
        self.session().map(|s| s.provider_type)
    }

    pub fn set_connected(&self, session: ActiveSession) {
        log::debug!(
            "Registry: connected {} via {} on {}",
            session.address(),
            session.provider_type,
            session.network_info.name
        );
        *self.write() = RegistryState::Connected(session);
    }

    /// Enter `Connecting`, dropping any previous session
    pub fn begin_connecting(&self) {
        *self.write() = RegistryState::Idle(ConnectionStatus::Connecting);
    }

    /// Enter `Error`, dropping any session
    pub fn mark_error(&self) {
        *self.write() = RegistryState::Idle(ConnectionStatus::Error);
    }

    /// Back to `Disconnected` with nothing cached
    pub fn reset(&self) {
        *self.write() = RegistryState::Idle(ConnectionStatus::Disconnected);
    }

    /// Switch the active account, rebuilding the signer for it
    ///
    /// Returns the new signer, or `None` when no session is active.
    pub fn update_address(&self, address: Address) -> Option<WalletSigner> {
        let mut state = self.write();
        match &mut *state {
            RegistryState::Connected(session) => {
                session.signer = session.signer.with_address(address);
                Some(session.signer.clone())
            }
            RegistryState::Idle(_) => None,
        }
    }

    pub fn update_network(&self, network_info: NetworkInfo) -> bool {
        match &mut *self.write() {
            RegistryState::Connected(session) => {
                session.network_info = network_info;
                true
            }
            RegistryState::Idle(_) => false,
        }
    }

    // Poisoned locks are recovered; the state is always fully written
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
