//! Connection manager: connect, silent reconnect, disconnect and wallet events
//!
//! Status transitions:
//!
//! ```text
//! DISCONNECTED -> CONNECTING -> CONNECTED | ERROR
//! CONNECTED    -> DISCONNECTED   (explicit disconnect, zero accounts, provider disconnect)
//! ERROR        -> CONNECTING     (retry)
//! ```
//!
//! Every session change goes through [`ConnectionManager::establish_session`]
//! or [`ConnectionManager::teardown`], which keep the registry, the contract
//! handles and the installed listeners in step.

use std::sync::Arc;

use alloy_primitives::Address;
use serde_json::json;
use tokio::sync::broadcast;

use crate::config::Web3Config;
use crate::constants::{METHOD_ACCOUNTS, METHOD_REQUEST_ACCOUNTS};
use crate::contracts::{ContractRunner, ContractService};
use crate::detector::{detect_wallets, BrowserEnvironment, DetectedWallet, WALLET_WALLETCONNECT};
use crate::error::ConnectError;
use crate::events::{EventManager, WalletSignal};
use crate::notify::{Navigator, Notification, Notifier};
use crate::provider::{parse_accounts, provider_type, select_provider, Eip1193Provider, ProviderEvent};
use crate::registry::{ActiveSession, ConnectionState, NetworkInfo, ProviderRegistry};
use crate::signer::WalletSigner;

const SIGNAL_CAPACITY: usize = 32;

pub struct ConnectionManager {
    env: BrowserEnvironment,
    config: Web3Config,
    registry: Arc<ProviderRegistry>,
    contracts: Arc<ContractService>,
    events: EventManager,
    signals: broadcast::Sender<WalletSignal>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl ConnectionManager {
    pub fn new(
        env: BrowserEnvironment,
        config: Web3Config,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            contracts: Arc::new(ContractService::new(config.contracts.clone())),
            registry: Arc::new(ProviderRegistry::new()),
            events: EventManager::new(),
            env,
            config,
            signals,
            notifier,
            navigator,
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn contracts(&self) -> &Arc<ContractService> {
        &self.contracts
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn config(&self) -> &Web3Config {
        &self.config
    }

    pub fn environment(&self) -> &BrowserEnvironment {
        &self.env
    }

    pub fn events(&self) -> &EventManager {
        &self.events
    }

    pub fn state(&self) -> ConnectionState {
        self.registry.state()
    }

    /// Receive connected / disconnected / account / chain signals
    pub fn subscribe(&self) -> broadcast::Receiver<WalletSignal> {
        self.signals.subscribe()
    }

    pub fn detect_wallets(&self) -> Vec<DetectedWallet> {
        detect_wallets(&self.env)
    }

    /// Reconnect on startup to a wallet that already authorized this site
    ///
    /// Never prompts the user. Returns false, without touching any state,
    /// when there is no wallet or no authorized account.
    pub async fn initialize(&self) -> bool {
        log::info!("🔄 Checking for an authorized wallet...");
        self.try_silent_connect().await
    }

    /// Same as [`initialize`](Self::initialize); safe to call at any time,
    /// including when no wallet object exists
    pub async fn try_silent_connect(&self) -> bool {
        match self.silent_connect().await {
            Ok(Some(address)) => {
                log::info!("✅ Reconnected to {}", address);
                true
            }
            Ok(None) => {
                log::debug!("No previously authorized wallet");
                false
            }
            Err(e) => {
                log::warn!("⚠️  Silent reconnect failed: {}", e);
                false
            }
        }
    }

    async fn silent_connect(&self) -> Result<Option<Address>, ConnectError> {
        let Some(ethereum) = &self.env.ethereum else {
            return Ok(None);
        };
        let provider = select_provider(ethereum)?;
        let accounts = parse_accounts(&provider.request(METHOD_ACCOUNTS, json!([])).await?)?;
        let Some(&address) = accounts.first() else {
            return Ok(None);
        };
        self.establish_session(provider, address).await?;
        Ok(Some(address))
    }

    /// User-initiated connect
    ///
    /// # Returns
    ///
    /// * `Ok(Some(address))` - connected
    /// * `Ok(None)` - no wallet on a mobile device, the user was sent to the wallet app
    /// * `Err(_)` - the attempt failed; the status is `Error` and the user was notified
    pub async fn connect_wallet(
        &self,
        wallet_id: &str,
    ) -> Result<Option<Address>, ConnectError> {
        log::info!("🔌 Connecting wallet: {}", wallet_id);

        let Some(ethereum) = self.env.ethereum.clone() else {
            if let Some(link) = self.env.deep_link() {
                log::info!("📱 No injected wallet, opening the wallet app");
                self.notifier.notify(Notification::info(
                    "Opening Mobile Wallet",
                    "Please open your wallet app and connect to this site.",
                ));
                self.navigator.open(&link);
                return Ok(None);
            }
            return Err(self.fail(ConnectError::NoProvider));
        };

        if wallet_id == WALLET_WALLETCONNECT {
            log::debug!("WalletConnect sessions are not supported, using the injected provider");
        }

        // A new attempt supersedes whatever session was active
        self.events.remove();
        self.contracts.reset_contracts();
        self.registry.begin_connecting();

        let provider = select_provider(&ethereum).map_err(|e| self.fail(e))?;

        self.notifier.notify(Notification::info(
            "Connecting Wallet",
            "Please approve the connection request in your wallet.",
        ));

        // The timer is dropped together with the request once either settles
        let timeout = self.config.connect_timeout;
        let response = tokio::time::timeout(
            timeout,
            provider.request(METHOD_REQUEST_ACCOUNTS, json!([])),
        )
        .await
        .map_err(|_| self.fail(ConnectError::Timeout(timeout)))?
        .map_err(|e| self.fail(e.into()))?;

        let accounts = parse_accounts(&response).map_err(|e| self.fail(e.into()))?;
        let Some(&address) = accounts.first() else {
            return Err(self.fail(ConnectError::NoAccounts));
        };

        self.establish_session(provider, address)
            .await
            .map_err(|e| self.fail(e))?;

        self.notifier.notify(Notification::info(
            "Wallet Connected",
            "Your wallet has been successfully connected.",
        ));
        Ok(Some(address))
    }

    /// Disconnect and notify; calling it while disconnected is harmless
    pub fn disconnect_wallet(&self) {
        log::info!("🔌 Disconnecting wallet");
        self.teardown();
        self.notifier.notify(Notification::info(
            "Wallet Disconnected",
            "Your wallet has been disconnected.",
        ));
    }

    /// True only if the cached signer still resolves its account
    ///
    /// A stale signer triggers one silent reconnect; if that fails too the
    /// session is torn down.
    pub async fn is_wallet_connected(&self) -> bool {
        let Some(signer) = self.registry.signer() else {
            return self.try_silent_connect().await;
        };

        match signer.address().await {
            Ok(_) => true,
            Err(e) => {
                log::warn!("⚠️  Cached signer is stale ({}), reconnecting", e);
                if self.try_silent_connect().await {
                    true
                } else {
                    self.teardown();
                    false
                }
            }
        }
    }

    /// Network reported by the wallet right now, or the cached one if the query fails
    pub async fn get_network(&self) -> Option<NetworkInfo> {
        let signer = self.registry.signer()?;
        match signer.network().await {
            Ok(network) => Some(network),
            Err(e) => {
                log::error!("Error getting network: {}", e);
                self.registry.network_info()
            }
        }
    }

    /// Native balance in ether with 4 decimals, "0" when unavailable
    pub async fn get_balance(&self) -> String {
        match self.registry.signer() {
            Some(signer) => signer.balance().await,
            None => "0".to_string(),
        }
    }

    /// Apply every wallet event queued so far; returns how many were handled
    pub async fn process_pending_events(&self) -> usize {
        let events = self.events.drain().await;
        let count = events.len();
        for event in events {
            self.handle_event(event).await;
        }
        count
    }

    /// Apply wallet events as they arrive, until the manager is dropped
    ///
    /// While this runs it owns the event queue, so
    /// [`process_pending_events`](Self::process_pending_events) waits for it.
    pub async fn run_event_loop(&self) {
        while let Some(event) = self.events.next_event().await {
            self.handle_event(event).await;
        }
    }

    pub async fn handle_event(&self, event: ProviderEvent) {
        log::debug!("Wallet event: {}", event.kind());
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    log::info!("🔒 Wallet locked or all accounts disconnected");
                    self.teardown();
                    self.notifier.notify(Notification::info(
                        "Wallet Disconnected",
                        "Your wallet has been locked or disconnected.",
                    ));
                }
                Some(&address) => self.on_account_changed(address).await,
            },
            ProviderEvent::ChainChanged(chain_id) => self.on_chain_changed(&chain_id).await,
            ProviderEvent::Connect { chain_id } => {
                log::info!("Wallet connected to chain {}", chain_id);
                self.notifier.notify(Notification::info(
                    "Wallet Connected",
                    "Your wallet is now connected to the network.",
                ));
            }
            ProviderEvent::Disconnect(error) => {
                if let Some(error) = error {
                    log::warn!("Provider disconnected: {}", error);
                }
                self.teardown();
                self.notifier.notify(Notification::info(
                    "Wallet Disconnected",
                    "Your wallet has been disconnected from this site.",
                ));
            }
        }
    }

    async fn on_account_changed(&self, address: Address) {
        log::info!("👤 Active account changed to {}", address);

        let Some(signer) = self.registry.update_address(address) else {
            log::debug!("No active session, ignoring account change");
            return;
        };
        self.contracts
            .initialize_contracts(ContractRunner::Signer(signer));

        let _ = self.signals.send(WalletSignal::AccountChanged(address));
        self.notifier.notify(Notification::info(
            "Account Changed",
            "Your active wallet account has changed.",
        ));
    }

    /// Refresh the cached network without restarting the session
    async fn on_chain_changed(&self, raw_chain_id: &str) {
        let Some(signer) = self.registry.signer() else {
            log::debug!("No active session, ignoring chain change to {}", raw_chain_id);
            return;
        };

        match signer.network().await {
            Ok(network) => {
                if !self.registry.update_network(network.clone()) {
                    log::debug!("Session ended before chain {} was applied", network.chain_id);
                    return;
                }
                log::info!("🌐 Network changed to {} ({})", network.name, network.chain_id);
                self.notifier.notify(Notification::info(
                    "Network Changed",
                    format!("Connected to {}", network.name),
                ));
                let _ = self.signals.send(WalletSignal::ChainChanged(network));
            }
            Err(e) => {
                log::error!("Error handling chain change: {}", e);
                self.notifier.notify(Notification::error(
                    "Network Change Error",
                    "Failed to update network information",
                ));
            }
        }
    }

    /// Make `address` on `provider` the active session
    async fn establish_session(
        &self,
        provider: Arc<dyn Eip1193Provider>,
        address: Address,
    ) -> Result<(), ConnectError> {
        let signer = WalletSigner::new(provider.clone(), address, self.config.receipts);
        let network_info = signer
            .network()
            .await
            .map_err(|e| ConnectError::Session(e.to_string()))?;

        self.registry.set_connected(ActiveSession {
            provider: provider.clone(),
            signer: signer.clone(),
            network_info,
            provider_type: provider_type(provider.as_ref()).to_string(),
        });
        self.contracts
            .initialize_contracts(ContractRunner::Signer(signer));
        self.events.install(&provider);

        let _ = self.signals.send(WalletSignal::Connected(address));
        Ok(())
    }

    /// Drop the session, its contract handles and its listeners
    fn teardown(&self) {
        self.events.remove();
        self.contracts.reset_contracts();
        self.registry.reset();
        let _ = self.signals.send(WalletSignal::Disconnected);
    }

    /// Record a failed connect attempt: status `Error` plus a specific notification
    fn fail(&self, err: ConnectError) -> ConnectError {
        log::error!("❌ Wallet connection failed: {}", err);
        self.registry.mark_error();

        let (title, description) = match &err {
            ConnectError::NoProvider => (
                "No Wallet Found",
                "Please install MetaMask or another Web3 wallet to continue.".to_string(),
            ),
            ConnectError::InvalidProvider => (
                "Incompatible Wallet",
                "Your wallet doesn't support the required methods. Please try a different wallet."
                    .to_string(),
            ),
            ConnectError::UserRejected => (
                "Connection Cancelled",
                "You declined the connection request. Please try again when ready.".to_string(),
            ),
            ConnectError::AlreadyPending => (
                "Connection Pending",
                "A connection request is already pending. Please check your wallet extension."
                    .to_string(),
            ),
            ConnectError::Timeout(_) => (
                "Connection Timeout",
                "Connection request timed out. Please check your wallet extension.".to_string(),
            ),
            ConnectError::NoAccounts => (
                "No Accounts Found",
                "Please unlock your wallet and try again.".to_string(),
            ),
            ConnectError::Provider(e) if !e.message.trim().is_empty() => {
                ("Connection Failed", e.message.clone())
            }
            ConnectError::Provider(_) => {
                ("Connection Failed", "Could not connect to wallet".to_string())
            }
            ConnectError::Session(message) => ("Connection Failed", message.clone()),
        };
        self.notifier.notify(Notification::error(title, description));
        err
    }
}
