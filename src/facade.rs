//! Single entry point for the UI
//!
//! [`Web3Service`] wires the connection manager, the domain services, the
//! session flag and the advisor around one shared registry and contract
//! service, and re-exposes their operations.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use tokio::sync::broadcast;

use crate::advisor::AdvisorClient;
use crate::config::Web3Config;
use crate::connection::ConnectionManager;
use crate::detector::{BrowserEnvironment, DetectedWallet};
use crate::error::ConnectError;
use crate::events::WalletSignal;
use crate::notify::{Navigator, Notifier};
use crate::registry::{ConnectionState, NetworkInfo};
use crate::services::{
    GovernanceService, Proposal, PropertyDetails, PropertyService, PropertyTokenService,
    ServiceContext,
};
use crate::session::SessionStore;

/// Shorten an address for display: `0x1234...abcd`
pub fn format_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

pub struct Web3Service {
    connection: Arc<ConnectionManager>,
    property: PropertyService,
    property_token: PropertyTokenService,
    governance: GovernanceService,
    advisor: AdvisorClient,
    session: SessionStore,
}

impl Web3Service {
    pub fn new(
        env: BrowserEnvironment,
        config: Web3Config,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let session = SessionStore::new_with_base_dir(config.session_dir.clone());
        let advisor = AdvisorClient::from_config(&config, notifier.clone());
        let scan_limit = config.proposal_scan_limit;
        let connection = Arc::new(ConnectionManager::new(env, config, notifier, navigator));

        let ctx = ServiceContext {
            contracts: connection.contracts().clone(),
            registry: connection.registry().clone(),
            notifier: connection.notifier().clone(),
            token: connection.config().token,
        };

        Self {
            property: PropertyService::new(ctx.clone()),
            property_token: PropertyTokenService::new(ctx.clone()),
            governance: GovernanceService::new(ctx, scan_limit),
            connection,
            advisor,
            session,
        }
    }

    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.connection
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // Wallet

    pub async fn initialize(&self) -> bool {
        let connected = self.connection.initialize().await;
        if connected {
            self.remember_authenticated(true);
        }
        connected
    }

    pub async fn try_silent_connect(&self) -> bool {
        self.connection.try_silent_connect().await
    }

    pub async fn connect_wallet(&self, wallet_id: &str) -> Result<Option<Address>, ConnectError> {
        let result = self.connection.connect_wallet(wallet_id).await;
        if let Ok(Some(_)) = result {
            self.remember_authenticated(true);
        }
        result
    }

    /// Disconnect and forget the persisted authentication flag
    pub fn disconnect_wallet(&self) {
        self.connection.disconnect_wallet();
        if let Err(e) = self.session.clear_authenticated() {
            log::warn!("⚠️  Failed to clear session flag: {}", e);
        }
    }

    pub async fn is_wallet_connected(&self) -> bool {
        self.connection.is_wallet_connected().await
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().unwrap_or_else(|e| {
            log::warn!("⚠️  Failed to read session flag: {}", e);
            false
        })
    }

    pub fn detect_wallets(&self) -> Vec<DetectedWallet> {
        self.connection.detect_wallets()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WalletSignal> {
        self.connection.subscribe()
    }

    pub fn address(&self) -> Option<Address> {
        self.connection.registry().address()
    }

    pub async fn get_network(&self) -> Option<NetworkInfo> {
        self.connection.get_network().await
    }

    pub async fn get_balance(&self) -> String {
        self.connection.get_balance().await
    }

    pub async fn process_pending_events(&self) -> usize {
        self.connection.process_pending_events().await
    }

    pub async fn run_event_loop(&self) {
        self.connection.run_event_loop().await
    }

    // Properties

    pub async fn get_property_details(&self, property_id: u64) -> Option<PropertyDetails> {
        self.property.get_property_details(property_id).await
    }

    /// Buy EquiX tokens of a property; `amount` is a token count, scaled by the token decimals
    pub async fn buy_property_tokens(&self, property_id: u64, amount: f64) -> bool {
        self.property.buy_property_tokens(property_id, amount).await
    }

    pub async fn create_property(
        &self,
        name: &str,
        property_type: &str,
        location: &str,
        value_usd: f64,
        metadata_uri: &str,
    ) -> Option<u64> {
        self.property
            .create_property(name, property_type, location, value_usd, metadata_uri)
            .await
    }

    pub async fn get_user_token_balance(&self, property_id: u64) -> f64 {
        self.property.get_user_token_balance(property_id).await
    }

    pub async fn distribute_rental_income(&self, property_id: u64, amount_usdc: f64) -> bool {
        self.property
            .distribute_rental_income(property_id, amount_usdc)
            .await
    }

    pub async fn claim_rental_income(&self, property_id: u64) -> bool {
        self.property.claim_rental_income(property_id).await
    }

    pub async fn create_auction(
        &self,
        property_id: u64,
        starting_price: f64,
        duration_days: u64,
    ) -> bool {
        self.property
            .create_auction(property_id, starting_price, duration_days)
            .await
    }

    pub async fn place_bid(&self, property_id: u64, bid_amount: f64) -> bool {
        self.property.place_bid(property_id, bid_amount).await
    }

    pub async fn end_auction(&self, property_id: u64) -> bool {
        self.property.end_auction(property_id).await
    }

    // Native-priced token sales

    pub async fn get_property_token_balance(&self, property_id: u64) -> U256 {
        self.property_token
            .get_property_token_balance(property_id)
            .await
    }

    /// Buy whole tokens paying `tokenPrice * amount` in the native currency
    pub async fn buy_tokens_with_native(&self, property_id: u64, amount: u64) -> bool {
        self.property_token
            .buy_property_tokens(property_id, amount)
            .await
    }

    pub async fn get_available_tokens(&self, property_id: u64) -> (U256, U256) {
        self.property_token.get_available_tokens(property_id).await
    }

    // Governance

    pub async fn get_governance_proposals(&self) -> Vec<Proposal> {
        self.governance.get_governance_proposals().await
    }

    pub async fn vote_on_proposal(&self, proposal_id: u64, support: bool) -> bool {
        self.governance.vote_on_proposal(proposal_id, support).await
    }

    pub async fn create_proposal(
        &self,
        property_id: u64,
        title: &str,
        description: &str,
        target: Option<Address>,
        call_data: Option<Bytes>,
    ) -> Option<u64> {
        self.governance
            .create_proposal(property_id, title, description, target, call_data)
            .await
    }

    pub async fn execute_proposal(&self, proposal_id: u64) -> bool {
        self.governance.execute_proposal(proposal_id).await
    }

    pub async fn cancel_proposal(&self, proposal_id: u64) -> bool {
        self.governance.cancel_proposal(proposal_id).await
    }

    // Advisor

    pub async fn ask_advisor(&self, question: &str) -> Option<String> {
        self.advisor.ask(question).await
    }

    pub fn advisor(&self) -> &AdvisorClient {
        &self.advisor
    }

    fn remember_authenticated(&self, authenticated: bool) {
        if let Err(e) = self.session.set_authenticated(authenticated) {
            log::warn!("⚠️  Failed to persist session flag: {}", e);
        }
    }
}
