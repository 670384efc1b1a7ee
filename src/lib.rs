//! EquiXtate Web3: wallet connection and on-chain interaction for the
//! EquiXtate fractional real-estate marketplace
//!
//! Connects to an EIP-1193 wallet, keeps exactly one active wallet session,
//! and wraps the property token and governance contracts in services that
//! report outcomes as values plus user notifications.
//!
//! # Architecture
//!
//! - **Provider**: the EIP-1193 capability surface (injected wallet, HTTP node, mock)
//! - **Registry**: the active session (provider, signer, address, network)
//! - **Connection Manager**: connect / silent reconnect / disconnect and wallet events
//! - **Contract Service**: typed contract handles derived from the current signer
//! - **Domain Services**: property, token sale and governance operations
//! - **Facade**: [`Web3Service`], the single object the UI talks to
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use equixtate_web3::{BrowserEnvironment, LogNavigator, LogNotifier, Web3Config, Web3Service};
//!
//! let env = BrowserEnvironment::new(Some(injected_wallet), user_agent, "equixtate.app");
//! let web3 = Web3Service::new(
//!     env,
//!     Web3Config::from_env(),
//!     Arc::new(LogNotifier),
//!     Arc::new(LogNavigator),
//! );
//!
//! if !web3.initialize().await {
//!     web3.connect_wallet("metamask").await?;
//! }
//! web3.buy_property_tokens(7, 150.0).await;
//! ```

pub mod advisor;
pub mod config;
pub mod connection;
pub mod constants;
pub mod contracts;
pub mod detector;
pub mod error;
pub mod events;
pub mod facade;
pub mod notify;
pub mod provider;
pub mod registry;
pub mod services;
pub mod session;
pub mod signer;
pub mod units;

// Re-exports for convenience
pub use advisor::{AdvisorClient, ChatMessage};
pub use config::{ContractAddresses, ReceiptPolling, Web3Config};
pub use connection::ConnectionManager;
pub use contracts::{
    ContractRunner, ContractService, GovernanceContract, MarketplaceContract,
    PropertyTokenContract,
};
pub use detector::{detect_wallets, BrowserEnvironment, DetectedWallet};
pub use error::{ConnectError, ProviderError, StorageError, Web3Error};
pub use events::{EventManager, WalletSignal};
pub use facade::{format_address, Web3Service};
pub use notify::{
    LogNavigator, LogNotifier, Navigator, Notification, NotificationVariant, Notifier,
    RecordingNavigator, RecordingNotifier,
};
pub use provider::{
    ConnectBehavior, Eip1193Provider, HttpProvider, MockWallet, ProviderEvent, TxOutcome,
    WalletEventKind,
};
pub use registry::{ConnectionState, ConnectionStatus, NetworkInfo, ProviderRegistry};
pub use services::{
    GovernanceService, Proposal, PropertyDetails, PropertyService, PropertyTokenService,
};
pub use session::SessionStore;
pub use signer::{TransactionReceipt, WalletSigner};
pub use units::TokenEconomics;

// Common result type
pub type Result<T> = std::result::Result<T, Web3Error>;
