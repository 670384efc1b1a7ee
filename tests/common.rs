//! Common test utilities for wallet integration tests
//!
//! This module provides shared test infrastructure including:
//! - A facade wired to a scriptable mock wallet
//! - Recording notifier and navigator to assert on user-facing output
//! - A temporary session directory removed on drop

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{address, Address};
use equixtate_web3::{
    BrowserEnvironment, Eip1193Provider, MockWallet, ReceiptPolling, RecordingNavigator,
    RecordingNotifier, Web3Config, Web3Service,
};
use tempfile::TempDir;

pub const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
pub const BOB: Address = address!("0000000000000000000000000000000000000b0b");

pub const DESKTOP_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 Safari/605.1.15";
pub const IPHONE_UA: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";

pub fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

/// Test environment with automatic cleanup
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub wallet: Option<Arc<MockWallet>>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub web3: Web3Service,
}

impl TestEnvironment {
    /// Desktop browser with the given injected wallet
    pub fn new(wallet: MockWallet) -> anyhow::Result<Self> {
        Self::build(Some(Arc::new(wallet)), DESKTOP_UA)
    }

    /// Browser without any injected wallet
    pub fn without_wallet(user_agent: &str) -> anyhow::Result<Self> {
        Self::build(None, user_agent)
    }

    pub fn build(wallet: Option<Arc<MockWallet>>, user_agent: &str) -> anyhow::Result<Self> {
        init_logging();
        dotenv::dotenv().ok();

        let temp_dir = TempDir::new()?;
        log::info!("📁 Test session directory: {:?}", temp_dir.path());

        let config = Web3Config {
            session_dir: temp_dir.path().to_path_buf(),
            connect_timeout: Duration::from_secs(15),
            receipts: ReceiptPolling {
                interval: Duration::from_millis(10),
                max_attempts: Some(5),
            },
            app_hostname: "equixtate.app".to_string(),
            ..Web3Config::default()
        };

        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let ethereum = wallet
            .clone()
            .map(|w| w as Arc<dyn Eip1193Provider>);
        let web3 = Web3Service::new(
            BrowserEnvironment::new(ethereum, user_agent, config.app_hostname.clone()),
            config,
            notifier.clone(),
            navigator.clone(),
        );

        Ok(Self {
            temp_dir,
            wallet,
            notifier,
            navigator,
            web3,
        })
    }

    pub fn wallet(&self) -> &Arc<MockWallet> {
        self.wallet
            .as_ref()
            .expect("test environment was built without a wallet")
    }

    /// Connected-status invariant: an address is present exactly when connected
    pub fn assert_address_iff_connected(&self) {
        let state = self.web3.connection_state();
        assert_eq!(
            state.address.is_some(),
            state.status == equixtate_web3::ConnectionStatus::Connected,
            "address/status mismatch: {:?}",
            state
        );
    }
}

/// MetaMask with ALICE unlocked but not yet authorized for the site
pub fn metamask_with_alice() -> MockWallet {
    MockWallet::metamask().with_accounts(vec![ALICE])
}
