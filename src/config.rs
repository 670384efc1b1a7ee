//! Web3 configuration from environment variables
//!
//! Contract addresses, token economics, connection timeout and the
//! JSON-RPC endpoint used outside the browser.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::{address, Address};

use crate::units::TokenEconomics;

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_ADVISOR_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_PROPOSAL_SCAN_LIMIT: u64 = 10;

/// Deployed contract addresses
///
/// The marketplace lives in the token contract, so both default to the same address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractAddresses {
    pub token: Address,
    pub marketplace: Address,
    pub governance: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            token: address!("1234567890123456789012345678901234567890"),
            marketplace: address!("1234567890123456789012345678901234567890"),
            governance: address!("abcdef1234567890abcdef1234567890abcdef12"),
        }
    }
}

/// How transaction receipts are awaited after `eth_sendTransaction`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiptPolling {
    pub interval: Duration,
    /// `None` polls until the transaction is mined
    pub max_attempts: Option<u32>,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_attempts: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Web3Config {
    /// JSON-RPC endpoint for the HTTP provider
    pub rpc_url: String,
    pub contracts: ContractAddresses,
    pub token: TokenEconomics,
    /// Budget for `eth_requestAccounts` during a user-initiated connect
    pub connect_timeout: Duration,
    /// Upper bound of the governance proposal scan
    pub proposal_scan_limit: u64,
    pub receipts: ReceiptPolling,
    /// Hostname embedded in mobile deep links
    pub app_hostname: String,
    /// Directory holding the persisted session flag
    pub session_dir: PathBuf,
    pub advisor_url: String,
    pub groq_api_key: Option<String>,
}

impl Web3Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `RPC_URL`: JSON-RPC endpoint (default `http://localhost:8545`)
    /// - `TOKEN_CONTRACT_ADDRESS`, `MARKETPLACE_CONTRACT_ADDRESS`, `GOVERNANCE_CONTRACT_ADDRESS`
    /// - `EQUIX_TOKEN_USD_VALUE`: USD value of one EquiX token (default 5.0)
    /// - `EQUIX_TOKEN_DECIMALS`: on-chain decimals (default 18)
    /// - `WALLET_CONNECT_TIMEOUT_SECS`: connect timeout (default 15)
    /// - `PROPOSAL_SCAN_LIMIT`: governance scan bound (default 10)
    /// - `RECEIPT_POLL_INTERVAL_MS`; `RECEIPT_POLL_ATTEMPTS` bounds receipt polling (unset: until mined)
    /// - `APP_HOSTNAME`, `SESSION_DIR`, `ADVISOR_URL`, `GROQ_API_KEY`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let rpc_url = env::var("RPC_URL").unwrap_or(defaults.rpc_url);
        log::info!("📡 RPC URL: {}", rpc_url);

        let contracts = ContractAddresses {
            token: address_var("TOKEN_CONTRACT_ADDRESS", defaults.contracts.token),
            marketplace: address_var(
                "MARKETPLACE_CONTRACT_ADDRESS",
                defaults.contracts.marketplace,
            ),
            governance: address_var(
                "GOVERNANCE_CONTRACT_ADDRESS",
                defaults.contracts.governance,
            ),
        };

        let token = TokenEconomics {
            usd_value: parsed_var("EQUIX_TOKEN_USD_VALUE", defaults.token.usd_value),
            decimals: parsed_var("EQUIX_TOKEN_DECIMALS", defaults.token.decimals),
        };
        log::info!(
            "🪙 EquiX token: ${:.2} per token, {} decimals",
            token.usd_value,
            token.decimals
        );

        let connect_timeout = Duration::from_secs(parsed_var(
            "WALLET_CONNECT_TIMEOUT_SECS",
            defaults.connect_timeout.as_secs(),
        ));

        let receipts = ReceiptPolling {
            interval: Duration::from_millis(parsed_var(
                "RECEIPT_POLL_INTERVAL_MS",
                defaults.receipts.interval.as_millis() as u64,
            )),
            max_attempts: optional_var("RECEIPT_POLL_ATTEMPTS"),
        };

        let groq_api_key = env::var("GROQ_API_KEY").ok().filter(|k| !k.trim().is_empty());
        if groq_api_key.is_none() {
            log::warn!("⚠️  GROQ_API_KEY not set, AI advisor will answer with a fallback message");
        }

        Self {
            rpc_url,
            contracts,
            token,
            connect_timeout,
            proposal_scan_limit: parsed_var("PROPOSAL_SCAN_LIMIT", defaults.proposal_scan_limit),
            receipts,
            app_hostname: env::var("APP_HOSTNAME").unwrap_or(defaults.app_hostname),
            session_dir: env::var("SESSION_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_dir),
            advisor_url: env::var("ADVISOR_URL").unwrap_or(defaults.advisor_url),
            groq_api_key,
        }
    }
}

impl Default for Web3Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contracts: ContractAddresses::default(),
            token: TokenEconomics::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            proposal_scan_limit: DEFAULT_PROPOSAL_SCAN_LIMIT,
            receipts: ReceiptPolling::default(),
            app_hostname: "localhost".to_string(),
            session_dir: PathBuf::from("./session"),
            advisor_url: DEFAULT_ADVISOR_URL.to_string(),
            groq_api_key: None,
        }
    }
}

fn address_var(name: &str, default: Address) -> Address {
    match env::var(name) {
        Ok(raw) => match Address::from_str(raw.trim()) {
            Ok(addr) => {
                log::info!("📜 {}: {}", name, addr);
                addr
            }
            Err(e) => {
                log::warn!("⚠️  Invalid {} '{}' ({}), using {}", name, raw, e, default);
                default
            }
        },
        Err(_) => default,
    }
}

fn parsed_var<T: FromStr + std::fmt::Display + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("⚠️  Invalid {} '{}', using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn optional_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        log::warn!("⚠️  Invalid {} '{}', ignoring it", name, raw);
    }
    parsed
}
