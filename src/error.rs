//! Error types for wallet connection and contract interaction
//!
//! Three layers:
//! - [`ProviderError`]: what the injected wallet (or JSON-RPC node) answered
//! - [`ConnectError`]: why a connect attempt failed, one variant per user-facing message
//! - [`Web3Error`]: everything else, contained by the domain services

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::constants::{
    ERROR_CODE_ALREADY_PENDING, ERROR_CODE_INTERNAL, ERROR_CODE_USER_REJECTED,
};

/// Error object returned by an EIP-1193 `request` call
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} (code {code})")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Transport or provider-internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ERROR_CODE_INTERNAL, message)
    }

    pub fn user_rejected() -> Self {
        Self::new(ERROR_CODE_USER_REJECTED, "User rejected the request.")
    }

    pub fn already_pending() -> Self {
        Self::new(
            ERROR_CODE_ALREADY_PENDING,
            "Request of type 'wallet_requestPermissions' already pending",
        )
    }

    pub fn is_user_rejected(&self) -> bool {
        self.code == ERROR_CODE_USER_REJECTED
    }

    pub fn is_already_pending(&self) -> bool {
        self.code == ERROR_CODE_ALREADY_PENDING
    }
}

/// Failure of a user-initiated connect attempt
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectError {
    #[error("Web3 provider not found. Please install MetaMask or another Web3 wallet.")]
    NoProvider,

    #[error("Invalid ethereum provider. Missing required methods.")]
    InvalidProvider,

    #[error("You declined the connection request.")]
    UserRejected,

    #[error("A connection request is already pending.")]
    AlreadyPending,

    #[error("Connection request timed out after {0:?}. Please check your wallet extension.")]
    Timeout(Duration),

    #[error("No accounts found. Please unlock your wallet.")]
    NoAccounts,

    #[error("Provider error: {0}")]
    Provider(ProviderError),

    #[error("Failed to establish wallet session: {0}")]
    Session(String),
}

impl From<ProviderError> for ConnectError {
    fn from(err: ProviderError) -> Self {
        if err.is_user_rejected() {
            Self::UserRejected
        } else if err.is_already_pending() {
            Self::AlreadyPending
        } else {
            Self::Provider(err)
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Core error type for wallet-backed operations
#[derive(Error, Debug)]
pub enum Web3Error {
    #[error("Wallet not connected: {0}")]
    NotConnected(String),

    #[error("{0} contract not initialized")]
    ContractNotInitialized(&'static str),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("ABI error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("Transaction {0} reverted")]
    TransactionReverted(String),

    #[error("Transaction {hash} not confirmed after {attempts} attempts")]
    ReceiptTimeout { hash: String, attempts: u32 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Advisor error: {0}")]
    Advisor(String),
}

impl Web3Error {
    /// Message shown to the user, falling back when the underlying error carries none
    pub fn user_message(&self, fallback: &str) -> String {
        let message = match self {
            Self::Provider(err) => err.message.clone(),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Web3Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_codes_map_to_distinct_connect_errors() {
        assert_eq!(
            ConnectError::from(ProviderError::user_rejected()),
            ConnectError::UserRejected
        );
        assert_eq!(
            ConnectError::from(ProviderError::already_pending()),
            ConnectError::AlreadyPending
        );
        assert!(matches!(
            ConnectError::from(ProviderError::internal("boom")),
            ConnectError::Provider(_)
        ));
    }

    #[test]
    fn test_user_message_fallback() {
        let err = Web3Error::Provider(ProviderError::new(-32000, ""));
        assert_eq!(err.user_message("Failed to place bid"), "Failed to place bid");

        let err = Web3Error::Provider(ProviderError::new(-32000, "execution reverted"));
        assert_eq!(err.user_message("Failed to place bid"), "execution reverted");
    }
}
