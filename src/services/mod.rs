//! Domain services over the contract handles
//!
//! Every operation contains its own failures: it logs them, turns them into a
//! destructive notification carrying the underlying message (or a fallback),
//! and reports `false` / `None` / a zero value to the caller. Nothing here
//! changes the connection state.

use std::sync::Arc;

use alloy_primitives::Address;

use crate::contracts::{ContractService, GovernanceContract, PropertyTokenContract};
use crate::error::{Result, Web3Error};
use crate::notify::{Notification, Notifier};
use crate::registry::ProviderRegistry;
use crate::units::TokenEconomics;

pub mod governance;
pub mod property;
pub mod property_token;

pub use governance::{GovernanceService, Proposal};
pub use property::{PropertyDetails, PropertyService};
pub use property_token::PropertyTokenService;

/// Shared handles every domain service works with
#[derive(Clone)]
pub struct ServiceContext {
    pub contracts: Arc<ContractService>,
    pub registry: Arc<ProviderRegistry>,
    pub notifier: Arc<dyn Notifier>,
    pub token: TokenEconomics,
}

impl ServiceContext {
    pub fn property_token(&self) -> Result<PropertyTokenContract> {
        self.contracts
            .get_property_token_contract()
            .ok_or(Web3Error::ContractNotInitialized("Property token"))
    }

    pub fn governance(&self) -> Result<GovernanceContract> {
        self.contracts
            .get_governance_contract()
            .ok_or(Web3Error::ContractNotInitialized("Governance"))
    }

    pub fn wallet_address(&self) -> Result<Address> {
        self.registry
            .address()
            .ok_or_else(|| Web3Error::NotConnected("no wallet address available".to_string()))
    }

    /// Fails unless a signer is available for sending transactions
    pub fn require_signer(&self) -> Result<()> {
        match self.registry.signer() {
            Some(_) => Ok(()),
            None => Err(Web3Error::NotConnected(
                "connect your wallet to continue".to_string(),
            )),
        }
    }

    pub fn succeed(&self, title: &str, description: String) {
        self.notifier.notify(Notification::info(title, description));
    }

    pub fn fail(&self, context: &str, title: &str, fallback: &str, err: &Web3Error) {
        log::error!("{}: {}", context, err);
        self.notifier
            .notify(Notification::error(title, err.user_message(fallback)));
    }
}
