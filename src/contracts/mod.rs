//! Contract handles bound to the current signer
//!
//! [`ContractService`] keeps one [`ContractRunner`] (signer or read-only
//! provider) and derives typed handles from it on every `get_*` call. A handle
//! captures the runner it was created with; after the runner is replaced,
//! newly obtained handles reference only the new signer.

use std::fmt;
use std::sync::{Arc, RwLock};

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};

use crate::config::ContractAddresses;
use crate::error::{Result, Web3Error};
use crate::provider::Eip1193Provider;
use crate::signer::{provider_call, TransactionReceipt, WalletSigner};

pub mod abi;

pub use abi::{IGovernance, IPropertyToken, PropertyRecord};

/// What contract calls are executed through
#[derive(Clone)]
pub enum ContractRunner {
    /// Reads and writes as the connected account
    Signer(WalletSigner),
    /// Reads only
    ReadOnly(Arc<dyn Eip1193Provider>),
}

impl fmt::Debug for ContractRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signer(signer) => f.debug_tuple("Signer").field(signer).finish(),
            Self::ReadOnly(_) => f.write_str("ReadOnly"),
        }
    }
}

impl ContractRunner {
    pub fn signer(&self) -> Option<&WalletSigner> {
        match self {
            Self::Signer(signer) => Some(signer),
            Self::ReadOnly(_) => None,
        }
    }

    pub fn provider(&self) -> &Arc<dyn Eip1193Provider> {
        match self {
            Self::Signer(signer) => signer.provider(),
            Self::ReadOnly(provider) => provider,
        }
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        match self {
            Self::Signer(signer) => signer.call(to, data).await,
            Self::ReadOnly(provider) => provider_call(provider.as_ref(), None, to, data).await,
        }
    }

    async fn transact(&self, to: Address, data: Bytes, value: U256) -> Result<TransactionReceipt> {
        match self {
            Self::Signer(signer) => signer.transact(to, data, value).await,
            Self::ReadOnly(_) => Err(Web3Error::NotConnected(
                "a signer is required to send transactions".to_string(),
            )),
        }
    }
}

/// A deployed contract plus the runner used to reach it
#[derive(Clone, Debug)]
pub struct ContractHandle {
    address: Address,
    runner: ContractRunner,
}

impl ContractHandle {
    pub fn new(address: Address, runner: ContractRunner) -> Self {
        Self { address, runner }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn runner(&self) -> &ContractRunner {
        &self.runner
    }

    /// Account the handle sends transactions from, `None` for read-only handles
    pub fn signer_address(&self) -> Option<Address> {
        self.runner.signer().map(WalletSigner::cached_address)
    }

    /// `eth_call` a view function and decode its return value
    pub async fn read<C: SolCall>(&self, call: &C) -> Result<C::Return> {
        let output = self
            .runner
            .call(self.address, Bytes::from(call.abi_encode()))
            .await?;
        Ok(C::abi_decode_returns(&output)?)
    }

    /// Send a transaction calling `call` and wait for its receipt
    pub async fn write<C: SolCall>(&self, call: &C) -> Result<TransactionReceipt> {
        self.write_with_value(call, U256::ZERO).await
    }

    pub async fn write_with_value<C: SolCall>(
        &self,
        call: &C,
        value: U256,
    ) -> Result<TransactionReceipt> {
        log::debug!("Calling {} on {}", C::SIGNATURE, self.address);
        self.runner
            .transact(self.address, Bytes::from(call.abi_encode()), value)
            .await
    }

    /// First indexed `uint256` of the first `E` log this contract emitted
    pub fn indexed_id<E: SolEvent>(&self, receipt: &TransactionReceipt) -> Option<U256> {
        receipt
            .inner
            .logs()
            .iter()
            .filter(|log| log.address() == self.address)
            .filter(|log| log.topic0() == Some(&E::SIGNATURE_HASH))
            .find_map(|log| log.topics().get(1))
            .map(|topic: &B256| U256::from_be_slice(topic.as_slice()))
    }
}

/// Property token contract
#[derive(Clone, Debug)]
pub struct PropertyTokenContract(ContractHandle);

impl PropertyTokenContract {
    pub fn handle(&self) -> &ContractHandle {
        &self.0
    }

    pub async fn balance_of(&self, account: Address, id: U256) -> Result<U256> {
        self.0
            .read(&IPropertyToken::balanceOfCall { account, id })
            .await
    }

    pub async fn get_property(&self, property_id: U256) -> Result<PropertyRecord> {
        self.0
            .read(&IPropertyToken::getPropertyCall {
                propertyId: property_id,
            })
            .await
    }

    pub async fn purchase_tokens(&self, property_id: U256, amount: U256) -> Result<TransactionReceipt> {
        self.0
            .write(&IPropertyToken::purchaseTokensCall {
                propertyId: property_id,
                amount,
            })
            .await
    }

    /// Returns the receipt and the id from the `PropertyCreated` log, if emitted
    pub async fn create_property(
        &self,
        name: String,
        property_type: String,
        location: String,
        value_usd_cents: U256,
        metadata_uri: String,
    ) -> Result<(TransactionReceipt, Option<U256>)> {
        let receipt = self
            .0
            .write(&IPropertyToken::createPropertyCall {
                name,
                propertyType: property_type,
                location,
                valueUSD: value_usd_cents,
                metadataURI: metadata_uri,
            })
            .await?;
        let id = self.0.indexed_id::<IPropertyToken::PropertyCreated>(&receipt);
        Ok((receipt, id))
    }

    pub async fn distribute_rental_income(
        &self,
        property_id: U256,
        amount: U256,
    ) -> Result<TransactionReceipt> {
        self.0
            .write(&IPropertyToken::distributeRentalIncomeCall {
                propertyId: property_id,
                amount,
            })
            .await
    }

    pub async fn claim_rental_income(&self, property_id: U256) -> Result<TransactionReceipt> {
        self.0
            .write(&IPropertyToken::claimRentalIncomeCall {
                propertyId: property_id,
            })
            .await
    }

    pub async fn create_auction(
        &self,
        property_id: U256,
        starting_price: U256,
        duration_days: U256,
    ) -> Result<TransactionReceipt> {
        self.0
            .write(&IPropertyToken::createAuctionCall {
                propertyId: property_id,
                startingPrice: starting_price,
                durationDays: duration_days,
            })
            .await
    }

    pub async fn place_bid(&self, property_id: U256, bid_amount: U256) -> Result<TransactionReceipt> {
        self.0
            .write(&IPropertyToken::placeBidCall {
                propertyId: property_id,
                bidAmount: bid_amount,
            })
            .await
    }

    pub async fn end_auction(&self, property_id: U256) -> Result<TransactionReceipt> {
        self.0
            .write(&IPropertyToken::endAuctionCall {
                propertyId: property_id,
            })
            .await
    }

    pub async fn token_price(&self, property_id: U256) -> Result<U256> {
        self.0
            .read(&IPropertyToken::tokenPriceCall {
                propertyId: property_id,
            })
            .await
    }

    /// Payable purchase; `value` is the native-currency total
    pub async fn buy_tokens(
        &self,
        property_id: U256,
        amount: U256,
        value: U256,
    ) -> Result<TransactionReceipt> {
        self.0
            .write_with_value(
                &IPropertyToken::buyTokensCall {
                    propertyId: property_id,
                    amount,
                },
                value,
            )
            .await
    }

    pub async fn available_tokens(&self, property_id: U256) -> Result<U256> {
        self.0
            .read(&IPropertyToken::availableTokensCall {
                propertyId: property_id,
            })
            .await
    }

    pub async fn total_supply(&self, property_id: U256) -> Result<U256> {
        self.0
            .read(&IPropertyToken::totalSupplyCall {
                propertyId: property_id,
            })
            .await
    }
}

/// Marketplace view of the token contract: purchases, auctions, property reads
#[derive(Clone, Debug)]
pub struct MarketplaceContract(ContractHandle);

impl MarketplaceContract {
    pub fn handle(&self) -> &ContractHandle {
        &self.0
    }

    pub async fn purchase_tokens(&self, property_id: U256, amount: U256) -> Result<TransactionReceipt> {
        self.0
            .write(&IPropertyToken::purchaseTokensCall {
                propertyId: property_id,
                amount,
            })
            .await
    }

    pub async fn get_property(&self, property_id: U256) -> Result<PropertyRecord> {
        self.0
            .read(&IPropertyToken::getPropertyCall {
                propertyId: property_id,
            })
            .await
    }

    pub async fn create_auction(
        &self,
        property_id: U256,
        starting_price: U256,
        duration_days: U256,
    ) -> Result<TransactionReceipt> {
        self.0
            .write(&IPropertyToken::createAuctionCall {
                propertyId: property_id,
                startingPrice: starting_price,
                durationDays: duration_days,
            })
            .await
    }

    pub async fn place_bid(&self, property_id: U256, bid_amount: U256) -> Result<TransactionReceipt> {
        self.0
            .write(&IPropertyToken::placeBidCall {
                propertyId: property_id,
                bidAmount: bid_amount,
            })
            .await
    }

    pub async fn end_auction(&self, property_id: U256) -> Result<TransactionReceipt> {
        self.0
            .write(&IPropertyToken::endAuctionCall {
                propertyId: property_id,
            })
            .await
    }
}

/// Governance contract
#[derive(Clone, Debug)]
pub struct GovernanceContract(ContractHandle);

impl GovernanceContract {
    pub fn handle(&self) -> &ContractHandle {
        &self.0
    }

    pub async fn create_proposal(
        &self,
        property_id: U256,
        title: String,
        description: String,
        target: Address,
        call_data: Bytes,
    ) -> Result<(TransactionReceipt, Option<U256>)> {
        let receipt = self
            .0
            .write(&IGovernance::createProposalCall {
                propertyId: property_id,
                title,
                description,
                targetContract: target,
                callData: call_data,
            })
            .await?;
        let id = self.0.indexed_id::<IGovernance::ProposalCreated>(&receipt);
        Ok((receipt, id))
    }

    pub async fn cast_vote(&self, proposal_id: U256, support: bool) -> Result<TransactionReceipt> {
        self.0
            .write(&IGovernance::castVoteCall {
                proposalId: proposal_id,
                support,
            })
            .await
    }

    pub async fn execute_proposal(&self, proposal_id: U256) -> Result<TransactionReceipt> {
        self.0
            .write(&IGovernance::executeProposalCall {
                proposalId: proposal_id,
            })
            .await
    }

    pub async fn cancel_proposal(&self, proposal_id: U256) -> Result<TransactionReceipt> {
        self.0
            .write(&IGovernance::cancelProposalCall {
                proposalId: proposal_id,
            })
            .await
    }

    pub async fn get_proposal_details(
        &self,
        proposal_id: U256,
    ) -> Result<IGovernance::getProposalDetailsReturn> {
        self.0
            .read(&IGovernance::getProposalDetailsCall {
                proposalId: proposal_id,
            })
            .await
    }

    pub async fn has_voted(&self, proposal_id: U256, voter: Address) -> Result<bool> {
        self.0
            .read(&IGovernance::hasVotedCall {
                proposalId: proposal_id,
                voter,
            })
            .await
    }
}

/// Source of contract handles for the domain services
pub struct ContractService {
    addresses: ContractAddresses,
    runner: RwLock<Option<ContractRunner>>,
}

impl ContractService {
    pub fn new(addresses: ContractAddresses) -> Self {
        Self {
            addresses,
            runner: RwLock::new(None),
        }
    }

    pub fn addresses(&self) -> &ContractAddresses {
        &self.addresses
    }

    /// Bind all contracts to `runner`, replacing any previous binding
    pub fn initialize_contracts(&self, runner: ContractRunner) {
        match &runner {
            ContractRunner::Signer(signer) => {
                log::info!("📜 Contracts bound to signer {}", signer.cached_address())
            }
            ContractRunner::ReadOnly(_) => log::info!("📜 Contracts bound read-only"),
        }
        *self.runner.write().unwrap_or_else(|p| p.into_inner()) = Some(runner);
    }

    pub fn reset_contracts(&self) {
        *self.runner.write().unwrap_or_else(|p| p.into_inner()) = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.current().is_some()
    }

    pub fn get_property_token_contract(&self) -> Option<PropertyTokenContract> {
        self.handle(self.addresses.token).map(PropertyTokenContract)
    }

    pub fn get_marketplace_contract(&self) -> Option<MarketplaceContract> {
        self.handle(self.addresses.marketplace).map(MarketplaceContract)
    }

    pub fn get_governance_contract(&self) -> Option<GovernanceContract> {
        self.handle(self.addresses.governance).map(GovernanceContract)
    }

    fn current(&self) -> Option<ContractRunner> {
        self.runner.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn handle(&self, address: Address) -> Option<ContractHandle> {
        self.current().map(|runner| ContractHandle::new(address, runner))
    }
}
