//! Property listing, token purchase, rental income and auctions

use alloy_primitives::{Address, U256};
use serde::Serialize;

use super::ServiceContext;
use crate::constants::{USDC_DECIMALS, USD_CENTS_DECIMALS};
use crate::error::{Result, Web3Error};
use crate::units::{from_base_units, to_base_units};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    pub id: u64,
    pub name: String,
    pub property_type: String,
    pub location: String,
    pub total_tokens: f64,
    pub available_tokens: f64,
    /// USD
    pub price_per_token: f64,
    pub owner: Address,
    pub is_active: bool,
}

pub struct PropertyService {
    ctx: ServiceContext,
}

impl PropertyService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Read a property record, `None` if it cannot be read
    pub async fn get_property_details(&self, property_id: u64) -> Option<PropertyDetails> {
        let result: Result<PropertyDetails> = async {
            let contract = self.ctx.property_token()?;
            let record = contract.get_property(U256::from(property_id)).await?;
            let decimals = self.ctx.token.decimals;
            Ok(PropertyDetails {
                id: record.id.saturating_to(),
                name: record.name,
                property_type: record.propertyType,
                location: record.location,
                total_tokens: from_base_units(record.totalTokens, decimals),
                available_tokens: from_base_units(record.availableTokens, decimals),
                price_per_token: from_base_units(record.pricePerToken, USD_CENTS_DECIMALS),
                owner: record.owner,
                is_active: record.isActive,
            })
        }
        .await;

        match result {
            Ok(details) => Some(details),
            Err(e) => {
                log::error!("Error getting property details: {}", e);
                None
            }
        }
    }

    /// Buy `token_amount` EquiX tokens of a property
    ///
    /// The amount is scaled by the token decimals before it is sent.
    pub async fn buy_property_tokens(&self, property_id: u64, token_amount: f64) -> bool {
        let result: Result<()> = async {
            let contract = self.ctx.property_token()?;
            let amount = self.ctx.token.to_base_units(token_amount)?;
            contract
                .purchase_tokens(U256::from(property_id), amount)
                .await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                self.ctx.succeed(
                    "Purchase Successful",
                    format!(
                        "You have purchased {} EquiX tokens for property #{}",
                        token_amount, property_id
                    ),
                );
                true
            }
            Err(e) => {
                self.ctx.fail(
                    "Error buying property tokens",
                    "Purchase Failed",
                    "Failed to purchase property tokens",
                    &e,
                );
                false
            }
        }
    }

    /// List a new property
    ///
    /// # Arguments
    ///
    /// * `value_usd` - property value in USD, sent on-chain in whole cents
    /// * `metadata_uri` - off-chain metadata location
    ///
    /// # Returns
    ///
    /// The new property id when the `PropertyCreated` event was emitted.
    pub async fn create_property(
        &self,
        name: &str,
        property_type: &str,
        location: &str,
        value_usd: f64,
        metadata_uri: &str,
    ) -> Option<u64> {
        let result: Result<Option<U256>> = async {
            let contract = self.ctx.property_token()?;
            let cents = usd_to_cents(value_usd)?;
            let (_, id) = contract
                .create_property(
                    name.to_string(),
                    property_type.to_string(),
                    location.to_string(),
                    cents,
                    metadata_uri.to_string(),
                )
                .await?;
            Ok(id)
        }
        .await;

        match result {
            Ok(Some(id)) => {
                let id: u64 = id.saturating_to();
                self.ctx.succeed(
                    "Property Created",
                    format!("Property \"{}\" has been created with ID: {}", name, id),
                );
                Some(id)
            }
            Ok(None) => {
                self.ctx.succeed(
                    "Property Created",
                    format!("Property \"{}\" has been created", name),
                );
                None
            }
            Err(e) => {
                self.ctx.fail(
                    "Error creating property",
                    "Creation Failed",
                    "Failed to create property",
                    &e,
                );
                None
            }
        }
    }

    /// Connected wallet's token balance for a property, 0 when unavailable
    pub async fn get_user_token_balance(&self, property_id: u64) -> f64 {
        let (Some(contract), Some(address)) = (
            self.ctx.contracts.get_property_token_contract(),
            self.ctx.registry.address(),
        ) else {
            return 0.0;
        };

        match contract.balance_of(address, U256::from(property_id)).await {
            Ok(balance) => from_base_units(balance, self.ctx.token.decimals),
            Err(e) => {
                log::error!("Error getting token balance: {}", e);
                0.0
            }
        }
    }

    /// Distribute `amount_usdc` to the token holders of a property
    pub async fn distribute_rental_income(&self, property_id: u64, amount_usdc: f64) -> bool {
        let result: Result<()> = async {
            let contract = self.ctx.property_token()?;
            let amount = to_base_units(amount_usdc, USDC_DECIMALS)?;
            contract
                .distribute_rental_income(U256::from(property_id), amount)
                .await?;
            Ok(())
        }
        .await;

        self.finish(
            result,
            "Rental Income Distributed",
            format!(
                "{} USDC has been distributed to token holders of property #{}",
                amount_usdc, property_id
            ),
            (
                "Error distributing rental income",
                "Distribution Failed",
                "Failed to distribute rental income",
            ),
        )
    }

    pub async fn claim_rental_income(&self, property_id: u64) -> bool {
        let result: Result<()> = async {
            let contract = self.ctx.property_token()?;
            contract.claim_rental_income(U256::from(property_id)).await?;
            Ok(())
        }
        .await;

        self.finish(
            result,
            "Rental Income Claimed",
            format!(
                "You have successfully claimed your rental income for property #{}",
                property_id
            ),
            (
                "Error claiming rental income",
                "Claim Failed",
                "Failed to claim rental income",
            ),
        )
    }

    /// Start an auction with a USDC starting price
    pub async fn create_auction(
        &self,
        property_id: u64,
        starting_price: f64,
        duration_days: u64,
    ) -> bool {
        let result: Result<()> = async {
            let contract = self.ctx.property_token()?;
            let price = to_base_units(starting_price, USDC_DECIMALS)?;
            contract
                .create_auction(U256::from(property_id), price, U256::from(duration_days))
                .await?;
            Ok(())
        }
        .await;

        self.finish(
            result,
            "Auction Created",
            format!(
                "Auction created for property #{} with starting price {} USDC",
                property_id, starting_price
            ),
            (
                "Error creating auction",
                "Auction Creation Failed",
                "Failed to create auction",
            ),
        )
    }

    pub async fn place_bid(&self, property_id: u64, bid_amount: f64) -> bool {
        let result: Result<()> = async {
            let contract = self.ctx.property_token()?;
            let bid = to_base_units(bid_amount, USDC_DECIMALS)?;
            contract.place_bid(U256::from(property_id), bid).await?;
            Ok(())
        }
        .await;

        self.finish(
            result,
            "Bid Placed",
            format!(
                "Your bid of {} USDC for property #{} has been placed",
                bid_amount, property_id
            ),
            ("Error placing bid", "Bid Failed", "Failed to place bid"),
        )
    }

    pub async fn end_auction(&self, property_id: u64) -> bool {
        let result: Result<()> = async {
            let contract = self.ctx.property_token()?;
            contract.end_auction(U256::from(property_id)).await?;
            Ok(())
        }
        .await;

        self.finish(
            result,
            "Auction Ended",
            format!("Auction for property #{} has been ended", property_id),
            (
                "Error ending auction",
                "End Auction Failed",
                "Failed to end auction",
            ),
        )
    }

    /// Notify success or failure of a write and turn it into a bool
    fn finish(
        &self,
        result: Result<()>,
        title: &str,
        description: String,
        failure: (&str, &str, &str),
    ) -> bool {
        match result {
            Ok(()) => {
                self.ctx.succeed(title, description);
                true
            }
            Err(e) => {
                let (context, title, fallback) = failure;
                self.ctx.fail(context, title, fallback, &e);
                false
            }
        }
    }
}

fn usd_to_cents(value_usd: f64) -> Result<U256> {
    if !value_usd.is_finite() || value_usd < 0.0 {
        return Err(Web3Error::InvalidAmount(value_usd.to_string()));
    }
    Ok(U256::from((value_usd * 100.0).floor() as u64))
}
