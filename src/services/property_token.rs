//! Direct token purchases priced in the chain's native currency

use alloy_primitives::U256;

use super::ServiceContext;
use crate::error::{Result, Web3Error};

pub struct PropertyTokenService {
    ctx: ServiceContext,
}

impl PropertyTokenService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Raw token balance of the connected wallet, 0 when unavailable
    pub async fn get_property_token_balance(&self, property_id: u64) -> U256 {
        let result: Result<U256> = async {
            let contract = self.ctx.property_token()?;
            let address = self.ctx.wallet_address()?;
            contract.balance_of(address, U256::from(property_id)).await
        }
        .await;

        result.unwrap_or_else(|e| {
            log::error!("Error getting token balance: {}", e);
            U256::ZERO
        })
    }

    /// Buy `amount` whole tokens, paying `tokenPrice * amount` as transaction value
    pub async fn buy_property_tokens(&self, property_id: u64, amount: u64) -> bool {
        let result: Result<()> = async {
            let contract = self.ctx.property_token()?;
            self.ctx.require_signer()?;

            let id = U256::from(property_id);
            let price = contract.token_price(id).await?;
            let total = price.checked_mul(U256::from(amount)).ok_or_else(|| {
                Web3Error::InvalidAmount(format!("{} tokens at {} wei overflows", amount, price))
            })?;
            log::debug!("Buying {} tokens of #{} for {} wei", amount, property_id, total);

            contract.buy_tokens(id, U256::from(amount), total).await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                self.ctx.succeed(
                    "Purchase Successful",
                    format!(
                        "You have purchased {} tokens of property #{}",
                        amount, property_id
                    ),
                );
                true
            }
            Err(e) => {
                self.ctx.fail(
                    "Error buying tokens",
                    "Purchase Failed",
                    "Failed to purchase property tokens",
                    &e,
                );
                false
            }
        }
    }

    /// `(available, total)` supply of a property, `(0, 0)` when unavailable
    pub async fn get_available_tokens(&self, property_id: u64) -> (U256, U256) {
        let result: Result<(U256, U256)> = async {
            let contract = self.ctx.property_token()?;
            let id = U256::from(property_id);
            let available = contract.available_tokens(id).await?;
            let total = contract.total_supply(id).await?;
            Ok((available, total))
        }
        .await;

        result.unwrap_or_else(|e| {
            log::error!("Error getting available tokens: {}", e);
            (U256::ZERO, U256::ZERO)
        })
    }
}
