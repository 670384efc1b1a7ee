//! Conversion between human-denominated amounts and on-chain integer base units

use alloy_primitives::utils::{format_units, parse_units};
use alloy_primitives::U256;

use crate::error::{Result, Web3Error};

/// EquiX token economics
///
/// The USD value of a token is configuration, not a literal repeated across services.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TokenEconomics {
    /// USD value of one EquiX token
    pub usd_value: f64,
    /// Decimals of the on-chain token amount
    pub decimals: u8,
}

impl Default for TokenEconomics {
    fn default() -> Self {
        Self {
            usd_value: 5.0,
            decimals: 18,
        }
    }
}

impl TokenEconomics {
    pub fn usd_to_tokens(&self, usd: f64) -> f64 {
        usd / self.usd_value
    }

    pub fn tokens_to_usd(&self, tokens: f64) -> f64 {
        tokens * self.usd_value
    }

    /// Token count scaled to base units (`amount * 10^decimals`)
    pub fn to_base_units(&self, amount: f64) -> Result<U256> {
        to_base_units(amount, self.decimals)
    }

    pub fn from_base_units(&self, value: U256) -> f64 {
        from_base_units(value, self.decimals)
    }
}

/// Scale a decimal amount into integer base units
///
/// Rejects negative, NaN and infinite amounts.
pub fn to_base_units(amount: f64, decimals: u8) -> Result<U256> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Web3Error::InvalidAmount(amount.to_string()));
    }
    let parsed = parse_units(&amount.to_string(), decimals)
        .map_err(|e| Web3Error::InvalidAmount(format!("{}: {}", amount, e)))?;
    Ok(parsed.get_absolute())
}

/// Format integer base units as a decimal number, 0.0 if unrepresentable
pub fn from_base_units(value: U256, decimals: u8) -> f64 {
    format_units(value, decimals)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Native balance in ether rounded to 4 decimals, as shown in the wallet menu
pub fn format_ether_4(wei: U256) -> String {
    format!("{:.4}", from_base_units(wei, 18))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_amount_scaled_by_decimals() {
        let economics = TokenEconomics::default();
        let expected = U256::from(150u64) * U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(economics.to_base_units(150.0).unwrap(), expected);
    }

    #[test]
    fn test_fractional_usdc_amount() {
        assert_eq!(to_base_units(12.5, 6).unwrap(), U256::from(12_500_000u64));
    }

    #[test]
    fn test_rejects_invalid_amounts() {
        assert!(to_base_units(-1.0, 18).is_err());
        assert!(to_base_units(f64::NAN, 18).is_err());
        assert!(to_base_units(f64::INFINITY, 6).is_err());
    }

    #[test]
    fn test_usd_conversion_uses_configured_value() {
        let economics = TokenEconomics {
            usd_value: 10.0,
            decimals: 18,
        };
        assert_eq!(economics.usd_to_tokens(250.0), 25.0);
        assert_eq!(economics.tokens_to_usd(3.0), 30.0);
    }

    #[test]
    fn test_format_ether_4() {
        let wei = U256::from(1_234_567_000_000_000_000u64);
        assert_eq!(format_ether_4(wei), "1.2346");
    }
}
