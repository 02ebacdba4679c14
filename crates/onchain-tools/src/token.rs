//! ERC-20 Token Definitions
//!
//! Token metadata plus conversion between human amounts and base units.
//! Uses `rust_decimal` for all amounts - never use f64 for money!

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{Result, WalletError};
use crate::model::{Address, Chain};

/// An ERC-20 token deployed on one or more chains
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Token {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,

    /// `(chain id, contract address)` pairs
    pub deployments: Vec<(u64, Address)>,
}

impl Token {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            name: name.into(),
            decimals,
            deployments: Vec::new(),
        }
    }

    #[must_use]
    pub fn deployed(mut self, chain_id: u64, address: Address) -> Self {
        self.deployments.push((chain_id, address));
        self
    }

    /// Contract address on the given chain
    pub fn address_on(&self, chain_id: u64) -> Option<Address> {
        self.deployments
            .iter()
            .find(|(id, _)| *id == chain_id)
            .map(|(_, address)| *address)
    }

    pub fn to_base_units(&self, amount: Decimal) -> Result<u128> {
        to_base_units(amount, self.decimals)
    }

    pub fn from_base_units(&self, amount: u128) -> Result<Decimal> {
        from_base_units(amount, self.decimals)
    }
}

/// Circle USD Coin
pub fn usdc() -> Token {
    let deployments = [
        (Chain::ETHEREUM.id, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
        (Chain::SEPOLIA.id, "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
        (Chain::BASE.id, "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
        (Chain::BASE_SEPOLIA.id, "0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
        (Chain::POLYGON.id, "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359"),
        (Chain::ARBITRUM.id, "0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
        (Chain::OPTIMISM.id, "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"),
    ];

    deployments
        .into_iter()
        .fold(Token::new("USDC", "USDC", 6), |token, (chain_id, raw)| {
            match raw.parse() {
                Ok(address) => token.deployed(chain_id, address),
                Err(_) => token,
            }
        })
}

/// Convert a human amount (e.g. `1.5`) into integer base units.
///
/// Fails on negative amounts, on more fractional digits than the token has,
/// and on overflow.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<u128> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(WalletError::InvalidAmount(format!("{amount} is negative")));
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    let decimals = u32::from(decimals);
    if scale > decimals {
        return Err(WalletError::InvalidAmount(format!(
            "{amount} has more than {decimals} decimal places"
        )));
    }

    let mantissa = normalized.mantissa().unsigned_abs();

    10u128
        .checked_pow(decimals - scale)
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or_else(|| WalletError::InvalidAmount(format!("{amount} overflows base units")))
}

/// Convert integer base units back into a human amount
pub fn from_base_units(amount: u128, decimals: u8) -> Result<Decimal> {
    let value = i128::try_from(amount)
        .map_err(|_| WalletError::InvalidAmount(format!("{amount} is out of range")))?;

    Decimal::try_from_i128_with_scale(value, u32::from(decimals))
        .map(|d| d.normalize())
        .map_err(|e| WalletError::InvalidAmount(format!("{amount}: {e}")))
}
