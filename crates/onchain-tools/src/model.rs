//! Domain Models
//!
//! Addresses, chains and transaction requests shared by the wallet clients
//! and the tools.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// A 20-byte EVM account or contract address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Build from a slice that must be exactly 20 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, WalletError> {
        let array: [u8; 20] = bytes
            .try_into()
            .map_err(|_| WalletError::InvalidAddress(format!("{} bytes", bytes.len())))?;
        Ok(Self(array))
    }
}

impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| WalletError::InvalidAddress(s.to_string()))?;

        if digits.len() != 40 {
            return Err(WalletError::InvalidAddress(s.to_string()));
        }

        let bytes = hex::decode(digits).map_err(|_| WalletError::InvalidAddress(s.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl TryFrom<String> for Address {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Well-known EVM chains
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chain {
    pub id: u64,
    pub name: &'static str,
    pub native_symbol: &'static str,
}

impl Chain {
    pub const ETHEREUM: Self = Self::new(1, "Ethereum", "ETH");
    pub const SEPOLIA: Self = Self::new(11_155_111, "Sepolia", "ETH");
    pub const BASE: Self = Self::new(8453, "Base", "ETH");
    pub const BASE_SEPOLIA: Self = Self::new(84532, "Base Sepolia", "ETH");
    pub const POLYGON: Self = Self::new(137, "Polygon", "POL");
    pub const ARBITRUM: Self = Self::new(42161, "Arbitrum One", "ETH");
    pub const OPTIMISM: Self = Self::new(10, "OP Mainnet", "ETH");

    const KNOWN: [Self; 7] = [
        Self::ETHEREUM,
        Self::SEPOLIA,
        Self::BASE,
        Self::BASE_SEPOLIA,
        Self::POLYGON,
        Self::ARBITRUM,
        Self::OPTIMISM,
    ];

    const fn new(id: u64, name: &'static str, native_symbol: &'static str) -> Self {
        Self {
            id,
            name,
            native_symbol,
        }
    }

    pub fn from_id(id: u64) -> Option<Self> {
        Self::KNOWN.into_iter().find(|c| c.id == id)
    }
}

/// Transaction or call sent from the wallet
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: Option<Address>,
    pub value: u128,
    pub data: Vec<u8>,
}

impl TransactionRequest {
    pub fn call(to: Address, data: Vec<u8>) -> Self {
        Self {
            to: Some(to),
            value: 0,
            data,
        }
    }

    pub fn native_transfer(to: Address, value: u128) -> Self {
        Self {
            to: Some(to),
            value,
            data: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parsing() {
        let addr: Address = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".parse().unwrap();
        assert_eq!(
            addr.to_string(),
            "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913"
        );

        assert!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".parse::<Address>().is_err());
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz3589fCD6eDb6E08f4c7C32D4f71b54bdA02913".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_serde() {
        let addr: Address = serde_json::from_str("\"0x0000000000000000000000000000000000000001\"").unwrap();
        assert_eq!(addr.as_bytes()[19], 1);
        assert_eq!(
            serde_json::to_string(&addr).unwrap(),
            "\"0x0000000000000000000000000000000000000001\""
        );
    }

    #[test]
    fn test_known_chains() {
        assert_eq!(Chain::from_id(8453), Some(Chain::BASE));
        assert_eq!(Chain::from_id(999_999), None);
    }
}
