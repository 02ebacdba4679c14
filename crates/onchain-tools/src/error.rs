//! Error Types for On-chain Tools

use agent_core::ToolError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WalletError>;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Token not supported: {0}")]
    UnsupportedToken(String),

    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    #[error("Malformed data: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WalletError {
    /// Stable code surfaced to the reasoning engine
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Rpc { .. } | Self::Network(_) => "rpc_error",
            Self::InvalidAddress(_) | Self::InvalidAmount(_) | Self::UnsupportedToken(_) => {
                "invalid_argument"
            }
            _ => "wallet_error",
        }
    }
}

impl From<WalletError> for ToolError {
    fn from(err: WalletError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_codes() {
        let err: ToolError = WalletError::Rpc {
            code: -32000,
            message: "execution reverted".into(),
        }
        .into();
        assert_eq!(err.code, "rpc_error");
        assert!(err.message.contains("execution reverted"));

        let err: ToolError = WalletError::InvalidAddress("0x12".into()).into();
        assert_eq!(err.code, "invalid_argument");

        let err: ToolError = WalletError::InsufficientFunds {
            needed: 10,
            available: 1,
        }
        .into();
        assert_eq!(err.code, "wallet_error");
    }
}
