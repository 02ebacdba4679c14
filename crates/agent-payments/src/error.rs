//! Payment Error Types

use agent_core::ToolError;
use onchain_tools::WalletError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Checkout-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Checkout API rejected the request
    #[error("Checkout API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Order arguments failed validation
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Order was created but cannot be paid
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Submitting the payment transaction failed
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PaymentError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Network(_))
            || matches!(self, Self::Api { status, .. } if *status >= 500)
    }

    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::Api { .. } => "The checkout service rejected the order.",
            Self::InvalidOrder(_) => "Some order details are missing or invalid.",
            Self::PaymentFailed(_) => "This item cannot be paid for right now.",
            Self::RateLimited => "Too many checkout requests. Please wait a moment.",
            Self::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your order.",
        }
    }

    /// Stable code surfaced to the reasoning engine
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidOrder(_) => "invalid_argument",
            Self::Wallet(inner) => inner.code(),
            _ => "checkout_error",
        }
    }
}

impl From<PaymentError> for ToolError {
    fn from(err: PaymentError) -> Self {
        let mut message = format!("{} {err}", err.user_message());
        if err.is_retryable() {
            message.push_str(" (temporary; the same call may succeed later)");
        }
        Self::new(err.code(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(PaymentError::RateLimited.is_retryable());
        assert!(
            PaymentError::Api {
                status: 503,
                message: "down".into()
            }
            .is_retryable()
        );
        assert!(
            !PaymentError::Api {
                status: 400,
                message: "bad locator".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(
            ToolError::from(PaymentError::InvalidOrder("no email".into())).code,
            "invalid_argument"
        );
        assert_eq!(
            ToolError::from(PaymentError::Wallet(WalletError::Rpc {
                code: -32000,
                message: "nonce too low".into()
            }))
            .code,
            "rpc_error"
        );
        assert_eq!(
            ToolError::from(PaymentError::PaymentFailed("sold out".into())).code,
            "checkout_error"
        );
    }

    #[test]
    fn test_tool_message_explains_failure() {
        let busy = ToolError::from(PaymentError::RateLimited);
        assert!(busy.message.starts_with("Too many checkout requests."));
        assert!(busy.message.ends_with("(temporary; the same call may succeed later)"));

        let rejected = ToolError::from(PaymentError::Api {
            status: 400,
            message: "bad locator".into(),
        });
        assert_eq!(
            rejected.message,
            "The checkout service rejected the order. Checkout API error (400): bad locator"
        );
    }
}
