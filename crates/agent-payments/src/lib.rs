//! # agent-payments
//!
//! Headless checkout for the shopping agent: create an order with a product
//! locator and shipping details, then pay for it from the agent's wallet.
//!
//! ```text
//! ┌──────────────┐  create_order   ┌─────────────────┐
//! │    Agent     │────────────────▶│  Checkout API   │
//! │ (create_order│◀────────────────│  (Crossmint)    │
//! │     tool)    │  unsigned tx    └─────────────────┘
//! └──────┬───────┘
//!        │ decode, sign, eth_sendRawTransaction
//!        ▼
//! ┌──────────────┐
//! │ WalletClient │
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_payments::{CheckoutToolProvider, CrossmintClient};
//!
//! let api = Arc::new(CrossmintClient::new(api_key, PRODUCTION_URL)?);
//! let checkout = CheckoutToolProvider::new(api, wallet.clone());
//!
//! let registry = ToolRegistry::from_providers(&[wallet_tools, erc20, Arc::new(checkout)])?;
//! ```

mod checkout;
mod error;
mod tools;

pub use checkout::{
    CheckoutApi, CreatedOrder, CrossmintClient, LineItem, Order, OrderPayment, OrderRequest,
    PRODUCTION_URL, Payment, PaymentPreparation, PhysicalAddress, Recipient, STAGING_URL,
    payment_method,
};
pub use error::{PaymentError, Result};
pub use tools::{CheckoutToolProvider, CreateOrderTool, GetOrderTool};
