//! # onchain-tools
//!
//! Wallet and ERC-20 tools for the shopping agent.
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────────────────────────┐
//! │  WalletToolProvider  │   │  Erc20Provider (USDC, ...)       │
//! │  get_address         │   │  get_token_info_by_symbol        │
//! │  get_chain           │   │  get_token_balance / transfer    │
//! │  get_balance         │   │  get_token_allowance / approve   │
//! └──────────┬───────────┘   │  convert_{to,from}_base_unit     │
//!            │               └────────────────┬─────────────────┘
//!            └──────────────┬─────────────────┘
//!                           ▼
//!                ┌─────────────────────┐
//!                │  dyn WalletClient   │
//!                ├─────────────────────┤
//!                │  RpcWalletClient    │  eth_call / eth_sendRawTransaction
//!                │  MockWalletClient   │  in-memory ledger
//!                └─────────────────────┘
//!                           │
//!                     LocalSigner        secp256k1, EIP-155 / EIP-1559
//! ```

pub mod abi;
pub mod error;
pub mod model;
pub mod rlp;
pub mod signer;
pub mod svckit;
pub mod token;
pub mod wallet;

pub use error::{Result, WalletError};
pub use model::{Address, Chain, TransactionRequest};
pub use rlp::UnsignedTransaction;
pub use signer::LocalSigner;
pub use svckit::{Erc20Provider, WalletToolProvider};
pub use token::{Token, usdc};
pub use wallet::{MockWalletClient, RpcWalletClient, WalletClient};

/// Re-export tools for direct registration
pub mod tools {
    pub use crate::svckit::{
        ApproveTool, ConvertFromBaseUnitTool, ConvertToBaseUnitTool, GetAddressTool,
        GetBalanceTool, GetChainTool, GetTokenAllowanceTool, GetTokenBalanceTool,
        GetTokenInfoBySymbolTool, TransferTool,
    };
}
