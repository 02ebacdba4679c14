//! Wallet Integration
//!
//! Abstractions and implementations for the account the agent spends from.

mod mock;
mod rpc;

pub use mock::MockWalletClient;
pub use rpc::RpcWalletClient;

use async_trait::async_trait;

use crate::abi;
use crate::error::Result;
use crate::model::{Address, TransactionRequest};

/// Wallet client trait (Strategy pattern)
///
/// Implement this for each backend: a JSON-RPC node, an in-memory ledger, a
/// hardware signer.
#[async_trait]
pub trait WalletClient: Send + Sync {
    /// Account this wallet sends from
    fn address(&self) -> Address;

    /// EVM chain id the wallet is connected to
    async fn chain_id(&self) -> Result<u64>;

    /// Native balance in wei
    async fn balance(&self, address: Address) -> Result<u128>;

    /// Read-only contract call, returning the raw return data
    async fn call(&self, request: &TransactionRequest) -> Result<Vec<u8>>;

    /// Submit a transaction from [`WalletClient::address`], returning its hash
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<String>;

    /// Backend name
    fn name(&self) -> &str;

    /// ERC-20 `balanceOf` in base units
    async fn token_balance(&self, token: Address, owner: Address) -> Result<u128> {
        let data = self
            .call(&TransactionRequest::call(token, abi::balance_of(owner)))
            .await?;
        abi::decode_uint(&data)
    }

    /// ERC-20 `allowance` in base units
    async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<u128> {
        let data = self
            .call(&TransactionRequest::call(token, abi::allowance(owner, spender)))
            .await?;
        abi::decode_uint(&data)
    }
}
