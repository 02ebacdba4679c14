//! Wallet Tools
//!
//! Address, chain and native balance of the agent's own wallet.

use std::sync::Arc;

use agent_core::{
    InputSchema, ParamType, ParameterSchema, Tool, ToolArgs, ToolError, ToolOutput, ToolProvider,
    ToolSpec,
};
use async_trait::async_trait;
use serde_json::json;

use super::optional_address_arg;
use crate::model::Chain;
use crate::token::from_base_units;
use crate::wallet::WalletClient;

/// Native coins use 18 decimals on every supported chain
const NATIVE_DECIMALS: u8 = 18;

/// Tool returning the wallet's own address
pub struct GetAddressTool {
    wallet: Arc<dyn WalletClient>,
}

impl GetAddressTool {
    pub fn new(wallet: Arc<dyn WalletClient>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl Tool for GetAddressTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_address",
            "Get the address of the wallet",
            InputSchema::empty(),
        )
        .category("wallet")
    }

    async fn execute(&self, _args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        Ok(self.wallet.address().to_string().into())
    }
}

/// Tool describing the chain the wallet is connected to
pub struct GetChainTool {
    wallet: Arc<dyn WalletClient>,
}

impl GetChainTool {
    pub fn new(wallet: Arc<dyn WalletClient>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl Tool for GetChainTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_chain",
            "Get the chain of the wallet",
            InputSchema::empty(),
        )
        .category("wallet")
    }

    async fn execute(&self, _args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let id = self.wallet.chain_id().await?;
        let chain = Chain::from_id(id);

        Ok(json!({
            "type": "evm",
            "id": id,
            "name": chain.map(|c| c.name),
            "nativeCurrency": chain.map(|c| c.native_symbol),
        })
        .into())
    }
}

/// Tool returning a native coin balance
pub struct GetBalanceTool {
    wallet: Arc<dyn WalletClient>,
}

impl GetBalanceTool {
    pub fn new(wallet: Arc<dyn WalletClient>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl Tool for GetBalanceTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_balance",
            "Get the native coin balance of an address. Defaults to the wallet's own address.",
            InputSchema::empty().param(ParameterSchema::optional(
                "address",
                ParamType::String,
                "The address to get the balance of",
            )),
        )
        .category("wallet")
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let address = optional_address_arg(args, "address")?.unwrap_or_else(|| self.wallet.address());
        let wei = self.wallet.balance(address).await?;
        let symbol = Chain::from_id(self.wallet.chain_id().await?)
            .map_or("ETH", |c| c.native_symbol);

        Ok(json!({
            "address": address.to_string(),
            "balance": from_base_units(wei, NATIVE_DECIMALS)?.to_string(),
            "baseUnits": wei.to_string(),
            "symbol": symbol,
        })
        .into())
    }
}

/// Provider for the core wallet tools; always registered first
pub struct WalletToolProvider {
    wallet: Arc<dyn WalletClient>,
}

impl WalletToolProvider {
    pub fn new(wallet: Arc<dyn WalletClient>) -> Self {
        Self { wallet }
    }
}

impl ToolProvider for WalletToolProvider {
    fn name(&self) -> &str {
        "wallet"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(GetAddressTool::new(Arc::clone(&self.wallet))),
            Arc::new(GetChainTool::new(Arc::clone(&self.wallet))),
            Arc::new(GetBalanceTool::new(Arc::clone(&self.wallet))),
        ]
    }
}
