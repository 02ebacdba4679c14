//! ERC-20 Tools
//!
//! Token lookup, balances, allowances, transfers and unit conversion for a
//! configured token set. All on-chain amounts are base units (strings, since
//! they routinely exceed 2^53).

use std::sync::Arc;

use agent_core::{
    InputSchema, ParamType, ParameterSchema, Tool, ToolArgs, ToolError, ToolOutput, ToolProvider,
    ToolSpec,
};
use async_trait::async_trait;
use serde_json::json;

use super::{address_arg, decimal_arg, decimals_arg, optional_address_arg, u128_arg};
use crate::abi;
use crate::error::WalletError;
use crate::model::{Address, TransactionRequest};
use crate::token::{Token, from_base_units, to_base_units};
use crate::wallet::WalletClient;

/// Wallet plus the tokens the tools know by symbol
struct TokenSet {
    wallet: Arc<dyn WalletClient>,
    tokens: Vec<Token>,
}

impl TokenSet {
    fn by_symbol(&self, symbol: &str) -> Result<&Token, WalletError> {
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol.trim()))
            .ok_or_else(|| WalletError::UnsupportedToken(symbol.to_string()))
    }

    async fn by_address(&self, address: Address) -> Result<Option<&Token>, WalletError> {
        let chain_id = self.wallet.chain_id().await?;
        Ok(self
            .tokens
            .iter()
            .find(|t| t.address_on(chain_id) == Some(address)))
    }

    /// Base units plus a human-readable amount when the token is known
    async fn describe(&self, token: Address, amount: u128) -> Result<serde_json::Value, WalletError> {
        let mut out = json!({ "baseUnits": amount.to_string() });
        if let Some(known) = self.by_address(token).await? {
            out["amount"] = json!(known.from_base_units(amount)?.to_string());
            out["symbol"] = json!(known.symbol);
        }
        Ok(out)
    }
}

fn token_address_param() -> ParameterSchema {
    ParameterSchema::required(
        "tokenAddress",
        ParamType::String,
        "The contract address of the token",
    )
}

fn base_amount_param(description: &str) -> ParameterSchema {
    ParameterSchema::required("amount", ParamType::String, description)
}

pub struct GetTokenInfoBySymbolTool {
    set: Arc<TokenSet>,
}

#[async_trait]
impl Tool for GetTokenInfoBySymbolTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_token_info_by_symbol",
            "Get the ERC20 token info by its symbol, including the contract address, decimals, and name",
            InputSchema::empty().param(ParameterSchema::required(
                "symbol",
                ParamType::String,
                "The symbol of the token to get the info of",
            )),
        )
        .category("erc20")
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let symbol = args
            .get("symbol")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_argument("missing argument 'symbol'"))?;

        let token = self.set.by_symbol(symbol)?;
        let chain_id = self.set.wallet.chain_id().await?;
        let address = token.address_on(chain_id).ok_or_else(|| {
            WalletError::UnsupportedToken(format!("{} on chain {chain_id}", token.symbol))
        })?;

        Ok(json!({
            "symbol": token.symbol,
            "contractAddress": address.to_string(),
            "decimals": token.decimals,
            "name": token.name,
        })
        .into())
    }
}

pub struct GetTokenBalanceTool {
    set: Arc<TokenSet>,
}

#[async_trait]
impl Tool for GetTokenBalanceTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_token_balance",
            "Get the balance of an ERC20 token in base units. Convert to decimal units before returning.",
            InputSchema::new(vec![
                ParameterSchema::optional(
                    "wallet",
                    ParamType::String,
                    "The address to get the balance of (defaults to this wallet)",
                ),
                token_address_param(),
            ]),
        )
        .category("erc20")
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let owner = optional_address_arg(args, "wallet")?.unwrap_or_else(|| self.set.wallet.address());
        let token = address_arg(args, "tokenAddress")?;

        let balance = self.set.wallet.token_balance(token, owner).await?;
        Ok(self.set.describe(token, balance).await?.into())
    }
}

pub struct GetTokenAllowanceTool {
    set: Arc<TokenSet>,
}

#[async_trait]
impl Tool for GetTokenAllowanceTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_token_allowance",
            "Get the allowance of an ERC20 token in base units",
            InputSchema::new(vec![
                token_address_param(),
                ParameterSchema::optional(
                    "owner",
                    ParamType::String,
                    "The token owner (defaults to this wallet)",
                ),
                ParameterSchema::required(
                    "spender",
                    ParamType::String,
                    "The address allowed to spend the tokens",
                ),
            ]),
        )
        .category("erc20")
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let token = address_arg(args, "tokenAddress")?;
        let owner = optional_address_arg(args, "owner")?.unwrap_or_else(|| self.set.wallet.address());
        let spender = address_arg(args, "spender")?;

        let allowance = self
            .set
            .wallet
            .token_allowance(token, owner, spender)
            .await?;
        Ok(self.set.describe(token, allowance).await?.into())
    }
}

pub struct TransferTool {
    set: Arc<TokenSet>,
}

#[async_trait]
impl Tool for TransferTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "transfer",
            "Transfer an amount of an ERC20 token to an address",
            InputSchema::new(vec![
                token_address_param(),
                ParameterSchema::required(
                    "to",
                    ParamType::String,
                    "The address to transfer the token to",
                ),
                base_amount_param("The amount of tokens to transfer in base units"),
            ]),
        )
        .category("erc20")
        .with_side_effects()
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let token = address_arg(args, "tokenAddress")?;
        let to = address_arg(args, "to")?;
        let amount = u128_arg(args, "amount")?;

        let hash = self
            .set
            .wallet
            .send_transaction(&TransactionRequest::call(token, abi::transfer(to, amount)))
            .await?;

        tracing::info!(token = %token, to = %to, amount, "ERC-20 transfer sent");
        Ok(hash.into())
    }
}

pub struct ApproveTool {
    set: Arc<TokenSet>,
}

#[async_trait]
impl Tool for ApproveTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "approve",
            "Approve an amount of an ERC20 token to an address",
            InputSchema::new(vec![
                token_address_param(),
                ParameterSchema::required(
                    "spender",
                    ParamType::String,
                    "The address to approve the allowance to",
                ),
                base_amount_param("The amount of tokens to approve in base units"),
            ]),
        )
        .category("erc20")
        .with_side_effects()
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let token = address_arg(args, "tokenAddress")?;
        let spender = address_arg(args, "spender")?;
        let amount = u128_arg(args, "amount")?;

        let hash = self
            .set
            .wallet
            .send_transaction(&TransactionRequest::call(token, abi::approve(spender, amount)))
            .await?;

        Ok(hash.into())
    }
}

pub struct ConvertToBaseUnitTool;

#[async_trait]
impl Tool for ConvertToBaseUnitTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "convert_to_base_unit",
            "Convert an amount of an ERC20 token to its base unit",
            InputSchema::new(vec![
                ParameterSchema::required(
                    "amount",
                    ParamType::Number,
                    "The amount of tokens to convert from decimal units to base units",
                ),
                ParameterSchema::required(
                    "decimals",
                    ParamType::Integer,
                    "The number of decimals of the token",
                ),
            ]),
        )
        .category("erc20")
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let amount = decimal_arg(args, "amount")?;
        let decimals = decimals_arg(args, "decimals")?;
        Ok(to_base_units(amount, decimals)?.to_string().into())
    }
}

pub struct ConvertFromBaseUnitTool;

#[async_trait]
impl Tool for ConvertFromBaseUnitTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "convert_from_base_unit",
            "Convert an amount of an ERC20 token from its base unit to its decimal unit",
            InputSchema::new(vec![
                base_amount_param("The amount of tokens to convert from base units to decimal units"),
                ParameterSchema::required(
                    "decimals",
                    ParamType::Integer,
                    "The number of decimals of the token",
                ),
            ]),
        )
        .category("erc20")
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let amount = u128_arg(args, "amount")?;
        let decimals = decimals_arg(args, "decimals")?;
        Ok(from_base_units(amount, decimals)?.to_string().into())
    }
}

/// ERC-20 plugin for a fixed token set
pub struct Erc20Provider {
    set: Arc<TokenSet>,
}

impl Erc20Provider {
    pub fn new(wallet: Arc<dyn WalletClient>, tokens: Vec<Token>) -> Self {
        Self {
            set: Arc::new(TokenSet { wallet, tokens }),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.set.tokens
    }
}

impl ToolProvider for Erc20Provider {
    fn name(&self) -> &str {
        "erc20"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let set = || Arc::clone(&self.set);
        vec![
            Arc::new(GetTokenInfoBySymbolTool { set: set() }),
            Arc::new(GetTokenBalanceTool { set: set() }),
            Arc::new(TransferTool { set: set() }),
            Arc::new(GetTokenAllowanceTool { set: set() }),
            Arc::new(ApproveTool { set: set() }),
            Arc::new(ConvertToBaseUnitTool),
            Arc::new(ConvertFromBaseUnitTool),
        ]
    }
}
