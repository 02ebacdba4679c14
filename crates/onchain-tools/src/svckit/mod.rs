//! Service Kit - Agent Tools
//!
//! Domain-specific tools that implement `agent_core::Tool`, grouped into the
//! providers the CLI registers.

mod erc20;
mod wallet;

pub use erc20::{
    ApproveTool, ConvertFromBaseUnitTool, ConvertToBaseUnitTool, Erc20Provider,
    GetTokenAllowanceTool, GetTokenBalanceTool, GetTokenInfoBySymbolTool, TransferTool,
};
pub use wallet::{GetAddressTool, GetBalanceTool, GetChainTool, WalletToolProvider};

use std::str::FromStr;

use agent_core::{ToolArgs, ToolError};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::model::Address;

fn missing(name: &str) -> ToolError {
    ToolError::invalid_argument(format!("missing argument '{name}'"))
}

/// Required address argument
pub(crate) fn address_arg(args: &ToolArgs, name: &str) -> Result<Address, ToolError> {
    optional_address_arg(args, name)?.ok_or_else(|| missing(name))
}

pub(crate) fn optional_address_arg(
    args: &ToolArgs,
    name: &str,
) -> Result<Option<Address>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => raw.parse().map(Some).map_err(ToolError::from),
        Some(other) => Err(ToolError::invalid_argument(format!(
            "'{name}' must be an address string, got {other}"
        ))),
    }
}

/// Base-unit integer, given either as a JSON integer or a decimal string
pub(crate) fn u128_arg(args: &ToolArgs, name: &str) -> Result<u128, ToolError> {
    let invalid = |v: &Value| {
        ToolError::invalid_argument(format!("'{name}' must be a non-negative integer, got {v}"))
    };

    match args.get(name) {
        None | Some(Value::Null) => Err(missing(name)),
        Some(v @ Value::Number(n)) => n.as_u64().map(u128::from).ok_or_else(|| invalid(v)),
        Some(v @ Value::String(raw)) => raw.trim().parse().map_err(|_| invalid(v)),
        Some(v) => Err(invalid(v)),
    }
}

/// Exact decimal amount from a JSON number or string
pub(crate) fn decimal_arg(args: &ToolArgs, name: &str) -> Result<Decimal, ToolError> {
    let raw = match args.get(name) {
        None | Some(Value::Null) => return Err(missing(name)),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(v) => {
            return Err(ToolError::invalid_argument(format!(
                "'{name}' must be a number, got {v}"
            )));
        }
    };

    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| ToolError::invalid_argument(format!("'{name}' is not a decimal: {raw}")))
}

pub(crate) fn decimals_arg(args: &ToolArgs, name: &str) -> Result<u8, ToolError> {
    let value = u128_arg(args, name)?;
    u8::try_from(value)
        .ok()
        .filter(|d| *d <= 28)
        .ok_or_else(|| ToolError::invalid_argument(format!("'{name}' must be between 0 and 28")))
}
