//! JSON-RPC Wallet Client
//!
//! Talks to an Ethereum node over HTTP. Nonce, gas and fees are read from the
//! node, the transaction is signed with the local key and submitted through
//! `eth_sendRawTransaction`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use super::WalletClient;
use crate::abi::{from_hex, parse_quantity, to_hex};
use crate::error::{Result, WalletError};
use crate::model::{Address, TransactionRequest};
use crate::signer::{Fees, LocalSigner, Transaction};

/// Extra gas on top of `eth_estimateGas`, in percent
const GAS_HEADROOM_PERCENT: u128 = 20;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Wallet backed by an Ethereum JSON-RPC endpoint
pub struct RpcWalletClient {
    http: reqwest::Client,
    url: String,
    signer: LocalSigner,
    next_id: AtomicU64,
}

impl RpcWalletClient {
    pub fn new(url: impl Into<String>, signer: LocalSigner) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            url: url.into(),
            signer,
            next_id: AtomicU64::new(1),
        })
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        tracing::debug!(method, "JSON-RPC request");

        let response: JsonRpcResponse = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(WalletError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        let result = response
            .result
            .ok_or_else(|| WalletError::Decode(format!("{method} returned no result")))?;
        Ok(serde_json::from_value(result)?)
    }

    fn call_object(&self, request: &TransactionRequest) -> Value {
        let mut object = json!({
            "from": self.signer.address().to_string(),
            "value": format!("{:#x}", request.value),
            "data": to_hex(&request.data),
        });
        if let Some(to) = request.to {
            object["to"] = json!(to.to_string());
        }
        object
    }

    async fn quantity(&self, method: &str, params: Value) -> Result<u128> {
        let raw: String = self.request(method, params).await?;
        parse_quantity(&raw)
    }

    /// EIP-1559 fees when the latest block has a base fee, `gasPrice` otherwise
    async fn fees(&self) -> Result<Fees> {
        let block: Value = self
            .request("eth_getBlockByNumber", json!(["latest", false]))
            .await?;

        match base_fee(&block)? {
            Some(base_fee) => {
                let tip = self.quantity("eth_maxPriorityFeePerGas", json!([])).await?;
                Ok(dynamic_fees(base_fee, tip))
            }
            None => Ok(Fees::Legacy {
                gas_price: self.quantity("eth_gasPrice", json!([])).await?,
            }),
        }
    }

    async fn prepare(&self, request: &TransactionRequest) -> Result<Transaction> {
        let chain_id = self.chain_id().await?;
        let nonce = self
            .quantity(
                "eth_getTransactionCount",
                json!([self.signer.address().to_string(), "pending"]),
            )
            .await?;
        let nonce =
            u64::try_from(nonce).map_err(|_| WalletError::Decode(format!("nonce {nonce}")))?;
        let estimate = self
            .quantity("eth_estimateGas", json!([self.call_object(request)]))
            .await?;
        let fees = self.fees().await?;

        tracing::debug!(chain_id, nonce, estimate = %estimate, ?fees, "Transaction prepared");
        Ok(Transaction::new(
            request,
            chain_id,
            nonce,
            with_headroom(estimate),
            fees,
        ))
    }
}

fn base_fee(block: &Value) -> Result<Option<u128>> {
    block
        .get("baseFeePerGas")
        .and_then(Value::as_str)
        .map(parse_quantity)
        .transpose()
}

/// Fee cap of twice the base fee plus the tip
fn dynamic_fees(base_fee: u128, tip: u128) -> Fees {
    Fees::DynamicFee {
        max_fee_per_gas: base_fee.saturating_mul(2).saturating_add(tip),
        max_priority_fee_per_gas: tip,
    }
}

fn with_headroom(estimate: u128) -> u128 {
    estimate.saturating_add(estimate.saturating_mul(GAS_HEADROOM_PERCENT) / 100)
}

#[async_trait]
impl WalletClient for RpcWalletClient {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn chain_id(&self) -> Result<u64> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        let id = parse_quantity(&raw)?;
        u64::try_from(id).map_err(|_| WalletError::Decode(format!("chain id {raw}")))
    }

    async fn balance(&self, address: Address) -> Result<u128> {
        let raw: String = self
            .request("eth_getBalance", json!([address.to_string(), "latest"]))
            .await?;
        parse_quantity(&raw)
    }

    async fn call(&self, request: &TransactionRequest) -> Result<Vec<u8>> {
        let raw: String = self
            .request("eth_call", json!([self.call_object(request), "latest"]))
            .await?;
        from_hex(&raw)
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<String> {
        let tx = self.prepare(request).await?;
        let raw = self.signer.sign_transaction(&tx)?;
        let hash: String = self
            .request("eth_sendRawTransaction", json!([to_hex(&raw)]))
            .await?;

        tracing::info!(hash = %hash, to = ?request.to.map(|a| a.to_string()), "Transaction submitted");
        Ok(hash)
    }

    fn name(&self) -> &str {
        "JsonRpc"
    }
}
