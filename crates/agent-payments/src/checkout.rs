//! Crossmint Headless Checkout Integration
//!
//! Orders are created server-side; the API answers with an unsigned payment
//! transaction the buyer's wallet has to submit.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PaymentError, Result};

const API_VERSION: &str = "2022-06-09";
pub const PRODUCTION_URL: &str = "https://www.crossmint.com";
pub const STAGING_URL: &str = "https://staging.crossmint.com";

/// Shipping address of the recipient
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalAddress {
    pub name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_address: Option<PhysicalAddress>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Chain to pay on (`base`, `base-sepolia`, ...)
    #[serde(default)]
    pub method: Option<String>,
    /// Token to pay with
    #[serde(default)]
    pub currency: Option<String>,
    pub payer_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_email: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// e.g. `amazon:B08SVZ775L`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_locator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_locator: Option<String>,
}

/// Request to create an order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub recipient: Recipient,
    pub payment: Payment,
    pub line_items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl OrderRequest {
    /// Reject requests the API would bounce anyway
    pub fn validate(&self) -> Result<()> {
        if !self.recipient.email.contains('@') {
            return Err(PaymentError::InvalidOrder(format!(
                "recipient.email '{}' is not an email address",
                self.recipient.email
            )));
        }
        if self.line_items.is_empty() {
            return Err(PaymentError::InvalidOrder("lineItems is empty".into()));
        }
        if self
            .line_items
            .iter()
            .any(|i| i.product_locator.is_none() && i.collection_locator.is_none())
        {
            return Err(PaymentError::InvalidOrder(
                "every line item needs a productLocator".into(),
            ));
        }
        Ok(())
    }
}

/// Prepared payment returned with a new order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPreparation {
    #[serde(default)]
    pub chain: Option<String>,
    #[serde(default)]
    pub payer_address: Option<String>,
    #[serde(default)]
    pub serialized_transaction: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayment {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub preparation: Option<PaymentPreparation>,
    #[serde(default)]
    pub failure_reason: Option<Value>,
}

/// Order as reported by the checkout API. Fields the agent does not act on
/// are kept in `rest` and echoed back verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub payment: OrderPayment,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Order {
    pub fn serialized_transaction(&self) -> Option<&str> {
        self.payment
            .preparation
            .as_ref()
            .and_then(|p| p.serialized_transaction.as_deref())
    }

    pub fn failure_reason(&self) -> Option<&Value> {
        self.payment.failure_reason.as_ref().or_else(|| {
            self.payment
                .preparation
                .as_ref()
                .and_then(|p| p.failure_reason.as_ref())
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    #[serde(default)]
    pub client_secret: Option<String>,
    pub order: Order,
}

/// Checkout backend (Strategy pattern)
#[async_trait]
pub trait CheckoutApi: Send + Sync {
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder>;

    async fn get_order(&self, order_id: &str) -> Result<Order>;
}

/// Crossmint REST client
pub struct CrossmintClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl CrossmintClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PaymentError::Config("Crossmint API key is empty".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn orders_url(&self) -> String {
        format!("{}/api/{API_VERSION}/orders", self.base_url)
    }

    /// URL of one order; the id is percent-encoded as a single path segment
    fn order_url(&self, order_id: &str) -> Result<reqwest::Url> {
        if order_id.trim().is_empty() {
            return Err(PaymentError::InvalidOrder("order id is empty".into()));
        }
        let mut url = reqwest::Url::parse(&self.orders_url())
            .map_err(|e| PaymentError::Config(format!("invalid checkout URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| PaymentError::Config("checkout URL cannot have a path".into()))?
            .push(order_id);
        Ok(url)
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PaymentError::RateLimited);
        }
        if !status.is_success() {
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Pull `message` out of an error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl CheckoutApi for CrossmintClient {
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder> {
        let response = self
            .http
            .post(self.orders_url())
            .header("X-API-KEY", &self.api_key)
            .json(request)
            .send()
            .await?;

        let created: CreatedOrder = Self::parse(response).await?;
        tracing::info!(order_id = %created.order.order_id, "Checkout order created");
        Ok(created)
    }

    async fn get_order(&self, order_id: &str) -> Result<Order> {
        let response = self
            .http
            .get(self.order_url(order_id)?)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?;

        Self::parse(response).await
    }
}

/// Payment method name for a chain id
pub const fn payment_method(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("ethereum"),
        11_155_111 => Some("ethereum-sepolia"),
        8453 => Some("base"),
        84532 => Some("base-sepolia"),
        137 => Some("polygon"),
        42161 => Some("arbitrum"),
        10 => Some("optimism"),
        _ => None,
    }
}
