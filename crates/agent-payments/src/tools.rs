//! Checkout Tools
//!
//! `create_order` places an order and pays for it from the agent's wallet;
//! `get_order` reports its status.

use std::sync::Arc;

use agent_core::{
    InputSchema, ParamType, ParameterSchema, Tool, ToolArgs, ToolError, ToolOutput, ToolProvider,
    ToolSpec,
};
use async_trait::async_trait;
use onchain_tools::{Address, UnsignedTransaction, WalletClient};
use serde_json::{Value, json};

use crate::checkout::{CheckoutApi, OrderRequest, payment_method};
use crate::error::{PaymentError, Result};

const DEFAULT_CURRENCY: &str = "usdc";

/// Tool that creates and pays for an order
pub struct CreateOrderTool {
    api: Arc<dyn CheckoutApi>,
    wallet: Arc<dyn WalletClient>,
}

impl CreateOrderTool {
    pub fn new(api: Arc<dyn CheckoutApi>, wallet: Arc<dyn WalletClient>) -> Self {
        Self { api, wallet }
    }

    async fn prepare(&self, args: &ToolArgs) -> Result<OrderRequest> {
        let mut request: OrderRequest = serde_json::from_value(Value::Object(args.clone()))
            .map_err(|e| PaymentError::InvalidOrder(e.to_string()))?;

        let own = self.wallet.address();
        let payer: Address = request
            .payment
            .payer_address
            .parse()
            .map_err(|_| PaymentError::InvalidOrder("payment.payerAddress is not an address".into()))?;
        if payer != own {
            return Err(PaymentError::InvalidOrder(format!(
                "payment.payerAddress must be the wallet address {own}"
            )));
        }

        if request.payment.method.is_none() {
            let chain_id = self.wallet.chain_id().await?;
            let method = payment_method(chain_id).ok_or_else(|| {
                PaymentError::Config(format!("no checkout payment method for chain {chain_id}"))
            })?;
            request.payment.method = Some(method.to_string());
        }
        request
            .payment
            .currency
            .get_or_insert_with(|| DEFAULT_CURRENCY.to_string());

        request.validate()?;
        Ok(request)
    }

    async fn place(&self, args: &ToolArgs) -> Result<Value> {
        let request = self.prepare(args).await?;
        let created = self.api.create_order(&request).await?;
        let order = created.order;

        if let Some(reason) = order.failure_reason() {
            return Err(PaymentError::PaymentFailed(reason.to_string()));
        }

        let serialized = order.serialized_transaction().ok_or_else(|| {
            PaymentError::PaymentFailed(
                "No serialized transaction found for order, this item may not be available for purchase"
                    .into(),
            )
        })?;

        let tx = UnsignedTransaction::parse(serialized)?;
        let hash = self.wallet.send_transaction(&tx.request()).await?;

        tracing::info!(order_id = %order.order_id, hash = %hash, "Order payment submitted");

        Ok(json!({
            "order": order,
            "txId": hash,
        }))
    }
}

#[async_trait]
impl Tool for CreateOrderTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "create_order",
            "Buy a product by creating a checkout order and paying for it from the wallet. \
             Requires the recipient's email and shipping address, the product locator \
             (e.g. 'amazon:B08SVZ775L') and the wallet address as payer.",
            InputSchema::new(vec![
                ParameterSchema::required(
                    "recipient",
                    ParamType::Object,
                    "{email, physicalAddress: {name, line1, line2?, city, state?, postalCode, country}}",
                ),
                ParameterSchema::required(
                    "payment",
                    ParamType::Object,
                    "{payerAddress, method?, currency?, receiptEmail?}; payerAddress must be the address returned by get_address",
                ),
                ParameterSchema::required(
                    "lineItems",
                    ParamType::Array,
                    "Items to buy, e.g. [{\"productLocator\": \"amazon:B08SVZ775L\"}]",
                ),
                ParameterSchema::optional("locale", ParamType::String, "Locale of the order")
                    .with_default(json!("en-US")),
            ]),
        )
        .category("checkout")
        .with_side_effects()
    }

    async fn execute(&self, args: &ToolArgs) -> std::result::Result<ToolOutput, ToolError> {
        self.place(args)
            .await
            .map(ToolOutput::from)
            .map_err(ToolError::from)
    }
}

/// Tool that fetches an order's status
pub struct GetOrderTool {
    api: Arc<dyn CheckoutApi>,
}

impl GetOrderTool {
    pub fn new(api: Arc<dyn CheckoutApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for GetOrderTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_order",
            "Fetch the current status of an order by its id",
            InputSchema::empty().param(ParameterSchema::required(
                "orderId",
                ParamType::String,
                "The id of the order",
            )),
        )
        .category("checkout")
    }

    async fn execute(&self, args: &ToolArgs) -> std::result::Result<ToolOutput, ToolError> {
        let order_id = args
            .get("orderId")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ToolError::invalid_argument("orderId must not be empty"))?;

        let order = self.api.get_order(order_id).await?;
        let value = serde_json::to_value(order).map_err(PaymentError::from)?;
        Ok(value.into())
    }
}

/// Headless checkout plugin
pub struct CheckoutToolProvider {
    api: Arc<dyn CheckoutApi>,
    wallet: Arc<dyn WalletClient>,
}

impl CheckoutToolProvider {
    pub fn new(api: Arc<dyn CheckoutApi>, wallet: Arc<dyn WalletClient>) -> Self {
        Self { api, wallet }
    }
}

impl ToolProvider for CheckoutToolProvider {
    fn name(&self) -> &str {
        "checkout"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(CreateOrderTool::new(
                Arc::clone(&self.api),
                Arc::clone(&self.wallet),
            )),
            Arc::new(GetOrderTool::new(Arc::clone(&self.api))),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{CreatedOrder, Order};
    use onchain_tools::{Chain, MockWalletClient, abi, usdc};
    use std::sync::Mutex;

    const ME: &str = "0x00000000000000000000000000000000000000aa";
    const MERCHANT: &str = "0x00000000000000000000000000000000000000cc";

    /// Checkout API returning a canned order
    struct FakeCheckout {
        response: serde_json::Value,
        requests: Mutex<Vec<OrderRequest>>,
    }

    #[async_trait]
    impl CheckoutApi for FakeCheckout {
        async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(serde_json::from_value(self.response.clone())?)
        }

        async fn get_order(&self, order_id: &str) -> Result<Order> {
            if order_id == "missing" {
                return Err(PaymentError::Api {
                    status: 404,
                    message: "Order not found".into(),
                });
            }
            Ok(serde_json::from_value(self.response["order"].clone())?)
        }
    }

    /// EIP-1559 payment transaction transferring `amount` of `token`
    fn serialized_payment(token: Address, to: Address, amount: u128) -> String {
        let data = abi::transfer(to, amount);
        let mut payload = vec![0x82, 0x21, 0x05, 0x80, 0x80, 0x80, 0x80, 0x94];
        payload.extend_from_slice(token.as_bytes());
        payload.push(0x80);
        payload.push(0xb8);
        payload.push(u8::try_from(data.len()).unwrap());
        payload.extend(data);
        payload.push(0xc0);

        let mut raw = vec![0x02, 0xf8, u8::try_from(payload.len()).unwrap()];
        raw.extend(payload);
        abi::to_hex(&raw)
    }

    fn order_args(payer: &str) -> ToolArgs {
        json!({
            "recipient": {
                "email": "me@example.com",
                "physicalAddress": {
                    "name": "Jane Doe",
                    "line1": "1 Main St",
                    "city": "Springfield",
                    "state": "IL",
                    "postalCode": "62701",
                    "country": "US"
                }
            },
            "payment": {"payerAddress": payer},
            "lineItems": [{"productLocator": "amazon:B08SVZ775L"}]
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn setup(order: serde_json::Value) -> (Arc<MockWalletClient>, Arc<FakeCheckout>, CheckoutToolProvider) {
        let me: Address = ME.parse().unwrap();
        let usdc_base = usdc().address_on(Chain::BASE.id).unwrap();
        let wallet = Arc::new(MockWalletClient::new(me).with_token_balance(usdc_base, me, 50_000_000));
        let api = Arc::new(FakeCheckout {
            response: json!({"clientSecret": "s", "order": order}),
            requests: Mutex::new(Vec::new()),
        });
        let provider = CheckoutToolProvider::new(api.clone(), wallet.clone());
        (wallet, api, provider)
    }

    #[tokio::test]
    async fn test_create_order_pays_from_wallet() {
        let usdc_base = usdc().address_on(Chain::BASE.id).unwrap();
        let merchant: Address = MERCHANT.parse().unwrap();
        let (wallet, api, provider) = setup(json!({
            "orderId": "ord_1",
            "phase": "payment",
            "payment": {
                "status": "awaiting-payment",
                "preparation": {
                    "chain": "base",
                    "serializedTransaction": serialized_payment(usdc_base, merchant, 19_990_000)
                }
            }
        }));

        let out = CreateOrderTool::new(api.clone(), wallet.clone())
            .execute(&order_args(ME))
            .await
            .unwrap();

        let ToolOutput::Json(result) = out else {
            panic!("expected json output");
        };
        assert_eq!(result["order"]["orderId"], "ord_1");
        assert!(result["txId"].as_str().unwrap().starts_with("0x"));
        assert_eq!(
            wallet.token_balance(usdc_base, merchant).await.unwrap(),
            19_990_000
        );

        let sent = api.requests.lock().unwrap()[0].clone();
        assert_eq!(sent.payment.method.as_deref(), Some("base"));
        assert_eq!(sent.payment.currency.as_deref(), Some("usdc"));
        assert_eq!(provider.tools().len(), 2);
    }

    #[tokio::test]
    async fn test_foreign_payer_is_rejected_before_ordering() {
        let (wallet, api, _) = setup(json!({"orderId": "ord_2"}));

        let err = CreateOrderTool::new(api.clone(), wallet.clone())
            .execute(&order_args(MERCHANT))
            .await
            .unwrap_err();

        assert_eq!(err.code, "invalid_argument");
        assert!(api.requests.lock().unwrap().is_empty());
        assert!(wallet.sent_transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_order_without_transaction_fails() {
        let (wallet, api, _) = setup(json!({
            "orderId": "ord_3",
            "payment": {"status": "crypto-payer-insufficient-funds"}
        }));

        let err = CreateOrderTool::new(api, wallet.clone())
            .execute(&order_args(ME))
            .await
            .unwrap_err();

        assert_eq!(err.code, "checkout_error");
        assert!(err.message.contains("No serialized transaction"));
        assert!(wallet.sent_transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_order() {
        let (_, api, _) = setup(json!({"orderId": "ord_4", "phase": "delivery"}));
        let tool = GetOrderTool::new(api);

        let out = tool
            .execute(&json!({"orderId": "ord_4"}).as_object().cloned().unwrap())
            .await
            .unwrap();
        let ToolOutput::Json(order) = out else {
            panic!("expected json output");
        };
        assert_eq!(order["phase"], "delivery");

        let err = tool
            .execute(&json!({"orderId": "missing"}).as_object().cloned().unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code, "checkout_error");
    }
}
