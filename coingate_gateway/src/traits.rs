//! The seams between the HTTP layer and CoinGate. The server is written against these traits so that handlers and the
//! allowlist cache can be exercised with mocks.
use coingate_tools::{CoinGateApiError, NewCoinGateOrder};
use serde_json::Value;

/// Order operations against the payment processor. Each call is a single attempt; a failure of any kind is returned
/// as an error and never retried.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Create a new order and return the processor's representation of it.
    async fn create_order(&self, order: &NewCoinGateOrder) -> Result<Value, CoinGateApiError>;
    async fn retrieve_order(&self, order_id: &str) -> Result<Value, CoinGateApiError>;
    async fn cancel_order(&self, order_id: &str) -> Result<Value, CoinGateApiError>;
}

/// A source for the list of IP addresses that payment callbacks are allowed to come from.
#[allow(async_fn_in_trait)]
pub trait CallbackIpSource {
    /// Fetch the current list. The strings are not validated here.
    async fn fetch_callback_ips(&self) -> Result<Vec<String>, CoinGateApiError>;
}
