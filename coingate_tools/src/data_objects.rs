use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The body of a `POST /orders` call, using CoinGate's field names.
///
/// `price_amount` and `order_id` are kept as raw JSON values, since clients may send them as numbers or strings and
/// CoinGate accepts both. Optional fields that are `None` are left out of the request entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCoinGateOrder {
    pub order_id: Value,
    pub price_amount: Value,
    pub price_currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
