use std::fmt::Display;

use coingate_tools::NewCoinGateOrder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ServerError;

/// The body of a create-order request, as sent by internal clients.
///
/// Any `callback_url` the client sends is ignored; the gateway always supplies its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub order_id: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub currency: Option<Value>,
    #[serde(default)]
    pub cancel_url: Option<String>,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateOrderRequest {
    /// Parses a raw request body. An empty body is treated as a request with no fields at all, so that it is reported
    /// as missing parameters rather than as a malformed payload.
    pub fn from_body(body: &[u8]) -> Result<Self, ServerError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value = serde_json::from_slice::<Value>(body)
            .map_err(|e| ServerError::CouldNotDeserializePayload(e.to_string()))?;
        // serde would otherwise fill the fields of a JSON array by position
        if !value.is_object() {
            return Err(ServerError::CouldNotDeserializePayload("The order must be a JSON object".into()));
        }
        serde_json::from_value(value).map_err(|e| ServerError::CouldNotDeserializePayload(e.to_string()))
    }

    pub fn has_required_fields(&self) -> bool {
        is_present(self.order_id.as_ref()) && is_present(self.amount.as_ref()) && is_present(self.currency.as_ref())
    }

    /// Maps the request onto CoinGate's field names, attaching the gateway's own callback URL.
    pub fn into_coingate_order(self, callback_url: &str) -> Result<NewCoinGateOrder, ServerError> {
        if !self.has_required_fields() {
            return Err(ServerError::MissingOrderParameters);
        }
        let (Some(order_id), Some(price_amount), Some(currency)) = (self.order_id, self.amount, self.currency) else {
            return Err(ServerError::MissingOrderParameters);
        };
        let price_currency = match currency {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(NewCoinGateOrder {
            order_id,
            price_amount,
            price_currency,
            callback_url: Some(callback_url.to_string()),
            cancel_url: self.cancel_url,
            success_url: self.success_url,
            title: self.title,
            description: self.description,
        })
    }
}

/// A value is present if it is not null, not a blank string and not an empty array or object.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(_) => true,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}
