//! The order gateway sits between the route handlers and the payment processor.
//!
//! It validates and reshapes client requests, forwards them to the [`OrderManagement`] backend, and maps the
//! backend's failures onto operation-specific errors. Every upstream failure, whatever its cause, is reported the same
//! way for a given operation: a failed create is a server error, a failed fetch is "not found" and a failed cancel is
//! unprocessable. The cause is only logged.
use log::*;
use serde_json::Value;

use crate::{data_objects::CreateOrderRequest, errors::ServerError, traits::OrderManagement};

pub struct OrderGateway<B> {
    api: B,
    callback_url: String,
}

impl<B> OrderGateway<B>
where B: OrderManagement
{
    pub fn new(api: B, callback_url: String) -> Self {
        Self { api, callback_url }
    }

    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Value, ServerError> {
        let order = request.into_coingate_order(&self.callback_url)?;
        debug!("🧾️ Creating CoinGate order {}", order.order_id);
        self.api.create_order(&order).await.map_err(|e| {
            warn!("🧾️ Could not create CoinGate order {}. {e}", order.order_id);
            ServerError::OrderCreationFailed
        })
    }

    pub async fn retrieve_order(&self, order_id: &str) -> Result<Value, ServerError> {
        let order_id = non_blank_id(order_id)?;
        debug!("🧾️ Fetching CoinGate order {order_id}");
        self.api.retrieve_order(order_id).await.map_err(|e| {
            warn!("🧾️ Could not fetch CoinGate order {order_id}. {e}");
            ServerError::OrderNotFound(order_id.to_string())
        })
    }

    pub async fn cancel_order(&self, order_id: &str) -> Result<Value, ServerError> {
        let order_id = non_blank_id(order_id)?;
        debug!("🧾️ Cancelling CoinGate order {order_id}");
        self.api.cancel_order(order_id).await.map_err(|e| {
            warn!("🧾️ Could not cancel CoinGate order {order_id}. {e}");
            ServerError::OrderCancellationFailed(order_id.to_string())
        })
    }
}

fn non_blank_id(id: &str) -> Result<&str, ServerError> {
    let id = id.trim();
    if id.is_empty() {
        Err(ServerError::MissingOrderId)
    } else {
        Ok(id)
    }
}
