use std::net::IpAddr;

use coingate_tools::{CoinGateApi, CoinGateApiError, NewCoinGateOrder};
use log::*;
use serde_json::Value;

use crate::traits::{CallbackIpSource, OrderManagement};

impl OrderManagement for CoinGateApi {
    async fn create_order(&self, order: &NewCoinGateOrder) -> Result<Value, CoinGateApiError> {
        CoinGateApi::create_order(self, order).await
    }

    async fn retrieve_order(&self, order_id: &str) -> Result<Value, CoinGateApiError> {
        CoinGateApi::retrieve_order(self, order_id).await
    }

    async fn cancel_order(&self, order_id: &str) -> Result<Value, CoinGateApiError> {
        CoinGateApi::cancel_order(self, order_id).await
    }
}

impl CallbackIpSource for CoinGateApi {
    async fn fetch_callback_ips(&self) -> Result<Vec<String>, CoinGateApiError> {
        CoinGateApi::fetch_callback_ips(self).await
    }
}

/// Where the server gets its callback allowlist from: CoinGate's published list, or a fixed list from the
/// configuration.
#[derive(Clone)]
pub enum CallbackIpProvider {
    CoinGate(CoinGateApi),
    Static(Vec<IpAddr>),
}

impl CallbackIpSource for CallbackIpProvider {
    async fn fetch_callback_ips(&self) -> Result<Vec<String>, CoinGateApiError> {
        match self {
            Self::CoinGate(api) => CoinGateApi::fetch_callback_ips(api).await,
            Self::Static(ips) => {
                trace!("Using the static callback IP allowlist ({} entries)", ips.len());
                Ok(ips.iter().map(IpAddr::to_string).collect())
            },
        }
    }
}
