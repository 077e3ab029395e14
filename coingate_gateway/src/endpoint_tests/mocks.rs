use coingate_tools::{CoinGateApiError, NewCoinGateOrder};
use mockall::mock;
use serde_json::Value;

use crate::traits::{CallbackIpSource, OrderManagement};

mock! {
    pub OrderManager {}
    impl OrderManagement for OrderManager {
        async fn create_order(&self, order: &NewCoinGateOrder) -> Result<Value, CoinGateApiError>;
        async fn retrieve_order(&self, order_id: &str) -> Result<Value, CoinGateApiError>;
        async fn cancel_order(&self, order_id: &str) -> Result<Value, CoinGateApiError>;
    }
}

mock! {
    pub IpSource {}
    impl CallbackIpSource for IpSource {
        async fn fetch_callback_ips(&self) -> Result<Vec<String>, CoinGateApiError>;
    }
}
