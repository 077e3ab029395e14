//! A thin client for the CoinGate merchant REST API.
//!
//! Only the calls the gateway needs are implemented: creating, fetching and cancelling orders, and fetching the list
//! of IP addresses that CoinGate sends payment callbacks from.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::CoinGateApi;
pub use config::CoinGateConfig;
pub use data_objects::NewCoinGateOrder;
pub use error::CoinGateApiError;
