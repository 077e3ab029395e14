use std::time::Duration;

use cgw_common::Secret;
use log::*;

pub const DEFAULT_COINGATE_API_URL: &str = "https://api-sandbox.coingate.com/v2";
pub const DEFAULT_COINGATE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CoinGateConfig {
    /// Base URL of the CoinGate API, including the version segment, e.g. `https://api.coingate.com/v2`
    pub api_url: String,
    /// Bearer token used on every request
    pub api_token: Secret<String>,
    /// Upper bound on a single request, connection included
    pub timeout: Duration,
}

impl Default for CoinGateConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_COINGATE_API_URL.to_string(),
            api_token: Secret::default(),
            timeout: DEFAULT_COINGATE_TIMEOUT,
        }
    }
}

impl CoinGateConfig {
    pub fn new(api_url: &str, api_token: &str) -> Self {
        Self { api_url: api_url.to_string(), api_token: Secret::new(api_token.to_string()), ..Default::default() }
    }

    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("CGW_COINGATE_API_URL").unwrap_or_else(|_| {
            warn!("CGW_COINGATE_API_URL not set, using {DEFAULT_COINGATE_API_URL} as default");
            DEFAULT_COINGATE_API_URL.to_string()
        });
        let api_token = Secret::new(std::env::var("CGW_COINGATE_API_TOKEN").unwrap_or_else(|_| {
            warn!("CGW_COINGATE_API_TOKEN not set. Every call to CoinGate will be rejected.");
            String::default()
        }));
        let timeout = std::env::var("CGW_COINGATE_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid value for CGW_COINGATE_TIMEOUT ({s}). {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_COINGATE_TIMEOUT);
        Self { api_url: api_url.trim_end_matches('/').to_string(), api_token, timeout }
    }
}
