use std::sync::Arc;

use cgw_common::{truncate_for_log, LOG_BODY_LIMIT};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
    Url,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{config::CoinGateConfig, CoinGateApiError, NewCoinGateOrder};

/// Path (relative to the API base URL) of the list of IP addresses CoinGate delivers callbacks from.
const CALLBACK_IPS_PATH: &str = "ips-v4";

#[derive(Clone)]
pub struct CoinGateApi {
    config: CoinGateConfig,
    client: Arc<Client>,
}

impl CoinGateApi {
    pub fn new(config: CoinGateConfig) -> Result<Self, CoinGateApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let mut val = HeaderValue::from_str(&format!("Bearer {}", config.api_token.reveal()))
            .map_err(|e| CoinGateApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| CoinGateApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Sends a single request to CoinGate and deserializes the response body.
    ///
    /// There are no retries. Every failure (transport, non-2xx status, blank body, or a body that does not
    /// deserialize into `T`) is logged and returned as a [`CoinGateApiError`].
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &[&str],
        body: Option<B>,
    ) -> Result<T, CoinGateApiError> {
        let url = self.url(path)?;
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| {
            error!("CoinGate API request failed. {e}");
            CoinGateApiError::RestRequestError(e.to_string())
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            error!("Could not read CoinGate API response body. {e}");
            CoinGateApiError::RestRequestError(e.to_string())
        })?;
        let excerpt = truncate_for_log(&text, LOG_BODY_LIMIT);
        info!("CoinGate API response: Code={}, Body={excerpt}", status.as_u16());
        if !status.is_success() {
            error!("CoinGate API error: Code={}, Body={excerpt}", status.as_u16());
            return Err(CoinGateApiError::QueryError { status: status.as_u16(), message: excerpt });
        }
        if text.trim().is_empty() {
            warn!("CoinGate API returned a success code ({status}) with an empty body");
            return Err(CoinGateApiError::EmptyResponse);
        }
        serde_json::from_str::<T>(&text).map_err(|e| {
            error!("CoinGate API JSON parse error: {e} for body: {excerpt}");
            CoinGateApiError::JsonError(e.to_string())
        })
    }

    /// Builds the full URL for the given path segments. Each segment is percent-encoded, so ids supplied by clients
    /// can't escape their path position.
    pub fn url(&self, segments: &[&str]) -> Result<Url, CoinGateApiError> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| CoinGateApiError::Initialization(format!("Invalid CoinGate API URL. {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CoinGateApiError::Initialization("CoinGate API URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn create_order(&self, order: &NewCoinGateOrder) -> Result<Value, CoinGateApiError> {
        debug!("Creating CoinGate order {}", order.order_id);
        trace!("New order body: {}", serde_json::to_string(order).unwrap_or_default());
        let result = self.rest_query::<Value, _>(Method::POST, &["orders"], Some(order)).await?;
        info!("Created CoinGate order {}", order.order_id);
        Ok(result)
    }

    pub async fn retrieve_order(&self, order_id: &str) -> Result<Value, CoinGateApiError> {
        debug!("Fetching CoinGate order {order_id}");
        let result = self.rest_query::<Value, ()>(Method::GET, &["orders", order_id], None).await?;
        info!("Fetched CoinGate order {order_id}");
        Ok(result)
    }

    pub async fn cancel_order(&self, order_id: &str) -> Result<Value, CoinGateApiError> {
        debug!("Cancelling CoinGate order {order_id}");
        let result = self.rest_query::<Value, ()>(Method::POST, &["orders", order_id, "cancel"], None).await?;
        info!("Cancelled CoinGate order {order_id}");
        Ok(result)
    }

    /// Fetches the addresses CoinGate sends callbacks from. The body must be a JSON array of strings; any other
    /// shape, including an array with a single non-string element, is an error.
    pub async fn fetch_callback_ips(&self) -> Result<Vec<String>, CoinGateApiError> {
        debug!("Fetching CoinGate callback IP list");
        let ips = self.rest_query::<Vec<String>, ()>(Method::GET, &[CALLBACK_IPS_PATH], None).await?;
        info!("Fetched {} CoinGate callback IPs", ips.len());
        Ok(ips)
    }
}
