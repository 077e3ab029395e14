use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoinGateApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not complete REST request: {0}")]
    RestRequestError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("CoinGate returned an empty response")]
    EmptyResponse,
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
}
