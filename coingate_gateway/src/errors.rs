use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    /// Deliberately vague. The cause is logged where the request is rejected, never sent to the caller.
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Payload deserialization error. {0}")]
    CouldNotDeserializePayload(String),
    #[error("Missing required parameters (amount, currency, order_id)")]
    MissingOrderParameters,
    #[error("Missing order ID in URL")]
    MissingOrderId,
    #[error("Failed to create order with CoinGate")]
    OrderCreationFailed,
    #[error("Order with ID {0} not found or failed to retrieve")]
    OrderNotFound(String),
    #[error("Failed to cancel order with ID {0}")]
    OrderCancellationFailed(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::CouldNotDeserializePayload(_) => StatusCode::BAD_REQUEST,
            Self::MissingOrderParameters => StatusCode::BAD_REQUEST,
            Self::MissingOrderId => StatusCode::BAD_REQUEST,
            Self::OrderCreationFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OrderNotFound(_) => StatusCode::NOT_FOUND,
            Self::OrderCancellationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}
