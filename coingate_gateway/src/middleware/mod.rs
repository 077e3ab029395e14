mod api_key;
mod callback_gate;

pub use api_key::{ApiKeyMiddlewareFactory, ApiKeyMiddlewareService, API_KEY_HEADER};
pub use callback_gate::{CallbackGate, CallbackGateService, CallbackSource};
