pub mod helpers;
mod secret;

pub use helpers::{parse_boolean_flag, truncate_for_log};
pub use secret::Secret;

/// The maximum number of characters of an upstream payload that gets written to the logs.
pub const LOG_BODY_LIMIT: usize = 500;
