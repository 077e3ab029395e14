//! # Callback IP allowlist
//!
//! CoinGate callbacks carry no signature, so the only thing standing between the internet and the callback endpoint is
//! the caller's IP address. The [`AllowlistCache`] answers "is this IP currently trusted?" using the list CoinGate
//! publishes, fetching it lazily and keeping it for a fixed TTL.
//!
//! The cache fails closed: if there is no fresh list and one can't be fetched, nobody is trusted.
mod cache;
mod clock;

pub use cache::{AllowlistCache, AllowlistEntry, AllowlistError};
pub use clock::{Clock, MockClock, SystemClock};
