//! # CoinGate gateway
//! This crate hosts the server that sits between internal clients and the CoinGate payment API. It is responsible for:
//! * Creating, fetching and cancelling CoinGate orders on behalf of clients that hold the shared API key.
//! * Receiving CoinGate payment callbacks, but only from the IP addresses CoinGate publishes.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /api/v1/orders`: Create an order.
//! * `GET /api/v1/orders/{id}`: Fetch an order.
//! * `POST /api/v1/orders/{id}/cancel`: Cancel an order.
//! * `POST /api/v1/orders/callback`: The webhook that CoinGate calls when an order changes status.

pub mod allowlist;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod order_gateway;
pub mod routes;
pub mod server;
pub mod traits;
