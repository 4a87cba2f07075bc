//! Order-Book Gateway Adapter
//!
//! Implements the HTTP client for the marketplace gateway that stores
//! published orders and indexes deals.
//!
//! Sub-modules:
//! - `auth`: signed-challenge authorization
//! - `client`: HTTP client with pacing and retries
//! - `orderbook`: the `OrderBook` port implementation
//! - `types`: response envelope handling

pub mod auth;
pub mod client;
pub mod orderbook;
pub mod types;

pub use auth::GatewayAuth;
pub use client::{GatewayClient, GatewayClientConfig};
pub use orderbook::GatewayOrderBook;
