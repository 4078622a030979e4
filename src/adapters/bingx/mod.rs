//! BingX Exchange Adapter
//!
//! Implements the VenueClient trait for BingX USDT-margined perpetual swaps.
//!
//! This module is organized into submodules:
//! - `config` - Credentials, endpoints and environment loading
//! - `types` - REST envelopes and user-stream event shapes
//! - `signing` - HMAC-SHA256 query signing
//! - `adapter` - Main BingxClient implementation
//! - `stream` - User data WebSocket feeding `watch_balance` / `watch_orders`

mod adapter;
mod config;
mod signing;
mod stream;
mod types;

// Re-export public items
pub use adapter::BingxClient;
pub use config::BingxConfig;
pub use signing::{build_query, sign_query};
