//! BingX perpetual swap execution gateway
//!
//! Translates a trading bot's order/position model into BingX swap API
//! calls:
//! - Batched, fault-isolated order creation and cancellation
//! - Error-adaptive minimum quantity correction
//! - Stream + polling reconciliation into a shared state store
//! - Paginated realized-PnL history
//! - Startup margin mode / leverage configuration

pub mod adapters;
pub mod config;
pub mod core;
pub mod error;

pub use error::AppError;
