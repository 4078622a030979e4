//! Venue adapters
//!
//! This module provides the venue client contract consumed by the gateway
//! core and its BingX perpetual swap implementation.

pub mod bingx;
pub mod errors;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types for convenience
pub use bingx::{BingxClient, BingxConfig};
pub use errors::{ExchangeError, ExchangeResult, VenueErrorKind};
pub use traits::VenueClient;
pub use types::{
    LimitOrderRequest, MarginMode, PositionSide, Side, VenueBalance, VenueCandle, VenueMarket,
    VenueOrder, VenuePosition, VenueTicker,
};
