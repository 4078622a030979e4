//! Canonical records handed to the bot
//!
//! Symbols are canonical (`BTC/USDT:USDT`); venue ids never leave the
//! adapter/normalizer boundary.

use serde::{Deserialize, Serialize};

use crate::adapters::types::{PositionSide, Side};

/// Order lifecycle as far as the bot cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Resting (or accepted, not yet reported otherwise)
    #[default]
    Open,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// Parse a venue status string; unknown values are treated as open
    pub fn parse_venue(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "PARTIALLY_FILLED" => OrderStatus::PartiallyFilled,
            "FILLED" => OrderStatus::Filled,
            "CANCELED" | "CANCELLED" => OrderStatus::Canceled,
            "REJECTED" | "FAILED" => OrderStatus::Rejected,
            "EXPIRED" => OrderStatus::Expired,
            _ => OrderStatus::Open,
        }
    }

    /// No further updates will follow for this order
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }
}

/// Canonical order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Venue-assigned id; `None` until confirmed
    pub id: Option<String>,
    pub symbol: String,
    pub side: Side,
    pub position_side: PositionSide,
    pub qty: f64,
    pub price: f64,
    pub reduce_only: bool,
    /// Caller tag, prefix of the client order id
    pub custom_id: String,
    /// Milliseconds since epoch
    pub timestamp: u64,
    #[serde(default)]
    pub status: OrderStatus,
}

impl Order {
    /// Unconfirmed limit order ready for `execute_orders`
    pub fn new_limit(
        symbol: &str,
        side: Side,
        position_side: PositionSide,
        qty: f64,
        price: f64,
        custom_id: &str,
    ) -> Self {
        Self {
            id: None,
            symbol: symbol.to_string(),
            side,
            position_side,
            qty,
            price,
            reduce_only: derive_reduce_only(side, position_side),
            custom_id: custom_id.to_string(),
            timestamp: current_time_ms(),
            status: OrderStatus::Open,
        }
    }
}

/// Closing a long is a sell, closing a short is a buy
pub fn derive_reduce_only(side: Side, position_side: PositionSide) -> bool {
    matches!(
        (side, position_side),
        (Side::Sell, PositionSide::Long) | (Side::Buy, PositionSide::Short)
    )
}

/// One leg of a hedge-mode position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub position_side: PositionSide,
    /// Always >= 0
    pub size: f64,
    /// Entry price
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
}

/// Realized PnL of one historical order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlRecord {
    pub id: String,
    pub symbol: String,
    pub pnl: f64,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Current wall-clock time in milliseconds since epoch
pub fn current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
