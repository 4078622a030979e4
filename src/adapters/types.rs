//! Venue-native data types shared by the client contract
//!
//! These mirror the shapes the venue returns (string-encoded numbers,
//! upper-case enums, venue symbol ids such as `BTC-USDT`). The core
//! converts them into canonical records in `core::normalize`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

// =============================================================================
// HTTP Client Constants
// =============================================================================

/// HTTP request timeout (seconds); history pages can be slow
const HTTP_TIMEOUT_SECS: u64 = 10;
/// HTTP connection timeout (milliseconds)
const HTTP_CONNECT_TIMEOUT_MS: u64 = 3000;
/// Max idle connections per host in connection pool
const HTTP_POOL_MAX_IDLE: usize = 8;
/// How long idle connections stay in the pool (seconds)
const HTTP_POOL_IDLE_TIMEOUT_SECS: u64 = 60;
/// TCP keepalive interval (seconds)
const HTTP_TCP_KEEPALIVE_SECS: u64 = 30;

/// Create the pooled HTTP client used for REST calls
pub fn create_http_client(exchange_name: &str) -> reqwest::Client {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .pool_max_idle_per_host(HTTP_POOL_MAX_IDLE)
        .pool_idle_timeout(Duration::from_secs(HTTP_POOL_IDLE_TIMEOUT_SECS))
        .tcp_keepalive(Duration::from_secs(HTTP_TCP_KEEPALIVE_SECS))
        .connect_timeout(Duration::from_millis(HTTP_CONNECT_TIMEOUT_MS))
        .tcp_nodelay(true)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new());
    tracing::info!(
        phase = "init",
        exchange = %exchange_name,
        timeout_s = HTTP_TIMEOUT_SECS,
        connect_timeout_ms = HTTP_CONNECT_TIMEOUT_MS,
        pool_max_idle = HTTP_POOL_MAX_IDLE,
        "HTTP client configured"
    );
    client
}

// =============================================================================
// Enums
// =============================================================================

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_venue_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Parse a venue side string (case-insensitive)
    pub fn parse_venue(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Some(Side::Buy),
            "SELL" => Some(Side::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Position leg in a hedge-mode account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn as_venue_str(&self) -> &'static str {
        match self {
            PositionSide::Long => "LONG",
            PositionSide::Short => "SHORT",
        }
    }

    /// Parse a venue position side; one-way mode (`BOTH`) yields None
    pub fn parse_venue(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LONG" => Some(PositionSide::Long),
            "SHORT" => Some(PositionSide::Short),
            _ => None,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

/// Margin mode applied per symbol at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarginMode {
    #[default]
    Cross,
    Isolated,
}

impl MarginMode {
    pub fn as_venue_str(&self) -> &'static str {
        match self {
            MarginMode::Cross => "CROSSED",
            MarginMode::Isolated => "ISOLATED",
        }
    }
}

impl fmt::Display for MarginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginMode::Cross => write!(f, "cross"),
            MarginMode::Isolated => write!(f, "isolated"),
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Limit order submission, addressed by venue symbol id
#[derive(Debug, Clone, PartialEq)]
pub struct LimitOrderRequest {
    pub symbol_id: String,
    pub side: Side,
    pub position_side: PositionSide,
    pub qty: f64,
    pub price: f64,
    pub client_order_id: String,
    pub post_only: bool,
}

// =============================================================================
// Venue records
// =============================================================================

/// Contract listing entry
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VenueMarket {
    pub symbol: String,
    #[serde(default)]
    pub asset: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub price_precision: u32,
    #[serde(default)]
    pub quantity_precision: u32,
    /// Contract size, used as the minimum order quantity
    #[serde(default, deserialize_with = "de_f64")]
    pub size: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub trade_min_quantity: f64,
    #[serde(default, rename = "tradeMinUSDT", deserialize_with = "de_opt_f64")]
    pub trade_min_usdt: Option<f64>,
    #[serde(default)]
    pub status: i64,
}

impl VenueMarket {
    pub fn is_active(&self) -> bool {
        self.status == 1
    }
}

/// Order as reported by REST, history and the user stream
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VenueOrder {
    #[serde(default, deserialize_with = "de_string_id")]
    pub order_id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub position_side: String,
    #[serde(default, deserialize_with = "de_f64")]
    pub price: f64,
    #[serde(default, alias = "quantity", deserialize_with = "de_f64")]
    pub orig_qty: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub executed_qty: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "clientOrderID")]
    pub client_order_id: String,
    #[serde(default, deserialize_with = "de_u64")]
    pub time: u64,
    #[serde(default, deserialize_with = "de_u64")]
    pub update_time: u64,
    #[serde(default)]
    pub reduce_only: Option<bool>,
    #[serde(default, deserialize_with = "de_f64")]
    pub profit: f64,
}

/// Open position leg
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VenuePosition {
    pub symbol: String,
    #[serde(default)]
    pub position_side: String,
    #[serde(default, deserialize_with = "de_f64")]
    pub position_amt: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub avg_price: f64,
    #[serde(default)]
    pub isolated: bool,
    #[serde(default, deserialize_with = "de_f64")]
    pub unrealized_profit: f64,
}

/// Account balance in the quote asset
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VenueBalance {
    #[serde(default)]
    pub asset: String,
    #[serde(default, deserialize_with = "de_f64")]
    pub balance: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub equity: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub available_margin: f64,
}

/// 24h ticker snapshot
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VenueTicker {
    pub symbol: String,
    #[serde(default, deserialize_with = "de_f64")]
    pub last_price: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub bid_price: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub ask_price: f64,
}

/// Kline entry
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct VenueCandle {
    #[serde(default, deserialize_with = "de_f64")]
    pub open: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub high: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub low: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub close: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub volume: f64,
    #[serde(default, deserialize_with = "de_u64")]
    pub time: u64,
}

// =============================================================================
// Lenient number decoding (venue sends numbers as strings or numbers)
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Float(f64),
    Str(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Unsigned(u64),
    Signed(i64),
    Str(String),
}

fn parse_num_str<E: serde::de::Error>(s: &str) -> Result<f64, E> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed.parse::<f64>().map_err(E::custom)
}

pub(crate) fn de_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumOrStr>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(NumOrStr::Float(v)) => Ok(v),
        Some(NumOrStr::Str(s)) => parse_num_str(&s),
    }
}

pub(crate) fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumOrStr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumOrStr::Float(v)) => Ok(Some(v)),
        Some(NumOrStr::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(NumOrStr::Str(s)) => parse_num_str(&s).map(Some),
    }
}

pub(crate) fn de_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IdRepr>::deserialize(deserializer)? {
        None => Ok(0),
        Some(IdRepr::Unsigned(v)) => Ok(v),
        Some(IdRepr::Signed(v)) => Ok(v.max(0) as u64),
        Some(IdRepr::Str(s)) if s.trim().is_empty() => Ok(0),
        Some(IdRepr::Str(s)) => s.trim().parse::<u64>().map_err(serde::de::Error::custom),
    }
}

pub(crate) fn de_string_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match IdRepr::deserialize(deserializer)? {
        IdRepr::Unsigned(v) => Ok(v.to_string()),
        IdRepr::Signed(v) => Ok(v.to_string()),
        IdRepr::Str(s) => Ok(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_accepts_string_and_numeric_fields() {
        let json = r#"{
            "symbol": "BTC-USDT",
            "orderId": 1736012449498123456,
            "side": "SELL",
            "positionSide": "LONG",
            "price": "30000.5",
            "origQty": 0.002,
            "status": "NEW",
            "clientOrderId": "abc",
            "time": 1702000000000,
            "updateTime": "1702000000500"
        }"#;
        let order: VenueOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.order_id, "1736012449498123456");
        assert_eq!(order.price, 30000.5);
        assert_eq!(order.orig_qty, 0.002);
        assert_eq!(order.update_time, 1702000000500);
        assert_eq!(order.reduce_only, None);
    }

    #[test]
    fn test_order_aliases_from_create_response() {
        let json = r#"{"orderId":"77","symbol":"ETH-USDT","quantity":"1.5","clientOrderID":"cid"}"#;
        let order: VenueOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.orig_qty, 1.5);
        assert_eq!(order.client_order_id, "cid");
        assert_eq!(order.price, 0.0);
    }

    #[test]
    fn test_market_optional_min_notional() {
        let json = r#"{"symbol":"DOGE-USDT","pricePrecision":5,"quantityPrecision":0,"size":"1","tradeMinUSDT":null,"status":1}"#;
        let market: VenueMarket = serde_json::from_str(json).unwrap();
        assert_eq!(market.trade_min_usdt, None);
        assert_eq!(market.size, 1.0);
        assert!(market.is_active());
    }

    #[test]
    fn test_empty_numeric_string_is_zero() {
        let json = r#"{"symbol":"BTC-USDT","lastPrice":"","bidPrice":"1.0"}"#;
        let ticker: VenueTicker = serde_json::from_str(json).unwrap();
        assert_eq!(ticker.last_price, 0.0);
        assert_eq!(ticker.bid_price, 1.0);
    }

    #[test]
    fn test_side_parsing() {
        assert_eq!(Side::parse_venue("buy"), Some(Side::Buy));
        assert_eq!(Side::parse_venue("SELL"), Some(Side::Sell));
        assert_eq!(PositionSide::parse_venue("BOTH"), None);
        assert_eq!(PositionSide::parse_venue("short"), Some(PositionSide::Short));
    }
}
