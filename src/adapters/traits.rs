//! Venue client trait definition
//!
//! The VenueClient trait is the seam between the gateway core and the
//! transport layer. Implementations return venue-native records and typed
//! `ExchangeError`s; they never normalize or retry.

use async_trait::async_trait;

use crate::adapters::errors::ExchangeResult;
use crate::adapters::types::{
    LimitOrderRequest, MarginMode, PositionSide, VenueBalance, VenueCandle, VenueMarket,
    VenueOrder, VenuePosition, VenueTicker,
};

/// Authenticated REST + streaming access to one venue
///
/// All symbol arguments are venue symbol ids (e.g. `BTC-USDT`).
///
/// # Example Implementation
///
/// ```ignore
/// #[async_trait]
/// impl VenueClient for PaperVenue {
///     async fn fetch_markets(&self) -> ExchangeResult<Vec<VenueMarket>> {
///         Ok(self.listings.clone())
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait VenueClient: Send + Sync {
    /// Contract listings with precision and limits
    async fn fetch_markets(&self) -> ExchangeResult<Vec<VenueMarket>>;

    /// Place a limit order
    ///
    /// # Returns
    /// The venue's acknowledgement; fields the venue omits are left at defaults.
    async fn create_limit_order(&self, request: &LimitOrderRequest) -> ExchangeResult<VenueOrder>;

    /// Cancel an order by venue order id
    async fn cancel_order(&self, order_id: &str, symbol_id: &str) -> ExchangeResult<VenueOrder>;

    /// All open orders across symbols
    async fn fetch_open_orders(&self) -> ExchangeResult<Vec<VenueOrder>>;

    /// All open positions across symbols
    async fn fetch_positions(&self) -> ExchangeResult<Vec<VenuePosition>>;

    /// Account balance in the quote asset
    async fn fetch_balance(&self) -> ExchangeResult<VenueBalance>;

    /// Ticker snapshot for every listed symbol
    async fn fetch_tickers(&self) -> ExchangeResult<Vec<VenueTicker>>;

    /// Candles for one symbol, oldest first
    async fn fetch_ohlcv(
        &self,
        symbol_id: &str,
        timeframe: &str,
        limit: u32,
    ) -> ExchangeResult<Vec<VenueCandle>>;

    /// Historical orders updated within `[start_ms, end_ms]`
    ///
    /// Returns at most `limit` records; when more exist the latest are returned.
    async fn fetch_order_history(
        &self,
        start_ms: u64,
        end_ms: u64,
        limit: usize,
    ) -> ExchangeResult<Vec<VenueOrder>>;

    /// Set margin mode for a symbol
    async fn set_margin_mode(&self, symbol_id: &str, mode: MarginMode) -> ExchangeResult<()>;

    /// Set leverage for one position side of a symbol
    async fn set_leverage(
        &self,
        symbol_id: &str,
        leverage: u32,
        side: PositionSide,
    ) -> ExchangeResult<()>;

    /// Wait for the next streamed balance push
    async fn watch_balance(&self) -> ExchangeResult<VenueBalance>;

    /// Wait for the next streamed batch of order updates
    async fn watch_orders(&self) -> ExchangeResult<Vec<VenueOrder>>;

    /// Exchange name identifier
    fn exchange_name(&self) -> &'static str;
}
