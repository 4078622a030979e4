//! Shared test utilities for gateway testing
//!
//! `MockVenue` is a scripted in-memory `VenueClient`: configure its public
//! fields before wrapping it in an `Arc`, then inspect the shared counters
//! and call logs afterwards.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::traits::VenueClient;
use crate::adapters::types::{
    LimitOrderRequest, MarginMode, PositionSide, VenueBalance, VenueCandle, VenueMarket,
    VenueOrder, VenuePosition, VenueTicker,
};

/// Scripted venue for unit tests
pub struct MockVenue {
    pub markets: Vec<VenueMarket>,
    pub open_orders: Vec<VenueOrder>,
    pub positions: Vec<VenuePosition>,
    pub balance: VenueBalance,
    pub tickers: Vec<VenueTicker>,
    pub candles: Vec<VenueCandle>,
    /// History source; queries return the latest `limit` records in the window
    pub history: Vec<VenueOrder>,
    /// When true, every read except `fetch_markets` fails
    pub fail_reads: bool,
    /// Number of upcoming `fetch_tickers` calls that fail
    pub ticker_failures: AtomicU64,
    /// Creation errors keyed by custom-id prefix of the client order id
    pub create_errors: HashMap<String, i64>,
    /// Cancellation errors keyed by order id
    pub cancel_errors: HashMap<String, i64>,
    pub margin_error: HashMap<String, i64>,
    pub leverage_error: HashMap<String, i64>,
    pub create_count: Arc<AtomicU64>,
    pub history_calls: Arc<AtomicU64>,
    pub submitted: Arc<Mutex<Vec<LimitOrderRequest>>>,
    pub cancelled: Arc<Mutex<Vec<String>>>,
    pub margin_calls: Arc<Mutex<Vec<(String, MarginMode)>>>,
    pub leverage_calls: Arc<Mutex<Vec<(String, u32, PositionSide)>>>,
    balance_updates: Mutex<VecDeque<ExchangeResult<VenueBalance>>>,
    order_updates: Mutex<VecDeque<ExchangeResult<Vec<VenueOrder>>>>,
}

impl MockVenue {
    /// BTC-USDT and ETH-USDT listed, with tickers and a few candles
    pub fn new() -> Self {
        let market = |symbol: &str, price_precision, quantity_precision, size| VenueMarket {
            symbol: symbol.to_string(),
            price_precision,
            quantity_precision,
            size,
            status: 1,
            ..Default::default()
        };
        let ticker = |symbol: &str, last: f64| VenueTicker {
            symbol: symbol.to_string(),
            last_price: last,
            bid_price: last - 0.5,
            ask_price: last + 0.5,
        };
        let candles = (0..3)
            .map(|i| VenueCandle {
                open: 100.0 + i as f64,
                high: 101.0 + i as f64,
                low: 99.0 + i as f64,
                close: 100.5 + i as f64,
                volume: 10.0,
                time: 1_700_000_000_000 + i * 60_000,
            })
            .collect();

        Self {
            markets: vec![
                market("BTC-USDT", 1, 3, 0.001),
                market("ETH-USDT", 2, 2, 0.01),
            ],
            open_orders: Vec::new(),
            positions: Vec::new(),
            balance: VenueBalance {
                asset: "USDT".to_string(),
                ..Default::default()
            },
            tickers: vec![ticker("BTC-USDT", 30_000.0), ticker("ETH-USDT", 2_000.0)],
            candles,
            history: Vec::new(),
            fail_reads: false,
            ticker_failures: AtomicU64::new(0),
            create_errors: HashMap::new(),
            cancel_errors: HashMap::new(),
            margin_error: HashMap::new(),
            leverage_error: HashMap::new(),
            create_count: Arc::new(AtomicU64::new(0)),
            history_calls: Arc::new(AtomicU64::new(0)),
            submitted: Arc::new(Mutex::new(Vec::new())),
            cancelled: Arc::new(Mutex::new(Vec::new())),
            margin_calls: Arc::new(Mutex::new(Vec::new())),
            leverage_calls: Arc::new(Mutex::new(Vec::new())),
            balance_updates: Mutex::new(VecDeque::new()),
            order_updates: Mutex::new(VecDeque::new()),
        }
    }

    /// Reject creations whose client order id starts with `custom_id`
    pub fn fail_create(&mut self, custom_id: &str, code: i64) {
        self.create_errors.insert(custom_id.to_string(), code);
    }

    /// Reject cancellation of `order_id`
    pub fn fail_cancel(&mut self, order_id: &str, code: i64) {
        self.cancel_errors.insert(order_id.to_string(), code);
    }

    /// Queue a result for the next `watch_balance`
    pub fn push_balance(&self, update: ExchangeResult<VenueBalance>) {
        if let Ok(mut queue) = self.balance_updates.lock() {
            queue.push_back(update);
        }
    }

    /// Queue a result for the next `watch_orders`
    pub fn push_orders(&self, update: ExchangeResult<Vec<VenueOrder>>) {
        if let Ok(mut queue) = self.order_updates.lock() {
            queue.push_back(update);
        }
    }

    fn read<T: Clone>(&self, value: &T) -> ExchangeResult<T> {
        if self.fail_reads {
            return Err(ExchangeError::ConnectionFailed("mock read failure".to_string()));
        }
        Ok(value.clone())
    }

    fn venue_error(code: i64) -> ExchangeError {
        ExchangeError::Venue {
            code,
            msg: format!("mock venue error {}", code),
        }
    }
}

impl Default for MockVenue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VenueClient for MockVenue {
    async fn fetch_markets(&self) -> ExchangeResult<Vec<VenueMarket>> {
        Ok(self.markets.clone())
    }

    async fn create_limit_order(&self, request: &LimitOrderRequest) -> ExchangeResult<VenueOrder> {
        let seq = self.create_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push(request.clone());
        }

        // Small simulated latency so batch units overlap
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;

        if let Some(code) = self
            .create_errors
            .iter()
            .find(|(prefix, _)| request.client_order_id.starts_with(prefix.as_str()))
            .map(|(_, code)| *code)
        {
            return Err(Self::venue_error(code));
        }

        // venue acknowledges with the id only
        Ok(VenueOrder {
            order_id: format!("mock-{}", seq),
            client_order_id: request.client_order_id.clone(),
            ..Default::default()
        })
    }

    async fn cancel_order(&self, order_id: &str, symbol_id: &str) -> ExchangeResult<VenueOrder> {
        if let Ok(mut cancelled) = self.cancelled.lock() {
            cancelled.push(order_id.to_string());
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;

        if let Some(code) = self.cancel_errors.get(order_id) {
            return Err(Self::venue_error(*code));
        }
        Ok(VenueOrder {
            order_id: order_id.to_string(),
            symbol: symbol_id.to_string(),
            status: "CANCELLED".to_string(),
            ..Default::default()
        })
    }

    async fn fetch_open_orders(&self) -> ExchangeResult<Vec<VenueOrder>> {
        self.read(&self.open_orders)
    }

    async fn fetch_positions(&self) -> ExchangeResult<Vec<VenuePosition>> {
        self.read(&self.positions)
    }

    async fn fetch_balance(&self) -> ExchangeResult<VenueBalance> {
        self.read(&self.balance)
    }

    async fn fetch_tickers(&self) -> ExchangeResult<Vec<VenueTicker>> {
        let remaining = self.ticker_failures.load(Ordering::Relaxed);
        if remaining > 0 {
            self.ticker_failures.store(remaining - 1, Ordering::Relaxed);
            return Err(ExchangeError::NetworkTimeout(10_000));
        }
        self.read(&self.tickers)
    }

    async fn fetch_ohlcv(
        &self,
        _symbol_id: &str,
        _timeframe: &str,
        limit: u32,
    ) -> ExchangeResult<Vec<VenueCandle>> {
        let candles = self.read(&self.candles)?;
        let skip = candles.len().saturating_sub(limit as usize);
        Ok(candles.into_iter().skip(skip).collect())
    }

    async fn fetch_order_history(
        &self,
        start_ms: u64,
        end_ms: u64,
        limit: usize,
    ) -> ExchangeResult<Vec<VenueOrder>> {
        self.history_calls.fetch_add(1, Ordering::Relaxed);
        let history = self.read(&self.history)?;
        let mut window: Vec<VenueOrder> = history
            .into_iter()
            .filter(|o| o.update_time >= start_ms && o.update_time <= end_ms)
            .collect();
        window.sort_by_key(|o| o.update_time);
        let skip = window.len().saturating_sub(limit);
        Ok(window.into_iter().skip(skip).collect())
    }

    async fn set_margin_mode(&self, symbol_id: &str, mode: MarginMode) -> ExchangeResult<()> {
        if let Ok(mut calls) = self.margin_calls.lock() {
            calls.push((symbol_id.to_string(), mode));
        }
        match self.margin_error.get(symbol_id) {
            Some(code) => Err(Self::venue_error(*code)),
            None => Ok(()),
        }
    }

    async fn set_leverage(
        &self,
        symbol_id: &str,
        leverage: u32,
        side: PositionSide,
    ) -> ExchangeResult<()> {
        if let Ok(mut calls) = self.leverage_calls.lock() {
            calls.push((symbol_id.to_string(), leverage, side));
        }
        match self.leverage_error.get(symbol_id) {
            Some(code) => Err(Self::venue_error(*code)),
            None => Ok(()),
        }
    }

    async fn watch_balance(&self) -> ExchangeResult<VenueBalance> {
        let next = self.balance_updates.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(update) => update,
            None => std::future::pending().await,
        }
    }

    async fn watch_orders(&self) -> ExchangeResult<Vec<VenueOrder>> {
        let next = self.order_updates.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(update) => update,
            None => std::future::pending().await,
        }
    }

    fn exchange_name(&self) -> &'static str {
        "mock"
    }
}
