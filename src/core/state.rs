//! Shared state store fed by the reconciliation loops
//!
//! `StateSink` is what the loops push into; `SharedState` is the in-memory
//! implementation the binary uses. Order updates are upserts keyed by
//! order id, so delivering the same update twice is a no-op.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::adapters::types::PositionSide;
use crate::core::types::{current_time_ms, Order, Position, Ticker};

/// Receiver for normalized reconciliation updates
#[async_trait]
pub trait StateSink: Send + Sync {
    async fn handle_balance_update(&self, balance: f64);
    async fn handle_order_update(&self, orders: Vec<Order>);
    async fn handle_ticker_update(&self, ticker: Ticker);
}

/// Feeds whose freshness is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Balance,
    Orders,
    Positions,
    Tickers,
}

/// Point-in-time copy of the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    pub balance: f64,
    /// Open orders keyed by venue order id
    pub open_orders: HashMap<String, Order>,
    pub positions: HashMap<(String, PositionSide), Position>,
    pub tickers: HashMap<String, Ticker>,
    pub last_update: HashMap<Feed, u64>,
}

impl StateSnapshot {
    /// Open orders for one symbol, oldest first
    pub fn open_orders_for(&self, symbol: &str) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self
            .open_orders
            .values()
            .filter(|o| o.symbol == symbol)
            .collect();
        orders.sort_by_key(|o| o.timestamp);
        orders
    }
}

/// Thread-safe in-memory state store
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<StateSnapshot>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty position legs for every tracked symbol
    pub async fn seed_symbols(&self, symbols: &[String]) {
        let mut state = self.inner.write().await;
        for symbol in symbols {
            for side in [PositionSide::Long, PositionSide::Short] {
                state
                    .positions
                    .entry((symbol.clone(), side))
                    .or_insert_with(|| Position {
                        symbol: symbol.clone(),
                        position_side: side,
                        size: 0.0,
                        price: 0.0,
                    });
            }
        }
    }

    pub async fn set_balance(&self, balance: f64) {
        let mut state = self.inner.write().await;
        state.balance = balance;
        state.last_update.insert(Feed::Balance, current_time_ms());
    }

    /// Replace the open-order book wholesale (from a REST snapshot)
    pub async fn replace_open_orders(&self, orders: Vec<Order>) {
        let mut state = self.inner.write().await;
        state.open_orders = orders
            .into_iter()
            .filter_map(|o| o.id.clone().map(|id| (id, o)))
            .collect();
        state.last_update.insert(Feed::Orders, current_time_ms());
    }

    /// Replace positions; seeded legs absent from the snapshot are zeroed
    pub async fn replace_positions(&self, positions: Vec<Position>) {
        let mut state = self.inner.write().await;
        for leg in state.positions.values_mut() {
            leg.size = 0.0;
            leg.price = 0.0;
        }
        for position in positions {
            state
                .positions
                .insert((position.symbol.clone(), position.position_side), position);
        }
        state.last_update.insert(Feed::Positions, current_time_ms());
    }

    pub async fn replace_tickers(&self, tickers: Vec<Ticker>) {
        let mut state = self.inner.write().await;
        for ticker in tickers {
            state.tickers.insert(ticker.symbol.clone(), ticker);
        }
        state.last_update.insert(Feed::Tickers, current_time_ms());
    }

    pub async fn snapshot(&self) -> StateSnapshot {
        self.inner.read().await.clone()
    }

    /// Last time `feed` was updated, in ms since epoch
    pub async fn last_update(&self, feed: Feed) -> Option<u64> {
        self.inner.read().await.last_update.get(&feed).copied()
    }
}

#[async_trait]
impl StateSink for SharedState {
    async fn handle_balance_update(&self, balance: f64) {
        self.set_balance(balance).await;
    }

    async fn handle_order_update(&self, orders: Vec<Order>) {
        let mut state = self.inner.write().await;
        for order in orders {
            let Some(id) = order.id.clone() else {
                warn!(symbol = %order.symbol, "[STATE] Order update without id ignored");
                continue;
            };
            if order.status.is_terminal() {
                if state.open_orders.remove(&id).is_some() {
                    debug!(order_id = %id, status = ?order.status, "[STATE] Order closed");
                }
            } else {
                state.open_orders.insert(id, order);
            }
        }
        state.last_update.insert(Feed::Orders, current_time_ms());
    }

    async fn handle_ticker_update(&self, ticker: Ticker) {
        let mut state = self.inner.write().await;
        state.tickers.insert(ticker.symbol.clone(), ticker);
        state.last_update.insert(Feed::Tickers, current_time_ms());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::types::Side;
    use crate::core::types::OrderStatus;

    fn confirmed(id: &str, status: OrderStatus) -> Order {
        let mut order = Order::new_limit("BTC/USDT:USDT", Side::Buy, PositionSide::Long, 0.01, 30_000.0, "e");
        order.id = Some(id.to_string());
        order.status = status;
        order
    }

    fn without_timestamps(mut snapshot: StateSnapshot) -> StateSnapshot {
        snapshot.last_update.clear();
        snapshot
    }

    #[tokio::test]
    async fn test_order_update_is_idempotent() {
        let state = SharedState::new();
        let update = vec![confirmed("1", OrderStatus::Open)];

        state.handle_order_update(update.clone()).await;
        let once = without_timestamps(state.snapshot().await);
        state.handle_order_update(update).await;
        let twice = without_timestamps(state.snapshot().await);

        assert_eq!(once, twice);
        assert_eq!(twice.open_orders.len(), 1);
    }

    #[tokio::test]
    async fn test_terminal_status_removes_order() {
        let state = SharedState::new();
        state.handle_order_update(vec![confirmed("1", OrderStatus::Open)]).await;
        state.handle_order_update(vec![confirmed("1", OrderStatus::Filled)]).await;
        // a late duplicate of the terminal update changes nothing
        state.handle_order_update(vec![confirmed("1", OrderStatus::Filled)]).await;
        assert!(state.snapshot().await.open_orders.is_empty());
    }

    #[tokio::test]
    async fn test_order_without_id_ignored() {
        let state = SharedState::new();
        let mut order = confirmed("1", OrderStatus::Open);
        order.id = None;
        state.handle_order_update(vec![order]).await;
        assert!(state.snapshot().await.open_orders.is_empty());
    }

    #[tokio::test]
    async fn test_seed_and_replace_positions() {
        let state = SharedState::new();
        state.seed_symbols(&["ETH/USDT:USDT".to_string()]).await;
        assert_eq!(state.snapshot().await.positions.len(), 2);

        state
            .replace_positions(vec![Position {
                symbol: "ETH/USDT:USDT".to_string(),
                position_side: PositionSide::Short,
                size: 1.5,
                price: 1_800.0,
            }])
            .await;
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.positions[&("ETH/USDT:USDT".to_string(), PositionSide::Short)].size, 1.5);
        assert_eq!(snapshot.positions[&("ETH/USDT:USDT".to_string(), PositionSide::Long)].size, 0.0);
        assert!(state.last_update(Feed::Positions).await.is_some());
    }

    #[tokio::test]
    async fn test_feed_timestamps() {
        let state = SharedState::new();
        assert!(state.last_update(Feed::Balance).await.is_none());
        state.handle_balance_update(42.0).await;
        assert!(state.last_update(Feed::Balance).await.is_some());
        assert_eq!(state.snapshot().await.balance, 42.0);
    }
}
