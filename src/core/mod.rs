//! Core module - execution, reconciliation, history and market metadata
//!
//! # Module Architecture
//!
//! `Gateway` is the entry point. Its operations are split by concern, each
//! module adding an `impl Gateway` block:
//! - `execution` - batched creations/cancellations
//! - `reconcile` - balance/order stream consumers and the ticker poller
//! - `history` - single-page and paginated PnL queries
//! - `exchange_config` - startup margin mode / leverage
//!
//! Supporting modules: `markets` (metadata registry), `normalize` (venue to
//! canonical records), `policy` (error-adaptive handling), `state` (sink
//! trait and in-memory store), `types` (canonical records).
//!
//! This module uses explicit re-exports; add new public types below.

pub mod exchange_config;
pub mod execution;
pub mod gateway;
pub mod history;
pub mod markets;
pub mod normalize;
pub mod policy;
pub mod reconcile;
pub mod state;
pub mod types;

pub use exchange_config::{ConfigOutcome, SymbolConfigReport};
pub use execution::{
    cap_batch, client_order_id, dispatch_batch, prioritize_reduce_only, shape_cancellations,
};
pub use gateway::{Gateway, GatewaySettings};
pub use markets::{MarketRegistry, MarketSpec};
pub use policy::corrected_min_qty;
pub use reconcile::{run_balance_loop, run_orders_loop, run_ticker_loop};
pub use state::{Feed, SharedState, StateSink, StateSnapshot};
pub use types::{current_time_ms, Candle, Order, OrderStatus, PnlRecord, Position, Ticker};
