//! State reconciliation loops
//!
//! Three independent tasks share one `CancellationToken`:
//! - balance stream consumer
//! - order stream consumer
//! - ticker poller (the venue has no ticker stream we subscribe to)
//!
//! Stream failures are logged and retried immediately; reconnecting is the
//! venue client's job. Every await is raced against the token, so shutdown
//! never waits on a stalled call.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::adapters::traits::VenueClient;
use crate::core::gateway::Gateway;
use crate::core::normalize::{normalize_balance, normalize_orders, normalize_ticker};
use crate::core::state::StateSink;

/// Forward streamed balance pushes until cancelled
pub async fn run_balance_loop<C, S>(venue: Arc<C>, sink: Arc<S>, cancel: CancellationToken)
where
    C: VenueClient + ?Sized,
    S: StateSink + ?Sized,
{
    info!(exchange = venue.exchange_name(), "[RECONCILE] Balance watcher started");
    while !cancel.is_cancelled() {
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = venue.watch_balance() => result,
        };
        match result {
            Ok(raw) => sink.handle_balance_update(normalize_balance(&raw)).await,
            Err(e) => {
                error!(exchange = venue.exchange_name(), error = %e, "[RECONCILE] Balance watch failed");
                tokio::task::yield_now().await;
            }
        }
    }
    info!(exchange = venue.exchange_name(), "[RECONCILE] Balance watcher stopped");
}

/// Forward streamed order batches until cancelled
pub async fn run_orders_loop<C, S>(venue: Arc<C>, sink: Arc<S>, cancel: CancellationToken)
where
    C: VenueClient + ?Sized,
    S: StateSink + ?Sized,
{
    info!(exchange = venue.exchange_name(), "[RECONCILE] Order watcher started");
    while !cancel.is_cancelled() {
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = venue.watch_orders() => result,
        };
        match result {
            Ok(raw) => {
                let orders = normalize_orders(&raw);
                debug!(received = raw.len(), forwarded = orders.len(), "[RECONCILE] Order updates");
                if !orders.is_empty() {
                    sink.handle_order_update(orders).await;
                }
            }
            Err(e) => {
                error!(exchange = venue.exchange_name(), error = %e, "[RECONCILE] Order watch failed");
                tokio::task::yield_now().await;
            }
        }
    }
    info!(exchange = venue.exchange_name(), "[RECONCILE] Order watcher stopped");
}

/// Poll tickers for `symbols` (canonical) every `interval` until cancelled
pub async fn run_ticker_loop<C, S>(
    venue: Arc<C>,
    sink: Arc<S>,
    symbols: HashSet<String>,
    interval: Duration,
    cancel: CancellationToken,
) where
    C: VenueClient + ?Sized,
    S: StateSink + ?Sized,
{
    info!(exchange = venue.exchange_name(), symbols = symbols.len(), "[RECONCILE] Ticker poller started");
    while !cancel.is_cancelled() {
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = venue.fetch_tickers() => result,
        };
        match result {
            Ok(raw) => {
                for ticker in raw.iter().map(normalize_ticker) {
                    if symbols.contains(&ticker.symbol) {
                        sink.handle_ticker_update(ticker).await;
                    }
                }
            }
            Err(e) => {
                error!(exchange = venue.exchange_name(), error = %e, "[RECONCILE] Ticker poll failed");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    info!(exchange = venue.exchange_name(), "[RECONCILE] Ticker poller stopped");
}

impl<C: VenueClient + 'static> Gateway<C> {
    /// Launch the three reconciliation loops
    ///
    /// They run until `cancel` fires; await the handles to join them.
    pub fn spawn_reconciliation<S>(&self, sink: Arc<S>, cancel: CancellationToken) -> Vec<JoinHandle<()>>
    where
        S: StateSink + 'static,
    {
        let symbols: HashSet<String> = self.markets.symbols().into_iter().collect();
        vec![
            tokio::spawn(run_balance_loop(
                Arc::clone(&self.venue),
                Arc::clone(&sink),
                cancel.clone(),
            )),
            tokio::spawn(run_orders_loop(
                Arc::clone(&self.venue),
                Arc::clone(&sink),
                cancel.clone(),
            )),
            tokio::spawn(run_ticker_loop(
                Arc::clone(&self.venue),
                sink,
                symbols,
                self.settings.ticker_poll_interval,
                cancel,
            )),
        ]
    }
}
