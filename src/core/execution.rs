//! Batched order execution
//!
//! Each accepted order becomes its own spawned task; handles are awaited
//! in submission order so `results[i]` always belongs to `batch[i]`, no
//! matter which task finishes first. A failed or panicked unit yields
//! `None` in its slot and never affects its siblings.
//!
//! # Batch shaping
//! - Creations: the first `max_creations_per_batch` candidates, as given.
//! - Cancellations: when there are more candidates than
//!   `max_cancellations_per_batch`, reduce-only candidates are moved to the
//!   front (stable) before truncating. A batch within the cap keeps its
//!   input order.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error};
use uuid::Uuid;

use crate::adapters::traits::VenueClient;
use crate::adapters::types::LimitOrderRequest;
use crate::core::gateway::Gateway;
use crate::core::markets::MarketRegistry;
use crate::core::normalize::{backfill_confirmation, venue_id_from_symbol};
use crate::core::policy;
use crate::core::types::Order;

/// Venue limit on client order id length
const MAX_CLIENT_ORDER_ID_LEN: usize = 40;

/// `custom_id` followed by a random uuid, cut to the venue's limit
pub fn client_order_id(custom_id: &str) -> String {
    format!("{}{}", custom_id, Uuid::new_v4())
        .chars()
        .take(MAX_CLIENT_ORDER_ID_LEN)
        .collect()
}

/// Keep the first `cap` candidates
pub fn cap_batch<T>(mut candidates: Vec<T>, cap: usize) -> Vec<T> {
    candidates.truncate(cap);
    candidates
}

/// Stable partition: reduce-only orders first, relative order preserved
pub fn prioritize_reduce_only(orders: Vec<Order>) -> Vec<Order> {
    let (mut reduce_only, rest): (Vec<Order>, Vec<Order>) =
        orders.into_iter().partition(|o| o.reduce_only);
    reduce_only.extend(rest);
    reduce_only
}

/// Cancellation batch: reduce-only first only when over `cap`, then capped
pub fn shape_cancellations(orders: Vec<Order>, cap: usize) -> Vec<Order> {
    if orders.len() > cap {
        cap_batch(prioritize_reduce_only(orders), cap)
    } else {
        orders
    }
}

/// Run one task per item and collect results in input order
pub async fn dispatch_batch<T, R, F, Fut>(items: Vec<T>, unit: F) -> Vec<Option<R>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Option<R>> + Send + 'static,
    R: Send + 'static,
{
    let handles: Vec<_> = items.into_iter().map(|item| tokio::spawn(unit(item))).collect();

    let mut results = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => {
                error!(index, error = %e, "[EXEC] Batch unit aborted");
                results.push(None);
            }
        }
    }
    results
}

impl<C: VenueClient + 'static> Gateway<C> {
    /// Place up to `max_creations_per_batch` limit orders concurrently
    ///
    /// Returns one slot per dispatched order: the confirmed order, or
    /// `None` if it was rejected.
    pub async fn execute_orders(&self, orders: Vec<Order>) -> Vec<Option<Order>> {
        let batch = cap_batch(orders, self.settings.max_creations_per_batch);
        debug!(count = batch.len(), "[EXEC] Dispatching order creations");

        let venue = Arc::clone(&self.venue);
        let markets = Arc::clone(&self.markets);
        dispatch_batch(batch, move |order| {
            let venue = Arc::clone(&venue);
            let markets = Arc::clone(&markets);
            async move { create_one(venue.as_ref(), &markets, order).await }
        })
        .await
    }

    /// Cancel up to `max_cancellations_per_batch` orders concurrently
    ///
    /// Over the cap, reduce-only orders take the available slots first.
    pub async fn execute_cancellations(&self, orders: Vec<Order>) -> Vec<Option<Order>> {
        let batch = shape_cancellations(orders, self.settings.max_cancellations_per_batch);
        debug!(count = batch.len(), "[EXEC] Dispatching order cancellations");

        let venue = Arc::clone(&self.venue);
        let markets = Arc::clone(&self.markets);
        dispatch_batch(batch, move |order| {
            let venue = Arc::clone(&venue);
            let markets = Arc::clone(&markets);
            async move { cancel_one(venue.as_ref(), &markets, order).await }
        })
        .await
    }
}

async fn create_one<C: VenueClient>(venue: &C, markets: &MarketRegistry, order: Order) -> Option<Order> {
    let Some(market) = markets.get(&order.symbol) else {
        policy::on_unknown_symbol(&order);
        return None;
    };

    let request = LimitOrderRequest {
        symbol_id: market.symbol_id.clone(),
        side: order.side,
        position_side: order.position_side,
        qty: order.qty,
        price: order.price,
        client_order_id: client_order_id(&order.custom_id),
        post_only: true,
    };

    match venue.create_limit_order(&request).await {
        Ok(ack) => Some(backfill_confirmation(&ack, &order)),
        Err(e) => {
            policy::on_creation_error(market, &order, &e);
            None
        }
    }
}

async fn cancel_one<C: VenueClient>(venue: &C, markets: &MarketRegistry, order: Order) -> Option<Order> {
    let Some(order_id) = order.id.clone() else {
        error!(symbol = %order.symbol, custom_id = %order.custom_id, "[EXEC] Cannot cancel order without id");
        return None;
    };
    let symbol_id = markets
        .get(&order.symbol)
        .map(|m| m.symbol_id.clone())
        .unwrap_or_else(|| venue_id_from_symbol(&order.symbol));

    match venue.cancel_order(&order_id, &symbol_id).await {
        Ok(ack) => Some(backfill_confirmation(&ack, &order)),
        Err(e) => {
            policy::on_cancellation_error(&order, &e);
            None
        }
    }
}
