//! Field normalization: venue-native records to canonical records
//!
//! Pure functions, no I/O. Records that cannot be mapped (unknown side,
//! one-way position mode) are dropped with a warning rather than guessed.

use tracing::warn;

use crate::adapters::types::{
    PositionSide, Side, VenueBalance, VenueCandle, VenueOrder, VenuePosition, VenueTicker,
};
use crate::core::types::{
    derive_reduce_only, Candle, Order, OrderStatus, PnlRecord, Position, Ticker,
};

// =============================================================================
// Symbols
// =============================================================================

/// `BTC-USDT` -> `BTC/USDT:USDT`
pub fn symbol_from_venue_id(symbol_id: &str) -> String {
    match symbol_id.split_once('-') {
        Some((base, quote)) => format!("{}/{}:{}", base, quote, quote),
        None => symbol_id.to_string(),
    }
}

/// `BTC/USDT:USDT` -> `BTC-USDT`
pub fn venue_id_from_symbol(symbol: &str) -> String {
    let pair = symbol.split(':').next().unwrap_or(symbol);
    pair.replace('/', "-")
}

/// `BTC/USDT:USDT` -> `BTC`
pub fn coin_from_symbol(symbol: &str) -> String {
    symbol
        .split(['/', '-'])
        .next()
        .unwrap_or(symbol)
        .to_string()
}

/// Canonical symbol for a configured coin
pub fn symbol_for_coin(coin: &str, quote: &str) -> String {
    format!("{}/{}:{}", coin.to_uppercase(), quote, quote)
}

// =============================================================================
// Records
// =============================================================================

/// Map a venue order; `qty` comes from the original amount
pub fn normalize_order(raw: &VenueOrder) -> Option<Order> {
    let side = Side::parse_venue(&raw.side);
    let position_side = PositionSide::parse_venue(&raw.position_side);
    let (Some(side), Some(position_side)) = (side, position_side) else {
        warn!(
            order_id = %raw.order_id,
            side = %raw.side,
            position_side = %raw.position_side,
            "[NORMALIZE] Skipping order with unmappable side"
        );
        return None;
    };

    Some(Order {
        id: (!raw.order_id.is_empty()).then(|| raw.order_id.clone()),
        symbol: symbol_from_venue_id(&raw.symbol),
        side,
        position_side,
        qty: raw.orig_qty,
        price: raw.price,
        reduce_only: raw
            .reduce_only
            .unwrap_or_else(|| derive_reduce_only(side, position_side)),
        custom_id: raw.client_order_id.clone(),
        timestamp: if raw.time > 0 { raw.time } else { raw.update_time },
        status: OrderStatus::parse_venue(&raw.status),
    })
}

/// Map a batch, dropping unmappable entries, sorted by timestamp
pub fn normalize_orders(raw: &[VenueOrder]) -> Vec<Order> {
    let mut orders: Vec<Order> = raw.iter().filter_map(normalize_order).collect();
    orders.sort_by_key(|o| o.timestamp);
    orders
}

/// Merge a create/cancel acknowledgement with the order that was submitted
///
/// The venue acknowledges with a partial record; anything it leaves out is
/// taken from `submitted`.
pub fn backfill_confirmation(ack: &VenueOrder, submitted: &Order) -> Order {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

    Order {
        id: non_empty(&ack.order_id).or_else(|| submitted.id.clone()),
        symbol: non_empty(&ack.symbol)
            .map(|id| symbol_from_venue_id(&id))
            .unwrap_or_else(|| submitted.symbol.clone()),
        side: Side::parse_venue(&ack.side).unwrap_or(submitted.side),
        position_side: PositionSide::parse_venue(&ack.position_side)
            .unwrap_or(submitted.position_side),
        qty: if ack.orig_qty > 0.0 { ack.orig_qty } else { submitted.qty },
        price: if ack.price > 0.0 { ack.price } else { submitted.price },
        reduce_only: ack.reduce_only.unwrap_or(submitted.reduce_only),
        custom_id: submitted.custom_id.clone(),
        timestamp: match ack.time.max(ack.update_time) {
            0 => submitted.timestamp,
            ts => ts,
        },
        status: if ack.status.is_empty() {
            submitted.status
        } else {
            OrderStatus::parse_venue(&ack.status)
        },
    }
}

/// Cross-margin legs only; size is the absolute contract amount
pub fn normalize_position(raw: &VenuePosition) -> Option<Position> {
    if raw.isolated {
        return None;
    }
    let position_side = PositionSide::parse_venue(&raw.position_side)?;
    Some(Position {
        symbol: symbol_from_venue_id(&raw.symbol),
        position_side,
        size: raw.position_amt.abs(),
        price: raw.avg_price,
    })
}

pub fn normalize_positions(raw: &[VenuePosition]) -> Vec<Position> {
    raw.iter().filter_map(normalize_position).collect()
}

pub fn normalize_balance(raw: &VenueBalance) -> f64 {
    raw.balance
}

pub fn normalize_ticker(raw: &VenueTicker) -> Ticker {
    Ticker {
        symbol: symbol_from_venue_id(&raw.symbol),
        bid: raw.bid_price,
        ask: raw.ask_price,
        last: raw.last_price,
    }
}

/// `profit -> pnl`, `updateTime -> timestamp`, `orderId -> id`
pub fn normalize_pnl(raw: &VenueOrder) -> PnlRecord {
    PnlRecord {
        id: raw.order_id.clone(),
        symbol: symbol_from_venue_id(&raw.symbol),
        pnl: raw.profit,
        timestamp: if raw.update_time > 0 { raw.update_time } else { raw.time },
    }
}

pub fn normalize_candle(raw: &VenueCandle) -> Candle {
    Candle {
        timestamp: raw.time,
        open: raw.open,
        high: raw.high,
        low: raw.low,
        close: raw.close,
        volume: raw.volume,
    }
}
