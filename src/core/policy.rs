//! Error-adaptive policy for rejected creations and cancellations
//!
//! Every venue error ends here: it is classified by code, logged at the
//! matching severity, and absorbed. A "size too small" rejection also
//! raises the cached `min_qty` for the symbol so the next order sized
//! from it passes validation.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::adapters::errors::{ExchangeError, VenueErrorKind};
use crate::core::markets::MarketSpec;
use crate::core::types::Order;

/// Write capability for `MarketSpec::raise_min_qty`
///
/// The field is private, so no other module can construct one:
///
/// ```compile_fail
/// use bingx_gateway::core::policy::MinQtyWriter;
/// let _writer = MinQtyWriter(());
/// ```
#[derive(Debug)]
pub struct MinQtyWriter(());

/// `round_up_to_step(max(current, attempted) + step, step)`
///
/// Computed in decimal to avoid landing a hair under a step boundary.
pub fn corrected_min_qty(current: f64, attempted: f64, step: f64) -> f64 {
    let base = current.max(attempted);
    let (Some(base), Some(step_dec)) = (Decimal::from_f64(base), Decimal::from_f64(step)) else {
        return base + step;
    };
    if step_dec <= Decimal::ZERO {
        return base.to_f64().unwrap_or(current.max(attempted));
    }
    let steps = ((base + step_dec) / step_dec).ceil();
    (steps * step_dec)
        .normalize()
        .to_f64()
        .unwrap_or(current.max(attempted) + step)
}

/// Handle a rejected order creation
///
/// Returns the new `min_qty` when the rejection caused an adjustment.
pub fn on_creation_error(market: &MarketSpec, order: &Order, err: &ExchangeError) -> Option<f64> {
    match err.kind() {
        VenueErrorKind::OrderSizeTooSmall => {
            let new_min = corrected_min_qty(market.min_qty(), order.qty, market.qty_step);
            let previous = market.raise_min_qty(new_min, &MinQtyWriter(()));
            info!(
                symbol = %market.symbol,
                attempted_qty = order.qty,
                previous_min_qty = previous,
                new_min_qty = new_min,
                "[EXEC] Order size below venue minimum, raised min_qty"
            );
            Some(new_min)
        }
        _ => {
            error!(
                symbol = %order.symbol,
                side = %order.side,
                position_side = %order.position_side,
                qty = order.qty,
                price = order.price,
                custom_id = %order.custom_id,
                error = %err,
                "[EXEC] Order creation failed"
            );
            None
        }
    }
}

/// Handle a rejected cancellation
pub fn on_cancellation_error(order: &Order, err: &ExchangeError) {
    match err.kind() {
        VenueErrorKind::OrderNotFound => {
            info!(
                symbol = %order.symbol,
                order_id = ?order.id,
                "[EXEC] Order already gone (filled or cancelled)"
            );
        }
        _ => {
            error!(
                symbol = %order.symbol,
                order_id = ?order.id,
                side = %order.side,
                qty = order.qty,
                price = order.price,
                error = %err,
                "[EXEC] Order cancellation failed"
            );
        }
    }
}

/// Creation attempted for a symbol that is not tracked
pub fn on_unknown_symbol(order: &Order) {
    warn!(symbol = %order.symbol, custom_id = %order.custom_id, "[EXEC] Order for untracked symbol skipped");
}
