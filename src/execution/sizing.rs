use crate::models::{LotConstraint, Side};

/// Compute the market-order quantity for a signal.
///
/// Buys spend the free quote balance at the current price; sells dispose of
/// the free base balance directly. Either way the raw quantity is lifted to
/// the exchange minimum and then snapped *down* onto the step grid, so the
/// result is always a step multiple.
///
/// A result of zero (possible when the lot minimum itself is below the step
/// size) means no order should be placed; the caller is expected to log it.
pub fn order_quantity(side: Side, free_balance: f64, price: f64, lot: &LotConstraint) -> f64 {
    let raw_qty = match side {
        Side::Buy => {
            if price > 0.0 {
                free_balance / price
            } else {
                0.0
            }
        }
        Side::Sell => free_balance,
    };

    snap_to_step(raw_qty.max(lot.min_qty), lot.step_size)
}

/// Round a quantity down to the nearest multiple of `step`
fn snap_to_step(qty: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return qty;
    }
    (qty / step).floor() * step
}
