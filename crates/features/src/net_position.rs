//! Net position as a percentage of open interest.

use cot_core::CategoryPositions;

/// Compute `100 * (long - short) / open_interest`.
///
/// Returns `None` when open interest is zero or missing, when either side is
/// missing, or when any operand is not finite. A sparse week never aborts
/// the run.
#[inline]
pub fn net_pct_oi(positions: CategoryPositions, open_interest: Option<f64>) -> Option<f64> {
    let oi = open_interest.filter(|oi| oi.is_finite() && *oi != 0.0)?;
    let net = positions.net().filter(|n| n.is_finite())?;
    Some(100.0 * net / oi)
}
