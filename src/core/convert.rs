//! Currency normalization.

use crate::core::cost::Currency;
use crate::core::currency::RateTable;

/// Converts `amount` from one currency to another through the USD base.
///
/// A currency missing from `rates` counts as multiplier 1. A rate of 0 is not
/// guarded against and yields an infinite or NaN result.
pub fn convert(amount: f64, from: Currency, to: Currency, rates: &RateTable) -> f64 {
    let from_rate = rates.rate(from).unwrap_or(1.0);
    let to_rate = rates.rate(to).unwrap_or(1.0);
    (amount / from_rate) * to_rate
}

/// Rounds to cents, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Non-finite values count as nothing when summed.
pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
