//! Practice ledger: the signed dollar amount one practice contributes to one
//! transaction. Noisy classifier input is clamped, never rejected.

use crate::model::{Polarity, FULL_WEIGHT};

/// Clamp a classifier weight into [0, 100]. Absent or NaN means full weight.
pub fn clamp_weight(weight_percent: Option<f64>) -> f64 {
    match weight_percent {
        None => FULL_WEIGHT,
        Some(w) if w.is_nan() => FULL_WEIGHT,
        Some(w) => w.clamp(0.0, FULL_WEIGHT),
    }
}

/// Purchase totals below zero (or not finite) count as zero spend.
pub fn clamp_amount(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

/// `amount * weight / 100`, positive for unethical practices and negated for
/// ethical ones.
pub fn practice_amount(transaction_amount: f64, weight_percent: Option<f64>, polarity: Polarity) -> f64 {
    let magnitude = clamp_amount(transaction_amount) * clamp_weight(weight_percent) / 100.0;
    match polarity {
        Polarity::Unethical => magnitude,
        // Avoid -0.0 so a zero contribution serializes the same either way.
        Polarity::Ethical if magnitude == 0.0 => 0.0,
        Polarity::Ethical => -magnitude,
    }
}
