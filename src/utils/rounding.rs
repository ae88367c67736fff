//! Rounding helpers shared by the financial calculators

use bigdecimal::{rounding::RoundingMode, BigDecimal};

/// Round a monetary amount to 2 decimal places, half-up.
pub fn round_money(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

/// Round a rate/percentage to 1 decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round a rate/percentage to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
