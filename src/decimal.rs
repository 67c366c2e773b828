//! Exact-decimal helpers shared by every monetary computation in the crate.
//!
//! Spec invariant: no binary floating point touches a monetary value. The
//! XIRR solver (`crate::xirr`) and the savings-goal annuity solver
//! (`crate::goals::savings`) are the sanctioned exceptions — both need
//! transcendental functions (`powf`, `ln`) that `Decimal` doesn't provide —
//! and both convert back to `Decimal` before returning.

use rust_decimal::Decimal;
use rust_decimal::prelude::Zero;

/// Rounding and formatting helpers for `Decimal`, mirroring the shape of the
/// teacher's `MyDecimalPlaces` trait extension but operating on an exact
/// decimal type instead of `f64`.
pub trait DisplayPrecision {
    /// Rounds to `places` fractional digits using banker's rounding, the
    /// default `rust_decimal` midpoint strategy.
    fn round_display(self, places: u32) -> Decimal;

    /// Renders with a thousands separator and exactly `places` fractional
    /// digits, e.g. `1234567.5` at 2 places -> `"1,234,567.50"`.
    fn format_locale(self, places: u32) -> String;
}

impl DisplayPrecision for Decimal {
    fn round_display(self, places: u32) -> Decimal {
        self.round_dp(places)
    }

    fn format_locale(self, places: u32) -> String {
        let rounded = self.round_dp(places);
        let negative = rounded.is_sign_negative();
        let abs = rounded.abs();
        let formatted = format!("{:.*}", places as usize, abs);
        let (int_part, frac_part) = match formatted.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (formatted.as_str(), None),
        };

        let mut grouped = String::new();
        for (i, ch) in int_part.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let grouped: String = grouped.chars().rev().collect();

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&grouped);
        if let Some(frac) = frac_part {
            out.push('.');
            out.push_str(frac);
        }
        out
    }
}

/// Returns `numerator / denominator`, or `Decimal::ZERO` when the denominator
/// is zero. Several ratios in the spec (`absoluteReturn`, saving rate,
/// financial independence) are explicitly defined as zero rather than
/// undefined when their denominator vanishes.
pub fn safe_ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}
