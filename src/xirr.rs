//! XIRR solver (spec.md §4.5).
//!
//! Newton-Raphson with a numeric derivative, grounded on
//! `n-kishaloy-financelib`'s `newt_raph` (100-iteration cap, central-ish
//! forward-difference derivative, stop on negligible step); falls back to
//! bisection over `[-0.9999, 10]` when Newton fails to converge, since
//! `newt_raph` itself has no fallback and XIRR's objective is not always
//! well-behaved near `r = -1`.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const MAX_ITERATIONS: u32 = 100;
const TOLERANCE: f64 = 1e-6;
const BISECTION_LOW: f64 = -0.9999;
const BISECTION_HIGH: f64 = 10.0;

/// One cash flow: negative for money invested, positive for money returned.
#[derive(Debug, Clone, Copy)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Solves for the annualized rate `r` such that
/// `Σ cfᵢ / (1+r)^(daysᵢ/365) = 0`, with `days` measured from the earliest
/// flow. Returns `0` if fewer than two flows or if every flow has the same
/// sign (no rate can zero a one-signed series).
pub fn xirr(flows: &[CashFlow]) -> Decimal {
    if flows.len() < 2 {
        return Decimal::ZERO;
    }
    let has_positive = flows.iter().any(|f| f.amount > Decimal::ZERO);
    let has_negative = flows.iter().any(|f| f.amount < Decimal::ZERO);
    if !has_positive || !has_negative {
        return Decimal::ZERO;
    }

    let first_date = flows.iter().map(|f| f.date).min().expect("non-empty");
    let days: Vec<f64> = flows
        .iter()
        .map(|f| (f.date - first_date).num_days() as f64)
        .collect();
    let amounts: Vec<f64> = flows
        .iter()
        .map(|f| f.amount.to_f64().unwrap_or(0.0))
        .collect();

    let objective = |r: f64| -> f64 {
        days.iter()
            .zip(&amounts)
            .map(|(d, a)| a / (1.0 + r).powf(d / 365.0))
            .sum()
    };

    if let Some(r) = newton_raphson(objective, 0.1) {
        return Decimal::from_f64_retain(r).unwrap_or(Decimal::ZERO);
    }
    bisection(objective).map_or(Decimal::ZERO, |r| {
        Decimal::from_f64_retain(r).unwrap_or(Decimal::ZERO)
    })
}

fn newton_raphson(f: impl Fn(f64) -> f64, mut x: f64) -> Option<f64> {
    let dx = 1e-6;
    for _ in 0..MAX_ITERATIONS {
        let fx = f(x);
        if fx.abs() < TOLERANCE {
            return Some(x);
        }
        let derivative = (f(x + dx) - fx) / dx;
        if derivative.abs() < f64::EPSILON {
            return None;
        }
        let step = fx / derivative;
        x -= step;
        if x <= BISECTION_LOW {
            return None;
        }
    }
    None
}

fn bisection(f: impl Fn(f64) -> f64) -> Option<f64> {
    let mut low = BISECTION_LOW;
    let mut high = BISECTION_HIGH;
    let mut f_low = f(low);

    if f_low.abs() < TOLERANCE {
        return Some(low);
    }
    if (f_low * f(high)).is_sign_positive() {
        return None;
    }

    for _ in 0..MAX_ITERATIONS {
        let mid = (low + high) / 2.0;
        let f_mid = f(mid);
        if f_mid.abs() < TOLERANCE {
            return Some(mid);
        }
        if (f_low * f_mid).is_sign_negative() {
            high = mid;
        } else {
            low = mid;
            f_low = f_mid;
        }
    }
    Some((low + high) / 2.0)
}
