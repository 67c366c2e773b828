//! Savings goal annuity solver (spec.md §4.8).
//!
//! Solves the annuity-future-value identity
//! `T = FV*(1+r/12)^n + P*((1+r/12)^n - 1)/(r/12)` for whichever of
//! `payment_per_period` / `target_date` the config leaves unset. Needs
//! `powf`/`ln`, unavailable on `Decimal` — see `crate::decimal`'s module
//! doc for the float exception this and `crate::xirr` share.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::caldate;
use crate::config::SavingsGoalConfig;

#[derive(Debug, Clone, Serialize)]
pub struct SavingsProjection {
    pub target: Decimal,
    pub current: Decimal,
    pub monthly_rate: Decimal,
    /// The computed `payment_per_period`, if the config provided a
    /// `target_date` instead.
    pub payment_per_period: Option<Decimal>,
    /// The computed `target_date`, if the config provided a
    /// `payment_per_period` instead.
    pub target_date: Option<NaiveDate>,
}

pub fn compute(goal: &SavingsGoalConfig, current: Decimal, today: NaiveDate) -> SavingsProjection {
    let target = goal.target_amount.to_f64().unwrap_or(0.0);
    let fv = current.to_f64().unwrap_or(0.0);
    let annual_rate = goal.annual_rate.to_f64().unwrap_or(0.0);
    let monthly_rate = annual_rate / 12.0;

    match (goal.target_date, goal.payment_per_period) {
        (Some(target_date), _) => {
            let n = months_between(today, target_date).max(0) as f64;
            let payment = solve_payment(target, fv, monthly_rate, n);
            SavingsProjection {
                target: goal.target_amount,
                current,
                monthly_rate: goal.annual_rate / Decimal::from(12),
                payment_per_period: Decimal::from_f64_retain(payment),
                target_date: Some(target_date),
            }
        }
        (None, Some(payment)) => {
            let p = payment.to_f64().unwrap_or(0.0);
            let n = solve_periods(target, fv, monthly_rate, p);
            let months = n.ceil().max(0.0) as u32;
            SavingsProjection {
                target: goal.target_amount,
                current,
                monthly_rate: goal.annual_rate / Decimal::from(12),
                payment_per_period: Some(payment),
                target_date: Some(add_months(today, months)),
            }
        }
        (None, None) => SavingsProjection {
            target: goal.target_amount,
            current,
            monthly_rate: goal.annual_rate / Decimal::from(12),
            payment_per_period: None,
            target_date: None,
        },
    }
}

fn solve_payment(target: f64, fv: f64, monthly_rate: f64, n: f64) -> f64 {
    if monthly_rate.abs() < f64::EPSILON {
        if n.abs() < f64::EPSILON {
            return 0.0;
        }
        return (target - fv) / n;
    }
    let growth = (1.0 + monthly_rate).powf(n);
    (target - fv * growth) * monthly_rate / (growth - 1.0)
}

fn solve_periods(target: f64, fv: f64, monthly_rate: f64, payment: f64) -> f64 {
    if monthly_rate.abs() < f64::EPSILON {
        if payment.abs() < f64::EPSILON {
            return 0.0;
        }
        return (target - fv) / payment;
    }
    let numerator = target * monthly_rate + payment;
    let denominator = fv * monthly_rate + payment;
    if numerator <= 0.0 || denominator <= 0.0 {
        return 0.0;
    }
    (numerator / denominator).ln() / (1.0 + monthly_rate).ln()
}

fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    use chrono::Datelike;
    (end.year() as i64 - start.year() as i64) * 12 + (end.month() as i64 - start.month() as i64)
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let mut cursor = date;
    for _ in 0..months {
        cursor = caldate::next_month_begin(cursor);
    }
    cursor
}
