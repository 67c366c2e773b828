//! Retirement goal projection (spec.md §4.7).

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::caldate;
use crate::config::RetirementGoalConfig;
use crate::decimal::safe_ratio;
use crate::domain::Posting;
use crate::store::price_store::PriceIndex;
use crate::valuation::market_value;

#[derive(Debug, Clone, Serialize)]
pub struct RetirementProjection {
    pub yearly_expenses: Decimal,
    pub target: Decimal,
    pub current: Decimal,
    /// `None` when the trailing addition rate is non-positive: the goal
    /// will never be reached at the current pace.
    pub completion_date: Option<NaiveDate>,
}

/// `expense_postings` and `savings_postings` should already be filtered to
/// `goal.expense_accounts` and `goal.savings_accounts` respectively.
pub fn compute(
    goal: &RetirementGoalConfig,
    expense_postings: &[&Posting],
    savings_postings: &[&Posting],
    prices: &PriceIndex,
    default_currency: &str,
    today: NaiveDate,
) -> RetirementProjection {
    let yearly_expenses = goal
        .yearly_expenses_override
        .unwrap_or_else(|| mean_of_last_complete_years(expense_postings, today, 3));

    let target = safe_ratio(yearly_expenses * Decimal::from(100), goal.swr);

    let current: Decimal = savings_postings
        .iter()
        .map(|p| market_value(prices, p, default_currency, today))
        .sum();

    let year_ago = caldate::months_before(today, 12);
    let trailing_additions: Decimal = savings_postings
        .iter()
        .filter(|p| p.date >= year_ago && p.date <= today && p.amount > Decimal::ZERO)
        .map(|p| p.amount)
        .sum();
    let monthly_rate = trailing_additions / Decimal::from(12);

    let completion_date = if current >= target {
        Some(today)
    } else if monthly_rate <= Decimal::ZERO {
        None
    } else {
        let remaining = target - current;
        let months_needed = (remaining / monthly_rate).ceil().to_u32().unwrap_or(u32::MAX);
        Some(add_months(today, months_needed))
    };

    RetirementProjection {
        yearly_expenses,
        target,
        current,
        completion_date,
    }
}

fn mean_of_last_complete_years(postings: &[&Posting], today: NaiveDate, years: i32) -> Decimal {
    let last_complete_year = today.year() - 1;
    let first_year = last_complete_year - years + 1;

    let mut total = Decimal::ZERO;
    let mut count = 0;
    for year in first_year..=last_complete_year {
        let sum: Decimal = postings
            .iter()
            .filter(|p| p.date.year() == year)
            .map(|p| p.amount)
            .sum();
        total += sum;
        count += 1;
    }
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count)
    }
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let mut cursor = date;
    for _ in 0..months {
        cursor = caldate::next_month_begin(cursor);
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn posting(date: NaiveDate, amount: Decimal) -> Posting {
        Posting {
            transaction_id: 1,
            date,
            payee: "payee".into(),
            account: "Expenses:Living".into(),
            commodity: "INR".into(),
            quantity: Decimal::ZERO,
            amount,
            status: crate::domain::PostingStatus::Cleared,
            transaction_begin_line: 1,
            end_line: 2,
            file_name: "journal.ledger".into(),
            forecast: false,
            tag_recurring: None,
            posting_index: 0,
        }
    }

    #[test]
    fn target_uses_override_when_present() {
        let goal = RetirementGoalConfig {
            name: "fire".into(),
            swr: dec!(4),
            savings_accounts: vec![],
            expense_accounts: vec![],
            yearly_expenses_override: Some(dec!(600000)),
        };
        let prices = PriceIndex::default();
        let proj = compute(&goal, &[], &[], &prices, "INR", NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(proj.yearly_expenses, dec!(600000));
        assert_eq!(proj.target, dec!(15000000));
    }

    #[test]
    fn completion_date_is_today_when_target_already_met() {
        let goal = RetirementGoalConfig {
            name: "fire".into(),
            swr: dec!(4),
            savings_accounts: vec![],
            expense_accounts: vec![],
            yearly_expenses_override: Some(dec!(0)),
        };
        let prices = PriceIndex::default();
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let proj = compute(&goal, &[], &[], &prices, "INR", today);
        assert_eq!(proj.completion_date, Some(today));
    }

    #[test]
    fn expense_mean_averages_last_three_complete_years() {
        let postings = vec![
            posting(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(), dec!(400000)),
            posting(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), dec!(500000)),
            posting(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), dec!(600000)),
        ];
        let refs: Vec<&Posting> = postings.iter().collect();
        let mean = mean_of_last_complete_years(&refs, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), 3);
        assert_eq!(mean, dec!(500000));
    }
}
