//! Budget engine (spec.md §4.6).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::caldate;
use crate::config::{BudgetConfig, ScheduledTransaction};
use crate::domain::Posting;
use crate::query::glob::is_prefix;

#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountMonthBudget {
    pub account: String,
    pub forecast: Decimal,
    pub actual: Decimal,
    pub rollover: Decimal,
    pub available: Decimal,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MonthBudget {
    pub month: NaiveDate,
    pub accounts: Vec<AccountMonthBudget>,
    pub end_of_month_balance: Decimal,
}

/// Runs the month-by-month budget walk (spec.md §4.6) over `postings`
/// (actuals) and `schedule`, starting the "available for budgeting" seed at
/// `checking_balance`.
pub fn compute(
    postings: &[&Posting],
    schedule: &[ScheduledTransaction],
    config: &BudgetConfig,
    months: &[NaiveDate],
    checking_balance: Decimal,
    today: NaiveDate,
) -> Vec<MonthBudget> {
    let mut forecast_accounts: Vec<String> = schedule.iter().map(|s| s.account.clone()).collect();
    forecast_accounts.sort();
    forecast_accounts.dedup();

    let mut previous_available: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut seed = checking_balance;
    let mut out = Vec::with_capacity(months.len());

    for &month in months {
        let month_end = caldate::month_end(month);
        let forecast_for = |account: &str| -> Decimal {
            schedule
                .iter()
                .filter(|s| s.account == account)
                .map(|s| s.amount)
                .sum()
        };
        let actual_for = |account: &str| -> Decimal {
            postings
                .iter()
                .filter(|p| p.date >= month && p.date <= month_end && is_prefix(&p.account, account))
                .map(|p| p.amount)
                .sum()
        };

        let mut accounts = Vec::with_capacity(forecast_accounts.len());
        let mut deduction = Decimal::ZERO;

        for account in &forecast_accounts {
            let forecast = forecast_for(account);
            let actual = actual_for(account);

            let (rollover, available) = if config.rollover {
                let rollover = previous_available
                    .get(account)
                    .copied()
                    .unwrap_or(Decimal::ZERO)
                    .max(Decimal::ZERO);
                (rollover, rollover + forecast - actual)
            } else if month < caldate::month_begin(today) {
                (Decimal::ZERO, Decimal::ZERO)
            } else {
                (Decimal::ZERO, forecast - actual)
            };

            deduction += available.max(Decimal::ZERO);
            previous_available.insert(account.clone(), available);

            accounts.push(AccountMonthBudget {
                account: account.clone(),
                forecast,
                actual,
                rollover,
                available,
            });
        }

        seed -= deduction;
        out.push(MonthBudget {
            month,
            accounts,
            end_of_month_balance: seed,
        });
    }

    out
}
