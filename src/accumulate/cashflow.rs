//! Monthly cash flow (spec.md §4.4.2).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::caldate;
use crate::domain::Posting;
use crate::query::glob::is_prefix;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CashFlowRecord {
    pub month: NaiveDate,
    pub income: Decimal,
    pub expenses: Decimal,
    pub tax: Decimal,
    pub investment: Decimal,
    pub liabilities: Decimal,
    pub checking: Decimal,
    pub balance: Decimal,
}

/// Builds one record per calendar month spanning
/// `[first posting, max(end of today, last posting)]`. `postings` need not
/// be pre-filtered by account; every clause below applies its own account
/// prefix.
///
/// The "three months before" checking seed (spec.md §4.4.2) is resolved as
/// the cumulative `Assets:Checking:*` balance for every posting dated
/// strictly before the month three calendar months prior to the window's
/// first month — see DESIGN.md's open-question log.
pub fn compute(postings: &[&Posting], today: NaiveDate) -> Vec<CashFlowRecord> {
    if postings.is_empty() {
        return Vec::new();
    }

    let first_date = postings.iter().map(|p| p.date).min().expect("non-empty");
    let last_date = postings.iter().map(|p| p.date).max().expect("non-empty");
    let window_end = last_date.max(today);
    let months = caldate::month_starts(first_date, window_end);

    let seed_cutoff = caldate::months_before(months[0], 3);
    let mut balance = postings
        .iter()
        .filter(|p| p.date < seed_cutoff && is_prefix(&p.account, "Assets:Checking"))
        .map(|p| p.amount)
        .sum::<Decimal>();

    let mut records = Vec::with_capacity(months.len());
    for month in months {
        let month_end = caldate::month_end(month);
        let in_month = |p: &&&Posting| p.date >= month && p.date <= month_end;

        let income = -postings
            .iter()
            .filter(in_month)
            .filter(|p| is_prefix(&p.account, "Income"))
            .map(|p| p.amount)
            .sum::<Decimal>();

        let expenses = postings
            .iter()
            .filter(in_month)
            .filter(|p| is_prefix(&p.account, "Expenses") && !is_prefix(&p.account, "Expenses:Tax"))
            .map(|p| p.amount)
            .sum::<Decimal>();

        let tax = postings
            .iter()
            .filter(in_month)
            .filter(|p| is_prefix(&p.account, "Expenses:Tax"))
            .map(|p| p.amount)
            .sum::<Decimal>();

        let investment = postings
            .iter()
            .filter(in_month)
            .filter(|p| is_prefix(&p.account, "Assets") && !is_prefix(&p.account, "Assets:Checking"))
            .map(|p| p.amount)
            .sum::<Decimal>();

        let liabilities = -postings
            .iter()
            .filter(in_month)
            .filter(|p| is_prefix(&p.account, "Liabilities"))
            .map(|p| p.amount)
            .sum::<Decimal>();

        let checking = postings
            .iter()
            .filter(in_month)
            .filter(|p| is_prefix(&p.account, "Assets:Checking"))
            .map(|p| p.amount)
            .sum::<Decimal>();

        balance += checking;

        records.push(CashFlowRecord {
            month,
            income,
            expenses,
            tax,
            investment,
            liabilities,
            checking,
            balance,
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn posting(date: NaiveDate, account: &str, amount: Decimal) -> Posting {
        Posting {
            transaction_id: 1,
            date,
            payee: "payee".into(),
            account: account.into(),
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
    fn income_and_expenses_split_from_checking() {
        let postings = vec![
            posting(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), "Income:Salary", dec!(-50000)),
            posting(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(), "Expenses:Food", dec!(5000)),
            posting(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(), "Expenses:Tax:Income", dec!(10000)),
            posting(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(), "Assets:Checking:Joint", dec!(35000)),
        ];
        let refs: Vec<&Posting> = postings.iter().collect();
        let records = compute(&refs, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(records.len(), 1);
        let jan = &records[0];
        assert_eq!(jan.income, dec!(50000));
        assert_eq!(jan.expenses, dec!(5000));
        assert_eq!(jan.tax, dec!(10000));
        assert_eq!(jan.checking, dec!(35000));
        assert_eq!(jan.balance, dec!(35000));
    }

    #[test]
    fn balance_runs_cumulatively_across_months() {
        let postings = vec![
            posting(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), "Assets:Checking:Joint", dec!(1000)),
            posting(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(), "Assets:Checking:Joint", dec!(500)),
        ];
        let refs: Vec<&Posting> = postings.iter().collect();
        let records = compute(&refs, NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());
        assert_eq!(records[0].balance, dec!(1000));
        assert_eq!(records[1].balance, dec!(1500));
    }
}
