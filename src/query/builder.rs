//! `PostingQuery`: the accumulating filter builder of spec.md §4.1.
//!
//! Consuming, `self -> Self` builder methods, grounded on the teacher's
//! `PerformanceReportsBuilder` (`backtest_result::performance_report`):
//! cheap to `Clone`, every method returns an owned new value rather than
//! mutating through `&mut self`, so a caller can branch a query into two
//! independent follow-on queries without aliasing concerns.

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::caldate;
use crate::domain::Posting;
use crate::error::LedgerscopeError;

use super::glob::{self, AccountGlob};

#[derive(Debug, Clone)]
enum DateWindow {
    LastNMonths(u32),
    BeforeNMonths(u32),
    UntilToday,
    UntilThisMonthEnd,
}

#[derive(Debug, Clone)]
enum Clause {
    Like(Vec<AccountGlob>),
    AccountPrefix(String),
    NotAccountPrefix(String),
    Forecast(bool),
    DateWindow(DateWindow),
}

/// Accumulates filter clauses over an immutable posting slice. Cloning is
/// `O(clauses)`, never `O(postings)` — materialization happens only in
/// [`PostingQuery::all`].
#[derive(Debug, Clone)]
pub struct PostingQuery<'a> {
    postings: &'a [Posting],
    clauses: Vec<Clause>,
    tz: Tz,
}

impl<'a> PostingQuery<'a> {
    /// A query over every posting in `postings`, unfiltered.
    pub fn all(postings: &'a [Posting], tz: Tz) -> Self {
        Self {
            postings,
            clauses: Vec::new(),
            tz,
        }
    }

    pub fn like(mut self, patterns: &[&str]) -> Result<Self, LedgerscopeError> {
        let globs = patterns
            .iter()
            .map(|p| AccountGlob::compile(p))
            .collect::<Result<Vec<_>, _>>()?;
        self.clauses.push(Clause::Like(globs));
        Ok(self)
    }

    pub fn account_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.clauses.push(Clause::AccountPrefix(prefix.into()));
        self
    }

    pub fn not_account_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.clauses.push(Clause::NotAccountPrefix(prefix.into()));
        self
    }

    pub fn forecast(mut self) -> Self {
        self.clauses.push(Clause::Forecast(true));
        self
    }

    pub fn not_forecast(mut self) -> Self {
        self.clauses.push(Clause::Forecast(false));
        self
    }

    pub fn last_n_months(mut self, n: u32) -> Self {
        self.clauses.push(Clause::DateWindow(DateWindow::LastNMonths(n)));
        self
    }

    pub fn before_n_months(mut self, n: u32) -> Self {
        self.clauses
            .push(Clause::DateWindow(DateWindow::BeforeNMonths(n)));
        self
    }

    pub fn until_today(mut self) -> Self {
        self.clauses.push(Clause::DateWindow(DateWindow::UntilToday));
        self
    }

    pub fn until_this_month_end(mut self) -> Self {
        self.clauses
            .push(Clause::DateWindow(DateWindow::UntilThisMonthEnd));
        self
    }

    /// Deep snapshot so a branch of analysis can keep filtering without
    /// affecting the caller's copy (spec.md §4.1).
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Materializes every posting matching all accumulated clauses, sorted
    /// ascending by date, ties broken by the store's canonical order
    /// (transaction encounter order, then posting index — already the order
    /// [`crate::store::posting_store::load_all`] returns).
    pub fn materialize(&self) -> Vec<&'a Posting> {
        let today = caldate::today_in(self.tz);
        let mut matched: Vec<&Posting> = self
            .postings
            .iter()
            .filter(|p| self.clauses.iter().all(|c| self.matches(c, p, today)))
            .collect();
        matched.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then(a.transaction_id.cmp(&b.transaction_id))
                .then(a.posting_index.cmp(&b.posting_index))
        });
        matched
    }

    fn matches(&self, clause: &Clause, posting: &Posting, today: NaiveDate) -> bool {
        match clause {
            Clause::Like(globs) => globs.iter().any(|g| g.matches(&posting.account)),
            Clause::AccountPrefix(prefix) => glob::is_prefix(&posting.account, prefix),
            Clause::NotAccountPrefix(prefix) => !glob::is_prefix(&posting.account, prefix),
            Clause::Forecast(want) => posting.forecast == *want,
            Clause::DateWindow(window) => match window {
                DateWindow::LastNMonths(n) => posting.date >= caldate::months_before(today, *n),
                DateWindow::BeforeNMonths(n) => posting.date < caldate::months_before(today, *n),
                DateWindow::UntilToday => posting.date <= today,
                DateWindow::UntilThisMonthEnd => posting.date <= caldate::month_end(today),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn posting(date: NaiveDate, account: &str, forecast: bool) -> Posting {
        Posting {
            transaction_id: 1,
            date,
            payee: "payee".into(),
            account: account.into(),
            commodity: "INR".into(),
            quantity: Decimal::ZERO,
            amount: Decimal::ZERO,
            status: crate::domain::PostingStatus::Cleared,
            transaction_begin_line: 1,
            end_line: 2,
            file_name: "journal.ledger".into(),
            forecast,
            tag_recurring: None,
            posting_index: 0,
        }
    }

    #[test]
    fn account_prefix_matches_self_and_descendants() {
        let postings = vec![
            posting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "Assets:Checking", false),
            posting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "Expenses:Food", false),
        ];
        let matched = PostingQuery::all(&postings, chrono_tz::Asia::Kolkata)
            .account_prefix("Assets")
            .materialize();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].account, "Assets:Checking");
    }

    #[test]
    fn forecast_filters_are_mutually_exclusive() {
        let postings = vec![
            posting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "Expenses:Food", true),
            posting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "Expenses:Food", false),
        ];
        let forecasted = PostingQuery::all(&postings, chrono_tz::Asia::Kolkata)
            .forecast()
            .materialize();
        assert_eq!(forecasted.len(), 1);
        assert!(forecasted[0].forecast);
    }

    #[test]
    fn materialize_sorts_ascending_by_date() {
        let postings = vec![
            posting(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), "Assets:Checking", false),
            posting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "Assets:Checking", false),
        ];
        let matched = PostingQuery::all(&postings, chrono_tz::Asia::Kolkata).materialize();
        assert!(matched[0].date < matched[1].date);
    }

    #[test]
    fn snapshot_branches_do_not_interfere() {
        let postings = vec![posting(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "Assets:Checking",
            false,
        )];
        let base = PostingQuery::all(&postings, chrono_tz::Asia::Kolkata);
        let branch = base.snapshot().account_prefix("Expenses");
        assert_eq!(base.materialize().len(), 1);
        assert_eq!(branch.materialize().len(), 0);
    }
}
