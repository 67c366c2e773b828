//! Core domain types: `Posting`, `Transaction`, and `Price` (spec.md §3).
//!
//! Plain `Decimal`-typed fields, following the shape of
//! `afadil-wealthfolio`'s `net_worth_model` rather than the teacher's
//! primitive-newtype-per-field convention (`data::domain::Price(f64)`): the
//! teacher's newtypes exist to keep `f64` quantities from being mixed across
//! incompatible units (price vs. tick vs. quantity) in a trading context,
//! which doesn't carry over here — every monetary field is already the same
//! exact type, `Decimal`, and the spec calls the units out by field name.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Status of a single posting within its transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PostingStatus {
    Unmarked,
    Pending,
    Cleared,
}

/// A colon-separated account path, e.g. `Assets:Equity:NIFTY`.
///
/// Stored as the raw string; glob/prefix matching (`crate::query::glob`)
/// operates on the colon-delimited segments directly rather than through a
/// parsed representation, matching the spec's description of accounts as
/// plain paths rather than a typed hierarchy.
pub type AccountPath = String;

/// The atomic unit of the ledger: one line of a double-entry transaction
/// (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    pub transaction_id: i64,
    pub date: NaiveDate,
    pub payee: String,
    pub account: AccountPath,
    pub commodity: String,
    /// Signed decimal of units. Zero iff `commodity` is the default currency.
    pub quantity: Decimal,
    /// Signed decimal in the default currency: the booked cost.
    pub amount: Decimal,
    pub status: PostingStatus,
    pub transaction_begin_line: u32,
    pub end_line: u32,
    pub file_name: String,
    pub forecast: bool,
    pub tag_recurring: Option<String>,
    /// Index of this posting within its transaction's posting list, used to
    /// break order ties alongside `transaction_id` (spec.md §4.1).
    pub posting_index: u32,
}

impl Posting {
    /// True when this posting is denominated in `default_currency`.
    pub fn is_currency(&self, default_currency: &str) -> bool {
        self.commodity.eq_ignore_ascii_case(default_currency)
    }

    /// The implied per-unit price at booking: `amount / quantity`. Only
    /// meaningful for non-currency postings (spec.md §3 invariant).
    pub fn booked_unit_price(&self) -> Option<Decimal> {
        if self.quantity.is_zero() {
            None
        } else {
            Some(self.amount / self.quantity)
        }
    }

    /// The nearest ancestor prefix of `account` at a colon boundary, or
    /// `None` for a top-level account. Used by classification and the
    /// budget engine's "most specific ancestor" attribution.
    pub fn account_parent(&self) -> Option<&str> {
        self.account.rfind(':').map(|idx| &self.account[..idx])
    }
}

/// A derived record grouping postings that share a `transaction_id`,
/// preserving first-encountered order of its postings (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Transaction {
    pub transaction_id: i64,
    pub date: NaiveDate,
    pub postings: Vec<Posting>,
}

impl Transaction {
    pub fn sum_amount(&self) -> Decimal {
        self.postings.iter().map(|p| p.amount).sum()
    }

    /// True iff this transaction's postings sum to zero, the core
    /// double-entry invariant (spec.md §3, §8).
    pub fn is_balanced(&self) -> bool {
        self.sum_amount().is_zero()
    }
}

/// Groups a flat, canonically ordered posting slice into transactions,
/// preserving first-encountered posting order within each.
pub fn group_into_transactions(postings: &[Posting]) -> Vec<Transaction> {
    let mut order: Vec<i64> = Vec::new();
    let mut by_id: std::collections::HashMap<i64, Transaction> = std::collections::HashMap::new();

    for posting in postings {
        let entry = by_id.entry(posting.transaction_id).or_insert_with(|| {
            order.push(posting.transaction_id);
            Transaction {
                transaction_id: posting.transaction_id,
                date: posting.date,
                postings: Vec::new(),
            }
        });
        entry.postings.push(posting.clone());
    }

    order
        .into_iter()
        .map(|id| by_id.remove(&id).expect("id was just inserted"))
        .collect()
}

/// `(commodity_type, commodity_id, commodity_name, date, value)` — one
/// recorded unit price (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    pub commodity_type: CommodityType,
    pub commodity_id: i64,
    pub commodity_name: String,
    pub date: NaiveDate,
    pub value: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommodityType {
    Currency,
    Stock,
    MutualFund,
    Nps,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn posting(transaction_id: i64, account: &str, amount: Decimal) -> Posting {
        Posting {
            transaction_id,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            payee: "payee".into(),
            account: account.into(),
            commodity: "INR".into(),
            quantity: Decimal::ZERO,
            amount,
            status: PostingStatus::Cleared,
            transaction_begin_line: 1,
            end_line: 2,
            file_name: "journal.ledger".into(),
            forecast: false,
            tag_recurring: None,
            posting_index: 0,
        }
    }

    #[test]
    fn transaction_balances_to_zero() {
        let tx = Transaction {
            transaction_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            postings: vec![
                posting(1, "Assets:Checking", dec!(-100)),
                posting(1, "Expenses:Food", dec!(100)),
            ],
        };
        assert!(tx.is_balanced());
    }

    #[test]
    fn account_parent_strips_last_segment() {
        let p = posting(1, "Assets:Equity:NIFTY", dec!(0));
        assert_eq!(p.account_parent(), Some("Assets:Equity"));
        let root = posting(1, "Assets", dec!(0));
        assert_eq!(root.account_parent(), None);
    }

    #[test]
    fn group_into_transactions_preserves_first_encounter_order() {
        let postings = vec![
            posting(2, "Assets:Checking", dec!(-50)),
            posting(1, "Assets:Checking", dec!(-100)),
            posting(2, "Expenses:Food", dec!(50)),
            posting(1, "Expenses:Food", dec!(100)),
        ];
        let txs = group_into_transactions(&postings);
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].transaction_id, 2);
        assert_eq!(txs[1].transaction_id, 1);
        assert!(txs.iter().all(Transaction::is_balanced));
    }
}
