//! Classification predicates (spec.md §4.2). Pure functions over a single
//! posting plus the surrounding transaction where a decision needs siblings
//! (stock-split detection), consulting only `Config`'s account taxonomy.
//!
//! Grounded on the teacher's `enums::trade_and_pre_trade_values` family of
//! small, free-standing classifier functions in `src/enums/`: no trait
//! object, just plain `fn(&Posting) -> bool`.

use rust_decimal::Decimal;

use crate::config::Config;
use crate::domain::{Posting, Transaction};
use crate::query::glob::is_prefix;

const CAPITAL_GAINS_PREFIX: &str = "Income:CapitalGains";
const CHECKING_PREFIX: &str = "Assets:Checking";

/// True when `p`'s account is a configured interest-accrual leaf, i.e. falls
/// under `Income:Interest:*`.
pub fn is_interest(_config: &Config, p: &Posting) -> bool {
    is_prefix(&p.account, "Income:Interest")
}

/// A transaction is a stock split when every posting shares one commodity,
/// at least one posting has a nonzero quantity delta, and amounts net to
/// zero — no cash moved, only units changed (spec.md §4.2, §9 open question:
/// this heuristic can misclassify unusual corporate actions).
pub fn is_stock_split(tx: &Transaction) -> bool {
    if tx.postings.is_empty() {
        return false;
    }
    let commodity = &tx.postings[0].commodity;
    let same_commodity = tx.postings.iter().all(|p| &p.commodity == commodity);
    let any_quantity_change = tx.postings.iter().any(|p| !p.quantity.is_zero());
    same_commodity && any_quantity_change && tx.sum_amount().is_zero()
}

pub fn is_capital_gains(p: &Posting) -> bool {
    is_prefix(&p.account, CAPITAL_GAINS_PREFIX)
}

/// Recovers the asset account a capital-gains posting's gain belongs to, by
/// stripping the `Income:CapitalGains:` prefix (spec.md §4.2, §9: a config
/// override takes precedence when the user's taxonomy doesn't mirror the
/// asset path directly).
pub fn capital_gains_source_account(config: &Config, p: &Posting) -> Option<String> {
    if !is_capital_gains(p) {
        return None;
    }
    if let Some(overridden) = config.capital_gains_source_overrides.get(&p.account) {
        return Some(overridden.clone());
    }
    p.account
        .strip_prefix(&format!("{CAPITAL_GAINS_PREFIX}:"))
        .map(|suffix| format!("Assets:{suffix}"))
}

pub fn is_checking_account(p: &Posting) -> bool {
    is_prefix(&p.account, CHECKING_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn config() -> Config {
        serde_yaml::from_str(
            r#"
journal_path: /tmp/j.ledger
db_path: /tmp/l.db
sheets_directory: /tmp/sheets
ledger_cli: ledger
default_currency: INR
time_zone: Asia/Kolkata
budget:
  rollover: true
"#,
        )
        .unwrap()
    }

    fn posting(transaction_id: i64, account: &str, commodity: &str, quantity: Decimal, amount: Decimal) -> Posting {
        Posting {
            transaction_id,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            payee: "payee".into(),
            account: account.into(),
            commodity: commodity.into(),
            quantity,
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
    fn capital_gains_source_strips_prefix_by_default() {
        let cfg = config();
        let p = posting(2, "Income:CapitalGains:Equity:NIFTY", "INR", Decimal::ZERO, dec!(-500));
        assert_eq!(
            capital_gains_source_account(&cfg, &p),
            Some("Assets:Equity:NIFTY".to_string())
        );
    }

    #[test]
    fn capital_gains_source_honors_override() {
        let mut cfg = config();
        cfg.capital_gains_source_overrides.insert(
            "Income:CapitalGains:Retirement".to_string(),
            "Assets:NPS:Tier1".to_string(),
        );
        let p = posting(2, "Income:CapitalGains:Retirement", "INR", Decimal::ZERO, dec!(-100));
        assert_eq!(
            capital_gains_source_account(&cfg, &p),
            Some("Assets:NPS:Tier1".to_string())
        );
    }

    #[test]
    fn stock_split_detected_on_net_zero_quantity_change() {
        let tx = Transaction {
            transaction_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            postings: vec![posting(1, "Assets:Equity:NIFTY", "NIFTY", dec!(10), dec!(0))],
        };
        assert!(is_stock_split(&tx));
    }

    #[test]
    fn checking_account_prefix() {
        let p = posting(1, "Assets:Checking:Joint", "INR", Decimal::ZERO, dec!(0));
        assert!(is_checking_account(&p));
    }
}
