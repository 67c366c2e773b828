//! Asset breakdown, rollup and leaf-only (spec.md §4.4.3).

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::classify;
use crate::config::Config;
use crate::decimal::safe_ratio;
use crate::domain::Posting;
use crate::query::glob::is_prefix;
use crate::store::price_store::PriceIndex;
use crate::valuation::market_value;
use crate::xirr::{self, CashFlow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownMode {
    Rollup,
    LeafOnly,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BreakdownRecord {
    pub account: String,
    pub investment_amount: Decimal,
    pub withdrawal_amount: Decimal,
    pub market_amount: Decimal,
    pub balance_units: Decimal,
    pub xirr: Decimal,
    pub gain_amount: Decimal,
    pub absolute_return: Decimal,
}

/// `effective_account` re-parents capital-gains postings to the asset
/// account whose sale they realize, so the gain and the original holding
/// are attributed to the same subtree (spec.md §4.4.3).
fn effective_account(config: &Config, p: &Posting) -> String {
    classify::capital_gains_source_account(config, p).unwrap_or_else(|| p.account.clone())
}

pub fn compute(
    postings: &[&Posting],
    prices: &PriceIndex,
    config: &Config,
    today: NaiveDate,
    mode: BreakdownMode,
) -> Vec<BreakdownRecord> {
    let effective: Vec<(String, &Posting)> = postings
        .iter()
        .map(|p| (effective_account(config, p), *p))
        .collect();

    let mut groups: BTreeSet<String> = effective.iter().map(|(acct, _)| acct.clone()).collect();
    if mode == BreakdownMode::Rollup {
        let leaves: Vec<String> = groups.iter().cloned().collect();
        for leaf in leaves {
            let mut current = leaf.as_str();
            while let Some(parent) = current.rfind(':').map(|idx| &current[..idx]) {
                groups.insert(parent.to_string());
                current = parent;
            }
        }
    }

    let mut out = Vec::with_capacity(groups.len());
    for account in groups {
        let members: Vec<&Posting> = match mode {
            BreakdownMode::LeafOnly => effective
                .iter()
                .filter(|(acct, _)| acct == &account)
                .map(|(_, p)| *p)
                .collect(),
            BreakdownMode::Rollup => effective
                .iter()
                .filter(|(acct, _)| is_prefix(acct, &account))
                .map(|(_, p)| *p)
                .collect(),
        };
        out.push(record_for(&account, &members, prices, config, today, mode));
    }

    out.sort_by(|a, b| a.account.cmp(&b.account));
    out
}

fn record_for(
    account: &str,
    members: &[&Posting],
    prices: &PriceIndex,
    config: &Config,
    today: NaiveDate,
    mode: BreakdownMode,
) -> BreakdownRecord {
    let investment_amount: Decimal = members
        .iter()
        .filter(|p| {
            p.amount > Decimal::ZERO
                && !classify::is_interest(config, p)
                && !classify::is_capital_gains(p)
                && !classify::is_checking_account(p)
        })
        .map(|p| p.amount)
        .sum();

    let withdrawal_amount: Decimal = members
        .iter()
        .filter(|p| {
            classify::is_capital_gains(p)
                || (p.amount < Decimal::ZERO
                    && !classify::is_checking_account(p)
                    && !classify::is_interest(config, p))
        })
        .map(|p| -p.amount)
        .sum();

    let marked = |p: &&Posting| !classify::is_capital_gains(p);
    let is_currency_group = members.iter().filter(|p| marked(p)).all(|p| p.is_currency(&config.default_currency));
    let net_quantity: Decimal = members.iter().filter(|p| marked(p)).map(|p| p.quantity).sum();
    let has_price = members.iter().filter(|p| marked(p)).any(|p| prices.is_valued(&p.commodity));

    // A fully closed, unpriced position has nothing left to mark: summing
    // each leg's booked cost (the only fallback without a price) would
    // reflect realized cash flow, not a holding's value.
    let market_amount: Decimal = if !is_currency_group && net_quantity.is_zero() && !has_price {
        Decimal::ZERO
    } else {
        members
            .iter()
            .filter(|p| marked(p))
            .map(|p| market_value(prices, p, &config.default_currency, today))
            .sum()
    };

    let balance_units = if mode == BreakdownMode::LeafOnly {
        members
            .iter()
            .filter(|p| !p.is_currency(&config.default_currency))
            .map(|p| p.quantity)
            .sum()
    } else {
        Decimal::ZERO
    };

    let mut flows: Vec<CashFlow> = members
        .iter()
        .filter(|p| !classify::is_capital_gains(p))
        .map(|p| CashFlow {
            date: p.date,
            amount: p.amount,
        })
        .collect();
    if !market_amount.is_zero() {
        flows.push(CashFlow {
            date: today,
            amount: market_amount,
        });
    }
    let xirr = xirr::xirr(&flows);

    let gain_amount = market_amount - (investment_amount - withdrawal_amount);
    let absolute_return = safe_ratio(gain_amount, investment_amount);

    BreakdownRecord {
        account: account.to_string(),
        investment_amount,
        withdrawal_amount,
        market_amount,
        balance_units,
        xirr,
        gain_amount,
        absolute_return,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostingStatus;
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
  rollover: false
"#,
        )
        .unwrap()
    }

    fn posting(tx: i64, date: NaiveDate, account: &str, commodity: &str, quantity: Decimal, amount: Decimal) -> Posting {
        Posting {
            transaction_id: tx,
            date,
            payee: "broker".into(),
            account: account.into(),
            commodity: commodity.into(),
            quantity,
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
    fn single_buy_sell_breakdown_matches_scenario() {
        let cfg = config();
        let buy = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let sell = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let postings = vec![
            posting(1, buy, "Assets:Equity:NIFTY", "NIFTY", dec!(10), dec!(1000)),
            posting(2, sell, "Assets:Equity:NIFTY", "NIFTY", dec!(-10), dec!(-1500)),
        ];
        let refs: Vec<&Posting> = postings.iter().collect();
        let prices = PriceIndex::default();

        let records = compute(&refs, &prices, &cfg, sell, BreakdownMode::LeafOnly);
        let nifty = records.iter().find(|r| r.account == "Assets:Equity:NIFTY").unwrap();
        assert_eq!(nifty.investment_amount, dec!(1000));
        assert_eq!(nifty.withdrawal_amount, dec!(1500));
        assert_eq!(nifty.market_amount, dec!(0));
        assert_eq!(nifty.gain_amount, dec!(500));
        assert_eq!(nifty.absolute_return, dec!(0.5));
    }

    #[test]
    fn rollup_parent_investment_sums_children() {
        let cfg = config();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let postings = vec![
            posting(1, date, "Assets:Equity:NIFTY", "NIFTY", dec!(10), dec!(1000)),
            posting(2, date, "Assets:Equity:GOLD", "GOLD", dec!(5), dec!(500)),
        ];
        let refs: Vec<&Posting> = postings.iter().collect();
        let prices = PriceIndex::default();

        let records = compute(&refs, &prices, &cfg, date, BreakdownMode::Rollup);
        let equity = records.iter().find(|r| r.account == "Assets:Equity").unwrap();
        assert_eq!(equity.investment_amount, dec!(1500));
    }

    #[test]
    fn capital_gains_posting_attributes_withdrawal_to_source_account() {
        let cfg = config();
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let postings = vec![
            posting(1, date, "Assets:Equity:NIFTY", "NIFTY", dec!(10), dec!(1000)),
            posting(2, date, "Income:CapitalGains:Equity:NIFTY", "INR", Decimal::ZERO, dec!(-500)),
        ];
        let refs: Vec<&Posting> = postings.iter().collect();
        let prices = PriceIndex::default();

        let records = compute(&refs, &prices, &cfg, date, BreakdownMode::LeafOnly);
        let nifty = records.iter().find(|r| r.account == "Assets:Equity:NIFTY").unwrap();
        assert_eq!(nifty.withdrawal_amount, dec!(500));
    }
}
