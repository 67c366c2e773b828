//! Net-worth timeline (spec.md §4.4.1).

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::classify;
use crate::config::Config;
use crate::domain::{group_into_transactions, Posting};
use crate::store::price_store::PriceIndex;
use crate::valuation::market_value;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NetWorthRecord {
    pub date: NaiveDate,
    pub investment: Decimal,
    pub withdrawal: Decimal,
    pub balance: Decimal,
    pub net_investment: Decimal,
    pub gain: Decimal,
}

#[derive(Debug, Clone, Default)]
struct CommodityState {
    investment: Decimal,
    withdrawal: Decimal,
    balance: Decimal,
    balance_units: Decimal,
}

/// Builds the daily net-worth timeline from `postings`, which callers are
/// expected to have restricted to `Assets:*|Liabilities:*|Income:CapitalGains:*`
/// via [`crate::query::PostingQuery`] before calling.
///
/// Postings must already be in canonical order (ascending date, as
/// [`crate::query::PostingQuery::materialize`] returns them).
pub fn compute(
    postings: &[&Posting],
    prices: &PriceIndex,
    config: &Config,
    today: NaiveDate,
) -> Vec<NetWorthRecord> {
    if postings.is_empty() {
        return Vec::new();
    }

    let owned: Vec<Posting> = postings.iter().map(|p| (*p).clone()).collect();
    let transactions = group_into_transactions(&owned);
    let split_transactions: std::collections::HashSet<i64> = transactions
        .iter()
        .filter(|tx| classify::is_stock_split(tx))
        .map(|tx| tx.transaction_id)
        .collect();

    let mut by_date: HashMap<NaiveDate, Vec<&Posting>> = HashMap::new();
    for p in postings {
        by_date.entry(p.date).or_default().push(p);
    }

    let mut states: HashMap<String, CommodityState> = HashMap::new();
    let mut records = Vec::new();
    let mut cursor = postings[0].date;

    loop {
        if let Some(days_postings) = by_date.get(&cursor) {
            for posting in days_postings {
                apply_posting(&mut states, posting, split_transactions.contains(&posting.transaction_id), prices, config, cursor);
            }
        }

        let record = aggregate(&states, prices, config, cursor);
        let no_more_postings = !by_date.keys().any(|d| *d > cursor);
        let exhausted = no_more_postings && record.balance.abs() < Decimal::new(1, 2);
        records.push(record);

        if cursor >= today || exhausted {
            break;
        }
        cursor = cursor.succ_opt().expect("calendar date always has a successor");
    }

    records
}

fn apply_posting(
    states: &mut HashMap<String, CommodityState>,
    posting: &Posting,
    is_split: bool,
    prices: &PriceIndex,
    config: &Config,
    date: NaiveDate,
) {
    let state = states.entry(posting.commodity.clone()).or_default();
    let value = market_value(prices, posting, &config.default_currency, date);

    if classify::is_interest(config, posting) {
        state.balance += posting.amount;
        state.balance_units += posting.quantity;
    } else if classify::is_capital_gains(posting) {
        // no-op: capital-gains postings contribute nothing to net worth directly.
    } else if is_split {
        state.balance += value;
        state.balance_units += posting.quantity;
    } else if posting.amount > Decimal::ZERO {
        state.investment += posting.amount;
        state.balance += value;
        state.balance_units += posting.quantity;
    } else if posting.amount < Decimal::ZERO {
        state.withdrawal += -posting.amount;
        state.balance += value;
        state.balance_units += posting.quantity;
    }
}

fn aggregate(
    states: &HashMap<String, CommodityState>,
    prices: &PriceIndex,
    config: &Config,
    date: NaiveDate,
) -> NetWorthRecord {
    let mut investment = Decimal::ZERO;
    let mut withdrawal = Decimal::ZERO;
    let mut balance = Decimal::ZERO;

    for (commodity, state) in states {
        investment += state.investment;
        withdrawal += state.withdrawal;

        if commodity.eq_ignore_ascii_case(&config.default_currency) {
            balance += state.balance;
        } else {
            balance += match prices.price_at(commodity, date) {
                Some(unit_price) => unit_price * state.balance_units,
                None => state.balance,
            };
        }
    }

    NetWorthRecord {
        date,
        investment,
        withdrawal,
        balance,
        net_investment: investment - withdrawal,
        gain: balance + withdrawal - investment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommodityType, Price, PostingStatus};
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

    fn posting(tx: i64, idx: u32, date: NaiveDate, account: &str, commodity: &str, quantity: Decimal, amount: Decimal) -> Posting {
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
            posting_index: idx,
        }
    }

    #[test]
    fn single_buy_sell_produces_expected_gain() {
        let cfg = config();
        let buy_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let sell_date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let postings = vec![
            posting(1, 0, buy_date, "Assets:Equity:NIFTY", "NIFTY", dec!(10), dec!(1000)),
            posting(2, 0, sell_date, "Assets:Equity:NIFTY", "NIFTY", dec!(-10), dec!(-1500)),
        ];
        let refs: Vec<&Posting> = postings.iter().collect();

        let prices = PriceIndex::from_prices(&[Price {
            commodity_type: CommodityType::Stock,
            commodity_id: 1,
            commodity_name: "NIFTY".into(),
            date: buy_date,
            value: dec!(100),
        }]);

        let records = compute(&refs, &prices, &cfg, sell_date);
        let last = records.last().unwrap();
        assert_eq!(last.investment, dec!(1000));
        assert_eq!(last.withdrawal, dec!(1500));
        assert_eq!(last.net_investment, dec!(-500));
    }

    #[test]
    fn two_for_one_split_doubles_units_without_moving_cash_flows() {
        let cfg = config();
        let buy_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let split_date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let postings = vec![
            posting(1, 0, buy_date, "Assets:Equity:NIFTY", "NIFTY", dec!(10), dec!(1000)),
            posting(2, 0, split_date, "Assets:Equity:NIFTY", "NIFTY", dec!(10), dec!(0)),
            posting(2, 1, split_date, "Assets:Equity:NIFTY:SplitClearing", "NIFTY", dec!(0), dec!(0)),
        ];
        let refs: Vec<&Posting> = postings.iter().collect();

        let prices = PriceIndex::from_prices(&[
            Price {
                commodity_type: CommodityType::Stock,
                commodity_id: 1,
                commodity_name: "NIFTY".into(),
                date: buy_date,
                value: dec!(100),
            },
            Price {
                commodity_type: CommodityType::Stock,
                commodity_id: 1,
                commodity_name: "NIFTY".into(),
                date: split_date,
                value: dec!(50),
            },
        ]);

        let records = compute(&refs, &prices, &cfg, split_date);
        let last = records.last().unwrap();
        assert_eq!(last.investment, dec!(1000));
        assert_eq!(last.withdrawal, Decimal::ZERO);
        assert_eq!(last.balance, dec!(1000));
    }
}
