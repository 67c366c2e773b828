//! Market valuation of a posting at a date (spec.md §4.3).

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::Posting;
use crate::store::price_store::PriceIndex;

/// The market value of `posting` as of `at`, in the default currency.
///
/// Falls back to the booked cost (`posting.amount`) whenever no price
/// record covers `at` — an unvalued commodity is still worth its booked
/// amount, it just can't be marked to market (spec.md §4.3).
pub fn market_value(prices: &PriceIndex, posting: &Posting, default_currency: &str, at: NaiveDate) -> Decimal {
    if posting.is_currency(default_currency) {
        return posting.amount;
    }
    match prices.price_at(&posting.commodity, at) {
        Some(unit_price) => posting.quantity * unit_price,
        None => posting.amount,
    }
}

/// Like [`market_value`] but for a security priced in a foreign currency
/// (e.g. AAPL in USD inside an INR journal): the foreign unit price is first
/// converted through the latest `{foreign}{default}=X` exchange rate at or
/// before `at`, then multiplied by quantity (spec.md §4.3).
pub fn market_value_cross_currency(
    prices: &PriceIndex,
    posting: &Posting,
    default_currency: &str,
    foreign_currency: &str,
    at: NaiveDate,
) -> Decimal {
    if posting.is_currency(default_currency) {
        return posting.amount;
    }
    let unit_price = match prices.price_at(&posting.commodity, at) {
        Some(p) => p,
        None => return posting.amount,
    };
    let pair = format!("{foreign_currency}{default_currency}");
    match prices.price_at(&pair, at) {
        Some(rate) => posting.quantity * unit_price * rate,
        None => posting.amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommodityType, Price, PostingStatus};
    use rust_decimal_macros::dec;

    fn posting(commodity: &str, quantity: Decimal, amount: Decimal) -> Posting {
        Posting {
            transaction_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            payee: "payee".into(),
            account: "Assets:Equity:NIFTY".into(),
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
    fn currency_posting_values_at_booked_amount() {
        let prices = PriceIndex::default();
        let p = posting("INR", Decimal::ZERO, dec!(-1000));
        assert_eq!(market_value(&prices, &p, "INR", p.date), dec!(-1000));
    }

    #[test]
    fn unvalued_commodity_falls_back_to_booked_cost() {
        let prices = PriceIndex::default();
        let p = posting("NIFTY", dec!(10), dec!(1000));
        assert_eq!(market_value(&prices, &p, "INR", p.date), dec!(1000));
    }

    #[test]
    fn valued_commodity_marks_to_market() {
        let prices = PriceIndex::from_prices(&[Price {
            commodity_type: CommodityType::Stock,
            commodity_id: 1,
            commodity_name: "NIFTY".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            value: dec!(150),
        }]);
        let p = posting("NIFTY", dec!(10), dec!(1000));
        assert_eq!(
            market_value(&prices, &p, "INR", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
            dec!(1500)
        );
    }

    #[test]
    fn cross_currency_converts_through_exchange_rate() {
        let prices = PriceIndex::from_prices(&[
            Price {
                commodity_type: CommodityType::Stock,
                commodity_id: 1,
                commodity_name: "AAPL".into(),
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                value: dec!(200),
            },
            Price {
                commodity_type: CommodityType::Currency,
                commodity_id: 2,
                commodity_name: "USDINR".into(),
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                value: dec!(84),
            },
        ]);
        let p = posting("AAPL", dec!(1), dec!(14940));
        let value = market_value_cross_currency(
            &prices,
            &p,
            "INR",
            "USD",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        );
        assert_eq!(value, dec!(16800));
    }
}
