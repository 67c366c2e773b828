//! Persists `(commodity_id, date) -> unit_price` and serves the
//! descending-less-or-equal lookup spec.md §3 demands, backed in memory by
//! [`SortedIndex`] per commodity for sub-linear reads (spec.md §9).

use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

use crate::domain::{CommodityType, Price};
use crate::error::{LedgerscopeResult, StoreError};
use crate::sorted_index::SortedIndex;

#[derive(Debug, Clone, Default)]
pub struct PriceIndex {
    by_commodity_name: HashMap<String, SortedIndex<NaiveDate, Decimal>>,
}

impl PriceIndex {
    pub fn from_prices(prices: &[Price]) -> Self {
        let mut by_commodity_name: HashMap<String, SortedIndex<NaiveDate, Decimal>> =
            HashMap::new();
        for price in prices {
            by_commodity_name
                .entry(price.commodity_name.clone())
                .or_default()
                .insert(price.date, price.value);
        }
        Self { by_commodity_name }
    }

    /// The latest known unit price of `commodity` at or before `date`
    /// (spec.md §3: "the `value` of the greatest record with `date <= t`").
    pub fn price_at(&self, commodity: &str, date: NaiveDate) -> Option<Decimal> {
        self.by_commodity_name.get(commodity)?.floor(&date).copied()
    }

    pub fn is_valued(&self, commodity: &str) -> bool {
        self.by_commodity_name
            .get(commodity)
            .is_some_and(|idx| !idx.is_empty())
    }
}

pub fn replace_all(conn: &Connection, prices: &[Price]) -> LedgerscopeResult<()> {
    conn.execute("DELETE FROM prices", []).map_err(StoreError::Db)?;
    for price in prices {
        conn.execute(
            "INSERT INTO prices (commodity_type, commodity_id, commodity_name, date, value)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                price.commodity_type.to_string(),
                price.commodity_id,
                price.commodity_name,
                price.date.to_string(),
                price.value.to_string(),
            ],
        )
        .map_err(StoreError::Db)?;
    }
    Ok(())
}

pub fn load_all(conn: &Connection) -> LedgerscopeResult<Vec<Price>> {
    let mut stmt = conn
        .prepare("SELECT commodity_type, commodity_id, commodity_name, date, value FROM prices")
        .map_err(StoreError::Db)?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .map_err(StoreError::Db)?;

    let mut prices = Vec::new();
    for row in rows {
        let (commodity_type, commodity_id, commodity_name, date_str, value_str) =
            row.map_err(StoreError::Db)?;
        prices.push(Price {
            commodity_type: CommodityType::from_str(&commodity_type).map_err(|_| {
                StoreError::Corruption("prices.commodity_type".into(), commodity_type.clone())
            })?,
            commodity_id,
            commodity_name,
            date: NaiveDate::from_str(&date_str)
                .map_err(|e| StoreError::Corruption("prices.date".into(), e.to_string()))?,
            value: value_str
                .parse()
                .map_err(|_| StoreError::Corruption("prices.value".into(), value_str.clone()))?,
        });
    }

    Ok(prices)
}
