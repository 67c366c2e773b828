//! Persists normalized postings keyed by `(transaction_id, posting_index)`.
//!
//! Rebuild is destructive-then-atomic from the caller's perspective: see
//! [`crate::store::Store::reload`], which wraps the delete+insert pair done
//! here in a single SQLite transaction before swapping the in-memory
//! snapshot readers observe.

use chrono::NaiveDate;
use rusqlite::{Connection, params};
use std::str::FromStr;

use crate::domain::{Posting, PostingStatus};
use crate::error::{LedgerscopeResult, StoreError};

pub fn replace_all(conn: &Connection, postings: &[Posting]) -> LedgerscopeResult<()> {
    conn.execute("DELETE FROM postings", [])
        .map_err(StoreError::Db)?;
    conn.execute("DELETE FROM transactions", [])
        .map_err(StoreError::Db)?;

    let mut seen_transactions = std::collections::HashSet::new();
    for posting in postings {
        if seen_transactions.insert(posting.transaction_id) {
            conn.execute(
                "INSERT INTO transactions (id, date, payee) VALUES (?1, ?2, ?3)",
                params![
                    posting.transaction_id,
                    posting.date.to_string(),
                    posting.payee
                ],
            )
            .map_err(StoreError::Db)?;
        }

        conn.execute(
            "INSERT INTO postings (
                transaction_id, posting_index, date, payee, account, commodity,
                quantity, amount, status, transaction_begin_line, end_line,
                file_name, forecast, tag_recurring
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                posting.transaction_id,
                posting.posting_index,
                posting.date.to_string(),
                posting.payee,
                posting.account,
                posting.commodity,
                posting.quantity.to_string(),
                posting.amount.to_string(),
                posting.status.to_string(),
                posting.transaction_begin_line,
                posting.end_line,
                posting.file_name,
                posting.forecast as i64,
                posting.tag_recurring,
            ],
        )
        .map_err(StoreError::Db)?;
    }

    Ok(())
}

/// Loads every posting, sorted ascending by date, ties broken by
/// `transaction_id` then `posting_index` — the canonical order spec.md §3
/// requires accumulators to see.
pub fn load_all(conn: &Connection) -> LedgerscopeResult<Vec<Posting>> {
    let mut stmt = conn
        .prepare(
            "SELECT transaction_id, posting_index, date, payee, account, commodity,
                    quantity, amount, status, transaction_begin_line, end_line,
                    file_name, forecast, tag_recurring
             FROM postings
             ORDER BY date ASC, transaction_id ASC, posting_index ASC",
        )
        .map_err(StoreError::Db)?;

    let rows = stmt
        .query_map([], |row| {
            let date_str: String = row.get(2)?;
            let quantity_str: String = row.get(6)?;
            let amount_str: String = row.get(7)?;
            let status_str: String = row.get(8)?;
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, u32>(1)?,
                date_str,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                quantity_str,
                amount_str,
                status_str,
                row.get::<_, u32>(9)?,
                row.get::<_, u32>(10)?,
                row.get::<_, String>(11)?,
                row.get::<_, i64>(12)?,
                row.get::<_, Option<String>>(13)?,
            ))
        })
        .map_err(StoreError::Db)?;

    let mut postings = Vec::new();
    for row in rows {
        let (
            transaction_id,
            posting_index,
            date_str,
            payee,
            account,
            commodity,
            quantity_str,
            amount_str,
            status_str,
            transaction_begin_line,
            end_line,
            file_name,
            forecast,
            tag_recurring,
        ) = row.map_err(StoreError::Db)?;

        postings.push(Posting {
            transaction_id,
            date: NaiveDate::from_str(&date_str).map_err(|e| {
                StoreError::Corruption("postings.date".into(), e.to_string())
            })?,
            payee,
            account,
            commodity,
            quantity: quantity_str.parse().map_err(|_| {
                StoreError::Corruption("postings.quantity".into(), quantity_str.clone())
            })?,
            amount: amount_str.parse().map_err(|_| {
                StoreError::Corruption("postings.amount".into(), amount_str.clone())
            })?,
            status: PostingStatus::from_str(&status_str).map_err(|_| {
                StoreError::Corruption("postings.status".into(), status_str.clone())
            })?,
            transaction_begin_line,
            end_line,
            file_name,
            forecast: forecast != 0,
            tag_recurring,
            posting_index,
        });
    }

    Ok(postings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::SCHEMA;
    use rust_decimal_macros::dec;

    fn posting(transaction_id: i64, index: u32, account: &str, amount: rust_decimal::Decimal) -> Posting {
        Posting {
            transaction_id,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            payee: "store".into(),
            account: account.into(),
            commodity: "INR".into(),
            quantity: rust_decimal::Decimal::ZERO,
            amount,
            status: PostingStatus::Cleared,
            transaction_begin_line: 1,
            end_line: 2,
            file_name: "j.ledger".into(),
            forecast: false,
            tag_recurring: None,
            posting_index: index,
        }
    }

    #[test]
    fn round_trips_postings_in_canonical_order() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let postings = vec![
            posting(1, 0, "Assets:Checking", dec!(-100)),
            posting(1, 1, "Expenses:Food", dec!(100)),
        ];
        replace_all(&conn, &postings).unwrap();

        let loaded = load_all(&conn).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].account, "Assets:Checking");
        assert_eq!(loaded[1].amount, dec!(100));
    }

    #[test]
    fn replace_all_is_destructive() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        replace_all(&conn, &[posting(1, 0, "Assets:Checking", dec!(-1))]).unwrap();
        replace_all(&conn, &[posting(2, 0, "Assets:Savings", dec!(-2))]).unwrap();

        let loaded = load_all(&conn).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].transaction_id, 2);
    }
}
