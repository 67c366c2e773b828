//! Single-writer/multi-reader snapshot store (spec.md §5, §9).
//!
//! Reload is atomic from a reader's perspective: a fresh [`Snapshot`] is
//! built entirely off to the side, persisted to SQLite inside one
//! transaction, and only then swapped into the `RwLock` other threads read
//! through. No reader ever observes a partially rebuilt snapshot, mirroring
//! the teacher's `MarketDataCache`'s "build new, then swap the `Arc`"
//! pattern in `data::cache`.

pub mod posting_store;
pub mod price_store;
pub mod schema;

use std::path::Path;
use std::sync::{Arc, RwLock};

use rusqlite::Connection;

use crate::domain::{Posting, Price};
use crate::error::{LedgerscopeResult, StoreError};
use price_store::PriceIndex;

/// The in-memory view readers (queries, accumulators, the sheet language)
/// operate against. Immutable once built; a reload builds a new one.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub postings: Vec<Posting>,
    pub prices: PriceIndex,
}

/// Owns the SQLite connection and the current [`Snapshot`].
///
/// `Store` itself is `Send + Sync`: `Connection` is wrapped in its own lock
/// because rusqlite's `Connection` is `!Sync`, while the snapshot readers
/// take only a shared lock and never block on the writer half except during
/// the brief swap.
pub struct Store {
    conn: std::sync::Mutex<Connection>,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl Store {
    /// Opens (creating if absent) the SQLite database at `path` and loads
    /// whatever snapshot it currently holds, which may be empty on first run.
    pub fn open(path: impl AsRef<Path>) -> LedgerscopeResult<Self> {
        let conn = Connection::open(path).map_err(StoreError::Db)?;
        conn.execute_batch(schema::SCHEMA).map_err(StoreError::Db)?;

        let postings = posting_store::load_all(&conn)?;
        let prices = price_store::load_all(&conn)?;
        let snapshot = Snapshot {
            postings,
            prices: PriceIndex::from_prices(&prices),
        };

        Ok(Self {
            conn: std::sync::Mutex::new(conn),
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> LedgerscopeResult<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::Db)?;
        conn.execute_batch(schema::SCHEMA).map_err(StoreError::Db)?;
        Ok(Self {
            conn: std::sync::Mutex::new(conn),
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
        })
    }

    /// A cheap `Arc` clone of the current snapshot. Callers hold this for
    /// the lifetime of a single query or computation rather than re-reading
    /// the lock per access, so a concurrent reload never shifts the ground
    /// under an in-flight read (spec.md §9).
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read().expect("snapshot lock poisoned"))
    }

    /// Replaces the entire posting and price set, persists it, then
    /// publishes the new snapshot atomically. Called after the external
    /// journal parser and price providers produce a fresh batch.
    pub fn reload(&self, postings: Vec<Posting>, prices: Vec<Price>) -> LedgerscopeResult<()> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        conn.execute("BEGIN", []).map_err(StoreError::Db)?;

        let result = (|| {
            posting_store::replace_all(&conn, &postings)?;
            price_store::replace_all(&conn, &prices)?;
            Ok::<(), crate::error::LedgerscopeError>(())
        })();

        match result {
            Ok(()) => conn.execute("COMMIT", []).map_err(StoreError::Db)?,
            Err(err) => {
                let _ = conn.execute("ROLLBACK", []);
                return Err(err);
            }
        };
        drop(conn);

        let snapshot = Snapshot {
            postings,
            prices: PriceIndex::from_prices(&prices),
        };
        *self.snapshot.write().expect("snapshot lock poisoned") = Arc::new(snapshot);
        Ok(())
    }
}
