//! DDL for the embedded SQLite store (spec.md §6's persisted schemas).

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id          INTEGER PRIMARY KEY,
    date        TEXT NOT NULL,
    payee       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS postings (
    transaction_id          INTEGER NOT NULL,
    posting_index           INTEGER NOT NULL,
    date                    TEXT NOT NULL,
    payee                   TEXT NOT NULL,
    account                 TEXT NOT NULL,
    commodity               TEXT NOT NULL,
    quantity                TEXT NOT NULL,
    amount                  TEXT NOT NULL,
    status                  TEXT NOT NULL,
    transaction_begin_line  INTEGER NOT NULL,
    end_line                INTEGER NOT NULL,
    file_name               TEXT NOT NULL,
    forecast                INTEGER NOT NULL,
    tag_recurring           TEXT,
    PRIMARY KEY (transaction_id, posting_index),
    FOREIGN KEY (transaction_id) REFERENCES transactions(id)
);

CREATE INDEX IF NOT EXISTS idx_postings_account ON postings(account);
CREATE INDEX IF NOT EXISTS idx_postings_date ON postings(date);

CREATE TABLE IF NOT EXISTS prices (
    commodity_type   TEXT NOT NULL,
    commodity_id     INTEGER NOT NULL,
    commodity_name   TEXT NOT NULL,
    date             TEXT NOT NULL,
    value            TEXT NOT NULL,
    PRIMARY KEY (commodity_id, date)
);

CREATE INDEX IF NOT EXISTS idx_prices_commodity_date ON prices(commodity_id, date);
"#;
