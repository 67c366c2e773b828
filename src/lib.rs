// === Public modules ===
pub mod accumulate;
pub mod budget;
pub mod caldate;
pub mod classify;
pub mod config;
pub mod decimal;
pub mod domain;
pub mod error;
pub mod goals;
pub mod http;
pub mod provider;
pub mod query;
pub mod sheet;
pub mod store;
pub mod tokenizer;
pub mod valuation;
pub mod xirr;

// === Private implementation details ===
mod sorted_index;

// === Facades ===
pub use error::{LedgerscopeError, LedgerscopeResult};
