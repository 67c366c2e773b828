use thiserror::Error;

pub type LedgerscopeResult<T> = Result<T, LedgerscopeError>;

/// Top-level error type returned across the crate's public API.
///
/// Mirrors the error kinds catalogued in the design's error-handling policy:
/// structural errors (config, DB corruption) are surfaced as-is; recoverable,
/// observational errors (a single price provider down) are logged by the
/// caller and do not reach this type.
#[derive(Debug, Error)]
pub enum LedgerscopeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Price(#[from] PriceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    System(#[from] SystemError),
}

/// Errors that prevent startup: an invalid or incomplete config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors surfaced to the editor's per-line linter when the journal fails to parse.
///
/// The ledger-text parser itself is an external collaborator (spec.md §6); this
/// variant exists so the store can propagate a parse failure it receives from
/// that collaborator without losing line provenance.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("{file}:{line}: {message}")]
    Parse {
        file: String,
        line: u32,
        message: String,
    },

    #[error("transaction at {file}:{line} does not balance to zero (off by {imbalance})")]
    Unbalanced {
        file: String,
        line: u32,
        imbalance: rust_decimal::Decimal,
    },
}

/// Errors from price-provider fetches. Logged and treated as recoverable by
/// the refresh loop: a failed provider leaves prior prices in place.
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("price provider '{provider}' timed out fetching '{commodity}'")]
    Timeout { provider: String, commodity: String },

    #[error("price provider '{provider}' failed for '{commodity}': {message}")]
    ProviderFailure {
        provider: String,
        commodity: String,
        message: String,
    },

    #[error("no price provider registered for commodity '{0}'")]
    NoProvider(String),
}

/// Errors from the embedded store: corruption is a structural error and must
/// not be papered over with a partially computed report (spec.md §7).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("database at '{0}' appears corrupted: {1}")]
    Corruption(String, String),

    #[error("store has not been loaded from a journal yet")]
    NotLoaded,
}

/// Errors raised while evaluating a sheet line. These abort only the current
/// line; evaluation continues with an empty result on subsequent lines.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Undefined variable {0}")]
    Undefined(String),

    #[error("Call stack overflow")]
    StackOverflow,

    #[error("wrong number of arguments to '{function}': expected {expected}, got {got}")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: u32,
        column: u32,
        message: String,
    },
}

/// Invariant violations and other internal-bug conditions.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("operation timed out or was cancelled")]
    TimeoutOrCancelled,

    #[error("internal error: {0}")]
    Generic(String),
}
