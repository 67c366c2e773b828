//! YAML configuration (spec.md §6). Mirrors the teacher's
//! `data::config::OhlcvSpotConfig` family: plain `Deserialize` structs, one
//! doc comment per field, `Default` only where the spec names a default.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{ConfigError, LedgerscopeResult};

/// Which ledger-text dialect the external parser (spec.md §4.10) speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LedgerCli {
    Ledger,
    Hledger,
    Beancount,
}

/// Root configuration loaded once at startup. Invalid configuration is a
/// `ConfigError::Invalid` and fails startup (spec.md §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the plain-text journal file the external parser reads.
    pub journal_path: PathBuf,

    /// Path to the embedded SQLite database file backing the posting and
    /// price stores.
    pub db_path: PathBuf,

    /// Directory of `.sheet` files for the embedded expression language.
    pub sheets_directory: PathBuf,

    /// Which ledger-text dialect `journal_path` is written in.
    pub ledger_cli: LedgerCli,

    /// Reporting currency; every valuation converts into this commodity.
    pub default_currency: String,

    /// Fractional digits used when rendering monetary amounts.
    #[serde(default = "default_display_precision")]
    pub display_precision: u32,

    /// Locale tag used for number formatting (e.g. `"en_IN"`).
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Time zone all day-precision dates are interpreted in.
    pub time_zone: Tz,

    /// Month (1-12) the financial year starts in. Defaults to 4 (April).
    #[serde(default = "default_financial_year_starting_month")]
    pub financial_year_starting_month: u32,

    /// Day the week starts on, per `chrono::Weekday` naming.
    #[serde(default = "default_week_starting_day")]
    pub week_starting_day: chrono::Weekday,

    /// When true, unknown accounts/commodities encountered during journal
    /// reload are treated as `JournalError` instead of silently accepted.
    #[serde(default)]
    pub strict: bool,

    pub budget: BudgetConfig,

    #[serde(default)]
    pub goals: GoalsConfig,

    /// Recurring transaction templates used to synthesize forecast postings.
    #[serde(default)]
    pub schedule_al: Vec<ScheduledTransaction>,

    #[serde(default)]
    pub allocation_targets: Vec<AllocationTarget>,

    #[serde(default)]
    pub commodities: Vec<CommodityConfig>,

    #[serde(default)]
    pub accounts: Vec<String>,

    /// Accounts treated as the user's own checking/equity accounts rather
    /// than placeholder/structural accounts.
    #[serde(default)]
    pub user_accounts: Vec<String>,

    #[serde(default)]
    pub credit_cards: Vec<String>,

    #[serde(default)]
    pub import_templates: Vec<ImportTemplate>,

    /// Explicit source-account overrides for capital-gains attribution,
    /// surfaced instead of guessing when a user's taxonomy doesn't mirror the
    /// "strip the prefix" rule (spec.md §9 open question).
    #[serde(default)]
    pub capital_gains_source_overrides: HashMap<String, String>,
}

fn default_display_precision() -> u32 {
    2
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_financial_year_starting_month() -> u32 {
    4
}

fn default_week_starting_day() -> chrono::Weekday {
    chrono::Weekday::Mon
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default)]
    pub rollover: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalsConfig {
    #[serde(default)]
    pub retirement: Vec<RetirementGoalConfig>,
    #[serde(default)]
    pub savings: Vec<SavingsGoalConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementGoalConfig {
    pub name: String,
    /// Safe withdrawal rate, as a percent (e.g. `4.0` for 4%).
    pub swr: Decimal,
    /// Accounts whose balances count toward the retirement corpus.
    pub savings_accounts: Vec<String>,
    /// Accounts whose postings count as the yearly living expense.
    pub expense_accounts: Vec<String>,
    /// Overrides the computed mean yearly expense when set.
    pub yearly_expenses_override: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoalConfig {
    pub name: String,
    pub target_amount: Decimal,
    /// Annual compounding rate, as a fraction (e.g. `0.08` for 8%).
    pub annual_rate: Decimal,
    pub accounts: Vec<String>,
    pub target_date: Option<chrono::NaiveDate>,
    pub payment_per_period: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTransaction {
    pub name: String,
    pub account: String,
    pub amount: Decimal,
    /// Cron-like day-of-month the forecast posting recurs on.
    pub day_of_month: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationTarget {
    pub account: String,
    /// Target allocation, as a percent of net worth (0-100).
    pub target_percent: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommodityConfig {
    pub name: String,
    pub kind: CommodityKind,
    /// ISIN, ticker, or fund code used to query price providers.
    pub code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommodityKind {
    Currency,
    Stock,
    MutualFund,
    Nps,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportTemplate {
    pub name: String,
    pub source: String,
    pub account_mapping: HashMap<String, String>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> LedgerscopeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LedgerscopeResult<()> {
        if self.default_currency.trim().is_empty() {
            return Err(ConfigError::Invalid("default_currency must not be empty".into()).into());
        }
        if !(1..=12).contains(&self.financial_year_starting_month) {
            return Err(ConfigError::Invalid(
                "financial_year_starting_month must be between 1 and 12".into(),
            )
            .into());
        }
        for goal in &self.goals.savings {
            if goal.target_date.is_none() && goal.payment_per_period.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "savings goal '{}' must set either target_date or payment_per_period",
                    goal.name
                ))
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r#"
journal_path: /tmp/journal.ledger
db_path: /tmp/ledger.db
sheets_directory: /tmp/sheets
ledger_cli: ledger
default_currency: INR
time_zone: Asia/Kolkata
budget:
  rollover: true
"#
    }

    #[test]
    fn parses_minimal_config_with_defaults() {
        let cfg: Config = serde_yaml::from_str(minimal_yaml()).unwrap();
        assert_eq!(cfg.display_precision, 2);
        assert_eq!(cfg.financial_year_starting_month, 4);
        assert!(cfg.budget.rollover);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_empty_default_currency() {
        let mut cfg: Config = serde_yaml::from_str(minimal_yaml()).unwrap();
        cfg.default_currency = "  ".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_savings_goal_without_date_or_payment() {
        let mut cfg: Config = serde_yaml::from_str(minimal_yaml()).unwrap();
        cfg.goals.savings.push(SavingsGoalConfig {
            name: "house".into(),
            target_amount: Decimal::new(1_000_000, 0),
            annual_rate: Decimal::new(8, 2),
            accounts: vec!["Assets:Savings".into()],
            target_date: None,
            payment_per_period: None,
        });
        assert!(cfg.validate().is_err());
    }
}
