//! Account path matching for `Like` clauses (spec.md §4.1).
//!
//! Patterns are compiled to `regex::Regex` once at clause-construction time
//! rather than re-parsed per posting, following the teacher's
//! `MarketSimulationDataKind` lookup tables' "compile once, match many"
//! shape in `cloud_api::market_simulation_data`.

use regex::Regex;

use crate::error::LedgerscopeError;
use crate::error::SystemError;

/// A compiled account-matching pattern.
///
/// `*` matches one colon-delimited segment; a trailing `%` (SQL-style, per
/// spec.md §4.1) matches any suffix including colons.
#[derive(Debug, Clone)]
pub struct AccountGlob {
    regex: Regex,
    source: String,
}

impl AccountGlob {
    pub fn compile(pattern: &str) -> Result<Self, LedgerscopeError> {
        let regex_source = translate(pattern);
        let regex = Regex::new(&regex_source).map_err(|e| {
            LedgerscopeError::System(SystemError::Generic(format!(
                "invalid account pattern '{pattern}': {e}"
            )))
        })?;
        Ok(Self {
            regex,
            source: pattern.to_string(),
        })
    }

    pub fn matches(&self, account: &str) -> bool {
        self.regex.is_match(account)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// `*` -> one non-colon segment, `%` -> greedy suffix, everything else is
/// escaped so a literal `Assets:Checking` still matches only itself.
fn translate(pattern: &str) -> String {
    let mut out = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str("[^:]*"),
            '%' => out.push_str(".*"),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

/// True when `account` is `prefix` itself or a colon-delimited descendant.
pub fn is_prefix(account: &str, prefix: &str) -> bool {
    account == prefix || account.starts_with(&format!("{prefix}:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_single_segment() {
        let glob = AccountGlob::compile("Assets:*:NIFTY").unwrap();
        assert!(glob.matches("Assets:Equity:NIFTY"));
        assert!(!glob.matches("Assets:Equity:Sub:NIFTY"));
    }

    #[test]
    fn percent_matches_any_suffix() {
        let glob = AccountGlob::compile("Assets:Equity%").unwrap();
        assert!(glob.matches("Assets:Equity:NIFTY:Growth"));
        assert!(!glob.matches("Assets:Cash"));
    }

    #[test]
    fn prefix_matches_self_and_descendants_only_at_colon_boundary() {
        assert!(is_prefix("Assets:Checking", "Assets:Checking"));
        assert!(is_prefix("Assets:Checking:Joint", "Assets:Checking"));
        assert!(!is_prefix("Assets:CheckingPlus", "Assets:Checking"));
    }
}
