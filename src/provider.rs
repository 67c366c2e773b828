//! Price provider interface and refresh orchestration (spec.md §6, §5).
//!
//! The providers themselves (Yahoo, mutual-fund APIs, and so on) are external
//! collaborators, specified only by the [`PriceProvider`] trait they satisfy.
//! What lives here is the trait, the static registry providers join, and the
//! bounded-concurrency refresh loop that calls them during a price refresh.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, warn};

use crate::domain::Price;
use crate::error::PriceError;

const MAX_CONCURRENT_FETCHES: usize = 8;
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// A source of commodity prices, discovered by static registration
/// (spec.md §6). Implementors perform their own HTTP I/O; this crate only
/// calls through the trait.
#[async_trait::async_trait]
pub trait PriceProvider: Send + Sync {
    /// Short, stable identifier used in config and the journal (e.g. `"yahoo"`).
    fn code(&self) -> &str;

    /// Human-readable name shown in the provider picker.
    fn label(&self) -> &str;

    fn description(&self) -> &str;

    /// Field names this provider can autocomplete against (e.g. `["ticker"]`).
    fn auto_complete_fields(&self) -> &[&str];

    async fn auto_complete(&self, field: &str, filter: &str) -> Result<Vec<String>, PriceError>;

    /// Drops any cached lookups this provider holds. A no-op for stateless
    /// providers.
    fn clear_cache(&self);

    async fn get_prices(&self, code: &str, commodity_name: &str) -> Result<Vec<Price>, PriceError>;
}

/// Global set of registered providers. Providers join via [`register`] during
/// startup, before any refresh runs.
static REGISTRY: OnceLock<RwLock<Vec<Arc<dyn PriceProvider>>>> = OnceLock::new();

fn registry() -> &'static RwLock<Vec<Arc<dyn PriceProvider>>> {
    REGISTRY.get_or_init(|| RwLock::new(Vec::new()))
}

pub fn register(provider: Arc<dyn PriceProvider>) {
    registry().write().expect("provider registry poisoned").push(provider);
}

pub fn providers() -> Vec<Arc<dyn PriceProvider>> {
    registry().read().expect("provider registry poisoned").clone()
}

pub fn find(code: &str) -> Option<Arc<dyn PriceProvider>> {
    providers().into_iter().find(|p| p.code() == code)
}

/// One commodity's assignment to a provider for a refresh run.
pub struct RefreshJob {
    pub provider_code: String,
    pub commodity_code: String,
    pub commodity_name: String,
}

/// Outcome of fetching one job. A failed job is recoverable: the refresh
/// keeps the commodity's existing prices and surfaces the failure as a
/// logged marker rather than aborting the run (spec.md §7).
pub enum RefreshOutcome {
    Fetched { commodity_code: String, prices: Vec<Price> },
    Failed { commodity_code: String, error: PriceError },
}

/// Runs `jobs` against the registered providers in parallel, bounded by a
/// worker pool of [`MAX_CONCURRENT_FETCHES`] (spec.md §5). Each fetch gets a
/// 10s timeout and up to three attempts with exponential backoff.
#[tracing::instrument(skip_all, fields(jobs = jobs.len()))]
pub async fn refresh_all(jobs: Vec<RefreshJob>) -> Vec<RefreshOutcome> {
    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_FETCHES));
    let mut tasks = JoinSet::new();

    for job in jobs {
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            fetch_with_retry(job).await
        });
    }

    let mut outcomes = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => error!("price refresh task panicked: {e}"),
        }
    }
    outcomes
}

async fn fetch_with_retry(job: RefreshJob) -> RefreshOutcome {
    let Some(provider) = find(&job.provider_code) else {
        return RefreshOutcome::Failed {
            commodity_code: job.commodity_code.clone(),
            error: PriceError::NoProvider(job.commodity_code),
        };
    };

    let mut last_error = None;
    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            tokio::time::sleep(RETRY_BASE_DELAY * 2u32.pow(attempt - 1)).await;
        }

        let fetch = provider.get_prices(&job.commodity_code, &job.commodity_name);
        match tokio::time::timeout(FETCH_TIMEOUT, fetch).await {
            Ok(Ok(prices)) => return RefreshOutcome::Fetched { commodity_code: job.commodity_code, prices },
            Ok(Err(e)) => {
                warn!(commodity = %job.commodity_code, attempt, "price fetch failed: {e}");
                last_error = Some(e);
            }
            Err(_) => {
                warn!(commodity = %job.commodity_code, attempt, "price fetch timed out");
                last_error = Some(PriceError::Timeout {
                    provider: job.provider_code.clone(),
                    commodity: job.commodity_code.clone(),
                });
            }
        }
    }

    RefreshOutcome::Failed {
        commodity_code: job.commodity_code.clone(),
        error: last_error.unwrap_or(PriceError::NoProvider(job.commodity_code)),
    }
}

/// Merges refresh outcomes into a single map of commodity to newly fetched
/// prices, logging and dropping failures rather than propagating them.
pub fn collect_succeeded(outcomes: Vec<RefreshOutcome>) -> HashMap<String, Vec<Price>> {
    let mut out = HashMap::new();
    for outcome in outcomes {
        match outcome {
            RefreshOutcome::Fetched { commodity_code, prices } => {
                out.insert(commodity_code, prices);
            }
            RefreshOutcome::Failed { commodity_code, error } => {
                error!(commodity = %commodity_code, "price refresh failed after retries: {error}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CommodityType;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyProvider {
        code: String,
        fail_until_attempt: u32,
        attempts: AtomicU32,
    }

    #[async_trait::async_trait]
    impl PriceProvider for FlakyProvider {
        fn code(&self) -> &str {
            &self.code
        }
        fn label(&self) -> &str {
            "Flaky"
        }
        fn description(&self) -> &str {
            "test provider that fails a fixed number of times"
        }
        fn auto_complete_fields(&self) -> &[&str] {
            &["ticker"]
        }
        async fn auto_complete(&self, _field: &str, _filter: &str) -> Result<Vec<String>, PriceError> {
            Ok(Vec::new())
        }
        fn clear_cache(&self) {}
        async fn get_prices(&self, code: &str, commodity_name: &str) -> Result<Vec<Price>, PriceError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_until_attempt {
                return Err(PriceError::ProviderFailure {
                    provider: self.code.clone(),
                    commodity: code.to_string(),
                    message: "temporarily unavailable".into(),
                });
            }
            Ok(vec![Price {
                commodity_type: CommodityType::Stock,
                commodity_id: 1,
                commodity_name: commodity_name.to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                value: rust_decimal::Decimal::ONE,
            }])
        }
    }

    #[tokio::test]
    async fn retries_until_success_within_attempt_budget() {
        register(Arc::new(FlakyProvider {
            code: "flaky-retry-test".into(),
            fail_until_attempt: 2,
            attempts: AtomicU32::new(0),
        }));

        let outcomes = refresh_all(vec![RefreshJob {
            provider_code: "flaky-retry-test".into(),
            commodity_code: "AAPL".into(),
            commodity_name: "Apple".into(),
        }])
        .await;

        let succeeded = collect_succeeded(outcomes);
        assert!(succeeded.contains_key("AAPL"));
    }

    #[tokio::test]
    async fn exhausting_retries_reports_failure() {
        register(Arc::new(FlakyProvider {
            code: "flaky-exhaust-test".into(),
            fail_until_attempt: MAX_ATTEMPTS,
            attempts: AtomicU32::new(0),
        }));

        let outcomes = refresh_all(vec![RefreshJob {
            provider_code: "flaky-exhaust-test".into(),
            commodity_code: "MSFT".into(),
            commodity_name: "Microsoft".into(),
        }])
        .await;

        let succeeded = collect_succeeded(outcomes);
        assert!(!succeeded.contains_key("MSFT"));
    }

    #[tokio::test]
    async fn unregistered_provider_code_fails_without_panicking() {
        let outcomes = refresh_all(vec![RefreshJob {
            provider_code: "does-not-exist".into(),
            commodity_code: "XYZ".into(),
            commodity_name: "Unknown".into(),
        }])
        .await;

        assert!(matches!(outcomes[0], RefreshOutcome::Failed { .. }));
    }
}
