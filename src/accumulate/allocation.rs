//! Current vs. target asset allocation, derived from a leaf-only breakdown
//! (spec.md §6's `allocation_targets` config and `/api/allocation` surface).

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::AllocationTarget;
use crate::decimal::safe_ratio;

use super::breakdown::BreakdownRecord;

#[derive(Debug, Clone, Serialize)]
pub struct AllocationRecord {
    pub account: String,
    pub market_amount: Decimal,
    pub current_percent: Decimal,
    pub target_percent: Decimal,
    pub drift_percent: Decimal,
}

/// Pairs each configured target with its current share of total net worth.
/// Accounts with a target but no matching breakdown entry are reported with
/// a zero current balance rather than dropped, so a drifted-to-zero
/// position is still visible to the caller.
pub fn compute(breakdown: &[BreakdownRecord], targets: &[AllocationTarget]) -> Vec<AllocationRecord> {
    let total: Decimal = breakdown.iter().map(|r| r.market_amount).sum();

    targets
        .iter()
        .map(|target| {
            let market_amount = breakdown
                .iter()
                .find(|r| r.account == target.account)
                .map(|r| r.market_amount)
                .unwrap_or(Decimal::ZERO);
            let current_percent = safe_ratio(market_amount, total) * Decimal::from(100);
            AllocationRecord {
                account: target.account.clone(),
                market_amount,
                current_percent,
                target_percent: target.target_percent,
                drift_percent: current_percent - target.target_percent,
            }
        })
        .collect()
}
