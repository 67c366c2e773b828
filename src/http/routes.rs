//! Route table (spec.md §6).

use axum::routing::{get, post};
use axum::Router;

use super::{handlers, AppState};

pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/api/networth", get(handlers::networth))
        .route("/api/current_networth", get(handlers::current_networth))
        .route("/api/cash_flow", get(handlers::cash_flow))
        .route("/api/current_cash_flow", get(handlers::current_cash_flow))
        .route("/api/balance", get(handlers::balance))
        .route("/api/checking_balance", get(handlers::checking_balance))
        .route("/api/budget", get(handlers::budget))
        .route("/api/current_budget", get(handlers::current_budget))
        .route("/api/goals/retirement", get(handlers::retirement_goals))
        .route("/api/goals/savings", get(handlers::savings_goals))
        .route("/api/allocation", get(handlers::allocation))
        .route("/api/editor/validate", post(handlers::editor_validate))
        .route("/api/editor/sheet/evaluate", post(handlers::editor_sheet_evaluate))
        .with_state(state)
}
