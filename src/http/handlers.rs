//! Route handlers (spec.md §6). Each handler materializes one posting
//! slice off the current snapshot and runs it through the accumulator(s)
//! that back its endpoint; computation inside a handler is sequential
//! (spec.md §5).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::accumulate::{allocation, breakdown, cashflow, networth};
use crate::budget;
use crate::caldate;
use crate::domain::Posting;
use crate::error::LedgerscopeError;
use crate::goals::{retirement, savings};
use crate::query::glob::is_prefix;
use crate::query::PostingQuery;
use crate::sheet;
use crate::store::Snapshot;

use super::AppState;

/// Wraps [`LedgerscopeError`] for the JSON error body. Recoverable,
/// observational failures never reach a handler as an `Err` (spec.md §7);
/// what lands here is always structural.
pub struct ApiError(LedgerscopeError);

impl From<LedgerscopeError> for ApiError {
    fn from(err: LedgerscopeError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

const NET_WORTH_PATTERNS: &[&str] = &["Assets%", "Liabilities%", "Income:CapitalGains%"];

fn non_forecast_net_worth_postings<'a>(snapshot: &'a Snapshot, tz: chrono_tz::Tz) -> Vec<&'a Posting> {
    PostingQuery::all(&snapshot.postings, tz)
        .like(NET_WORTH_PATTERNS)
        .expect("static patterns always compile")
        .not_forecast()
        .materialize()
}

fn checking_balance_at(snapshot: &Snapshot, tz: chrono_tz::Tz, at: NaiveDate) -> rust_decimal::Decimal {
    PostingQuery::all(&snapshot.postings, tz)
        .account_prefix("Assets:Checking")
        .not_forecast()
        .materialize()
        .into_iter()
        .filter(|p| p.date <= at)
        .map(|p| p.amount)
        .sum()
}

pub async fn networth(State(state): State<AppState>) -> ApiResult<Vec<networth::NetWorthRecord>> {
    let snapshot = state.store.snapshot();
    let today = caldate::today_in(state.config.time_zone);
    let postings = non_forecast_net_worth_postings(&snapshot, state.config.time_zone);
    Ok(Json(networth::compute(&postings, &snapshot.prices, &state.config, today)))
}

pub async fn current_networth(State(state): State<AppState>) -> ApiResult<Option<networth::NetWorthRecord>> {
    let snapshot = state.store.snapshot();
    let today = caldate::today_in(state.config.time_zone);
    let postings = non_forecast_net_worth_postings(&snapshot, state.config.time_zone);
    let records = networth::compute(&postings, &snapshot.prices, &state.config, today);
    Ok(Json(records.last().cloned()))
}

pub async fn cash_flow(State(state): State<AppState>) -> ApiResult<Vec<cashflow::CashFlowRecord>> {
    let snapshot = state.store.snapshot();
    let today = caldate::today_in(state.config.time_zone);
    let postings = PostingQuery::all(&snapshot.postings, state.config.time_zone)
        .not_forecast()
        .materialize();
    Ok(Json(cashflow::compute(&postings, today)))
}

pub async fn current_cash_flow(State(state): State<AppState>) -> ApiResult<Option<cashflow::CashFlowRecord>> {
    let snapshot = state.store.snapshot();
    let today = caldate::today_in(state.config.time_zone);
    let postings = PostingQuery::all(&snapshot.postings, state.config.time_zone)
        .not_forecast()
        .materialize();
    Ok(Json(cashflow::compute(&postings, today).last().cloned()))
}

pub async fn balance(State(state): State<AppState>) -> ApiResult<Option<networth::NetWorthRecord>> {
    current_networth(State(state)).await
}

#[derive(Debug, Serialize)]
pub struct CheckingBalance {
    pub balance: rust_decimal::Decimal,
}

pub async fn checking_balance(State(state): State<AppState>) -> ApiResult<CheckingBalance> {
    let snapshot = state.store.snapshot();
    let today = caldate::today_in(state.config.time_zone);
    let balance = checking_balance_at(&snapshot, state.config.time_zone, today);
    Ok(Json(CheckingBalance { balance }))
}

/// `n` calendar months after the first of `date`'s month. Budget schedules
/// always land on the 1st, so no end-of-month clamping is needed (unlike
/// [`caldate::months_before`]).
fn months_forward(date: NaiveDate, n: u32) -> NaiveDate {
    let month_begin = caldate::month_begin(date);
    let total = month_begin.year() * 12 + month_begin.month0() as i32 + n as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).expect("valid month arithmetic")
}

fn budget_months(today: NaiveDate) -> Vec<NaiveDate> {
    let start = caldate::months_before(today, 1);
    let end = months_forward(today, 11);
    caldate::month_starts(start, end)
}

pub async fn budget(State(state): State<AppState>) -> ApiResult<Vec<budget::MonthBudget>> {
    let snapshot = state.store.snapshot();
    let tz = state.config.time_zone;
    let today = caldate::today_in(tz);
    let postings = PostingQuery::all(&snapshot.postings, tz).not_forecast().materialize();
    let checking = checking_balance_at(&snapshot, tz, today);
    let months = budget_months(today);
    Ok(Json(budget::compute(
        &postings,
        &state.config.schedule_al,
        &state.config.budget,
        &months,
        checking,
        today,
    )))
}

pub async fn current_budget(State(state): State<AppState>) -> ApiResult<Option<budget::MonthBudget>> {
    let snapshot = state.store.snapshot();
    let tz = state.config.time_zone;
    let today = caldate::today_in(tz);
    let postings = PostingQuery::all(&snapshot.postings, tz).not_forecast().materialize();
    let checking = checking_balance_at(&snapshot, tz, today);
    let months = budget_months(today);
    let records = budget::compute(
        &postings,
        &state.config.schedule_al,
        &state.config.budget,
        &months,
        checking,
        today,
    );
    let this_month = caldate::month_begin(today);
    Ok(Json(records.into_iter().find(|m| m.month == this_month)))
}

#[derive(Debug, Serialize)]
pub struct NamedRetirementProjection {
    pub name: String,
    #[serde(flatten)]
    pub projection: retirement::RetirementProjection,
}

pub async fn retirement_goals(State(state): State<AppState>) -> ApiResult<Vec<NamedRetirementProjection>> {
    let snapshot = state.store.snapshot();
    let tz = state.config.time_zone;
    let today = caldate::today_in(tz);
    let all_postings: Vec<&Posting> = PostingQuery::all(&snapshot.postings, tz).not_forecast().materialize();

    let projections = state
        .config
        .goals
        .retirement
        .iter()
        .map(|goal| {
            let expense: Vec<&Posting> = all_postings
                .iter()
                .copied()
                .filter(|p| goal.expense_accounts.iter().any(|a| is_prefix(&p.account, a)))
                .collect();
            let savings: Vec<&Posting> = all_postings
                .iter()
                .copied()
                .filter(|p| goal.savings_accounts.iter().any(|a| is_prefix(&p.account, a)))
                .collect();
            NamedRetirementProjection {
                name: goal.name.clone(),
                projection: retirement::compute(
                    goal,
                    &expense,
                    &savings,
                    &snapshot.prices,
                    &state.config.default_currency,
                    today,
                ),
            }
        })
        .collect();

    Ok(Json(projections))
}

#[derive(Debug, Serialize)]
pub struct NamedSavingsProjection {
    pub name: String,
    #[serde(flatten)]
    pub projection: savings::SavingsProjection,
}

pub async fn savings_goals(State(state): State<AppState>) -> ApiResult<Vec<NamedSavingsProjection>> {
    let snapshot = state.store.snapshot();
    let tz = state.config.time_zone;
    let today = caldate::today_in(tz);
    let all_postings: Vec<&Posting> = PostingQuery::all(&snapshot.postings, tz).not_forecast().materialize();

    let projections = state
        .config
        .goals
        .savings
        .iter()
        .map(|goal| {
            let current: rust_decimal::Decimal = all_postings
                .iter()
                .filter(|p| goal.accounts.iter().any(|a| is_prefix(&p.account, a)))
                .map(|p| crate::valuation::market_value(&snapshot.prices, p, &state.config.default_currency, today))
                .sum();
            NamedSavingsProjection {
                name: goal.name.clone(),
                projection: savings::compute(goal, current, today),
            }
        })
        .collect();

    Ok(Json(projections))
}

pub async fn allocation(State(state): State<AppState>) -> ApiResult<Vec<allocation::AllocationRecord>> {
    let snapshot = state.store.snapshot();
    let tz = state.config.time_zone;
    let today = caldate::today_in(tz);
    let postings = non_forecast_net_worth_postings(&snapshot, tz);
    let breakdown = breakdown::compute(
        &postings,
        &snapshot.prices,
        &state.config,
        today,
        breakdown::BreakdownMode::LeafOnly,
    );
    Ok(Json(allocation::compute(&breakdown, &state.config.allocation_targets)))
}

#[derive(Debug, Deserialize)]
pub struct SheetSource {
    pub source: String,
}

pub async fn editor_validate(Json(body): Json<SheetSource>) -> Json<Vec<sheet::Diagnostic>> {
    Json(sheet::validate(&body.source))
}

pub async fn editor_sheet_evaluate(
    State(state): State<AppState>,
    Json(body): Json<SheetSource>,
) -> Json<Vec<SheetLineResult>> {
    let snapshot = state.store.snapshot();
    let mut env = sheet::Env::new(
        Arc::new((*snapshot).clone()),
        state.config.default_currency.clone(),
        state.config.locale.clone(),
    );
    let results = sheet::evaluate_sheet(&mut env, &body.source);
    Json(results.into_iter().map(SheetLineResult::from).collect())
}

#[derive(Debug, Serialize)]
pub struct SheetLineResult {
    pub text: String,
    pub bold: bool,
}

impl From<sheet::LineResult> for SheetLineResult {
    fn from(r: sheet::LineResult) -> Self {
        Self { text: r.text, bold: r.bold }
    }
}
