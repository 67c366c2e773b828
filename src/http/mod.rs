//! JSON HTTP surface (spec.md §6). Request-per-handler scheduling: each
//! route runs on its own worker, and computation inside a handler is
//! sequential over one snapshot (spec.md §5).

pub mod handlers;
pub mod routes;

use std::sync::Arc;

use crate::config::Config;
use crate::store::Store;

/// Shared across every handler. Cloning is an `Arc` bump, not a deep copy.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub config: Arc<Config>,
}

pub fn router(state: AppState) -> axum::Router {
    routes::build(state)
}
