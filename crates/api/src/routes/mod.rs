//! API route definitions.

use axum::Router;
use chrono::{NaiveDate, Utc};

use crate::AppState;

pub mod articles;
pub mod bills;
pub mod cost_accountings;
pub mod entries;
pub mod fiscal;
pub mod health;
pub mod payoffs;
pub mod storage;
pub mod thirds;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(fiscal::routes())
        .merge(thirds::routes())
        .merge(entries::routes())
        .merge(cost_accountings::routes())
        .merge(articles::routes())
        .merge(bills::routes())
        .merge(payoffs::routes())
        .merge(storage::routes())
}

/// Server date used for numbering and closing.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
