//! Fiscal year, chart of accounts and journal routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use diacamma_db::FiscalRepository;
use diacamma_db::repositories::CreateYearInput;
use diacamma_shared::types::FiscalYearId;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::today;
use crate::{ApiError, AppState};

/// Creates the fiscal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fiscal-years", get(list_years).post(create_year))
        .route("/fiscal-years/current", get(current_year))
        .route("/fiscal-years/{id}", put(modify_year).delete(delete_year))
        .route("/fiscal-years/{id}/activate", post(activate_year))
        .route("/fiscal-years/{id}/begin", post(begin_year))
        .route("/fiscal-years/{id}/close", post(close_year))
        .route("/fiscal-years/{id}/report", post(report_last_year))
        .route("/fiscal-years/{id}/result", get(year_result))
        .route("/fiscal-years/{id}/chart", get(list_chart).post(add_account))
        .route("/fiscal-years/{id}/chart/{code}", delete(delete_account))
        .route("/journals", get(list_journals).post(create_journal))
        .route("/journals/{id}", put(rename_journal).delete(delete_journal))
}

fn repo(state: &AppState) -> FiscalRepository {
    FiscalRepository::new((*state.db).clone())
}

/// Request body for creating a fiscal year; absent bounds follow the last year.
#[derive(Debug, Default, Deserialize)]
pub struct CreateYearRequest {
    /// First day.
    pub begin: Option<NaiveDate>,
    /// Last day.
    pub end: Option<NaiveDate>,
}

/// Request body for changing year bounds.
#[derive(Debug, Deserialize)]
pub struct ModifyYearRequest {
    /// First day.
    pub begin: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
}

/// Query of the current year.
#[derive(Debug, Deserialize)]
pub struct CurrentQuery {
    /// Year picked by the user, the active one when absent.
    pub selected: Option<FiscalYearId>,
}

/// Request body for adding a chart account.
#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
}

/// Request body carrying a journal name.
#[derive(Debug, Deserialize)]
pub struct JournalRequest {
    /// Journal name.
    pub name: String,
}

/// GET `/fiscal-years`
async fn list_years(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let years = repo(&state).list_years().await?;
    Ok(Json(json!({ "fiscal_years": years })))
}

/// GET `/fiscal-years/current`
async fn current_year(
    State(state): State<AppState>,
    Query(query): Query<CurrentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).current_year(query.selected).await?))
}

/// POST `/fiscal-years`
async fn create_year(
    State(state): State<AppState>,
    Json(payload): Json<CreateYearRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateYearInput {
        begin: payload.begin,
        end: payload.end,
    };
    let year = repo(&state).create_year(input, today()).await?;
    Ok((StatusCode::CREATED, Json(year)))
}

/// PUT `/fiscal-years/{id}`
async fn modify_year(
    State(state): State<AppState>,
    Path(id): Path<FiscalYearId>,
    Json(payload): Json<ModifyYearRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).modify_year(id, payload.begin, payload.end).await?))
}

/// DELETE `/fiscal-years/{id}`
async fn delete_year(State(state): State<AppState>, Path(id): Path<FiscalYearId>) -> Result<StatusCode, ApiError> {
    repo(&state).delete_year(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/fiscal-years/{id}/activate`
async fn activate_year(State(state): State<AppState>, Path(id): Path<FiscalYearId>) -> Result<StatusCode, ApiError> {
    repo(&state).activate_year(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/fiscal-years/{id}/begin`
async fn begin_year(
    State(state): State<AppState>,
    Path(id): Path<FiscalYearId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).begin_year(id).await?))
}

/// POST `/fiscal-years/{id}/close` - returns the closing entry, if any.
async fn close_year(
    State(state): State<AppState>,
    Path(id): Path<FiscalYearId>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = repo(&state).close_year(id).await?;
    info!(year_id = %id, "fiscal year closed");
    Ok(Json(json!({ "closing_entry": entry })))
}

/// POST `/fiscal-years/{id}/report` - carries the previous year's balances forward.
async fn report_last_year(
    State(state): State<AppState>,
    Path(id): Path<FiscalYearId>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = repo(&state).report_last_year(id).await?;
    Ok(Json(json!({ "report_entry": entry })))
}

/// GET `/fiscal-years/{id}/result`
async fn year_result(
    State(state): State<AppState>,
    Path(id): Path<FiscalYearId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).year_result(id).await?))
}

/// GET `/fiscal-years/{id}/chart`
async fn list_chart(
    State(state): State<AppState>,
    Path(id): Path<FiscalYearId>,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = repo(&state).list_chart(id).await?;
    Ok(Json(json!({ "accounts": accounts })))
}

/// POST `/fiscal-years/{id}/chart`
async fn add_account(
    State(state): State<AppState>,
    Path(id): Path<FiscalYearId>,
    Json(payload): Json<AccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = repo(&state).add_account(id, &payload.code, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// DELETE `/fiscal-years/{id}/chart/{code}`
async fn delete_account(
    State(state): State<AppState>,
    Path((id, code)): Path<(FiscalYearId, String)>,
) -> Result<StatusCode, ApiError> {
    repo(&state).delete_account(id, &code).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/journals`
async fn list_journals(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let journals = repo(&state).list_journals().await?;
    Ok(Json(json!({ "journals": journals })))
}

/// POST `/journals`
async fn create_journal(
    State(state): State<AppState>,
    Json(payload): Json<JournalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let journal = repo(&state).create_journal(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(journal)))
}

/// PUT `/journals/{id}`
async fn rename_journal(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<JournalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).rename_journal(id, &payload.name).await?))
}

/// DELETE `/journals/{id}`
async fn delete_journal(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode, ApiError> {
    repo(&state).delete_journal(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
