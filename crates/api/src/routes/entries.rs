//! Accounting entry, lettering and entry model routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::NaiveDate;
use diacamma_core::accounting::{EntryFilter, LineInput, ModelEntry};
use diacamma_db::EntryRepository;
use diacamma_db::repositories::CreateEntryInput;
use diacamma_shared::types::{
    CostAccountingId, EntryId, EntryLineId, FiscalYearId, ModelEntryId, PageRequest, PageResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::today;
use crate::{ApiError, AppState};

/// Creates the entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/entries", get(list_entries).post(create_entry))
        .route("/entries/link", post(link_entries))
        .route("/entries/cost-accounting", post(assign_cost_accounting))
        .route("/entries/{id}", get(get_entry).delete(delete_entry))
        .route("/entries/{id}/lines", post(save_line))
        .route("/entries/{id}/lines/{line_id}", delete(remove_line))
        .route("/entries/{id}/close", post(close_entry))
        .route("/entries/{id}/reverse", post(reverse_entry))
        .route("/entries/{id}/linked", post(create_linked))
        .route("/entries/{id}/link", delete(unlink_entry))
        .route("/entry-models", get(list_models).put(save_model))
        .route("/entry-models/{id}", delete(delete_model))
        .route("/entry-models/{id}/apply", post(apply_model))
}

fn repo(state: &AppState) -> EntryRepository {
    EntryRepository::new((*state.db).clone())
}

/// Query of the entry list.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Fiscal year.
    pub year_id: FiscalYearId,
    /// Status filter.
    #[serde(default)]
    pub filter: EntryFilter,
    /// Journal, every journal when absent.
    pub journal_id: Option<i32>,
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Request body for creating an entry.
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    /// Fiscal year.
    pub year_id: FiscalYearId,
    /// Journal.
    pub journal_id: i32,
    /// Value date.
    pub date_value: NaiveDate,
    /// Designation.
    pub designation: String,
    /// Analytic tag.
    pub costaccounting_id: Option<CostAccountingId>,
}

/// Request body listing entries.
#[derive(Debug, Deserialize)]
pub struct EntryIdsRequest {
    /// Entries.
    pub ids: Vec<EntryId>,
}

/// Request body for tagging entries.
#[derive(Debug, Deserialize)]
pub struct CostAssignRequest {
    /// Entries.
    pub ids: Vec<EntryId>,
    /// Cost accounting, `null` to remove the tag.
    pub cost_accounting_id: Option<CostAccountingId>,
}

/// Query of the model list.
#[derive(Debug, Deserialize)]
pub struct ModelQuery {
    /// Journal.
    pub journal_id: Option<i32>,
}

/// Request body for applying a model.
#[derive(Debug, Deserialize)]
pub struct ApplyModelRequest {
    /// Multiplier of the model amounts.
    pub factor: Decimal,
    /// Fiscal year.
    pub year_id: FiscalYearId,
    /// Value date.
    pub date: NaiveDate,
}

/// GET `/entries` - paginated.
async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let entries = repo(&state).list(query.year_id, query.filter, query.journal_id).await?;
    let total = u64::try_from(entries.len()).unwrap_or(u64::MAX);
    let data = entries
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
        .collect();
    Ok(Json(PageResponse::new(data, &page, total)))
}

/// GET `/entries/{id}`
async fn get_entry(State(state): State<AppState>, Path(id): Path<EntryId>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).find(id).await?))
}

/// POST `/entries`
async fn create_entry(
    State(state): State<AppState>,
    Json(payload): Json<CreateEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = repo(&state)
        .create(CreateEntryInput {
            year_id: payload.year_id,
            journal_id: payload.journal_id,
            date_value: payload.date_value,
            designation: payload.designation,
            costaccounting_id: payload.costaccounting_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// DELETE `/entries/{id}`
async fn delete_entry(State(state): State<AppState>, Path(id): Path<EntryId>) -> Result<StatusCode, ApiError> {
    repo(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/entries/{id}/lines` - adds a line, or replaces it when `id` is set.
async fn save_line(
    State(state): State<AppState>,
    Path(id): Path<EntryId>,
    Json(payload): Json<LineInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).save_line(id, payload).await?))
}

/// DELETE `/entries/{id}/lines/{line_id}`
async fn remove_line(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(EntryId, EntryLineId)>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).remove_line(id, line_id).await?))
}

/// POST `/entries/{id}/close`
async fn close_entry(State(state): State<AppState>, Path(id): Path<EntryId>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).close(id, today()).await?))
}

/// POST `/entries/{id}/reverse`
async fn reverse_entry(
    State(state): State<AppState>,
    Path(id): Path<EntryId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).reverse(id).await?))
}

/// POST `/entries/{id}/linked` - records the payment of the third lines.
async fn create_linked(
    State(state): State<AppState>,
    Path(id): Path<EntryId>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = repo(&state).create_linked(id, today()).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// POST `/entries/link`
async fn link_entries(
    State(state): State<AppState>,
    Json(payload): Json<EntryIdsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let link = repo(&state).link(&payload.ids).await?;
    info!(letter = %link.letter, entries = payload.ids.len(), "entries lettered");
    Ok(Json(link))
}

/// DELETE `/entries/{id}/link`
async fn unlink_entry(State(state): State<AppState>, Path(id): Path<EntryId>) -> Result<impl IntoResponse, ApiError> {
    let released = repo(&state).unlink(id).await?;
    Ok(Json(json!({ "released": released })))
}

/// POST `/entries/cost-accounting`
async fn assign_cost_accounting(
    State(state): State<AppState>,
    Json(payload): Json<CostAssignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = repo(&state)
        .assign_cost_accounting(&payload.ids, payload.cost_accounting_id)
        .await?;
    Ok(Json(json!({ "updated": updated })))
}

/// GET `/entry-models`
async fn list_models(
    State(state): State<AppState>,
    Query(query): Query<ModelQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let models = repo(&state).list_models(query.journal_id).await?;
    Ok(Json(json!({ "models": models })))
}

/// PUT `/entry-models`
async fn save_model(
    State(state): State<AppState>,
    Json(payload): Json<ModelEntry>,
) -> Result<impl IntoResponse, ApiError> {
    repo(&state).save_model(&payload).await?;
    Ok(Json(payload))
}

/// DELETE `/entry-models/{id}`
async fn delete_model(State(state): State<AppState>, Path(id): Path<ModelEntryId>) -> Result<StatusCode, ApiError> {
    repo(&state).delete_model(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/entry-models/{id}/apply`
async fn apply_model(
    State(state): State<AppState>,
    Path(id): Path<ModelEntryId>,
    Json(payload): Json<ApplyModelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = repo(&state)
        .apply_model(id, payload.factor, payload.year_id, payload.date, &state.currency())
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
