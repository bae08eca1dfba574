//! Third (customer and supplier) routes.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use diacamma_core::accounting::{LinesFilter, ShowFilter, ThirdStatus};
use diacamma_db::ThirdRepository;
use diacamma_db::repositories::CreateThirdInput;
use diacamma_shared::types::{FiscalYearId, ThirdId};
use serde::Deserialize;
use serde_json::json;

use crate::{ApiError, AppState};

/// Creates the third routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/thirds", get(list_thirds).post(create_third))
        .route("/thirds/{id}", get(get_third).put(update_third).delete(delete_third))
        .route("/thirds/{id}/accounts", post(add_account))
        .route("/thirds/{id}/accounts/{code}", delete(remove_account))
        .route("/thirds/{id}/entries", get(third_entries))
}

fn repo(state: &AppState) -> ThirdRepository {
    ThirdRepository::new((*state.db).clone())
}

/// Query of the third list.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Contact name filter.
    #[serde(default)]
    pub contact: String,
    /// Balance filter.
    #[serde(default)]
    pub show: ShowFilter,
}

/// Request body for creating a third.
#[derive(Debug, Deserialize)]
pub struct CreateThirdRequest {
    /// Contact name.
    pub contact: String,
    /// Initial account codes.
    #[serde(default)]
    pub accounts: Vec<String>,
    /// Custom fields.
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
}

/// Request body for updating a third.
#[derive(Debug, Deserialize)]
pub struct UpdateThirdRequest {
    /// Contact name.
    pub contact: String,
    /// Enabled or disabled.
    pub status: ThirdStatus,
    /// Custom fields.
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
}

/// Request body carrying an account code.
#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    /// Account code.
    pub code: String,
}

/// Query of the entries of a third.
#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    /// Fiscal year.
    pub year_id: FiscalYearId,
    /// Lettering filter.
    #[serde(default)]
    pub lines: LinesFilter,
}

/// GET `/thirds`
async fn list_thirds(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let thirds = repo(&state).list(&query.contact, query.show).await?;
    Ok(Json(json!({ "thirds": thirds })))
}

/// GET `/thirds/{id}`
async fn get_third(State(state): State<AppState>, Path(id): Path<ThirdId>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).find(id).await?))
}

/// POST `/thirds`
async fn create_third(
    State(state): State<AppState>,
    Json(payload): Json<CreateThirdRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let third = repo(&state)
        .create(CreateThirdInput {
            contact: payload.contact,
            accounts: payload.accounts,
            custom_fields: payload.custom_fields,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(third)))
}

/// PUT `/thirds/{id}`
async fn update_third(
    State(state): State<AppState>,
    Path(id): Path<ThirdId>,
    Json(payload): Json<UpdateThirdRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let third = repo(&state)
        .update(id, &payload.contact, payload.status, payload.custom_fields)
        .await?;
    Ok(Json(third))
}

/// DELETE `/thirds/{id}`
async fn delete_third(State(state): State<AppState>, Path(id): Path<ThirdId>) -> Result<StatusCode, ApiError> {
    repo(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/thirds/{id}/accounts`
async fn add_account(
    State(state): State<AppState>,
    Path(id): Path<ThirdId>,
    Json(payload): Json<AccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).add_account(id, &payload.code).await?))
}

/// DELETE `/thirds/{id}/accounts/{code}`
async fn remove_account(
    State(state): State<AppState>,
    Path((id, code)): Path<(ThirdId, String)>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).remove_account(id, &code).await?))
}

/// GET `/thirds/{id}/entries`
async fn third_entries(
    State(state): State<AppState>,
    Path(id): Path<ThirdId>,
    Query(query): Query<EntriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = repo(&state).entries(id, query.lines, query.year_id).await?;
    Ok(Json(json!({ "entries": entries })))
}
