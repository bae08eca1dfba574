//! Cost accounting routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use diacamma_db::CostAccountingRepository;
use diacamma_shared::types::{CostAccountingId, FiscalYearId};
use serde::Deserialize;
use serde_json::json;

use crate::{ApiError, AppState};

/// Creates the cost accounting routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cost-accountings", get(list_costs).post(create_cost))
        .route("/cost-accountings/default", put(set_default))
        .route("/cost-accountings/{id}", get(get_cost).delete(delete_cost))
        .route("/cost-accountings/{id}/close", post(close_cost))
        .route("/cost-accountings/{id}/totals", get(cost_totals))
}

fn repo(state: &AppState) -> CostAccountingRepository {
    CostAccountingRepository::new((*state.db).clone())
}

/// Request body for creating a cost accounting.
#[derive(Debug, Deserialize)]
pub struct CreateCostRequest {
    /// Unique name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Fiscal year it belongs to.
    pub year_id: Option<FiscalYearId>,
    /// Cost accounting it continues.
    pub last_costaccounting_id: Option<CostAccountingId>,
}

/// Request body choosing the default cost accounting.
#[derive(Debug, Deserialize)]
pub struct DefaultRequest {
    /// New default, `null` for none.
    pub id: Option<CostAccountingId>,
}

/// GET `/cost-accountings`
async fn list_costs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let costs = repo(&state).list().await?;
    Ok(Json(json!({ "cost_accountings": costs })))
}

/// GET `/cost-accountings/{id}`
async fn get_cost(
    State(state): State<AppState>,
    Path(id): Path<CostAccountingId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).find(id).await?))
}

/// POST `/cost-accountings`
async fn create_cost(
    State(state): State<AppState>,
    Json(payload): Json<CreateCostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cost = repo(&state)
        .create(
            &payload.name,
            &payload.description,
            payload.year_id,
            payload.last_costaccounting_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(cost)))
}

/// PUT `/cost-accountings/default`
async fn set_default(
    State(state): State<AppState>,
    Json(payload): Json<DefaultRequest>,
) -> Result<StatusCode, ApiError> {
    repo(&state).set_default(payload.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/cost-accountings/{id}/close`
async fn close_cost(
    State(state): State<AppState>,
    Path(id): Path<CostAccountingId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).close(id).await?))
}

/// DELETE `/cost-accountings/{id}`
async fn delete_cost(
    State(state): State<AppState>,
    Path(id): Path<CostAccountingId>,
) -> Result<StatusCode, ApiError> {
    repo(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/cost-accountings/{id}/totals`
async fn cost_totals(
    State(state): State<AppState>,
    Path(id): Path<CostAccountingId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).totals(id).await?))
}
