//! Stock routes: areas, receipt and exit sheets, stock levels, inventories.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use diacamma_core::storage::{CsvMapping, SheetStatus, SheetType, StorageArea};
use diacamma_db::StorageRepository;
use diacamma_db::repositories::CreateSheetInput;
use diacamma_shared::types::{
    ArticleId, InventoryDetailId, InventorySheetId, StorageAreaId, StorageDetailId, StorageSheetId, ThirdId,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::{ApiError, AppState};

/// Creates the stock routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/storage-areas", get(list_areas))
        .route("/storage-areas/{id}", put(save_area).delete(delete_area))
        .route("/storage-sheets", get(list_sheets).post(create_sheet))
        .route("/storage-sheets/{id}", get(get_sheet).delete(delete_sheet))
        .route("/storage-sheets/{id}/details", post(add_detail))
        .route("/storage-sheets/{id}/details/{detail_id}", delete(remove_detail))
        .route("/storage-sheets/{id}/import", post(import_csv))
        .route("/storage-sheets/{id}/check", get(check_sheet))
        .route("/storage-sheets/{id}/validate", post(validate_sheet))
        .route("/stocks", get(list_stocks))
        .route("/articles/{id}/stock", get(article_stock))
        .route("/inventories", get(list_inventories).post(create_inventory))
        .route("/inventories/{id}", get(inventory_lines))
        .route("/inventories/{id}/details/{detail_id}", put(count_detail))
        .route("/inventories/{id}/validate", post(validate_inventory))
}

fn repo(state: &AppState) -> StorageRepository {
    StorageRepository::new((*state.db).clone(), state.currency())
}

/// Query of the sheet list.
#[derive(Debug, Default, Deserialize)]
pub struct SheetQuery {
    /// Status.
    pub status: Option<SheetStatus>,
    /// Receipt or exit.
    pub sheet_type: Option<SheetType>,
}

/// Request body for creating a sheet.
#[derive(Debug, Deserialize)]
pub struct CreateSheetRequest {
    /// Receipt or exit.
    pub sheet_type: SheetType,
    /// Movement date.
    pub date: NaiveDate,
    /// Storage area.
    pub storagearea_id: StorageAreaId,
    /// Comment.
    #[serde(default)]
    pub comment: String,
    /// Provider of a receipt.
    pub provider_id: Option<ThirdId>,
    /// Provider bill reference.
    #[serde(default)]
    pub bill_reference: String,
    /// Provider bill date.
    pub bill_date: Option<NaiveDate>,
}

/// Request body of a sheet line.
#[derive(Debug, Deserialize)]
pub struct DetailRequest {
    /// Article.
    pub article_id: ArticleId,
    /// Unit price, ignored on exits.
    #[serde(default)]
    pub price: Decimal,
    /// Quantity.
    pub quantity: Decimal,
}

/// Request body of a CSV import.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// File content.
    pub content: String,
    /// Column mapping.
    #[serde(default)]
    pub mapping: CsvMapping,
}

/// Request body for creating an inventory.
#[derive(Debug, Deserialize)]
pub struct CreateInventoryRequest {
    /// Counting date.
    pub date: NaiveDate,
    /// Counted area.
    pub storagearea_id: StorageAreaId,
    /// Comment.
    #[serde(default)]
    pub comment: String,
}

/// Request body of a counted quantity.
#[derive(Debug, Deserialize)]
pub struct CountRequest {
    /// Counted quantity, `null` when not counted yet.
    pub quantity: Option<Decimal>,
}

// ========== Areas ==========

/// GET `/storage-areas`
async fn list_areas(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let areas = repo(&state).list_areas().await?;
    Ok(Json(json!({ "storage_areas": areas })))
}

/// PUT `/storage-areas/{id}`
async fn save_area(
    State(state): State<AppState>,
    Path(id): Path<StorageAreaId>,
    Json(mut payload): Json<StorageArea>,
) -> Result<impl IntoResponse, ApiError> {
    payload.id = id;
    repo(&state).save_area(&payload).await?;
    Ok(Json(payload))
}

/// DELETE `/storage-areas/{id}`
async fn delete_area(State(state): State<AppState>, Path(id): Path<StorageAreaId>) -> Result<StatusCode, ApiError> {
    repo(&state).delete_area(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Sheets ==========

/// GET `/storage-sheets`
async fn list_sheets(
    State(state): State<AppState>,
    Query(query): Query<SheetQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sheets: Vec<_> = repo(&state)
        .list_sheets(query.status, query.sheet_type)
        .await?
        .into_iter()
        .map(|(sheet, details)| json!({ "sheet": sheet, "details": details }))
        .collect();
    Ok(Json(json!({ "storage_sheets": sheets })))
}

/// GET `/storage-sheets/{id}`
async fn get_sheet(
    State(state): State<AppState>,
    Path(id): Path<StorageSheetId>,
) -> Result<impl IntoResponse, ApiError> {
    let (sheet, details) = repo(&state).find_sheet(id).await?;
    Ok(Json(json!({ "sheet": sheet, "details": details })))
}

/// POST `/storage-sheets`
async fn create_sheet(
    State(state): State<AppState>,
    Json(payload): Json<CreateSheetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let sheet = repo(&state)
        .create_sheet(CreateSheetInput {
            sheet_type: payload.sheet_type,
            date: payload.date,
            storagearea_id: payload.storagearea_id,
            comment: payload.comment,
            provider_id: payload.provider_id,
            bill_reference: payload.bill_reference,
            bill_date: payload.bill_date,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(sheet)))
}

/// DELETE `/storage-sheets/{id}`
async fn delete_sheet(State(state): State<AppState>, Path(id): Path<StorageSheetId>) -> Result<StatusCode, ApiError> {
    repo(&state).delete_sheet(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/storage-sheets/{id}/details`
async fn add_detail(
    State(state): State<AppState>,
    Path(id): Path<StorageSheetId>,
    Json(payload): Json<DetailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = repo(&state)
        .add_detail(id, payload.article_id, payload.price, payload.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// DELETE `/storage-sheets/{id}/details/{detail_id}`
async fn remove_detail(
    State(state): State<AppState>,
    Path((id, detail_id)): Path<(StorageSheetId, StorageDetailId)>,
) -> Result<StatusCode, ApiError> {
    repo(&state).remove_detail(id, detail_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/storage-sheets/{id}/import` - returns the unknown references.
async fn import_csv(
    State(state): State<AppState>,
    Path(id): Path<StorageSheetId>,
    Json(payload): Json<ImportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let unknown = repo(&state).import_csv(id, &payload.content, &payload.mapping).await?;
    Ok(Json(json!({ "unknown": unknown })))
}

/// GET `/storage-sheets/{id}/check`
async fn check_sheet(
    State(state): State<AppState>,
    Path(id): Path<StorageSheetId>,
) -> Result<impl IntoResponse, ApiError> {
    let warnings = repo(&state).check_info(id).await?;
    Ok(Json(json!({ "warnings": warnings })))
}

/// POST `/storage-sheets/{id}/validate`
async fn validate_sheet(
    State(state): State<AppState>,
    Path(id): Path<StorageSheetId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).validate_sheet(id).await?))
}

// ========== Stock ==========

/// GET `/stocks`
async fn list_stocks(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stocks = repo(&state).stocks().await?;
    Ok(Json(json!({ "stocks": stocks })))
}

/// GET `/articles/{id}/stock`
async fn article_stock(
    State(state): State<AppState>,
    Path(id): Path<ArticleId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).article_stock(id).await?))
}

// ========== Inventories ==========

/// GET `/inventories`
async fn list_inventories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let inventories = repo(&state).list_inventories().await?;
    Ok(Json(json!({ "inventories": inventories })))
}

/// POST `/inventories`
async fn create_inventory(
    State(state): State<AppState>,
    Json(payload): Json<CreateInventoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let inventory = repo(&state)
        .create_inventory(payload.date, payload.storagearea_id, &payload.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(inventory)))
}

/// GET `/inventories/{id}` - lines with the quantity in stock.
async fn inventory_lines(
    State(state): State<AppState>,
    Path(id): Path<InventorySheetId>,
) -> Result<impl IntoResponse, ApiError> {
    let lines = repo(&state).inventory_lines(id).await?;
    Ok(Json(json!({ "lines": lines })))
}

/// PUT `/inventories/{id}/details/{detail_id}`
async fn count_detail(
    State(state): State<AppState>,
    Path((id, detail_id)): Path<(InventorySheetId, InventoryDetailId)>,
    Json(payload): Json<CountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).count(id, detail_id, payload.quantity).await?))
}

/// POST `/inventories/{id}/validate` - returns the generated sheets.
async fn validate_inventory(
    State(state): State<AppState>,
    Path(id): Path<InventorySheetId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).validate_inventory(id).await?))
}
