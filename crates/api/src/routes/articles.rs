//! Catalog routes: VAT rates, articles, categories and automatic reductions.
//!
//! Small reference records are written with `PUT /{kind}/{id}`; the path id
//! wins over the one in the body, so clients create them with their own ids.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use diacamma_core::invoice::{AutomaticReduce, Category, CategoryBill, Stockable, Vat};
use diacamma_db::ArticleRepository;
use diacamma_db::repositories::ArticleInput;
use diacamma_shared::types::{ArticleId, AutomaticReduceId, CategoryBillId, CategoryId, VatId};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::{ApiError, AppState};

/// Creates the catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vats", get(list_vats))
        .route("/vats/{id}", put(save_vat).delete(delete_vat))
        .route("/articles", get(list_articles).post(create_article))
        .route(
            "/articles/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/articles/{id}/disabled", post(set_disabled))
        .route("/categories", get(list_categories))
        .route("/categories/{id}", put(save_category).delete(delete_category))
        .route("/bill-categories", get(list_category_bills))
        .route(
            "/bill-categories/{id}",
            put(save_category_bill).delete(delete_category_bill),
        )
        .route("/reduces", get(list_reduces))
        .route("/reduces/{id}", put(save_reduce).delete(delete_reduce))
}

fn repo(state: &AppState) -> ArticleRepository {
    ArticleRepository::new((*state.db).clone())
}

/// Request body of an article.
#[derive(Debug, Deserialize)]
pub struct ArticleRequest {
    /// Unique reference.
    pub reference: String,
    /// Default designation.
    pub designation: String,
    /// Default price.
    pub price: Decimal,
    /// Unit label.
    #[serde(default)]
    pub unit: String,
    /// Revenue account.
    pub sell_account: String,
    /// VAT rate.
    pub vat_id: Option<VatId>,
    /// Stock management.
    #[serde(default)]
    pub stockable: Stockable,
    /// Categories.
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
}

impl From<ArticleRequest> for ArticleInput {
    fn from(req: ArticleRequest) -> Self {
        Self {
            reference: req.reference,
            designation: req.designation,
            price: req.price,
            unit: req.unit,
            sell_account: req.sell_account,
            vat_id: req.vat_id,
            stockable: req.stockable,
            category_ids: req.category_ids,
        }
    }
}

/// Query of the article list.
#[derive(Debug, Deserialize)]
pub struct ArticleQuery {
    /// Also list disabled articles.
    #[serde(default)]
    pub include_disabled: bool,
}

/// Request body toggling an article.
#[derive(Debug, Deserialize)]
pub struct DisabledRequest {
    /// Hidden from new documents.
    pub disabled: bool,
}

// ========== VAT ==========

/// GET `/vats`
async fn list_vats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let vats = repo(&state).list_vats().await?;
    Ok(Json(json!({ "vats": vats })))
}

/// PUT `/vats/{id}`
async fn save_vat(
    State(state): State<AppState>,
    Path(id): Path<VatId>,
    Json(mut payload): Json<Vat>,
) -> Result<impl IntoResponse, ApiError> {
    payload.id = id;
    repo(&state).save_vat(&payload).await?;
    Ok(Json(payload))
}

/// DELETE `/vats/{id}`
async fn delete_vat(State(state): State<AppState>, Path(id): Path<VatId>) -> Result<StatusCode, ApiError> {
    repo(&state).delete_vat(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Articles ==========

/// GET `/articles`
async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ArticleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let articles = repo(&state).list_articles(query.include_disabled).await?;
    Ok(Json(json!({ "articles": articles })))
}

/// GET `/articles/{id}`
async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<ArticleId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).find_article(id).await?))
}

/// POST `/articles`
async fn create_article(
    State(state): State<AppState>,
    Json(payload): Json<ArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let article = repo(&state).create_article(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

/// PUT `/articles/{id}`
async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<ArticleId>,
    Json(payload): Json<ArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).update_article(id, payload.into()).await?))
}

/// POST `/articles/{id}/disabled`
async fn set_disabled(
    State(state): State<AppState>,
    Path(id): Path<ArticleId>,
    Json(payload): Json<DisabledRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).set_article_disabled(id, payload.disabled).await?))
}

/// DELETE `/articles/{id}` - a used article is disabled instead.
async fn delete_article(State(state): State<AppState>, Path(id): Path<ArticleId>) -> Result<StatusCode, ApiError> {
    repo(&state).delete_article(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Categories ==========

/// GET `/categories`
async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let categories = repo(&state).list_categories().await?;
    Ok(Json(json!({ "categories": categories })))
}

/// PUT `/categories/{id}`
async fn save_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(mut payload): Json<Category>,
) -> Result<impl IntoResponse, ApiError> {
    payload.id = id;
    repo(&state).save_category(&payload).await?;
    Ok(Json(payload))
}

/// DELETE `/categories/{id}`
async fn delete_category(State(state): State<AppState>, Path(id): Path<CategoryId>) -> Result<StatusCode, ApiError> {
    repo(&state).delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/bill-categories`
async fn list_category_bills(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let categories = repo(&state).list_category_bills().await?;
    Ok(Json(json!({ "bill_categories": categories })))
}

/// PUT `/bill-categories/{id}`
async fn save_category_bill(
    State(state): State<AppState>,
    Path(id): Path<CategoryBillId>,
    Json(mut payload): Json<CategoryBill>,
) -> Result<impl IntoResponse, ApiError> {
    payload.id = id;
    repo(&state).save_category_bill(&payload).await?;
    Ok(Json(payload))
}

/// DELETE `/bill-categories/{id}`
async fn delete_category_bill(
    State(state): State<AppState>,
    Path(id): Path<CategoryBillId>,
) -> Result<StatusCode, ApiError> {
    repo(&state).delete_category_bill(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Automatic Reductions ==========

/// GET `/reduces`
async fn list_reduces(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let reduces = repo(&state).list_reduces().await?;
    Ok(Json(json!({ "reduces": reduces })))
}

/// PUT `/reduces/{id}`
async fn save_reduce(
    State(state): State<AppState>,
    Path(id): Path<AutomaticReduceId>,
    Json(mut payload): Json<AutomaticReduce>,
) -> Result<impl IntoResponse, ApiError> {
    payload.id = id;
    repo(&state).save_reduce(&payload).await?;
    Ok(Json(payload))
}

/// DELETE `/reduces/{id}`
async fn delete_reduce(
    State(state): State<AppState>,
    Path(id): Path<AutomaticReduceId>,
) -> Result<StatusCode, ApiError> {
    repo(&state).delete_reduce(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
