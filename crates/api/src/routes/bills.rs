//! Commercial document routes: quotations, bills, credit notes, receipts.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::NaiveDate;
use diacamma_core::invoice::{BillStatus, BillType};
use diacamma_core::payoff::PayoffInput;
use diacamma_db::{BillRepository, PayoffRepository};
use diacamma_db::repositories::{BillFilter, CreateBillInput, DetailInput};
use diacamma_shared::types::{
    ArticleId, BillId, CategoryBillId, CostAccountingId, DetailId, FiscalYearId, StorageAreaId, ThirdId,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::today;
use crate::{ApiError, AppState};

/// Creates the document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bills", get(list_bills).post(create_bill))
        .route("/bills/reduces", post(recompute_reduces))
        .route("/bills/statistics", get(statistics))
        .route("/bills/{id}", get(get_bill).put(update_bill).delete(delete_bill))
        .route("/bills/{id}/details", post(save_detail))
        .route("/bills/{id}/details/{detail_id}", delete(remove_detail))
        .route("/bills/{id}/check", get(check_bill))
        .route("/bills/{id}/validate", post(validate_bill))
        .route("/bills/{id}/cancel", post(cancel_bill))
        .route("/bills/{id}/archive", post(archive_bill))
        .route("/bills/{id}/transform", post(transform_bill))
        .route("/bills/{id}/order", post(order_quotation))
        .route("/bills/{id}/quotation", post(cart_to_quotation))
        .route("/bills/{id}/clone", post(clone_quotation))
}

fn repo(state: &AppState) -> BillRepository {
    BillRepository::new((*state.db).clone(), state.invoice_params())
}

fn payoff_repo(state: &AppState) -> PayoffRepository {
    PayoffRepository::new((*state.db).clone(), state.accounting_params(), state.invoice_params())
}

/// Query of the document list.
#[derive(Debug, Default, Deserialize)]
pub struct BillQuery {
    /// Kind.
    pub bill_type: Option<BillType>,
    /// Status.
    pub status: Option<BillStatus>,
    /// Customer.
    pub third_id: Option<ThirdId>,
    /// Fiscal year.
    pub year_id: Option<FiscalYearId>,
}

/// Request body for creating a document.
#[derive(Debug, Deserialize)]
pub struct CreateBillRequest {
    /// Kind.
    pub bill_type: BillType,
    /// Document date.
    pub date: NaiveDate,
    /// Customer.
    pub third_id: Option<ThirdId>,
    /// Comment.
    #[serde(default)]
    pub comment: String,
    /// Category, the default one when absent.
    pub category_id: Option<CategoryBillId>,
    /// Analytic tag.
    pub cost_accounting_id: Option<CostAccountingId>,
}

/// Request body for updating a building document.
#[derive(Debug, Deserialize)]
pub struct UpdateBillRequest {
    /// Document date.
    pub date: NaiveDate,
    /// Customer.
    pub third_id: Option<ThirdId>,
    /// Comment.
    #[serde(default)]
    pub comment: String,
}

/// Request body of a document line.
#[derive(Debug, Default, Deserialize)]
pub struct DetailRequest {
    /// Line to replace.
    pub id: Option<DetailId>,
    /// Article.
    pub article_id: Option<ArticleId>,
    /// Designation override.
    pub designation: Option<String>,
    /// Unit price override.
    pub price: Option<Decimal>,
    /// Unit override.
    pub unit: Option<String>,
    /// Quantity.
    pub quantity: Decimal,
    /// Reduction amount.
    #[serde(default)]
    pub reduce: Decimal,
    /// VAT rate of a free line.
    pub vat_rate: Option<Decimal>,
    /// Storage area of stocked articles.
    pub storagearea_id: Option<StorageAreaId>,
}

impl From<DetailRequest> for DetailInput {
    fn from(req: DetailRequest) -> Self {
        Self {
            id: req.id,
            article_id: req.article_id,
            designation: req.designation,
            price: req.price,
            unit: req.unit,
            quantity: req.quantity,
            reduce: req.reduce,
            vat_rate: req.vat_rate,
            storagearea_id: req.storagearea_id,
        }
    }
}

/// Request body for recomputing the automatic reductions of a customer.
#[derive(Debug, Deserialize)]
pub struct ReduceRequest {
    /// Customer.
    pub third_id: ThirdId,
    /// Reference date, today when absent.
    pub date: Option<NaiveDate>,
}

/// Query of the sales statistics.
#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    /// Fiscal year.
    pub year_id: FiscalYearId,
    /// Amounts before reductions.
    #[serde(default)]
    pub without_reduce: bool,
}

/// Request body turning a quotation into an order; `{}` without down payment.
#[derive(Debug, Default, Deserialize)]
pub struct OrderRequest {
    /// Down payment recorded on the order.
    #[serde(default)]
    pub payoff: Option<PayoffInput>,
}

/// GET `/bills`
async fn list_bills(
    State(state): State<AppState>,
    Query(query): Query<BillQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = BillFilter {
        bill_type: query.bill_type,
        status: query.status,
        third_id: query.third_id,
        year_id: query.year_id,
    };
    let bills: Vec<_> = repo(&state)
        .list(filter)
        .await?
        .into_iter()
        .map(|(bill, details)| json!({ "bill": bill, "details": details }))
        .collect();
    Ok(Json(json!({ "bills": bills })))
}

/// GET `/bills/{id}` - document, lines and totals.
async fn get_bill(State(state): State<AppState>, Path(id): Path<BillId>) -> Result<impl IntoResponse, ApiError> {
    let repo = repo(&state);
    let (bill, details) = repo.find(id).await?;
    let totals = repo.totals(id).await?;
    Ok(Json(json!({ "bill": bill, "details": details, "totals": totals })))
}

/// POST `/bills`
async fn create_bill(
    State(state): State<AppState>,
    Json(payload): Json<CreateBillRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let bill = repo(&state)
        .create(CreateBillInput {
            bill_type: payload.bill_type,
            date: payload.date,
            third_id: payload.third_id,
            comment: payload.comment,
            category_id: payload.category_id,
            cost_accounting_id: payload.cost_accounting_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(bill)))
}

/// PUT `/bills/{id}`
async fn update_bill(
    State(state): State<AppState>,
    Path(id): Path<BillId>,
    Json(payload): Json<UpdateBillRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let bill = repo(&state)
        .update(id, payload.date, payload.third_id, &payload.comment)
        .await?;
    Ok(Json(bill))
}

/// DELETE `/bills/{id}`
async fn delete_bill(State(state): State<AppState>, Path(id): Path<BillId>) -> Result<StatusCode, ApiError> {
    repo(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/bills/{id}/details`
async fn save_detail(
    State(state): State<AppState>,
    Path(id): Path<BillId>,
    Json(payload): Json<DetailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).save_detail(id, payload.into()).await?))
}

/// DELETE `/bills/{id}/details/{detail_id}`
async fn remove_detail(
    State(state): State<AppState>,
    Path((id, detail_id)): Path<(BillId, DetailId)>,
) -> Result<StatusCode, ApiError> {
    repo(&state).remove_detail(id, detail_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/bills/{id}/check` - reasons preventing validation.
async fn check_bill(State(state): State<AppState>, Path(id): Path<BillId>) -> Result<impl IntoResponse, ApiError> {
    let warnings = repo(&state).check_info(id).await?;
    Ok(Json(json!({ "warnings": warnings })))
}

/// POST `/bills/{id}/validate`
async fn validate_bill(
    State(state): State<AppState>,
    Path(id): Path<BillId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).validate(id).await?))
}

/// POST `/bills/{id}/cancel` - returns the credit note of a valid bill.
async fn cancel_bill(State(state): State<AppState>, Path(id): Path<BillId>) -> Result<impl IntoResponse, ApiError> {
    let asset = repo(&state).cancel(id, today()).await?;
    Ok(Json(json!({ "asset": asset })))
}

/// POST `/bills/{id}/archive`
async fn archive_bill(State(state): State<AppState>, Path(id): Path<BillId>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).archive(id).await?))
}

/// POST `/bills/{id}/transform` - turns a quotation into a bill.
async fn transform_bill(
    State(state): State<AppState>,
    Path(id): Path<BillId>,
) -> Result<impl IntoResponse, ApiError> {
    let bill = repo(&state).transform_to_bill(id, today()).await?;
    Ok((StatusCode::CREATED, Json(bill)))
}

/// POST `/bills/{id}/order` - turns a valid quotation into an order,
/// with an optional down payment.
async fn order_quotation(
    State(state): State<AppState>,
    Path(id): Path<BillId>,
    Json(payload): Json<OrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (order, group) = payoff_repo(&state)
        .order_quotation(id, today(), payload.payoff.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "order": order, "payoff": group }))))
}

/// POST `/bills/{id}/quotation` - turns a valid cart into a quotation.
async fn cart_to_quotation(
    State(state): State<AppState>,
    Path(id): Path<BillId>,
) -> Result<impl IntoResponse, ApiError> {
    let quotation = repo(&state).cart_to_quotation(id, today()).await?;
    Ok((StatusCode::CREATED, Json(quotation)))
}

/// POST `/bills/{id}/clone` - new building copy of a quotation.
async fn clone_quotation(
    State(state): State<AppState>,
    Path(id): Path<BillId>,
) -> Result<impl IntoResponse, ApiError> {
    let quotation = repo(&state).clone_quotation(id, today()).await?;
    Ok((StatusCode::CREATED, Json(quotation)))
}

/// GET `/bills/statistics?year_id=`
async fn statistics(
    State(state): State<AppState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).statistics(query.year_id, query.without_reduce).await?))
}

/// POST `/bills/reduces`
async fn recompute_reduces(
    State(state): State<AppState>,
    Json(payload): Json<ReduceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let date = payload.date.unwrap_or_else(today);
    let changed = repo(&state).recompute_reduces(payload.third_id, date).await?;
    info!(third_id = %payload.third_id, changed, "automatic reductions recomputed");
    Ok(Json(json!({ "changed": changed })))
}
