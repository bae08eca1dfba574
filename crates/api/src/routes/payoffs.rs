//! Payoff, bank account, payment method and online payment routes.

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{NaiveDate, Utc};
use diacamma_core::payoff::{BankAccount, PaymentMethod, PayoffInput};
use diacamma_db::PayoffRepository;
use diacamma_shared::types::{BankAccountId, BillId, PaymentMethodId, PayoffId, ThirdId};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{ApiError, AppState};

/// Creates the payoff routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/supportings", get(unpaid))
        .route("/supportings/{id}", get(get_supporting))
        .route("/payoffs", get(list_payoffs).post(create_payoff))
        .route("/payoffs/internal", post(internal_payoff))
        .route("/payoffs/{id}", put(edit_payoff).delete(delete_payoff))
        .route("/bank-accounts", get(list_bank_accounts))
        .route("/bank-accounts/{id}", put(save_bank_account))
        .route("/payment-methods", get(list_methods))
        .route("/payment-methods/{id}", put(save_method).delete(delete_method))
        .route("/bank-transactions", get(list_transactions))
        .route("/payments/paypal", post(paypal_notification))
}

fn repo(state: &AppState) -> PayoffRepository {
    PayoffRepository::new((*state.db).clone(), state.accounting_params(), state.invoice_params())
}

/// Query of the unpaid documents.
#[derive(Debug, Deserialize)]
pub struct UnpaidQuery {
    /// Customer.
    pub third_id: ThirdId,
}

/// Query of the payoff list.
#[derive(Debug, Deserialize)]
pub struct PayoffQuery {
    /// Paid document.
    pub bill_id: BillId,
}

/// Request body of a payoff, split over one or more documents.
#[derive(Debug, Deserialize)]
pub struct CreatePayoffRequest {
    /// Paid documents.
    pub bill_ids: Vec<BillId>,
    /// Payment.
    pub payoff: PayoffInput,
}

/// Request body of an internal payoff between a credit note and a bill.
#[derive(Debug, Deserialize)]
pub struct InternalRequest {
    /// Document paying.
    pub source_id: BillId,
    /// Document paid.
    pub linked_id: BillId,
    /// Payment date.
    pub date: NaiveDate,
}

/// GET `/supportings?third_id=`
async fn unpaid(State(state): State<AppState>, Query(query): Query<UnpaidQuery>) -> Result<impl IntoResponse, ApiError> {
    let supportings = repo(&state).unpaid(query.third_id).await?;
    Ok(Json(json!({ "supportings": supportings })))
}

/// GET `/supportings/{id}` - document with its payoffs and rest to pay.
async fn get_supporting(
    State(state): State<AppState>,
    Path(id): Path<BillId>,
) -> Result<impl IntoResponse, ApiError> {
    let supporting = repo(&state).find_supporting(id).await?;
    let rest = supporting.rest_to_pay();
    Ok(Json(json!({ "supporting": supporting, "rest_to_pay": rest })))
}

/// GET `/payoffs?bill_id=`
async fn list_payoffs(
    State(state): State<AppState>,
    Query(query): Query<PayoffQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let payoffs = repo(&state).list(query.bill_id).await?;
    Ok(Json(json!({ "payoffs": payoffs })))
}

/// POST `/payoffs`
async fn create_payoff(
    State(state): State<AppState>,
    Json(payload): Json<CreatePayoffRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let group = repo(&state).save(&payload.bill_ids, &payload.payoff).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// PUT `/payoffs/{id}`
async fn edit_payoff(
    State(state): State<AppState>,
    Path(id): Path<PayoffId>,
    Json(payload): Json<PayoffInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repo(&state).edit(id, &payload).await?))
}

/// DELETE `/payoffs/{id}`
async fn delete_payoff(State(state): State<AppState>, Path(id): Path<PayoffId>) -> Result<StatusCode, ApiError> {
    repo(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/payoffs/internal`
async fn internal_payoff(
    State(state): State<AppState>,
    Json(payload): Json<InternalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (source, linked) = repo(&state)
        .internal(payload.source_id, payload.linked_id, payload.date)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "source": source, "linked": linked }))))
}

/// GET `/bank-accounts`
async fn list_bank_accounts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let accounts = repo(&state).list_bank_accounts().await?;
    Ok(Json(json!({ "bank_accounts": accounts })))
}

/// PUT `/bank-accounts/{id}`
async fn save_bank_account(
    State(state): State<AppState>,
    Path(id): Path<BankAccountId>,
    Json(mut payload): Json<BankAccount>,
) -> Result<impl IntoResponse, ApiError> {
    payload.id = id;
    repo(&state).save_bank_account(&payload).await?;
    Ok(Json(payload))
}

/// GET `/payment-methods`
async fn list_methods(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let methods = repo(&state).list_methods().await?;
    Ok(Json(json!({ "payment_methods": methods })))
}

/// PUT `/payment-methods/{id}`
async fn save_method(
    State(state): State<AppState>,
    Path(id): Path<PaymentMethodId>,
    Json(mut payload): Json<PaymentMethod>,
) -> Result<impl IntoResponse, ApiError> {
    payload.id = id;
    repo(&state).save_method(&payload).await?;
    Ok(Json(payload))
}

/// DELETE `/payment-methods/{id}`
async fn delete_method(
    State(state): State<AppState>,
    Path(id): Path<PaymentMethodId>,
) -> Result<StatusCode, ApiError> {
    repo(&state).delete_method(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/bank-transactions`
async fn list_transactions(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let transactions = repo(&state).list_transactions().await?;
    Ok(Json(json!({ "bank_transactions": transactions })))
}

/// POST `/payments/paypal` - PayPal instant payment notification.
///
/// Every notification is recorded as a bank transaction, successful or not.
async fn paypal_notification(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction = repo(&state)
        .confirm_external_payment(state.payment_verifier.as_ref(), &fields, Utc::now())
        .await?;
    info!(transaction_id = %transaction.id, status = ?transaction.status, "payment notification recorded");
    Ok(Json(transaction))
}
