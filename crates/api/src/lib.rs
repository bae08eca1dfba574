//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes for bookkeeping, invoicing, payoffs and stock
//! - Conversion of repository errors into JSON error bodies
//! - The PayPal notification verifier

pub mod error;
pub mod paypal;
pub mod routes;

use axum::Router;
use diacamma_core::accounting::AccountingParams;
use diacamma_core::invoice::InvoiceParams;
use diacamma_core::payoff::PaymentVerifier;
use diacamma_shared::AppConfig;
use diacamma_shared::types::CurrencyFormat;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Checks payment notifications with their provider.
    pub payment_verifier: Arc<dyn PaymentVerifier>,
}

impl AppState {
    /// Cash and fee accounts with the currency.
    #[must_use]
    pub fn accounting_params(&self) -> AccountingParams {
        diacamma_db::accounting_params(&self.config)
    }

    /// VAT mode and posting accounts of documents.
    #[must_use]
    pub fn invoice_params(&self) -> InvoiceParams {
        diacamma_db::invoice_params(&self.config)
    }

    /// Currency of the amounts.
    #[must_use]
    pub fn currency(&self) -> CurrencyFormat {
        self.accounting_params().currency
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use diacamma_core::payoff::{PaymentError, VerifyResult};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct AlwaysVerified;

    #[async_trait]
    impl PaymentVerifier for AlwaysVerified {
        async fn verify(&self, _fields: &[(String, String)]) -> Result<VerifyResult, PaymentError> {
            Ok(VerifyResult::Verified)
        }
    }

    fn state() -> AppState {
        let config = AppConfig::from_toml("[database]\nurl = \"postgres://localhost/diacamma\"").unwrap();
        AppState {
            db: Arc::new(DatabaseConnection::Disconnected),
            config: Arc::new(config),
            payment_verifier: Arc::new(AlwaysVerified),
        }
    }

    #[tokio::test]
    async fn test_health_reports_database_down() {
        let response = create_router(state())
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["database"], "down");
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected() {
        let response = create_router(state())
            .oneshot(Request::get("/api/v1/bills/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_order_needs_a_json_body() {
        let uri = format!("/api/v1/bills/{}/order", diacamma_shared::types::BillId::new());
        let response = create_router(state())
            .oneshot(Request::post(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = create_router(state())
            .oneshot(Request::get("/api/v1/nothing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_params_follow_config() {
        let state = state();
        assert_eq!(state.currency().precision, 2);
        assert_eq!(state.invoice_params().default_sell_account, "706");
    }
}
