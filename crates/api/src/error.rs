//! Conversion of repository errors into JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use diacamma_core::accounting::AccountingError;
use diacamma_core::invoice::InvoiceError;
use diacamma_core::payoff::{PaymentError, PayoffError};
use diacamma_core::storage::StorageError;
use diacamma_db::repositories::{
    ArticleError, BillError, CostAccountingError, EntryError, FiscalError, PayoffRepoError, StockError, ThirdError,
};
use diacamma_shared::AppError;
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

/// Error returned by every handler, rendered as `{"error": code, "message": text}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Request rejected before reaching a repository.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// The wrapped application error.
    #[must_use]
    pub const fn inner(&self) -> &AppError {
        &self.0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if self.0.is_internal() {
            error!(error = %self.0, "request failed");
            "An error occurred".to_string()
        } else {
            self.0.to_string()
        };
        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

// ========== Domain Errors ==========

macro_rules! domain_error {
    ($($error:ty),+ $(,)?) => {
        $(
            impl From<$error> for ApiError {
                fn from(err: $error) -> Self {
                    Self(AppError::domain(err.error_code(), err.http_status_code(), err.to_string()))
                }
            }
        )+
    };
}

domain_error!(AccountingError, InvoiceError, PayoffError, PaymentError, StorageError);

fn not_found(err: &impl ToString) -> ApiError {
    ApiError(AppError::NotFound(err.to_string()))
}

// ========== Repository Errors ==========

impl From<FiscalError> for ApiError {
    fn from(err: FiscalError) -> Self {
        match err {
            FiscalError::YearNotFound(_) | FiscalError::JournalNotFound(_) => not_found(&err),
            FiscalError::Accounting(e) => e.into(),
            FiscalError::Database(e) => e.into(),
        }
    }
}

impl From<ThirdError> for ApiError {
    fn from(err: ThirdError) -> Self {
        match err {
            ThirdError::NotFound(_) => not_found(&err),
            ThirdError::Accounting(e) => e.into(),
            ThirdError::Database(e) => e.into(),
        }
    }
}

impl From<EntryError> for ApiError {
    fn from(err: EntryError) -> Self {
        match err {
            EntryError::NotFound(_) | EntryError::YearNotFound(_) | EntryError::ModelNotFound(_) => not_found(&err),
            EntryError::Accounting(e) => e.into(),
            EntryError::Database(e) => e.into(),
        }
    }
}

impl From<CostAccountingError> for ApiError {
    fn from(err: CostAccountingError) -> Self {
        match err {
            CostAccountingError::NotFound(_) => not_found(&err),
            CostAccountingError::Accounting(e) => e.into(),
            CostAccountingError::Database(e) => e.into(),
        }
    }
}

impl From<ArticleError> for ApiError {
    fn from(err: ArticleError) -> Self {
        match err {
            ArticleError::NotFound(_) | ArticleError::ReduceNotFound(_) => not_found(&err),
            ArticleError::DuplicateReference(_) | ArticleError::VatInUse(_) => {
                Self(AppError::Conflict(err.to_string()))
            }
            ArticleError::EmptyReference | ArticleError::InvalidVatRate(_) => Self::validation(err.to_string()),
            ArticleError::Invoice(e) => e.into(),
            ArticleError::Database(e) => e.into(),
        }
    }
}

impl From<BillError> for ApiError {
    fn from(err: BillError) -> Self {
        match err {
            BillError::NotFound(_)
            | BillError::DetailNotFound(_)
            | BillError::ThirdNotFound(_)
            | BillError::YearNotFound(_) => not_found(&err),
            BillError::Invoice(e) => e.into(),
            BillError::Storage(e) => e.into(),
            BillError::Database(e) => e.into(),
        }
    }
}

impl From<PayoffRepoError> for ApiError {
    fn from(err: PayoffRepoError) -> Self {
        match err {
            PayoffRepoError::NotFound(_)
            | PayoffRepoError::BillNotFound(_)
            | PayoffRepoError::BankAccountNotFound(_)
            | PayoffRepoError::MethodNotFound(_) => not_found(&err),
            PayoffRepoError::Payoff(e) => e.into(),
            PayoffRepoError::Payment(e) => e.into(),
            PayoffRepoError::Invoice(e) => e.into(),
            PayoffRepoError::Bill(e) => e.into(),
            PayoffRepoError::Entry(e) => e.into(),
            PayoffRepoError::Database(e) => e.into(),
        }
    }
}

impl From<StockError> for ApiError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::AreaNotFound(_)
            | StockError::SheetNotFound(_)
            | StockError::DetailNotFound(_)
            | StockError::InventoryNotFound(_)
            | StockError::InventoryDetailNotFound(_) => not_found(&err),
            StockError::AreaInUse(_) => Self(AppError::Conflict(err.to_string())),
            StockError::Storage(e) => e.into(),
            StockError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diacamma_shared::types::{ArticleId, BillId, StorageAreaId};
    use http_body_util::BodyExt;
    use rstest::rstest;

    #[rstest]
    #[case(BillError::NotFound(BillId::new()).into(), 404, "NOT_FOUND")]
    #[case(ArticleError::DuplicateReference("ABC1".into()).into(), 409, "CONFLICT")]
    #[case(ArticleError::EmptyReference.into(), 400, "VALIDATION_ERROR")]
    #[case(StockError::AreaInUse(StorageAreaId::new()).into(), 409, "CONFLICT")]
    #[case(DbErr::Custom("boom".into()).into(), 500, "DATABASE_ERROR")]
    fn test_status_and_code(#[case] error: ApiError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(error.inner().status_code(), status);
        assert_eq!(error.inner().error_code(), code);
    }

    #[test]
    fn test_domain_error_keeps_its_code() {
        let error: ApiError = BillError::Storage(StorageError::ArticleNotFound(ArticleId::new())).into();
        let expected = StorageError::ArticleNotFound(ArticleId::new());
        assert_eq!(error.inner().error_code(), expected.error_code());
        assert_eq!(error.inner().status_code(), expected.http_status_code());
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let response = ApiError::from(DbErr::Custom("password=secret".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "DATABASE_ERROR");
        assert_eq!(json["message"], "An error occurred");
    }

    #[tokio::test]
    async fn test_client_errors_carry_message() {
        let response = ApiError::validation("date required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Validation error: date required");
    }
}
