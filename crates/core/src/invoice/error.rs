//! Invoicing error types.

use diacamma_shared::types::{ArticleId, BillId};
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{BillStatus, BillType};
use crate::accounting::AccountingError;

/// Errors that can occur while building, validating or transforming documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceError {
    // ========== Detail Errors ==========
    /// Quantity must be positive.
    #[error("Quantity must be positive")]
    InvalidQuantity,

    /// Price cannot be negative.
    #[error("Price cannot be negative")]
    NegativePrice,

    /// Reduction outside `0..=gross`.
    #[error("Reduction {reduce} must be between 0 and {gross}")]
    InvalidReduce {
        /// Requested reduction.
        reduce: Decimal,
        /// Line gross amount.
        gross: Decimal,
    },

    /// Article missing from the catalog.
    #[error("Article not found: {0}")]
    ArticleNotFound(ArticleId),

    /// Article is disabled.
    #[error("Article {0} is disabled")]
    ArticleDisabled(String),

    // ========== Document State Errors ==========
    /// Document not editable.
    #[error("Document {0} is not building")]
    NotBuilding(BillId),

    /// Transition not allowed from this state.
    #[error("Cannot {action} a {bill_type:?} in status {status:?}")]
    InvalidTransition {
        /// Requested transition.
        action: &'static str,
        /// Document type.
        bill_type: BillType,
        /// Current status.
        status: BillStatus,
    },

    /// Document fails its checks.
    #[error("Document cannot be validated: {}", .0.join(", "))]
    CheckFailed(Vec<String>),

    /// Third has no customer account.
    #[error("Third has no customer account")]
    NoCustomerAccount,

    // ========== Reduction Rule Errors ==========
    /// Rule amount out of range.
    #[error("Invalid reduction rule: {0}")]
    InvalidReduceRule(String),

    // ========== Accounting Errors ==========
    /// Ledger rule violated while posting.
    #[error(transparent)]
    Accounting(#[from] AccountingError),
}

impl InvoiceError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::NegativePrice => "NEGATIVE_PRICE",
            Self::InvalidReduce { .. } => "INVALID_REDUCE",
            Self::ArticleNotFound(_) => "ARTICLE_NOT_FOUND",
            Self::ArticleDisabled(_) => "ARTICLE_DISABLED",
            Self::NotBuilding(_) => "BILL_NOT_BUILDING",
            Self::InvalidTransition { .. } => "INVALID_BILL_TRANSITION",
            Self::CheckFailed(_) => "BILL_CHECK_FAILED",
            Self::NoCustomerAccount => "NO_CUSTOMER_ACCOUNT",
            Self::InvalidReduceRule(_) => "INVALID_REDUCE_RULE",
            Self::Accounting(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidQuantity
            | Self::NegativePrice
            | Self::InvalidReduce { .. }
            | Self::InvalidReduceRule(_)
            | Self::ArticleDisabled(_) => 400,
            Self::ArticleNotFound(_) => 404,
            Self::NotBuilding(_)
            | Self::InvalidTransition { .. }
            | Self::CheckFailed(_)
            | Self::NoCustomerAccount => 422,
            Self::Accounting(e) => e.http_status_code(),
        }
    }
}
