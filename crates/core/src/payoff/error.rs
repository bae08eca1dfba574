//! Payoff and payment method error types.

use diacamma_shared::types::{BillId, PayoffId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::accounting::AccountingError;

/// Errors raised while recording, splitting or deleting payoffs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayoffError {
    // ========== Amount Errors ==========
    /// Amount is zero.
    #[error("Payoff amount cannot be zero")]
    ZeroAmount,

    /// Amount outside the accepted range.
    #[error("Amount {amount} must be between {min} and {max}")]
    AmountOutOfBounds {
        /// Requested amount.
        amount: Decimal,
        /// Lowest accepted amount.
        min: Decimal,
        /// Highest accepted amount.
        max: Decimal,
    },

    /// Fee negative or not below the amount.
    #[error("Bank fee {fee} must be between 0 and {amount}")]
    InvalidFee {
        /// Requested fee.
        fee: Decimal,
        /// Payoff amount.
        amount: Decimal,
    },

    // ========== Supporting Errors ==========
    /// No document to pay.
    #[error("No supporting selected")]
    NoSupporting,

    /// Document not valid or not a payable type.
    #[error("Document {0} cannot receive payoffs")]
    NotPayable(BillId),

    /// Internal payoffs need a credit note and a bill of the same third.
    #[error("Internal payoff needs a credit note and a bill of the same third")]
    InvalidInternalPair,

    // ========== Mode Errors ==========
    /// Bank account missing for a non cash mode.
    #[error("Bank account required for this payoff mode")]
    BankAccountRequired,

    /// Bank account disabled.
    #[error("Bank account {0} is disabled")]
    BankAccountDisabled(String),

    /// Internal payoffs are created in pairs only.
    #[error("Internal payoffs are created from a linked document")]
    InternalModeReserved,

    // ========== Deletion Errors ==========
    /// Payoff missing.
    #[error("Payoff not found: {0}")]
    PayoffNotFound(PayoffId),

    /// Payment entry already closed.
    #[error("Payoff {0} has a closed entry")]
    PayoffEntryClosed(PayoffId),

    // ========== Accounting Errors ==========
    /// Ledger rule violated.
    #[error(transparent)]
    Accounting(#[from] AccountingError),
}

impl PayoffError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "PAYOFF_ZERO_AMOUNT",
            Self::AmountOutOfBounds { .. } => "PAYOFF_AMOUNT_OUT_OF_BOUNDS",
            Self::InvalidFee { .. } => "INVALID_BANK_FEE",
            Self::NoSupporting => "NO_SUPPORTING",
            Self::NotPayable(_) => "NOT_PAYABLE",
            Self::InvalidInternalPair => "INVALID_INTERNAL_PAIR",
            Self::BankAccountRequired => "BANK_ACCOUNT_REQUIRED",
            Self::BankAccountDisabled(_) => "BANK_ACCOUNT_DISABLED",
            Self::InternalModeReserved => "INTERNAL_MODE_RESERVED",
            Self::PayoffNotFound(_) => "PAYOFF_NOT_FOUND",
            Self::PayoffEntryClosed(_) => "PAYOFF_ENTRY_CLOSED",
            Self::Accounting(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ZeroAmount
            | Self::AmountOutOfBounds { .. }
            | Self::InvalidFee { .. }
            | Self::NoSupporting
            | Self::BankAccountRequired
            | Self::InternalModeReserved => 400,
            Self::PayoffNotFound(_) => 404,
            Self::NotPayable(_)
            | Self::InvalidInternalPair
            | Self::BankAccountDisabled(_)
            | Self::PayoffEntryClosed(_) => 422,
            Self::Accounting(e) => e.http_status_code(),
        }
    }
}

/// Errors raised by payment methods and external payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    // ========== Method Configuration Errors ==========
    /// Wrong number of configuration values.
    #[error("Payment method expects {expected} values, got {got}")]
    ExtraDataCount {
        /// Expected count.
        expected: usize,
        /// Given count.
        got: usize,
    },

    /// IBAN malformed or with a bad checksum.
    #[error("Invalid IBAN: {0}")]
    InvalidIban(String),

    /// BIC malformed.
    #[error("Invalid BIC: {0}")]
    InvalidBic(String),

    /// Cheque payee empty.
    #[error("Payee is required")]
    PayeeRequired,

    /// Email without `@`.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// URL not starting with `http`.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // ========== Confirmation Errors ==========
    /// No PayPal method registered for the receiver.
    #[error("No paypal account!")]
    NoPaypalAccount,

    /// Notification without a document reference.
    #[error("No supporting in payment notification")]
    MissingSupporting,

    /// Notification amount unreadable.
    #[error("Invalid payment amount: {0}")]
    InvalidAmount(String),

    /// Verification endpoint unreachable.
    #[error("Payment verification failed: {0}")]
    VerificationFailed(String),
}

impl PaymentError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ExtraDataCount { .. } => "PAYMENT_EXTRA_DATA_COUNT",
            Self::InvalidIban(_) => "INVALID_IBAN",
            Self::InvalidBic(_) => "INVALID_BIC",
            Self::PayeeRequired => "PAYEE_REQUIRED",
            Self::InvalidEmail(_) => "INVALID_EMAIL",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::NoPaypalAccount => "NO_PAYPAL_ACCOUNT",
            Self::MissingSupporting => "MISSING_SUPPORTING",
            Self::InvalidAmount(_) => "INVALID_PAYMENT_AMOUNT",
            Self::VerificationFailed(_) => "PAYMENT_VERIFICATION_FAILED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::VerificationFailed(_) => 502,
            Self::NoPaypalAccount | Self::MissingSupporting => 422,
            _ => 400,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VerificationFailed(_))
    }
}
