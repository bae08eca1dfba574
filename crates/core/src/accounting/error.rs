//! Accounting error types.
//!
//! Every rule of the chart, the third ledger, fiscal years, journals,
//! entries and lettering reports its failure through [`AccountingError`].

use chrono::NaiveDate;
use diacamma_shared::types::{CostAccountingId, EntryId, EntryLineId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during bookkeeping operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountingError {
    // ========== Chart Errors ==========
    /// Account code is malformed or not part of the chart.
    #[error("Invalid account code: {0}")]
    InvalidAccountCode(String),

    /// Account code is not present in the fiscal year chart.
    #[error("Account {0} not found in the chart of accounts")]
    AccountNotFound(String),

    /// Account code already exists in the fiscal year chart.
    #[error("Account {0} already exists")]
    AccountAlreadyExists(String),

    /// Account still has entry lines.
    #[error("Account {0} has entries")]
    AccountHasEntries(String),

    // ========== Third Errors ==========
    /// Code is not a third account.
    #[error("Account {0} is not a third account")]
    NotThirdAccount(String),

    /// Third already owns this account.
    #[error("This third already has the account {0}")]
    ThirdAccountExists(String),

    /// Third account still has lines.
    #[error("This account has entries!")]
    ThirdAccountHasEntries,

    /// Line on a third account without a third.
    #[error("Line on third account {0} requires a third")]
    ThirdRequired(String),

    // ========== Fiscal Year Errors ==========
    /// Begin date must precede end date.
    #[error("Fiscal year begins ({begin}) after it ends ({end})")]
    InvalidYearBounds {
        /// First day.
        begin: NaiveDate,
        /// Last day.
        end: NaiveDate,
    },

    /// New fiscal year does not follow the last one.
    #[error("Fiscal year must begin on {expected}")]
    YearNotContiguous {
        /// Day after the end of the last year.
        expected: NaiveDate,
    },

    /// Only the last year can be changed.
    #[error("This fiscal year is not the last!")]
    YearNotLast,

    /// The fiscal year is finished and immutable.
    #[error("This fiscal year is finished!")]
    YearFinished,

    /// Action requires a specific year status.
    #[error("Fiscal year status does not allow this action")]
    InvalidYearStatus,

    /// Previous fiscal year has not begun.
    #[error("The previous fiscal year is still building")]
    PreviousYearBuilding,

    /// Previous fiscal year is not finished yet.
    #[error("The previous fiscal year is not finished")]
    PreviousYearNotFinished,

    /// Year still holds entries in progress.
    #[error("This fiscal year has {0} entries in progress")]
    YearHasBuildingEntries(usize),

    /// No fiscal year exists or none is active.
    #[error("No current fiscal year")]
    NoCurrentYear,

    /// Date outside the fiscal year.
    #[error("Date {date} is outside the fiscal year ({begin} - {end})")]
    DateOutsideYear {
        /// Date checked.
        date: NaiveDate,
        /// First day of the year.
        begin: NaiveDate,
        /// Last day of the year.
        end: NaiveDate,
    },

    // ========== Journal Errors ==========
    /// Reserved journals cannot be changed.
    #[error("journal reserved!")]
    JournalReserved,

    /// Journal still used by entries.
    #[error("Journal {0} is used by entries")]
    JournalInUse(i32),

    /// Journal name is empty.
    #[error("Journal name cannot be empty")]
    JournalNameEmpty,

    // ========== Entry Errors ==========
    /// Entry must have at least 2 lines.
    #[error("Entry must have at least 2 lines")]
    InsufficientLines,

    /// Entry is not balanced.
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },

    /// Line amount cannot be zero.
    #[error("Line amount cannot be zero")]
    ZeroAmount,

    /// A line must be debit or credit, not both.
    #[error("Line must specify either debit or credit, not both")]
    DebitAndCredit,

    /// Line not found in entry.
    #[error("Line not found: {0}")]
    LineNotFound(EntryLineId),

    /// Closed entries are immutable.
    #[error("Entry {0} is closed")]
    EntryClosed(EntryId),

    /// Entry has no third line.
    #[error("Entry {0} has no third line")]
    EntryWithoutThird(EntryId),

    /// Entry touches cash accounts.
    #[error("Entry {0} has cash lines")]
    EntryWithCash(EntryId),

    /// Model factor must be positive.
    #[error("Model factor must be positive")]
    InvalidFactor,

    // ========== Lettering Errors ==========
    /// Lettering needs two entries at least.
    #[error("Lettering requires at least 2 entries")]
    LetteringTooFewEntries,

    /// Entry is already lettered.
    #[error("Entry {0} is already lettered")]
    EntryAlreadyLettered(EntryId),

    /// Third lines of the entries use several thirds or accounts.
    #[error("Lettering must concern one third and one account")]
    LetteringMixedThirds,

    /// Third lines do not sum to zero.
    #[error("lettering not balanced: {0}")]
    LetteringNotBalanced(Decimal),

    /// Lettered entries belong to several fiscal years.
    #[error("Lettering must concern one fiscal year")]
    LetteringMixedYears,

    /// Entry is lettered.
    #[error("Entry {0} is lettered")]
    EntryLettered(EntryId),

    // ========== Cost Accounting Errors ==========
    /// Cost accounting not found.
    #[error("Cost accounting not found: {0}")]
    CostAccountingNotFound(CostAccountingId),

    /// Cost accounting still referenced by building entries.
    #[error("cost accounting has building entries")]
    CostAccountingHasBuildingEntries,

    /// Cost accounting still referenced by entries.
    #[error("cost accounting has entries")]
    CostAccountingHasEntries,

    /// Cost accounting is closed.
    #[error("cost accounting is closed")]
    CostAccountingClosed,

    /// Cost accounting name is empty.
    #[error("cost accounting name cannot be empty")]
    CostAccountingNameEmpty,
}

impl AccountingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAccountCode(_) => "INVALID_ACCOUNT_CODE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountAlreadyExists(_) => "ACCOUNT_ALREADY_EXISTS",
            Self::AccountHasEntries(_) => "ACCOUNT_HAS_ENTRIES",
            Self::NotThirdAccount(_) => "NOT_THIRD_ACCOUNT",
            Self::ThirdAccountExists(_) => "THIRD_ACCOUNT_EXISTS",
            Self::ThirdAccountHasEntries => "THIRD_ACCOUNT_HAS_ENTRIES",
            Self::ThirdRequired(_) => "THIRD_REQUIRED",
            Self::InvalidYearBounds { .. } => "INVALID_YEAR_BOUNDS",
            Self::YearNotContiguous { .. } => "YEAR_NOT_CONTIGUOUS",
            Self::YearNotLast => "YEAR_NOT_LAST",
            Self::YearFinished => "YEAR_FINISHED",
            Self::InvalidYearStatus => "INVALID_YEAR_STATUS",
            Self::PreviousYearBuilding => "PREVIOUS_YEAR_BUILDING",
            Self::PreviousYearNotFinished => "PREVIOUS_YEAR_NOT_FINISHED",
            Self::YearHasBuildingEntries(_) => "YEAR_HAS_BUILDING_ENTRIES",
            Self::NoCurrentYear => "NO_CURRENT_YEAR",
            Self::DateOutsideYear { .. } => "DATE_OUTSIDE_YEAR",
            Self::JournalReserved => "JOURNAL_RESERVED",
            Self::JournalInUse(_) => "JOURNAL_IN_USE",
            Self::JournalNameEmpty => "JOURNAL_NAME_EMPTY",
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::DebitAndCredit => "DEBIT_AND_CREDIT",
            Self::LineNotFound(_) => "LINE_NOT_FOUND",
            Self::EntryClosed(_) => "ENTRY_CLOSED",
            Self::EntryWithoutThird(_) => "ENTRY_WITHOUT_THIRD",
            Self::EntryWithCash(_) => "ENTRY_WITH_CASH",
            Self::InvalidFactor => "INVALID_FACTOR",
            Self::LetteringTooFewEntries => "LETTERING_TOO_FEW_ENTRIES",
            Self::EntryAlreadyLettered(_) => "ENTRY_ALREADY_LETTERED",
            Self::LetteringMixedThirds => "LETTERING_MIXED_THIRDS",
            Self::LetteringNotBalanced(_) => "LETTERING_NOT_BALANCED",
            Self::LetteringMixedYears => "LETTERING_MIXED_YEARS",
            Self::EntryLettered(_) => "ENTRY_LETTERED",
            Self::CostAccountingNotFound(_) => "COST_ACCOUNTING_NOT_FOUND",
            Self::CostAccountingHasBuildingEntries => "COST_ACCOUNTING_HAS_BUILDING_ENTRIES",
            Self::CostAccountingHasEntries => "COST_ACCOUNTING_HAS_ENTRIES",
            Self::CostAccountingClosed => "COST_ACCOUNTING_CLOSED",
            Self::CostAccountingNameEmpty => "COST_ACCOUNTING_NAME_EMPTY",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 404 Not Found
            Self::AccountNotFound(_)
            | Self::LineNotFound(_)
            | Self::NoCurrentYear
            | Self::CostAccountingNotFound(_) => 404,

            // 409 Conflict - state of other records forbids the action
            Self::AccountAlreadyExists(_)
            | Self::AccountHasEntries(_)
            | Self::ThirdAccountExists(_)
            | Self::ThirdAccountHasEntries
            | Self::JournalInUse(_)
            | Self::YearHasBuildingEntries(_)
            | Self::CostAccountingHasBuildingEntries
            | Self::CostAccountingHasEntries
            | Self::EntryAlreadyLettered(_)
            | Self::EntryLettered(_) => 409,

            // 422 Unprocessable - business rule violations
            Self::YearNotLast
            | Self::YearFinished
            | Self::InvalidYearStatus
            | Self::PreviousYearBuilding
            | Self::PreviousYearNotFinished
            | Self::JournalReserved
            | Self::EntryClosed(_)
            | Self::CostAccountingClosed
            | Self::LetteringNotBalanced(_)
            | Self::LetteringMixedThirds
            | Self::LetteringMixedYears
            | Self::EntryWithoutThird(_)
            | Self::EntryWithCash(_) => 422,

            // 400 Bad Request - validation errors
            Self::InvalidAccountCode(_)
            | Self::NotThirdAccount(_)
            | Self::ThirdRequired(_)
            | Self::InvalidYearBounds { .. }
            | Self::YearNotContiguous { .. }
            | Self::DateOutsideYear { .. }
            | Self::JournalNameEmpty
            | Self::InsufficientLines
            | Self::UnbalancedEntry { .. }
            | Self::ZeroAmount
            | Self::DebitAndCredit
            | Self::InvalidFactor
            | Self::LetteringTooFewEntries
            | Self::CostAccountingNameEmpty => 400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(AccountingError::YearNotLast.error_code(), "YEAR_NOT_LAST");
        assert_eq!(AccountingError::JournalReserved.error_code(), "JOURNAL_RESERVED");
        assert_eq!(
            AccountingError::LetteringNotBalanced(dec!(1)).error_code(),
            "LETTERING_NOT_BALANCED"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(AccountingError::InsufficientLines.http_status_code(), 400);
        assert_eq!(AccountingError::NoCurrentYear.http_status_code(), 404);
        assert_eq!(AccountingError::JournalInUse(3).http_status_code(), 409);
        assert_eq!(AccountingError::YearFinished.http_status_code(), 422);
    }

    #[test]
    fn test_error_display() {
        let err = AccountingError::UnbalancedEntry {
            debit: dec!(100.00),
            credit: dec!(50.00),
        };
        assert_eq!(err.to_string(), "Entry is not balanced. Debit: 100.00, Credit: 50.00");
        assert_eq!(AccountingError::YearNotLast.to_string(), "This fiscal year is not the last!");
        assert_eq!(AccountingError::JournalReserved.to_string(), "journal reserved!");
    }
}
