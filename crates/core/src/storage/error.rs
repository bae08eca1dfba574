//! Stock error types.

use chrono::NaiveDate;
use diacamma_shared::types::{ArticleId, InventorySheetId, StorageSheetId};
use thiserror::Error;

/// Stock operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    // ========== Sheet Errors ==========
    /// Sheet already applied.
    #[error("storage sheet {0} is already valid")]
    SheetNotBuilding(StorageSheetId),

    /// Sheet without line.
    #[error("no detail")]
    NoDetail,

    /// Quantity zero or negative.
    #[error("article {reference}: quantity must be positive")]
    InvalidQuantity {
        /// Article reference.
        reference: String,
    },

    /// Article missing.
    #[error("article not found: {0}")]
    ArticleNotFound(ArticleId),

    /// Article without stock management.
    #[error("article {0} is not stockable")]
    NotStockable(String),

    /// Exit larger than the stock.
    #[error("article {0}: insufficient quantity")]
    InsufficientQuantity(String),

    /// Exit dated before a movement already in the stock.
    #[error("article {reference}: exit dated before the movement of {last}")]
    ExitBeforeLastMovement {
        /// Article reference.
        reference: String,
        /// Date of the latest movement.
        last: NaiveDate,
    },

    // ========== Import Errors ==========
    /// CSV unreadable.
    #[error("invalid CSV content: {0}")]
    Csv(String),

    /// Mapped column absent from the header.
    #[error("column '{0}' not found")]
    MissingColumn(String),

    // ========== Inventory Errors ==========
    /// Inventory already applied.
    #[error("inventory {0} is already valid")]
    InventoryNotBuilding(InventorySheetId),
}

impl StorageError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SheetNotBuilding(_) => "SHEET_NOT_BUILDING",
            Self::NoDetail => "SHEET_NO_DETAIL",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::ArticleNotFound(_) => "ARTICLE_NOT_FOUND",
            Self::NotStockable(_) => "ARTICLE_NOT_STOCKABLE",
            Self::InsufficientQuantity(_) => "INSUFFICIENT_QUANTITY",
            Self::ExitBeforeLastMovement { .. } => "EXIT_BEFORE_LAST_MOVEMENT",
            Self::Csv(_) => "INVALID_CSV",
            Self::MissingColumn(_) => "CSV_MISSING_COLUMN",
            Self::InventoryNotBuilding(_) => "INVENTORY_NOT_BUILDING",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ArticleNotFound(_) => 404,
            Self::Csv(_) | Self::MissingColumn(_) | Self::InvalidQuantity { .. } => 400,
            _ => 422,
        }
    }
}

impl From<csv::Error> for StorageError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_message() {
        let err = StorageError::InsufficientQuantity("ABC1".into());
        assert_eq!(err.to_string(), "article ABC1: insufficient quantity");
        assert_eq!(err.http_status_code(), 422);
        assert_eq!(StorageError::Csv(String::new()).error_code(), "INVALID_CSV");
        let backdated = StorageError::ExitBeforeLastMovement {
            reference: "ABC1".into(),
            last: NaiveDate::from_ymd_opt(2014, 4, 5).unwrap(),
        };
        assert_eq!(backdated.to_string(), "article ABC1: exit dated before the movement of 2014-04-05");
        assert_eq!(backdated.http_status_code(), 422);
    }
}
