//! Stock management.
//!
//! - Storage areas and stock sheets (receipts and exits)
//! - Stock valued at mean price, with article movings
//! - Sheets generated from validated documents
//! - CSV import of sheet lines
//! - Inventories

pub mod error;
pub mod inventory;
pub mod ledger;
pub mod sheet;
pub mod types;

#[cfg(test)]
mod ledger_props;

pub use error::StorageError;
pub use inventory::{InventoryLine, InventoryOutcome, InventoryService};
pub use ledger::StockLedger;
pub use sheet::{CsvImport, CsvMapping, StorageService};
pub use types::{
    ArticleMoving, ArticleStock, InventoryDetail, InventorySheet, SheetStatus, SheetType, Stock, StorageArea,
    StorageDetail, StorageSheet,
};
