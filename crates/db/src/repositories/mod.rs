//! Repositories loading aggregates, applying the core rules and
//! persisting the result.
//!
//! Every multi-row change runs in one database transaction.

pub mod article;
pub mod cost_accounting;
pub mod entry;
pub mod fiscal;
pub mod invoice;
pub mod payoff;
pub mod storage;
pub mod third;

pub use article::{ArticleError, ArticleInput, ArticleRepository};
pub use cost_accounting::{CostAccountingError, CostAccountingRepository};
pub use entry::{CreateEntryInput, EntryError, EntryRepository};
pub use fiscal::{CreateYearInput, FiscalError, FiscalRepository};
pub use invoice::{BillError, BillFilter, BillRepository, CreateBillInput, DetailInput};
pub use payoff::{PayoffRepoError, PayoffRepository};
pub use storage::{CreateSheetInput, InventoryCount, StockError, StorageRepository};
pub use third::{CreateThirdInput, ThirdError, ThirdRepository};
