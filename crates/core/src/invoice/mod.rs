//! Commercial documents and their posting to the ledger.
//!
//! - Documents, lines and articles (`types`)
//! - Line amounts, VAT and totals (`detail`)
//! - Selling entry generation (`posting`)
//! - Lifecycle: checks, numbering, validation, cancel (`bill`)
//! - Automatic reductions (`reduce`)
//! - Sales statistics (`statistic`)

pub mod bill;
pub mod detail;
pub mod error;
pub mod posting;
pub mod reduce;
pub mod statistic;
pub mod types;

#[cfg(test)]
mod posting_props;

pub use bill::{BillContext, BillService, Validated};
pub use detail::{BillTotals, VatLine};
pub use error::InvoiceError;
pub use posting::InvoicePosting;
pub use reduce::{AutomaticReduce, ReduceHistory, ReduceMode, ReduceService, ReduceSummary, ThirdCriteria};
pub use statistic::{ArticleStatistic, BillStatistics, CustomerStatistic, MonthStatistic};
pub use types::{
    Article, Bill, BillStatus, BillType, Category, CategoryBill, Detail, InvoiceParams, Stockable, Vat, VatMode,
};
