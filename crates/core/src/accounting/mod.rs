//! Double-entry bookkeeping.
//!
//! - Chart of accounts classification (`AccountingSystem`, `FrenchSystem`)
//! - Thirds and their sub-accounts
//! - Fiscal year lifecycle, closing and report of balances
//! - Journals
//! - Entries and lines (positive = credit, negative = debit)
//! - Lettering of third lines
//! - Amount rendering

pub mod chart;
pub mod entry;
pub mod error;
pub mod fiscal;
pub mod format;
pub mod journal;
pub mod lettering;
pub mod third;
pub mod types;

#[cfg(test)]
mod entry_props;
#[cfg(test)]
mod lettering_props;

pub use chart::{AccountingSystem, ChartService, FrenchSystem};
pub use entry::{EntryService, LineInput, ModelEntry, ModelLine};
pub use error::AccountingError;
pub use fiscal::{FiscalService, YearResult};
pub use format::format_devise;
pub use journal::JournalService;
pub use lettering::{LetteringService, letter_for, next_letter};
pub use third::{AccountThird, LinesFilter, ShowFilter, Third, ThirdStatus, ThirdSummary, list_thirds};
pub use types::{
    AccountLink, AccountType, AccountingParams, ChartAccount, Entry, EntryFilter, EntryLine,
    FiscalYear, FiscalYearStatus, Journal,
};
