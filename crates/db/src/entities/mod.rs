//! `SeaORM` entity definitions, one module per table.

pub mod fiscal_years;
pub mod chart_accounts;
pub mod thirds;
pub mod account_thirds;
pub mod journals;
pub mod entries;
pub mod entry_lines;
pub mod account_links;
pub mod model_entries;
pub mod model_lines;
pub mod cost_accountings;
pub mod vats;
pub mod categories;
pub mod articles;
pub mod category_bills;
pub mod bills;
pub mod details;
pub mod automatic_reduces;
pub mod bank_accounts;
pub mod payoffs;
pub mod payment_methods;
pub mod bank_transactions;
pub mod storage_areas;
pub mod storage_sheets;
pub mod storage_details;
pub mod inventory_sheets;
pub mod inventory_details;
