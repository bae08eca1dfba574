//! Core business logic for Diacamma.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `accounting` - Double-entry bookkeeping, thirds, fiscal years and lettering
//! - `cost_accounting` - Analytic tags on entries
//! - `invoice` - Commercial documents, VAT, posting and automatic reductions
//! - `payoff` - Payments of documents and external payment confirmation
//! - `storage` - Stock sheets, mean price valuation and inventories

pub mod accounting;
pub mod cost_accounting;
pub mod invoice;
pub mod payoff;
pub mod storage;
