//! Ledger entry rules.
//!
//! Entries are built line by line while open, validated against the chart
//! and the fiscal year, then closed with a sequential number. Closed entries
//! never change again.

use chrono::NaiveDate;
use diacamma_shared::types::{
    AccountLinkId, CostAccountingId, CurrencyFormat, EntryLineId, FiscalYearId, ModelEntryId,
    ModelLineId, ThirdId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::chart::AccountingSystem;
use super::error::AccountingError;
use super::fiscal::FiscalService;
use super::types::{Entry, EntryFilter, EntryLine, FiscalYear, Journal};
use crate::cost_accounting::CostAccounting;

/// Line edition request; exactly one of `debit` or `credit` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    /// Line to replace, `None` to append.
    pub id: Option<EntryLineId>,
    /// Account code.
    pub account_code: String,
    /// Debit amount.
    #[serde(default)]
    pub debit: Decimal,
    /// Credit amount.
    #[serde(default)]
    pub credit: Decimal,
    /// Third of a third account line.
    pub third_id: Option<ThirdId>,
    /// Free reference.
    pub reference: Option<String>,
}

/// Template of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Model id.
    pub id: ModelEntryId,
    /// Journal of generated entries.
    pub journal_id: i32,
    /// Designation of generated entries.
    pub designation: String,
    /// Analytic tag of generated entries.
    pub costaccounting_id: Option<CostAccountingId>,
    /// Template lines.
    pub lines: Vec<ModelLine>,
}

/// Line of an entry template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLine {
    /// Line id.
    pub id: ModelLineId,
    /// Account code.
    pub account_code: String,
    /// Signed amount for a factor of 1.
    pub amount: Decimal,
    /// Third.
    pub third_id: Option<ThirdId>,
}

/// Entry rules.
pub struct EntryService;

impl EntryService {
    fn ensure_open(entry: &Entry) -> Result<(), AccountingError> {
        if entry.close {
            return Err(AccountingError::EntryClosed(entry.id));
        }
        Ok(())
    }

    /// Adds a line, or replaces the line with the same id.
    pub fn add_line<S: AccountingSystem + ?Sized>(
        system: &S,
        entry: &mut Entry,
        input: LineInput,
    ) -> Result<EntryLineId, AccountingError> {
        Self::ensure_open(entry)?;
        let debit = input.debit.abs();
        let credit = input.credit.abs();
        let amount = match (debit.is_zero(), credit.is_zero()) {
            (true, true) => return Err(AccountingError::ZeroAmount),
            (false, false) => return Err(AccountingError::DebitAndCredit),
            (false, true) => -debit,
            (true, false) => credit,
        };
        let is_third = system.is_third(&input.account_code);
        if is_third && input.third_id.is_none() {
            return Err(AccountingError::ThirdRequired(input.account_code));
        }

        let line = EntryLine {
            id: input.id.unwrap_or_default(),
            account_code: input.account_code,
            amount,
            third_id: if is_third { input.third_id } else { None },
            reference: input.reference.filter(|r| !r.is_empty() && r != "None"),
        };
        let id = line.id;
        match entry.lines.iter_mut().find(|l| l.id == id) {
            Some(existing) => *existing = line,
            None => entry.lines.push(line),
        }
        Ok(id)
    }

    /// Removes a line of an open entry.
    pub fn remove_line(entry: &mut Entry, line_id: EntryLineId) -> Result<EntryLine, AccountingError> {
        Self::ensure_open(entry)?;
        let position = entry
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or(AccountingError::LineNotFound(line_id))?;
        Ok(entry.lines.remove(position))
    }

    /// Full consistency check before saving a posted or closed entry.
    pub fn validate(
        entry: &Entry,
        year: &FiscalYear,
        chart_codes: &[String],
    ) -> Result<(), AccountingError> {
        FiscalService::check_date(year, entry.date_value)?;
        if entry.lines.len() < 2 {
            return Err(AccountingError::InsufficientLines);
        }
        if entry.lines.iter().any(|l| l.amount.is_zero()) {
            return Err(AccountingError::ZeroAmount);
        }
        if let Some(line) = entry.lines.iter().find(|l| !chart_codes.contains(&l.account_code)) {
            return Err(AccountingError::AccountNotFound(line.account_code.clone()));
        }
        if !entry.is_balanced() {
            return Err(AccountingError::UnbalancedEntry {
                debit: entry.total_debit(),
                credit: entry.total_credit(),
            });
        }
        Ok(())
    }

    /// Next closing number of a fiscal year.
    #[must_use]
    pub fn next_num(year_entries: &[Entry]) -> i32 {
        year_entries.iter().filter_map(|e| e.num).max().unwrap_or(0) + 1
    }

    /// Closes an entry with the given number.
    pub fn close(entry: &mut Entry, num: i32, today: NaiveDate) -> Result<(), AccountingError> {
        Self::ensure_open(entry)?;
        if entry.lines.len() < 2 {
            return Err(AccountingError::InsufficientLines);
        }
        if !entry.is_balanced() {
            return Err(AccountingError::UnbalancedEntry {
                debit: entry.total_debit(),
                credit: entry.total_credit(),
            });
        }
        entry.close = true;
        entry.num = Some(num);
        entry.date_entry = Some(today);
        Ok(())
    }

    /// Checks an entry can be deleted; returns the lettering to remove first.
    pub fn validate_delete(entry: &Entry) -> Result<Option<AccountLinkId>, AccountingError> {
        Self::ensure_open(entry)?;
        Ok(entry.link_id)
    }

    /// Negates every line of an open entry.
    pub fn reverse(entry: &mut Entry) -> Result<(), AccountingError> {
        Self::ensure_open(entry)?;
        for line in &mut entry.lines {
            line.amount = -line.amount;
        }
        Ok(())
    }

    /// Builds the payment entry settling the third lines of `entry`.
    pub fn create_linked<S: AccountingSystem + ?Sized>(
        system: &S,
        entry: &Entry,
        year_id: FiscalYearId,
        today: NaiveDate,
    ) -> Result<Entry, AccountingError> {
        if entry.is_lettered() {
            return Err(AccountingError::EntryLettered(entry.id));
        }
        if !system.has_third(entry) {
            return Err(AccountingError::EntryWithoutThird(entry.id));
        }
        if system.has_cash(entry) {
            return Err(AccountingError::EntryWithCash(entry.id));
        }
        let mut linked = Entry::new(
            year_id,
            Journal::PAYMENT,
            today,
            format!("payment of {}", entry.designation),
        );
        linked.lines = entry
            .lines
            .iter()
            .filter(|l| system.is_third(&l.account_code))
            .map(|l| {
                let mut line = EntryLine::new(l.account_code.clone(), -l.amount);
                line.third_id = l.third_id;
                line.reference.clone_from(&l.reference);
                line
            })
            .collect();
        Ok(linked)
    }

    /// Tags entries with a cost accounting. Entries whose current cost
    /// accounting is closed keep it. Returns the number of changed entries.
    pub fn assign_cost_accounting<F>(
        entries: &mut [Entry],
        target: Option<&CostAccounting>,
        is_open: F,
    ) -> Result<usize, AccountingError>
    where
        F: Fn(CostAccountingId) -> bool,
    {
        if target.is_some_and(|c| !c.is_open()) {
            return Err(AccountingError::CostAccountingClosed);
        }
        let new_id = target.map(|c| c.id);
        let mut changed = 0;
        for entry in entries.iter_mut() {
            if entry.costaccounting_id.is_none_or(&is_open) {
                entry.costaccounting_id = new_id;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Pre-fills a new entry from a model, every amount multiplied by `factor`.
    pub fn apply_model(
        model: &ModelEntry,
        factor: Decimal,
        year_id: FiscalYearId,
        date: NaiveDate,
        currency: &CurrencyFormat,
    ) -> Result<Entry, AccountingError> {
        if factor <= Decimal::ZERO {
            return Err(AccountingError::InvalidFactor);
        }
        let mut entry = Entry::new(year_id, model.journal_id, date, model.designation.clone());
        entry.costaccounting_id = model.costaccounting_id;
        entry.lines = model
            .lines
            .iter()
            .map(|l| {
                let mut line = EntryLine::new(l.account_code.clone(), currency.round(l.amount * factor));
                line.third_id = l.third_id;
                line
            })
            .collect();
        Ok(entry)
    }

    /// Entries passing a list filter, optionally restricted to a journal.
    pub fn filter<'a>(
        entries: &'a [Entry],
        filter: EntryFilter,
        journal_id: Option<i32>,
        year_id: Option<FiscalYearId>,
    ) -> impl Iterator<Item = &'a Entry> {
        entries.iter().filter(move |e| {
            filter.accepts(e)
                && journal_id.is_none_or(|j| e.journal_id == j)
                && year_id.is_none_or(|y| e.year_id == y)
        })
    }
}
