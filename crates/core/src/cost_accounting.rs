//! Cost accounting: analytic tags attached to ledger entries.

use diacamma_shared::types::{CostAccountingId, FiscalYearId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounting::{AccountingError, AccountingSystem, Entry};

/// Cost accounting status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostAccountingStatus {
    /// Accepts new entries.
    #[default]
    Open,
    /// Frozen.
    Closed,
}

impl CostAccountingStatus {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Open => 0,
            Self::Closed => 1,
        }
    }

    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Open),
            1 => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Analytic tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostAccounting {
    /// Cost accounting id.
    pub id: CostAccountingId,
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Status.
    pub status: CostAccountingStatus,
    /// Cost accounting this one continues.
    pub last_costaccounting_id: Option<CostAccountingId>,
    /// Tag applied by default to generated entries.
    pub is_default: bool,
    /// Fiscal year, when the tag is tied to one.
    pub year_id: Option<FiscalYearId>,
}

/// Revenue and expense of a cost accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CostTotals {
    /// Credit balance of revenue lines.
    pub revenue: Decimal,
    /// Debit balance of expense lines.
    pub expense: Decimal,
    /// `revenue - expense`.
    pub result: Decimal,
}

impl CostAccounting {
    /// Creates an open cost accounting.
    pub fn new(
        name: &str,
        description: &str,
        year_id: Option<FiscalYearId>,
    ) -> Result<Self, AccountingError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AccountingError::CostAccountingNameEmpty);
        }
        Ok(Self {
            id: CostAccountingId::new(),
            name: name.to_string(),
            description: description.to_string(),
            status: CostAccountingStatus::Open,
            last_costaccounting_id: None,
            is_default: false,
            year_id,
        })
    }

    /// Returns true while entries may use it.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == CostAccountingStatus::Open
    }
}

/// Cost accounting rules.
pub struct CostAccountingService;

impl CostAccountingService {
    /// Makes `id` the only default cost accounting; `None` clears the default.
    pub fn set_default(costs: &mut [CostAccounting], id: Option<CostAccountingId>) -> Result<(), AccountingError> {
        if let Some(id) = id {
            match costs.iter().find(|c| c.id == id) {
                Some(c) if !c.is_open() => return Err(AccountingError::CostAccountingClosed),
                Some(_) => {}
                None => return Err(AccountingError::CostAccountingNotFound(id)),
            }
        }
        for cost in costs.iter_mut() {
            cost.is_default = Some(cost.id) == id;
        }
        Ok(())
    }

    /// Open → Closed, refused while open entries use it.
    pub fn close(cost: &mut CostAccounting, building_entries: usize) -> Result<(), AccountingError> {
        if !cost.is_open() {
            return Err(AccountingError::CostAccountingClosed);
        }
        if building_entries > 0 {
            return Err(AccountingError::CostAccountingHasBuildingEntries);
        }
        cost.status = CostAccountingStatus::Closed;
        cost.is_default = false;
        Ok(())
    }

    /// Deletion refused while entries reference it.
    pub fn validate_delete(has_entries: bool) -> Result<(), AccountingError> {
        if has_entries {
            return Err(AccountingError::CostAccountingHasEntries);
        }
        Ok(())
    }

    /// Revenue, expense and result of the entries tagged with `id`.
    #[must_use]
    pub fn totals<S: AccountingSystem + ?Sized>(
        system: &S,
        id: CostAccountingId,
        entries: &[Entry],
    ) -> CostTotals {
        let mut totals = CostTotals::default();
        for line in entries
            .iter()
            .filter(|e| e.costaccounting_id == Some(id))
            .flat_map(|e| e.lines.iter())
        {
            if system.is_revenue(&line.account_code) {
                totals.revenue += line.amount;
            } else if system.is_expense(&line.account_code) {
                totals.expense -= line.amount;
            }
        }
        totals.result = totals.revenue - totals.expense;
        totals
    }
}
