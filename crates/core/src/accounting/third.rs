//! Third ledger: customers and providers with their sub-accounts.

use std::collections::BTreeMap;

use diacamma_shared::types::{AccountThirdId, ThirdId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::chart::AccountingSystem;
use super::error::AccountingError;
use super::types::EntryLine;

/// Third status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThirdStatus {
    /// Usable.
    #[default]
    Enabled,
    /// Hidden from new documents.
    Disabled,
}

impl ThirdStatus {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Enabled => 0,
            Self::Disabled => 1,
        }
    }

    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Enabled),
            1 => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// Sub-account of a third.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountThird {
    /// Account id.
    pub id: AccountThirdId,
    /// Owner.
    pub third_id: ThirdId,
    /// Account code.
    pub code: String,
}

/// Customer or provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Third {
    /// Third id.
    pub id: ThirdId,
    /// Contact name.
    pub contact: String,
    /// Status.
    pub status: ThirdStatus,
    /// Sub-accounts.
    pub accounts: Vec<AccountThird>,
    /// Free custom fields (name → value).
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
}

/// Third list display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowFilter {
    /// Thirds only.
    #[default]
    Plain,
    /// Thirds with their totals.
    WithTotals,
    /// Only thirds whose total is not zero.
    NonZeroTotals,
}

impl ShowFilter {
    /// Decodes a filter code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Plain),
            1 => Some(Self::WithTotals),
            2 => Some(Self::NonZeroTotals),
            _ => None,
        }
    }
}

/// Third line list scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinesFilter {
    /// Lines of the current fiscal year.
    #[default]
    CurrentYear,
    /// Lines of the current year not lettered yet.
    CurrentYearNotLettered,
    /// Lines of every year.
    AllYears,
}

impl LinesFilter {
    /// Decodes a filter code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::CurrentYear),
            1 => Some(Self::CurrentYearNotLettered),
            2 => Some(Self::AllYears),
            _ => None,
        }
    }
}

impl Third {
    /// Creates an enabled third without accounts.
    #[must_use]
    pub fn new(contact: impl Into<String>) -> Self {
        Self {
            id: ThirdId::new(),
            contact: contact.into(),
            status: ThirdStatus::Enabled,
            accounts: Vec::new(),
            custom_fields: BTreeMap::new(),
        }
    }

    /// Adds a sub-account after checking it is a third account.
    pub fn add_account<S: AccountingSystem + ?Sized>(
        &mut self,
        system: &S,
        code: &str,
    ) -> Result<&AccountThird, AccountingError> {
        if !system.is_third(code) {
            return Err(AccountingError::NotThirdAccount(code.to_string()));
        }
        if self.accounts.iter().any(|a| a.code == code) {
            return Err(AccountingError::ThirdAccountExists(code.to_string()));
        }
        self.accounts.push(AccountThird {
            id: AccountThirdId::new(),
            third_id: self.id,
            code: code.to_string(),
        });
        self.accounts
            .last()
            .ok_or_else(|| AccountingError::NotThirdAccount(code.to_string()))
    }

    /// Removes a sub-account, refused when lines use it.
    pub fn remove_account(&mut self, code: &str, has_lines: bool) -> Result<AccountThird, AccountingError> {
        let position = self
            .accounts
            .iter()
            .position(|a| a.code == code)
            .ok_or_else(|| AccountingError::AccountNotFound(code.to_string()))?;
        if has_lines {
            return Err(AccountingError::ThirdAccountHasEntries);
        }
        Ok(self.accounts.remove(position))
    }

    /// Net balance owed by the third over its lines (positive when the third owes).
    #[must_use]
    pub fn total(&self, lines: &[EntryLine]) -> Decimal {
        -lines
            .iter()
            .filter(|l| l.third_id == Some(self.id))
            .map(|l| l.amount)
            .sum::<Decimal>()
    }

    /// Net balance of one sub-account.
    #[must_use]
    pub fn account_total(&self, code: &str, lines: &[EntryLine]) -> Decimal {
        -lines
            .iter()
            .filter(|l| l.third_id == Some(self.id) && l.account_code == code)
            .map(|l| l.amount)
            .sum::<Decimal>()
    }

    /// First sub-account matching the customer mask.
    pub fn customer_account<S: AccountingSystem + ?Sized>(&self, system: &S) -> Option<&str> {
        self.account_with_mask(system.customer_mask())
    }

    /// First sub-account matching the provider mask.
    pub fn provider_account<S: AccountingSystem + ?Sized>(&self, system: &S) -> Option<&str> {
        self.account_with_mask(system.provider_mask())
    }

    fn account_with_mask(&self, mask: &str) -> Option<&str> {
        self.accounts
            .iter()
            .find(|a| a.code.starts_with(mask))
            .map(|a| a.code.as_str())
    }

    /// Case-insensitive contact match; empty needles match everything.
    #[must_use]
    pub fn matches_contact(&self, needle: &str) -> bool {
        needle.is_empty() || self.contact.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Third with its total, as listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThirdSummary {
    /// Third id.
    pub id: ThirdId,
    /// Contact.
    pub contact: String,
    /// Sub-account codes.
    pub accounts: Vec<String>,
    /// Net balance, present with totals.
    pub total: Option<Decimal>,
}

/// Builds the third list for a contact filter and a display mode.
#[must_use]
pub fn list_thirds(thirds: &[Third], contact: &str, show: ShowFilter, lines: &[EntryLine]) -> Vec<ThirdSummary> {
    thirds
        .iter()
        .filter(|t| t.matches_contact(contact))
        .filter_map(|t| {
            let total = match show {
                ShowFilter::Plain => None,
                ShowFilter::WithTotals | ShowFilter::NonZeroTotals => Some(t.total(lines)),
            };
            if show == ShowFilter::NonZeroTotals && total == Some(Decimal::ZERO) {
                return None;
            }
            Some(ThirdSummary {
                id: t.id,
                contact: t.contact.clone(),
                accounts: t.accounts.iter().map(|a| a.code.clone()).collect(),
                total,
            })
        })
        .collect()
}
