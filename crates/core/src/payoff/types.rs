//! Payoff domain types.

use chrono::NaiveDate;
use diacamma_shared::types::{BankAccountId, BillId, CostAccountingId, EntryId, PayoffId, ThirdId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a payoff was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoffMode {
    /// Cash.
    Cash,
    /// Cheque.
    Cheque,
    /// Bank transfer.
    Transfer,
    /// Credit card.
    CreditCard,
    /// Other.
    Other,
    /// Direct debit.
    DirectDebit,
    /// Settlement between a credit note and a bill.
    Internal,
}

impl PayoffMode {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Cash => 0,
            Self::Cheque => 1,
            Self::Transfer => 2,
            Self::CreditCard => 3,
            Self::Other => 4,
            Self::DirectDebit => 5,
            Self::Internal => 6,
        }
    }

    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Cash),
            1 => Some(Self::Cheque),
            2 => Some(Self::Transfer),
            3 => Some(Self::CreditCard),
            4 => Some(Self::Other),
            5 => Some(Self::DirectDebit),
            6 => Some(Self::Internal),
            _ => None,
        }
    }

    /// Modes going through a bank account.
    #[must_use]
    pub const fn needs_bank(self) -> bool {
        !matches!(self, Self::Cash | Self::Internal)
    }
}

/// Bank account receiving payoffs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    /// Bank account id.
    pub id: BankAccountId,
    /// Name.
    pub designation: String,
    /// Bank reference (IBAN...).
    pub reference: String,
    /// Treasury account code.
    pub account_code: String,
    /// Hidden from new payoffs.
    pub is_disabled: bool,
}

/// Payment of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payoff {
    /// Payoff id.
    pub id: PayoffId,
    /// Paid document.
    pub supporting_id: BillId,
    /// Payment date.
    pub date: NaiveDate,
    /// Amount applied to the document.
    pub amount: Decimal,
    /// Mode.
    pub mode: PayoffMode,
    /// Payer name.
    pub payer: String,
    /// Cheque number, transfer reference...
    pub reference: String,
    /// Bank account, absent for cash and internal payoffs.
    pub bank_account_id: Option<BankAccountId>,
    /// Bank fee kept by the bank.
    pub bank_fee: Decimal,
    /// Payment entry, absent for internal payoffs.
    pub entry_id: Option<EntryId>,
    /// Mirror payoff of an internal settlement.
    pub linked_payoff_id: Option<PayoffId>,
}

/// Payable document as seen by payoffs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supporting {
    /// Document id.
    pub id: BillId,
    /// Document label (`bill A-1`).
    pub designation: String,
    /// Document date.
    pub date: NaiveDate,
    /// Customer.
    pub third_id: ThirdId,
    /// Customer account used by the document entry.
    pub third_account: String,
    /// Amount due.
    pub total_to_pay: Decimal,
    /// Bills and receipts are paid by the third; credit notes are paid to it.
    pub is_revenue: bool,
    /// Whether the document accepts payoffs.
    pub is_payable: bool,
    /// Posted entry.
    pub entry_id: Option<EntryId>,
    /// Analytic tag of the document.
    pub cost_accounting_id: Option<CostAccountingId>,
    /// Payoffs already recorded.
    pub payoffs: Vec<Payoff>,
}

/// How a multi-document payoff is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repartition {
    /// In proportion to each rest to pay.
    #[default]
    ByRest,
    /// Oldest document first.
    ByDate,
}

impl Repartition {
    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::ByRest),
            1 => Some(Self::ByDate),
            _ => None,
        }
    }
}

/// Payoff form, shared by every document of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffInput {
    /// Total amount.
    pub amount: Decimal,
    /// Payment date.
    pub date: NaiveDate,
    /// Mode.
    pub mode: PayoffMode,
    /// Payer name.
    pub payer: String,
    /// Reference.
    pub reference: String,
    /// Bank account for non cash modes.
    pub bank_account_id: Option<BankAccountId>,
    /// Bank fee.
    #[serde(default)]
    pub bank_fee: Decimal,
    /// Split of a multi-document payoff.
    #[serde(default)]
    pub repartition: Repartition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_codes() {
        for code in 0..7 {
            assert_eq!(PayoffMode::from_code(code).map(PayoffMode::code), Some(code));
        }
        assert!(PayoffMode::from_code(7).is_none());
        assert!(!PayoffMode::Cash.needs_bank());
        assert!(!PayoffMode::Internal.needs_bank());
        assert!(PayoffMode::Cheque.needs_bank());
        assert_eq!(Repartition::from_code(1), Some(Repartition::ByDate));
    }
}
