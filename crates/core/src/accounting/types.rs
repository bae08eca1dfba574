//! Bookkeeping domain types.
//!
//! Amount sign convention for entry lines: **positive = credit, negative = debit**.
//! A balanced entry therefore sums to zero.

use chrono::NaiveDate;
use diacamma_shared::types::{
    AccountLinkId, ChartAccountId, CostAccountingId, CurrencyFormat, EntryId, EntryLineId,
    FiscalYearId, ThirdId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Assets (debit-normal).
    Asset,
    /// Liabilities (credit-normal).
    Liability,
    /// Equity (credit-normal).
    Equity,
    /// Revenue (credit-normal).
    Revenue,
    /// Expense (debit-normal).
    Expense,
    /// Contra/special accounts.
    Contra,
}

impl AccountType {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Asset => 0,
            Self::Liability => 1,
            Self::Equity => 2,
            Self::Revenue => 3,
            Self::Expense => 4,
            Self::Contra => 5,
        }
    }

    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Asset),
            1 => Some(Self::Liability),
            2 => Some(Self::Equity),
            3 => Some(Self::Revenue),
            4 => Some(Self::Expense),
            5 => Some(Self::Contra),
            _ => None,
        }
    }

    /// Returns true for accounts whose balance normally sits on the credit side.
    #[must_use]
    pub const fn is_credit_normal(self) -> bool {
        matches!(self, Self::Liability | Self::Equity | Self::Revenue)
    }
}

/// Account of the chart of a fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartAccount {
    /// Account id.
    pub id: ChartAccountId,
    /// Fiscal year owning the account.
    pub year_id: FiscalYearId,
    /// Account code (digits).
    pub code: String,
    /// Account name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
}

impl ChartAccount {
    /// `+1` for credit-normal accounts, `-1` for debit-normal ones.
    #[must_use]
    pub const fn credit_debit_way(&self) -> i8 {
        if self.account_type.is_credit_normal() {
            1
        } else {
            -1
        }
    }

    /// Balance of signed amounts seen from the normal side of the account.
    #[must_use]
    pub fn normal_balance(&self, signed_total: Decimal) -> Decimal {
        signed_total * Decimal::from(self.credit_debit_way())
    }
}

/// Bookkeeping parameters handed over by the application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountingParams {
    /// Account receiving cash payments.
    pub cash_account: String,
    /// Account receiving bank fees.
    pub bank_fee_account: String,
    /// Currency display and rounding.
    pub currency: CurrencyFormat,
}

impl Default for AccountingParams {
    fn default() -> Self {
        Self {
            cash_account: "531".to_string(),
            bank_fee_account: "627".to_string(),
            currency: CurrencyFormat::default(),
        }
    }
}

/// Fiscal year status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiscalYearStatus {
    /// Opened but not begun; reports of the previous year may still change.
    Building,
    /// Current working year.
    Running,
    /// Closed year, immutable.
    Finished,
}

impl FiscalYearStatus {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Building => 0,
            Self::Running => 1,
            Self::Finished => 2,
        }
    }

    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Building),
            1 => Some(Self::Running),
            2 => Some(Self::Finished),
            _ => None,
        }
    }
}

/// Accounting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    /// Year id.
    pub id: FiscalYearId,
    /// First day.
    pub begin: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
    /// Status.
    pub status: FiscalYearStatus,
    /// Year selected by default.
    pub is_active: bool,
    /// Previous year.
    pub last_year_id: Option<FiscalYearId>,
    /// Position used to derive the document numbering letter.
    pub letter_index: i32,
}

impl FiscalYear {
    /// Returns true if the date falls inside the year.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.begin <= date && date <= self.end
    }

    /// Returns true when the year can no longer be changed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == FiscalYearStatus::Finished
    }
}

/// Ledger journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    /// Journal number.
    pub id: i32,
    /// Journal name.
    pub name: String,
    /// Reserved journals are created by the system and cannot be edited.
    pub is_reserved: bool,
}

impl Journal {
    /// Opening entries carried from the previous year.
    pub const REPORTED: i32 = 1;
    /// Purchases.
    pub const BUYING: i32 = 2;
    /// Sales.
    pub const SELLING: i32 = 3;
    /// Payments.
    pub const PAYMENT: i32 = 4;
    /// Miscellaneous operations.
    pub const OTHER: i32 = 5;

    /// Returns true if the id belongs to a system journal.
    #[must_use]
    pub const fn is_reserved_id(id: i32) -> bool {
        id >= Self::REPORTED && id <= Self::OTHER
    }
}

/// Line of a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLine {
    /// Line id.
    pub id: EntryLineId,
    /// Account code of the fiscal year chart.
    pub account_code: String,
    /// Signed amount: positive = credit, negative = debit.
    pub amount: Decimal,
    /// Third of a third account line.
    pub third_id: Option<ThirdId>,
    /// Free reference (cheque number, document number...).
    pub reference: Option<String>,
}

impl EntryLine {
    /// Creates a line from a signed amount.
    #[must_use]
    pub fn new(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: EntryLineId::new(),
            account_code: account_code.into(),
            amount,
            third_id: None,
            reference: None,
        }
    }

    /// Creates a debit line.
    #[must_use]
    pub fn debit_of(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self::new(account_code, -amount)
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit_of(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self::new(account_code, amount)
    }

    /// Attaches a third.
    #[must_use]
    pub fn with_third(mut self, third_id: ThirdId) -> Self {
        self.third_id = Some(third_id);
        self
    }

    /// Attaches a reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Debit side of the line (zero for credits).
    #[must_use]
    pub fn debit(&self) -> Decimal {
        if self.amount < Decimal::ZERO {
            -self.amount
        } else {
            Decimal::ZERO
        }
    }

    /// Credit side of the line (zero for debits).
    #[must_use]
    pub fn credit(&self) -> Decimal {
        self.amount.max(Decimal::ZERO)
    }
}

/// Ledger entry: a dated set of lines that must balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Entry id.
    pub id: EntryId,
    /// Fiscal year.
    pub year_id: FiscalYearId,
    /// Journal number.
    pub journal_id: i32,
    /// Number assigned at closing.
    pub num: Option<i32>,
    /// Closing date.
    pub date_entry: Option<NaiveDate>,
    /// Value date.
    pub date_value: NaiveDate,
    /// Label.
    pub designation: String,
    /// Closed entries are immutable.
    pub close: bool,
    /// Lettering link.
    pub link_id: Option<AccountLinkId>,
    /// Analytic tag.
    pub costaccounting_id: Option<CostAccountingId>,
    /// Lines.
    pub lines: Vec<EntryLine>,
}

impl Entry {
    /// Creates an empty open entry.
    #[must_use]
    pub fn new(
        year_id: FiscalYearId,
        journal_id: i32,
        date_value: NaiveDate,
        designation: impl Into<String>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            year_id,
            journal_id,
            num: None,
            date_entry: None,
            date_value,
            designation: designation.into(),
            close: false,
            link_id: None,
            costaccounting_id: None,
            lines: Vec::new(),
        }
    }

    /// Sum of debit sides.
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(EntryLine::debit).sum()
    }

    /// Sum of credit sides.
    #[must_use]
    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(EntryLine::credit).sum()
    }

    /// Returns true when debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.lines.iter().map(|l| l.amount).sum::<Decimal>() == Decimal::ZERO
    }

    /// Returns true when the entry belongs to a lettering.
    #[must_use]
    pub const fn is_lettered(&self) -> bool {
        self.link_id.is_some()
    }
}

/// Entry list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryFilter {
    /// Every entry.
    #[default]
    All,
    /// Open entries.
    InProgress,
    /// Closed entries.
    Valid,
    /// Lettered entries.
    Lettered,
    /// Entries without lettering.
    NotLettered,
}

impl EntryFilter {
    /// Decodes a filter code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::All),
            1 => Some(Self::InProgress),
            2 => Some(Self::Valid),
            3 => Some(Self::Lettered),
            4 => Some(Self::NotLettered),
            _ => None,
        }
    }

    /// Returns true if the entry passes the filter.
    #[must_use]
    pub const fn accepts(self, entry: &Entry) -> bool {
        match self {
            Self::All => true,
            Self::InProgress => !entry.close,
            Self::Valid => entry.close,
            Self::Lettered => entry.is_lettered(),
            Self::NotLettered => !entry.is_lettered(),
        }
    }
}

/// Lettering link between entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLink {
    /// Link id.
    pub id: AccountLinkId,
    /// Fiscal year in which the letter is unique.
    pub year_id: FiscalYearId,
    /// Letter (`A`, `B`, ... `AA`).
    pub letter: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_line_sides() {
        let debit = EntryLine::debit_of("411", dec!(120));
        let credit = EntryLine::credit_of("706", dec!(100));
        assert_eq!(debit.amount, dec!(-120));
        assert_eq!(debit.debit(), dec!(120));
        assert_eq!(debit.credit(), dec!(0));
        assert_eq!(credit.credit(), dec!(100));
        assert_eq!(credit.debit(), dec!(0));
    }

    #[test]
    fn test_entry_totals() {
        let mut entry = Entry::new(FiscalYearId::new(), Journal::SELLING, date(2024, 3, 1), "bill");
        entry.lines.push(EntryLine::debit_of("411", dec!(120)));
        entry.lines.push(EntryLine::credit_of("706", dec!(100)));
        assert!(!entry.is_balanced());
        entry.lines.push(EntryLine::credit_of("4455", dec!(20)));
        assert!(entry.is_balanced());
        assert_eq!(entry.total_debit(), dec!(120));
        assert_eq!(entry.total_credit(), dec!(120));
    }

    #[test]
    fn test_credit_debit_way() {
        let mut account = ChartAccount {
            id: ChartAccountId::new(),
            year_id: FiscalYearId::new(),
            code: "706".into(),
            name: "Sales".into(),
            account_type: AccountType::Revenue,
        };
        assert_eq!(account.credit_debit_way(), 1);
        assert_eq!(account.normal_balance(dec!(50)), dec!(50));
        account.account_type = AccountType::Asset;
        assert_eq!(account.credit_debit_way(), -1);
        assert_eq!(account.normal_balance(dec!(-50)), dec!(50));
    }

    #[test]
    fn test_codes_roundtrip() {
        for code in 0..6 {
            assert_eq!(AccountType::from_code(code).map(AccountType::code), Some(code));
        }
        assert_eq!(AccountType::from_code(6), None);
        assert_eq!(FiscalYearStatus::from_code(2), Some(FiscalYearStatus::Finished));
    }

    #[test]
    fn test_entry_filter() {
        let mut entry = Entry::new(FiscalYearId::new(), Journal::OTHER, date(2024, 3, 1), "x");
        assert!(EntryFilter::InProgress.accepts(&entry));
        assert!(!EntryFilter::Valid.accepts(&entry));
        assert!(EntryFilter::NotLettered.accepts(&entry));
        entry.close = true;
        entry.link_id = Some(AccountLinkId::new());
        assert!(EntryFilter::Valid.accepts(&entry));
        assert!(EntryFilter::Lettered.accepts(&entry));
        assert_eq!(EntryFilter::from_code(4), Some(EntryFilter::NotLettered));
        assert_eq!(EntryFilter::from_code(5), None);
    }

    #[test]
    fn test_reserved_journals() {
        assert!(Journal::is_reserved_id(Journal::REPORTED));
        assert!(Journal::is_reserved_id(Journal::OTHER));
        assert!(!Journal::is_reserved_id(6));
    }
}
