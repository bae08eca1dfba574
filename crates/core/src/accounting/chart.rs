//! Chart of accounts.
//!
//! Classification rules live behind the [`AccountingSystem`] trait so that
//! the rest of the engine never hardcodes a national chart.
//! [`FrenchSystem`] implements the French "plan comptable général".

use super::error::AccountingError;
use super::types::{AccountType, ChartAccount, Entry};

/// Account classification rules of a national chart.
pub trait AccountingSystem: Send + Sync {
    /// Classifies a code, `None` for unknown classes.
    fn account_type(&self, code: &str) -> Option<AccountType>;

    /// Returns true for accounts carrying a third detail.
    fn is_third(&self, code: &str) -> bool;

    /// Prefix of treasury accounts.
    fn cash_begin(&self) -> &'static str;

    /// Prefix of customer accounts.
    fn customer_mask(&self) -> &'static str;

    /// Prefix of provider accounts.
    fn provider_mask(&self) -> &'static str;

    /// Account receiving a profit at closing.
    fn result_profit_account(&self) -> &'static str;

    /// Account receiving a loss at closing.
    fn result_loss_account(&self) -> &'static str;

    /// Account holding the result reported in the next year.
    fn reported_account(&self) -> &'static str;

    /// Returns true for treasury accounts.
    fn is_cash(&self, code: &str) -> bool {
        code.starts_with(self.cash_begin())
    }

    /// Returns true for revenue accounts.
    fn is_revenue(&self, code: &str) -> bool {
        self.account_type(code) == Some(AccountType::Revenue)
    }

    /// Returns true for expense accounts.
    fn is_expense(&self, code: &str) -> bool {
        self.account_type(code) == Some(AccountType::Expense)
    }

    /// Returns true for accounts appearing in the balance sheet.
    fn is_balance_sheet(&self, code: &str) -> bool {
        matches!(
            self.account_type(code),
            Some(AccountType::Asset | AccountType::Liability | AccountType::Equity)
        )
    }

    /// Checks that a code is well formed and belongs to a known class.
    fn validate_code(&self, code: &str) -> Result<AccountType, AccountingError> {
        if code.len() < 3 || code.len() > 12 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AccountingError::InvalidAccountCode(code.to_string()));
        }
        self.account_type(code)
            .ok_or_else(|| AccountingError::InvalidAccountCode(code.to_string()))
    }

    /// Returns true when the entry has at least one third line.
    fn has_third(&self, entry: &Entry) -> bool {
        entry.lines.iter().any(|l| self.is_third(&l.account_code))
    }

    /// Returns true when the entry touches a treasury account.
    fn has_cash(&self, entry: &Entry) -> bool {
        entry.lines.iter().any(|l| self.is_cash(&l.account_code))
    }
}

/// French chart of accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrenchSystem;

impl AccountingSystem for FrenchSystem {
    fn account_type(&self, code: &str) -> Option<AccountType> {
        let mut digits = code.chars();
        let class = digits.next()?;
        let sub = digits.next();
        match class {
            '1' => Some(if matches!(sub, Some('6' | '7')) {
                AccountType::Liability
            } else {
                AccountType::Equity
            }),
            '2' | '3' | '5' => Some(AccountType::Asset),
            '4' => match sub? {
                '0' | '2'..='7' => Some(AccountType::Liability),
                '1' | '8' | '9' => Some(AccountType::Asset),
                _ => None,
            },
            '6' => Some(AccountType::Expense),
            '7' => Some(AccountType::Revenue),
            '8' => Some(AccountType::Contra),
            _ => None,
        }
    }

    fn is_third(&self, code: &str) -> bool {
        ["401", "411", "421", "45", "46"]
            .iter()
            .any(|prefix| code.starts_with(prefix))
    }

    fn cash_begin(&self) -> &'static str {
        "5"
    }

    fn customer_mask(&self) -> &'static str {
        "411"
    }

    fn provider_mask(&self) -> &'static str {
        "401"
    }

    fn result_profit_account(&self) -> &'static str {
        "120"
    }

    fn result_loss_account(&self) -> &'static str {
        "129"
    }

    fn reported_account(&self) -> &'static str {
        "110"
    }
}

/// Chart maintenance rules.
pub struct ChartService;

impl ChartService {
    /// Checks a new account against the chart and classifies it.
    pub fn validate_new_account<S: AccountingSystem + ?Sized>(
        system: &S,
        code: &str,
        chart: &[ChartAccount],
    ) -> Result<AccountType, AccountingError> {
        let account_type = system.validate_code(code)?;
        if chart.iter().any(|a| a.code == code) {
            return Err(AccountingError::AccountAlreadyExists(code.to_string()));
        }
        Ok(account_type)
    }

    /// Refuses to delete an account that still carries lines.
    pub fn validate_delete(account: &ChartAccount, has_lines: bool) -> Result<(), AccountingError> {
        if has_lines {
            return Err(AccountingError::AccountHasEntries(account.code.clone()));
        }
        Ok(())
    }

    /// Finds an account by code.
    pub fn find<'a>(chart: &'a [ChartAccount], code: &str) -> Result<&'a ChartAccount, AccountingError> {
        chart
            .iter()
            .find(|a| a.code == code)
            .ok_or_else(|| AccountingError::AccountNotFound(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diacamma_shared::types::{ChartAccountId, FiscalYearId};
    use rstest::rstest;

    #[rstest]
    #[case("101", AccountType::Equity)]
    #[case("120", AccountType::Equity)]
    #[case("164", AccountType::Liability)]
    #[case("2183", AccountType::Asset)]
    #[case("401", AccountType::Liability)]
    #[case("411", AccountType::Asset)]
    #[case("4455", AccountType::Liability)]
    #[case("512", AccountType::Asset)]
    #[case("531", AccountType::Asset)]
    #[case("627", AccountType::Expense)]
    #[case("706", AccountType::Revenue)]
    #[case("860", AccountType::Contra)]
    fn test_french_classification(#[case] code: &str, #[case] expected: AccountType) {
        assert_eq!(FrenchSystem.account_type(code), Some(expected));
    }

    #[rstest]
    #[case("", false)]
    #[case("12", false)]
    #[case("9001", false)]
    #[case("70A", false)]
    #[case("7061234567890", false)]
    #[case("706", true)]
    fn test_validate_code(#[case] code: &str, #[case] valid: bool) {
        assert_eq!(FrenchSystem.validate_code(code).is_ok(), valid);
    }

    #[test]
    fn test_third_and_cash() {
        assert!(FrenchSystem.is_third("411"));
        assert!(FrenchSystem.is_third("4010001"));
        assert!(FrenchSystem.is_third("455"));
        assert!(!FrenchSystem.is_third("4455"));
        assert!(FrenchSystem.is_cash("512"));
        assert!(FrenchSystem.is_cash("531"));
        assert!(!FrenchSystem.is_cash("411"));
        assert!(FrenchSystem.is_revenue("709"));
        assert!(FrenchSystem.is_expense("627"));
        assert!(FrenchSystem.is_balance_sheet("164"));
        assert!(!FrenchSystem.is_balance_sheet("706"));
    }

    #[test]
    fn test_new_account_duplicate() {
        let year_id = FiscalYearId::new();
        let chart = vec![ChartAccount {
            id: ChartAccountId::new(),
            year_id,
            code: "706".into(),
            name: "Sales".into(),
            account_type: AccountType::Revenue,
        }];
        assert_eq!(
            ChartService::validate_new_account(&FrenchSystem, "706", &chart),
            Err(AccountingError::AccountAlreadyExists("706".into()))
        );
        assert_eq!(
            ChartService::validate_new_account(&FrenchSystem, "707", &chart),
            Ok(AccountType::Revenue)
        );
        assert!(ChartService::validate_delete(&chart[0], true).is_err());
        assert!(ChartService::validate_delete(&chart[0], false).is_ok());
        assert!(ChartService::find(&chart, "411").is_err());
    }
}
