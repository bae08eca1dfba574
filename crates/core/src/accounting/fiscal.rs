//! Fiscal year lifecycle: creation, activation, beginning, closing and
//! carrying balances into the next year.

use std::collections::BTreeMap;

use chrono::{Days, Months, NaiveDate};
use diacamma_shared::types::{FiscalYearId, ThirdId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::chart::AccountingSystem;
use super::error::AccountingError;
use super::lettering::letter_for;
use super::types::{Entry, EntryLine, FiscalYear, FiscalYearStatus, Journal};

/// Revenue, expense and treasury totals of a fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct YearResult {
    /// Credit balance of revenue accounts.
    pub revenue: Decimal,
    /// Debit balance of expense accounts.
    pub expense: Decimal,
    /// `revenue - expense`.
    pub result: Decimal,
    /// Debit balance of treasury accounts.
    pub cash: Decimal,
    /// Debit balance of treasury accounts over closed entries.
    pub closed_cash: Decimal,
}

/// Fiscal year rules.
pub struct FiscalService;

impl FiscalService {
    /// Default bounds of the year following `last`; starts on `today` without previous year.
    #[must_use]
    pub fn next_year_bounds(last: Option<&FiscalYear>, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let begin = last.map_or(today, |y| y.end + Days::new(1));
        let end = begin
            .checked_add_months(Months::new(12))
            .and_then(|d| d.pred_opt())
            .unwrap_or(begin);
        (begin, end)
    }

    /// Checks the bounds of a new year against the last one.
    pub fn validate_new_year(
        begin: NaiveDate,
        end: NaiveDate,
        last: Option<&FiscalYear>,
    ) -> Result<(), AccountingError> {
        if begin >= end {
            return Err(AccountingError::InvalidYearBounds { begin, end });
        }
        if let Some(last) = last {
            let expected = last.end + Days::new(1);
            if begin != expected {
                return Err(AccountingError::YearNotContiguous { expected });
            }
        }
        Ok(())
    }

    /// Last year of a list (the one without successor).
    #[must_use]
    pub fn last_year(years: &[FiscalYear]) -> Option<&FiscalYear> {
        years.iter().max_by_key(|y| y.end)
    }

    /// Only the last year may be modified or deleted.
    pub fn ensure_last(year: &FiscalYear, years: &[FiscalYear]) -> Result<(), AccountingError> {
        match Self::last_year(years) {
            Some(last) if last.id == year.id => Ok(()),
            _ => Err(AccountingError::YearNotLast),
        }
    }

    /// Deletion rules: finished years are kept, and only the last one goes.
    pub fn validate_delete(year: &FiscalYear, years: &[FiscalYear]) -> Result<(), AccountingError> {
        if year.is_finished() {
            return Err(AccountingError::YearFinished);
        }
        Self::ensure_last(year, years)
    }

    /// Modification rules of the bounds of a year.
    pub fn validate_modify(
        year: &FiscalYear,
        years: &[FiscalYear],
        begin: NaiveDate,
        end: NaiveDate,
    ) -> Result<(), AccountingError> {
        if year.is_finished() {
            return Err(AccountingError::YearFinished);
        }
        Self::ensure_last(year, years)?;
        let previous = year
            .last_year_id
            .and_then(|id| years.iter().find(|y| y.id == id));
        Self::validate_new_year(begin, end, previous)
    }

    /// Makes `id` the only active year.
    pub fn set_active(years: &mut [FiscalYear], id: FiscalYearId) -> Result<(), AccountingError> {
        if !years.iter().any(|y| y.id == id) {
            return Err(AccountingError::NoCurrentYear);
        }
        for year in years.iter_mut() {
            year.is_active = year.id == id;
        }
        Ok(())
    }

    /// Selected year, or the active one.
    pub fn current(
        years: &[FiscalYear],
        selected: Option<FiscalYearId>,
    ) -> Result<&FiscalYear, AccountingError> {
        let found = match selected {
            Some(id) => years.iter().find(|y| y.id == id),
            None => years.iter().find(|y| y.is_active),
        };
        found.ok_or(AccountingError::NoCurrentYear)
    }

    /// Letter used in document numbers for a year.
    #[must_use]
    pub fn year_letter(year: &FiscalYear) -> String {
        letter_for(u32::try_from(year.letter_index).unwrap_or(0))
    }

    /// Checks that a date can receive entries in this year.
    pub fn check_date(year: &FiscalYear, date: NaiveDate) -> Result<(), AccountingError> {
        if year.is_finished() {
            return Err(AccountingError::YearFinished);
        }
        if !year.contains(date) {
            return Err(AccountingError::DateOutsideYear {
                date,
                begin: year.begin,
                end: year.end,
            });
        }
        Ok(())
    }

    /// Building → Running, once the previous year has begun.
    pub fn begin_year(year: &mut FiscalYear, previous: Option<&FiscalYear>) -> Result<(), AccountingError> {
        if year.status != FiscalYearStatus::Building {
            return Err(AccountingError::InvalidYearStatus);
        }
        if previous.is_some_and(|p| p.status == FiscalYearStatus::Building) {
            return Err(AccountingError::PreviousYearBuilding);
        }
        year.status = FiscalYearStatus::Running;
        Ok(())
    }

    /// Revenue, expense and treasury totals over the entries of a year.
    #[must_use]
    pub fn total_result<S: AccountingSystem + ?Sized>(system: &S, entries: &[Entry]) -> YearResult {
        let mut result = YearResult::default();
        for entry in entries {
            for line in &entry.lines {
                if system.is_revenue(&line.account_code) {
                    result.revenue += line.amount;
                } else if system.is_expense(&line.account_code) {
                    result.expense -= line.amount;
                } else if system.is_cash(&line.account_code) {
                    result.cash -= line.amount;
                    if entry.close {
                        result.closed_cash -= line.amount;
                    }
                }
            }
        }
        result.result = result.revenue - result.expense;
        result
    }

    /// Running → Finished. Returns the closing entry moving every revenue and
    /// expense balance to the result account, when there is anything to move.
    pub fn close_year<S: AccountingSystem + ?Sized>(
        system: &S,
        year: &mut FiscalYear,
        entries: &[Entry],
    ) -> Result<Option<Entry>, AccountingError> {
        if year.status != FiscalYearStatus::Running {
            return Err(AccountingError::InvalidYearStatus);
        }
        let building = entries.iter().filter(|e| e.year_id == year.id && !e.close).count();
        if building > 0 {
            return Err(AccountingError::YearHasBuildingEntries(building));
        }

        let mut balances: BTreeMap<&str, Decimal> = BTreeMap::new();
        for line in entries.iter().flat_map(|e| e.lines.iter()) {
            if system.is_revenue(&line.account_code) || system.is_expense(&line.account_code) {
                *balances.entry(line.account_code.as_str()).or_default() += line.amount;
            }
        }

        year.status = FiscalYearStatus::Finished;

        let mut closing = Entry::new(year.id, Journal::OTHER, year.end, "Closing of fiscal year");
        let mut result = Decimal::ZERO;
        for (code, balance) in balances.into_iter().filter(|(_, b)| !b.is_zero()) {
            closing.lines.push(EntryLine::new(code, -balance));
            result += balance;
        }
        if closing.lines.is_empty() {
            return Ok(None);
        }
        if !result.is_zero() {
            let account = if result > Decimal::ZERO {
                system.result_profit_account()
            } else {
                system.result_loss_account()
            };
            closing.lines.push(EntryLine::new(account, result));
        }
        closing.close = true;
        closing.date_entry = Some(year.end);
        Ok(Some(closing))
    }

    /// Opening entry of `year` carrying every balance-sheet balance of the
    /// finished previous year, keeping the third detail. Results of the
    /// previous year land on the reported account.
    pub fn report_last_year<S: AccountingSystem + ?Sized>(
        system: &S,
        year: &FiscalYear,
        previous: &FiscalYear,
        previous_entries: &[Entry],
    ) -> Result<Option<Entry>, AccountingError> {
        if !previous.is_finished() {
            return Err(AccountingError::PreviousYearNotFinished);
        }
        if year.status != FiscalYearStatus::Building {
            return Err(AccountingError::InvalidYearStatus);
        }

        let result_accounts = [system.result_profit_account(), system.result_loss_account()];
        let mut balances: BTreeMap<(String, Option<ThirdId>), Decimal> = BTreeMap::new();
        for line in previous_entries.iter().flat_map(|e| e.lines.iter()) {
            if !system.is_balance_sheet(&line.account_code) {
                continue;
            }
            let code = if result_accounts.contains(&line.account_code.as_str()) {
                system.reported_account().to_string()
            } else {
                line.account_code.clone()
            };
            *balances.entry((code, line.third_id)).or_default() += line.amount;
        }

        let mut opening = Entry::new(year.id, Journal::REPORTED, year.begin, "Report of last year");
        for ((code, third_id), balance) in balances {
            if balance.is_zero() {
                continue;
            }
            let mut line = EntryLine::new(code, balance);
            line.third_id = third_id;
            opening.lines.push(line);
        }
        Ok((!opening.lines.is_empty()).then_some(opening))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::chart::FrenchSystem;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn year(begin: NaiveDate, end: NaiveDate, status: FiscalYearStatus) -> FiscalYear {
        FiscalYear {
            id: FiscalYearId::new(),
            begin,
            end,
            status,
            is_active: false,
            last_year_id: None,
            letter_index: 0,
        }
    }

    fn closed_entry(year: &FiscalYear, lines: Vec<EntryLine>) -> Entry {
        let mut entry = Entry::new(year.id, Journal::SELLING, year.begin, "x");
        entry.lines = lines;
        entry.close = true;
        entry
    }

    #[test]
    fn test_next_year_bounds() {
        let first = year(date(2024, 1, 1), date(2024, 12, 31), FiscalYearStatus::Running);
        assert_eq!(
            FiscalService::next_year_bounds(Some(&first), date(2030, 5, 5)),
            (date(2025, 1, 1), date(2025, 12, 31))
        );
        assert_eq!(
            FiscalService::next_year_bounds(None, date(2024, 7, 1)),
            (date(2024, 7, 1), date(2025, 6, 30))
        );
    }

    #[test]
    fn test_new_year_must_follow_last() {
        let last = year(date(2024, 1, 1), date(2024, 12, 31), FiscalYearStatus::Running);
        assert!(FiscalService::validate_new_year(date(2025, 1, 1), date(2025, 12, 31), Some(&last)).is_ok());
        assert_eq!(
            FiscalService::validate_new_year(date(2025, 2, 1), date(2025, 12, 31), Some(&last)),
            Err(AccountingError::YearNotContiguous { expected: date(2025, 1, 1) })
        );
        assert!(matches!(
            FiscalService::validate_new_year(date(2025, 2, 1), date(2025, 1, 1), None),
            Err(AccountingError::InvalidYearBounds { .. })
        ));
    }

    #[test]
    fn test_only_last_year_deleted() {
        let first = year(date(2023, 1, 1), date(2023, 12, 31), FiscalYearStatus::Finished);
        let second = year(date(2024, 1, 1), date(2024, 12, 31), FiscalYearStatus::Running);
        let years = vec![first.clone(), second.clone()];
        assert_eq!(FiscalService::validate_delete(&first, &years), Err(AccountingError::YearFinished));
        assert!(FiscalService::validate_delete(&second, &years).is_ok());

        let building = year(date(2023, 1, 1), date(2023, 12, 31), FiscalYearStatus::Building);
        let years = vec![building.clone(), second];
        assert_eq!(FiscalService::validate_delete(&building, &years), Err(AccountingError::YearNotLast));
    }

    #[test]
    fn test_set_active_and_current() {
        let mut years = vec![
            year(date(2023, 1, 1), date(2023, 12, 31), FiscalYearStatus::Finished),
            year(date(2024, 1, 1), date(2024, 12, 31), FiscalYearStatus::Running),
        ];
        assert_eq!(FiscalService::current(&years, None), Err(AccountingError::NoCurrentYear));
        let id = years[1].id;
        FiscalService::set_active(&mut years, id).unwrap();
        assert_eq!(years.iter().filter(|y| y.is_active).count(), 1);
        assert_eq!(FiscalService::current(&years, None).unwrap().id, id);
        assert_eq!(FiscalService::current(&years, Some(years[0].id)).unwrap().id, years[0].id);
        assert!(FiscalService::set_active(&mut years, FiscalYearId::new()).is_err());
    }

    #[test]
    fn test_begin_year() {
        let previous = year(date(2023, 1, 1), date(2023, 12, 31), FiscalYearStatus::Building);
        let mut current = year(date(2024, 1, 1), date(2024, 12, 31), FiscalYearStatus::Building);
        assert_eq!(
            FiscalService::begin_year(&mut current, Some(&previous)),
            Err(AccountingError::PreviousYearBuilding)
        );
        FiscalService::begin_year(&mut current, None).unwrap();
        assert_eq!(current.status, FiscalYearStatus::Running);
        assert_eq!(FiscalService::begin_year(&mut current, None), Err(AccountingError::InvalidYearStatus));
    }

    #[test]
    fn test_year_letter() {
        let mut y = year(date(2024, 1, 1), date(2024, 12, 31), FiscalYearStatus::Running);
        assert_eq!(FiscalService::year_letter(&y), "A");
        y.letter_index = 2;
        assert_eq!(FiscalService::year_letter(&y), "C");
    }

    #[test]
    fn test_check_date() {
        let y = year(date(2024, 1, 1), date(2024, 12, 31), FiscalYearStatus::Running);
        assert!(FiscalService::check_date(&y, date(2024, 6, 1)).is_ok());
        assert!(matches!(
            FiscalService::check_date(&y, date(2025, 1, 1)),
            Err(AccountingError::DateOutsideYear { .. })
        ));
    }

    #[test]
    fn test_total_result() {
        let y = year(date(2024, 1, 1), date(2024, 12, 31), FiscalYearStatus::Running);
        let mut open = closed_entry(
            &y,
            vec![EntryLine::debit_of("627", dec!(5)), EntryLine::credit_of("512", dec!(5))],
        );
        open.close = false;
        let entries = vec![
            closed_entry(
                &y,
                vec![EntryLine::debit_of("512", dec!(120)), EntryLine::credit_of("706", dec!(120))],
            ),
            open,
        ];
        let result = FiscalService::total_result(&FrenchSystem, &entries);
        assert_eq!(result.revenue, dec!(120));
        assert_eq!(result.expense, dec!(5));
        assert_eq!(result.result, dec!(115));
        assert_eq!(result.cash, dec!(115));
        assert_eq!(result.closed_cash, dec!(120));
    }

    #[test]
    fn test_close_year_refused_with_building_entries() {
        let mut y = year(date(2024, 1, 1), date(2024, 12, 31), FiscalYearStatus::Running);
        let mut entry = closed_entry(&y, vec![]);
        entry.close = false;
        assert_eq!(
            FiscalService::close_year(&FrenchSystem, &mut y, &[entry]),
            Err(AccountingError::YearHasBuildingEntries(1))
        );
        assert_eq!(y.status, FiscalYearStatus::Running);
    }

    #[test]
    fn test_close_year_moves_result() {
        let mut y = year(date(2024, 1, 1), date(2024, 12, 31), FiscalYearStatus::Running);
        let entries = vec![
            closed_entry(
                &y,
                vec![EntryLine::debit_of("411", dec!(300)), EntryLine::credit_of("706", dec!(300))],
            ),
            closed_entry(
                &y,
                vec![EntryLine::debit_of("627", dec!(100)), EntryLine::credit_of("512", dec!(100))],
            ),
        ];
        let closing = FiscalService::close_year(&FrenchSystem, &mut y, &entries).unwrap().unwrap();
        assert_eq!(y.status, FiscalYearStatus::Finished);
        assert!(closing.is_balanced());
        assert!(closing.close);
        assert_eq!(closing.journal_id, Journal::OTHER);
        let profit = closing.lines.iter().find(|l| l.account_code == "120").unwrap();
        assert_eq!(profit.amount, dec!(200));
    }

    #[test]
    fn test_close_year_loss() {
        let mut y = year(date(2024, 1, 1), date(2024, 12, 31), FiscalYearStatus::Running);
        let entries = vec![closed_entry(
            &y,
            vec![EntryLine::debit_of("627", dec!(40)), EntryLine::credit_of("512", dec!(40))],
        )];
        let closing = FiscalService::close_year(&FrenchSystem, &mut y, &entries).unwrap().unwrap();
        let loss = closing.lines.iter().find(|l| l.account_code == "129").unwrap();
        assert_eq!(loss.debit(), dec!(40));
    }

    #[test]
    fn test_report_last_year_keeps_thirds() {
        let previous = year(date(2023, 1, 1), date(2023, 12, 31), FiscalYearStatus::Finished);
        let mut next = year(date(2024, 1, 1), date(2024, 12, 31), FiscalYearStatus::Building);
        next.last_year_id = Some(previous.id);
        let third = ThirdId::new();
        let entries = vec![
            closed_entry(
                &previous,
                vec![
                    EntryLine::debit_of("411", dec!(300)).with_third(third),
                    EntryLine::credit_of("706", dec!(300)),
                ],
            ),
            closed_entry(
                &previous,
                vec![EntryLine::debit_of("706", dec!(300)), EntryLine::credit_of("120", dec!(300))],
            ),
        ];
        let opening = FiscalService::report_last_year(&FrenchSystem, &next, &previous, &entries)
            .unwrap()
            .unwrap();
        assert_eq!(opening.journal_id, Journal::REPORTED);
        assert!(opening.is_balanced());
        assert_eq!(opening.lines.len(), 2);
        let customer = opening.lines.iter().find(|l| l.account_code == "411").unwrap();
        assert_eq!(customer.third_id, Some(third));
        assert!(opening.lines.iter().any(|l| l.account_code == "110" && l.amount == dec!(300)));
    }

    #[test]
    fn test_report_requires_finished_previous() {
        let previous = year(date(2023, 1, 1), date(2023, 12, 31), FiscalYearStatus::Running);
        let next = year(date(2024, 1, 1), date(2024, 12, 31), FiscalYearStatus::Building);
        assert_eq!(
            FiscalService::report_last_year(&FrenchSystem, &next, &previous, &[]),
            Err(AccountingError::PreviousYearNotFinished)
        );
    }
}
