//! Property-based tests for entries.
//!
//! - Closing numbers strictly increase inside a year
//! - Reversing twice restores the entry and keeps it balanced
//! - Linked payment entries cancel the third balance

use chrono::NaiveDate;
use diacamma_shared::types::{FiscalYearId, ThirdId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::chart::FrenchSystem;
use super::entry::EntryService;
use super::types::{Entry, EntryLine, Journal};

fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn sale(year_id: FiscalYearId, third: ThirdId, amounts: &[Decimal]) -> Entry {
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let mut entry = Entry::new(year_id, Journal::SELLING, date, "sale");
    let total: Decimal = amounts.iter().sum();
    entry.lines.push(EntryLine::debit_of("411", total).with_third(third));
    for amount in amounts {
        entry.lines.push(EntryLine::credit_of("706", *amount));
    }
    entry
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_closing_numbers_increase(count in 1usize..20) {
        let year_id = FiscalYearId::new();
        let today = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let mut entries: Vec<Entry> = (0..count)
            .map(|_| sale(year_id, ThirdId::new(), &[Decimal::ONE]))
            .collect();
        for index in 0..count {
            let num = EntryService::next_num(&entries);
            EntryService::close(&mut entries[index], num, today).unwrap();
        }
        let nums: Vec<i32> = entries.iter().filter_map(|e| e.num).collect();
        prop_assert!(nums.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(nums.last().copied(), Some(i32::try_from(count).unwrap()));
    }

    #[test]
    fn prop_reverse_twice_is_identity(amounts in proptest::collection::vec(positive_amount(), 1..8)) {
        let original = sale(FiscalYearId::new(), ThirdId::new(), &amounts);
        let mut entry = original.clone();
        EntryService::reverse(&mut entry).unwrap();
        prop_assert!(entry.is_balanced());
        prop_assert_eq!(entry.total_debit(), original.total_credit());
        EntryService::reverse(&mut entry).unwrap();
        prop_assert_eq!(entry, original);
    }

    #[test]
    fn prop_linked_entry_cancels_third(amounts in proptest::collection::vec(positive_amount(), 1..8)) {
        let third = ThirdId::new();
        let year_id = FiscalYearId::new();
        let entry = sale(year_id, third, &amounts);
        let today = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let linked = EntryService::create_linked(&FrenchSystem, &entry, year_id, today).unwrap();
        let third_sum: Decimal = entry
            .lines
            .iter()
            .chain(linked.lines.iter())
            .filter(|l| l.third_id == Some(third))
            .map(|l| l.amount)
            .sum();
        prop_assert_eq!(third_sum, Decimal::ZERO);
    }
}
