//! Property-based tests for lettering.
//!
//! - Letters are unique per rank
//! - The next letter is never one already used
//! - Balanced third lines always letter together

use std::collections::HashSet;

use chrono::NaiveDate;
use diacamma_shared::types::{FiscalYearId, ThirdId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::chart::FrenchSystem;
use super::lettering::{LetteringService, letter_for, next_letter};
use super::types::{Entry, EntryLine, Journal};

fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_letters_unique(start in 0u32..5_000, len in 1usize..200) {
        let letters: HashSet<String> = (start..start + u32::try_from(len).unwrap()).map(letter_for).collect();
        prop_assert_eq!(letters.len(), len);
        prop_assert!(letters.iter().all(|l| l.chars().all(|c| c.is_ascii_uppercase())));
    }

    #[test]
    fn prop_next_letter_is_free(used in proptest::collection::vec(0u32..60, 0..40)) {
        let used: Vec<String> = used.into_iter().map(letter_for).collect();
        let next = next_letter(&used);
        prop_assert!(!used.contains(&next));
    }

    #[test]
    fn prop_balanced_payments_letter(total in positive_amount(), split in 1u32..99) {
        let third = ThirdId::new();
        let year_id = FiscalYearId::new();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let first = (total * Decimal::from(split) / Decimal::ONE_HUNDRED).round_dp(2);
        let second = total - first;

        let mut bill = Entry::new(year_id, Journal::SELLING, date, "bill");
        bill.lines = vec![
            EntryLine::debit_of("411", total).with_third(third),
            EntryLine::credit_of("706", total),
        ];
        let mut entries = vec![bill];
        for part in [first, second] {
            let mut payment = Entry::new(year_id, Journal::PAYMENT, date, "payment");
            payment.lines = vec![
                EntryLine::credit_of("411", part).with_third(third),
                EntryLine::debit_of("512", part),
            ];
            entries.push(payment);
        }

        let link = LetteringService::create_link(&FrenchSystem, &entries, &[]);
        prop_assert!(link.is_ok());
    }
}
