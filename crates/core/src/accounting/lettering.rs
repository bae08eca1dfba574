//! Lettering: matching third lines of several entries under one letter.

use std::collections::HashSet;

use diacamma_shared::types::{AccountLinkId, ThirdId};
use rust_decimal::Decimal;

use super::chart::AccountingSystem;
use super::error::AccountingError;
use super::types::{AccountLink, Entry};

/// Letter of rank `index`: `A`..`Z`, then `AA`, `AB`...
#[must_use]
pub fn letter_for(index: u32) -> String {
    let mut n = u64::from(index) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        let offset = u8::try_from(n % 26).unwrap_or(0);
        letters.push(char::from(b'A' + offset));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// First letter not used yet in the fiscal year.
#[must_use]
pub fn next_letter(used: &[String]) -> String {
    let used: HashSet<&str> = used.iter().map(String::as_str).collect();
    (0..)
        .map(letter_for)
        .find(|letter| !used.contains(letter.as_str()))
        .unwrap_or_default()
}

/// Lettering rules.
pub struct LetteringService;

impl LetteringService {
    /// Checks that entries can be lettered together and returns the new link.
    ///
    /// Every entry needs third lines; all third lines must share one third and
    /// one account and sum to zero.
    pub fn create_link<S: AccountingSystem + ?Sized>(
        system: &S,
        entries: &[Entry],
        used_letters: &[String],
    ) -> Result<AccountLink, AccountingError> {
        let first = match entries {
            [first, _, ..] => first,
            _ => return Err(AccountingError::LetteringTooFewEntries),
        };

        let mut target: Option<(&str, Option<ThirdId>)> = None;
        let mut total = Decimal::ZERO;
        for entry in entries {
            if entry.is_lettered() {
                return Err(AccountingError::EntryAlreadyLettered(entry.id));
            }
            if entry.year_id != first.year_id {
                return Err(AccountingError::LetteringMixedYears);
            }
            let mut has_third = false;
            for line in entry.lines.iter().filter(|l| system.is_third(&l.account_code)) {
                has_third = true;
                let key = (line.account_code.as_str(), line.third_id);
                match target {
                    None => target = Some(key),
                    Some(existing) if existing != key => return Err(AccountingError::LetteringMixedThirds),
                    Some(_) => {}
                }
                total += line.amount;
            }
            if !has_third {
                return Err(AccountingError::EntryWithoutThird(entry.id));
            }
        }
        if !total.is_zero() {
            return Err(AccountingError::LetteringNotBalanced(total));
        }

        Ok(AccountLink {
            id: AccountLinkId::new(),
            year_id: first.year_id,
            letter: next_letter(used_letters),
        })
    }

    /// Attaches the link to the entries.
    pub fn apply(entries: &mut [Entry], link: &AccountLink) {
        for entry in entries {
            entry.link_id = Some(link.id);
        }
    }

    /// Clears a link from every entry sharing it.
    pub fn unlink(entries: &mut [Entry], link_id: AccountLinkId) -> usize {
        let mut cleared = 0;
        for entry in entries.iter_mut().filter(|e| e.link_id == Some(link_id)) {
            entry.link_id = None;
            cleared += 1;
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::chart::FrenchSystem;
    use crate::accounting::types::{EntryLine, Journal};
    use chrono::NaiveDate;
    use diacamma_shared::types::FiscalYearId;
    use rust_decimal_macros::dec;

    fn entry(year_id: FiscalYearId, lines: Vec<EntryLine>) -> Entry {
        let mut entry = Entry::new(
            year_id,
            Journal::SELLING,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "x",
        );
        entry.lines = lines;
        entry
    }

    fn bill_and_payment(third: ThirdId, paid: Decimal) -> Vec<Entry> {
        let year_id = FiscalYearId::new();
        vec![
            entry(
                year_id,
                vec![
                    EntryLine::debit_of("411", dec!(100)).with_third(third),
                    EntryLine::credit_of("706", dec!(100)),
                ],
            ),
            entry(
                year_id,
                vec![
                    EntryLine::credit_of("411", paid).with_third(third),
                    EntryLine::debit_of("512", paid),
                ],
            ),
        ]
    }

    #[test]
    fn test_letters() {
        assert_eq!(letter_for(0), "A");
        assert_eq!(letter_for(25), "Z");
        assert_eq!(letter_for(26), "AA");
        assert_eq!(letter_for(27), "AB");
        assert_eq!(letter_for(701), "ZZ");
        assert_eq!(letter_for(702), "AAA");
    }

    #[test]
    fn test_next_letter_skips_used() {
        assert_eq!(next_letter(&[]), "A");
        assert_eq!(next_letter(&["A".into(), "B".into()]), "C");
        assert_eq!(next_letter(&["B".into()]), "A");
    }

    #[test]
    fn test_create_link_balanced() {
        let third = ThirdId::new();
        let mut entries = bill_and_payment(third, dec!(100));
        let link = LetteringService::create_link(&FrenchSystem, &entries, &["A".into()]).unwrap();
        assert_eq!(link.letter, "B");
        assert_eq!(link.year_id, entries[0].year_id);

        LetteringService::apply(&mut entries, &link);
        assert!(entries.iter().all(Entry::is_lettered));
        assert!(matches!(
            LetteringService::create_link(&FrenchSystem, &entries, &[]),
            Err(AccountingError::EntryAlreadyLettered(_))
        ));
        assert_eq!(LetteringService::unlink(&mut entries, link.id), 2);
        assert!(!entries.iter().any(Entry::is_lettered));
    }

    #[test]
    fn test_create_link_not_balanced() {
        let entries = bill_and_payment(ThirdId::new(), dec!(60));
        assert_eq!(
            LetteringService::create_link(&FrenchSystem, &entries, &[]),
            Err(AccountingError::LetteringNotBalanced(dec!(-40)))
        );
    }

    #[test]
    fn test_create_link_needs_two_entries() {
        let entries = bill_and_payment(ThirdId::new(), dec!(100));
        assert_eq!(
            LetteringService::create_link(&FrenchSystem, &entries[..1], &[]),
            Err(AccountingError::LetteringTooFewEntries)
        );
    }

    #[test]
    fn test_create_link_mixed_thirds() {
        let mut entries = bill_and_payment(ThirdId::new(), dec!(100));
        entries[1].lines[0].third_id = Some(ThirdId::new());
        assert_eq!(
            LetteringService::create_link(&FrenchSystem, &entries, &[]),
            Err(AccountingError::LetteringMixedThirds)
        );
    }

    #[test]
    fn test_create_link_without_third() {
        let mut entries = bill_and_payment(ThirdId::new(), dec!(100));
        entries[1].lines[0].account_code = "580".into();
        assert!(matches!(
            LetteringService::create_link(&FrenchSystem, &entries, &[]),
            Err(AccountingError::EntryWithoutThird(_))
        ));
    }

    #[test]
    fn test_create_link_mixed_years() {
        let mut entries = bill_and_payment(ThirdId::new(), dec!(100));
        entries[1].year_id = FiscalYearId::new();
        assert_eq!(
            LetteringService::create_link(&FrenchSystem, &entries, &[]),
            Err(AccountingError::LetteringMixedYears)
        );
    }
}
