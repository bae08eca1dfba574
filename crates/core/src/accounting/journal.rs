//! Journal rules. Journals 1 to 5 are created by the system.

use super::error::AccountingError;
use super::types::Journal;

/// Journal maintenance rules.
pub struct JournalService;

impl JournalService {
    /// Names of the reserved journals, by id.
    pub const RESERVED: [(i32, &'static str); 5] = [
        (Journal::REPORTED, "Last year report"),
        (Journal::BUYING, "Buying"),
        (Journal::SELLING, "Selling"),
        (Journal::PAYMENT, "Payment"),
        (Journal::OTHER, "Other"),
    ];

    /// Builds a user journal.
    pub fn create(id: i32, name: &str) -> Result<Journal, AccountingError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AccountingError::JournalNameEmpty);
        }
        Ok(Journal {
            id,
            name: name.to_string(),
            is_reserved: Journal::is_reserved_id(id),
        })
    }

    /// Renames a user journal.
    pub fn rename(journal: &mut Journal, name: &str) -> Result<(), AccountingError> {
        if journal.is_reserved {
            return Err(AccountingError::JournalReserved);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(AccountingError::JournalNameEmpty);
        }
        journal.name = name.to_string();
        Ok(())
    }

    /// Deletion rules.
    pub fn validate_delete(journal: &Journal, has_entries: bool) -> Result<(), AccountingError> {
        if journal.is_reserved {
            return Err(AccountingError::JournalReserved);
        }
        if has_entries {
            return Err(AccountingError::JournalInUse(journal.id));
        }
        Ok(())
    }
}
