//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `BillId` where an `EntryId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(FiscalYearId, "Unique identifier for a fiscal year.");
typed_id!(ChartAccountId, "Unique identifier for a chart of accounts entry.");
typed_id!(ThirdId, "Unique identifier for a customer or supplier.");
typed_id!(AccountThirdId, "Unique identifier for an account of a third.");
typed_id!(EntryId, "Unique identifier for an accounting entry.");
typed_id!(EntryLineId, "Unique identifier for an accounting entry line.");
typed_id!(AccountLinkId, "Unique identifier for a lettering link.");
typed_id!(ModelEntryId, "Unique identifier for an entry model.");
typed_id!(ModelLineId, "Unique identifier for a line of an entry model.");
typed_id!(CostAccountingId, "Unique identifier for a cost accounting.");
typed_id!(ArticleId, "Unique identifier for an article.");
typed_id!(CategoryId, "Unique identifier for an article category.");
typed_id!(VatId, "Unique identifier for a VAT rate.");
typed_id!(CategoryBillId, "Unique identifier for a document category.");
typed_id!(AutomaticReduceId, "Unique identifier for an automatic reduction rule.");
typed_id!(BillId, "Unique identifier for a commercial document.");
typed_id!(DetailId, "Unique identifier for a document line.");
typed_id!(PayoffId, "Unique identifier for a payoff.");
typed_id!(BankAccountId, "Unique identifier for a bank account.");
typed_id!(PaymentMethodId, "Unique identifier for a payment method.");
typed_id!(BankTransactionId, "Unique identifier for a recorded bank transaction.");
typed_id!(StorageAreaId, "Unique identifier for a storage area.");
typed_id!(StorageSheetId, "Unique identifier for a storage sheet.");
typed_id!(StorageDetailId, "Unique identifier for a storage sheet line.");
typed_id!(InventorySheetId, "Unique identifier for an inventory sheet.");
typed_id!(InventoryDetailId, "Unique identifier for an inventory line.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_typed_id_roundtrip_through_string() {
        let id = BillId::new();
        let parsed = BillId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_invalid_id_rejected() {
        assert!(ThirdId::from_str("not-a-uuid").is_err());
    }
}
