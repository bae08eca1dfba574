//! Payoffs of commercial documents.
//!
//! - Payable documents and their rest to pay
//! - Multi-document payoffs split by rest or by date, with one payment entry
//! - Internal settlements between a credit note and a bill
//! - Automatic lettering once a group of documents is settled
//! - Payment methods and PayPal confirmation

pub mod error;
pub mod method;
pub mod service;
pub mod supporting;
pub mod types;

#[cfg(test)]
mod payoff_props;

pub use error::{PaymentError, PayoffError};
pub use method::{
    BankTransaction, BankTransactionStatus, Confirmation, ExternalPayment, PaymentMethod, PaymentService,
    PaymentType, PaymentVerifier, PayoffRequest, VerifyResult, is_valid_bic, is_valid_iban, parse_paypal_date,
};
pub use service::{PayoffContext, PayoffDeletion, PayoffGroup, PayoffService};
pub use supporting::PayoffBounds;
pub use types::{BankAccount, Payoff, PayoffInput, PayoffMode, Repartition, Supporting};
