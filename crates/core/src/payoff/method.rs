//! Payment methods offered on documents and confirmation of external
//! (PayPal) payments.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::America::Los_Angeles;
use diacamma_shared::types::{BankAccountId, BankTransactionId, BillId, PaymentMethodId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::PaymentError;
use super::types::{PayoffInput, PayoffMode, Repartition};

/// Kind of payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Bank transfer: IBAN, BIC.
    Transfer,
    /// Cheque: payable to, address.
    Cheque,
    /// PayPal: account email, control flag.
    PayPal,
    /// Online payment page: URL, information.
    Online,
}

impl PaymentType {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Transfer => 0,
            Self::Cheque => 1,
            Self::PayPal => 2,
            Self::Online => 3,
        }
    }

    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Transfer),
            1 => Some(Self::Cheque),
            2 => Some(Self::PayPal),
            3 => Some(Self::Online),
            _ => None,
        }
    }
}

/// Payment method printed on documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Method id.
    pub id: PaymentMethodId,
    /// Kind.
    pub paytype: PaymentType,
    /// Bank account receiving the payments.
    pub bank_account_id: BankAccountId,
    /// Kind specific values.
    pub extra_data: Vec<String>,
}

impl PaymentMethod {
    /// Checks the kind specific values.
    pub fn validate_extra_data(paytype: PaymentType, data: &[String]) -> Result<(), PaymentError> {
        if data.len() != 2 {
            return Err(PaymentError::ExtraDataCount {
                expected: 2,
                got: data.len(),
            });
        }
        match paytype {
            PaymentType::Transfer => {
                if !is_valid_iban(&data[0]) {
                    return Err(PaymentError::InvalidIban(data[0].clone()));
                }
                if !is_valid_bic(&data[1]) {
                    return Err(PaymentError::InvalidBic(data[1].clone()));
                }
            }
            PaymentType::Cheque => {
                if data[0].trim().is_empty() {
                    return Err(PaymentError::PayeeRequired);
                }
            }
            PaymentType::PayPal => {
                if !data[0].contains('@') {
                    return Err(PaymentError::InvalidEmail(data[0].clone()));
                }
            }
            PaymentType::Online => {
                if !data[0].starts_with("http") {
                    return Err(PaymentError::InvalidUrl(data[0].clone()));
                }
            }
        }
        Ok(())
    }

    /// PayPal account email.
    #[must_use]
    pub fn paypal_email(&self) -> Option<&str> {
        match self.paytype {
            PaymentType::PayPal => self.extra_data.first().map(String::as_str),
            _ => None,
        }
    }
}

/// IBAN: country, check digits, then an alphanumeric account whose
/// rearranged numeric form is 1 modulo 97.
#[must_use]
pub fn is_valid_iban(value: &str) -> bool {
    let iban: String = value.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase();
    if !(15..=34).contains(&iban.len()) || !iban.is_ascii() {
        return false;
    }
    let bytes = iban.as_bytes();
    if !bytes[..2].iter().all(u8::is_ascii_alphabetic)
        || !bytes[2..4].iter().all(u8::is_ascii_digit)
        || !bytes.iter().all(u8::is_ascii_alphanumeric)
    {
        return false;
    }
    let rearranged = iban[4..].chars().chain(iban[..4].chars());
    let mut remainder: u32 = 0;
    for c in rearranged {
        let Some(value) = c.to_digit(36) else {
            return false;
        };
        remainder = if value < 10 {
            (remainder * 10 + value) % 97
        } else {
            (remainder * 100 + value) % 97
        };
    }
    remainder == 1
}

/// BIC: four bank letters, two country letters, then 2 or 5 alphanumerics.
#[must_use]
pub fn is_valid_bic(value: &str) -> bool {
    let bic = value.trim().to_uppercase();
    let bytes = bic.as_bytes();
    (bytes.len() == 8 || bytes.len() == 11)
        && bytes[..6].iter().all(u8::is_ascii_alphabetic)
        && bytes[6..].iter().all(u8::is_ascii_alphanumeric)
}

/// Outcome of a bank transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankTransactionStatus {
    /// Not verified or not recorded.
    Failure,
    /// Payoff recorded.
    Success,
}

impl BankTransactionStatus {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Failure => 0,
            Self::Success => 1,
        }
    }

    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Failure),
            1 => Some(Self::Success),
            _ => None,
        }
    }
}

/// Log of a payment notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransaction {
    /// Transaction id.
    pub id: BankTransactionId,
    /// Payment time.
    pub date: DateTime<Utc>,
    /// Outcome.
    pub status: BankTransactionStatus,
    /// Payer name.
    pub payer: String,
    /// Paid amount.
    pub amount: Decimal,
    /// Received fields and processing messages.
    pub contains: String,
}

impl BankTransaction {
    /// Marks the transaction failed and logs the reason.
    pub fn record_error(&mut self, message: &str) {
        self.status = BankTransactionStatus::Failure;
        if !self.contains.is_empty() {
            self.contains.push('\n');
        }
        self.contains.push_str(message);
    }
}

/// Answer of the payment provider to a verification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    /// Notification confirmed.
    Verified,
    /// Notification rejected.
    Invalid,
    /// Any other answer.
    Other(String),
}

impl VerifyResult {
    /// Maps the provider response body.
    #[must_use]
    pub fn from_response(body: &str) -> Self {
        match body.trim() {
            "VERIFIED" => Self::Verified,
            "INVALID" => Self::Invalid,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Checks a notification with its provider.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Sends the received fields back to the provider.
    async fn verify(&self, fields: &[(String, String)]) -> Result<VerifyResult, PaymentError>;
}

/// Payment notification decoded from its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalPayment {
    /// Paid document (`custom` field).
    pub supporting_id: BillId,
    /// `first_name last_name`.
    pub payer: String,
    /// `mc_gross`.
    pub amount: Decimal,
    /// `payment_date`.
    pub date: DateTime<Utc>,
    /// `txn_id`.
    pub txn_id: String,
    /// `mc_fee`.
    pub fee: Decimal,
    /// `receiver_email`.
    pub receiver_email: String,
}

fn field<'a>(fields: &'a [(String, String)], name: &str) -> &'a str {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map_or("", |(_, value)| value.as_str())
}

fn amount_field(fields: &[(String, String)], name: &str) -> Result<Decimal, PaymentError> {
    let raw = field(fields, name).trim();
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(raw).map_err(|_| PaymentError::InvalidAmount(raw.to_string()))
}

impl ExternalPayment {
    /// Reads a PayPal notification.
    pub fn from_fields(fields: &[(String, String)], now: DateTime<Utc>) -> Result<Self, PaymentError> {
        let supporting_id = field(fields, "custom")
            .trim()
            .parse::<BillId>()
            .map_err(|_| PaymentError::MissingSupporting)?;
        let payer = format!("{} {}", field(fields, "first_name"), field(fields, "last_name"))
            .trim()
            .to_string();
        Ok(Self {
            supporting_id,
            payer,
            amount: amount_field(fields, "mc_gross")?,
            date: parse_paypal_date(field(fields, "payment_date"), now),
            txn_id: field(fields, "txn_id").to_string(),
            fee: amount_field(fields, "mc_fee")?,
            receiver_email: field(fields, "receiver_email").to_string(),
        })
    }
}

/// Parses `"HH:MM:SS Mon DD, YYYY PDT"` in Pacific time; `now` when unreadable.
#[must_use]
pub fn parse_paypal_date(value: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let trimmed = value.trim();
    let without_zone = trimmed.rsplit_once(' ').map_or(trimmed, |(head, _)| head);
    NaiveDateTime::parse_from_str(without_zone, "%H:%M:%S %b %d, %Y")
        .ok()
        .and_then(|naive| Los_Angeles.from_local_datetime(&naive).earliest())
        .map_or(now, |local| local.with_timezone(&Utc))
}

/// Payoff to record for a confirmed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoffRequest {
    /// Paid document.
    pub supporting_id: BillId,
    /// Payoff form.
    pub input: PayoffInput,
}

/// Result of a notification: the logged transaction and, when verified,
/// the payoff to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Transaction to store whatever happens next.
    pub transaction: BankTransaction,
    /// Payoff to record.
    pub payoff: Option<PayoffRequest>,
}

/// External payment confirmation.
pub struct PaymentService;

impl PaymentService {
    /// Builds the transaction log of a notification and, when the provider
    /// verified it, the payoff on the document.
    ///
    /// Status is `Success` once a payoff request exists; callers call
    /// [`BankTransaction::record_error`] if recording it fails.
    #[must_use]
    pub fn confirm(
        fields: &[(String, String)],
        verification: &VerifyResult,
        methods: &[PaymentMethod],
        now: DateTime<Utc>,
    ) -> Confirmation {
        let mut contains = fields
            .iter()
            .map(|(key, value)| format!("{key} = {value}"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut transaction = BankTransaction {
            id: BankTransactionId::new(),
            date: now,
            status: BankTransactionStatus::Failure,
            payer: String::new(),
            amount: Decimal::ZERO,
            contains: String::new(),
        };
        match verification {
            VerifyResult::Verified => {}
            VerifyResult::Invalid => {
                contains.push_str("\n--- INVALID ---");
                transaction.contains = contains;
                return Confirmation { transaction, payoff: None };
            }
            VerifyResult::Other(text) => {
                contains.push_str("\nNO VALID:");
                contains.push_str(text);
                transaction.contains = contains;
                return Confirmation { transaction, payoff: None };
            }
        }
        transaction.contains = contains;

        let payment = match ExternalPayment::from_fields(fields, now) {
            Ok(payment) => payment,
            Err(err) => {
                transaction.record_error(&err.to_string());
                return Confirmation { transaction, payoff: None };
            }
        };
        transaction.date = payment.date;
        transaction.payer.clone_from(&payment.payer);
        transaction.amount = payment.amount;

        let Some(method) = methods
            .iter()
            .find(|m| m.paypal_email() == Some(payment.receiver_email.as_str()))
        else {
            transaction.record_error(&PaymentError::NoPaypalAccount.to_string());
            return Confirmation { transaction, payoff: None };
        };
        transaction.status = BankTransactionStatus::Success;
        let input = PayoffInput {
            amount: payment.amount,
            date: payment.date.date_naive(),
            mode: PayoffMode::Transfer,
            payer: payment.payer,
            reference: format!("PayPal {}", payment.txn_id),
            bank_account_id: Some(method.bank_account_id),
            bank_fee: payment.fee,
            repartition: Repartition::ByRest,
        };
        Confirmation {
            transaction,
            payoff: Some(PayoffRequest {
                supporting_id: payment.supporting_id,
                input,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn fields(supporting: BillId) -> Vec<(String, String)> {
        [
            ("custom", supporting.to_string()),
            ("first_name", "Jack".to_string()),
            ("last_name", "Dalton".to_string()),
            ("mc_gross", "100.00".to_string()),
            ("mc_fee", "3.72".to_string()),
            ("txn_id", "6H9078312A9856729".to_string()),
            ("receiver_email", "monney@truc.org".to_string()),
            ("payment_date", "10:05:12 Apr 02, 2015 PDT".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn paypal() -> PaymentMethod {
        PaymentMethod {
            id: PaymentMethodId::new(),
            paytype: PaymentType::PayPal,
            bank_account_id: BankAccountId::new(),
            extra_data: vec!["monney@truc.org".into(), "1".into()],
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 4, 10, 0, 0, 0).unwrap()
    }

    #[rstest]
    #[case(PaymentType::Transfer, ["FR76 3000 6000 0112 3456 7890 189", "AGRIFRPP"], true)]
    #[case(PaymentType::Transfer, ["FR76 3000 6000 0112 3456 7890 188", "AGRIFRPP"], false)]
    #[case(PaymentType::Transfer, ["FR76 3000 6000 0112 3456 7890 189", "AGRI"], false)]
    #[case(PaymentType::Cheque, ["Truc", "1 rue de la paix"], true)]
    #[case(PaymentType::Cheque, [" ", "1 rue de la paix"], false)]
    #[case(PaymentType::PayPal, ["monney@truc.org", "1"], true)]
    #[case(PaymentType::PayPal, ["monney", "1"], false)]
    #[case(PaymentType::Online, ["https://pay.example.org", "info"], true)]
    #[case(PaymentType::Online, ["pay.example.org", "info"], false)]
    fn test_validate_extra_data(#[case] paytype: PaymentType, #[case] data: [&str; 2], #[case] ok: bool) {
        let data: Vec<String> = data.iter().map(ToString::to_string).collect();
        assert_eq!(PaymentMethod::validate_extra_data(paytype, &data).is_ok(), ok);
    }

    #[test]
    fn test_extra_data_count() {
        assert_eq!(
            PaymentMethod::validate_extra_data(PaymentType::Cheque, &["Truc".into()]),
            Err(PaymentError::ExtraDataCount { expected: 2, got: 1 })
        );
    }

    #[test]
    fn test_parse_paypal_date() {
        let parsed = parse_paypal_date("10:05:12 Apr 02, 2015 PDT", now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2015, 4, 2, 17, 5, 12).unwrap());
        let winter = parse_paypal_date("10:05:12 Jan 02, 2015 PST", now());
        assert_eq!(winter, Utc.with_ymd_and_hms(2015, 1, 2, 18, 5, 12).unwrap());
        assert_eq!(parse_paypal_date("yesterday", now()), now());
    }

    #[test]
    fn test_confirm_verified() {
        let bill = BillId::new();
        let method = paypal();
        let confirmation = PaymentService::confirm(&fields(bill), &VerifyResult::Verified, &[method.clone()], now());
        assert_eq!(confirmation.transaction.status, BankTransactionStatus::Success);
        assert_eq!(confirmation.transaction.payer, "Jack Dalton");
        assert_eq!(confirmation.transaction.amount, dec!(100));
        assert!(confirmation.transaction.contains.starts_with(&format!("custom = {bill}\nfirst_name = Jack")));
        let request = confirmation.payoff.unwrap();
        assert_eq!(request.supporting_id, bill);
        assert_eq!(request.input.reference, "PayPal 6H9078312A9856729");
        assert_eq!(request.input.bank_fee, dec!(3.72));
        assert_eq!(request.input.mode, PayoffMode::Transfer);
        assert_eq!(request.input.bank_account_id, Some(method.bank_account_id));
        assert_eq!(request.input.date, NaiveDate::from_ymd_opt(2015, 4, 2).unwrap());
    }

    #[test]
    fn test_confirm_rejected() {
        let bill = BillId::new();
        let invalid = PaymentService::confirm(&fields(bill), &VerifyResult::Invalid, &[paypal()], now());
        assert!(invalid.payoff.is_none());
        assert_eq!(invalid.transaction.status, BankTransactionStatus::Failure);
        assert!(invalid.transaction.contains.ends_with("\n--- INVALID ---"));

        let other = PaymentService::confirm(&fields(bill), &VerifyResult::from_response("oops"), &[paypal()], now());
        assert!(other.transaction.contains.ends_with("\nNO VALID:oops"));

        let unknown = PaymentService::confirm(&fields(bill), &VerifyResult::Verified, &[], now());
        assert!(unknown.payoff.is_none());
        assert!(unknown.transaction.contains.ends_with("\nNo paypal account!"));
        assert_eq!(unknown.transaction.status, BankTransactionStatus::Failure);
    }

    #[test]
    fn test_record_error() {
        let mut confirmation = PaymentService::confirm(&fields(BillId::new()), &VerifyResult::Verified, &[paypal()], now());
        confirmation.transaction.record_error("Document not payable");
        assert_eq!(confirmation.transaction.status, BankTransactionStatus::Failure);
        assert!(confirmation.transaction.contains.ends_with("\nDocument not payable"));
    }
}
