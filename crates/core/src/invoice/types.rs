//! Commercial document types.

use chrono::NaiveDate;
use diacamma_shared::types::{
    ArticleId, BillId, CategoryBillId, CategoryId, CostAccountingId, CurrencyFormat, DetailId,
    EntryId, FiscalYearId, StorageAreaId, ThirdId, VatId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of commercial document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillType {
    /// Quotation, never posted.
    Quotation,
    /// Invoice.
    Bill,
    /// Credit note.
    Asset,
    /// Receipt (invoice paid on the spot).
    Receipt,
    /// Order, never posted.
    Order,
    /// Online cart, never posted.
    Cart,
}

impl BillType {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Quotation => 0,
            Self::Bill => 1,
            Self::Asset => 2,
            Self::Receipt => 3,
            Self::Order => 4,
            Self::Cart => 5,
        }
    }

    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Quotation),
            1 => Some(Self::Bill),
            2 => Some(Self::Asset),
            3 => Some(Self::Receipt),
            4 => Some(Self::Order),
            5 => Some(Self::Cart),
            _ => None,
        }
    }

    /// Credit notes run the other way.
    #[must_use]
    pub const fn is_revenue(self) -> bool {
        !matches!(self, Self::Asset)
    }

    /// Documents generating a ledger entry on validation.
    #[must_use]
    pub const fn posts_entry(self) -> bool {
        matches!(self, Self::Bill | Self::Asset | Self::Receipt)
    }

    /// Label used in designations.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Quotation => "quotation",
            Self::Bill => "bill",
            Self::Asset => "credit note",
            Self::Receipt => "receipt",
            Self::Order => "order",
            Self::Cart => "cart",
        }
    }
}

/// Document status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    /// Editable.
    Building,
    /// Numbered and posted.
    Valid,
    /// Cancelled quotation or order.
    Cancelled,
    /// Archived.
    Archived,
}

impl BillStatus {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Building => 0,
            Self::Valid => 1,
            Self::Cancelled => 2,
            Self::Archived => 3,
        }
    }

    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Building),
            1 => Some(Self::Valid),
            2 => Some(Self::Cancelled),
            3 => Some(Self::Archived),
            _ => None,
        }
    }
}

/// How prices relate to VAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatMode {
    /// No VAT at all.
    #[default]
    NoVat,
    /// Prices are given without VAT.
    PriceExcludingVat,
    /// Prices are given VAT included.
    PriceIncludingVat,
}

impl VatMode {
    /// Decodes the configured mode; unknown values disable VAT.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::PriceExcludingVat,
            2 => Self::PriceIncludingVat,
            _ => Self::NoVat,
        }
    }
}

/// VAT rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vat {
    /// VAT id.
    pub id: VatId,
    /// Name.
    pub name: String,
    /// Rate in percent.
    pub rate: Decimal,
    /// Offered on new articles.
    pub is_active: bool,
}

/// Stock management of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stockable {
    /// Not stocked.
    #[default]
    No,
    /// Stocked, sold and bought.
    Yes,
    /// Stocked, bought only.
    YesNotSellable,
    /// Stocked, sold only.
    YesNotPurchasable,
}

impl Stockable {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::No => 0,
            Self::Yes => 1,
            Self::YesNotSellable => 2,
            Self::YesNotPurchasable => 3,
        }
    }

    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::No),
            1 => Some(Self::Yes),
            2 => Some(Self::YesNotSellable),
            3 => Some(Self::YesNotPurchasable),
            _ => None,
        }
    }

    /// Returns true when the article has a stock.
    #[must_use]
    pub const fn is_stocked(self) -> bool {
        !matches!(self, Self::No)
    }
}

/// Article category, used by automatic reductions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id.
    pub id: CategoryId,
    /// Name.
    pub name: String,
    /// Description.
    pub designation: String,
}

/// Sold article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Article id.
    pub id: ArticleId,
    /// Unique reference.
    pub reference: String,
    /// Default designation.
    pub designation: String,
    /// Default price.
    pub price: Decimal,
    /// Unit label.
    pub unit: String,
    /// Revenue account.
    pub sell_account: String,
    /// VAT rate.
    pub vat_id: Option<VatId>,
    /// Stock management.
    pub stockable: Stockable,
    /// Categories.
    pub category_ids: Vec<CategoryId>,
    /// Hidden from new documents.
    pub is_disabled: bool,
}

/// Document category with its own numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBill {
    /// Category id.
    pub id: CategoryBillId,
    /// Name.
    pub name: String,
    /// Prefix of document numbers.
    pub prefix_numbering: String,
    /// Numbering sequence separate from other categories.
    pub special_numbering: bool,
    /// Category of new documents.
    pub is_default: bool,
}

/// Commercial document header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    /// Document id.
    pub id: BillId,
    /// Kind.
    pub bill_type: BillType,
    /// Number, assigned on validation.
    pub num: Option<i32>,
    /// Displayed number (`A-1`).
    pub num_txt: Option<String>,
    /// Fiscal year of the number.
    pub fiscal_year_id: Option<FiscalYearId>,
    /// Document date.
    pub date: NaiveDate,
    /// Customer.
    pub third_id: Option<ThirdId>,
    /// Comment.
    pub comment: String,
    /// Status.
    pub status: BillStatus,
    /// Posted entry.
    pub entry_id: Option<EntryId>,
    /// Document this one derives from.
    pub parent_id: Option<BillId>,
    /// Analytic tag of the posted entry.
    pub cost_accounting_id: Option<CostAccountingId>,
    /// Category.
    pub category_id: Option<CategoryBillId>,
}

impl Bill {
    /// Creates a building document.
    #[must_use]
    pub fn new(bill_type: BillType, date: NaiveDate, third_id: Option<ThirdId>) -> Self {
        Self {
            id: BillId::new(),
            bill_type,
            num: None,
            num_txt: None,
            fiscal_year_id: None,
            date,
            third_id,
            comment: String::new(),
            status: BillStatus::Building,
            entry_id: None,
            parent_id: None,
            cost_accounting_id: None,
            category_id: None,
        }
    }

    /// `"bill A-1"`, or the bare title before numbering.
    #[must_use]
    pub fn designation(&self) -> String {
        match &self.num_txt {
            Some(num) => format!("{} {num}", self.bill_type.title()),
            None => self.bill_type.title().to_string(),
        }
    }

    /// Returns true while details may change.
    #[must_use]
    pub fn is_building(&self) -> bool {
        self.status == BillStatus::Building
    }
}

/// Document line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    /// Line id.
    pub id: DetailId,
    /// Document.
    pub bill_id: BillId,
    /// Article, `None` for free lines.
    pub article_id: Option<ArticleId>,
    /// Designation.
    pub designation: String,
    /// Unit price.
    pub price: Decimal,
    /// Unit label.
    pub unit: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Reduction amount.
    pub reduce: Decimal,
    /// VAT rate in percent.
    pub vat_rate: Decimal,
    /// Storage area of stocked articles.
    pub storagearea_id: Option<StorageAreaId>,
}

/// Invoicing parameters handed over by the application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceParams {
    /// VAT handling.
    pub vat_mode: VatMode,
    /// Revenue account of free lines.
    pub default_sell_account: String,
    /// Account receiving reductions.
    pub reduce_account: String,
    /// Account receiving collected VAT.
    pub vat_sell_account: String,
    /// Currency rounding.
    pub currency: CurrencyFormat,
}

impl Default for InvoiceParams {
    fn default() -> Self {
        Self {
            vat_mode: VatMode::NoVat,
            default_sell_account: "706".to_string(),
            reduce_account: "709".to_string(),
            vat_sell_account: "4455".to_string(),
            currency: CurrencyFormat::default(),
        }
    }
}
