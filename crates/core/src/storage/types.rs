//! Stock domain types.

use chrono::NaiveDate;
use diacamma_shared::types::{
    ArticleId, CurrencyFormat, InventoryDetailId, InventorySheetId, StorageAreaId, StorageDetailId,
    StorageSheetId, ThirdId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Place where articles are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageArea {
    /// Area id.
    pub id: StorageAreaId,
    /// Short name.
    pub name: String,
    /// Description.
    pub designation: String,
}

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetType {
    /// Goods coming in.
    Receipt,
    /// Goods going out.
    Exit,
}

impl SheetType {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Receipt => 0,
            Self::Exit => 1,
        }
    }

    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Receipt),
            1 => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Status of stock and inventory sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetStatus {
    /// Details may change.
    #[default]
    Building,
    /// Applied to the stock.
    Valid,
}

impl SheetStatus {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Building => 0,
            Self::Valid => 1,
        }
    }

    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Building),
            1 => Some(Self::Valid),
            _ => None,
        }
    }
}

/// Stock receipt or exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSheet {
    /// Sheet id.
    pub id: StorageSheetId,
    /// Direction.
    pub sheet_type: SheetType,
    /// Movement date.
    pub date: NaiveDate,
    /// Area.
    pub storagearea_id: StorageAreaId,
    /// Comment, shown in article movings.
    pub comment: String,
    /// Status.
    pub status: SheetStatus,
    /// Supplier of a receipt.
    pub provider_id: Option<ThirdId>,
    /// Supplier bill reference.
    pub bill_reference: String,
    /// Supplier bill date.
    pub bill_date: Option<NaiveDate>,
}

impl StorageSheet {
    /// Creates a building sheet.
    #[must_use]
    pub fn new(sheet_type: SheetType, date: NaiveDate, storagearea_id: StorageAreaId, comment: impl Into<String>) -> Self {
        Self {
            id: StorageSheetId::new(),
            sheet_type,
            date,
            storagearea_id,
            comment: comment.into(),
            status: SheetStatus::Building,
            provider_id: None,
            bill_reference: String::new(),
            bill_date: None,
        }
    }
}

/// Line of a stock sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDetail {
    /// Line id.
    pub id: StorageDetailId,
    /// Sheet.
    pub storagesheet_id: StorageSheetId,
    /// Article.
    pub article_id: ArticleId,
    /// Unit price of a receipt, mean unit value of a valid exit.
    pub price: Decimal,
    /// Quantity moved.
    pub quantity: Decimal,
    /// Value taken out of the stock, fixed when an exit is validated.
    #[serde(default)]
    pub value: Option<Decimal>,
}

impl StorageDetail {
    /// Creates a line.
    #[must_use]
    pub fn new(storagesheet_id: StorageSheetId, article_id: ArticleId, price: Decimal, quantity: Decimal) -> Self {
        Self {
            id: StorageDetailId::new(),
            storagesheet_id,
            article_id,
            price,
            quantity,
            value: None,
        }
    }
}

/// Quantity and value of an article in an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    /// Area.
    pub storagearea_id: StorageAreaId,
    /// Article.
    pub article_id: ArticleId,
    /// Quantity in stock.
    pub quantity: Decimal,
    /// Value of the stock.
    pub amount: Decimal,
}

impl Stock {
    /// Empty stock.
    #[must_use]
    pub fn empty(storagearea_id: StorageAreaId, article_id: ArticleId) -> Self {
        Self {
            storagearea_id,
            article_id,
            quantity: Decimal::ZERO,
            amount: Decimal::ZERO,
        }
    }

    /// `amount / quantity`, none for an empty stock.
    #[must_use]
    pub fn mean_price(&self, currency: &CurrencyFormat) -> Option<Decimal> {
        (self.quantity > Decimal::ZERO).then(|| currency.round(self.amount / self.quantity))
    }
}

/// One movement of an article, as listed on its card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMoving {
    /// Sheet.
    pub storagesheet_id: StorageSheetId,
    /// Area.
    pub storagearea_id: StorageAreaId,
    /// Article.
    pub article_id: ArticleId,
    /// Sheet date.
    pub date: NaiveDate,
    /// Sheet comment.
    pub comment: String,
    /// Signed quantity, negative for exits.
    pub quantity: Decimal,
    /// Signed value.
    pub amount: Decimal,
}

/// Stock of an article over all areas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleStock {
    /// Article.
    pub article_id: ArticleId,
    /// Stock per area.
    pub areas: Vec<Stock>,
    /// Total quantity.
    pub quantity: Decimal,
    /// Total value.
    pub amount: Decimal,
    /// Mean price over all areas.
    pub mean_price: Option<Decimal>,
    /// Movements, newest first.
    pub movings: Vec<ArticleMoving>,
}

/// Counting of an area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySheet {
    /// Sheet id.
    pub id: InventorySheetId,
    /// Counting date.
    pub date: NaiveDate,
    /// Comment, reused by the generated sheets.
    pub comment: String,
    /// Counted area.
    pub storagearea_id: StorageAreaId,
    /// Status.
    pub status: SheetStatus,
    /// Receipt of surpluses.
    pub stockreceipt_id: Option<StorageSheetId>,
    /// Exit of missing articles.
    pub stockexit_id: Option<StorageSheetId>,
}

/// Counted quantity of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDetail {
    /// Line id.
    pub id: InventoryDetailId,
    /// Inventory.
    pub inventorysheet_id: InventorySheetId,
    /// Article.
    pub article_id: ArticleId,
    /// Counted quantity; none while not counted.
    pub quantity: Option<Decimal>,
}
