//! Inventory of a storage area.

use chrono::NaiveDate;
use diacamma_shared::types::{CurrencyFormat, InventoryDetailId, InventorySheetId, StorageAreaId};
use rust_decimal::Decimal;

use super::error::StorageError;
use super::ledger::StockLedger;
use super::sheet::StorageService;
use super::types::{InventoryDetail, InventorySheet, SheetStatus, SheetType, StorageDetail, StorageSheet};
use crate::invoice::Article;

/// Counted line next to the current stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryLine<'a> {
    /// Counting line.
    pub detail: &'a InventoryDetail,
    /// Quantity in stock.
    pub current: Decimal,
}

/// Sheets produced by an inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct InventoryOutcome {
    /// Surpluses, valued at mean price.
    pub receipt: Option<(StorageSheet, Vec<StorageDetail>)>,
    /// Missing articles.
    pub exit: Option<(StorageSheet, Vec<StorageDetail>)>,
}

/// Inventory rules.
pub struct InventoryService;

impl InventoryService {
    /// Creates a building inventory.
    #[must_use]
    pub fn create(date: NaiveDate, storagearea_id: StorageAreaId, comment: impl Into<String>) -> InventorySheet {
        InventorySheet {
            id: InventorySheetId::new(),
            date,
            comment: comment.into(),
            storagearea_id,
            status: SheetStatus::Building,
            stockreceipt_id: None,
            stockexit_id: None,
        }
    }

    /// One uncounted line per enabled stockable article, by reference.
    #[must_use]
    pub fn fill(sheet: &InventorySheet, articles: &[Article]) -> Vec<InventoryDetail> {
        let mut stocked: Vec<&Article> = articles
            .iter()
            .filter(|a| a.stockable.is_stocked() && !a.is_disabled)
            .collect();
        stocked.sort_by(|a, b| a.reference.cmp(&b.reference));
        stocked
            .into_iter()
            .map(|article| InventoryDetail {
                id: InventoryDetailId::new(),
                inventorysheet_id: sheet.id,
                article_id: article.id,
                quantity: None,
            })
            .collect()
    }

    /// Lines with the quantity currently in the area.
    #[must_use]
    pub fn lines<'a>(sheet: &InventorySheet, details: &'a [InventoryDetail], ledger: &StockLedger) -> Vec<InventoryLine<'a>> {
        details
            .iter()
            .map(|detail| InventoryLine {
                detail,
                current: ledger.quantity(sheet.storagearea_id, detail.article_id),
            })
            .collect()
    }

    /// Compares counted quantities with the stock and builds a receipt for
    /// surpluses and an exit for missing articles. Uncounted lines are ignored.
    ///
    /// Generated sheets are returned valid; the caller applies them to the
    /// ledger in the order receipt then exit.
    pub fn validate(
        sheet: &mut InventorySheet,
        details: &[InventoryDetail],
        articles: &[Article],
        ledger: &StockLedger,
        currency: &CurrencyFormat,
    ) -> Result<InventoryOutcome, StorageError> {
        if sheet.status != SheetStatus::Building {
            return Err(StorageError::InventoryNotBuilding(sheet.id));
        }
        let area = sheet.storagearea_id;
        let mut receipt = StorageSheet::new(SheetType::Receipt, sheet.date, area, sheet.comment.clone());
        let mut exit = StorageSheet::new(SheetType::Exit, sheet.date, area, sheet.comment.clone());
        let mut surplus = Vec::new();
        let mut missing = Vec::new();
        for detail in details {
            let Some(counted) = detail.quantity else {
                continue;
            };
            let current = ledger.quantity(area, detail.article_id);
            let diff = counted - current;
            if diff > Decimal::ZERO {
                let price = ledger.mean_price(area, detail.article_id, currency).unwrap_or_else(|| {
                    articles
                        .iter()
                        .find(|a| a.id == detail.article_id)
                        .map_or(Decimal::ZERO, |a| a.price)
                });
                surplus.push(StorageDetail::new(receipt.id, detail.article_id, price, diff));
            } else if diff < Decimal::ZERO {
                let article = articles
                    .iter()
                    .find(|a| a.id == detail.article_id)
                    .ok_or(StorageError::ArticleNotFound(detail.article_id))?;
                StorageService::check_exit(ledger, area, sheet.date, article)?;
                missing.push(StorageDetail::new(exit.id, detail.article_id, Decimal::ZERO, -diff));
            }
        }
        ledger.value_exits(area, &mut missing, currency);
        let mut outcome = InventoryOutcome::default();
        if !surplus.is_empty() {
            receipt.status = SheetStatus::Valid;
            sheet.stockreceipt_id = Some(receipt.id);
            outcome.receipt = Some((receipt, surplus));
        }
        if !missing.is_empty() {
            exit.status = SheetStatus::Valid;
            sheet.stockexit_id = Some(exit.id);
            outcome.exit = Some((exit, missing));
        }
        sheet.status = SheetStatus::Valid;
        Ok(outcome)
    }
}
