//! Storage areas, stock sheets, stock levels and inventories.

use chrono::NaiveDate;
use diacamma_core::storage::{
    ArticleStock, CsvMapping, InventoryDetail, InventoryOutcome, InventoryService, InventorySheet, SheetStatus,
    SheetType, Stock, StockLedger, StorageArea, StorageDetail, StorageError, StorageService, StorageSheet,
};
use diacamma_shared::types::{
    ArticleId, CurrencyFormat, InventoryDetailId, InventorySheetId, StorageAreaId, StorageDetailId, StorageSheetId,
    ThirdId,
};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use tracing::{info, instrument};

use crate::convert;
use crate::entities::{inventory_details, inventory_sheets, storage_areas, storage_sheets};

/// Error types for stock operations.
#[derive(Debug, thiserror::Error)]
pub enum StockError {
    /// Storage area not found.
    #[error("Storage area not found: {0}")]
    AreaNotFound(StorageAreaId),

    /// Storage area still holds sheets.
    #[error("Storage area {0} has sheets")]
    AreaInUse(StorageAreaId),

    /// Stock sheet not found.
    #[error("Storage sheet not found: {0}")]
    SheetNotFound(StorageSheetId),

    /// Sheet line not found.
    #[error("Storage detail not found: {0}")]
    DetailNotFound(StorageDetailId),

    /// Inventory not found.
    #[error("Inventory not found: {0}")]
    InventoryNotFound(InventorySheetId),

    /// Inventory line not found.
    #[error("Inventory detail not found: {0}")]
    InventoryDetailNotFound(InventoryDetailId),

    /// Stock rule refused the operation.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Header of a new stock sheet.
#[derive(Debug, Clone)]
pub struct CreateSheetInput {
    /// Receipt or exit.
    pub sheet_type: SheetType,
    /// Movement date.
    pub date: NaiveDate,
    /// Storage area.
    pub storagearea_id: StorageAreaId,
    /// Comment.
    pub comment: String,
    /// Provider of a receipt.
    pub provider_id: Option<ThirdId>,
    /// Provider bill reference.
    pub bill_reference: String,
    /// Provider bill date.
    pub bill_date: Option<NaiveDate>,
}

/// Inventory line with the quantity currently stocked.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct InventoryCount {
    /// Counting line.
    pub detail: InventoryDetail,
    /// Quantity in stock.
    pub current: Decimal,
}

/// Stock repository.
#[derive(Debug, Clone)]
pub struct StorageRepository {
    db: DatabaseConnection,
    currency: CurrencyFormat,
}

impl StorageRepository {
    /// Creates a new stock repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, currency: CurrencyFormat) -> Self {
        Self { db, currency }
    }

    /// Replays every valid sheet, oldest first.
    async fn ledger<C: ConnectionTrait>(&self, conn: &C) -> Result<StockLedger, DbErr> {
        let valid = convert::load_sheets(
            conn,
            Condition::all().add(storage_sheets::Column::Status.eq(SheetStatus::Valid.code())),
        )
        .await?;
        Ok(StockLedger::from_sheets(&valid, &self.currency))
    }

    // ========== Areas ==========

    /// Storage areas, by name.
    pub async fn list_areas(&self) -> Result<Vec<StorageArea>, StockError> {
        let rows = storage_areas::Entity::find()
            .order_by_asc(storage_areas::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(convert::storage_area).collect())
    }

    /// Creates or replaces a storage area.
    pub async fn save_area(&self, area: &StorageArea) -> Result<(), StockError> {
        convert::upsert(&self.db, convert::storage_area_active(area)).await?;
        Ok(())
    }

    /// Deletes a storage area without sheets.
    pub async fn delete_area(&self, id: StorageAreaId) -> Result<(), StockError> {
        let used = storage_sheets::Entity::find()
            .filter(storage_sheets::Column::StorageareaId.eq(id.into_inner()))
            .count(&self.db)
            .await?;
        if used > 0 {
            return Err(StockError::AreaInUse(id));
        }
        let deleted = storage_areas::Entity::delete_by_id(id.into_inner()).exec(&self.db).await?;
        if deleted.rows_affected == 0 {
            return Err(StockError::AreaNotFound(id));
        }
        Ok(())
    }

    // ========== Sheets ==========

    async fn sheet<C: ConnectionTrait>(
        conn: &C,
        id: StorageSheetId,
    ) -> Result<(StorageSheet, Vec<StorageDetail>), StockError> {
        convert::load_sheets(conn, Condition::all().add(storage_sheets::Column::Id.eq(id.into_inner())))
            .await?
            .pop()
            .ok_or(StockError::SheetNotFound(id))
    }

    /// Loads one sheet with its lines.
    pub async fn find_sheet(&self, id: StorageSheetId) -> Result<(StorageSheet, Vec<StorageDetail>), StockError> {
        Self::sheet(&self.db, id).await
    }

    /// Sheets of a status, by date.
    pub async fn list_sheets(
        &self,
        status: Option<SheetStatus>,
        sheet_type: Option<SheetType>,
    ) -> Result<Vec<(StorageSheet, Vec<StorageDetail>)>, StockError> {
        let mut condition = Condition::all();
        if let Some(status) = status {
            condition = condition.add(storage_sheets::Column::Status.eq(status.code()));
        }
        if let Some(sheet_type) = sheet_type {
            condition = condition.add(storage_sheets::Column::SheetType.eq(sheet_type.code()));
        }
        Ok(convert::load_sheets(&self.db, condition).await?)
    }

    /// Creates a building sheet.
    pub async fn create_sheet(&self, input: CreateSheetInput) -> Result<StorageSheet, StockError> {
        let mut sheet = StorageSheet::new(input.sheet_type, input.date, input.storagearea_id, input.comment);
        if input.sheet_type == SheetType::Receipt {
            sheet.provider_id = input.provider_id;
            sheet.bill_reference = input.bill_reference;
            sheet.bill_date = input.bill_date;
        }
        convert::save_sheet(&self.db, &sheet, &[]).await?;
        Ok(sheet)
    }

    /// Adds a line to a building sheet; exits carry no price.
    pub async fn add_detail(
        &self,
        id: StorageSheetId,
        article_id: ArticleId,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<StorageDetail, StockError> {
        let (sheet, mut details) = Self::sheet(&self.db, id).await?;
        StorageService::validate_edit(&sheet)?;
        let price = if sheet.sheet_type == SheetType::Exit { Decimal::ZERO } else { price };
        let detail = StorageDetail::new(id, article_id, price, quantity);
        details.push(detail.clone());
        let txn = self.db.begin().await?;
        convert::save_sheet(&txn, &sheet, &details).await?;
        txn.commit().await?;
        Ok(detail)
    }

    /// Removes a line of a building sheet.
    pub async fn remove_detail(&self, id: StorageSheetId, detail_id: StorageDetailId) -> Result<(), StockError> {
        let (sheet, mut details) = Self::sheet(&self.db, id).await?;
        StorageService::validate_edit(&sheet)?;
        let before = details.len();
        details.retain(|d| d.id != detail_id);
        if details.len() == before {
            return Err(StockError::DetailNotFound(detail_id));
        }
        let txn = self.db.begin().await?;
        convert::save_sheet(&txn, &sheet, &details).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Appends the lines read from a CSV file; returns unknown references.
    #[instrument(skip(self, content, mapping))]
    pub async fn import_csv(
        &self,
        id: StorageSheetId,
        content: &str,
        mapping: &CsvMapping,
    ) -> Result<Vec<String>, StockError> {
        let (sheet, mut details) = Self::sheet(&self.db, id).await?;
        let articles = convert::load_articles(&self.db).await?;
        let import = StorageService::import_csv(&sheet, content, mapping, &articles)?;
        let added = import.details.len();
        details.extend(import.details);
        let txn = self.db.begin().await?;
        convert::save_sheet(&txn, &sheet, &details).await?;
        txn.commit().await?;
        info!(sheet_id = %id, added, unknown = import.unknown.len(), "csv imported");
        Ok(import.unknown)
    }

    /// Warnings of a building sheet.
    pub async fn check_info(&self, id: StorageSheetId) -> Result<Vec<String>, StockError> {
        let (_, details) = Self::sheet(&self.db, id).await?;
        let articles = convert::load_articles(&self.db).await?;
        Ok(StorageService::check_info(&details, &articles))
    }

    /// Validates a building sheet against the current stock.
    #[instrument(skip(self))]
    pub async fn validate_sheet(&self, id: StorageSheetId) -> Result<StorageSheet, StockError> {
        let txn = self.db.begin().await?;
        let (mut sheet, mut details) = Self::sheet(&txn, id).await?;
        let articles = convert::load_articles(&txn).await?;
        let mut ledger = self.ledger(&txn).await?;
        StorageService::validate(&mut sheet, &mut details, &articles, &mut ledger, &self.currency)?;
        convert::save_sheet(&txn, &sheet, &details).await?;
        txn.commit().await?;
        info!(sheet_id = %id, "storage sheet validated");
        Ok(sheet)
    }

    /// Deletes a building sheet.
    pub async fn delete_sheet(&self, id: StorageSheetId) -> Result<(), StockError> {
        let (sheet, _) = Self::sheet(&self.db, id).await?;
        StorageService::validate_edit(&sheet)?;
        storage_sheets::Entity::delete_by_id(id.into_inner()).exec(&self.db).await?;
        Ok(())
    }

    // ========== Stock ==========

    /// Stock of an article in every area, with its movements.
    pub async fn article_stock(&self, article_id: ArticleId) -> Result<ArticleStock, StockError> {
        Ok(self.ledger(&self.db).await?.article_stock(article_id, &self.currency))
    }

    /// Every non empty stock line.
    pub async fn stocks(&self) -> Result<Vec<Stock>, StockError> {
        let ledger = self.ledger(&self.db).await?;
        Ok(ledger.stocks().filter(|s| !s.quantity.is_zero()).copied().collect())
    }

    // ========== Inventories ==========

    async fn inventory<C: ConnectionTrait>(
        conn: &C,
        id: InventorySheetId,
    ) -> Result<(InventorySheet, Vec<InventoryDetail>), StockError> {
        let row = inventory_sheets::Entity::find_by_id(id.into_inner())
            .one(conn)
            .await?
            .ok_or(StockError::InventoryNotFound(id))?;
        let details = inventory_details::Entity::find()
            .filter(inventory_details::Column::InventorysheetId.eq(id.into_inner()))
            .order_by_asc(inventory_details::Column::Id)
            .all(conn)
            .await?
            .into_iter()
            .map(convert::inventory_detail)
            .collect();
        Ok((convert::inventory_sheet(row)?, details))
    }

    /// Inventories, newest first.
    pub async fn list_inventories(&self) -> Result<Vec<InventorySheet>, StockError> {
        let rows = inventory_sheets::Entity::find()
            .order_by_desc(inventory_sheets::Column::Date)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(convert::inventory_sheet).collect::<Result<_, _>>()?)
    }

    /// Creates an inventory with one uncounted line per stocked article.
    #[instrument(skip(self, comment))]
    pub async fn create_inventory(
        &self,
        date: NaiveDate,
        storagearea_id: StorageAreaId,
        comment: &str,
    ) -> Result<InventorySheet, StockError> {
        let sheet = InventoryService::create(date, storagearea_id, comment);
        let articles = convert::load_articles(&self.db).await?;
        let details = InventoryService::fill(&sheet, &articles);
        let txn = self.db.begin().await?;
        convert::upsert(&txn, convert::inventory_sheet_active(&sheet)).await?;
        if !details.is_empty() {
            inventory_details::Entity::insert_many(details.iter().map(convert::inventory_detail_active))
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;
        info!(inventory_id = %sheet.id, lines = details.len(), "inventory created");
        Ok(sheet)
    }

    /// Lines of an inventory next to the current stock.
    pub async fn inventory_lines(&self, id: InventorySheetId) -> Result<Vec<InventoryCount>, StockError> {
        let (sheet, details) = Self::inventory(&self.db, id).await?;
        let ledger = self.ledger(&self.db).await?;
        Ok(InventoryService::lines(&sheet, &details, &ledger)
            .into_iter()
            .map(|line| InventoryCount {
                detail: line.detail.clone(),
                current: line.current,
            })
            .collect())
    }

    /// Records the counted quantity of a line, `None` to clear it.
    pub async fn count(
        &self,
        id: InventorySheetId,
        detail_id: InventoryDetailId,
        quantity: Option<Decimal>,
    ) -> Result<InventoryDetail, StockError> {
        let (sheet, details) = Self::inventory(&self.db, id).await?;
        if sheet.status != SheetStatus::Building {
            return Err(StorageError::InventoryNotBuilding(id).into());
        }
        let mut detail = details
            .into_iter()
            .find(|d| d.id == detail_id)
            .ok_or(StockError::InventoryDetailNotFound(detail_id))?;
        detail.quantity = quantity;
        convert::upsert(&self.db, convert::inventory_detail_active(&detail)).await?;
        Ok(detail)
    }

    /// Validates an inventory: surpluses enter the stock before missing
    /// articles leave it.
    #[instrument(skip(self))]
    pub async fn validate_inventory(&self, id: InventorySheetId) -> Result<InventoryOutcome, StockError> {
        let txn = self.db.begin().await?;
        let (mut sheet, details) = Self::inventory(&txn, id).await?;
        let articles = convert::load_articles(&txn).await?;
        let ledger = self.ledger(&txn).await?;
        let outcome = InventoryService::validate(&mut sheet, &details, &articles, &ledger, &self.currency)?;
        if let Some((receipt, lines)) = &outcome.receipt {
            convert::save_sheet(&txn, receipt, lines).await?;
        }
        if let Some((exit, lines)) = &outcome.exit {
            convert::save_sheet(&txn, exit, lines).await?;
        }
        convert::upsert(&txn, convert::inventory_sheet_active(&sheet)).await?;
        txn.commit().await?;
        info!(inventory_id = %id, "inventory validated");
        Ok(outcome)
    }
}
