//! Commercial documents: edition, validation, posting and stock movements.

use chrono::NaiveDate;
use diacamma_core::accounting::{FiscalYear, FrenchSystem, Third};
use diacamma_core::invoice::{
    Article, AutomaticReduce, Bill, BillContext, BillService, BillStatistics, BillStatus, BillTotals, BillType,
    CategoryBill, Detail, InvoiceError, InvoiceParams, ReduceService,
};
use diacamma_core::storage::{SheetStatus, StockLedger, StorageError, StorageService};
use diacamma_shared::types::{
    ArticleId, BillId, CategoryBillId, CostAccountingId, DetailId, FiscalYearId, StorageAreaId, ThirdId,
};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, TransactionTrait,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::convert;
use crate::entities::{automatic_reduces, bills, category_bills, payoffs, storage_sheets, thirds, vats};

/// Error types for document operations.
#[derive(Debug, thiserror::Error)]
pub enum BillError {
    /// Document not found.
    #[error("Document not found: {0}")]
    NotFound(BillId),

    /// Detail not found.
    #[error("Detail not found: {0}")]
    DetailNotFound(DetailId),

    /// Third not found.
    #[error("Third not found: {0}")]
    ThirdNotFound(ThirdId),

    /// Fiscal year not found.
    #[error("Fiscal year not found: {0}")]
    YearNotFound(FiscalYearId),

    /// Invoicing rule refused the operation.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    /// Stock rule refused the operation.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Header of a new document.
#[derive(Debug, Clone)]
pub struct CreateBillInput {
    /// Kind.
    pub bill_type: BillType,
    /// Document date.
    pub date: NaiveDate,
    /// Customer.
    pub third_id: Option<ThirdId>,
    /// Comment.
    pub comment: String,
    /// Category, the default one when absent.
    pub category_id: Option<CategoryBillId>,
    /// Analytic tag of the posted entry.
    pub cost_accounting_id: Option<CostAccountingId>,
}

/// Line edition request. Article lines start from the article's values;
/// every `Some` field overrides them.
#[derive(Debug, Clone, Default)]
pub struct DetailInput {
    /// Line to replace, `None` to append.
    pub id: Option<DetailId>,
    /// Article.
    pub article_id: Option<ArticleId>,
    /// Designation.
    pub designation: Option<String>,
    /// Unit price.
    pub price: Option<Decimal>,
    /// Unit label.
    pub unit: Option<String>,
    /// Quantity.
    pub quantity: Decimal,
    /// Reduction amount.
    pub reduce: Decimal,
    /// VAT rate of a free line.
    pub vat_rate: Option<Decimal>,
    /// Storage area of stocked articles.
    pub storagearea_id: Option<StorageAreaId>,
}

/// Document list filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct BillFilter {
    /// Kind.
    pub bill_type: Option<BillType>,
    /// Status.
    pub status: Option<BillStatus>,
    /// Customer.
    pub third_id: Option<ThirdId>,
    /// Fiscal year of the number.
    pub year_id: Option<FiscalYearId>,
}

/// Everything validation needs besides the document itself.
struct Catalog {
    year: Option<FiscalYear>,
    third: Option<Third>,
    articles: Vec<Article>,
    categories: Vec<CategoryBill>,
}

/// Document repository.
#[derive(Debug, Clone)]
pub struct BillRepository {
    db: DatabaseConnection,
    params: InvoiceParams,
}

impl BillRepository {
    /// Creates a new document repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, params: InvoiceParams) -> Self {
        Self { db, params }
    }

    async fn load<C: ConnectionTrait>(conn: &C, id: BillId) -> Result<(Bill, Vec<Detail>), BillError> {
        convert::find_bill(conn, id).await?.ok_or(BillError::NotFound(id))
    }

    async fn third<C: ConnectionTrait>(conn: &C, id: ThirdId) -> Result<Third, BillError> {
        convert::load_thirds(conn, Condition::all().add(thirds::Column::Id.eq(id.into_inner())))
            .await?
            .pop()
            .ok_or(BillError::ThirdNotFound(id))
    }

    async fn catalog<C: ConnectionTrait>(conn: &C, bill: &Bill) -> Result<Catalog, BillError> {
        let third = match bill.third_id {
            Some(id) => Some(Self::third(conn, id).await?),
            None => None,
        };
        let categories = category_bills::Entity::find()
            .all(conn)
            .await?
            .into_iter()
            .map(convert::category_bill)
            .collect();
        Ok(Catalog {
            year: convert::year_of(conn, bill.date).await?,
            third,
            articles: convert::load_articles(conn).await?,
            categories,
        })
    }

    fn context<'a>(&'a self, catalog: &'a Catalog) -> BillContext<'a> {
        BillContext {
            system: &FrenchSystem,
            params: &self.params,
            year: catalog.year.as_ref(),
            third: catalog.third.as_ref(),
            articles: &catalog.articles,
        }
    }

    // ========== Documents ==========

    /// Loads one document with its details.
    pub async fn find(&self, id: BillId) -> Result<(Bill, Vec<Detail>), BillError> {
        Self::load(&self.db, id).await
    }

    /// Documents passing the filter, by date.
    pub async fn list(&self, filter: BillFilter) -> Result<Vec<(Bill, Vec<Detail>)>, BillError> {
        let mut condition = Condition::all();
        if let Some(bill_type) = filter.bill_type {
            condition = condition.add(bills::Column::BillType.eq(bill_type.code()));
        }
        if let Some(status) = filter.status {
            condition = condition.add(bills::Column::Status.eq(status.code()));
        }
        if let Some(third_id) = filter.third_id {
            condition = condition.add(bills::Column::ThirdId.eq(third_id.into_inner()));
        }
        if let Some(year_id) = filter.year_id {
            condition = condition.add(bills::Column::FiscalYearId.eq(year_id.into_inner()));
        }
        Ok(convert::load_bills(&self.db, condition).await?)
    }

    /// Creates a building document.
    #[instrument(skip(self, input), fields(bill_type = ?input.bill_type))]
    pub async fn create(&self, input: CreateBillInput) -> Result<Bill, BillError> {
        let mut bill = Bill::new(input.bill_type, input.date, input.third_id);
        bill.comment = input.comment;
        bill.cost_accounting_id = input.cost_accounting_id;
        bill.category_id = match input.category_id {
            Some(id) => Some(id),
            None => category_bills::Entity::find()
                .filter(category_bills::Column::IsDefault.eq(true))
                .one(&self.db)
                .await?
                .map(|c| CategoryBillId::from_uuid(c.id)),
        };
        convert::save_bill_header(&self.db, &bill).await?;
        info!(bill_id = %bill.id, "document created");
        Ok(bill)
    }

    /// Changes the header of a building document.
    pub async fn update(
        &self,
        id: BillId,
        date: NaiveDate,
        third_id: Option<ThirdId>,
        comment: &str,
    ) -> Result<Bill, BillError> {
        let (mut bill, _) = Self::load(&self.db, id).await?;
        BillService::validate_edit(&bill)?;
        bill.date = date;
        bill.third_id = third_id;
        comment.clone_into(&mut bill.comment);
        convert::save_bill_header(&self.db, &bill).await?;
        if let Some(third_id) = third_id {
            self.recompute_reduces(third_id, date).await?;
        }
        Ok(bill)
    }

    /// Adds or replaces a detail of a building document.
    pub async fn save_detail(&self, id: BillId, input: DetailInput) -> Result<Detail, BillError> {
        let (bill, mut details) = Self::load(&self.db, id).await?;
        BillService::validate_edit(&bill)?;
        let mut detail = match input.article_id {
            Some(article_id) => {
                let articles = convert::load_articles(&self.db).await?;
                let article = articles
                    .iter()
                    .find(|a| a.id == article_id)
                    .ok_or(InvoiceError::ArticleNotFound(article_id))?;
                if article.is_disabled {
                    return Err(InvoiceError::ArticleDisabled(article.reference.clone()).into());
                }
                let vat_rate = match article.vat_id {
                    Some(vat_id) => vats::Entity::find_by_id(vat_id.into_inner())
                        .one(&self.db)
                        .await?
                        .map_or(Decimal::ZERO, |v| v.rate),
                    None => Decimal::ZERO,
                };
                Detail::from_article(id, article, vat_rate, input.quantity)
            }
            None => Detail {
                id: DetailId::new(),
                bill_id: id,
                article_id: None,
                designation: String::new(),
                price: Decimal::ZERO,
                unit: String::new(),
                quantity: input.quantity,
                reduce: Decimal::ZERO,
                vat_rate: input.vat_rate.unwrap_or_default(),
                storagearea_id: None,
            },
        };
        if let Some(designation) = input.designation {
            detail.designation = designation;
        }
        if let Some(price) = input.price {
            detail.price = price;
        }
        if let Some(unit) = input.unit {
            detail.unit = unit;
        }
        detail.reduce = input.reduce;
        detail.storagearea_id = input.storagearea_id;
        detail.validate(&self.params.currency)?;

        match input.id {
            Some(existing) => {
                let slot = details
                    .iter_mut()
                    .find(|d| d.id == existing)
                    .ok_or(BillError::DetailNotFound(existing))?;
                detail.id = existing;
                *slot = detail.clone();
            }
            None => details.push(detail.clone()),
        }
        let txn = self.db.begin().await?;
        convert::save_bill(&txn, &bill, &details).await?;
        txn.commit().await?;
        if let Some(third_id) = bill.third_id {
            self.recompute_reduces(third_id, bill.date).await?;
        }
        Ok(detail)
    }

    /// Removes a detail of a building document.
    pub async fn remove_detail(&self, id: BillId, detail_id: DetailId) -> Result<(), BillError> {
        let (bill, mut details) = Self::load(&self.db, id).await?;
        BillService::validate_edit(&bill)?;
        let before = details.len();
        details.retain(|d| d.id != detail_id);
        if details.len() == before {
            return Err(BillError::DetailNotFound(detail_id));
        }
        let txn = self.db.begin().await?;
        convert::save_bill(&txn, &bill, &details).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Totals and VAT split of a document.
    pub async fn totals(&self, id: BillId) -> Result<BillTotals, BillError> {
        let (_, details) = Self::load(&self.db, id).await?;
        Ok(BillTotals::compute(&details, &self.params))
    }

    /// Reasons preventing validation.
    pub async fn check_info(&self, id: BillId) -> Result<Vec<String>, BillError> {
        let (bill, details) = Self::load(&self.db, id).await?;
        let catalog = Self::catalog(&self.db, &bill).await?;
        Ok(BillService::check_info(&bill, &details, &self.context(&catalog)))
    }

    /// Numbers a building document, posts its entry and moves its stock.
    #[instrument(skip(self))]
    pub async fn validate(&self, id: BillId) -> Result<Bill, BillError> {
        let txn = self.db.begin().await?;
        let bill = self.validate_in(&txn, id).await?;
        txn.commit().await?;
        if let Some(third_id) = bill.third_id {
            self.recompute_reduces(third_id, bill.date).await?;
        }
        Ok(bill)
    }

    pub(crate) async fn validate_in<C: ConnectionTrait>(&self, conn: &C, id: BillId) -> Result<Bill, BillError> {
        let (mut bill, details) = Self::load(conn, id).await?;
        let catalog = Self::catalog(conn, &bill).await?;
        let category = bill
            .category_id
            .and_then(|c| catalog.categories.iter().find(|x| x.id == c));
        let num = match &catalog.year {
            Some(year) => {
                let existing: Vec<Bill> = convert::load_bills(
                    conn,
                    Condition::all()
                        .add(bills::Column::BillType.eq(bill.bill_type.code()))
                        .add(bills::Column::FiscalYearId.eq(year.id.into_inner())),
                )
                .await?
                .into_iter()
                .map(|(b, _)| b)
                .collect();
                BillService::next_num(bill.bill_type, year.id, category, &catalog.categories, &existing)
            }
            None => 1,
        };
        let validated = BillService::validate(&mut bill, &details, &self.context(&catalog), num, category)?;
        if let Some(entry) = &validated.entry {
            convert::save_entry(conn, entry).await?;
        }

        let sheets = StorageService::sheets_for_bill(&bill, &details, &catalog.articles);
        if !sheets.is_empty() {
            let valid = convert::load_sheets(
                conn,
                Condition::all().add(storage_sheets::Column::Status.eq(SheetStatus::Valid.code())),
            )
            .await?;
            let mut ledger = StockLedger::from_sheets(&valid, &self.params.currency);
            for (mut sheet, mut lines) in sheets {
                StorageService::validate(&mut sheet, &mut lines, &catalog.articles, &mut ledger, &self.params.currency)?;
                convert::save_sheet(conn, &sheet, &lines).await?;
                debug!(sheet_id = %sheet.id, bill_id = %bill.id, "stock sheet generated");
            }
        }
        convert::save_bill_header(conn, &bill).await?;
        info!(bill_id = %bill.id, num = %validated.num_txt, "document validated");
        Ok(bill)
    }

    /// Cancels a document; returns the credit note created for valid bills.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: BillId, today: NaiveDate) -> Result<Option<Bill>, BillError> {
        let (mut bill, details) = Self::load(&self.db, id).await?;
        let asset = BillService::cancel(&mut bill, &details, today)?;
        let txn = self.db.begin().await?;
        convert::save_bill_header(&txn, &bill).await?;
        let created = match asset {
            Some((asset, asset_details)) => {
                convert::save_bill(&txn, &asset, &asset_details).await?;
                Some(asset)
            }
            None => None,
        };
        txn.commit().await?;
        Ok(created)
    }

    /// Archives a valid document.
    pub async fn archive(&self, id: BillId) -> Result<Bill, BillError> {
        let (mut bill, _) = Self::load(&self.db, id).await?;
        BillService::archive(&mut bill)?;
        convert::save_bill_header(&self.db, &bill).await?;
        Ok(bill)
    }

    /// Turns a valid quotation or order into a building bill.
    #[instrument(skip(self))]
    pub async fn transform_to_bill(&self, id: BillId, today: NaiveDate) -> Result<Bill, BillError> {
        let txn = self.db.begin().await?;
        let bill = Self::transform_in(&txn, id, today).await?;
        txn.commit().await?;
        Ok(bill)
    }

    pub(crate) async fn transform_in<C: ConnectionTrait>(
        conn: &C,
        id: BillId,
        today: NaiveDate,
    ) -> Result<Bill, BillError> {
        let (mut source, details) = Self::load(conn, id).await?;
        let (bill, bill_details) = BillService::transform_to_bill(&mut source, &details, today)?;
        convert::save_bill_header(conn, &source).await?;
        convert::save_bill(conn, &bill, &bill_details).await?;
        if source.bill_type == BillType::Order {
            // Down payments of the order now pay the bill.
            payoffs::Entity::update_many()
                .col_expr(payoffs::Column::SupportingId, Expr::value(bill.id.into_inner()))
                .filter(payoffs::Column::SupportingId.eq(id.into_inner()))
                .exec(conn)
                .await?;
        }
        info!(source_id = %id, bill_id = %bill.id, "document transformed into bill");
        Ok(bill)
    }

    /// Turns a valid quotation into a validated order.
    #[instrument(skip(self))]
    pub async fn to_order(&self, id: BillId, today: NaiveDate) -> Result<Bill, BillError> {
        let txn = self.db.begin().await?;
        let order = self.to_order_in(&txn, id, today).await?;
        txn.commit().await?;
        Ok(order)
    }

    pub(crate) async fn to_order_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: BillId,
        today: NaiveDate,
    ) -> Result<Bill, BillError> {
        let (mut source, details) = Self::load(conn, id).await?;
        let (order, order_details) = BillService::to_order(&mut source, &details, today)?;
        convert::save_bill_header(conn, &source).await?;
        convert::save_bill(conn, &order, &order_details).await?;
        let order = self.validate_in(conn, order.id).await?;
        info!(source_id = %id, order_id = %order.id, "quotation turned into order");
        Ok(order)
    }

    /// Turns a valid cart into a building quotation.
    #[instrument(skip(self))]
    pub async fn cart_to_quotation(&self, id: BillId, today: NaiveDate) -> Result<Bill, BillError> {
        let (mut cart, details) = Self::load(&self.db, id).await?;
        let (quotation, quotation_details) = BillService::cart_to_quotation(&mut cart, &details, today)?;
        let txn = self.db.begin().await?;
        convert::save_bill_header(&txn, &cart).await?;
        convert::save_bill(&txn, &quotation, &quotation_details).await?;
        txn.commit().await?;
        Ok(quotation)
    }

    /// Copies a numbered quotation into a new building one.
    #[instrument(skip(self))]
    pub async fn clone_quotation(&self, id: BillId, today: NaiveDate) -> Result<Bill, BillError> {
        let (source, details) = Self::load(&self.db, id).await?;
        let (quotation, quotation_details) = BillService::clone_quotation(&source, &details, today)?;
        convert::save_bill(&self.db, &quotation, &quotation_details).await?;
        Ok(quotation)
    }

    /// Deletes a building document.
    pub async fn delete(&self, id: BillId) -> Result<(), BillError> {
        let (bill, _) = Self::load(&self.db, id).await?;
        BillService::validate_delete(&bill)?;
        bills::Entity::delete_by_id(id.into_inner()).exec(&self.db).await?;
        Ok(())
    }

    // ========== Statistics ==========

    /// Sales statistics of a fiscal year.
    pub async fn statistics(
        &self,
        year_id: FiscalYearId,
        without_reduce: bool,
    ) -> Result<BillStatistics, BillError> {
        let year = convert::load_years(&self.db)
            .await?
            .into_iter()
            .find(|y| y.id == year_id)
            .ok_or(BillError::YearNotFound(year_id))?;
        let documents = convert::load_bills(
            &self.db,
            Condition::all().add(bills::Column::FiscalYearId.eq(year_id.into_inner())),
        )
        .await?;
        let third_ids: Vec<Uuid> = documents
            .iter()
            .filter_map(|(b, _)| b.third_id.map(ThirdId::into_inner))
            .collect();
        let thirds = convert::load_thirds(&self.db, Condition::all().add(thirds::Column::Id.is_in(third_ids))).await?;
        let articles = convert::load_articles(&self.db).await?;
        Ok(BillService::statistics(
            &year,
            &documents,
            &articles,
            &thirds,
            &self.params,
            without_reduce,
        ))
    }

    // ========== Automatic Reductions ==========

    /// Recomputes the reductions of the building documents of a third
    /// against its purchases in the fiscal year of `date`.
    pub async fn recompute_reduces(&self, third_id: ThirdId, date: NaiveDate) -> Result<usize, BillError> {
        let Some(year) = convert::year_of(&self.db, date).await? else {
            return Ok(0);
        };
        let rules: Vec<AutomaticReduce> = automatic_reduces::Entity::find()
            .filter(automatic_reduces::Column::IsActive.eq(true))
            .all(&self.db)
            .await?
            .into_iter()
            .map(convert::automatic_reduce)
            .collect::<Result<_, _>>()?;
        if rules.is_empty() {
            return Ok(0);
        }
        let third = Self::third(&self.db, third_id).await?;
        let of_third = convert::load_bills(
            &self.db,
            Condition::all().add(bills::Column::ThirdId.eq(third_id.into_inner())),
        )
        .await?;
        let (mut building, validated): (Vec<_>, Vec<_>) = of_third
            .into_iter()
            .filter(|(b, _)| b.bill_type != BillType::Quotation)
            .partition(|(b, _)| b.is_building());
        let articles = convert::load_articles(&self.db).await?;
        let changed = ReduceService::recompute_third(
            &rules,
            &third,
            year.id,
            &mut building,
            &validated,
            &articles,
            &self.params.currency,
        );
        if changed > 0 {
            let txn = self.db.begin().await?;
            for (bill, details) in &building {
                convert::save_bill(&txn, bill, details).await?;
            }
            txn.commit().await?;
            debug!(%third_id, changed, "reductions recomputed");
        }
        Ok(changed)
    }
}
