//! Articles, VAT rates, categories, document categories and automatic reductions.

use diacamma_core::invoice::{Article, AutomaticReduce, Category, CategoryBill, InvoiceError, Stockable, Vat};
use diacamma_shared::types::{ArticleId, AutomaticReduceId, CategoryBillId, CategoryId, VatId};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::{info, instrument};

use crate::convert;
use crate::entities::{articles, automatic_reduces, categories, category_bills, details, vats};

/// Error types for catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum ArticleError {
    /// Article not found.
    #[error("Article not found: {0}")]
    NotFound(ArticleId),

    /// Reference already used.
    #[error("Article reference already exists: {0}")]
    DuplicateReference(String),

    /// Reference is empty.
    #[error("Article reference cannot be empty")]
    EmptyReference,

    /// VAT rate used by articles.
    #[error("VAT {0} is used by articles")]
    VatInUse(VatId),

    /// VAT rate not in 0..100.
    #[error("Invalid VAT rate: {0}")]
    InvalidVatRate(Decimal),

    /// Reduction rule not found.
    #[error("Automatic reduction not found: {0}")]
    ReduceNotFound(AutomaticReduceId),

    /// Invoicing rule refused the operation.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Fields of an article.
#[derive(Debug, Clone)]
pub struct ArticleInput {
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
}

/// Catalog repository.
#[derive(Debug, Clone)]
pub struct ArticleRepository {
    db: DatabaseConnection,
}

impl ArticleRepository {
    /// Creates a new catalog repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========== VAT ==========

    /// VAT rates, by rate.
    pub async fn list_vats(&self) -> Result<Vec<Vat>, ArticleError> {
        let rows = vats::Entity::find().order_by_asc(vats::Column::Rate).all(&self.db).await?;
        Ok(rows.into_iter().map(convert::vat).collect())
    }

    /// Creates or replaces a VAT rate.
    pub async fn save_vat(&self, vat: &Vat) -> Result<(), ArticleError> {
        if vat.rate < Decimal::ZERO || vat.rate >= Decimal::ONE_HUNDRED {
            return Err(ArticleError::InvalidVatRate(vat.rate));
        }
        convert::upsert(&self.db, convert::vat_active(vat)).await?;
        Ok(())
    }

    /// Deletes a VAT rate no article uses.
    pub async fn delete_vat(&self, id: VatId) -> Result<(), ArticleError> {
        let used = articles::Entity::find()
            .filter(articles::Column::VatId.eq(id.into_inner()))
            .count(&self.db)
            .await?;
        if used > 0 {
            return Err(ArticleError::VatInUse(id));
        }
        vats::Entity::delete_by_id(id.into_inner()).exec(&self.db).await?;
        Ok(())
    }

    // ========== Articles ==========

    /// Every article, by reference.
    pub async fn list_articles(&self, include_disabled: bool) -> Result<Vec<Article>, ArticleError> {
        let all = convert::load_articles(&self.db).await?;
        Ok(all.into_iter().filter(|a| include_disabled || !a.is_disabled).collect())
    }

    /// Loads one article.
    pub async fn find_article(&self, id: ArticleId) -> Result<Article, ArticleError> {
        let row = articles::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(ArticleError::NotFound(id))?;
        Ok(convert::article(row)?)
    }

    async fn check_reference(&self, reference: &str, own: Option<ArticleId>) -> Result<(), ArticleError> {
        if reference.trim().is_empty() {
            return Err(ArticleError::EmptyReference);
        }
        let mut query = articles::Entity::find().filter(articles::Column::Reference.eq(reference));
        if let Some(own) = own {
            query = query.filter(articles::Column::Id.ne(own.into_inner()));
        }
        if query.count(&self.db).await? > 0 {
            return Err(ArticleError::DuplicateReference(reference.to_string()));
        }
        Ok(())
    }

    fn apply(article: &mut Article, input: ArticleInput) -> Result<(), ArticleError> {
        if input.price < Decimal::ZERO {
            return Err(InvoiceError::NegativePrice.into());
        }
        article.reference = input.reference.trim().to_string();
        article.designation = input.designation;
        article.price = input.price;
        article.unit = input.unit;
        article.sell_account = input.sell_account;
        article.vat_id = input.vat_id;
        article.stockable = input.stockable;
        article.category_ids = input.category_ids;
        Ok(())
    }

    /// Creates an article with a unique reference.
    #[instrument(skip(self, input), fields(reference = %input.reference))]
    pub async fn create_article(&self, input: ArticleInput) -> Result<Article, ArticleError> {
        self.check_reference(&input.reference, None).await?;
        let mut article = Article {
            id: ArticleId::new(),
            reference: String::new(),
            designation: String::new(),
            price: Decimal::ZERO,
            unit: String::new(),
            sell_account: String::new(),
            vat_id: None,
            stockable: Stockable::No,
            category_ids: Vec::new(),
            is_disabled: false,
        };
        Self::apply(&mut article, input)?;
        convert::upsert(&self.db, convert::article_active(&article)?).await?;
        info!(article_id = %article.id, "article created");
        Ok(article)
    }

    /// Changes an article.
    pub async fn update_article(&self, id: ArticleId, input: ArticleInput) -> Result<Article, ArticleError> {
        let mut article = self.find_article(id).await?;
        self.check_reference(&input.reference, Some(id)).await?;
        Self::apply(&mut article, input)?;
        convert::upsert(&self.db, convert::article_active(&article)?).await?;
        Ok(article)
    }

    /// Hides or shows an article on new documents.
    pub async fn set_article_disabled(&self, id: ArticleId, disabled: bool) -> Result<Article, ArticleError> {
        let mut article = self.find_article(id).await?;
        article.is_disabled = disabled;
        convert::upsert(&self.db, convert::article_active(&article)?).await?;
        Ok(article)
    }

    /// Deletes an article never used by a document; a used one is disabled.
    pub async fn delete_article(&self, id: ArticleId) -> Result<(), ArticleError> {
        let used = details::Entity::find()
            .filter(details::Column::ArticleId.eq(id.into_inner()))
            .count(&self.db)
            .await?;
        if used > 0 {
            self.set_article_disabled(id, true).await?;
            info!(article_id = %id, "used article disabled instead of deleted");
            return Ok(());
        }
        articles::Entity::delete_by_id(id.into_inner()).exec(&self.db).await?;
        Ok(())
    }

    // ========== Categories ==========

    /// Article categories, by name.
    pub async fn list_categories(&self) -> Result<Vec<Category>, ArticleError> {
        let rows = categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(convert::category).collect())
    }

    /// Creates or replaces an article category.
    pub async fn save_category(&self, category: &Category) -> Result<(), ArticleError> {
        convert::upsert(&self.db, convert::category_active(category)).await?;
        Ok(())
    }

    /// Deletes an article category.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), ArticleError> {
        categories::Entity::delete_by_id(id.into_inner()).exec(&self.db).await?;
        Ok(())
    }

    /// Document categories, by name.
    pub async fn list_category_bills(&self) -> Result<Vec<CategoryBill>, ArticleError> {
        let rows = category_bills::Entity::find()
            .order_by_asc(category_bills::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(convert::category_bill).collect())
    }

    /// Creates or replaces a document category; a default one unsets the others.
    pub async fn save_category_bill(&self, category: &CategoryBill) -> Result<(), ArticleError> {
        let txn = self.db.begin().await?;
        if category.is_default {
            for row in category_bills::Entity::find()
                .filter(category_bills::Column::IsDefault.eq(true))
                .filter(category_bills::Column::Id.ne(category.id.into_inner()))
                .all(&txn)
                .await?
            {
                let mut other = convert::category_bill(row);
                other.is_default = false;
                convert::upsert(&txn, convert::category_bill_active(&other)).await?;
            }
        }
        convert::upsert(&txn, convert::category_bill_active(category)).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Deletes a document category.
    pub async fn delete_category_bill(&self, id: CategoryBillId) -> Result<(), ArticleError> {
        category_bills::Entity::delete_by_id(id.into_inner()).exec(&self.db).await?;
        Ok(())
    }

    // ========== Automatic Reductions ==========

    /// Reduction rules, by name.
    pub async fn list_reduces(&self) -> Result<Vec<AutomaticReduce>, ArticleError> {
        let rows = automatic_reduces::Entity::find()
            .order_by_asc(automatic_reduces::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(convert::automatic_reduce).collect::<Result<_, _>>()?)
    }

    /// Checks and stores a reduction rule.
    pub async fn save_reduce(&self, rule: &AutomaticReduce) -> Result<(), ArticleError> {
        rule.validate()?;
        convert::upsert(&self.db, convert::automatic_reduce_active(rule)?).await?;
        Ok(())
    }

    /// Deletes a reduction rule.
    pub async fn delete_reduce(&self, id: AutomaticReduceId) -> Result<(), ArticleError> {
        let deleted = automatic_reduces::Entity::delete_by_id(id.into_inner()).exec(&self.db).await?;
        if deleted.rows_affected == 0 {
            return Err(ArticleError::ReduceNotFound(id));
        }
        Ok(())
    }
}
