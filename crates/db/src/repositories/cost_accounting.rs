//! Cost accountings (analytic tags).

use diacamma_core::accounting::{AccountingError, FrenchSystem};
use diacamma_core::cost_accounting::{CostAccounting, CostAccountingService, CostTotals};
use diacamma_shared::types::{CostAccountingId, FiscalYearId};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::{info, instrument};

use crate::convert;
use crate::entities::{cost_accountings, entries};

/// Error types for cost accounting operations.
#[derive(Debug, thiserror::Error)]
pub enum CostAccountingError {
    /// Cost accounting not found.
    #[error("Cost accounting not found: {0}")]
    NotFound(CostAccountingId),

    /// Bookkeeping rule refused the operation.
    #[error(transparent)]
    Accounting(#[from] AccountingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Cost accounting repository.
#[derive(Debug, Clone)]
pub struct CostAccountingRepository {
    db: DatabaseConnection,
}

impl CostAccountingRepository {
    /// Creates a new cost accounting repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Every cost accounting, by name.
    pub async fn list(&self) -> Result<Vec<CostAccounting>, CostAccountingError> {
        let rows = cost_accountings::Entity::find()
            .order_by_asc(cost_accountings::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(convert::cost_accounting).collect::<Result<_, _>>()?)
    }

    /// Loads one cost accounting.
    pub async fn find(&self, id: CostAccountingId) -> Result<CostAccounting, CostAccountingError> {
        let row = cost_accountings::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(CostAccountingError::NotFound(id))?;
        Ok(convert::cost_accounting(row)?)
    }

    /// The cost accounting applied by default to generated entries.
    pub async fn default_one(&self) -> Result<Option<CostAccounting>, CostAccountingError> {
        Ok(self.list().await?.into_iter().find(|c| c.is_default))
    }

    /// Creates an open cost accounting, optionally continuing another one.
    #[instrument(skip(self, description))]
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        year_id: Option<FiscalYearId>,
        last_id: Option<CostAccountingId>,
    ) -> Result<CostAccounting, CostAccountingError> {
        let mut cost = CostAccounting::new(name, description, year_id)?;
        cost.last_costaccounting_id = last_id;
        convert::upsert(&self.db, convert::cost_accounting_active(&cost)).await?;
        info!(cost_id = %cost.id, "cost accounting created");
        Ok(cost)
    }

    /// Makes one cost accounting the default, `None` to clear the default.
    pub async fn set_default(&self, id: Option<CostAccountingId>) -> Result<(), CostAccountingError> {
        let mut costs = self.list().await?;
        CostAccountingService::set_default(&mut costs, id)?;
        let txn = self.db.begin().await?;
        for cost in &costs {
            convert::upsert(&txn, convert::cost_accounting_active(cost)).await?;
        }
        txn.commit().await?;
        Ok(())
    }

    /// Closes a cost accounting without open entries.
    #[instrument(skip(self))]
    pub async fn close(&self, id: CostAccountingId) -> Result<CostAccounting, CostAccountingError> {
        let mut cost = self.find(id).await?;
        let building = entries::Entity::find()
            .filter(entries::Column::CostaccountingId.eq(id.into_inner()))
            .filter(entries::Column::Close.eq(false))
            .count(&self.db)
            .await?;
        CostAccountingService::close(&mut cost, usize::try_from(building).unwrap_or(usize::MAX))?;
        convert::upsert(&self.db, convert::cost_accounting_active(&cost)).await?;
        info!(cost_id = %id, "cost accounting closed");
        Ok(cost)
    }

    /// Deletes an unused cost accounting.
    pub async fn delete(&self, id: CostAccountingId) -> Result<(), CostAccountingError> {
        self.find(id).await?;
        let used = entries::Entity::find()
            .filter(entries::Column::CostaccountingId.eq(id.into_inner()))
            .count(&self.db)
            .await?;
        CostAccountingService::validate_delete(used > 0)?;
        cost_accountings::Entity::delete_by_id(id.into_inner()).exec(&self.db).await?;
        Ok(())
    }

    /// Revenue, expense and result of the tagged entries.
    pub async fn totals(&self, id: CostAccountingId) -> Result<CostTotals, CostAccountingError> {
        let tagged = convert::load_entries(
            &self.db,
            Condition::all().add(entries::Column::CostaccountingId.eq(id.into_inner())),
        )
        .await?;
        Ok(CostAccountingService::totals(&FrenchSystem, id, &tagged))
    }
}
