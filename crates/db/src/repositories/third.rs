//! Thirds (customers and providers) and their lines.

use std::collections::BTreeMap;

use diacamma_core::accounting::{
    AccountingError, Entry, FrenchSystem, LinesFilter, ShowFilter, Third, ThirdStatus, ThirdSummary, list_thirds,
};
use diacamma_shared::types::{FiscalYearId, ThirdId};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::convert;
use crate::entities::{entries, entry_lines, thirds};

/// Error types for third operations.
#[derive(Debug, thiserror::Error)]
pub enum ThirdError {
    /// Third not found.
    #[error("Third not found: {0}")]
    NotFound(ThirdId),

    /// Bookkeeping rule refused the operation.
    #[error(transparent)]
    Accounting(#[from] AccountingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a third.
#[derive(Debug, Clone, Default)]
pub struct CreateThirdInput {
    /// Contact name.
    pub contact: String,
    /// Initial sub-account codes.
    pub accounts: Vec<String>,
    /// Custom fields.
    pub custom_fields: BTreeMap<String, String>,
}

/// Third repository.
#[derive(Debug, Clone)]
pub struct ThirdRepository {
    db: DatabaseConnection,
}

impl ThirdRepository {
    /// Creates a new third repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads one third.
    pub async fn find(&self, id: ThirdId) -> Result<Third, ThirdError> {
        convert::load_thirds(&self.db, Condition::all().add(thirds::Column::Id.eq(id.into_inner())))
            .await?
            .pop()
            .ok_or(ThirdError::NotFound(id))
    }

    /// Lists thirds whose contact contains `contact`, with totals as asked.
    pub async fn list(&self, contact: &str, show: ShowFilter) -> Result<Vec<ThirdSummary>, ThirdError> {
        let thirds = convert::load_thirds(&self.db, Condition::all()).await?;
        let lines = if show == ShowFilter::Plain {
            Vec::new()
        } else {
            entry_lines::Entity::find()
                .filter(entry_lines::Column::ThirdId.is_not_null())
                .all(&self.db)
                .await?
                .into_iter()
                .map(convert::entry_line)
                .collect()
        };
        Ok(list_thirds(&thirds, contact, show, &lines))
    }

    /// Creates an enabled third with its sub-accounts.
    #[instrument(skip(self, input), fields(contact = %input.contact))]
    pub async fn create(&self, input: CreateThirdInput) -> Result<Third, ThirdError> {
        let mut third = Third::new(input.contact);
        for code in &input.accounts {
            third.add_account(&FrenchSystem, code)?;
        }
        third.custom_fields = input.custom_fields;
        convert::save_third(&self.db, &third).await?;
        info!(third_id = %third.id, "third created");
        Ok(third)
    }

    /// Changes contact, status and custom fields.
    pub async fn update(
        &self,
        id: ThirdId,
        contact: &str,
        status: ThirdStatus,
        custom_fields: BTreeMap<String, String>,
    ) -> Result<Third, ThirdError> {
        let mut third = self.find(id).await?;
        contact.clone_into(&mut third.contact);
        third.status = status;
        third.custom_fields = custom_fields;
        convert::save_third(&self.db, &third).await?;
        Ok(third)
    }

    async fn has_lines(&self, id: ThirdId, code: Option<&str>) -> Result<bool, DbErr> {
        let mut query = entry_lines::Entity::find().filter(entry_lines::Column::ThirdId.eq(id.into_inner()));
        if let Some(code) = code {
            query = query.filter(entry_lines::Column::AccountCode.eq(code));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    /// Adds a sub-account.
    pub async fn add_account(&self, id: ThirdId, code: &str) -> Result<Third, ThirdError> {
        let mut third = self.find(id).await?;
        third.add_account(&FrenchSystem, code)?;
        convert::save_third(&self.db, &third).await?;
        Ok(third)
    }

    /// Removes a sub-account without lines.
    pub async fn remove_account(&self, id: ThirdId, code: &str) -> Result<Third, ThirdError> {
        let mut third = self.find(id).await?;
        let has_lines = self.has_lines(id, Some(code)).await?;
        third.remove_account(code, has_lines)?;
        convert::save_third(&self.db, &third).await?;
        Ok(third)
    }

    /// Deletes a third that never appeared in an entry.
    pub async fn delete(&self, id: ThirdId) -> Result<(), ThirdError> {
        let third = self.find(id).await?;
        if self.has_lines(id, None).await? {
            return Err(AccountingError::AccountHasEntries(third.contact).into());
        }
        let txn = self.db.begin().await?;
        thirds::Entity::delete_by_id(id.into_inner()).exec(&txn).await?;
        txn.commit().await?;
        info!(third_id = %id, "third deleted");
        Ok(())
    }

    /// Entries holding lines of the third, in the scope of the filter.
    pub async fn entries(
        &self,
        id: ThirdId,
        filter: LinesFilter,
        year_id: FiscalYearId,
    ) -> Result<Vec<Entry>, ThirdError> {
        let entry_ids: Vec<Uuid> = entry_lines::Entity::find()
            .filter(entry_lines::Column::ThirdId.eq(id.into_inner()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|l| l.entry_id)
            .collect();
        let mut condition = Condition::all().add(entries::Column::Id.is_in(entry_ids));
        match filter {
            LinesFilter::CurrentYear => {
                condition = condition.add(entries::Column::YearId.eq(year_id.into_inner()));
            }
            LinesFilter::CurrentYearNotLettered => {
                condition = condition
                    .add(entries::Column::YearId.eq(year_id.into_inner()))
                    .add(entries::Column::LinkId.is_null());
            }
            LinesFilter::AllYears => {}
        }
        Ok(convert::load_entries(&self.db, condition).await?)
    }
}
