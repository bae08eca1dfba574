//! Ledger entries, lettering and entry models.

use chrono::NaiveDate;
use diacamma_core::accounting::{
    AccountLink, AccountingError, Entry, EntryFilter, EntryService, FiscalService, FrenchSystem, LetteringService,
    LineInput, ModelEntry,
};
use diacamma_core::cost_accounting::CostAccounting;
use diacamma_shared::types::{
    AccountLinkId, CostAccountingId, CurrencyFormat, EntryId, EntryLineId, FiscalYearId, ModelEntryId,
};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::convert;
use crate::entities::{account_links, chart_accounts, cost_accountings, entries, fiscal_years, model_entries};

/// Error types for entry operations.
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    /// Entry not found.
    #[error("Entry not found: {0}")]
    NotFound(EntryId),

    /// Fiscal year not found.
    #[error("Fiscal year not found: {0}")]
    YearNotFound(FiscalYearId),

    /// Entry model not found.
    #[error("Entry model not found: {0}")]
    ModelNotFound(ModelEntryId),

    /// Bookkeeping rule refused the operation.
    #[error(transparent)]
    Accounting(#[from] AccountingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Header of a new entry.
#[derive(Debug, Clone)]
pub struct CreateEntryInput {
    /// Fiscal year.
    pub year_id: FiscalYearId,
    /// Journal.
    pub journal_id: i32,
    /// Value date.
    pub date_value: NaiveDate,
    /// Designation.
    pub designation: String,
    /// Analytic tag.
    pub costaccounting_id: Option<CostAccountingId>,
}

/// Entry repository.
#[derive(Debug, Clone)]
pub struct EntryRepository {
    db: DatabaseConnection,
}

impl EntryRepository {
    /// Creates a new entry repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load<C: ConnectionTrait>(conn: &C, id: EntryId) -> Result<Entry, EntryError> {
        convert::find_entry(conn, id).await?.ok_or(EntryError::NotFound(id))
    }

    async fn year<C: ConnectionTrait>(
        conn: &C,
        id: FiscalYearId,
    ) -> Result<diacamma_core::accounting::FiscalYear, EntryError> {
        let row = fiscal_years::Entity::find_by_id(id.into_inner())
            .one(conn)
            .await?
            .ok_or(EntryError::YearNotFound(id))?;
        Ok(convert::fiscal_year(row)?)
    }

    async fn chart_codes<C: ConnectionTrait>(conn: &C, year_id: FiscalYearId) -> Result<Vec<String>, DbErr> {
        Ok(chart_accounts::Entity::find()
            .filter(chart_accounts::Column::YearId.eq(year_id.into_inner()))
            .all(conn)
            .await?
            .into_iter()
            .map(|a| a.code)
            .collect())
    }

    async fn linked<C: ConnectionTrait>(conn: &C, link_id: AccountLinkId) -> Result<Vec<Entry>, DbErr> {
        convert::load_entries(conn, Condition::all().add(entries::Column::LinkId.eq(link_id.into_inner()))).await
    }

    // ========== Entries ==========

    /// Loads one entry.
    pub async fn find(&self, id: EntryId) -> Result<Entry, EntryError> {
        Self::load(&self.db, id).await
    }

    /// Entries of a year passing the list filter.
    pub async fn list(
        &self,
        year_id: FiscalYearId,
        filter: EntryFilter,
        journal_id: Option<i32>,
    ) -> Result<Vec<Entry>, EntryError> {
        let mut condition = Condition::all().add(entries::Column::YearId.eq(year_id.into_inner()));
        if let Some(journal_id) = journal_id {
            condition = condition.add(entries::Column::JournalId.eq(journal_id));
        }
        let all = convert::load_entries(&self.db, condition).await?;
        Ok(EntryService::filter(&all, filter, journal_id, Some(year_id)).cloned().collect())
    }

    /// Creates an empty open entry.
    #[instrument(skip(self, input), fields(year_id = %input.year_id, journal_id = input.journal_id))]
    pub async fn create(&self, input: CreateEntryInput) -> Result<Entry, EntryError> {
        let year = Self::year(&self.db, input.year_id).await?;
        if year.is_finished() {
            return Err(AccountingError::YearFinished.into());
        }
        FiscalService::check_date(&year, input.date_value)?;
        let mut entry = Entry::new(input.year_id, input.journal_id, input.date_value, input.designation);
        entry.costaccounting_id = input.costaccounting_id;
        convert::save_entry(&self.db, &entry).await?;
        info!(entry_id = %entry.id, "entry created");
        Ok(entry)
    }

    /// Adds or replaces a line of an open entry.
    pub async fn save_line(&self, id: EntryId, input: LineInput) -> Result<Entry, EntryError> {
        let mut entry = Self::load(&self.db, id).await?;
        EntryService::add_line(&FrenchSystem, &mut entry, input)?;
        convert::save_entry(&self.db, &entry).await?;
        Ok(entry)
    }

    /// Removes a line of an open entry.
    pub async fn remove_line(&self, id: EntryId, line_id: EntryLineId) -> Result<Entry, EntryError> {
        let mut entry = Self::load(&self.db, id).await?;
        EntryService::remove_line(&mut entry, line_id)?;
        convert::save_entry(&self.db, &entry).await?;
        Ok(entry)
    }

    /// Checks an entry and closes it with the next number of its year.
    #[instrument(skip(self))]
    pub async fn close(&self, id: EntryId, today: NaiveDate) -> Result<Entry, EntryError> {
        let txn = self.db.begin().await?;
        let mut entry = Self::load(&txn, id).await?;
        let year = Self::year(&txn, entry.year_id).await?;
        let codes = Self::chart_codes(&txn, entry.year_id).await?;
        EntryService::validate(&entry, &year, &codes)?;
        let year_entries =
            convert::load_entries(&txn, Condition::all().add(entries::Column::YearId.eq(entry.year_id.into_inner())))
                .await?;
        EntryService::close(&mut entry, EntryService::next_num(&year_entries), today)?;
        convert::save_entry(&txn, &entry).await?;
        txn.commit().await?;
        info!(entry_id = %id, num = ?entry.num, "entry closed");
        Ok(entry)
    }

    /// Deletes an open entry, removing its lettering first.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: EntryId) -> Result<(), EntryError> {
        let txn = self.db.begin().await?;
        let entry = Self::load(&txn, id).await?;
        if let Some(link_id) = EntryService::validate_delete(&entry)? {
            Self::remove_link(&txn, link_id).await?;
        }
        entries::Entity::delete_by_id(id.into_inner()).exec(&txn).await?;
        txn.commit().await?;
        info!(entry_id = %id, "entry deleted");
        Ok(())
    }

    /// Negates the lines of an open entry.
    pub async fn reverse(&self, id: EntryId) -> Result<Entry, EntryError> {
        let mut entry = Self::load(&self.db, id).await?;
        EntryService::reverse(&mut entry)?;
        convert::save_entry(&self.db, &entry).await?;
        Ok(entry)
    }

    /// Records the payment entry settling the third lines of an entry.
    pub async fn create_linked(&self, id: EntryId, today: NaiveDate) -> Result<Entry, EntryError> {
        let entry = Self::load(&self.db, id).await?;
        let year = convert::year_of(&self.db, today)
            .await?
            .filter(|y| !y.is_finished())
            .map_or(entry.year_id, |y| y.id);
        let linked = EntryService::create_linked(&FrenchSystem, &entry, year, today)?;
        convert::save_entry(&self.db, &linked).await?;
        info!(entry_id = %id, linked_id = %linked.id, "linked entry created");
        Ok(linked)
    }

    /// Tags entries with a cost accounting, `None` to clear it.
    pub async fn assign_cost_accounting(
        &self,
        ids: &[EntryId],
        cost_id: Option<CostAccountingId>,
    ) -> Result<usize, EntryError> {
        let costs: Vec<CostAccounting> = cost_accountings::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(convert::cost_accounting)
            .collect::<Result<_, _>>()?;
        let target = match cost_id {
            Some(cost_id) => Some(
                costs
                    .iter()
                    .find(|c| c.id == cost_id)
                    .ok_or(AccountingError::CostAccountingNotFound(cost_id))?,
            ),
            None => None,
        };
        let raw: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        let txn = self.db.begin().await?;
        let mut selected = convert::load_entries(&txn, Condition::all().add(entries::Column::Id.is_in(raw))).await?;
        let changed = EntryService::assign_cost_accounting(&mut selected, target, |id| {
            costs.iter().any(|c| c.id == id && c.is_open())
        })?;
        for entry in &selected {
            convert::save_entry(&txn, entry).await?;
        }
        txn.commit().await?;
        Ok(changed)
    }

    // ========== Lettering ==========

    /// Letters entries together.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn link(&self, ids: &[EntryId]) -> Result<AccountLink, EntryError> {
        let txn = self.db.begin().await?;
        let link = Self::link_in(&txn, ids).await?;
        txn.commit().await?;
        info!(link_id = %link.id, letter = %link.letter, "entries lettered");
        Ok(link)
    }

    pub(crate) async fn link_in<C: ConnectionTrait>(conn: &C, ids: &[EntryId]) -> Result<AccountLink, EntryError> {
        let raw: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        let mut selected = convert::load_entries(conn, Condition::all().add(entries::Column::Id.is_in(raw))).await?;
        let year_id = selected.first().map(|e| e.year_id);
        let used = match year_id {
            Some(year_id) => convert::used_letters(conn, year_id).await?,
            None => Vec::new(),
        };
        let link = LetteringService::create_link(&FrenchSystem, &selected, &used)?;
        convert::upsert(conn, convert::account_link_active(&link)).await?;
        LetteringService::apply(&mut selected, &link);
        for entry in &selected {
            convert::save_entry(conn, entry).await?;
        }
        Ok(link)
    }

    pub(crate) async fn remove_link<C: ConnectionTrait>(conn: &C, link_id: AccountLinkId) -> Result<usize, DbErr> {
        let mut linked = Self::linked(conn, link_id).await?;
        let cleared = LetteringService::unlink(&mut linked, link_id);
        for entry in &linked {
            convert::save_entry(conn, entry).await?;
        }
        account_links::Entity::delete_by_id(link_id.into_inner()).exec(conn).await?;
        Ok(cleared)
    }

    /// Removes the lettering of an entry from every entry sharing it.
    pub async fn unlink(&self, id: EntryId) -> Result<usize, EntryError> {
        let txn = self.db.begin().await?;
        let entry = Self::load(&txn, id).await?;
        let Some(link_id) = entry.link_id else {
            warn!(entry_id = %id, "entry is not lettered");
            return Ok(0);
        };
        let cleared = Self::remove_link(&txn, link_id).await?;
        txn.commit().await?;
        Ok(cleared)
    }

    // ========== Models ==========

    /// Entry models of a journal, every journal when `None`.
    pub async fn list_models(&self, journal_id: Option<i32>) -> Result<Vec<ModelEntry>, EntryError> {
        let mut condition = Condition::all();
        if let Some(journal_id) = journal_id {
            condition = condition.add(model_entries::Column::JournalId.eq(journal_id));
        }
        Ok(convert::load_models(&self.db, condition).await?)
    }

    async fn model(&self, id: ModelEntryId) -> Result<ModelEntry, EntryError> {
        convert::load_models(&self.db, Condition::all().add(model_entries::Column::Id.eq(id.into_inner())))
            .await?
            .pop()
            .ok_or(EntryError::ModelNotFound(id))
    }

    /// Creates or replaces an entry model.
    pub async fn save_model(&self, model: &ModelEntry) -> Result<(), EntryError> {
        let txn = self.db.begin().await?;
        convert::save_model(&txn, model).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Deletes an entry model.
    pub async fn delete_model(&self, id: ModelEntryId) -> Result<(), EntryError> {
        model_entries::Entity::delete_by_id(id.into_inner()).exec(&self.db).await?;
        Ok(())
    }

    /// Records a new open entry pre-filled from a model.
    pub async fn apply_model(
        &self,
        id: ModelEntryId,
        factor: Decimal,
        year_id: FiscalYearId,
        date: NaiveDate,
        currency: &CurrencyFormat,
    ) -> Result<Entry, EntryError> {
        let model = self.model(id).await?;
        let year = Self::year(&self.db, year_id).await?;
        FiscalService::check_date(&year, date)?;
        let entry = EntryService::apply_model(&model, factor, year_id, date, currency)?;
        convert::save_entry(&self.db, &entry).await?;
        Ok(entry)
    }
}
