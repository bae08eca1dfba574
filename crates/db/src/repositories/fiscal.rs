//! Fiscal years, chart of accounts and journals.

use chrono::NaiveDate;
use diacamma_core::accounting::{
    AccountingError, ChartAccount, ChartService, Entry, EntryService, FiscalService, FiscalYear, FiscalYearStatus,
    FrenchSystem, Journal, JournalService, YearResult,
};
use diacamma_shared::types::{ChartAccountId, FiscalYearId};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::{info, instrument};

use crate::convert;
use crate::entities::{chart_accounts, entries, entry_lines, fiscal_years, journals};

/// Error types for fiscal year, chart and journal operations.
#[derive(Debug, thiserror::Error)]
pub enum FiscalError {
    /// Fiscal year not found.
    #[error("Fiscal year not found: {0}")]
    YearNotFound(FiscalYearId),

    /// Journal not found.
    #[error("Journal not found: {0}")]
    JournalNotFound(i32),

    /// Bookkeeping rule refused the operation.
    #[error(transparent)]
    Accounting(#[from] AccountingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a fiscal year; bounds default to the year after the last one.
#[derive(Debug, Clone, Default)]
pub struct CreateYearInput {
    /// First day.
    pub begin: Option<NaiveDate>,
    /// Last day.
    pub end: Option<NaiveDate>,
}

/// Fiscal year, chart and journal repository.
#[derive(Debug, Clone)]
pub struct FiscalRepository {
    db: DatabaseConnection,
}

impl FiscalRepository {
    /// Creates a new fiscal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn year(&self, id: FiscalYearId) -> Result<FiscalYear, FiscalError> {
        let row = fiscal_years::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(FiscalError::YearNotFound(id))?;
        Ok(convert::fiscal_year(row)?)
    }

    // ========== Fiscal Years ==========

    /// Lists fiscal years, oldest first.
    pub async fn list_years(&self) -> Result<Vec<FiscalYear>, FiscalError> {
        Ok(convert::load_years(&self.db).await?)
    }

    /// Selected year, or the active one.
    pub async fn current_year(&self, selected: Option<FiscalYearId>) -> Result<FiscalYear, FiscalError> {
        let years = convert::load_years(&self.db).await?;
        Ok(FiscalService::current(&years, selected)?.clone())
    }

    /// Creates the year following the last one. Its chart starts as a copy
    /// of the previous chart; the first year ever created becomes active.
    #[instrument(skip(self))]
    pub async fn create_year(&self, input: CreateYearInput, today: NaiveDate) -> Result<FiscalYear, FiscalError> {
        let years = convert::load_years(&self.db).await?;
        let last = FiscalService::last_year(&years);
        let (default_begin, default_end) = FiscalService::next_year_bounds(last, today);
        let begin = input.begin.unwrap_or(default_begin);
        let end = input.end.unwrap_or(default_end);
        FiscalService::validate_new_year(begin, end, last)?;

        let year = FiscalYear {
            id: FiscalYearId::new(),
            begin,
            end,
            status: FiscalYearStatus::Building,
            is_active: years.is_empty(),
            last_year_id: last.map(|y| y.id),
            letter_index: last.map_or(0, |y| y.letter_index + 1),
        };

        let txn = self.db.begin().await?;
        convert::upsert(&txn, convert::fiscal_year_active(&year)).await?;
        if let Some(last) = last {
            let chart = chart_accounts::Entity::find()
                .filter(chart_accounts::Column::YearId.eq(last.id.into_inner()))
                .all(&txn)
                .await?;
            for row in chart {
                let mut account = convert::chart_account(row)?;
                account.id = ChartAccountId::new();
                account.year_id = year.id;
                convert::upsert(&txn, convert::chart_account_active(&account)).await?;
            }
        }
        txn.commit().await?;

        info!(year_id = %year.id, %begin, %end, "fiscal year created");
        Ok(year)
    }

    /// Changes the bounds of the last, unfinished year.
    pub async fn modify_year(
        &self,
        id: FiscalYearId,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> Result<FiscalYear, FiscalError> {
        let years = convert::load_years(&self.db).await?;
        let mut year = self.year(id).await?;
        FiscalService::validate_modify(&year, &years, begin, end)?;
        year.begin = begin;
        year.end = end;
        convert::upsert(&self.db, convert::fiscal_year_active(&year)).await?;
        Ok(year)
    }

    /// Deletes the last year with its chart and entries.
    pub async fn delete_year(&self, id: FiscalYearId) -> Result<(), FiscalError> {
        let years = convert::load_years(&self.db).await?;
        let year = self.year(id).await?;
        FiscalService::validate_delete(&year, &years)?;
        fiscal_years::Entity::delete_by_id(id.into_inner()).exec(&self.db).await?;
        info!(year_id = %id, "fiscal year deleted");
        Ok(())
    }

    /// Makes a year the only active one.
    pub async fn activate_year(&self, id: FiscalYearId) -> Result<(), FiscalError> {
        let mut years = convert::load_years(&self.db).await?;
        FiscalService::set_active(&mut years, id)?;
        let txn = self.db.begin().await?;
        for year in &years {
            convert::upsert(&txn, convert::fiscal_year_active(year)).await?;
        }
        txn.commit().await?;
        Ok(())
    }

    /// Building → Running.
    pub async fn begin_year(&self, id: FiscalYearId) -> Result<FiscalYear, FiscalError> {
        let mut year = self.year(id).await?;
        let previous = match year.last_year_id {
            Some(previous_id) => Some(self.year(previous_id).await?),
            None => None,
        };
        FiscalService::begin_year(&mut year, previous.as_ref())?;
        convert::upsert(&self.db, convert::fiscal_year_active(&year)).await?;
        info!(year_id = %id, "fiscal year begun");
        Ok(year)
    }

    async fn year_entries<C: sea_orm::ConnectionTrait>(conn: &C, id: FiscalYearId) -> Result<Vec<Entry>, DbErr> {
        convert::load_entries(conn, Condition::all().add(entries::Column::YearId.eq(id.into_inner()))).await
    }

    /// Running → Finished, recording the closing entry.
    #[instrument(skip(self))]
    pub async fn close_year(&self, id: FiscalYearId) -> Result<Option<Entry>, FiscalError> {
        let txn = self.db.begin().await?;
        let mut year = self.year(id).await?;
        let year_entries = Self::year_entries(&txn, id).await?;
        let closing = FiscalService::close_year(&FrenchSystem, &mut year, &year_entries)?;
        let closing = match closing {
            Some(mut entry) => {
                entry.num = Some(EntryService::next_num(&year_entries));
                convert::save_entry(&txn, &entry).await?;
                Some(entry)
            }
            None => None,
        };
        convert::upsert(&txn, convert::fiscal_year_active(&year)).await?;
        txn.commit().await?;
        info!(year_id = %id, closing = closing.is_some(), "fiscal year closed");
        Ok(closing)
    }

    /// Records the opening entry of a year from its finished predecessor.
    /// An earlier report is replaced.
    #[instrument(skip(self))]
    pub async fn report_last_year(&self, id: FiscalYearId) -> Result<Option<Entry>, FiscalError> {
        let year = self.year(id).await?;
        let previous_id = year.last_year_id.ok_or(AccountingError::PreviousYearNotFinished)?;
        let previous = self.year(previous_id).await?;
        let txn = self.db.begin().await?;
        let previous_entries = Self::year_entries(&txn, previous_id).await?;
        let opening = FiscalService::report_last_year(&FrenchSystem, &year, &previous, &previous_entries)?;
        entries::Entity::delete_many()
            .filter(entries::Column::YearId.eq(id.into_inner()))
            .filter(entries::Column::JournalId.eq(Journal::REPORTED))
            .filter(entries::Column::Close.eq(false))
            .exec(&txn)
            .await?;
        if let Some(entry) = &opening {
            convert::save_entry(&txn, entry).await?;
        }
        txn.commit().await?;
        Ok(opening)
    }

    /// Revenue, expense and treasury totals of a year.
    pub async fn year_result(&self, id: FiscalYearId) -> Result<YearResult, FiscalError> {
        let year_entries = Self::year_entries(&self.db, id).await?;
        Ok(FiscalService::total_result(&FrenchSystem, &year_entries))
    }

    // ========== Chart of Accounts ==========

    /// Chart of a year, by code.
    pub async fn list_chart(&self, year_id: FiscalYearId) -> Result<Vec<ChartAccount>, FiscalError> {
        let rows = chart_accounts::Entity::find()
            .filter(chart_accounts::Column::YearId.eq(year_id.into_inner()))
            .order_by_asc(chart_accounts::Column::Code)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(convert::chart_account).collect::<Result<_, _>>()?)
    }

    /// Adds an account to the chart of a year.
    pub async fn add_account(
        &self,
        year_id: FiscalYearId,
        code: &str,
        name: &str,
    ) -> Result<ChartAccount, FiscalError> {
        let year = self.year(year_id).await?;
        if year.is_finished() {
            return Err(AccountingError::YearFinished.into());
        }
        let chart = self.list_chart(year_id).await?;
        let account_type = ChartService::validate_new_account(&FrenchSystem, code, &chart)?;
        let account = ChartAccount {
            id: ChartAccountId::new(),
            year_id,
            code: code.to_string(),
            name: name.to_string(),
            account_type,
        };
        convert::upsert(&self.db, convert::chart_account_active(&account)).await?;
        info!(%year_id, code, "account added");
        Ok(account)
    }

    /// Removes an account without lines from the chart of a year.
    pub async fn delete_account(&self, year_id: FiscalYearId, code: &str) -> Result<(), FiscalError> {
        let chart = self.list_chart(year_id).await?;
        let account = ChartService::find(&chart, code)?;
        let lines = entry_lines::Entity::find()
            .inner_join(entries::Entity)
            .filter(entries::Column::YearId.eq(year_id.into_inner()))
            .filter(entry_lines::Column::AccountCode.eq(code))
            .count(&self.db)
            .await?;
        ChartService::validate_delete(account, lines > 0)?;
        chart_accounts::Entity::delete_by_id(account.id.into_inner()).exec(&self.db).await?;
        Ok(())
    }

    // ========== Journals ==========

    /// Every journal, by id.
    pub async fn list_journals(&self) -> Result<Vec<Journal>, FiscalError> {
        let rows = journals::Entity::find()
            .order_by_asc(journals::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(convert::journal).collect())
    }

    /// Creates a user journal.
    pub async fn create_journal(&self, name: &str) -> Result<Journal, FiscalError> {
        let last = journals::Entity::find()
            .order_by_desc(journals::Column::Id)
            .one(&self.db)
            .await?
            .map_or(Journal::OTHER, |j| j.id);
        let journal = JournalService::create(last.max(Journal::OTHER) + 1, name)?;
        convert::upsert(&self.db, convert::journal_active(&journal)).await?;
        Ok(journal)
    }

    async fn journal(&self, id: i32) -> Result<Journal, FiscalError> {
        journals::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(convert::journal)
            .ok_or(FiscalError::JournalNotFound(id))
    }

    /// Renames a user journal.
    pub async fn rename_journal(&self, id: i32, name: &str) -> Result<Journal, FiscalError> {
        let mut journal = self.journal(id).await?;
        JournalService::rename(&mut journal, name)?;
        convert::upsert(&self.db, convert::journal_active(&journal)).await?;
        Ok(journal)
    }

    /// Deletes an unused user journal.
    pub async fn delete_journal(&self, id: i32) -> Result<(), FiscalError> {
        let journal = self.journal(id).await?;
        let used = entries::Entity::find()
            .filter(entries::Column::JournalId.eq(id))
            .count(&self.db)
            .await?;
        JournalService::validate_delete(&journal, used > 0)?;
        journals::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
