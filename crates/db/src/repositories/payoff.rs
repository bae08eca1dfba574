//! Payoffs, bank accounts, payment methods and external payment confirmation.

use chrono::{DateTime, NaiveDate, Utc};
use diacamma_core::accounting::{AccountingError, AccountingParams, FrenchSystem};
use diacamma_core::invoice::{Bill, BillStatus, BillType, InvoiceError, InvoiceParams};
use diacamma_core::payoff::{
    BankAccount, BankTransaction, PaymentError, PaymentMethod, PaymentService, PaymentVerifier, Payoff,
    PayoffContext, PayoffError, PayoffGroup, PayoffInput, PayoffService, Supporting, VerifyResult,
};
use diacamma_shared::types::{
    AccountLinkId, BankAccountId, BillId, CostAccountingId, EntryId, PaymentMethodId, PayoffId, ThirdId,
};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::entry::{EntryError, EntryRepository};
use super::invoice::{BillError, BillRepository};
use crate::convert;
use crate::entities::{
    bank_accounts, bank_transactions, bills, cost_accountings, entries, payment_methods, payoffs, thirds,
};

/// Error types for payoff operations.
#[derive(Debug, thiserror::Error)]
pub enum PayoffRepoError {
    /// Payoff not found.
    #[error("Payoff not found: {0}")]
    NotFound(PayoffId),

    /// Document not found.
    #[error("Document not found: {0}")]
    BillNotFound(BillId),

    /// Bank account not found.
    #[error("Bank account not found: {0}")]
    BankAccountNotFound(BankAccountId),

    /// Payment method not found.
    #[error("Payment method not found: {0}")]
    MethodNotFound(PaymentMethodId),

    /// Payoff rule refused the operation.
    #[error(transparent)]
    Payoff(#[from] PayoffError),

    /// Payment method or notification refused.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Invoicing rule refused the operation.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    /// Document operation failed.
    #[error(transparent)]
    Bill(#[from] BillError),

    /// Entry operation failed.
    #[error(transparent)]
    Entry(#[from] EntryError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Payoff repository.
#[derive(Debug, Clone)]
pub struct PayoffRepository {
    db: DatabaseConnection,
    accounting: AccountingParams,
    invoice: InvoiceParams,
    bills: BillRepository,
}

impl PayoffRepository {
    /// Creates a new payoff repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, accounting: AccountingParams, invoice: InvoiceParams) -> Self {
        let bills = BillRepository::new(db.clone(), invoice.clone());
        Self {
            db,
            accounting,
            invoice,
            bills,
        }
    }

    // ========== Supportings ==========

    async fn supportings<C: ConnectionTrait>(
        &self,
        conn: &C,
        condition: Condition,
    ) -> Result<Vec<Supporting>, PayoffRepoError> {
        let documents = convert::load_bills(conn, condition).await?;
        let third_ids: Vec<Uuid> = documents
            .iter()
            .filter_map(|(b, _)| b.third_id.map(ThirdId::into_inner))
            .collect();
        let thirds = convert::load_thirds(conn, Condition::all().add(thirds::Column::Id.is_in(third_ids))).await?;
        let bill_ids: Vec<Uuid> = documents.iter().map(|(b, _)| b.id.into_inner()).collect();
        let mut all_payoffs = convert::load_payoffs(conn, bill_ids).await?;

        let mut result = Vec::with_capacity(documents.len());
        for (bill, details) in &documents {
            let account = bill
                .third_id
                .and_then(|id| thirds.iter().find(|t| t.id == id))
                .and_then(|t| t.customer_account(&FrenchSystem))
                .unwrap_or_default()
                .to_string();
            let (own, rest): (Vec<Payoff>, Vec<Payoff>) =
                all_payoffs.into_iter().partition(|p| p.supporting_id == bill.id);
            all_payoffs = rest;
            if let Some(supporting) = Supporting::from_bill(bill, details, account, &self.invoice, own) {
                result.push(supporting);
            }
        }
        Ok(result)
    }

    async fn supporting<C: ConnectionTrait>(&self, conn: &C, id: BillId) -> Result<Supporting, PayoffRepoError> {
        self.supportings(conn, Condition::all().add(bills::Column::Id.eq(id.into_inner())))
            .await?
            .pop()
            .ok_or(PayoffRepoError::BillNotFound(id))
    }

    /// Payment view of a document.
    pub async fn find_supporting(&self, id: BillId) -> Result<Supporting, PayoffRepoError> {
        self.supporting(&self.db, id).await
    }

    /// Payable documents of a third with something left to pay.
    pub async fn unpaid(&self, third_id: ThirdId) -> Result<Vec<Supporting>, PayoffRepoError> {
        let all = self
            .supportings(&self.db, Condition::all().add(bills::Column::ThirdId.eq(third_id.into_inner())))
            .await?;
        Ok(all
            .into_iter()
            .filter(|s| s.is_payable && !s.rest_to_pay().is_zero())
            .collect())
    }

    // ========== Payoffs ==========

    /// Payoffs of a document, by date.
    pub async fn list(&self, bill_id: BillId) -> Result<Vec<Payoff>, PayoffRepoError> {
        Ok(convert::load_payoffs(&self.db, vec![bill_id.into_inner()]).await?)
    }

    async fn default_cost_accounting<C: ConnectionTrait>(conn: &C) -> Result<Option<CostAccountingId>, DbErr> {
        Ok(cost_accountings::Entity::find()
            .filter(cost_accountings::Column::IsDefault.eq(true))
            .one(conn)
            .await?
            .map(|c| CostAccountingId::from_uuid(c.id)))
    }

    /// Records a payoff on one or several documents with its payment entry,
    /// then letters the settled documents.
    #[instrument(skip(self, input), fields(count = bill_ids.len(), amount = %input.amount))]
    pub async fn save(&self, bill_ids: &[BillId], input: &PayoffInput) -> Result<PayoffGroup, PayoffRepoError> {
        let txn = self.db.begin().await?;
        let group = self.save_in(&txn, bill_ids, input).await?;
        txn.commit().await?;
        info!(entry_id = %group.entry.id, payoffs = group.payoffs.len(), "payoff recorded");
        Ok(group)
    }

    async fn save_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        bill_ids: &[BillId],
        input: &PayoffInput,
    ) -> Result<PayoffGroup, PayoffRepoError> {
        let raw: Vec<Uuid> = bill_ids.iter().map(|id| id.into_inner()).collect();
        let supportings = self
            .supportings(conn, Condition::all().add(bills::Column::Id.is_in(raw)))
            .await?;
        let selected: Vec<&Supporting> = supportings.iter().collect();
        let year = convert::year_of(conn, input.date)
            .await?
            .ok_or(PayoffError::Accounting(AccountingError::NoCurrentYear))?;
        let bank = match input.bank_account_id {
            Some(id) => Some(Self::bank_account(conn, id).await?),
            None => None,
        };
        let ctx = PayoffContext {
            year: &year,
            params: &self.accounting,
            bank_account: bank.as_ref(),
            default_cost_accounting: Self::default_cost_accounting(conn).await?,
        };
        let group = PayoffService::multi_save(&selected, input, &ctx)?;
        convert::save_entry(conn, &group.entry).await?;
        for payoff in &group.payoffs {
            convert::upsert(conn, convert::payoff_active(payoff)).await?;
        }
        for supporting in &supportings {
            self.letter_settled(conn, supporting.id, supporting.third_id).await?;
        }
        Ok(group)
    }

    /// Letters the entries of a settled group of documents. A refused
    /// lettering leaves the payoffs recorded.
    async fn letter_settled<C: ConnectionTrait>(
        &self,
        conn: &C,
        bill_id: BillId,
        third_id: ThirdId,
    ) -> Result<(), PayoffRepoError> {
        let of_third = self
            .supportings(conn, Condition::all().add(bills::Column::ThirdId.eq(third_id.into_inner())))
            .await?;
        let Some(entry_ids) = PayoffService::lettering_entries(bill_id, &of_third) else {
            return Ok(());
        };
        let raw: Vec<Uuid> = entry_ids.iter().map(|id| id.into_inner()).collect();
        let already = entries::Entity::find()
            .filter(entries::Column::Id.is_in(raw))
            .filter(entries::Column::LinkId.is_not_null())
            .one(conn)
            .await?;
        if already.is_some() {
            return Ok(());
        }
        if let Err(err) = EntryRepository::link_in(conn, &entry_ids).await {
            warn!(%bill_id, error = %err, "settled document not lettered");
        }
        Ok(())
    }

    /// Replaces a payoff group with a new form on the same documents.
    #[instrument(skip(self, input))]
    pub async fn edit(&self, id: PayoffId, input: &PayoffInput) -> Result<PayoffGroup, PayoffRepoError> {
        let txn = self.db.begin().await?;
        let payoff = Self::payoff(&txn, id).await?;
        let removed = Self::delete_in(&txn, &payoff).await?;
        let group = self.save_in(&txn, &removed, input).await?;
        txn.commit().await?;
        Ok(group)
    }

    /// Turns a valid quotation into an order, recording the down payment
    /// when one is given. Nothing is kept when either step is refused.
    #[instrument(skip(self, down_payment))]
    pub async fn order_quotation(
        &self,
        quotation_id: BillId,
        today: NaiveDate,
        down_payment: Option<&PayoffInput>,
    ) -> Result<(Bill, Option<PayoffGroup>), PayoffRepoError> {
        let txn = self.db.begin().await?;
        let order = self.bills.to_order_in(&txn, quotation_id, today).await?;
        let group = match down_payment {
            Some(input) => Some(self.save_in(&txn, &[order.id], input).await?),
            None => None,
        };
        txn.commit().await?;
        Ok((order, group))
    }

    /// Settles a credit note against a bill of the same third.
    #[instrument(skip(self))]
    pub async fn internal(
        &self,
        source_id: BillId,
        linked_id: BillId,
        date: NaiveDate,
    ) -> Result<(Payoff, Payoff), PayoffRepoError> {
        let txn = self.db.begin().await?;
        let source = self.supporting(&txn, source_id).await?;
        let linked = self.supporting(&txn, linked_id).await?;
        let year = convert::year_of(&txn, date)
            .await?
            .ok_or(PayoffError::Accounting(AccountingError::NoCurrentYear))?;
        let (first, second) = PayoffService::internal_payoff(&source, &linked, date, &year)?;
        // Each mirror references the other: both rows exist before the links.
        for payoff in [&first, &second] {
            let mut row = convert::payoff_active(payoff);
            row.linked_payoff_id = Set(None);
            convert::upsert(&txn, row).await?;
        }
        for payoff in [&first, &second] {
            convert::upsert(&txn, convert::payoff_active(payoff)).await?;
        }
        info!(amount = %first.amount, "internal payoff recorded");
        self.letter_settled(&txn, source_id, source.third_id).await?;
        txn.commit().await?;
        Ok((first, second))
    }

    async fn payoff<C: ConnectionTrait>(conn: &C, id: PayoffId) -> Result<Payoff, PayoffRepoError> {
        let row = payoffs::Entity::find_by_id(id.into_inner())
            .one(conn)
            .await?
            .ok_or(PayoffRepoError::NotFound(id))?;
        Ok(convert::payoff(row)?)
    }

    /// Deletes the payoffs going with `payoff` and their payment entry;
    /// returns the documents they paid.
    async fn delete_in<C: ConnectionTrait>(conn: &C, payoff: &Payoff) -> Result<Vec<BillId>, PayoffRepoError> {
        let mut related = Condition::any();
        if let Some(entry_id) = payoff.entry_id {
            related = related.add(payoffs::Column::EntryId.eq(entry_id.into_inner()));
        }
        if let Some(linked_id) = payoff.linked_payoff_id {
            related = related.add(payoffs::Column::Id.eq(linked_id.into_inner()));
        }
        related = related.add(payoffs::Column::Id.eq(payoff.id.into_inner()));
        let group: Vec<Payoff> = payoffs::Entity::find()
            .filter(related)
            .all(conn)
            .await?
            .into_iter()
            .map(convert::payoff)
            .collect::<Result<_, _>>()?;
        let entry = match payoff.entry_id {
            Some(entry_id) => convert::find_entry(conn, entry_id).await?,
            None => None,
        };
        let deletion = PayoffService::validate_delete(payoff, &group, entry.as_ref())?;

        let supportings: Vec<BillId> = group
            .iter()
            .filter(|p| deletion.payoff_ids.contains(&p.id))
            .map(|p| p.supporting_id)
            .collect();
        Self::unletter(conn, &supportings).await?;
        let ids: Vec<Uuid> = deletion.payoff_ids.iter().map(|id| id.into_inner()).collect();
        payoffs::Entity::delete_many()
            .filter(payoffs::Column::Id.is_in(ids))
            .exec(conn)
            .await?;
        if let Some(entry_id) = deletion.entry_id {
            entries::Entity::delete_by_id(entry_id.into_inner()).exec(conn).await?;
        }
        Ok(supportings)
    }

    /// Removes the lettering of document entries that are no longer settled.
    async fn unletter<C: ConnectionTrait>(conn: &C, supportings: &[BillId]) -> Result<(), PayoffRepoError> {
        let raw: Vec<Uuid> = supportings.iter().map(|id| id.into_inner()).collect();
        let entry_ids: Vec<Uuid> = bills::Entity::find()
            .filter(bills::Column::Id.is_in(raw.clone()))
            .all(conn)
            .await?
            .into_iter()
            .filter_map(|b| b.entry_id)
            .chain(
                payoffs::Entity::find()
                    .filter(payoffs::Column::SupportingId.is_in(raw))
                    .all(conn)
                    .await?
                    .into_iter()
                    .filter_map(|p| p.entry_id),
            )
            .collect();
        let links: Vec<Uuid> = entries::Entity::find()
            .filter(entries::Column::Id.is_in(entry_ids))
            .filter(entries::Column::LinkId.is_not_null())
            .all(conn)
            .await?
            .into_iter()
            .filter_map(|e| e.link_id)
            .collect();
        for link in links {
            EntryRepository::remove_link(conn, AccountLinkId::from_uuid(link)).await?;
        }
        Ok(())
    }

    /// Deletes a payoff with the payoffs sharing its entry, or its internal mirror.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: PayoffId) -> Result<(), PayoffRepoError> {
        let txn = self.db.begin().await?;
        let payoff = Self::payoff(&txn, id).await?;
        let documents = Self::delete_in(&txn, &payoff).await?;
        txn.commit().await?;
        info!(payoff_id = %id, documents = documents.len(), "payoff deleted");
        Ok(())
    }

    /// Payment entry of a payoff.
    pub async fn entry_of(&self, id: PayoffId) -> Result<Option<EntryId>, PayoffRepoError> {
        Ok(Self::payoff(&self.db, id).await?.entry_id)
    }

    // ========== Bank Accounts ==========

    async fn bank_account<C: ConnectionTrait>(conn: &C, id: BankAccountId) -> Result<BankAccount, PayoffRepoError> {
        bank_accounts::Entity::find_by_id(id.into_inner())
            .one(conn)
            .await?
            .map(convert::bank_account)
            .ok_or(PayoffRepoError::BankAccountNotFound(id))
    }

    /// Bank accounts, by designation.
    pub async fn list_bank_accounts(&self) -> Result<Vec<BankAccount>, PayoffRepoError> {
        let rows = bank_accounts::Entity::find()
            .order_by_asc(bank_accounts::Column::Designation)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(convert::bank_account).collect())
    }

    /// Creates or replaces a bank account.
    pub async fn save_bank_account(&self, account: &BankAccount) -> Result<(), PayoffRepoError> {
        convert::upsert(&self.db, convert::bank_account_active(account)).await?;
        Ok(())
    }

    // ========== Payment Methods ==========

    /// Payment methods printed on documents.
    pub async fn list_methods(&self) -> Result<Vec<PaymentMethod>, PayoffRepoError> {
        Self::methods(&self.db).await
    }

    async fn methods<C: ConnectionTrait>(conn: &C) -> Result<Vec<PaymentMethod>, PayoffRepoError> {
        let rows = payment_methods::Entity::find()
            .order_by_asc(payment_methods::Column::Paytype)
            .all(conn)
            .await?;
        Ok(rows.into_iter().map(convert::payment_method).collect::<Result<_, _>>()?)
    }

    /// Checks and stores a payment method.
    pub async fn save_method(&self, method: &PaymentMethod) -> Result<(), PayoffRepoError> {
        PaymentMethod::validate_extra_data(method.paytype, &method.extra_data)?;
        Self::bank_account(&self.db, method.bank_account_id).await?;
        convert::upsert(&self.db, convert::payment_method_active(method)?).await?;
        Ok(())
    }

    /// Deletes a payment method.
    pub async fn delete_method(&self, id: PaymentMethodId) -> Result<(), PayoffRepoError> {
        let deleted = payment_methods::Entity::delete_by_id(id.into_inner()).exec(&self.db).await?;
        if deleted.rows_affected == 0 {
            return Err(PayoffRepoError::MethodNotFound(id));
        }
        Ok(())
    }

    // ========== External Payments ==========

    /// Handles a payment notification: verifies it with the provider, then
    /// records the payoff. Quotations are validated and turned into bills
    /// first. The transaction log is stored whatever the outcome.
    #[instrument(skip(self, verifier, fields))]
    pub async fn confirm_external_payment(
        &self,
        verifier: &dyn PaymentVerifier,
        fields: &[(String, String)],
        now: DateTime<Utc>,
    ) -> Result<BankTransaction, PayoffRepoError> {
        let verification = match verifier.verify(fields).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "payment verification failed");
                VerifyResult::Other(err.to_string())
            }
        };
        let methods = Self::methods(&self.db).await?;
        let confirmation = PaymentService::confirm(fields, &verification, &methods, now);
        let mut transaction = confirmation.transaction;

        if let Some(request) = confirmation.payoff {
            let txn = self.db.begin().await?;
            match self.pay_request(&txn, request.supporting_id, &request.input).await {
                Ok(bill_id) => {
                    txn.commit().await?;
                    info!(%bill_id, amount = %request.input.amount, "external payment recorded");
                }
                Err(err) => {
                    txn.rollback().await?;
                    warn!(supporting_id = %request.supporting_id, error = %err, "external payment not recorded");
                    transaction.record_error(&err.to_string());
                }
            }
        }
        convert::upsert(&self.db, convert::bank_transaction_active(&transaction)).await?;
        Ok(transaction)
    }

    async fn pay_request<C: ConnectionTrait>(
        &self,
        conn: &C,
        supporting_id: BillId,
        input: &PayoffInput,
    ) -> Result<BillId, PayoffRepoError> {
        let (bill, _) = convert::find_bill(conn, supporting_id)
            .await?
            .ok_or(PayoffRepoError::BillNotFound(supporting_id))?;
        let target = if bill.bill_type == BillType::Quotation {
            if bill.status == BillStatus::Building {
                self.bills.validate_in(conn, bill.id).await?;
            }
            let created = BillRepository::transform_in(conn, bill.id, input.date).await?;
            self.bills.validate_in(conn, created.id).await?.id
        } else {
            bill.id
        };
        self.save_in(conn, &[target], input).await?;
        Ok(target)
    }

    /// Logged payment notifications, newest first.
    pub async fn list_transactions(&self) -> Result<Vec<BankTransaction>, PayoffRepoError> {
        let rows = bank_transactions::Entity::find()
            .order_by_desc(bank_transactions::Column::Date)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(convert::bank_transaction).collect::<Result<_, _>>()?)
    }
}
