//! Mapping between stored rows and core types, plus the loaders and
//! writers shared by repositories.
//!
//! Loaders accept any [`ConnectionTrait`] so they run the same way on the
//! pool and inside a transaction.

use std::collections::BTreeMap;

use chrono::Utc;
use diacamma_core::accounting::{
    AccountLink, AccountThird, AccountType, ChartAccount, Entry, EntryLine, FiscalYear, FiscalYearStatus, Journal,
    ModelEntry, ModelLine, Third, ThirdStatus,
};
use diacamma_core::cost_accounting::{CostAccounting, CostAccountingStatus};
use diacamma_core::invoice::{
    Article, AutomaticReduce, Bill, BillStatus, BillType, Category, CategoryBill, Detail, ReduceMode, Stockable, Vat,
};
use diacamma_core::payoff::{
    BankAccount, BankTransaction, BankTransactionStatus, PaymentMethod, PaymentType, Payoff, PayoffMode,
};
use diacamma_core::storage::{
    InventoryDetail, InventorySheet, SheetStatus, SheetType, StorageArea, StorageDetail, StorageSheet,
};
use diacamma_shared::types::{
    AccountLinkId, AccountThirdId, ArticleId, AutomaticReduceId, BankAccountId, BankTransactionId, BillId,
    CategoryBillId, CategoryId, ChartAccountId, CostAccountingId, DetailId, EntryId, EntryLineId, FiscalYearId,
    InventoryDetailId, InventorySheetId, ModelEntryId, ModelLineId, PaymentMethodId, PayoffId, StorageAreaId,
    StorageDetailId, StorageSheetId, ThirdId, VatId,
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, IdenStatic, IntoActiveModel,
    Iterable, PrimaryKeyToColumn, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::entities::{
    account_links, account_thirds, articles, automatic_reduces, bank_accounts, bank_transactions, bills,
    categories, category_bills, chart_accounts, cost_accountings, details, entries, entry_lines, fiscal_years,
    inventory_details, inventory_sheets, journals, model_entries, model_lines, payment_methods, payoffs,
    storage_areas, storage_details, storage_sheets, thirds, vats,
};

// ========== Decoding ==========

fn code<T>(value: Option<T>, what: &str, raw: impl std::fmt::Display) -> Result<T, DbErr> {
    value.ok_or_else(|| DbErr::Custom(format!("invalid {what} code {raw}")))
}

fn from_json<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, DbErr> {
    serde_json::from_value(value.clone()).map_err(|e| DbErr::Json(e.to_string()))
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, DbErr> {
    serde_json::to_value(value).map_err(|e| DbErr::Json(e.to_string()))
}

fn position(index: usize) -> Result<i32, DbErr> {
    i32::try_from(index).map_err(|_| DbErr::Custom(format!("line position {index} out of range")))
}

/// Inserts a row or updates every non key column of the existing one.
pub(crate) async fn upsert<A, C>(conn: &C, model: A) -> Result<(), DbErr>
where
    A: ActiveModelTrait,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    let keys: Vec<<A::Entity as EntityTrait>::Column> = <A::Entity as EntityTrait>::PrimaryKey::iter()
        .map(PrimaryKeyToColumn::into_column)
        .collect();
    let columns = <A::Entity as EntityTrait>::Column::iter()
        .filter(|c| !keys.iter().any(|k| k.as_str() == c.as_str()));
    let conflict = OnConflict::columns(keys.clone()).update_columns(columns).to_owned();
    <A::Entity as EntityTrait>::insert(model)
        .on_conflict(conflict)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

// ========== Accounting ==========

pub(crate) fn fiscal_year(m: fiscal_years::Model) -> Result<FiscalYear, DbErr> {
    Ok(FiscalYear {
        id: FiscalYearId::from_uuid(m.id),
        begin: m.begin_date,
        end: m.end_date,
        status: code(FiscalYearStatus::from_code(m.status), "fiscal year status", m.status)?,
        is_active: m.is_active,
        last_year_id: m.last_year_id.map(FiscalYearId::from_uuid),
        letter_index: m.letter_index,
    })
}

pub(crate) fn fiscal_year_active(year: &FiscalYear) -> fiscal_years::ActiveModel {
    fiscal_years::ActiveModel {
        id: Set(year.id.into_inner()),
        begin_date: Set(year.begin),
        end_date: Set(year.end),
        status: Set(year.status.code()),
        is_active: Set(year.is_active),
        last_year_id: Set(year.last_year_id.map(FiscalYearId::into_inner)),
        letter_index: Set(year.letter_index),
    }
}

pub(crate) fn chart_account(m: chart_accounts::Model) -> Result<ChartAccount, DbErr> {
    Ok(ChartAccount {
        id: ChartAccountId::from_uuid(m.id),
        year_id: FiscalYearId::from_uuid(m.year_id),
        code: m.code,
        name: m.name,
        account_type: code(AccountType::from_code(m.account_type), "account type", m.account_type)?,
    })
}

pub(crate) fn chart_account_active(account: &ChartAccount) -> chart_accounts::ActiveModel {
    chart_accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        year_id: Set(account.year_id.into_inner()),
        code: Set(account.code.clone()),
        name: Set(account.name.clone()),
        account_type: Set(account.account_type.code()),
    }
}

pub(crate) fn journal(m: journals::Model) -> Journal {
    Journal {
        id: m.id,
        name: m.name,
        is_reserved: m.is_reserved,
    }
}

pub(crate) fn journal_active(journal: &Journal) -> journals::ActiveModel {
    journals::ActiveModel {
        id: Set(journal.id),
        name: Set(journal.name.clone()),
        is_reserved: Set(journal.is_reserved),
    }
}

fn third(m: thirds::Model, accounts: Vec<account_thirds::Model>) -> Result<Third, DbErr> {
    Ok(Third {
        id: ThirdId::from_uuid(m.id),
        contact: m.contact,
        status: code(ThirdStatus::from_code(m.status), "third status", m.status)?,
        accounts: accounts
            .into_iter()
            .map(|a| AccountThird {
                id: AccountThirdId::from_uuid(a.id),
                third_id: ThirdId::from_uuid(a.third_id),
                code: a.code,
            })
            .collect(),
        custom_fields: from_json(&m.custom_fields)?,
    })
}

pub(crate) fn entry_line(m: entry_lines::Model) -> EntryLine {
    EntryLine {
        id: EntryLineId::from_uuid(m.id),
        account_code: m.account_code,
        amount: m.amount,
        third_id: m.third_id.map(ThirdId::from_uuid),
        reference: m.reference,
    }
}

fn entry(m: entries::Model, lines: Vec<EntryLine>) -> Entry {
    Entry {
        id: EntryId::from_uuid(m.id),
        year_id: FiscalYearId::from_uuid(m.year_id),
        journal_id: m.journal_id,
        num: m.num,
        date_entry: m.date_entry,
        date_value: m.date_value,
        designation: m.designation,
        close: m.close,
        link_id: m.link_id.map(AccountLinkId::from_uuid),
        costaccounting_id: m.costaccounting_id.map(CostAccountingId::from_uuid),
        lines,
    }
}

fn entry_active(entry: &Entry) -> entries::ActiveModel {
    entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        year_id: Set(entry.year_id.into_inner()),
        journal_id: Set(entry.journal_id),
        num: Set(entry.num),
        date_entry: Set(entry.date_entry),
        date_value: Set(entry.date_value),
        designation: Set(entry.designation.clone()),
        close: Set(entry.close),
        link_id: Set(entry.link_id.map(AccountLinkId::into_inner)),
        costaccounting_id: Set(entry.costaccounting_id.map(CostAccountingId::into_inner)),
    }
}

pub(crate) fn account_link(m: account_links::Model) -> AccountLink {
    AccountLink {
        id: AccountLinkId::from_uuid(m.id),
        year_id: FiscalYearId::from_uuid(m.year_id),
        letter: m.letter,
    }
}

pub(crate) fn account_link_active(link: &AccountLink) -> account_links::ActiveModel {
    account_links::ActiveModel {
        id: Set(link.id.into_inner()),
        year_id: Set(link.year_id.into_inner()),
        letter: Set(link.letter.clone()),
    }
}

pub(crate) fn cost_accounting(m: cost_accountings::Model) -> Result<CostAccounting, DbErr> {
    Ok(CostAccounting {
        id: CostAccountingId::from_uuid(m.id),
        name: m.name,
        description: m.description,
        status: code(CostAccountingStatus::from_code(m.status), "cost accounting status", m.status)?,
        last_costaccounting_id: m.last_costaccounting_id.map(CostAccountingId::from_uuid),
        is_default: m.is_default,
        year_id: m.year_id.map(FiscalYearId::from_uuid),
    })
}

pub(crate) fn cost_accounting_active(cost: &CostAccounting) -> cost_accountings::ActiveModel {
    cost_accountings::ActiveModel {
        id: Set(cost.id.into_inner()),
        name: Set(cost.name.clone()),
        description: Set(cost.description.clone()),
        status: Set(cost.status.code()),
        last_costaccounting_id: Set(cost.last_costaccounting_id.map(CostAccountingId::into_inner)),
        is_default: Set(cost.is_default),
        year_id: Set(cost.year_id.map(FiscalYearId::into_inner)),
    }
}

// ========== Invoicing ==========

pub(crate) fn vat(m: vats::Model) -> Vat {
    Vat {
        id: VatId::from_uuid(m.id),
        name: m.name,
        rate: m.rate,
        is_active: m.is_active,
    }
}

pub(crate) fn vat_active(vat: &Vat) -> vats::ActiveModel {
    vats::ActiveModel {
        id: Set(vat.id.into_inner()),
        name: Set(vat.name.clone()),
        rate: Set(vat.rate),
        is_active: Set(vat.is_active),
    }
}

pub(crate) fn article(m: articles::Model) -> Result<Article, DbErr> {
    Ok(Article {
        id: ArticleId::from_uuid(m.id),
        reference: m.reference,
        designation: m.designation,
        price: m.price,
        unit: m.unit,
        sell_account: m.sell_account,
        vat_id: m.vat_id.map(VatId::from_uuid),
        stockable: code(Stockable::from_code(m.stockable), "stockable", m.stockable)?,
        category_ids: from_json(&m.category_ids)?,
        is_disabled: m.is_disabled,
    })
}

pub(crate) fn article_active(article: &Article) -> Result<articles::ActiveModel, DbErr> {
    Ok(articles::ActiveModel {
        id: Set(article.id.into_inner()),
        reference: Set(article.reference.clone()),
        designation: Set(article.designation.clone()),
        price: Set(article.price),
        unit: Set(article.unit.clone()),
        sell_account: Set(article.sell_account.clone()),
        vat_id: Set(article.vat_id.map(VatId::into_inner)),
        stockable: Set(article.stockable.code()),
        category_ids: Set(to_json(&article.category_ids)?),
        is_disabled: Set(article.is_disabled),
    })
}

pub(crate) fn category(m: categories::Model) -> Category {
    Category {
        id: CategoryId::from_uuid(m.id),
        name: m.name,
        designation: m.designation,
    }
}

pub(crate) fn category_active(category: &Category) -> categories::ActiveModel {
    categories::ActiveModel {
        id: Set(category.id.into_inner()),
        name: Set(category.name.clone()),
        designation: Set(category.designation.clone()),
    }
}

pub(crate) fn category_bill(m: category_bills::Model) -> CategoryBill {
    CategoryBill {
        id: CategoryBillId::from_uuid(m.id),
        name: m.name,
        prefix_numbering: m.prefix_numbering,
        special_numbering: m.special_numbering,
        is_default: m.is_default,
    }
}

pub(crate) fn category_bill_active(category: &CategoryBill) -> category_bills::ActiveModel {
    category_bills::ActiveModel {
        id: Set(category.id.into_inner()),
        name: Set(category.name.clone()),
        prefix_numbering: Set(category.prefix_numbering.clone()),
        special_numbering: Set(category.special_numbering),
        is_default: Set(category.is_default),
    }
}

fn bill(m: bills::Model) -> Result<Bill, DbErr> {
    Ok(Bill {
        id: BillId::from_uuid(m.id),
        bill_type: code(BillType::from_code(m.bill_type), "bill type", m.bill_type)?,
        num: m.num,
        num_txt: m.num_txt,
        fiscal_year_id: m.fiscal_year_id.map(FiscalYearId::from_uuid),
        date: m.date,
        third_id: m.third_id.map(ThirdId::from_uuid),
        comment: m.comment,
        status: code(BillStatus::from_code(m.status), "bill status", m.status)?,
        entry_id: m.entry_id.map(EntryId::from_uuid),
        parent_id: m.parent_id.map(BillId::from_uuid),
        cost_accounting_id: m.cost_accounting_id.map(CostAccountingId::from_uuid),
        category_id: m.category_id.map(CategoryBillId::from_uuid),
    })
}

fn bill_active(bill: &Bill) -> bills::ActiveModel {
    bills::ActiveModel {
        id: Set(bill.id.into_inner()),
        bill_type: Set(bill.bill_type.code()),
        num: Set(bill.num),
        num_txt: Set(bill.num_txt.clone()),
        fiscal_year_id: Set(bill.fiscal_year_id.map(FiscalYearId::into_inner)),
        date: Set(bill.date),
        third_id: Set(bill.third_id.map(ThirdId::into_inner)),
        comment: Set(bill.comment.clone()),
        status: Set(bill.status.code()),
        entry_id: Set(bill.entry_id.map(EntryId::into_inner)),
        parent_id: Set(bill.parent_id.map(BillId::into_inner)),
        cost_accounting_id: Set(bill.cost_accounting_id.map(CostAccountingId::into_inner)),
        category_id: Set(bill.category_id.map(CategoryBillId::into_inner)),
    }
}

fn detail(m: details::Model) -> Detail {
    Detail {
        id: DetailId::from_uuid(m.id),
        bill_id: BillId::from_uuid(m.bill_id),
        article_id: m.article_id.map(ArticleId::from_uuid),
        designation: m.designation,
        price: m.price,
        unit: m.unit,
        quantity: m.quantity,
        reduce: m.reduce,
        vat_rate: m.vat_rate,
        storagearea_id: m.storagearea_id.map(StorageAreaId::from_uuid),
    }
}

pub(crate) fn automatic_reduce(m: automatic_reduces::Model) -> Result<AutomaticReduce, DbErr> {
    Ok(AutomaticReduce {
        id: AutomaticReduceId::from_uuid(m.id),
        name: m.name,
        category_id: diacamma_shared::types::CategoryId::from_uuid(m.category_id),
        mode: code(ReduceMode::from_code(m.mode), "reduce mode", m.mode)?,
        amount: m.amount,
        occurency: u32::try_from(m.occurency).map_err(|_| DbErr::Custom(format!("invalid occurency {}", m.occurency)))?,
        criteria: m.criteria.as_ref().map(from_json).transpose()?,
        is_active: m.is_active,
    })
}

pub(crate) fn automatic_reduce_active(rule: &AutomaticReduce) -> Result<automatic_reduces::ActiveModel, DbErr> {
    Ok(automatic_reduces::ActiveModel {
        id: Set(rule.id.into_inner()),
        name: Set(rule.name.clone()),
        category_id: Set(rule.category_id.into_inner()),
        mode: Set(rule.mode.code()),
        amount: Set(rule.amount),
        occurency: Set(i32::try_from(rule.occurency).unwrap_or(i32::MAX)),
        criteria: Set(rule.criteria.as_ref().map(to_json).transpose()?),
        is_active: Set(rule.is_active),
    })
}

// ========== Payoffs ==========

pub(crate) fn bank_account(m: bank_accounts::Model) -> BankAccount {
    BankAccount {
        id: BankAccountId::from_uuid(m.id),
        designation: m.designation,
        reference: m.reference,
        account_code: m.account_code,
        is_disabled: m.is_disabled,
    }
}

pub(crate) fn bank_account_active(account: &BankAccount) -> bank_accounts::ActiveModel {
    bank_accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        designation: Set(account.designation.clone()),
        reference: Set(account.reference.clone()),
        account_code: Set(account.account_code.clone()),
        is_disabled: Set(account.is_disabled),
    }
}

pub(crate) fn payoff(m: payoffs::Model) -> Result<Payoff, DbErr> {
    Ok(Payoff {
        id: PayoffId::from_uuid(m.id),
        supporting_id: BillId::from_uuid(m.supporting_id),
        date: m.date,
        amount: m.amount,
        mode: code(PayoffMode::from_code(m.mode), "payoff mode", m.mode)?,
        payer: m.payer,
        reference: m.reference,
        bank_account_id: m.bank_account_id.map(BankAccountId::from_uuid),
        bank_fee: m.bank_fee,
        entry_id: m.entry_id.map(EntryId::from_uuid),
        linked_payoff_id: m.linked_payoff_id.map(PayoffId::from_uuid),
    })
}

pub(crate) fn payoff_active(payoff: &Payoff) -> payoffs::ActiveModel {
    payoffs::ActiveModel {
        id: Set(payoff.id.into_inner()),
        supporting_id: Set(payoff.supporting_id.into_inner()),
        date: Set(payoff.date),
        amount: Set(payoff.amount),
        mode: Set(payoff.mode.code()),
        payer: Set(payoff.payer.clone()),
        reference: Set(payoff.reference.clone()),
        bank_account_id: Set(payoff.bank_account_id.map(BankAccountId::into_inner)),
        bank_fee: Set(payoff.bank_fee),
        entry_id: Set(payoff.entry_id.map(EntryId::into_inner)),
        linked_payoff_id: Set(payoff.linked_payoff_id.map(PayoffId::into_inner)),
    }
}

pub(crate) fn payment_method(m: payment_methods::Model) -> Result<PaymentMethod, DbErr> {
    Ok(PaymentMethod {
        id: PaymentMethodId::from_uuid(m.id),
        paytype: code(PaymentType::from_code(m.paytype), "payment type", m.paytype)?,
        bank_account_id: BankAccountId::from_uuid(m.bank_account_id),
        extra_data: from_json(&m.extra_data)?,
    })
}

pub(crate) fn payment_method_active(method: &PaymentMethod) -> Result<payment_methods::ActiveModel, DbErr> {
    Ok(payment_methods::ActiveModel {
        id: Set(method.id.into_inner()),
        paytype: Set(method.paytype.code()),
        bank_account_id: Set(method.bank_account_id.into_inner()),
        extra_data: Set(to_json(&method.extra_data)?),
    })
}

pub(crate) fn bank_transaction(m: bank_transactions::Model) -> Result<BankTransaction, DbErr> {
    Ok(BankTransaction {
        id: BankTransactionId::from_uuid(m.id),
        date: m.date.with_timezone(&Utc),
        status: code(BankTransactionStatus::from_code(m.status), "transaction status", m.status)?,
        payer: m.payer,
        amount: m.amount,
        contains: m.contains,
    })
}

pub(crate) fn bank_transaction_active(transaction: &BankTransaction) -> bank_transactions::ActiveModel {
    bank_transactions::ActiveModel {
        id: Set(transaction.id.into_inner()),
        date: Set(transaction.date.fixed_offset()),
        status: Set(transaction.status.code()),
        payer: Set(transaction.payer.clone()),
        amount: Set(transaction.amount),
        contains: Set(transaction.contains.clone()),
    }
}

// ========== Stock ==========

pub(crate) fn storage_area(m: storage_areas::Model) -> StorageArea {
    StorageArea {
        id: StorageAreaId::from_uuid(m.id),
        name: m.name,
        designation: m.designation,
    }
}

pub(crate) fn storage_area_active(area: &StorageArea) -> storage_areas::ActiveModel {
    storage_areas::ActiveModel {
        id: Set(area.id.into_inner()),
        name: Set(area.name.clone()),
        designation: Set(area.designation.clone()),
    }
}

fn storage_sheet(m: storage_sheets::Model) -> Result<StorageSheet, DbErr> {
    Ok(StorageSheet {
        id: StorageSheetId::from_uuid(m.id),
        sheet_type: code(SheetType::from_code(m.sheet_type), "sheet type", m.sheet_type)?,
        date: m.date,
        storagearea_id: StorageAreaId::from_uuid(m.storagearea_id),
        comment: m.comment,
        status: code(SheetStatus::from_code(m.status), "sheet status", m.status)?,
        provider_id: m.provider_id.map(ThirdId::from_uuid),
        bill_reference: m.bill_reference,
        bill_date: m.bill_date,
    })
}

fn storage_sheet_active(sheet: &StorageSheet) -> storage_sheets::ActiveModel {
    storage_sheets::ActiveModel {
        id: Set(sheet.id.into_inner()),
        sheet_type: Set(sheet.sheet_type.code()),
        date: Set(sheet.date),
        storagearea_id: Set(sheet.storagearea_id.into_inner()),
        comment: Set(sheet.comment.clone()),
        status: Set(sheet.status.code()),
        provider_id: Set(sheet.provider_id.map(ThirdId::into_inner)),
        bill_reference: Set(sheet.bill_reference.clone()),
        bill_date: Set(sheet.bill_date),
    }
}

fn storage_detail(m: storage_details::Model) -> StorageDetail {
    StorageDetail {
        id: StorageDetailId::from_uuid(m.id),
        storagesheet_id: StorageSheetId::from_uuid(m.storagesheet_id),
        article_id: ArticleId::from_uuid(m.article_id),
        price: m.price,
        quantity: m.quantity,
        value: m.value,
    }
}

fn storage_detail_active(detail: &StorageDetail) -> storage_details::ActiveModel {
    storage_details::ActiveModel {
        id: Set(detail.id.into_inner()),
        storagesheet_id: Set(detail.storagesheet_id.into_inner()),
        article_id: Set(detail.article_id.into_inner()),
        price: Set(detail.price),
        quantity: Set(detail.quantity),
        value: Set(detail.value),
    }
}

pub(crate) fn inventory_sheet(m: inventory_sheets::Model) -> Result<InventorySheet, DbErr> {
    Ok(InventorySheet {
        id: InventorySheetId::from_uuid(m.id),
        date: m.date,
        comment: m.comment,
        storagearea_id: StorageAreaId::from_uuid(m.storagearea_id),
        status: code(SheetStatus::from_code(m.status), "inventory status", m.status)?,
        stockreceipt_id: m.stockreceipt_id.map(StorageSheetId::from_uuid),
        stockexit_id: m.stockexit_id.map(StorageSheetId::from_uuid),
    })
}

pub(crate) fn inventory_sheet_active(sheet: &InventorySheet) -> inventory_sheets::ActiveModel {
    inventory_sheets::ActiveModel {
        id: Set(sheet.id.into_inner()),
        date: Set(sheet.date),
        comment: Set(sheet.comment.clone()),
        storagearea_id: Set(sheet.storagearea_id.into_inner()),
        status: Set(sheet.status.code()),
        stockreceipt_id: Set(sheet.stockreceipt_id.map(StorageSheetId::into_inner)),
        stockexit_id: Set(sheet.stockexit_id.map(StorageSheetId::into_inner)),
    }
}

pub(crate) fn inventory_detail(m: inventory_details::Model) -> InventoryDetail {
    InventoryDetail {
        id: InventoryDetailId::from_uuid(m.id),
        inventorysheet_id: InventorySheetId::from_uuid(m.inventorysheet_id),
        article_id: ArticleId::from_uuid(m.article_id),
        quantity: m.quantity,
    }
}

pub(crate) fn inventory_detail_active(detail: &InventoryDetail) -> inventory_details::ActiveModel {
    inventory_details::ActiveModel {
        id: Set(detail.id.into_inner()),
        inventorysheet_id: Set(detail.inventorysheet_id.into_inner()),
        article_id: Set(detail.article_id.into_inner()),
        quantity: Set(detail.quantity),
    }
}

// ========== Loaders ==========

fn group<K: Ord, V>(rows: impl IntoIterator<Item = (K, V)>) -> BTreeMap<K, Vec<V>> {
    let mut grouped: BTreeMap<K, Vec<V>> = BTreeMap::new();
    for (key, value) in rows {
        grouped.entry(key).or_default().push(value);
    }
    grouped
}

/// Fiscal years ordered by first day.
pub(crate) async fn load_years<C: ConnectionTrait>(conn: &C) -> Result<Vec<FiscalYear>, DbErr> {
    fiscal_years::Entity::find()
        .order_by_asc(fiscal_years::Column::BeginDate)
        .all(conn)
        .await?
        .into_iter()
        .map(fiscal_year)
        .collect()
}

/// Fiscal year containing a date.
pub(crate) async fn year_of<C: ConnectionTrait>(
    conn: &C,
    date: chrono::NaiveDate,
) -> Result<Option<FiscalYear>, DbErr> {
    fiscal_years::Entity::find()
        .filter(fiscal_years::Column::BeginDate.lte(date))
        .filter(fiscal_years::Column::EndDate.gte(date))
        .one(conn)
        .await?
        .map(fiscal_year)
        .transpose()
}

/// Thirds matching a condition, with their accounts.
pub(crate) async fn load_thirds<C: ConnectionTrait>(conn: &C, condition: Condition) -> Result<Vec<Third>, DbErr> {
    let rows = thirds::Entity::find()
        .filter(condition)
        .order_by_asc(thirds::Column::Contact)
        .all(conn)
        .await?;
    let ids: Vec<Uuid> = rows.iter().map(|t| t.id).collect();
    let mut accounts = group(
        account_thirds::Entity::find()
            .filter(account_thirds::Column::ThirdId.is_in(ids))
            .order_by_asc(account_thirds::Column::Code)
            .all(conn)
            .await?
            .into_iter()
            .map(|a| (a.third_id, a)),
    );
    rows.into_iter()
        .map(|t| {
            let own = accounts.remove(&t.id).unwrap_or_default();
            third(t, own)
        })
        .collect()
}

/// Writes a third and replaces its accounts.
pub(crate) async fn save_third<C: ConnectionTrait>(conn: &C, third: &Third) -> Result<(), DbErr> {
    upsert(
        conn,
        thirds::ActiveModel {
            id: Set(third.id.into_inner()),
            contact: Set(third.contact.clone()),
            status: Set(third.status.code()),
            custom_fields: Set(to_json(&third.custom_fields)?),
        },
    )
    .await?;
    account_thirds::Entity::delete_many()
        .filter(account_thirds::Column::ThirdId.eq(third.id.into_inner()))
        .exec(conn)
        .await?;
    if !third.accounts.is_empty() {
        account_thirds::Entity::insert_many(third.accounts.iter().map(|a| account_thirds::ActiveModel {
            id: Set(a.id.into_inner()),
            third_id: Set(third.id.into_inner()),
            code: Set(a.code.clone()),
        }))
        .exec_without_returning(conn)
        .await?;
    }
    Ok(())
}

/// Entries matching a condition, by value date, with their lines.
pub(crate) async fn load_entries<C: ConnectionTrait>(conn: &C, condition: Condition) -> Result<Vec<Entry>, DbErr> {
    let rows = entries::Entity::find()
        .filter(condition)
        .order_by_asc(entries::Column::DateValue)
        .order_by_asc(entries::Column::Id)
        .all(conn)
        .await?;
    let ids: Vec<Uuid> = rows.iter().map(|e| e.id).collect();
    let mut lines = group(
        entry_lines::Entity::find()
            .filter(entry_lines::Column::EntryId.is_in(ids))
            .order_by_asc(entry_lines::Column::Position)
            .all(conn)
            .await?
            .into_iter()
            .map(|l| (l.entry_id, entry_line(l))),
    );
    Ok(rows
        .into_iter()
        .map(|e| {
            let own = lines.remove(&e.id).unwrap_or_default();
            entry(e, own)
        })
        .collect())
}

/// Loads one entry.
pub(crate) async fn find_entry<C: ConnectionTrait>(conn: &C, id: EntryId) -> Result<Option<Entry>, DbErr> {
    Ok(load_entries(conn, Condition::all().add(entries::Column::Id.eq(id.into_inner())))
        .await?
        .pop())
}

/// Writes an entry and replaces its lines.
pub(crate) async fn save_entry<C: ConnectionTrait>(conn: &C, entry: &Entry) -> Result<(), DbErr> {
    upsert(conn, entry_active(entry)).await?;
    entry_lines::Entity::delete_many()
        .filter(entry_lines::Column::EntryId.eq(entry.id.into_inner()))
        .exec(conn)
        .await?;
    if entry.lines.is_empty() {
        return Ok(());
    }
    let mut rows = Vec::with_capacity(entry.lines.len());
    for (index, line) in entry.lines.iter().enumerate() {
        rows.push(entry_lines::ActiveModel {
            id: Set(line.id.into_inner()),
            entry_id: Set(entry.id.into_inner()),
            position: Set(position(index)?),
            account_code: Set(line.account_code.clone()),
            amount: Set(line.amount),
            third_id: Set(line.third_id.map(ThirdId::into_inner)),
            reference: Set(line.reference.clone()),
        });
    }
    entry_lines::Entity::insert_many(rows).exec_without_returning(conn).await?;
    Ok(())
}

/// Entry models with their lines.
pub(crate) async fn load_models<C: ConnectionTrait>(conn: &C, condition: Condition) -> Result<Vec<ModelEntry>, DbErr> {
    let rows = model_entries::Entity::find()
        .filter(condition)
        .order_by_asc(model_entries::Column::Designation)
        .all(conn)
        .await?;
    let ids: Vec<Uuid> = rows.iter().map(|m| m.id).collect();
    let mut lines = group(
        model_lines::Entity::find()
            .filter(model_lines::Column::ModelEntryId.is_in(ids))
            .order_by_asc(model_lines::Column::Position)
            .all(conn)
            .await?
            .into_iter()
            .map(|l| {
                (
                    l.model_entry_id,
                    ModelLine {
                        id: ModelLineId::from_uuid(l.id),
                        account_code: l.account_code,
                        amount: l.amount,
                        third_id: l.third_id.map(ThirdId::from_uuid),
                    },
                )
            }),
    );
    Ok(rows
        .into_iter()
        .map(|m| ModelEntry {
            id: ModelEntryId::from_uuid(m.id),
            journal_id: m.journal_id,
            designation: m.designation,
            costaccounting_id: m.costaccounting_id.map(CostAccountingId::from_uuid),
            lines: lines.remove(&m.id).unwrap_or_default(),
        })
        .collect())
}

/// Writes a model and replaces its lines.
pub(crate) async fn save_model<C: ConnectionTrait>(conn: &C, model: &ModelEntry) -> Result<(), DbErr> {
    upsert(
        conn,
        model_entries::ActiveModel {
            id: Set(model.id.into_inner()),
            journal_id: Set(model.journal_id),
            designation: Set(model.designation.clone()),
            costaccounting_id: Set(model.costaccounting_id.map(CostAccountingId::into_inner)),
        },
    )
    .await?;
    model_lines::Entity::delete_many()
        .filter(model_lines::Column::ModelEntryId.eq(model.id.into_inner()))
        .exec(conn)
        .await?;
    let mut rows = Vec::with_capacity(model.lines.len());
    for (index, line) in model.lines.iter().enumerate() {
        rows.push(model_lines::ActiveModel {
            id: Set(line.id.into_inner()),
            model_entry_id: Set(model.id.into_inner()),
            position: Set(position(index)?),
            account_code: Set(line.account_code.clone()),
            amount: Set(line.amount),
            third_id: Set(line.third_id.map(ThirdId::into_inner)),
        });
    }
    if !rows.is_empty() {
        model_lines::Entity::insert_many(rows).exec_without_returning(conn).await?;
    }
    Ok(())
}

/// Letters already used in a fiscal year.
pub(crate) async fn used_letters<C: ConnectionTrait>(conn: &C, year_id: FiscalYearId) -> Result<Vec<String>, DbErr> {
    Ok(account_links::Entity::find()
        .filter(account_links::Column::YearId.eq(year_id.into_inner()))
        .all(conn)
        .await?
        .into_iter()
        .map(|l| l.letter)
        .collect())
}

/// Enabled and disabled articles.
pub(crate) async fn load_articles<C: ConnectionTrait>(conn: &C) -> Result<Vec<Article>, DbErr> {
    articles::Entity::find()
        .order_by_asc(articles::Column::Reference)
        .all(conn)
        .await?
        .into_iter()
        .map(article)
        .collect()
}

/// Documents matching a condition, by date, with their details.
pub(crate) async fn load_bills<C: ConnectionTrait>(
    conn: &C,
    condition: Condition,
) -> Result<Vec<(Bill, Vec<Detail>)>, DbErr> {
    let rows = bills::Entity::find()
        .filter(condition)
        .order_by_asc(bills::Column::Date)
        .order_by_asc(bills::Column::Id)
        .all(conn)
        .await?;
    let ids: Vec<Uuid> = rows.iter().map(|b| b.id).collect();
    let mut lines = group(
        details::Entity::find()
            .filter(details::Column::BillId.is_in(ids))
            .order_by_asc(details::Column::Position)
            .all(conn)
            .await?
            .into_iter()
            .map(|d| (d.bill_id, detail(d))),
    );
    rows.into_iter()
        .map(|b| {
            let own = lines.remove(&b.id).unwrap_or_default();
            Ok((bill(b)?, own))
        })
        .collect()
}

/// Loads one document.
pub(crate) async fn find_bill<C: ConnectionTrait>(conn: &C, id: BillId) -> Result<Option<(Bill, Vec<Detail>)>, DbErr> {
    Ok(load_bills(conn, Condition::all().add(bills::Column::Id.eq(id.into_inner())))
        .await?
        .pop())
}

/// Writes a document header.
pub(crate) async fn save_bill_header<C: ConnectionTrait>(conn: &C, bill: &Bill) -> Result<(), DbErr> {
    upsert(conn, bill_active(bill)).await
}

/// Writes a document and replaces its details.
pub(crate) async fn save_bill<C: ConnectionTrait>(conn: &C, bill: &Bill, lines: &[Detail]) -> Result<(), DbErr> {
    save_bill_header(conn, bill).await?;
    details::Entity::delete_many()
        .filter(details::Column::BillId.eq(bill.id.into_inner()))
        .exec(conn)
        .await?;
    let mut rows = Vec::with_capacity(lines.len());
    for (index, d) in lines.iter().enumerate() {
        rows.push(details::ActiveModel {
            id: Set(d.id.into_inner()),
            bill_id: Set(bill.id.into_inner()),
            position: Set(position(index)?),
            article_id: Set(d.article_id.map(ArticleId::into_inner)),
            designation: Set(d.designation.clone()),
            price: Set(d.price),
            unit: Set(d.unit.clone()),
            quantity: Set(d.quantity),
            reduce: Set(d.reduce),
            vat_rate: Set(d.vat_rate),
            storagearea_id: Set(d.storagearea_id.map(StorageAreaId::into_inner)),
        });
    }
    if !rows.is_empty() {
        details::Entity::insert_many(rows).exec_without_returning(conn).await?;
    }
    Ok(())
}

/// Payoffs of the given documents.
pub(crate) async fn load_payoffs<C: ConnectionTrait>(conn: &C, supporting_ids: Vec<Uuid>) -> Result<Vec<Payoff>, DbErr> {
    payoffs::Entity::find()
        .filter(payoffs::Column::SupportingId.is_in(supporting_ids))
        .order_by_asc(payoffs::Column::Date)
        .order_by_asc(payoffs::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(payoff)
        .collect()
}

/// Stock sheets matching a condition, with their lines.
pub(crate) async fn load_sheets<C: ConnectionTrait>(
    conn: &C,
    condition: Condition,
) -> Result<Vec<(StorageSheet, Vec<StorageDetail>)>, DbErr> {
    let rows = storage_sheets::Entity::find()
        .filter(condition)
        .order_by_asc(storage_sheets::Column::Date)
        .order_by_asc(storage_sheets::Column::Id)
        .all(conn)
        .await?;
    let ids: Vec<Uuid> = rows.iter().map(|s| s.id).collect();
    let mut lines = group(
        storage_details::Entity::find()
            .filter(storage_details::Column::StoragesheetId.is_in(ids))
            .order_by_asc(storage_details::Column::Id)
            .all(conn)
            .await?
            .into_iter()
            .map(|d| (d.storagesheet_id, storage_detail(d))),
    );
    rows.into_iter()
        .map(|s| {
            let own = lines.remove(&s.id).unwrap_or_default();
            Ok((storage_sheet(s)?, own))
        })
        .collect()
}

/// Writes a stock sheet and replaces its lines.
pub(crate) async fn save_sheet<C: ConnectionTrait>(
    conn: &C,
    sheet: &StorageSheet,
    lines: &[StorageDetail],
) -> Result<(), DbErr> {
    upsert(conn, storage_sheet_active(sheet)).await?;
    storage_details::Entity::delete_many()
        .filter(storage_details::Column::StoragesheetId.eq(sheet.id.into_inner()))
        .exec(conn)
        .await?;
    if !lines.is_empty() {
        storage_details::Entity::insert_many(lines.iter().map(storage_detail_active))
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unknown_codes_are_rejected() {
        let row = fiscal_years::Model {
            id: Uuid::now_v7(),
            begin_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2015, 12, 31).unwrap(),
            status: 9,
            is_active: true,
            last_year_id: None,
            letter_index: 0,
        };
        assert!(matches!(fiscal_year(row), Err(DbErr::Custom(msg)) if msg.contains("fiscal year status")));
    }

    #[test]
    fn test_article_categories_stored_as_json() {
        let article = Article {
            id: ArticleId::new(),
            reference: "ABC1".into(),
            designation: "Article 01".into(),
            price: dec!(12.34),
            unit: "kg".into(),
            sell_account: "701".into(),
            vat_id: None,
            stockable: Stockable::Yes,
            category_ids: vec![CategoryId::new()],
            is_disabled: false,
        };
        let active = article_active(&article).unwrap();
        let sea_orm::ActiveValue::Set(json) = active.category_ids else {
            panic!("category ids not set");
        };
        let row = articles::Model {
            id: article.id.into_inner(),
            reference: article.reference.clone(),
            designation: article.designation.clone(),
            price: article.price,
            unit: article.unit.clone(),
            sell_account: article.sell_account.clone(),
            vat_id: None,
            stockable: 1,
            category_ids: json,
            is_disabled: false,
        };
        assert_eq!(super::article(row).unwrap(), article);
    }

    #[test]
    fn test_transaction_date_kept_in_utc() {
        let transaction = BankTransaction {
            id: BankTransactionId::new(),
            date: chrono::DateTime::parse_from_rfc3339("2015-04-03T17:12:00Z").unwrap().with_timezone(&Utc),
            status: BankTransactionStatus::Success,
            payer: "Jean Dupond".into(),
            amount: dec!(70.64),
            contains: String::new(),
        };
        let active = bank_transaction_active(&transaction);
        let sea_orm::ActiveValue::Set(date) = active.date else {
            panic!("date not set");
        };
        let row = bank_transactions::Model {
            id: transaction.id.into_inner(),
            date,
            status: 1,
            payer: transaction.payer.clone(),
            amount: transaction.amount,
            contains: String::new(),
        };
        assert_eq!(bank_transaction(row).unwrap(), transaction);
    }
}
