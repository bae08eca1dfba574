//! Document lifecycle: checks, numbering, validation, cancel, archive and
//! transformation of quotations, orders and carts.
//!
//! ```text
//! Building ──validate──▶ Valid ──archive──▶ Archived
//!    │                     │
//!    └─cancel (quotation,  └─cancel (bill, receipt): new building credit note
//!       order)──▶ Cancelled
//!
//! cart ──quote──▶ quotation ──order──▶ order ──transform──▶ bill
//!                 quotation ──transform──▶ bill
//! ```

use chrono::NaiveDate;
use diacamma_shared::types::{BillId, CategoryBillId, DetailId, FiscalYearId};
use rust_decimal::Decimal;

use super::detail::BillTotals;
use super::error::InvoiceError;
use super::posting::InvoicePosting;
use super::types::{Article, Bill, BillStatus, BillType, CategoryBill, Detail, InvoiceParams};
use crate::accounting::{AccountingSystem, Entry, FiscalService, FiscalYear, Third};

/// Everything a document is checked and posted against.
pub struct BillContext<'a> {
    /// Chart rules.
    pub system: &'a dyn AccountingSystem,
    /// Invoicing parameters.
    pub params: &'a InvoiceParams,
    /// Fiscal year of the document date.
    pub year: Option<&'a FiscalYear>,
    /// Customer.
    pub third: Option<&'a Third>,
    /// Articles referenced by the details.
    pub articles: &'a [Article],
}

/// Result of a validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    /// Number given to the document.
    pub num: i32,
    /// Displayed number.
    pub num_txt: String,
    /// Ledger entry, for posting document types.
    pub entry: Option<Entry>,
}

/// Document rules.
pub struct BillService;

impl BillService {
    /// Reasons preventing validation; empty when the document can be validated.
    #[must_use]
    pub fn check_info(bill: &Bill, details: &[Detail], ctx: &BillContext<'_>) -> Vec<String> {
        let mut messages = Vec::new();
        match ctx.third {
            None => messages.push("no third selected".to_string()),
            Some(third) => {
                if bill.bill_type.posts_entry() && third.customer_account(ctx.system).is_none() {
                    messages.push("third has no customer account".to_string());
                }
            }
        }
        if details.is_empty() {
            messages.push("no detail".to_string());
        }
        match ctx.year {
            Some(year) if year.contains(bill.date) && !year.is_finished() => {}
            _ => messages.push("date not in an open fiscal year".to_string()),
        }
        for detail in details {
            if let Err(err) = detail.validate(&ctx.params.currency) {
                messages.push(format!("{}: {err}", detail.designation));
            }
            let disabled = detail
                .article_id
                .and_then(|id| ctx.articles.iter().find(|a| a.id == id))
                .filter(|a| a.is_disabled);
            if let Some(article) = disabled {
                messages.push(format!("article {} is disabled", article.reference));
            }
        }
        if BillTotals::compute(details, ctx.params).total_incltax < Decimal::ZERO {
            messages.push("total must be positive".to_string());
        }
        messages
    }

    /// Next number for a document type in a year. Categories with special
    /// numbering keep their own sequence; all other documents share one.
    #[must_use]
    pub fn next_num(
        bill_type: BillType,
        year_id: FiscalYearId,
        category: Option<&CategoryBill>,
        categories: &[CategoryBill],
        existing: &[Bill],
    ) -> i32 {
        let special: Vec<CategoryBillId> = categories
            .iter()
            .filter(|c| c.special_numbering)
            .map(|c| c.id)
            .collect();
        let same_sequence = |other: &Bill| match category.filter(|c| c.special_numbering) {
            Some(c) => other.category_id == Some(c.id),
            None => other.category_id.is_none_or(|id| !special.contains(&id)),
        };
        existing
            .iter()
            .filter(|b| b.bill_type == bill_type && b.fiscal_year_id == Some(year_id))
            .filter(|b| same_sequence(b))
            .filter_map(|b| b.num)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// `prefix + year letter + "-" + num`, e.g. `A-1`.
    #[must_use]
    pub fn num_txt(category: Option<&CategoryBill>, year: &FiscalYear, num: i32) -> String {
        let prefix = category.map_or("", |c| c.prefix_numbering.as_str());
        format!("{prefix}{}-{num}", FiscalService::year_letter(year))
    }

    fn transition(bill: &Bill, action: &'static str) -> InvoiceError {
        InvoiceError::InvalidTransition {
            action,
            bill_type: bill.bill_type,
            status: bill.status,
        }
    }

    /// Building → Valid. Numbers the document and builds its ledger entry
    /// for bills, receipts and credit notes.
    pub fn validate(
        bill: &mut Bill,
        details: &[Detail],
        ctx: &BillContext<'_>,
        num: i32,
        category: Option<&CategoryBill>,
    ) -> Result<Validated, InvoiceError> {
        if !bill.is_building() {
            return Err(Self::transition(bill, "validate"));
        }
        let messages = Self::check_info(bill, details, ctx);
        if !messages.is_empty() {
            return Err(InvoiceError::CheckFailed(messages));
        }
        let (Some(year), Some(third)) = (ctx.year, ctx.third) else {
            return Err(InvoiceError::CheckFailed(vec!["no third selected".to_string()]));
        };
        FiscalService::check_date(year, bill.date)?;

        let num_txt = Self::num_txt(category, year, num);
        bill.num = Some(num);
        bill.num_txt = Some(num_txt.clone());
        bill.fiscal_year_id = Some(year.id);

        let entry = if bill.bill_type.posts_entry() {
            let account = third
                .customer_account(ctx.system)
                .ok_or(InvoiceError::NoCustomerAccount)?;
            let entry = InvoicePosting::generate_entry(
                bill,
                details,
                ctx.articles,
                third.id,
                account,
                year.id,
                ctx.params,
            )?;
            bill.entry_id = Some(entry.id);
            Some(entry)
        } else {
            None
        };
        bill.status = BillStatus::Valid;
        Ok(Validated { num, num_txt, entry })
    }

    /// Copies details onto another document.
    #[must_use]
    pub fn clone_details(details: &[Detail], bill_id: BillId) -> Vec<Detail> {
        details
            .iter()
            .map(|d| Detail {
                id: DetailId::new(),
                bill_id,
                ..d.clone()
            })
            .collect()
    }

    fn derive(source: &Bill, bill_type: BillType, date: NaiveDate) -> Bill {
        let mut bill = Bill::new(bill_type, date, source.third_id);
        bill.parent_id = Some(source.id);
        bill.cost_accounting_id = source.cost_accounting_id;
        bill.category_id = source.category_id;
        bill.comment.clone_from(&source.comment);
        bill
    }

    /// Cancels a document. Building quotations and orders become Cancelled;
    /// valid bills and receipts get a building credit note undoing them.
    pub fn cancel(
        bill: &mut Bill,
        details: &[Detail],
        today: NaiveDate,
    ) -> Result<Option<(Bill, Vec<Detail>)>, InvoiceError> {
        match (bill.bill_type, bill.status) {
            (BillType::Quotation | BillType::Order, BillStatus::Building) => {
                bill.status = BillStatus::Cancelled;
                Ok(None)
            }
            (BillType::Bill | BillType::Receipt, BillStatus::Valid) => {
                let asset = Self::derive(bill, BillType::Asset, today);
                let asset_details = Self::clone_details(details, asset.id);
                Ok(Some((asset, asset_details)))
            }
            _ => Err(Self::transition(bill, "cancel")),
        }
    }

    /// Valid → Archived.
    pub fn archive(bill: &mut Bill) -> Result<(), InvoiceError> {
        if bill.status != BillStatus::Valid {
            return Err(Self::transition(bill, "archive"));
        }
        bill.status = BillStatus::Archived;
        Ok(())
    }

    /// Turns a valid quotation or order into a building bill with the same
    /// details; the source is archived.
    pub fn transform_to_bill(
        source: &mut Bill,
        details: &[Detail],
        today: NaiveDate,
    ) -> Result<(Bill, Vec<Detail>), InvoiceError> {
        if !matches!(source.bill_type, BillType::Quotation | BillType::Order)
            || source.status != BillStatus::Valid
        {
            return Err(Self::transition(source, "transform"));
        }
        let bill = Self::derive(source, BillType::Bill, today);
        let bill_details = Self::clone_details(details, bill.id);
        source.status = BillStatus::Archived;
        Ok((bill, bill_details))
    }

    /// Turns a valid quotation into a building order with the same details;
    /// the quotation is archived.
    pub fn to_order(
        source: &mut Bill,
        details: &[Detail],
        today: NaiveDate,
    ) -> Result<(Bill, Vec<Detail>), InvoiceError> {
        if source.bill_type != BillType::Quotation || source.status != BillStatus::Valid {
            return Err(Self::transition(source, "order"));
        }
        let order = Self::derive(source, BillType::Order, today);
        let order_details = Self::clone_details(details, order.id);
        source.status = BillStatus::Archived;
        Ok((order, order_details))
    }

    /// Turns a valid cart into a building quotation; the cart is archived.
    pub fn cart_to_quotation(
        source: &mut Bill,
        details: &[Detail],
        today: NaiveDate,
    ) -> Result<(Bill, Vec<Detail>), InvoiceError> {
        if source.bill_type != BillType::Cart || source.status != BillStatus::Valid {
            return Err(Self::transition(source, "quote"));
        }
        let quotation = Self::derive(source, BillType::Quotation, today);
        let quotation_details = Self::clone_details(details, quotation.id);
        source.status = BillStatus::Archived;
        Ok((quotation, quotation_details))
    }

    /// New building quotation copying a numbered one, which stays as it is.
    pub fn clone_quotation(
        source: &Bill,
        details: &[Detail],
        today: NaiveDate,
    ) -> Result<(Bill, Vec<Detail>), InvoiceError> {
        if source.bill_type != BillType::Quotation || source.is_building() {
            return Err(Self::transition(source, "clone"));
        }
        let mut quotation = Self::derive(source, BillType::Quotation, today);
        quotation.parent_id = None;
        let quotation_details = Self::clone_details(details, quotation.id);
        Ok((quotation, quotation_details))
    }

    /// Only building documents can change or be deleted.
    pub fn validate_edit(bill: &Bill) -> Result<(), InvoiceError> {
        if bill.is_building() {
            Ok(())
        } else {
            Err(InvoiceError::NotBuilding(bill.id))
        }
    }

    /// Only building documents can be deleted.
    pub fn validate_delete(bill: &Bill) -> Result<(), InvoiceError> {
        Self::validate_edit(bill)
    }

    /// Valid bills, receipts and credit notes accept payoffs, as do valid
    /// orders for down payments.
    #[must_use]
    pub fn is_payable(bill: &Bill) -> bool {
        (bill.bill_type.posts_entry() || bill.bill_type == BillType::Order) && bill.status == BillStatus::Valid
    }

    /// Amount the customer has to pay.
    #[must_use]
    pub fn total_to_pay(details: &[Detail], params: &InvoiceParams) -> Decimal {
        BillTotals::compute(details, params).total_incltax
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::{FiscalYearStatus, FrenchSystem, Journal};
    use diacamma_shared::types::{ArticleId, ThirdId};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2015, m, d).unwrap()
    }

    fn year() -> FiscalYear {
        FiscalYear {
            id: FiscalYearId::new(),
            begin: date(1, 1),
            end: date(12, 31),
            status: FiscalYearStatus::Running,
            is_active: true,
            last_year_id: None,
            letter_index: 0,
        }
    }

    fn customer() -> Third {
        let mut third = Third::new("Minimum");
        third.add_account(&FrenchSystem, "411").unwrap();
        third
    }

    fn line(bill: &Bill, price: Decimal, quantity: Decimal) -> Detail {
        Detail {
            id: DetailId::new(),
            bill_id: bill.id,
            article_id: None,
            designation: "service".into(),
            price,
            unit: String::new(),
            quantity,
            reduce: Decimal::ZERO,
            vat_rate: Decimal::ZERO,
            storagearea_id: None,
        }
    }

    struct Fixture {
        year: FiscalYear,
        third: Third,
        params: InvoiceParams,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                year: year(),
                third: customer(),
                params: InvoiceParams::default(),
            }
        }

        fn ctx<'a>(&'a self, articles: &'a [Article]) -> BillContext<'a> {
            BillContext {
                system: &FrenchSystem,
                params: &self.params,
                year: Some(&self.year),
                third: Some(&self.third),
                articles,
            }
        }
    }

    #[test]
    fn test_check_info_messages() {
        let fixture = Fixture::new();
        let bill = Bill::new(BillType::Bill, date(4, 1), None);
        let ctx = BillContext {
            third: None,
            ..fixture.ctx(&[])
        };
        let messages = BillService::check_info(&bill, &[], &ctx);
        assert_eq!(messages, vec!["no third selected", "no detail"]);

        let outside = Bill::new(BillType::Bill, NaiveDate::from_ymd_opt(2016, 2, 1).unwrap(), None);
        let details = vec![line(&outside, dec!(10), dec!(1))];
        let messages = BillService::check_info(&outside, &details, &fixture.ctx(&[]));
        assert_eq!(messages, vec!["date not in an open fiscal year"]);
    }

    #[test]
    fn test_check_info_customer_account_and_disabled_article() {
        let fixture = Fixture::new();
        let article = Article {
            id: ArticleId::new(),
            reference: "ABC1".into(),
            designation: "Article 01".into(),
            price: dec!(12.34),
            unit: String::new(),
            sell_account: "701".into(),
            vat_id: None,
            stockable: crate::invoice::types::Stockable::No,
            category_ids: vec![],
            is_disabled: true,
        };
        let bill = Bill::new(BillType::Bill, date(4, 1), Some(fixture.third.id));
        let details = vec![Detail::from_article(bill.id, &article, dec!(0), dec!(1))];
        let provider = Third::new("Provider");
        let ctx = BillContext {
            third: Some(&provider),
            ..fixture.ctx(std::slice::from_ref(&article))
        };
        let messages = BillService::check_info(&bill, &details, &ctx);
        assert_eq!(messages, vec!["third has no customer account", "article ABC1 is disabled"]);

        let quotation = Bill::new(BillType::Quotation, date(4, 1), Some(provider.id));
        let mut enabled = article.clone();
        enabled.is_disabled = false;
        let ctx = BillContext {
            third: Some(&provider),
            ..fixture.ctx(std::slice::from_ref(&enabled))
        };
        assert!(BillService::check_info(&quotation, &details, &ctx).is_empty());
    }

    #[test]
    fn test_numbering_sequences() {
        let year = year();
        let special = CategoryBill {
            id: CategoryBillId::new(),
            name: "shop".into(),
            prefix_numbering: "S".into(),
            special_numbering: true,
            is_default: false,
        };
        let mut existing = Vec::new();
        for (num, category) in [(1, None), (2, None), (1, Some(special.id)), (4, Some(special.id))] {
            let mut bill = Bill::new(BillType::Bill, date(3, 1), None);
            bill.fiscal_year_id = Some(year.id);
            bill.num = Some(num);
            bill.category_id = category;
            existing.push(bill);
        }
        let categories = vec![special.clone()];
        assert_eq!(BillService::next_num(BillType::Bill, year.id, None, &categories, &existing), 3);
        assert_eq!(
            BillService::next_num(BillType::Bill, year.id, Some(&special), &categories, &existing),
            5
        );
        assert_eq!(BillService::next_num(BillType::Asset, year.id, None, &categories, &existing), 1);
        assert_eq!(BillService::num_txt(None, &year, 3), "A-3");
        assert_eq!(BillService::num_txt(Some(&special), &year, 5), "SA-5");
    }

    #[test]
    fn test_validate_bill_posts_entry() {
        let fixture = Fixture::new();
        let mut bill = Bill::new(BillType::Bill, date(4, 1), Some(fixture.third.id));
        let details = vec![line(&bill, dec!(50), dec!(2))];
        let validated = BillService::validate(&mut bill, &details, &fixture.ctx(&[]), 1, None).unwrap();
        assert_eq!(validated.num_txt, "A-1");
        assert_eq!(bill.status, BillStatus::Valid);
        assert_eq!(bill.fiscal_year_id, Some(fixture.year.id));
        let entry = validated.entry.unwrap();
        assert_eq!(bill.entry_id, Some(entry.id));
        assert_eq!(entry.designation, "bill A-1");
        assert_eq!(entry.journal_id, Journal::SELLING);
        assert_eq!(entry.lines[0].amount, dec!(-100));

        assert!(matches!(
            BillService::validate(&mut bill, &details, &fixture.ctx(&[]), 2, None),
            Err(InvoiceError::InvalidTransition { action: "validate", .. })
        ));
    }

    #[test]
    fn test_validate_quotation_numbers_only() {
        let fixture = Fixture::new();
        let mut bill = Bill::new(BillType::Quotation, date(4, 1), Some(fixture.third.id));
        let details = vec![line(&bill, dec!(50), dec!(2))];
        let validated = BillService::validate(&mut bill, &details, &fixture.ctx(&[]), 1, None).unwrap();
        assert!(validated.entry.is_none());
        assert_eq!(bill.designation(), "quotation A-1");
        assert_eq!(bill.entry_id, None);
    }

    #[test]
    fn test_validate_refused_with_messages() {
        let fixture = Fixture::new();
        let mut bill = Bill::new(BillType::Bill, date(4, 1), Some(fixture.third.id));
        let err = BillService::validate(&mut bill, &[], &fixture.ctx(&[]), 1, None).unwrap_err();
        assert_eq!(err, InvoiceError::CheckFailed(vec!["no detail".into()]));
        assert!(bill.is_building());
    }

    #[test]
    fn test_cancel_valid_bill_creates_asset() {
        let fixture = Fixture::new();
        let mut bill = Bill::new(BillType::Bill, date(4, 1), Some(fixture.third.id));
        let details = vec![line(&bill, dec!(50), dec!(2))];
        BillService::validate(&mut bill, &details, &fixture.ctx(&[]), 1, None).unwrap();

        let (asset, asset_details) = BillService::cancel(&mut bill, &details, date(4, 2)).unwrap().unwrap();
        assert_eq!(asset.bill_type, BillType::Asset);
        assert_eq!(asset.status, BillStatus::Building);
        assert_eq!(asset.parent_id, Some(bill.id));
        assert_eq!(asset.third_id, bill.third_id);
        assert_eq!(asset_details.len(), 1);
        assert_eq!(asset_details[0].bill_id, asset.id);
        assert_ne!(asset_details[0].id, details[0].id);
        assert_eq!(bill.status, BillStatus::Valid);
    }

    #[test]
    fn test_cancel_rules() {
        let mut quotation = Bill::new(BillType::Quotation, date(4, 1), None);
        assert_eq!(BillService::cancel(&mut quotation, &[], date(4, 1)).unwrap(), None);
        assert_eq!(quotation.status, BillStatus::Cancelled);

        let mut building = Bill::new(BillType::Bill, date(4, 1), None);
        assert!(BillService::cancel(&mut building, &[], date(4, 1)).is_err());
        let mut asset = Bill::new(BillType::Asset, date(4, 1), None);
        asset.status = BillStatus::Valid;
        assert!(BillService::cancel(&mut asset, &[], date(4, 1)).is_err());
    }

    #[test]
    fn test_transform_and_archive() {
        let mut quotation = Bill::new(BillType::Quotation, date(4, 1), None);
        let details = vec![line(&quotation, dec!(10), dec!(3))];
        assert!(BillService::transform_to_bill(&mut quotation, &details, date(4, 5)).is_err());

        quotation.status = BillStatus::Valid;
        let (bill, bill_details) = BillService::transform_to_bill(&mut quotation, &details, date(4, 5)).unwrap();
        assert_eq!(bill.bill_type, BillType::Bill);
        assert_eq!(bill.date, date(4, 5));
        assert_eq!(bill.parent_id, Some(quotation.id));
        assert_eq!(bill_details[0].bill_id, bill.id);
        assert_eq!(quotation.status, BillStatus::Archived);
        assert!(BillService::archive(&mut quotation).is_err());

        let mut valid = Bill::new(BillType::Bill, date(4, 1), None);
        valid.status = BillStatus::Valid;
        BillService::archive(&mut valid).unwrap();
        assert_eq!(valid.status, BillStatus::Archived);
        assert_eq!(BillService::validate_delete(&valid), Err(InvoiceError::NotBuilding(valid.id)));
    }

    #[test]
    fn test_quotation_to_order() {
        let mut quotation = Bill::new(BillType::Quotation, date(4, 1), Some(ThirdId::new()));
        let details = vec![line(&quotation, dec!(22.5), dec!(3))];
        assert!(matches!(
            BillService::to_order(&mut quotation, &details, date(4, 7)),
            Err(InvoiceError::InvalidTransition { action: "order", .. })
        ));

        quotation.status = BillStatus::Valid;
        let (order, order_details) = BillService::to_order(&mut quotation, &details, date(4, 7)).unwrap();
        assert_eq!(order.bill_type, BillType::Order);
        assert_eq!(order.status, BillStatus::Building);
        assert_eq!(order.date, date(4, 7));
        assert_eq!(order.third_id, quotation.third_id);
        assert_eq!(order.parent_id, Some(quotation.id));
        assert_eq!(order_details[0].bill_id, order.id);
        assert_eq!(order_details[0].price, dec!(22.5));
        assert_eq!(quotation.status, BillStatus::Archived);
        assert!(BillService::to_order(&mut quotation, &details, date(4, 7)).is_err());
    }

    #[test]
    fn test_cart_to_quotation() {
        let mut cart = Bill::new(BillType::Cart, date(4, 1), None);
        let details = vec![line(&cart, dec!(22.5), dec!(3))];
        assert!(BillService::cart_to_quotation(&mut cart, &details, date(4, 2)).is_err());

        cart.status = BillStatus::Valid;
        let (quotation, quotation_details) = BillService::cart_to_quotation(&mut cart, &details, date(4, 2)).unwrap();
        assert_eq!(quotation.bill_type, BillType::Quotation);
        assert!(quotation.is_building());
        assert_eq!(quotation.num, None);
        assert_eq!(quotation_details.len(), 1);
        assert_eq!(cart.status, BillStatus::Archived);

        let mut valid_quotation = quotation.clone();
        valid_quotation.status = BillStatus::Valid;
        assert!(BillService::cart_to_quotation(&mut valid_quotation, &details, date(4, 2)).is_err());
    }

    #[rstest]
    #[case(BillType::Quotation, BillStatus::Valid, true)]
    #[case(BillType::Quotation, BillStatus::Archived, true)]
    #[case(BillType::Quotation, BillStatus::Cancelled, true)]
    #[case(BillType::Quotation, BillStatus::Building, false)]
    #[case(BillType::Bill, BillStatus::Valid, false)]
    fn test_clone_quotation(#[case] bill_type: BillType, #[case] status: BillStatus, #[case] allowed: bool) {
        let mut source = Bill::new(bill_type, date(4, 1), Some(ThirdId::new()));
        source.status = status;
        source.num = Some(2);
        let details = vec![line(&source, dec!(11.1), dec!(2))];
        let result = BillService::clone_quotation(&source, &details, date(5, 1));
        assert_eq!(result.is_ok(), allowed);
        if let Ok((copy, copy_details)) = result {
            assert_eq!(copy.bill_type, BillType::Quotation);
            assert!(copy.is_building());
            assert_eq!(copy.num, None);
            assert_eq!(copy.parent_id, None);
            assert_eq!(copy.third_id, source.third_id);
            assert_eq!(copy.date, date(5, 1));
            assert_eq!(copy_details[0].bill_id, copy.id);
            assert_eq!(BillTotals::compute(&copy_details, &InvoiceParams::default()).total_incltax, dec!(22.2));
        }
        assert_eq!(source.status, status);
    }

    #[test]
    fn test_payable_and_total() {
        let params = InvoiceParams::default();
        let mut bill = Bill::new(BillType::Receipt, date(4, 1), None);
        assert!(!BillService::is_payable(&bill));
        bill.status = BillStatus::Valid;
        assert!(BillService::is_payable(&bill));
        let mut order = Bill::new(BillType::Order, date(4, 1), None);
        assert!(!BillService::is_payable(&order));
        order.status = BillStatus::Valid;
        assert!(BillService::is_payable(&order));
        let mut quotation = Bill::new(BillType::Quotation, date(4, 1), None);
        quotation.status = BillStatus::Valid;
        assert!(!BillService::is_payable(&quotation));
        let details = vec![line(&bill, dec!(12.5), dec!(2)), line(&bill, dec!(1), dec!(3))];
        assert_eq!(BillService::total_to_pay(&details, &params), dec!(28));
    }
}
