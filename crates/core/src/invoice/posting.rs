//! Bill to ledger posting.
//!
//! A validated bill, receipt or credit note produces one entry in the
//! selling journal:
//!
//! | line            | bill / receipt | credit note |
//! |-----------------|----------------|-------------|
//! | customer (411)  | debit incl.    | credit      |
//! | VAT (4455)      | credit VAT     | debit       |
//! | sell accounts   | credit gross   | debit       |
//! | reduce (709)    | debit reduce   | credit      |
//!
//! Sell lines are grouped per account. Zero lines are skipped, and the
//! entry balances by construction.

use std::collections::BTreeMap;

use diacamma_shared::types::{ArticleId, FiscalYearId, ThirdId};
use rust_decimal::Decimal;

use super::detail::BillTotals;
use super::error::InvoiceError;
use super::types::{Article, Bill, Detail, InvoiceParams};
use crate::accounting::{AccountingError, Entry, EntryLine, Journal};

/// Bill posting.
pub struct InvoicePosting;

impl InvoicePosting {
    /// Sell account of a line: its article's, or the default one for free lines.
    pub fn sell_account<'a>(
        detail: &Detail,
        articles: &'a [Article],
        params: &'a InvoiceParams,
    ) -> Result<&'a str, InvoiceError> {
        match detail.article_id {
            Some(id) => Self::find_article(articles, id).map(|a| a.sell_account.as_str()),
            None => Ok(params.default_sell_account.as_str()),
        }
    }

    fn find_article(articles: &[Article], id: ArticleId) -> Result<&Article, InvoiceError> {
        articles
            .iter()
            .find(|a| a.id == id)
            .ok_or(InvoiceError::ArticleNotFound(id))
    }

    /// Builds the selling entry of a document.
    pub fn generate_entry(
        bill: &Bill,
        details: &[Detail],
        articles: &[Article],
        third_id: ThirdId,
        third_account: &str,
        year_id: FiscalYearId,
        params: &InvoiceParams,
    ) -> Result<Entry, InvoiceError> {
        let currency = &params.currency;
        let mode = params.vat_mode;
        // credit for bills and receipts, debit for credit notes
        let way = if bill.bill_type.is_revenue() {
            Decimal::ONE
        } else {
            Decimal::NEGATIVE_ONE
        };

        let totals = BillTotals::compute(details, params);
        let mut sells: BTreeMap<&str, Decimal> = BTreeMap::new();
        for detail in details {
            let account = Self::sell_account(detail, articles, params)?;
            *sells.entry(account).or_default() += detail.sell_amount(mode, currency);
        }

        let mut entry = Entry::new(year_id, Journal::SELLING, bill.date, bill.designation());
        entry.costaccounting_id = bill.cost_accounting_id;
        let mut push = |code: &str, amount: Decimal, third: Option<ThirdId>| {
            if !amount.is_zero() {
                let mut line = EntryLine::new(code, amount);
                line.third_id = third;
                entry.lines.push(line);
            }
        };

        push(third_account, -way * totals.total_incltax, Some(third_id));
        push(&params.vat_sell_account, way * totals.total_vat, None);
        for (account, amount) in sells {
            push(account, way * amount, None);
        }
        push(&params.reduce_account, -way * totals.total_reduce, None);

        if !entry.is_balanced() {
            return Err(AccountingError::UnbalancedEntry {
                debit: entry.total_debit(),
                credit: entry.total_credit(),
            }
            .into());
        }
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::types::{BillType, Stockable, VatMode};
    use chrono::NaiveDate;
    use diacamma_shared::types::{BillId, DetailId};
    use rust_decimal_macros::dec;

    fn article(sell_account: &str) -> Article {
        Article {
            id: ArticleId::new(),
            reference: format!("ABC{sell_account}"),
            designation: "article".into(),
            price: dec!(10),
            unit: String::new(),
            sell_account: sell_account.into(),
            vat_id: None,
            stockable: Stockable::No,
            category_ids: vec![],
            is_disabled: false,
        }
    }

    fn detail(article: Option<&Article>, price: Decimal, quantity: Decimal, reduce: Decimal, vat: Decimal) -> Detail {
        Detail {
            id: DetailId::new(),
            bill_id: BillId::new(),
            article_id: article.map(|a| a.id),
            designation: "x".into(),
            price,
            unit: String::new(),
            quantity,
            reduce,
            vat_rate: vat,
            storagearea_id: None,
        }
    }

    fn fixture() -> (Vec<Article>, Vec<Detail>) {
        let articles = vec![article("701"), article("707"), article("701")];
        let details = vec![
            detail(Some(&articles[0]), dec!(22.50), dec!(3), dec!(5), dec!(0)),
            detail(Some(&articles[1]), dec!(3.25), dec!(7), dec!(0), dec!(5)),
            detail(None, dec!(11.10), dec!(2), dec!(0), dec!(0)),
            detail(Some(&articles[2]), dec!(6.33), dec!(3.25), dec!(0), dec!(20)),
        ];
        (articles, details)
    }

    fn bill(bill_type: BillType) -> Bill {
        let mut bill = Bill::new(bill_type, NaiveDate::from_ymd_opt(2015, 4, 1).unwrap(), Some(ThirdId::new()));
        bill.num_txt = Some("A-1".into());
        bill
    }

    fn amount_of(entry: &Entry, code: &str) -> Decimal {
        entry.lines.iter().filter(|l| l.account_code == code).map(|l| l.amount).sum()
    }

    #[test]
    fn test_bill_without_vat_mode() {
        let (articles, details) = fixture();
        let bill = bill(BillType::Bill);
        let params = InvoiceParams::default();
        let entry = InvoicePosting::generate_entry(
            &bill, &details, &articles, ThirdId::new(), "411", FiscalYearId::new(), &params,
        )
        .unwrap();
        assert_eq!(entry.designation, "bill A-1");
        assert_eq!(entry.journal_id, Journal::SELLING);
        assert_eq!(entry.lines.len(), 5);
        assert_eq!(amount_of(&entry, "411"), dec!(-128.02));
        assert_eq!(amount_of(&entry, "701"), dec!(88.07));
        assert_eq!(amount_of(&entry, "706"), dec!(22.20));
        assert_eq!(amount_of(&entry, "707"), dec!(22.75));
        assert_eq!(amount_of(&entry, "709"), dec!(-5.00));
        assert!(entry.is_balanced());
    }

    #[test]
    fn test_bill_prices_excluding_vat() {
        let (articles, details) = fixture();
        let params = InvoiceParams {
            vat_mode: VatMode::PriceExcludingVat,
            ..InvoiceParams::default()
        };
        let entry = InvoicePosting::generate_entry(
            &bill(BillType::Bill), &details, &articles, ThirdId::new(), "411", FiscalYearId::new(), &params,
        )
        .unwrap();
        assert_eq!(entry.lines.len(), 6);
        assert_eq!(entry.lines[0].amount, dec!(-133.27));
        assert_eq!(entry.lines[1].account_code, "4455");
        assert_eq!(entry.lines[1].amount, dec!(5.25));
        assert_eq!(amount_of(&entry, "701"), dec!(88.07));
        assert_eq!(amount_of(&entry, "709"), dec!(-5.00));
        assert!(entry.is_balanced());
    }

    #[test]
    fn test_bill_prices_including_vat() {
        let (articles, details) = fixture();
        let params = InvoiceParams {
            vat_mode: VatMode::PriceIncludingVat,
            ..InvoiceParams::default()
        };
        let entry = InvoicePosting::generate_entry(
            &bill(BillType::Bill), &details, &articles, ThirdId::new(), "411", FiscalYearId::new(), &params,
        )
        .unwrap();
        assert_eq!(entry.lines.len(), 6);
        assert_eq!(amount_of(&entry, "411"), dec!(-128.02));
        assert_eq!(amount_of(&entry, "4455"), dec!(4.51));
        assert_eq!(amount_of(&entry, "707"), dec!(21.67));
        assert_eq!(amount_of(&entry, "701"), dec!(84.64));
        assert!(entry.is_balanced());
    }

    #[test]
    fn test_asset_mirrors_signs() {
        let (articles, details) = fixture();
        let third = ThirdId::new();
        let entry = InvoicePosting::generate_entry(
            &bill(BillType::Asset), &details, &articles, third, "411", FiscalYearId::new(), &InvoiceParams::default(),
        )
        .unwrap();
        assert_eq!(entry.designation, "credit note A-1");
        assert_eq!(amount_of(&entry, "411"), dec!(128.02));
        assert_eq!(entry.lines[0].third_id, Some(third));
        assert_eq!(amount_of(&entry, "701"), dec!(-88.07));
        assert_eq!(amount_of(&entry, "709"), dec!(5.00));
        assert!(entry.is_balanced());
    }

    #[test]
    fn test_zero_lines_skipped() {
        let articles = vec![article("701")];
        let details = vec![detail(Some(&articles[0]), dec!(10), dec!(1), dec!(0), dec!(0))];
        let entry = InvoicePosting::generate_entry(
            &bill(BillType::Receipt), &details, &articles, ThirdId::new(), "411", FiscalYearId::new(), &InvoiceParams::default(),
        )
        .unwrap();
        assert_eq!(entry.lines.len(), 2);
    }

    #[test]
    fn test_unknown_article() {
        let details = vec![detail(Some(&article("701")), dec!(10), dec!(1), dec!(0), dec!(0))];
        assert!(matches!(
            InvoicePosting::generate_entry(
                &bill(BillType::Bill), &details, &[], ThirdId::new(), "411", FiscalYearId::new(), &InvoiceParams::default(),
            ),
            Err(InvoiceError::ArticleNotFound(_))
        ));
    }
}
