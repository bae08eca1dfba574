//! Property-based tests for bill posting.
//!
//! - Every generated entry is balanced, whatever the VAT mode
//! - The customer line carries the total including VAT
//! - Credit notes post the exact mirror of the equivalent bill

use chrono::NaiveDate;
use diacamma_shared::types::{ArticleId, BillId, DetailId, FiscalYearId, ThirdId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::detail::BillTotals;
use super::posting::InvoicePosting;
use super::types::{Article, Bill, BillType, Detail, InvoiceParams, Stockable, VatMode};

fn article(sell_account: &str) -> Article {
    Article {
        id: ArticleId::new(),
        reference: sell_account.to_string(),
        designation: "article".into(),
        price: Decimal::ONE,
        unit: String::new(),
        sell_account: sell_account.to_string(),
        vat_id: None,
        stockable: Stockable::No,
        category_ids: vec![],
        is_disabled: false,
    }
}

/// (article index or free line, price in cents, quantity in hundredths, reduce percent, vat rate)
fn line_strategy() -> impl Strategy<Value = (Option<usize>, i64, i64, u32, u32)> {
    (
        proptest::option::of(0usize..3),
        1i64..100_000,
        1i64..2_000,
        0u32..=100,
        prop_oneof![Just(0u32), Just(5), Just(10), Just(20)],
    )
}

fn vat_mode() -> impl Strategy<Value = VatMode> {
    prop_oneof![
        Just(VatMode::NoVat),
        Just(VatMode::PriceExcludingVat),
        Just(VatMode::PriceIncludingVat)
    ]
}

fn build(lines: &[(Option<usize>, i64, i64, u32, u32)], articles: &[Article], params: &InvoiceParams) -> Vec<Detail> {
    lines
        .iter()
        .map(|(index, price, quantity, reduce_percent, vat)| {
            let mut detail = Detail {
                id: DetailId::new(),
                bill_id: BillId::new(),
                article_id: index.map(|i| articles[i].id),
                designation: "line".into(),
                price: Decimal::new(*price, 2),
                unit: String::new(),
                quantity: Decimal::new(*quantity, 2),
                reduce: Decimal::ZERO,
                vat_rate: Decimal::from(*vat),
                storagearea_id: None,
            };
            let gross = detail.gross(&params.currency);
            detail.reduce = params.currency.round(gross * Decimal::from(*reduce_percent) / Decimal::ONE_HUNDRED);
            detail
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_entry_is_balanced(
        lines in proptest::collection::vec(line_strategy(), 1..8),
        mode in vat_mode(),
    ) {
        let articles = vec![article("701"), article("707"), article("701")];
        let params = InvoiceParams { vat_mode: mode, ..InvoiceParams::default() };
        let details = build(&lines, &articles, &params);
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let bill = Bill::new(BillType::Bill, date, None);
        let third = ThirdId::new();

        let entry = InvoicePosting::generate_entry(&bill, &details, &articles, third, "411", FiscalYearId::new(), &params).unwrap();
        prop_assert!(entry.is_balanced());
        let totals = BillTotals::compute(&details, &params);
        let third_total: Decimal = entry.lines.iter().filter(|l| l.third_id == Some(third)).map(|l| l.amount).sum();
        prop_assert_eq!(third_total, -totals.total_incltax);
        prop_assert!(entry.lines.iter().all(|l| !l.amount.is_zero()));
    }

    #[test]
    fn prop_asset_mirrors_bill(
        lines in proptest::collection::vec(line_strategy(), 1..8),
        mode in vat_mode(),
    ) {
        let articles = vec![article("701"), article("707"), article("706")];
        let params = InvoiceParams { vat_mode: mode, ..InvoiceParams::default() };
        let details = build(&lines, &articles, &params);
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let third = ThirdId::new();
        let year = FiscalYearId::new();

        let bill = InvoicePosting::generate_entry(&Bill::new(BillType::Bill, date, None), &details, &articles, third, "411", year, &params).unwrap();
        let asset = InvoicePosting::generate_entry(&Bill::new(BillType::Asset, date, None), &details, &articles, third, "411", year, &params).unwrap();
        prop_assert_eq!(bill.lines.len(), asset.lines.len());
        for (b, a) in bill.lines.iter().zip(&asset.lines) {
            prop_assert_eq!(&b.account_code, &a.account_code);
            prop_assert_eq!(b.amount, -a.amount);
        }
    }
}
