//! Property-based tests for the stock ledger.
//!
//! - Validated exits never take a quantity below zero
//! - An emptied stock is worth exactly zero
//! - Replaying the valid sheets rebuilds the same stock

use chrono::NaiveDate;
use diacamma_shared::types::{ArticleId, CurrencyFormat, StorageAreaId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::ledger::StockLedger;
use super::sheet::StorageService;
use super::types::{SheetType, StorageDetail, StorageSheet};
use crate::invoice::{Article, Stockable};

fn article() -> Article {
    Article {
        id: ArticleId::new(),
        reference: "ABC1".into(),
        designation: "article".into(),
        price: Decimal::ONE,
        unit: String::new(),
        sell_account: "701".into(),
        vat_id: None,
        stockable: Stockable::Yes,
        category_ids: vec![],
        is_disabled: false,
    }
}

/// (is exit, quantity in hundredths, price in cents)
fn movement() -> impl Strategy<Value = (bool, i64, i64)> {
    (any::<bool>(), 1i64..5_000, 1i64..10_000)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_stock_never_negative(moves in proptest::collection::vec(movement(), 1..20)) {
        let currency = CurrencyFormat::default();
        let area = StorageAreaId::new();
        let articles = vec![article()];
        let mut ledger = StockLedger::default();
        let mut applied = Vec::new();
        for (day, (is_exit, quantity, price)) in moves.into_iter().enumerate() {
            let sheet_type = if is_exit { SheetType::Exit } else { SheetType::Receipt };
            let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(u64::try_from(day).unwrap());
            let mut sheet = StorageSheet::new(sheet_type, date, area, "");
            let mut details = vec![StorageDetail::new(sheet.id, articles[0].id, Decimal::new(price, 2), Decimal::new(quantity, 2))];
            if StorageService::validate(&mut sheet, &mut details, &articles, &mut ledger, &currency).is_ok() {
                applied.push((sheet, details));
            }
            let stock = ledger.stock(area, articles[0].id);
            prop_assert!(stock.quantity >= Decimal::ZERO);
            prop_assert!(stock.amount >= Decimal::ZERO);
            if stock.quantity.is_zero() {
                prop_assert_eq!(stock.amount, Decimal::ZERO);
            }
        }
        let replayed = StockLedger::from_sheets(&applied, &currency);
        prop_assert_eq!(replayed.stock(area, articles[0].id), ledger.stock(area, articles[0].id));
    }
}
