//! Stock per area and article, valued at mean price.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use diacamma_shared::types::{ArticleId, CurrencyFormat, StorageAreaId};
use rust_decimal::Decimal;

use super::types::{ArticleMoving, ArticleStock, SheetStatus, SheetType, Stock, StorageDetail, StorageSheet};

/// Running stock built by replaying valid sheets.
///
/// Exits are valued at the mean price of the stock they leave; taking the
/// last unit takes the remaining value so an empty stock is worth zero.
/// A validated exit keeps that value on replay.
#[derive(Debug, Clone, Default)]
pub struct StockLedger {
    stocks: BTreeMap<(StorageAreaId, ArticleId), Stock>,
    movings: Vec<ArticleMoving>,
}

impl StockLedger {
    /// Replays valid sheets ordered by date, receipts before exits of the
    /// same day, then creation.
    #[must_use]
    pub fn from_sheets(sheets: &[(StorageSheet, Vec<StorageDetail>)], currency: &CurrencyFormat) -> Self {
        let mut ordered: Vec<&(StorageSheet, Vec<StorageDetail>)> = sheets
            .iter()
            .filter(|(sheet, _)| sheet.status == SheetStatus::Valid)
            .collect();
        ordered.sort_by_key(|(sheet, _)| (sheet.date, sheet.sheet_type == SheetType::Exit, sheet.id));
        let mut ledger = Self::default();
        for (sheet, details) in ordered {
            ledger.apply(sheet, details, currency);
        }
        ledger
    }

    /// Stock of an article in an area.
    #[must_use]
    pub fn stock(&self, area: StorageAreaId, article: ArticleId) -> Stock {
        self.stocks
            .get(&(area, article))
            .copied()
            .unwrap_or_else(|| Stock::empty(area, article))
    }

    /// Quantity of an article in an area.
    #[must_use]
    pub fn quantity(&self, area: StorageAreaId, article: ArticleId) -> Decimal {
        self.stock(area, article).quantity
    }

    /// Mean price of an article in an area.
    #[must_use]
    pub fn mean_price(&self, area: StorageAreaId, article: ArticleId, currency: &CurrencyFormat) -> Option<Decimal> {
        self.stock(area, article).mean_price(currency)
    }

    /// Date of the latest movement of an article in an area.
    #[must_use]
    pub fn last_moving(&self, area: StorageAreaId, article: ArticleId) -> Option<NaiveDate> {
        self.movings
            .iter()
            .filter(|m| m.storagearea_id == area && m.article_id == article)
            .map(|m| m.date)
            .max()
    }

    fn value_of(stock: &Stock, quantity: Decimal, currency: &CurrencyFormat) -> Decimal {
        if stock.quantity <= Decimal::ZERO {
            Decimal::ZERO
        } else if quantity >= stock.quantity {
            stock.amount
        } else {
            currency.round(quantity * stock.amount / stock.quantity)
        }
    }

    /// Value of an exit before applying it.
    #[must_use]
    pub fn exit_value(&self, area: StorageAreaId, article: ArticleId, quantity: Decimal, currency: &CurrencyFormat) -> Decimal {
        Self::value_of(&self.stock(area, article), quantity, currency)
    }

    /// Fixes the value and mean unit price of exit lines. Lines of the same
    /// article take from what the previous ones left.
    pub fn value_exits(&self, area: StorageAreaId, details: &mut [StorageDetail], currency: &CurrencyFormat) {
        let mut taken: BTreeMap<ArticleId, (Decimal, Decimal)> = BTreeMap::new();
        for detail in details.iter_mut() {
            let stock = self.stock(area, detail.article_id);
            let (quantity, amount) = taken.entry(detail.article_id).or_default();
            let left = Stock {
                quantity: stock.quantity - *quantity,
                amount: stock.amount - *amount,
                ..stock
            };
            let value = Self::value_of(&left, detail.quantity, currency);
            *quantity += detail.quantity;
            *amount += value;
            detail.value = Some(value);
            if detail.quantity > Decimal::ZERO {
                detail.price = currency.round(value / detail.quantity);
            }
        }
    }

    /// Applies a sheet, returning the movements it produced.
    pub fn apply(&mut self, sheet: &StorageSheet, details: &[StorageDetail], currency: &CurrencyFormat) -> Vec<ArticleMoving> {
        let mut produced = Vec::with_capacity(details.len());
        for detail in details {
            let area = sheet.storagearea_id;
            let (quantity, amount) = match sheet.sheet_type {
                SheetType::Receipt => (detail.quantity, currency.round(detail.quantity * detail.price)),
                SheetType::Exit => {
                    let value = detail
                        .value
                        .unwrap_or_else(|| self.exit_value(area, detail.article_id, detail.quantity, currency));
                    (-detail.quantity, -value)
                }
            };
            let stock = self
                .stocks
                .entry((area, detail.article_id))
                .or_insert_with(|| Stock::empty(area, detail.article_id));
            stock.quantity += quantity;
            stock.amount += amount;
            produced.push(ArticleMoving {
                storagesheet_id: sheet.id,
                storagearea_id: area,
                article_id: detail.article_id,
                date: sheet.date,
                comment: sheet.comment.clone(),
                quantity,
                amount,
            });
        }
        self.movings.extend(produced.iter().cloned());
        produced
    }

    /// Stock of an article over all areas with its movements, newest first.
    #[must_use]
    pub fn article_stock(&self, article: ArticleId, currency: &CurrencyFormat) -> ArticleStock {
        let areas: Vec<Stock> = self
            .stocks
            .values()
            .filter(|s| s.article_id == article)
            .copied()
            .collect();
        let quantity: Decimal = areas.iter().map(|s| s.quantity).sum();
        let amount: Decimal = areas.iter().map(|s| s.amount).sum();
        let mut movings: Vec<ArticleMoving> = self
            .movings
            .iter()
            .filter(|m| m.article_id == article)
            .cloned()
            .collect();
        movings.reverse();
        movings.sort_by(|a, b| b.date.cmp(&a.date));
        ArticleStock {
            article_id: article,
            areas,
            quantity,
            amount,
            mean_price: (quantity > Decimal::ZERO).then(|| currency.round(amount / quantity)),
            movings,
        }
    }

    /// Every stock line.
    pub fn stocks(&self) -> impl Iterator<Item = &Stock> {
        self.stocks.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sheet(sheet_type: SheetType, day: u32, area: StorageAreaId, comment: &str) -> StorageSheet {
        let mut sheet = StorageSheet::new(sheet_type, NaiveDate::from_ymd_opt(2014, 4, day).unwrap(), area, comment);
        sheet.status = SheetStatus::Valid;
        sheet
    }

    #[test]
    fn test_receipts_then_exit_at_mean_price() {
        let currency = CurrencyFormat::default();
        let (area1, area2) = (StorageAreaId::new(), StorageAreaId::new());
        let (article1, article4) = (ArticleId::new(), ArticleId::new());
        let mut ledger = StockLedger::default();

        let first = sheet(SheetType::Receipt, 1, area1, "first");
        ledger.apply(&first, &[StorageDetail::new(first.id, article1, dec!(5), dec!(10))], &currency);
        let second = sheet(SheetType::Receipt, 2, area1, "second");
        ledger.apply(
            &second,
            &[StorageDetail::new(second.id, article4, dec!(4), dec!(5))],
            &currency,
        );
        let third = sheet(SheetType::Receipt, 2, area2, "third");
        ledger.apply(&third, &[StorageDetail::new(third.id, article4, dec!(4), dec!(5))], &currency);

        let exit = sheet(SheetType::Exit, 3, area1, "exit");
        let moved = ledger.apply(
            &exit,
            &[
                StorageDetail::new(exit.id, article1, Decimal::ZERO, dec!(7)),
                StorageDetail::new(exit.id, article4, Decimal::ZERO, dec!(5)),
            ],
            &currency,
        );
        assert_eq!(moved[0].amount, dec!(-35));
        assert_eq!(moved[1].amount, dec!(-20));

        let stock = ledger.stock(area1, article1);
        assert_eq!(stock.quantity, dec!(3));
        assert_eq!(stock.amount, dec!(15));
        assert_eq!(stock.mean_price(&currency), Some(dec!(5)));
        assert_eq!(ledger.quantity(area1, article4), Decimal::ZERO);
        assert_eq!(ledger.stock(area1, article4).amount, Decimal::ZERO);
        assert_eq!(ledger.mean_price(area1, article4, &currency), None);

        let card = ledger.article_stock(article4, &currency);
        assert_eq!(card.quantity, dec!(5));
        assert_eq!(card.amount, dec!(20));
        assert_eq!(card.movings.len(), 3);
        assert_eq!(card.movings[0].quantity, dec!(-5));
        assert_eq!(card.movings[0].comment, "exit");
    }

    #[test]
    fn test_exit_remainder_takes_whole_value() {
        let currency = CurrencyFormat::default();
        let area = StorageAreaId::new();
        let article = ArticleId::new();
        let mut ledger = StockLedger::default();
        let receipt = sheet(SheetType::Receipt, 1, area, "");
        ledger.apply(&receipt, &[StorageDetail::new(receipt.id, article, dec!(1), dec!(3))], &currency);
        let receipt2 = sheet(SheetType::Receipt, 1, area, "");
        ledger.apply(&receipt2, &[StorageDetail::new(receipt2.id, article, dec!(0.01), dec!(1))], &currency);
        assert_eq!(ledger.exit_value(area, article, dec!(1), &currency), dec!(0.75));
        let exit = sheet(SheetType::Exit, 2, area, "");
        ledger.apply(
            &exit,
            &[
                StorageDetail::new(exit.id, article, Decimal::ZERO, dec!(3)),
                StorageDetail::new(exit.id, article, Decimal::ZERO, dec!(1)),
            ],
            &currency,
        );
        assert_eq!(ledger.stock(area, article).amount, Decimal::ZERO);
    }

    #[test]
    fn test_replay_skips_building_sheets() {
        let currency = CurrencyFormat::default();
        let area = StorageAreaId::new();
        let article = ArticleId::new();
        let valid = sheet(SheetType::Receipt, 1, area, "");
        let mut building = sheet(SheetType::Receipt, 1, area, "");
        building.status = SheetStatus::Building;
        let sheets = vec![
            (building.clone(), vec![StorageDetail::new(building.id, article, dec!(2), dec!(8))]),
            (valid.clone(), vec![StorageDetail::new(valid.id, article, dec!(2), dec!(4))]),
        ];
        let ledger = StockLedger::from_sheets(&sheets, &currency);
        assert_eq!(ledger.quantity(area, article), dec!(4));
        assert_eq!(ledger.stocks().count(), 1);
    }

    #[test]
    fn test_exit_keeps_value_after_backdated_receipt() {
        let currency = CurrencyFormat::default();
        let area = StorageAreaId::new();
        let article = ArticleId::new();
        let receipt = sheet(SheetType::Receipt, 1, area, "");
        let receipt_lines = vec![StorageDetail::new(receipt.id, article, dec!(10), dec!(5))];
        let mut ledger = StockLedger::default();
        ledger.apply(&receipt, &receipt_lines, &currency);

        let exit = sheet(SheetType::Exit, 3, area, "");
        let mut exit_lines = vec![StorageDetail::new(exit.id, article, Decimal::ZERO, dec!(2))];
        ledger.value_exits(area, &mut exit_lines, &currency);
        assert_eq!(exit_lines[0].value, Some(dec!(20)));
        assert_eq!(exit_lines[0].price, dec!(10));

        let late = sheet(SheetType::Receipt, 2, area, "");
        let late_lines = vec![StorageDetail::new(late.id, article, dec!(20), dec!(5))];
        let replayed = StockLedger::from_sheets(
            &[(receipt, receipt_lines), (exit, exit_lines), (late, late_lines)],
            &currency,
        );
        let card = replayed.article_stock(article, &currency);
        assert_eq!(card.movings[0].amount, dec!(-20));
        assert_eq!(card.quantity, dec!(8));
        assert_eq!(card.amount, dec!(130));
        assert_eq!(replayed.last_moving(area, article), NaiveDate::from_ymd_opt(2014, 4, 3));
    }

    #[test]
    fn test_same_day_receipt_replayed_before_exit() {
        let currency = CurrencyFormat::default();
        let area = StorageAreaId::new();
        let article = ArticleId::new();
        let exit = sheet(SheetType::Exit, 4, area, "");
        let receipt = sheet(SheetType::Receipt, 4, area, "");
        let replayed = StockLedger::from_sheets(
            &[
                (exit.clone(), vec![StorageDetail::new(exit.id, article, Decimal::ZERO, dec!(2))]),
                (receipt.clone(), vec![StorageDetail::new(receipt.id, article, dec!(3), dec!(4))]),
            ],
            &currency,
        );
        let stock = replayed.stock(area, article);
        assert_eq!(stock.quantity, dec!(2));
        assert_eq!(stock.amount, dec!(6));
    }

    #[test]
    fn test_value_exits_splits_lines_of_one_article() {
        let currency = CurrencyFormat::default();
        let area = StorageAreaId::new();
        let article = ArticleId::new();
        let mut ledger = StockLedger::default();
        let receipt = sheet(SheetType::Receipt, 1, area, "");
        ledger.apply(&receipt, &[StorageDetail::new(receipt.id, article, dec!(1), dec!(3))], &currency);
        let exit = sheet(SheetType::Exit, 2, area, "");
        let mut lines = vec![
            StorageDetail::new(exit.id, article, Decimal::ZERO, dec!(2)),
            StorageDetail::new(exit.id, article, Decimal::ZERO, dec!(1)),
        ];
        ledger.value_exits(area, &mut lines, &currency);
        assert_eq!(lines[0].value, Some(dec!(2)));
        assert_eq!(lines[1].value, Some(dec!(1)));
        ledger.apply(&exit, &lines, &currency);
        assert_eq!(ledger.stock(area, article).amount, Decimal::ZERO);
    }
}
