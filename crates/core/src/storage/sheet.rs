//! Stock sheets: validation, generation from documents and CSV import.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use diacamma_shared::types::{ArticleId, CurrencyFormat, StorageAreaId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::StorageError;
use super::ledger::StockLedger;
use super::types::{ArticleMoving, SheetStatus, SheetType, StorageDetail, StorageSheet};
use crate::invoice::{Article, Bill, BillType, Detail};

/// Column mapping of a CSV import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvMapping {
    /// Field separator.
    pub delimiter: char,
    /// Quote character.
    pub quote: char,
    /// Column holding the article reference.
    pub article: String,
    /// Column holding the unit price.
    pub price: Option<String>,
    /// Column holding the quantity.
    pub quantity: String,
}

impl Default for CsvMapping {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            article: "article".into(),
            price: Some("price".into()),
            quantity: "quantity".into(),
        }
    }
}

/// Lines read from a CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvImport {
    /// New sheet lines.
    pub details: Vec<StorageDetail>,
    /// References matching no article.
    pub unknown: Vec<String>,
}

/// Stock sheet rules.
pub struct StorageService;

fn find_article(articles: &[Article], id: ArticleId) -> Result<&Article, StorageError> {
    articles
        .iter()
        .find(|a| a.id == id)
        .ok_or(StorageError::ArticleNotFound(id))
}

fn parse_number(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

impl StorageService {
    /// Warnings shown on a building sheet, one per non stockable article.
    #[must_use]
    pub fn check_info(details: &[StorageDetail], articles: &[Article]) -> Vec<String> {
        details
            .iter()
            .filter_map(|d| articles.iter().find(|a| a.id == d.article_id))
            .filter(|a| !a.stockable.is_stocked())
            .map(|a| format!("article {} is not stockable", a.reference))
            .collect()
    }

    /// Checks a sheet can be applied and returns the movements it would make.
    pub fn validate_sheet(
        sheet: &StorageSheet,
        details: &[StorageDetail],
        articles: &[Article],
        ledger: &StockLedger,
        currency: &CurrencyFormat,
    ) -> Result<Vec<ArticleMoving>, StorageError> {
        if sheet.status != SheetStatus::Building {
            return Err(StorageError::SheetNotBuilding(sheet.id));
        }
        if details.is_empty() {
            return Err(StorageError::NoDetail);
        }
        let mut exits: BTreeMap<ArticleId, Decimal> = BTreeMap::new();
        for detail in details {
            let article = find_article(articles, detail.article_id)?;
            if detail.quantity <= Decimal::ZERO {
                return Err(StorageError::InvalidQuantity {
                    reference: article.reference.clone(),
                });
            }
            if !article.stockable.is_stocked() {
                return Err(StorageError::NotStockable(article.reference.clone()));
            }
            if sheet.sheet_type == SheetType::Exit {
                *exits.entry(article.id).or_default() += detail.quantity;
            }
        }
        for (article_id, quantity) in exits {
            let article = find_article(articles, article_id)?;
            Self::check_exit(ledger, sheet.storagearea_id, sheet.date, article)?;
            if quantity > ledger.quantity(sheet.storagearea_id, article_id) {
                return Err(StorageError::InsufficientQuantity(article.reference.clone()));
            }
        }
        let mut preview = ledger.clone();
        let mut lines = details.to_vec();
        if sheet.sheet_type == SheetType::Exit {
            preview.value_exits(sheet.storagearea_id, &mut lines, currency);
        }
        Ok(preview.apply(sheet, &lines, currency))
    }

    /// An exit may not precede a movement already in the stock: the stock it
    /// takes from must exist at its date for every later exit to stay covered.
    pub(crate) fn check_exit(
        ledger: &StockLedger,
        area: StorageAreaId,
        date: NaiveDate,
        article: &Article,
    ) -> Result<(), StorageError> {
        match ledger.last_moving(area, article.id) {
            Some(last) if last > date => Err(StorageError::ExitBeforeLastMovement {
                reference: article.reference.clone(),
                last,
            }),
            _ => Ok(()),
        }
    }

    /// Validates a sheet and applies it to the ledger. Exit lines get the
    /// value they take out of the stock.
    pub fn validate(
        sheet: &mut StorageSheet,
        details: &mut [StorageDetail],
        articles: &[Article],
        ledger: &mut StockLedger,
        currency: &CurrencyFormat,
    ) -> Result<Vec<ArticleMoving>, StorageError> {
        Self::validate_sheet(sheet, details, articles, ledger, currency)?;
        sheet.status = SheetStatus::Valid;
        if sheet.sheet_type == SheetType::Exit {
            ledger.value_exits(sheet.storagearea_id, details, currency);
        }
        Ok(ledger.apply(sheet, details, currency))
    }

    /// Only building sheets can be edited or deleted.
    pub fn validate_edit(sheet: &StorageSheet) -> Result<(), StorageError> {
        match sheet.status {
            SheetStatus::Building => Ok(()),
            SheetStatus::Valid => Err(StorageError::SheetNotBuilding(sheet.id)),
        }
    }

    /// Stock sheets of a validated document, one per area: bills and
    /// receipts take goods out, credit notes bring them back.
    #[must_use]
    pub fn sheets_for_bill(
        bill: &Bill,
        details: &[Detail],
        articles: &[Article],
    ) -> Vec<(StorageSheet, Vec<StorageDetail>)> {
        let sheet_type = match bill.bill_type {
            BillType::Bill | BillType::Receipt => SheetType::Exit,
            BillType::Asset => SheetType::Receipt,
            _ => return Vec::new(),
        };
        let comment = format!("{} - {}", bill.designation(), bill.date.format("%Y-%m-%d"));
        let mut by_area: BTreeMap<StorageAreaId, StorageSheet> = BTreeMap::new();
        let mut lines: BTreeMap<StorageAreaId, Vec<StorageDetail>> = BTreeMap::new();
        for detail in details {
            let (Some(area), Some(article_id)) = (detail.storagearea_id, detail.article_id) else {
                continue;
            };
            let stocked = articles
                .iter()
                .any(|a| a.id == article_id && a.stockable.is_stocked());
            if !stocked || detail.quantity <= Decimal::ZERO {
                continue;
            }
            let sheet = by_area
                .entry(area)
                .or_insert_with(|| StorageSheet::new(sheet_type, bill.date, area, comment.clone()));
            let price = if sheet_type == SheetType::Receipt { detail.price } else { Decimal::ZERO };
            lines
                .entry(area)
                .or_default()
                .push(StorageDetail::new(sheet.id, article_id, price, detail.quantity));
        }
        by_area
            .into_iter()
            .map(|(area, sheet)| {
                let details = lines.remove(&area).unwrap_or_default();
                (sheet, details)
            })
            .collect()
    }

    /// Reads sheet lines from CSV. Decimal commas are accepted; prices are
    /// ignored for exits.
    pub fn import_csv(
        sheet: &StorageSheet,
        content: &str,
        mapping: &CsvMapping,
        articles: &[Article],
    ) -> Result<CsvImport, StorageError> {
        Self::validate_edit(sheet)?;
        let as_byte = |c: char| u8::try_from(c).map_err(|_| StorageError::Csv(format!("unsupported separator '{c}'")));
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(as_byte(mapping.delimiter)?)
            .quote(as_byte(mapping.quote)?)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| StorageError::MissingColumn(name.to_string()))
        };
        let article_col = column(&mapping.article)?;
        let quantity_col = column(&mapping.quantity)?;
        let price_col = mapping.price.as_deref().map(column).transpose()?;

        let mut import = CsvImport::default();
        for record in reader.records() {
            let record = record?;
            let reference = record.get(article_col).unwrap_or_default();
            if reference.is_empty() {
                continue;
            }
            let Some(article) = articles.iter().find(|a| a.reference == reference) else {
                import.unknown.push(reference.to_string());
                continue;
            };
            let quantity = record.get(quantity_col).and_then(parse_number).unwrap_or(Decimal::ONE);
            let price = match (sheet.sheet_type, price_col) {
                (SheetType::Receipt, Some(col)) => record.get(col).and_then(parse_number).unwrap_or(article.price),
                (SheetType::Receipt, None) => article.price,
                (SheetType::Exit, _) => Decimal::ZERO,
            };
            import
                .details
                .push(StorageDetail::new(sheet.id, article.id, price, quantity));
        }
        Ok(import)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{BillStatus, Stockable};
    use diacamma_shared::types::{DetailId, ThirdId};
    use rust_decimal_macros::dec;

    fn article(reference: &str, stockable: Stockable) -> Article {
        Article {
            id: ArticleId::new(),
            reference: reference.into(),
            designation: format!("article {reference}"),
            price: dec!(1),
            unit: String::new(),
            sell_account: "701".into(),
            vat_id: None,
            stockable,
            category_ids: vec![],
            is_disabled: false,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2014, 4, day).unwrap()
    }

    #[test]
    fn test_validate_receipt_and_exit() {
        let currency = CurrencyFormat::default();
        let area = StorageAreaId::new();
        let articles = vec![article("ABC1", Stockable::Yes), article("ABC3", Stockable::No)];
        let mut ledger = StockLedger::default();

        let mut receipt = StorageSheet::new(SheetType::Receipt, date(1), area, "arrival");
        let mut details = vec![StorageDetail::new(receipt.id, articles[0].id, dec!(7.25), dec!(10))];
        let moved = StorageService::validate(&mut receipt, &mut details, &articles, &mut ledger, &currency).unwrap();
        assert_eq!(moved[0].amount, dec!(72.5));
        assert_eq!(receipt.status, SheetStatus::Valid);
        assert_eq!(details[0].value, None);
        assert_eq!(
            StorageService::validate(&mut receipt, &mut details, &articles, &mut ledger, &currency),
            Err(StorageError::SheetNotBuilding(receipt.id))
        );

        let mut exit = StorageSheet::new(SheetType::Exit, date(2), area, "sale");
        let mut too_much = vec![StorageDetail::new(exit.id, articles[0].id, Decimal::ZERO, dec!(11))];
        assert_eq!(
            StorageService::validate(&mut exit, &mut too_much, &articles, &mut ledger, &currency),
            Err(StorageError::InsufficientQuantity("ABC1".into()))
        );
        let split = vec![
            StorageDetail::new(exit.id, articles[0].id, Decimal::ZERO, dec!(6)),
            StorageDetail::new(exit.id, articles[0].id, Decimal::ZERO, dec!(5)),
        ];
        assert!(StorageService::validate_sheet(&exit, &split, &articles, &ledger, &currency).is_err());
        let mut ok = vec![StorageDetail::new(exit.id, articles[0].id, Decimal::ZERO, dec!(4))];
        let moved = StorageService::validate(&mut exit, &mut ok, &articles, &mut ledger, &currency).unwrap();
        assert_eq!(moved[0].amount, dec!(-29));
        assert_eq!(ok[0].value, Some(dec!(29)));
        assert_eq!(ok[0].price, dec!(7.25));
        assert_eq!(ledger.quantity(area, articles[0].id), dec!(6));

        let mut other = StorageSheet::new(SheetType::Receipt, date(3), area, "");
        let mut not_stocked = vec![StorageDetail::new(other.id, articles[1].id, dec!(1), dec!(1))];
        assert_eq!(StorageService::check_info(&not_stocked, &articles), vec!["article ABC3 is not stockable"]);
        assert_eq!(
            StorageService::validate(&mut other, &mut not_stocked, &articles, &mut ledger, &currency),
            Err(StorageError::NotStockable("ABC3".into()))
        );
        assert_eq!(
            StorageService::validate(&mut other, &mut [], &articles, &mut ledger, &currency),
            Err(StorageError::NoDetail)
        );
        let mut zero = vec![StorageDetail::new(other.id, articles[0].id, dec!(1), dec!(0))];
        assert!(matches!(
            StorageService::validate(&mut other, &mut zero, &articles, &mut ledger, &currency),
            Err(StorageError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_exit_before_last_movement_refused() {
        let currency = CurrencyFormat::default();
        let area = StorageAreaId::new();
        let articles = vec![article("ABC1", Stockable::Yes)];
        let mut ledger = StockLedger::default();
        let mut receipt = StorageSheet::new(SheetType::Receipt, date(5), area, "");
        let mut lines = vec![StorageDetail::new(receipt.id, articles[0].id, dec!(10), dec!(5))];
        StorageService::validate(&mut receipt, &mut lines, &articles, &mut ledger, &currency).unwrap();

        let mut early = StorageSheet::new(SheetType::Exit, date(1), area, "");
        let mut taken = vec![StorageDetail::new(early.id, articles[0].id, Decimal::ZERO, dec!(2))];
        assert_eq!(
            StorageService::validate(&mut early, &mut taken, &articles, &mut ledger, &currency),
            Err(StorageError::ExitBeforeLastMovement {
                reference: "ABC1".into(),
                last: date(5),
            })
        );
        assert_eq!(early.status, SheetStatus::Building);

        early.date = date(5);
        StorageService::validate(&mut early, &mut taken, &articles, &mut ledger, &currency).unwrap();
        let stock = ledger.stock(area, articles[0].id);
        assert_eq!(stock.quantity, dec!(3));
        assert_eq!(stock.amount, dec!(30));
    }

    #[test]
    fn test_sheets_for_bill() {
        let (area1, area2) = (StorageAreaId::new(), StorageAreaId::new());
        let articles = vec![
            article("A", Stockable::Yes),
            article("B", Stockable::Yes),
            article("C", Stockable::No),
        ];
        let mut bill = Bill::new(BillType::Bill, date(10), Some(ThirdId::new()));
        bill.status = BillStatus::Valid;
        bill.num_txt = Some("A-1".into());
        let line = |article: &Article, price: Decimal, area: Option<StorageAreaId>| Detail {
            id: DetailId::new(),
            bill_id: bill.id,
            article_id: Some(article.id),
            designation: article.designation.clone(),
            price,
            unit: String::new(),
            quantity: dec!(5),
            reduce: Decimal::ZERO,
            vat_rate: Decimal::ZERO,
            storagearea_id: area,
        };
        let details = vec![
            line(&articles[0], dec!(1.11), Some(area1)),
            line(&articles[1], dec!(2.22), Some(area2)),
            line(&articles[2], dec!(3.33), None),
        ];
        let sheets = StorageService::sheets_for_bill(&bill, &details, &articles);
        assert_eq!(sheets.len(), 2);
        for (sheet, lines) in &sheets {
            assert_eq!(sheet.sheet_type, SheetType::Exit);
            assert_eq!(sheet.comment, "bill A-1 - 2014-04-10");
            assert_eq!(lines.len(), 1);
            assert_eq!(lines[0].quantity, dec!(5));
        }

        bill.bill_type = BillType::Asset;
        let sheets = StorageService::sheets_for_bill(&bill, &details, &articles);
        assert!(sheets.iter().all(|(s, _)| s.sheet_type == SheetType::Receipt));
        assert!(sheets.iter().any(|(_, l)| l[0].price == dec!(1.11)));

        bill.bill_type = BillType::Quotation;
        assert!(StorageService::sheets_for_bill(&bill, &details, &articles).is_empty());
    }

    #[test]
    fn test_import_csv() {
        let articles = vec![
            article("ABC1", Stockable::Yes),
            article("ABC2", Stockable::Yes),
            article("ABC3", Stockable::No),
            article("ABC4", Stockable::Yes),
            article("ABC5", Stockable::No),
        ];
        let content = "'num','prix','qty'\n'ABC1','1.11','10.00'\n'ABC2','2,22','5.00'\n'ABC3','3.33','25,00'\n'XYZ0','6.66','88.00'\n'ABC4','4,44','20.00'\n'ABC5','5.55','15.00'\n";
        let sheet = StorageSheet::new(SheetType::Receipt, date(1), StorageAreaId::new(), "massive arrival");
        let mapping = CsvMapping {
            delimiter: ',',
            quote: '\'',
            article: "num".into(),
            price: Some("prix".into()),
            quantity: "qty".into(),
        };
        let import = StorageService::import_csv(&sheet, content, &mapping, &articles).unwrap();
        assert_eq!(import.details.len(), 5);
        assert_eq!(import.unknown, vec!["XYZ0".to_string()]);
        assert_eq!(import.details[1].price, dec!(2.22));
        assert_eq!(import.details[2].quantity, dec!(25));
        assert_eq!(
            StorageService::check_info(&import.details, &articles),
            vec!["article ABC3 is not stockable", "article ABC5 is not stockable"]
        );

        let wrong = CsvMapping {
            article: "ref".into(),
            ..mapping.clone()
        };
        assert_eq!(
            StorageService::import_csv(&sheet, content, &wrong, &articles),
            Err(StorageError::MissingColumn("ref".into()))
        );
    }
}
