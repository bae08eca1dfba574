//! Sales statistics of a fiscal year: per article, per customer, per month.
//!
//! Bills and receipts count positively, credit notes negatively. Validated
//! quotations are summed apart, per article.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use diacamma_shared::types::{ArticleId, ThirdId};
use rust_decimal::Decimal;
use serde::Serialize;

use super::bill::BillService;
use super::types::{Article, Bill, BillStatus, BillType, Detail, InvoiceParams};
use crate::accounting::{FiscalYear, Third};

/// Label of lines without article.
pub const FREE_LINE_LABEL: &str = "---";

/// Sales of one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleStatistic {
    /// Article reference, `---` for free lines.
    pub article: String,
    /// Amount without VAT.
    pub amount: Decimal,
    /// Quantity sold.
    pub quantity: Decimal,
    /// Mean unit price.
    pub mean: Decimal,
    /// Share of the total, in percent.
    pub ratio: Decimal,
}

/// Sales to one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerStatistic {
    /// Customer contact.
    pub customer: String,
    /// Amount without VAT.
    pub amount: Decimal,
    /// Share of the total, in percent.
    pub ratio: Decimal,
}

/// Sales of one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthStatistic {
    /// First day of the month.
    pub month: NaiveDate,
    /// Amount without VAT.
    pub amount: Decimal,
}

/// Sales statistics of a fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillStatistics {
    /// Sales per article, largest first.
    pub articles: Vec<ArticleStatistic>,
    /// Sales per customer, largest first.
    pub customers: Vec<CustomerStatistic>,
    /// Sales per month of the year, every month listed.
    pub months: Vec<MonthStatistic>,
    /// Total sales.
    pub total: Decimal,
    /// Validated quotations per article.
    pub quotations: Vec<ArticleStatistic>,
    /// Total of validated quotations.
    pub quotations_total: Decimal,
}

#[derive(Default)]
struct Sum {
    amount: Decimal,
    quantity: Decimal,
}

fn ratio(amount: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        (amount * Decimal::ONE_HUNDRED / total).round_dp(2)
    }
}

fn counted(bill: &Bill, year: &FiscalYear) -> bool {
    matches!(bill.status, BillStatus::Valid | BillStatus::Archived) && bill.fiscal_year_id == Some(year.id)
}

fn by_article(
    sums: BTreeMap<Option<ArticleId>, Sum>,
    articles: &[Article],
    params: &InvoiceParams,
) -> (Vec<ArticleStatistic>, Decimal) {
    let total: Decimal = sums.values().map(|s| s.amount).sum();
    let mut lines: Vec<ArticleStatistic> = sums
        .into_iter()
        .map(|(id, sum)| {
            let article = id
                .and_then(|id| articles.iter().find(|a| a.id == id))
                .map_or_else(|| FREE_LINE_LABEL.to_string(), |a| a.reference.clone());
            let mean = if sum.quantity.is_zero() {
                Decimal::ZERO
            } else {
                params.currency.round(sum.amount / sum.quantity)
            };
            ArticleStatistic {
                article,
                amount: sum.amount,
                quantity: sum.quantity,
                mean,
                ratio: ratio(sum.amount, total),
            }
        })
        .collect();
    lines.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.article.cmp(&b.article)));
    (lines, total)
}

fn months_of(year: &FiscalYear) -> Vec<NaiveDate> {
    let mut months = Vec::new();
    let mut current = year.begin.with_day(1);
    while let Some(month) = current.filter(|m| *m <= year.end) {
        months.push(month);
        current = month.checked_add_months(Months::new(1));
    }
    months
}

impl BillService {
    /// Sales statistics of `year`. Amounts are line totals without VAT, net
    /// of reductions unless `without_reduce` is set.
    #[must_use]
    pub fn statistics(
        year: &FiscalYear,
        documents: &[(Bill, Vec<Detail>)],
        articles: &[Article],
        thirds: &[Third],
        params: &InvoiceParams,
        without_reduce: bool,
    ) -> BillStatistics {
        let amount_of = |detail: &Detail| {
            if without_reduce {
                detail.sell_amount(params.vat_mode, &params.currency)
            } else {
                detail.total_excltax(params.vat_mode, &params.currency)
            }
        };
        let mut per_article: BTreeMap<Option<ArticleId>, Sum> = BTreeMap::new();
        let mut per_customer: BTreeMap<Option<ThirdId>, Decimal> = BTreeMap::new();
        let mut per_month: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        let mut per_quoted: BTreeMap<Option<ArticleId>, Sum> = BTreeMap::new();

        for (bill, details) in documents.iter().filter(|(b, _)| counted(b, year)) {
            let (sums, sign) = match bill.bill_type {
                BillType::Bill | BillType::Receipt => (&mut per_article, Decimal::ONE),
                BillType::Asset => (&mut per_article, Decimal::NEGATIVE_ONE),
                BillType::Quotation => (&mut per_quoted, Decimal::ONE),
                BillType::Order | BillType::Cart => continue,
            };
            let mut document = Decimal::ZERO;
            for detail in details {
                let amount = sign * amount_of(detail);
                let sum = sums.entry(detail.article_id).or_default();
                sum.amount += amount;
                sum.quantity += sign * detail.quantity;
                document += amount;
            }
            if bill.bill_type != BillType::Quotation {
                *per_customer.entry(bill.third_id).or_default() += document;
                if let Some(month) = bill.date.with_day(1) {
                    *per_month.entry(month).or_default() += document;
                }
            }
        }

        let (articles_lines, total) = by_article(per_article, articles, params);
        let (quotations, quotations_total) = by_article(per_quoted, articles, params);
        let mut customers: Vec<CustomerStatistic> = per_customer
            .into_iter()
            .map(|(id, amount)| CustomerStatistic {
                customer: id
                    .and_then(|id| thirds.iter().find(|t| t.id == id))
                    .map_or_else(|| FREE_LINE_LABEL.to_string(), |t| t.contact.clone()),
                amount,
                ratio: ratio(amount, total),
            })
            .collect();
        customers.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.customer.cmp(&b.customer)));
        let months = months_of(year)
            .into_iter()
            .map(|month| MonthStatistic {
                month,
                amount: per_month.get(&month).copied().unwrap_or_default(),
            })
            .collect();
        BillStatistics {
            articles: articles_lines,
            customers,
            months,
            total,
            quotations,
            quotations_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::FiscalYearStatus;
    use crate::invoice::Stockable;
    use diacamma_shared::types::{DetailId, FiscalYearId};
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

    fn article(reference: &str) -> Article {
        Article {
            id: ArticleId::new(),
            reference: reference.into(),
            designation: reference.into(),
            price: Decimal::ZERO,
            unit: String::new(),
            sell_account: "701".into(),
            vat_id: None,
            stockable: Stockable::No,
            category_ids: vec![],
            is_disabled: false,
        }
    }

    struct Books {
        year: FiscalYear,
        documents: Vec<(Bill, Vec<Detail>)>,
    }

    impl Books {
        fn add(
            &mut self,
            bill_type: BillType,
            month: u32,
            third: &Third,
            lines: &[(Option<&Article>, Decimal, Decimal, Decimal)],
        ) {
            let mut bill = Bill::new(bill_type, date(month, 1), Some(third.id));
            bill.status = BillStatus::Valid;
            bill.fiscal_year_id = Some(self.year.id);
            let details = lines
                .iter()
                .map(|(article, price, quantity, reduce)| Detail {
                    id: DetailId::new(),
                    bill_id: bill.id,
                    article_id: article.map(|a| a.id),
                    designation: "line".into(),
                    price: *price,
                    unit: String::new(),
                    quantity: *quantity,
                    reduce: *reduce,
                    vat_rate: Decimal::ZERO,
                    storagearea_id: None,
                })
                .collect();
            self.documents.push((bill, details));
        }
    }

    #[test]
    fn test_statistics_per_article_customer_and_month() {
        let abc1 = article("ABC1");
        let abc2 = article("ABC2");
        let abc5 = article("ABC5");
        let catalog = vec![abc1.clone(), abc2.clone(), abc5.clone()];
        let jack = Third::new("Dalton Jack");
        let william = Third::new("Dalton William");
        let minimum = Third::new("Minimum");
        let mut books = Books {
            year: year(),
            documents: Vec::new(),
        };
        books.add(BillType::Quotation, 1, &jack, &[(None, dec!(20), dec!(15), dec!(15))]);
        books.add(
            BillType::Bill,
            2,
            &jack,
            &[(Some(&abc1), dec!(22), dec!(3), dec!(5)), (Some(&abc2), dec!(3.25), dec!(7), dec!(0))],
        );
        books.add(
            BillType::Receipt,
            3,
            &minimum,
            &[(None, dec!(50), dec!(2), dec!(0)), (Some(&abc5), dec!(6.33), dec!(6.75), dec!(0))],
        );
        books.add(
            BillType::Bill,
            4,
            &william,
            &[(Some(&abc1), dec!(23), dec!(3), dec!(0)), (Some(&abc5), dec!(6.33), dec!(3.5), dec!(0))],
        );
        books.add(
            BillType::Bill,
            5,
            &jack,
            &[(Some(&abc2), dec!(3.3), dec!(5), dec!(0)), (Some(&abc5), dec!(6.35), dec!(4.25), dec!(2))],
        );
        books.add(BillType::Asset, 6, &minimum, &[(Some(&abc5), dec!(6.33), dec!(1.25), dec!(0))]);
        let mut building = Bill::new(BillType::Bill, date(7, 1), Some(jack.id));
        building.fiscal_year_id = Some(books.year.id);
        let building_line = books.documents[1].1[0].clone();
        books.documents.push((building, vec![building_line]));

        let thirds = vec![jack, william, minimum];
        let stats = BillService::statistics(
            &books.year,
            &books.documents,
            &catalog,
            &thirds,
            &InvoiceParams::default(),
            false,
        );
        assert_eq!(stats.total, dec!(351.22));
        let articles: Vec<(&str, Decimal, Decimal)> = stats
            .articles
            .iter()
            .map(|a| (a.article.as_str(), a.amount, a.quantity))
            .collect();
        assert_eq!(
            articles,
            vec![
                ("ABC1", dec!(130), dec!(6)),
                ("---", dec!(100), dec!(2)),
                ("ABC5", dec!(81.97), dec!(13.25)),
                ("ABC2", dec!(39.25), dec!(12)),
            ]
        );
        assert_eq!(stats.articles[1].mean, dec!(50));
        assert_eq!(stats.articles[1].ratio, dec!(28.47));

        let customers: Vec<(&str, Decimal)> = stats.customers.iter().map(|c| (c.customer.as_str(), c.amount)).collect();
        assert_eq!(
            customers,
            vec![("Minimum", dec!(134.82)), ("Dalton Jack", dec!(125.24)), ("Dalton William", dec!(91.16))]
        );
        assert_eq!(stats.customers[1].ratio, dec!(35.66));

        assert_eq!(stats.months.len(), 12);
        assert_eq!(stats.months[0].amount, Decimal::ZERO);
        assert_eq!(stats.months[2].amount, dec!(142.73));
        assert_eq!(stats.months[5].amount, dec!(-7.91));
        assert_eq!(stats.months[6].amount, Decimal::ZERO);

        assert_eq!(stats.quotations.len(), 1);
        assert_eq!(stats.quotations[0].amount, dec!(285));
        assert_eq!(stats.quotations[0].mean, dec!(19));
        assert_eq!(stats.quotations[0].ratio, dec!(100));
    }

    #[test]
    fn test_statistics_without_reduce() {
        let abc1 = article("ABC1");
        let jack = Third::new("Dalton Jack");
        let mut books = Books {
            year: year(),
            documents: Vec::new(),
        };
        books.add(BillType::Bill, 2, &jack, &[(Some(&abc1), dec!(22), dec!(3), dec!(5))]);
        let catalog = vec![abc1];
        let thirds = vec![jack];
        let params = InvoiceParams::default();
        let net = BillService::statistics(&books.year, &books.documents, &catalog, &thirds, &params, false);
        let gross = BillService::statistics(&books.year, &books.documents, &catalog, &thirds, &params, true);
        assert_eq!(net.articles[0].amount, dec!(61));
        assert_eq!(gross.articles[0].amount, dec!(66));
        assert_eq!(gross.customers[0].ratio, dec!(100));
    }

    #[test]
    fn test_months_follow_the_fiscal_year() {
        let mut shifted = year();
        shifted.begin = NaiveDate::from_ymd_opt(2014, 9, 15).unwrap();
        shifted.end = NaiveDate::from_ymd_opt(2015, 3, 31).unwrap();
        let months = months_of(&shifted);
        assert_eq!(months.len(), 7);
        assert_eq!(months[0], NaiveDate::from_ymd_opt(2014, 9, 1).unwrap());
        assert_eq!(months[6], date(3, 1));
    }
}
