//! Automatic reductions granted to a third on an article category.
//!
//! A rule counts the units the third already bought in the category during
//! the fiscal year (validated bills and receipts add, credit notes remove,
//! quotations never count) and grants:
//!
//! - `FixedAmount`: `amount` per unit ranked at or after `occurency`
//! - `Percent`: `amount%` of the unit price per unit ranked at or after `occurency`
//! - `RetroactivePercent`: once `occurency` units are reached, `amount%` of
//!   everything bought in the year minus what was already granted
//!
//! The reduction of a line never exceeds its gross amount.

use diacamma_shared::types::{AutomaticReduceId, CategoryId, CurrencyFormat, FiscalYearId, ThirdId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::InvoiceError;
use super::types::{Article, Bill, BillStatus, BillType, Detail};
use crate::accounting::Third;

/// How a rule computes its reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceMode {
    /// Fixed amount per unit.
    FixedAmount,
    /// Percentage of the unit price.
    Percent,
    /// Percentage of the yearly purchases, once the threshold is reached.
    RetroactivePercent,
}

impl ReduceMode {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::FixedAmount => 0,
            Self::Percent => 1,
            Self::RetroactivePercent => 2,
        }
    }

    /// Decodes a stored code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::FixedAmount),
            1 => Some(Self::Percent),
            2 => Some(Self::RetroactivePercent),
            _ => None,
        }
    }
}

/// Third selection of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThirdCriteria {
    /// Contact name contains the text, ignoring case.
    ContactContains {
        /// Searched text.
        text: String,
    },
    /// Third owns an account starting with the prefix.
    AccountPrefix {
        /// Account prefix.
        prefix: String,
    },
    /// Custom field equals the value.
    CustomField {
        /// Field name.
        name: String,
        /// Expected value.
        value: String,
    },
}

impl ThirdCriteria {
    /// Returns true when the third matches.
    #[must_use]
    pub fn matches(&self, third: &Third) -> bool {
        match self {
            Self::ContactContains { text } => third.matches_contact(text),
            Self::AccountPrefix { prefix } => third.accounts.iter().any(|a| a.code.starts_with(prefix.as_str())),
            Self::CustomField { name, value } => third.custom_fields.get(name) == Some(value),
        }
    }
}

/// Reduction rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomaticReduce {
    /// Rule id.
    pub id: AutomaticReduceId,
    /// Name.
    pub name: String,
    /// Article category the rule applies to.
    pub category_id: CategoryId,
    /// Computation.
    pub mode: ReduceMode,
    /// Amount (currency for fixed amounts, percent otherwise).
    pub amount: Decimal,
    /// Rank of the first unit benefiting from the rule.
    pub occurency: u32,
    /// Third selection, every third when absent.
    pub criteria: Option<ThirdCriteria>,
    /// Rule in use.
    pub is_active: bool,
}

impl AutomaticReduce {
    /// Checks the amount of a rule.
    pub fn validate(&self) -> Result<(), InvoiceError> {
        if self.amount <= Decimal::ZERO {
            return Err(InvoiceError::InvalidReduceRule("amount must be positive".into()));
        }
        if self.mode != ReduceMode::FixedAmount && self.amount > Decimal::ONE_HUNDRED {
            return Err(InvoiceError::InvalidReduceRule("percentage above 100".into()));
        }
        Ok(())
    }
}

/// What a third already bought in a category this year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReduceHistory {
    /// Units.
    pub quantity: Decimal,
    /// Gross amount.
    pub gross: Decimal,
    /// Reductions granted.
    pub reduce: Decimal,
}

impl ReduceHistory {
    fn add(&mut self, detail: &Detail, currency: &CurrencyFormat, sign: Decimal) {
        self.quantity += sign * detail.quantity;
        self.gross += sign * detail.gross(currency);
        self.reduce += sign * currency.round(detail.reduce);
    }
}

/// Gross, reduce and net of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReduceSummary {
    /// Sum of line gross amounts.
    pub gross: Decimal,
    /// Sum of reductions.
    pub reduce: Decimal,
    /// `gross − reduce`.
    pub net: Decimal,
}

impl ReduceSummary {
    /// Summary of a document.
    #[must_use]
    pub fn of(details: &[Detail], currency: &CurrencyFormat) -> Self {
        let gross: Decimal = details.iter().map(|d| d.gross(currency)).sum();
        let reduce: Decimal = details.iter().map(|d| currency.round(d.reduce)).sum();
        Self {
            gross,
            reduce,
            net: gross - reduce,
        }
    }
}

/// Automatic reduction rules.
pub struct ReduceService;

impl ReduceService {
    fn article_of<'a>(detail: &Detail, articles: &'a [Article]) -> Option<&'a Article> {
        detail
            .article_id
            .and_then(|id| articles.iter().find(|a| a.id == id))
    }

    /// Returns true when the rule applies to this third and article.
    #[must_use]
    pub fn applicable(rule: &AutomaticReduce, third: &Third, article: &Article) -> bool {
        rule.is_active
            && article.category_ids.contains(&rule.category_id)
            && rule.criteria.as_ref().is_none_or(|c| c.matches(third))
    }

    /// Purchases of `third_id` in the rule category during the year, taken
    /// from validated and archived documents.
    #[must_use]
    pub fn history(
        rule: &AutomaticReduce,
        third_id: ThirdId,
        year_id: FiscalYearId,
        documents: &[(Bill, Vec<Detail>)],
        articles: &[Article],
        currency: &CurrencyFormat,
    ) -> ReduceHistory {
        let mut history = ReduceHistory::default();
        for (bill, details) in documents {
            if bill.third_id != Some(third_id)
                || bill.fiscal_year_id != Some(year_id)
                || !matches!(bill.status, BillStatus::Valid | BillStatus::Archived)
            {
                continue;
            }
            let sign = match bill.bill_type {
                BillType::Bill | BillType::Receipt => Decimal::ONE,
                BillType::Asset => Decimal::NEGATIVE_ONE,
                BillType::Quotation | BillType::Order | BillType::Cart => continue,
            };
            for detail in details {
                if Self::article_of(detail, articles).is_some_and(|a| a.category_ids.contains(&rule.category_id)) {
                    history.add(detail, currency, sign);
                }
            }
        }
        history
    }

    /// Units of the line ranked at or after `occurency`.
    fn eligible_units(occurency: u32, history: &ReduceHistory, quantity: Decimal) -> Decimal {
        let first_rank = Decimal::from(occurency.max(1));
        (history.quantity + quantity - first_rank + Decimal::ONE)
            .max(Decimal::ZERO)
            .min(quantity)
    }

    /// Reduction granted by one rule on a line.
    #[must_use]
    pub fn compute(
        rule: &AutomaticReduce,
        detail: &Detail,
        history: &ReduceHistory,
        currency: &CurrencyFormat,
    ) -> Decimal {
        let gross = detail.gross(currency);
        let reduce = match rule.mode {
            ReduceMode::FixedAmount => rule.amount * Self::eligible_units(rule.occurency, history, detail.quantity),
            ReduceMode::Percent => {
                detail.price * rule.amount / Decimal::ONE_HUNDRED
                    * Self::eligible_units(rule.occurency, history, detail.quantity)
            }
            ReduceMode::RetroactivePercent => {
                if history.quantity + detail.quantity < Decimal::from(rule.occurency) {
                    Decimal::ZERO
                } else {
                    (history.gross + gross) * rule.amount / Decimal::ONE_HUNDRED - history.reduce
                }
            }
        };
        currency.round(reduce.max(Decimal::ZERO).min(gross))
    }

    /// Best reduction among the applicable rules; `None` when no rule applies.
    #[must_use]
    pub fn best_reduce(
        rules: &[AutomaticReduce],
        third: &Third,
        detail: &Detail,
        history_of: impl Fn(&AutomaticReduce) -> ReduceHistory,
        articles: &[Article],
        currency: &CurrencyFormat,
    ) -> Option<Decimal> {
        let article = Self::article_of(detail, articles)?;
        rules
            .iter()
            .filter(|rule| Self::applicable(rule, third, article))
            .map(|rule| Self::compute(rule, detail, &history_of(rule), currency))
            .max()
    }

    /// Recomputes the reduction of every line of the third's building
    /// documents. Only validated documents make the history; lines of one
    /// document also count for the next lines of that same document, never
    /// for another building document. Returns the number of changed lines.
    pub fn recompute_third(
        rules: &[AutomaticReduce],
        third: &Third,
        year_id: FiscalYearId,
        building: &mut [(Bill, Vec<Detail>)],
        validated: &[(Bill, Vec<Detail>)],
        articles: &[Article],
        currency: &CurrencyFormat,
    ) -> usize {
        let mut changed = 0;
        for (bill, details) in building.iter_mut() {
            if !bill.is_building() || bill.third_id != Some(third.id) {
                continue;
            }
            let sign = if bill.bill_type == BillType::Asset {
                Decimal::NEGATIVE_ONE
            } else {
                Decimal::ONE
            };
            let mut done: Vec<(CategoryId, ReduceHistory)> = Vec::new();
            for detail in details.iter_mut() {
                let history_of = |rule: &AutomaticReduce| {
                    let mut history = Self::history(rule, third.id, year_id, validated, articles, currency);
                    if let Some((_, inner)) = done.iter().find(|(c, _)| *c == rule.category_id) {
                        history.quantity += inner.quantity;
                        history.gross += inner.gross;
                        history.reduce += inner.reduce;
                    }
                    history
                };
                let Some(reduce) = Self::best_reduce(rules, third, detail, history_of, articles, currency) else {
                    continue;
                };
                if detail.reduce != reduce {
                    detail.reduce = reduce;
                    changed += 1;
                }
                if let Some(article) = Self::article_of(detail, articles) {
                    for category in &article.category_ids {
                        match done.iter_mut().find(|(c, _)| c == category) {
                            Some((_, inner)) => inner.add(detail, currency, sign),
                            None => {
                                let mut inner = ReduceHistory::default();
                                inner.add(detail, currency, sign);
                                done.push((*category, inner));
                            }
                        }
                    }
                }
            }
        }
        changed
    }
}
