//! Line amounts, VAT split and document totals.
//!
//! With prices excluding VAT the VAT is added on top of the line total;
//! with prices including VAT it is extracted from it:
//!
//! - mode 1: `vat = round(total × rate / 100)`
//! - mode 2: `vat = round(total × rate / (100 + rate))`

use std::collections::BTreeMap;

use diacamma_shared::types::{BillId, CurrencyFormat, DetailId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::InvoiceError;
use super::types::{Article, Detail, InvoiceParams, VatMode};

impl Detail {
    /// Line pre-filled from an article.
    #[must_use]
    pub fn from_article(bill_id: BillId, article: &Article, vat_rate: Decimal, quantity: Decimal) -> Self {
        Self {
            id: DetailId::new(),
            bill_id,
            article_id: Some(article.id),
            designation: article.designation.clone(),
            price: article.price,
            unit: article.unit.clone(),
            quantity,
            reduce: Decimal::ZERO,
            vat_rate,
            storagearea_id: None,
        }
    }

    /// `price × quantity`, currency rounded.
    #[must_use]
    pub fn gross(&self, currency: &CurrencyFormat) -> Decimal {
        currency.round(self.price * self.quantity)
    }

    /// `gross − reduce`.
    #[must_use]
    pub fn total(&self, currency: &CurrencyFormat) -> Decimal {
        self.gross(currency) - currency.round(self.reduce)
    }

    /// VAT of the line.
    #[must_use]
    pub fn vat_amount(&self, mode: VatMode, currency: &CurrencyFormat) -> Decimal {
        let total = self.total(currency);
        match mode {
            VatMode::NoVat => Decimal::ZERO,
            VatMode::PriceExcludingVat => currency.round(total * self.vat_rate / Decimal::ONE_HUNDRED),
            VatMode::PriceIncludingVat => {
                currency.round(total * self.vat_rate / (Decimal::ONE_HUNDRED + self.vat_rate))
            }
        }
    }

    /// Line total without VAT.
    #[must_use]
    pub fn total_excltax(&self, mode: VatMode, currency: &CurrencyFormat) -> Decimal {
        match mode {
            VatMode::PriceIncludingVat => self.total(currency) - self.vat_amount(mode, currency),
            VatMode::NoVat | VatMode::PriceExcludingVat => self.total(currency),
        }
    }

    /// Line total with VAT.
    #[must_use]
    pub fn total_incltax(&self, mode: VatMode, currency: &CurrencyFormat) -> Decimal {
        match mode {
            VatMode::PriceExcludingVat => self.total(currency) + self.vat_amount(mode, currency),
            VatMode::NoVat | VatMode::PriceIncludingVat => self.total(currency),
        }
    }

    /// Amount credited to the sell account: the gross, VAT removed when prices include it.
    #[must_use]
    pub fn sell_amount(&self, mode: VatMode, currency: &CurrencyFormat) -> Decimal {
        match mode {
            VatMode::PriceIncludingVat => self.gross(currency) - self.vat_amount(mode, currency),
            VatMode::NoVat | VatMode::PriceExcludingVat => self.gross(currency),
        }
    }

    /// Checks quantity, price and reduction.
    pub fn validate(&self, currency: &CurrencyFormat) -> Result<(), InvoiceError> {
        if self.quantity <= Decimal::ZERO {
            return Err(InvoiceError::InvalidQuantity);
        }
        if self.price < Decimal::ZERO {
            return Err(InvoiceError::NegativePrice);
        }
        let gross = self.gross(currency);
        if self.reduce < Decimal::ZERO || self.reduce > gross {
            return Err(InvoiceError::InvalidReduce {
                reduce: self.reduce,
                gross,
            });
        }
        Ok(())
    }

    /// Reduction as a percentage of the gross.
    #[must_use]
    pub fn reduce_ratio(&self, currency: &CurrencyFormat) -> Decimal {
        let gross = self.gross(currency);
        if gross.is_zero() {
            Decimal::ZERO
        } else {
            (self.reduce * Decimal::ONE_HUNDRED / gross).round_dp(2)
        }
    }
}

/// VAT collected at one rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatLine {
    /// Rate in percent.
    pub rate: Decimal,
    /// VAT amount.
    pub amount: Decimal,
}

/// Totals of a document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BillTotals {
    /// Sum of line gross amounts.
    pub total_gross: Decimal,
    /// Sum of reductions.
    pub total_reduce: Decimal,
    /// Total without VAT.
    pub total_excltax: Decimal,
    /// VAT.
    pub total_vat: Decimal,
    /// Total with VAT.
    pub total_incltax: Decimal,
    /// VAT per rate, zero rates omitted.
    pub vat_list: Vec<VatLine>,
}

impl BillTotals {
    /// Sums the lines of a document.
    #[must_use]
    pub fn compute(details: &[Detail], params: &InvoiceParams) -> Self {
        let currency = &params.currency;
        let mode = params.vat_mode;
        let mut totals = Self::default();
        let mut by_rate: BTreeMap<Decimal, Decimal> = BTreeMap::new();
        for detail in details {
            totals.total_gross += detail.gross(currency);
            totals.total_reduce += currency.round(detail.reduce);
            totals.total_excltax += detail.total_excltax(mode, currency);
            totals.total_incltax += detail.total_incltax(mode, currency);
            let vat = detail.vat_amount(mode, currency);
            totals.total_vat += vat;
            if !vat.is_zero() {
                *by_rate.entry(detail.vat_rate.normalize()).or_default() += vat;
            }
        }
        totals.vat_list = by_rate
            .into_iter()
            .map(|(rate, amount)| VatLine { rate, amount })
            .collect();
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn detail(price: Decimal, quantity: Decimal, reduce: Decimal, vat_rate: Decimal) -> Detail {
        Detail {
            id: DetailId::new(),
            bill_id: BillId::new(),
            article_id: None,
            designation: "article".into(),
            price,
            unit: String::new(),
            quantity,
            reduce,
            vat_rate,
            storagearea_id: None,
        }
    }

    fn sample() -> Vec<Detail> {
        vec![
            detail(dec!(22.50), dec!(3), dec!(5), dec!(0)),
            detail(dec!(3.25), dec!(7), dec!(0), dec!(5)),
            detail(dec!(11.10), dec!(2), dec!(0), dec!(0)),
            detail(dec!(6.33), dec!(3.25), dec!(0), dec!(20)),
        ]
    }

    fn params(vat_mode: VatMode) -> InvoiceParams {
        InvoiceParams {
            vat_mode,
            ..InvoiceParams::default()
        }
    }

    #[test]
    fn test_line_amounts() {
        let currency = CurrencyFormat::default();
        let line = detail(dec!(22.50), dec!(3), dec!(5), dec!(0));
        assert_eq!(line.gross(&currency), dec!(67.50));
        assert_eq!(line.total(&currency), dec!(62.50));
        assert_eq!(line.reduce_ratio(&currency), dec!(7.41));
        let line = detail(dec!(6.33), dec!(3.25), dec!(0), dec!(20));
        assert_eq!(line.gross(&currency), dec!(20.57));
    }

    #[test]
    fn test_vat_excluding_prices() {
        let currency = CurrencyFormat::default();
        let lines = sample();
        assert_eq!(lines[1].vat_amount(VatMode::PriceExcludingVat, &currency), dec!(1.14));
        assert_eq!(lines[3].vat_amount(VatMode::PriceExcludingVat, &currency), dec!(4.11));

        let totals = BillTotals::compute(&lines, &params(VatMode::PriceExcludingVat));
        assert_eq!(totals.total_excltax, dec!(128.02));
        assert_eq!(totals.total_vat, dec!(5.25));
        assert_eq!(totals.total_incltax, dec!(133.27));
        assert_eq!(totals.total_reduce, dec!(5));
        assert_eq!(totals.vat_list.len(), 2);
    }

    #[test]
    fn test_vat_including_prices() {
        let currency = CurrencyFormat::default();
        let lines = sample();
        assert_eq!(lines[1].vat_amount(VatMode::PriceIncludingVat, &currency), dec!(1.08));
        assert_eq!(lines[3].vat_amount(VatMode::PriceIncludingVat, &currency), dec!(3.43));

        let totals = BillTotals::compute(&lines, &params(VatMode::PriceIncludingVat));
        assert_eq!(totals.total_incltax, dec!(128.02));
        assert_eq!(totals.total_vat, dec!(4.51));
        assert_eq!(totals.total_excltax, dec!(123.51));
        assert_eq!(lines[3].sell_amount(VatMode::PriceIncludingVat, &currency), dec!(17.14));
    }

    #[test]
    fn test_no_vat() {
        let totals = BillTotals::compute(&sample(), &params(VatMode::NoVat));
        assert_eq!(totals.total_vat, dec!(0));
        assert_eq!(totals.total_excltax, totals.total_incltax);
        assert!(totals.vat_list.is_empty());
    }

    #[test]
    fn test_validate_line() {
        let currency = CurrencyFormat::default();
        assert!(detail(dec!(10), dec!(2), dec!(20), dec!(0)).validate(&currency).is_ok());
        assert_eq!(
            detail(dec!(10), dec!(2), dec!(20.01), dec!(0)).validate(&currency),
            Err(InvoiceError::InvalidReduce {
                reduce: dec!(20.01),
                gross: dec!(20.00)
            })
        );
        assert_eq!(
            detail(dec!(10), dec!(0), dec!(0), dec!(0)).validate(&currency),
            Err(InvoiceError::InvalidQuantity)
        );
        assert_eq!(
            detail(dec!(-1), dec!(1), dec!(0), dec!(0)).validate(&currency),
            Err(InvoiceError::NegativePrice)
        );
    }
}
