//! Payable documents: what was paid, what remains.

use rust_decimal::Decimal;

use super::types::{Payoff, Supporting};
use crate::invoice::{Bill, BillService, BillTotals, Detail, InvoiceParams};

/// Accepted payoff amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoffBounds {
    /// Lowest amount.
    pub min: Decimal,
    /// Highest amount.
    pub max: Decimal,
}

impl PayoffBounds {
    /// Bounds for a rest to pay: at least a cent (or the rest itself when
    /// overpaid), at most a hundred times the rest.
    #[must_use]
    pub fn for_rest(rest: Decimal) -> Self {
        let min = if rest < Decimal::ZERO { rest } else { Decimal::new(1, 2) };
        Self {
            min,
            max: Decimal::ONE_HUNDRED * rest.abs(),
        }
    }

    /// Returns true when the amount is accepted.
    #[must_use]
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min && amount <= self.max
    }
}

impl Supporting {
    /// Payment view of a posted document.
    #[must_use]
    pub fn from_bill(
        bill: &Bill,
        details: &[Detail],
        third_account: impl Into<String>,
        params: &InvoiceParams,
        payoffs: Vec<Payoff>,
    ) -> Option<Self> {
        Some(Self {
            id: bill.id,
            designation: bill.designation(),
            date: bill.date,
            third_id: bill.third_id?,
            third_account: third_account.into(),
            total_to_pay: BillTotals::compute(details, params).total_incltax,
            is_revenue: bill.bill_type.is_revenue(),
            is_payable: BillService::is_payable(bill),
            entry_id: bill.entry_id,
            cost_accounting_id: bill.cost_accounting_id,
            payoffs,
        })
    }

    /// Sum of recorded payoffs.
    #[must_use]
    pub fn total_payed(&self) -> Decimal {
        self.payoffs.iter().map(|p| p.amount).sum()
    }

    /// `total_to_pay − total_payed`; negative when overpaid.
    #[must_use]
    pub fn rest_to_pay(&self) -> Decimal {
        self.total_to_pay - self.total_payed()
    }

    /// Bounds of a new payoff.
    #[must_use]
    pub fn payoff_bounds(&self) -> PayoffBounds {
        PayoffBounds::for_rest(self.rest_to_pay())
    }

    /// Label used as reference of internal payoffs: `"bill A-1 - 2015-04-01"`.
    #[must_use]
    pub fn reference_label(&self) -> String {
        format!("{} - {}", self.designation, self.date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{BillStatus, BillType};
    use crate::payoff::types::PayoffMode;
    use chrono::NaiveDate;
    use diacamma_shared::types::{BillId, DetailId, PayoffId, ThirdId};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn payoff(amount: Decimal) -> Payoff {
        Payoff {
            id: PayoffId::new(),
            supporting_id: BillId::new(),
            date: NaiveDate::from_ymd_opt(2015, 4, 3).unwrap(),
            amount,
            mode: PayoffMode::Cash,
            payer: String::new(),
            reference: String::new(),
            bank_account_id: None,
            bank_fee: Decimal::ZERO,
            entry_id: None,
            linked_payoff_id: None,
        }
    }

    #[rstest]
    #[case(dec!(150), dec!(0.01), dec!(15000))]
    #[case(dec!(-20), dec!(-20), dec!(2000))]
    #[case(dec!(0), dec!(0.01), dec!(0))]
    fn test_bounds(#[case] rest: Decimal, #[case] min: Decimal, #[case] max: Decimal) {
        assert_eq!(PayoffBounds::for_rest(rest), PayoffBounds { min, max });
    }

    #[test]
    fn test_from_bill_and_rest() {
        let mut bill = Bill::new(BillType::Bill, NaiveDate::from_ymd_opt(2015, 4, 1).unwrap(), Some(ThirdId::new()));
        bill.status = BillStatus::Valid;
        bill.num_txt = Some("A-1".into());
        let details = vec![Detail {
            id: DetailId::new(),
            bill_id: bill.id,
            article_id: None,
            designation: "article 0".into(),
            price: dec!(100),
            unit: String::new(),
            quantity: dec!(1),
            reduce: Decimal::ZERO,
            vat_rate: Decimal::ZERO,
            storagearea_id: None,
        }];
        let supporting = Supporting::from_bill(
            &bill,
            &details,
            "411",
            &InvoiceParams::default(),
            vec![payoff(dec!(80)), payoff(dec!(40))],
        )
        .unwrap();
        assert!(supporting.is_payable);
        assert!(supporting.is_revenue);
        assert_eq!(supporting.total_payed(), dec!(120));
        assert_eq!(supporting.rest_to_pay(), dec!(-20));
        assert!(supporting.payoff_bounds().contains(dec!(-20)));
        assert_eq!(supporting.reference_label(), "bill A-1 - 2015-04-01");

        let mut anonymous = bill.clone();
        anonymous.third_id = None;
        assert!(Supporting::from_bill(&anonymous, &details, "411", &InvoiceParams::default(), vec![]).is_none());
    }
}
