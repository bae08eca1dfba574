//! Property-based tests for payoff repartition.
//!
//! - Shares always add up to the paid amount
//! - Paying by date never gives an older document more than its rest
//! - The payment entry is balanced and its third lines carry the shares

use chrono::NaiveDate;
use diacamma_shared::types::{BillId, CurrencyFormat, EntryId, FiscalYearId, ThirdId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::{PayoffContext, PayoffService};
use super::types::{PayoffInput, PayoffMode, Repartition, Supporting};
use crate::accounting::{AccountingParams, FiscalYear, FiscalYearStatus};

fn supporting(index: usize, rest_cents: i64, day: u32) -> Supporting {
    Supporting {
        id: BillId::new(),
        designation: format!("bill A-{index}"),
        date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        third_id: ThirdId::new(),
        third_account: "411".into(),
        total_to_pay: Decimal::new(rest_cents, 2),
        is_revenue: true,
        is_payable: true,
        entry_id: Some(EntryId::new()),
        cost_accounting_id: None,
        payoffs: Vec::new(),
    }
}

fn documents() -> impl Strategy<Value = Vec<Supporting>> {
    proptest::collection::vec((1i64..100_000, 1u32..28), 1..6).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (rest, day))| supporting(i + 1, rest, day))
            .collect()
    })
}

fn repartition() -> impl Strategy<Value = Repartition> {
    prop_oneof![Just(Repartition::ByRest), Just(Repartition::ByDate)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_shares_sum_to_amount(
        docs in documents(),
        amount_cents in 1i64..1_000_000,
        mode in repartition(),
    ) {
        let refs: Vec<&Supporting> = docs.iter().collect();
        let amount = Decimal::new(amount_cents, 2);
        let shares = PayoffService::repartition(&refs, amount, mode, &CurrencyFormat::default());
        prop_assert_eq!(shares.len(), docs.len());
        prop_assert_eq!(shares.iter().copied().sum::<Decimal>(), amount);
    }

    #[test]
    fn prop_by_date_respects_rests(
        docs in documents(),
        amount_cents in 1i64..1_000_000,
    ) {
        let refs: Vec<&Supporting> = docs.iter().collect();
        let amount = Decimal::new(amount_cents, 2);
        let shares = PayoffService::repartition(&refs, amount, Repartition::ByDate, &CurrencyFormat::default());
        let newest = (0..docs.len()).max_by_key(|&i| docs[i].date).unwrap();
        let mut order: Vec<usize> = (0..docs.len()).collect();
        order.sort_by_key(|&i| docs[i].date);
        let last = order[docs.len() - 1];
        for (i, share) in shares.iter().enumerate() {
            prop_assert!(*share >= Decimal::ZERO);
            if i != last {
                prop_assert!(*share <= docs[i].rest_to_pay());
            }
        }
        prop_assert_eq!(docs[last].date, docs[newest].date);
    }

    #[test]
    fn prop_payment_entry_balanced(
        docs in documents(),
        percent in 1i64..=100,
        mode in repartition(),
    ) {
        let refs: Vec<&Supporting> = docs.iter().collect();
        let rest: Decimal = docs.iter().map(Supporting::rest_to_pay).sum();
        let amount = (rest * Decimal::new(percent, 2)).round_dp(2).max(Decimal::new(1, 2));
        let year = FiscalYear {
            id: FiscalYearId::new(),
            begin: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            status: FiscalYearStatus::Running,
            is_active: true,
            last_year_id: None,
            letter_index: 0,
        };
        let params = AccountingParams::default();
        let ctx = PayoffContext { year: &year, params: &params, bank_account: None, default_cost_accounting: None };
        let input = PayoffInput {
            amount,
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            mode: PayoffMode::Cash,
            payer: String::new(),
            reference: String::new(),
            bank_account_id: None,
            bank_fee: Decimal::ZERO,
            repartition: mode,
        };
        let group = PayoffService::multi_save(&refs, &input, &ctx).unwrap();
        prop_assert!(group.entry.is_balanced());
        let paid: Decimal = group.payoffs.iter().map(|p| p.amount).sum();
        prop_assert_eq!(paid, amount);
    }
}
