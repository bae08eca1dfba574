//! Payoff recording: validation, split across documents, payment entries,
//! internal settlements and automatic lettering.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use diacamma_shared::types::{BillId, CostAccountingId, CurrencyFormat, EntryId, PayoffId, ThirdId};
use rust_decimal::Decimal;

use super::error::PayoffError;
use super::supporting::PayoffBounds;
use super::types::{BankAccount, Payoff, PayoffInput, PayoffMode, Repartition, Supporting};
use crate::accounting::{AccountingParams, Entry, EntryLine, FiscalService, FiscalYear, Journal};

/// Accounting context of a payoff.
pub struct PayoffContext<'a> {
    /// Fiscal year of the payoff date.
    pub year: &'a FiscalYear,
    /// Cash and fee accounts, currency.
    pub params: &'a AccountingParams,
    /// Selected bank account.
    pub bank_account: Option<&'a BankAccount>,
    /// Default cost accounting, used for bank fees.
    pub default_cost_accounting: Option<CostAccountingId>,
}

/// Payoffs of one save with their shared payment entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PayoffGroup {
    /// One payoff per document.
    pub payoffs: Vec<Payoff>,
    /// Payment entry.
    pub entry: Entry,
}

/// What deleting a payoff involves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoffDeletion {
    /// Payoffs sharing the payment entry, or the internal pair.
    pub payoff_ids: Vec<PayoffId>,
    /// Payment entry to delete.
    pub entry_id: Option<EntryId>,
}

/// Payoff rules.
pub struct PayoffService;

impl PayoffService {
    /// Checks a payoff form against the documents it pays.
    pub fn validate_input(
        supportings: &[&Supporting],
        input: &PayoffInput,
        ctx: &PayoffContext<'_>,
    ) -> Result<(), PayoffError> {
        if supportings.is_empty() {
            return Err(PayoffError::NoSupporting);
        }
        if let Some(s) = supportings.iter().find(|s| !s.is_payable) {
            return Err(PayoffError::NotPayable(s.id));
        }
        if input.mode == PayoffMode::Internal {
            return Err(PayoffError::InternalModeReserved);
        }
        if input.amount.is_zero() {
            return Err(PayoffError::ZeroAmount);
        }
        let rest: Decimal = supportings.iter().map(|s| s.rest_to_pay()).sum();
        let bounds = PayoffBounds::for_rest(rest);
        if !bounds.contains(input.amount) {
            return Err(PayoffError::AmountOutOfBounds {
                amount: input.amount,
                min: bounds.min,
                max: bounds.max,
            });
        }
        if input.mode.needs_bank() {
            let bank = ctx
                .bank_account
                .filter(|b| Some(b.id) == input.bank_account_id)
                .ok_or(PayoffError::BankAccountRequired)?;
            if bank.is_disabled {
                return Err(PayoffError::BankAccountDisabled(bank.designation.clone()));
            }
        }
        if input.bank_fee < Decimal::ZERO || (!input.bank_fee.is_zero() && input.bank_fee >= input.amount.abs()) {
            return Err(PayoffError::InvalidFee {
                fee: input.bank_fee,
                amount: input.amount,
            });
        }
        FiscalService::check_date(ctx.year, input.date)?;
        Ok(())
    }

    /// Splits an amount over documents, returned in the order given.
    ///
    /// `ByRest` shares in proportion to each rest, the last document taking
    /// the rounding difference. `ByDate` pays the oldest documents first up to
    /// their rest; the newest takes whatever remains.
    #[must_use]
    pub fn repartition(
        supportings: &[&Supporting],
        amount: Decimal,
        repartition: Repartition,
        currency: &CurrencyFormat,
    ) -> Vec<Decimal> {
        let count = supportings.len();
        if count == 0 {
            return Vec::new();
        }
        let rests: Vec<Decimal> = supportings
            .iter()
            .map(|s| s.rest_to_pay().max(Decimal::ZERO))
            .collect();
        let mut shares = vec![Decimal::ZERO; count];
        match repartition {
            Repartition::ByRest => {
                let total_rest: Decimal = rests.iter().sum();
                if total_rest > Decimal::ZERO {
                    for (share, rest) in shares.iter_mut().zip(&rests).take(count - 1) {
                        *share = currency.round(amount * *rest / total_rest);
                    }
                }
                let given: Decimal = shares.iter().sum();
                shares[count - 1] = amount - given;
            }
            Repartition::ByDate => {
                let mut order: Vec<usize> = (0..count).collect();
                order.sort_by_key(|&i| supportings[i].date);
                let mut remaining = amount;
                for &index in &order[..count - 1] {
                    let share = remaining.min(rests[index]).max(Decimal::ZERO);
                    shares[index] = share;
                    remaining -= share;
                }
                shares[order[count - 1]] = remaining;
            }
        }
        shares
    }

    /// Payment entry of a payoff group: third lines per (third, account),
    /// the treasury line net of fees and the fee line.
    pub fn generate_entry(
        shares: &[(&Supporting, Decimal)],
        input: &PayoffInput,
        ctx: &PayoffContext<'_>,
    ) -> Result<Entry, PayoffError> {
        let designation = shares
            .iter()
            .map(|(s, _)| s.designation.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let mut entry = Entry::new(ctx.year.id, Journal::PAYMENT, input.date, format!("payment of {designation}"));

        let mut third_total = Decimal::ZERO;
        let mut keys: Vec<(ThirdId, &str, Decimal)> = Vec::new();
        for (supporting, amount) in shares {
            let signed = if supporting.is_revenue { *amount } else { -*amount };
            third_total += signed;
            match keys
                .iter_mut()
                .find(|(t, a, _)| *t == supporting.third_id && *a == supporting.third_account)
            {
                Some((_, _, sum)) => *sum += signed,
                None => keys.push((supporting.third_id, supporting.third_account.as_str(), signed)),
            }
        }
        for (third_id, account, amount) in keys.into_iter().filter(|(_, _, a)| !a.is_zero()) {
            entry.lines.push(EntryLine::new(account, amount).with_third(third_id));
        }

        let treasury = if input.mode == PayoffMode::Cash {
            ctx.params.cash_account.clone()
        } else {
            ctx.bank_account
                .map(|b| b.account_code.clone())
                .ok_or(PayoffError::BankAccountRequired)?
        };
        let mut treasury_line = EntryLine::new(treasury, input.bank_fee - third_total);
        if !input.reference.is_empty() {
            treasury_line = treasury_line.with_reference(input.reference.clone());
        }
        entry.lines.push(treasury_line);

        if !input.bank_fee.is_zero() {
            entry.lines.push(EntryLine::new(ctx.params.bank_fee_account.clone(), -input.bank_fee));
            entry.costaccounting_id = ctx.default_cost_accounting.or_else(|| {
                shares
                    .iter()
                    .max_by_key(|(_, amount)| amount.abs())
                    .and_then(|(s, _)| s.cost_accounting_id)
            });
        }
        Ok(entry)
    }

    /// Records one payoff per document, splitting the amount, with a single
    /// payment entry for the group.
    pub fn multi_save(
        supportings: &[&Supporting],
        input: &PayoffInput,
        ctx: &PayoffContext<'_>,
    ) -> Result<PayoffGroup, PayoffError> {
        Self::validate_input(supportings, input, ctx)?;
        let amounts = Self::repartition(supportings, input.amount, input.repartition, &ctx.params.currency);
        let shares: Vec<(&Supporting, Decimal)> = supportings
            .iter()
            .copied()
            .zip(amounts)
            .filter(|(_, amount)| !amount.is_zero())
            .collect();
        let entry = Self::generate_entry(&shares, input, ctx)?;

        let mut fee_left = input.bank_fee;
        let last = shares.len().saturating_sub(1);
        let payoffs = shares
            .iter()
            .enumerate()
            .map(|(index, (supporting, amount))| {
                // fee spread like the amount, the last payoff taking the remainder
                let fee = if index == last {
                    fee_left
                } else {
                    ctx.params.currency.round(input.bank_fee * *amount / input.amount)
                };
                fee_left -= fee;
                Payoff {
                    id: PayoffId::new(),
                    supporting_id: supporting.id,
                    date: input.date,
                    amount: *amount,
                    mode: input.mode,
                    payer: input.payer.clone(),
                    reference: input.reference.clone(),
                    bank_account_id: if input.mode.needs_bank() { input.bank_account_id } else { None },
                    bank_fee: fee,
                    entry_id: Some(entry.id),
                    linked_payoff_id: None,
                }
            })
            .collect();
        Ok(PayoffGroup { payoffs, entry })
    }

    /// Settles a credit note against a bill of the same third. The amount is
    /// the smaller rest; both payoffs mirror each other and post nothing.
    pub fn internal_payoff(
        source: &Supporting,
        linked: &Supporting,
        date: NaiveDate,
        year: &FiscalYear,
    ) -> Result<(Payoff, Payoff), PayoffError> {
        if source.third_id != linked.third_id || source.is_revenue == linked.is_revenue {
            return Err(PayoffError::InvalidInternalPair);
        }
        for supporting in [source, linked] {
            if !supporting.is_payable {
                return Err(PayoffError::NotPayable(supporting.id));
            }
        }
        FiscalService::check_date(year, date)?;
        let amount = source.rest_to_pay().min(linked.rest_to_pay());
        if amount <= Decimal::ZERO {
            return Err(PayoffError::ZeroAmount);
        }
        let pay = |on: &Supporting, other: &Supporting, id: PayoffId, linked_id: PayoffId| Payoff {
            id,
            supporting_id: on.id,
            date,
            amount,
            mode: PayoffMode::Internal,
            payer: String::new(),
            reference: other.reference_label(),
            bank_account_id: None,
            bank_fee: Decimal::ZERO,
            entry_id: None,
            linked_payoff_id: Some(linked_id),
        };
        let (first, second) = (PayoffId::new(), PayoffId::new());
        Ok((pay(source, linked, first, second), pay(linked, source, second, first)))
    }

    /// Documents connected to `start` through shared payment entries or
    /// internal payoffs.
    #[must_use]
    pub fn connected(start: BillId, supportings: &[Supporting]) -> Vec<&Supporting> {
        let mut seen: BTreeSet<BillId> = BTreeSet::new();
        let mut queue = vec![start];
        let mut found = Vec::new();
        while let Some(id) = queue.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(current) = supportings.iter().find(|s| s.id == id) else {
                continue;
            };
            found.push(current);
            for payoff in &current.payoffs {
                for other in supportings.iter().filter(|s| !seen.contains(&s.id)) {
                    let shares_entry = payoff.entry_id.is_some()
                        && other.payoffs.iter().any(|p| p.entry_id == payoff.entry_id);
                    let mirrored = payoff
                        .linked_payoff_id
                        .is_some_and(|l| other.payoffs.iter().any(|p| p.id == l));
                    if shares_entry || mirrored {
                        queue.push(other.id);
                    }
                }
            }
        }
        found
    }

    /// Entries to letter together once every connected document is settled;
    /// `None` while something remains to pay.
    #[must_use]
    pub fn lettering_entries(start: BillId, supportings: &[Supporting]) -> Option<Vec<EntryId>> {
        let group = Self::connected(start, supportings);
        if group.is_empty() || group.iter().any(|s| !s.rest_to_pay().is_zero()) {
            return None;
        }
        let mut entries: Vec<EntryId> = Vec::new();
        for supporting in &group {
            let ids = supporting
                .entry_id
                .into_iter()
                .chain(supporting.payoffs.iter().filter_map(|p| p.entry_id));
            for id in ids {
                if !entries.contains(&id) {
                    entries.push(id);
                }
            }
        }
        (entries.len() >= 2).then_some(entries)
    }

    /// Checks a payoff can be deleted and lists what goes with it.
    pub fn validate_delete(
        payoff: &Payoff,
        all_payoffs: &[Payoff],
        entry: Option<&Entry>,
    ) -> Result<PayoffDeletion, PayoffError> {
        if entry.is_some_and(|e| e.close) {
            return Err(PayoffError::PayoffEntryClosed(payoff.id));
        }
        let mut payoff_ids = vec![payoff.id];
        for other in all_payoffs.iter().filter(|p| p.id != payoff.id) {
            let same_entry = payoff.entry_id.is_some() && other.entry_id == payoff.entry_id;
            if same_entry || payoff.linked_payoff_id == Some(other.id) {
                payoff_ids.push(other.id);
            }
        }
        Ok(PayoffDeletion {
            payoff_ids,
            entry_id: payoff.entry_id,
        })
    }
}
