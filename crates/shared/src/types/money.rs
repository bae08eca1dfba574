//! Currency amounts with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount is a `rust_decimal::Decimal` rounded to the currency precision.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Rounds an amount to the currency precision, halves away from zero.
#[must_use]
pub fn round_currency(amount: Decimal, precision: u32) -> Decimal {
    amount.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
}

/// Display settings of the bookkeeping currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    /// Symbol appended to amounts (e.g. "€").
    pub symbol: String,
    /// Number of decimals.
    pub precision: u32,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "€".to_string(),
            precision: 2,
        }
    }
}

impl CurrencyFormat {
    /// Creates a currency format.
    #[must_use]
    pub fn new(symbol: impl Into<String>, precision: u32) -> Self {
        Self {
            symbol: symbol.into(),
            precision,
        }
    }

    /// Smallest amount considered different from zero (a tenth of a unit of the last decimal).
    #[must_use]
    pub fn epsilon(&self) -> Decimal {
        Decimal::new(1, self.precision + 1)
    }

    /// Returns true if the amount is too small to be displayed.
    #[must_use]
    pub fn is_negligible(&self, amount: Decimal) -> bool {
        amount.abs() < self.epsilon()
    }

    /// Rounds an amount to this currency.
    #[must_use]
    pub fn round(&self, amount: Decimal) -> Decimal {
        round_currency(amount, self.precision)
    }

    /// Renders an amount with the configured number of decimals.
    #[must_use]
    pub fn to_fixed(&self, amount: Decimal) -> String {
        let mut rounded = self.round(amount);
        rounded.rescale(self.precision);
        rounded.to_string()
    }
}
