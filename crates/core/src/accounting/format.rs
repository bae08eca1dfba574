//! Amount rendering for lists and reports.

use diacamma_shared::types::CurrencyFormat;
use rust_decimal::Decimal;

/// Renders a signed amount (positive = credit).
///
/// | mode | `25.45`            | `-25.45`           |
/// |------|--------------------|--------------------|
/// | 0    | `25.45€`           | (empty)            |
/// | 1    | `Credit: 25.45€`   | `Debit: 25.45€`    |
/// | 2    | coloured mode 1    | coloured mode 1    |
/// | 3    | `25.45`            | `-25.45`           |
/// | 4    | `25.45€`           | `25.45€`           |
/// | 5+   | `25.45€`           | `-25.45€`          |
///
/// Amounts below a tenth of the last decimal render as zero.
#[must_use]
pub fn format_devise(amount: Decimal, mode: u8, currency: &CurrencyFormat) -> String {
    let amount = if currency.is_negligible(amount) {
        Decimal::ZERO
    } else {
        amount
    };
    let is_credit = amount >= Decimal::ZERO;

    match mode {
        0 => {
            if amount > Decimal::ZERO {
                format!("{}{}", currency.to_fixed(amount), currency.symbol)
            } else {
                String::new()
            }
        }
        1 | 2 => {
            let side = if is_credit { "Credit" } else { "Debit" };
            let text = format!("{side}: {}{}", currency.to_fixed(amount.abs()), currency.symbol);
            if mode == 2 {
                let color = if is_credit { "green" } else { "blue" };
                format!("<font color=\"{color}\">{text}</font>")
            } else {
                text
            }
        }
        3 => currency.to_fixed(amount),
        4 => format!("{}{}", currency.to_fixed(amount.abs()), currency.symbol),
        _ => format!("{}{}", currency.to_fixed(amount), currency.symbol),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(25.45), 0, "25.45€")]
    #[case(dec!(-25.45), 0, "")]
    #[case(dec!(0), 0, "")]
    #[case(dec!(25.45), 1, "Credit: 25.45€")]
    #[case(dec!(-25.45), 1, "Debit: 25.45€")]
    #[case(dec!(0), 1, "Credit: 0.00€")]
    #[case(dec!(25.45), 2, "<font color=\"green\">Credit: 25.45€</font>")]
    #[case(dec!(-25.45), 2, "<font color=\"blue\">Debit: 25.45€</font>")]
    #[case(dec!(-25.45), 3, "-25.45")]
    #[case(dec!(-25.45), 4, "25.45€")]
    #[case(dec!(-25.45), 5, "-25.45€")]
    #[case(dec!(0.0004), 5, "0.00€")]
    #[case(dec!(-0.0004), 1, "Credit: 0.00€")]
    fn test_format_devise(#[case] amount: Decimal, #[case] mode: u8, #[case] expected: &str) {
        assert_eq!(format_devise(amount, mode, &CurrencyFormat::default()), expected);
    }

    #[test]
    fn test_format_devise_precision() {
        let currency = CurrencyFormat::new("$", 3);
        assert_eq!(format_devise(dec!(1.5), 4, &currency), "1.500$");
    }
}
