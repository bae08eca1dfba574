//! Conversion of the application configuration into core parameters.

use diacamma_core::accounting::AccountingParams;
use diacamma_core::invoice::{InvoiceParams, VatMode};
use diacamma_shared::AppConfig;
use diacamma_shared::types::CurrencyFormat;

/// Cash and fee accounts with the configured currency.
#[must_use]
pub fn accounting_params(config: &AppConfig) -> AccountingParams {
    AccountingParams {
        cash_account: config.accounting.cash_account.clone(),
        bank_fee_account: config.accounting.bank_fee_account.clone(),
        currency: currency(config),
    }
}

/// VAT mode and posting accounts of documents.
#[must_use]
pub fn invoice_params(config: &AppConfig) -> InvoiceParams {
    InvoiceParams {
        vat_mode: VatMode::from_code(config.invoice.vat_mode),
        default_sell_account: config.invoice.default_sell_account.clone(),
        reduce_account: config.invoice.reduce_account.clone(),
        vat_sell_account: config.invoice.vat_sell_account.clone(),
        currency: currency(config),
    }
}

fn currency(config: &AppConfig) -> CurrencyFormat {
    CurrencyFormat::new(config.accounting.currency.clone(), config.accounting.currency_precision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_follow_config() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            [database]
            url = "postgres://localhost/diacamma"
            [accounting]
            currency = "$"
            currency_precision = 3
            cash_account = "530"
            [invoice]
            vat_mode = 2
            "#,
        )
        .unwrap();
        let accounting = accounting_params(&config);
        assert_eq!(accounting.cash_account, "530");
        assert_eq!(accounting.bank_fee_account, "627");
        let invoice = invoice_params(&config);
        assert_eq!(invoice.vat_mode, VatMode::PriceIncludingVat);
        assert_eq!(invoice.currency, accounting.currency);
    }
}
