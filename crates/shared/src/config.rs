//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Bookkeeping parameters.
    #[serde(default)]
    pub accounting: AccountingConfig,
    /// Invoicing parameters.
    #[serde(default)]
    pub invoice: InvoiceConfig,
    /// Payment parameters.
    #[serde(default)]
    pub payoff: PayoffConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Bookkeeping parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountingConfig {
    /// Currency symbol appended to displayed amounts.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Number of decimals of the currency.
    #[serde(default = "default_precision")]
    pub currency_precision: u32,
    /// Account receiving cash payments.
    #[serde(default = "default_cash_account")]
    pub cash_account: String,
    /// Account receiving bank fees.
    #[serde(default = "default_bank_fee_account")]
    pub bank_fee_account: String,
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            currency_precision: default_precision(),
            cash_account: default_cash_account(),
            bank_fee_account: default_bank_fee_account(),
        }
    }
}

fn default_currency() -> String {
    "€".to_string()
}

fn default_precision() -> u32 {
    2
}

fn default_cash_account() -> String {
    "531".to_string()
}

fn default_bank_fee_account() -> String {
    "627".to_string()
}

/// Invoicing parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceConfig {
    /// 0: no VAT, 1: prices without VAT, 2: prices with VAT.
    #[serde(default)]
    pub vat_mode: u8,
    /// Sell account used by free lines (no article).
    #[serde(default = "default_sell_account")]
    pub default_sell_account: String,
    /// Account receiving line reductions.
    #[serde(default = "default_reduce_account")]
    pub reduce_account: String,
    /// Account receiving collected VAT.
    #[serde(default = "default_vat_sell_account")]
    pub vat_sell_account: String,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            vat_mode: 0,
            default_sell_account: default_sell_account(),
            reduce_account: default_reduce_account(),
            vat_sell_account: default_vat_sell_account(),
        }
    }
}

fn default_sell_account() -> String {
    "706".to_string()
}

fn default_reduce_account() -> String {
    "709".to_string()
}

fn default_vat_sell_account() -> String {
    "4455".to_string()
}

/// Payment parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PayoffConfig {
    /// PayPal IPN validation endpoint.
    #[serde(default = "default_paypal_url")]
    pub paypal_url: String,
}

impl Default for PayoffConfig {
    fn default() -> Self {
        Self {
            paypal_url: default_paypal_url(),
        }
    }
}

fn default_paypal_url() -> String {
    "https://www.paypal.com/cgi-bin/webscr".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DIACAMMA").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Parses configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid or incomplete.
    pub fn from_toml(content: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
