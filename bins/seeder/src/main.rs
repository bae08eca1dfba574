//! Database seeder for Diacamma development and testing.
//!
//! Seeds a fiscal year for the current calendar year with a small French
//! chart of accounts, VAT rates, a bank account, a storage area, a few
//! articles and customers. Does nothing when a fiscal year already exists.
//!
//! Usage: cargo run --bin seeder

use chrono::{Datelike, NaiveDate, Utc};
use diacamma_core::invoice::{CategoryBill, Stockable, Vat};
use diacamma_core::payoff::BankAccount;
use diacamma_core::storage::StorageArea;
use diacamma_db::repositories::{ArticleInput, CreateThirdInput, CreateYearInput};
use diacamma_db::{ArticleRepository, FiscalRepository, PayoffRepository, StorageRepository, ThirdRepository};
use diacamma_shared::AppConfig;
use diacamma_shared::types::{BankAccountId, CategoryBillId, StorageAreaId, VatId};
use rust_decimal::Decimal;

/// Accounts of the seeded chart.
const CHART: [(&str, &str); 14] = [
    ("106", "Reserves"),
    ("110", "Retained earnings (credit)"),
    ("119", "Retained earnings (debit)"),
    ("120", "Result (profit)"),
    ("129", "Result (loss)"),
    ("401", "Suppliers"),
    ("411", "Customers"),
    ("4455", "VAT to pay"),
    ("512", "Bank"),
    ("531", "Cash"),
    ("601", "Purchases"),
    ("627", "Bank fees"),
    ("706", "Services"),
    ("709", "Discounts granted"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")?;
    let config = AppConfig::load()?;

    println!("Connecting to database...");
    let db = diacamma_db::connect(&database_url).await?;

    let fiscal = FiscalRepository::new(db.clone());
    if !fiscal.list_years().await?.is_empty() {
        println!("  Fiscal years already exist, skipping...");
        return Ok(());
    }

    println!("Seeding fiscal year and chart...");
    let today = Utc::now().date_naive();
    let begin = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
    let end = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
    let year = fiscal
        .create_year(
            CreateYearInput {
                begin: Some(begin),
                end: Some(end),
            },
            today,
        )
        .await?;
    for (code, name) in CHART {
        fiscal.add_account(year.id, code, name).await?;
    }

    println!("Seeding catalog...");
    let catalog = ArticleRepository::new(db.clone());
    let standard = Vat {
        id: VatId::new(),
        name: "Standard rate".to_string(),
        rate: Decimal::new(20, 0),
        is_active: true,
    };
    catalog.save_vat(&standard).await?;
    catalog
        .save_vat(&Vat {
            id: VatId::new(),
            name: "Reduced rate".to_string(),
            rate: Decimal::new(55, 1),
            is_active: true,
        })
        .await?;
    catalog
        .save_category_bill(&CategoryBill {
            id: CategoryBillId::new(),
            name: "Standard".to_string(),
            prefix_numbering: String::new(),
            special_numbering: false,
            is_default: true,
        })
        .await?;
    for (reference, designation, price, stockable) in [
        ("SRV-01", "Consulting hour", Decimal::new(6000, 2), Stockable::No),
        ("ART-01", "Notebook", Decimal::new(450, 2), Stockable::Yes),
        ("ART-02", "Pen", Decimal::new(120, 2), Stockable::Yes),
    ] {
        catalog
            .create_article(ArticleInput {
                reference: reference.to_string(),
                designation: designation.to_string(),
                price,
                unit: String::new(),
                sell_account: "706".to_string(),
                vat_id: Some(standard.id),
                stockable,
                category_ids: Vec::new(),
            })
            .await?;
    }

    println!("Seeding storage area...");
    StorageRepository::new(db.clone(), diacamma_db::accounting_params(&config).currency)
        .save_area(&StorageArea {
            id: StorageAreaId::new(),
            name: "Main".to_string(),
            designation: "Main warehouse".to_string(),
        })
        .await?;

    println!("Seeding bank account...");
    PayoffRepository::new(
        db.clone(),
        diacamma_db::accounting_params(&config),
        diacamma_db::invoice_params(&config),
    )
    .save_bank_account(&BankAccount {
        id: BankAccountId::new(),
        designation: "Current account".to_string(),
        reference: "FR76 3000 6000 0112 3456 7890 189".to_string(),
        account_code: "512".to_string(),
        is_disabled: false,
    })
    .await?;

    println!("Seeding customers...");
    let thirds = ThirdRepository::new(db);
    for contact in ["Dalton Jack", "Dalton Joe", "Luke Lucky"] {
        thirds
            .create(CreateThirdInput {
                contact: contact.to_string(),
                accounts: vec!["411".to_string()],
                ..Default::default()
            })
            .await?;
    }

    println!("Seeding complete!");
    Ok(())
}
