//! Initial database migration.
//!
//! Creates every table of the ledger, invoicing, payoff and stock modules and
//! seeds the reserved journals.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ACCOUNTING
        // ============================================================
        db.execute_unprepared(FISCAL_YEARS_SQL).await?;
        db.execute_unprepared(CHART_ACCOUNTS_SQL).await?;
        db.execute_unprepared(THIRDS_SQL).await?;
        db.execute_unprepared(JOURNALS_SQL).await?;
        db.execute_unprepared(COST_ACCOUNTINGS_SQL).await?;
        db.execute_unprepared(ENTRIES_SQL).await?;
        db.execute_unprepared(MODEL_ENTRIES_SQL).await?;

        // ============================================================
        // PART 2: INVOICING
        // ============================================================
        db.execute_unprepared(ARTICLES_SQL).await?;
        db.execute_unprepared(STORAGE_AREAS_SQL).await?;
        db.execute_unprepared(BILLS_SQL).await?;
        db.execute_unprepared(AUTOMATIC_REDUCES_SQL).await?;

        // ============================================================
        // PART 3: PAYOFFS
        // ============================================================
        db.execute_unprepared(PAYOFFS_SQL).await?;

        // ============================================================
        // PART 4: STOCK
        // ============================================================
        db.execute_unprepared(STORAGE_SQL).await?;

        // ============================================================
        // PART 5: SEED DATA
        // ============================================================
        db.execute_unprepared(SEED_JOURNALS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const FISCAL_YEARS_SQL: &str = r"
CREATE TABLE fiscal_years (
    id UUID PRIMARY KEY,
    begin_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status SMALLINT NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT FALSE,
    last_year_id UUID REFERENCES fiscal_years(id),
    letter_index INTEGER NOT NULL DEFAULT 0,
    CONSTRAINT chk_fiscal_year_dates CHECK (end_date > begin_date),
    CONSTRAINT chk_fiscal_year_status CHECK (status BETWEEN 0 AND 2)
);

CREATE UNIQUE INDEX idx_fiscal_years_active ON fiscal_years(is_active) WHERE is_active;
";

const CHART_ACCOUNTS_SQL: &str = r"
CREATE TABLE chart_accounts (
    id UUID PRIMARY KEY,
    year_id UUID NOT NULL REFERENCES fiscal_years(id) ON DELETE CASCADE,
    code VARCHAR(50) NOT NULL,
    name VARCHAR(200) NOT NULL,
    account_type SMALLINT NOT NULL,
    UNIQUE (year_id, code)
);
";

const THIRDS_SQL: &str = r"
CREATE TABLE thirds (
    id UUID PRIMARY KEY,
    contact VARCHAR(200) NOT NULL,
    status SMALLINT NOT NULL DEFAULT 0,
    custom_fields JSONB NOT NULL DEFAULT '{}'
);

CREATE TABLE account_thirds (
    id UUID PRIMARY KEY,
    third_id UUID NOT NULL REFERENCES thirds(id) ON DELETE CASCADE,
    code VARCHAR(50) NOT NULL,
    UNIQUE (third_id, code)
);

CREATE INDEX idx_account_thirds_code ON account_thirds(code);
";

const JOURNALS_SQL: &str = r"
CREATE TABLE journals (
    id INTEGER PRIMARY KEY,
    name VARCHAR(50) NOT NULL UNIQUE,
    is_reserved BOOLEAN NOT NULL DEFAULT FALSE
);
";

const COST_ACCOUNTINGS_SQL: &str = r"
CREATE TABLE cost_accountings (
    id UUID PRIMARY KEY,
    name VARCHAR(50) NOT NULL UNIQUE,
    description VARCHAR(200) NOT NULL DEFAULT '',
    status SMALLINT NOT NULL DEFAULT 0,
    last_costaccounting_id UUID REFERENCES cost_accountings(id),
    is_default BOOLEAN NOT NULL DEFAULT FALSE,
    year_id UUID REFERENCES fiscal_years(id)
);
";

const ENTRIES_SQL: &str = r"
CREATE TABLE account_links (
    id UUID PRIMARY KEY,
    year_id UUID NOT NULL REFERENCES fiscal_years(id) ON DELETE CASCADE,
    letter VARCHAR(10) NOT NULL,
    UNIQUE (year_id, letter)
);

CREATE TABLE entries (
    id UUID PRIMARY KEY,
    year_id UUID NOT NULL REFERENCES fiscal_years(id) ON DELETE CASCADE,
    journal_id INTEGER NOT NULL REFERENCES journals(id),
    num INTEGER,
    date_entry DATE,
    date_value DATE NOT NULL,
    designation VARCHAR(200) NOT NULL,
    close BOOLEAN NOT NULL DEFAULT FALSE,
    link_id UUID REFERENCES account_links(id) ON DELETE SET NULL,
    costaccounting_id UUID REFERENCES cost_accountings(id),
    CONSTRAINT chk_closed_entry_numbered CHECK (NOT close OR num IS NOT NULL)
);

CREATE INDEX idx_entries_year ON entries(year_id, journal_id);
CREATE UNIQUE INDEX idx_entries_num ON entries(year_id, num) WHERE num IS NOT NULL;

CREATE TABLE entry_lines (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
    position INTEGER NOT NULL DEFAULT 0,
    account_code VARCHAR(50) NOT NULL,
    amount NUMERIC(18, 4) NOT NULL,
    third_id UUID REFERENCES thirds(id),
    reference VARCHAR(100)
);

CREATE INDEX idx_entry_lines_entry ON entry_lines(entry_id, position);
CREATE INDEX idx_entry_lines_third ON entry_lines(third_id);
";

const MODEL_ENTRIES_SQL: &str = r"
CREATE TABLE model_entries (
    id UUID PRIMARY KEY,
    journal_id INTEGER NOT NULL REFERENCES journals(id),
    designation VARCHAR(200) NOT NULL,
    costaccounting_id UUID REFERENCES cost_accountings(id)
);

CREATE TABLE model_lines (
    id UUID PRIMARY KEY,
    model_entry_id UUID NOT NULL REFERENCES model_entries(id) ON DELETE CASCADE,
    position INTEGER NOT NULL DEFAULT 0,
    account_code VARCHAR(50) NOT NULL,
    amount NUMERIC(18, 4) NOT NULL,
    third_id UUID REFERENCES thirds(id)
);
";

const ARTICLES_SQL: &str = r"
CREATE TABLE vats (
    id UUID PRIMARY KEY,
    name VARCHAR(20) NOT NULL,
    rate NUMERIC(18, 4) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE
);

CREATE TABLE categories (
    id UUID PRIMARY KEY,
    name VARCHAR(50) NOT NULL UNIQUE,
    designation VARCHAR(200) NOT NULL DEFAULT ''
);

CREATE TABLE articles (
    id UUID PRIMARY KEY,
    reference VARCHAR(30) NOT NULL UNIQUE,
    designation TEXT NOT NULL,
    price NUMERIC(18, 4) NOT NULL DEFAULT 0,
    unit VARCHAR(10) NOT NULL DEFAULT '',
    sell_account VARCHAR(50) NOT NULL,
    vat_id UUID REFERENCES vats(id),
    stockable SMALLINT NOT NULL DEFAULT 0,
    category_ids JSONB NOT NULL DEFAULT '[]',
    is_disabled BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE category_bills (
    id UUID PRIMARY KEY,
    name VARCHAR(50) NOT NULL UNIQUE,
    prefix_numbering VARCHAR(10) NOT NULL DEFAULT '',
    special_numbering BOOLEAN NOT NULL DEFAULT FALSE,
    is_default BOOLEAN NOT NULL DEFAULT FALSE
);
";

const STORAGE_AREAS_SQL: &str = r"
CREATE TABLE storage_areas (
    id UUID PRIMARY KEY,
    name VARCHAR(50) NOT NULL UNIQUE,
    designation TEXT NOT NULL DEFAULT ''
);
";

const BILLS_SQL: &str = r"
CREATE TABLE bills (
    id UUID PRIMARY KEY,
    bill_type SMALLINT NOT NULL,
    num INTEGER,
    num_txt VARCHAR(30),
    fiscal_year_id UUID REFERENCES fiscal_years(id),
    date DATE NOT NULL,
    third_id UUID REFERENCES thirds(id),
    comment TEXT NOT NULL DEFAULT '',
    status SMALLINT NOT NULL DEFAULT 0,
    entry_id UUID REFERENCES entries(id) ON DELETE SET NULL,
    parent_id UUID REFERENCES bills(id),
    cost_accounting_id UUID REFERENCES cost_accountings(id),
    category_id UUID REFERENCES category_bills(id),
    CONSTRAINT chk_bill_type CHECK (bill_type BETWEEN 0 AND 5),
    CONSTRAINT chk_bill_status CHECK (status BETWEEN 0 AND 3)
);

CREATE INDEX idx_bills_third ON bills(third_id, status);
CREATE INDEX idx_bills_year ON bills(fiscal_year_id, bill_type);

CREATE TABLE details (
    id UUID PRIMARY KEY,
    bill_id UUID NOT NULL REFERENCES bills(id) ON DELETE CASCADE,
    position INTEGER NOT NULL DEFAULT 0,
    article_id UUID REFERENCES articles(id),
    designation TEXT NOT NULL,
    price NUMERIC(18, 4) NOT NULL,
    unit VARCHAR(10) NOT NULL DEFAULT '',
    quantity NUMERIC(18, 4) NOT NULL,
    reduce NUMERIC(18, 4) NOT NULL DEFAULT 0,
    vat_rate NUMERIC(18, 4) NOT NULL DEFAULT 0,
    storagearea_id UUID REFERENCES storage_areas(id)
);

CREATE INDEX idx_details_bill ON details(bill_id, position);
";

const AUTOMATIC_REDUCES_SQL: &str = r"
CREATE TABLE automatic_reduces (
    id UUID PRIMARY KEY,
    name VARCHAR(250) NOT NULL,
    category_id UUID NOT NULL REFERENCES categories(id),
    mode SMALLINT NOT NULL,
    amount NUMERIC(18, 4) NOT NULL,
    occurency INTEGER NOT NULL DEFAULT 0,
    criteria JSONB,
    is_active BOOLEAN NOT NULL DEFAULT TRUE
);
";

const PAYOFFS_SQL: &str = r"
CREATE TABLE bank_accounts (
    id UUID PRIMARY KEY,
    designation TEXT NOT NULL,
    reference VARCHAR(200) NOT NULL DEFAULT '',
    account_code VARCHAR(50) NOT NULL,
    is_disabled BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE payoffs (
    id UUID PRIMARY KEY,
    supporting_id UUID NOT NULL REFERENCES bills(id) ON DELETE CASCADE,
    date DATE NOT NULL,
    amount NUMERIC(18, 4) NOT NULL,
    mode SMALLINT NOT NULL,
    payer VARCHAR(150) NOT NULL DEFAULT '',
    reference VARCHAR(100) NOT NULL DEFAULT '',
    bank_account_id UUID REFERENCES bank_accounts(id),
    bank_fee NUMERIC(18, 4) NOT NULL DEFAULT 0,
    entry_id UUID REFERENCES entries(id) ON DELETE SET NULL,
    linked_payoff_id UUID REFERENCES payoffs(id) ON DELETE SET NULL,
    CONSTRAINT chk_payoff_mode CHECK (mode BETWEEN 0 AND 6)
);

CREATE INDEX idx_payoffs_supporting ON payoffs(supporting_id);
CREATE INDEX idx_payoffs_entry ON payoffs(entry_id);

CREATE TABLE payment_methods (
    id UUID PRIMARY KEY,
    paytype SMALLINT NOT NULL,
    bank_account_id UUID NOT NULL REFERENCES bank_accounts(id),
    extra_data JSONB NOT NULL DEFAULT '[]'
);

CREATE TABLE bank_transactions (
    id UUID PRIMARY KEY,
    date TIMESTAMPTZ NOT NULL,
    status SMALLINT NOT NULL DEFAULT 0,
    payer VARCHAR(200) NOT NULL DEFAULT '',
    amount NUMERIC(18, 4) NOT NULL DEFAULT 0,
    contains TEXT NOT NULL DEFAULT ''
);
";

const STORAGE_SQL: &str = r"
CREATE TABLE storage_sheets (
    id UUID PRIMARY KEY,
    sheet_type SMALLINT NOT NULL,
    date DATE NOT NULL,
    storagearea_id UUID NOT NULL REFERENCES storage_areas(id),
    comment TEXT NOT NULL DEFAULT '',
    status SMALLINT NOT NULL DEFAULT 0,
    provider_id UUID REFERENCES thirds(id),
    bill_reference VARCHAR(50) NOT NULL DEFAULT '',
    bill_date DATE
);

CREATE TABLE storage_details (
    id UUID PRIMARY KEY,
    storagesheet_id UUID NOT NULL REFERENCES storage_sheets(id) ON DELETE CASCADE,
    article_id UUID NOT NULL REFERENCES articles(id),
    price NUMERIC(18, 4) NOT NULL DEFAULT 0,
    quantity NUMERIC(18, 4) NOT NULL,
    value NUMERIC(18, 4)
);

CREATE INDEX idx_storage_details_article ON storage_details(article_id);

CREATE TABLE inventory_sheets (
    id UUID PRIMARY KEY,
    date DATE NOT NULL,
    comment TEXT NOT NULL DEFAULT '',
    storagearea_id UUID NOT NULL REFERENCES storage_areas(id),
    status SMALLINT NOT NULL DEFAULT 0,
    stockreceipt_id UUID REFERENCES storage_sheets(id),
    stockexit_id UUID REFERENCES storage_sheets(id)
);

CREATE TABLE inventory_details (
    id UUID PRIMARY KEY,
    inventorysheet_id UUID NOT NULL REFERENCES inventory_sheets(id) ON DELETE CASCADE,
    article_id UUID NOT NULL REFERENCES articles(id),
    quantity NUMERIC(18, 4)
);
";

const SEED_JOURNALS_SQL: &str = r"
INSERT INTO journals (id, name, is_reserved) VALUES
    (1, 'Last year report', TRUE),
    (2, 'Buying', TRUE),
    (3, 'Selling', TRUE),
    (4, 'Payment', TRUE),
    (5, 'Other', TRUE);
";

const DROP_ALL_SQL: &str = r"
-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS inventory_details CASCADE;
DROP TABLE IF EXISTS inventory_sheets CASCADE;
DROP TABLE IF EXISTS storage_details CASCADE;
DROP TABLE IF EXISTS storage_sheets CASCADE;
DROP TABLE IF EXISTS bank_transactions CASCADE;
DROP TABLE IF EXISTS payment_methods CASCADE;
DROP TABLE IF EXISTS payoffs CASCADE;
DROP TABLE IF EXISTS bank_accounts CASCADE;
DROP TABLE IF EXISTS automatic_reduces CASCADE;
DROP TABLE IF EXISTS details CASCADE;
DROP TABLE IF EXISTS bills CASCADE;
DROP TABLE IF EXISTS storage_areas CASCADE;
DROP TABLE IF EXISTS category_bills CASCADE;
DROP TABLE IF EXISTS articles CASCADE;
DROP TABLE IF EXISTS categories CASCADE;
DROP TABLE IF EXISTS vats CASCADE;
DROP TABLE IF EXISTS model_lines CASCADE;
DROP TABLE IF EXISTS model_entries CASCADE;
DROP TABLE IF EXISTS entry_lines CASCADE;
DROP TABLE IF EXISTS entries CASCADE;
DROP TABLE IF EXISTS account_links CASCADE;
DROP TABLE IF EXISTS cost_accountings CASCADE;
DROP TABLE IF EXISTS journals CASCADE;
DROP TABLE IF EXISTS account_thirds CASCADE;
DROP TABLE IF EXISTS thirds CASCADE;
DROP TABLE IF EXISTS chart_accounts CASCADE;
DROP TABLE IF EXISTS fiscal_years CASCADE;
";
