//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query
//! building, plus the DDL used when the tool is asked to create the target
//! tables itself.

use sea_query::Iden;

use super::StoreRole;

/// `users` (legacy and user service).
#[derive(Iden, Clone, Copy)]
pub enum Users {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "email"]
    Email,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// `customers` (legacy and customer service).
#[derive(Iden, Clone, Copy)]
pub enum Customers {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "email"]
    Email,
    #[iden = "address"]
    Address,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// `billing_categories` (legacy and billing service).
#[derive(Iden, Clone, Copy)]
pub enum BillingCategories {
    #[iden = "billing_categories"]
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "description"]
    Description,
    #[iden = "hourly_rate"]
    HourlyRate,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// `billable_hours` (legacy and billing service; `rate_snapshot` is target only).
#[derive(Iden, Clone, Copy)]
pub enum BillableHours {
    #[iden = "billable_hours"]
    Table,
    #[iden = "id"]
    Id,
    #[iden = "customer_id"]
    CustomerId,
    #[iden = "user_id"]
    UserId,
    #[iden = "category_id"]
    CategoryId,
    #[iden = "hours"]
    Hours,
    #[iden = "rate_snapshot"]
    RateSnapshot,
    #[iden = "date_logged"]
    DateLogged,
    #[iden = "note"]
    Note,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// `report_users` read model.
#[derive(Iden, Clone, Copy)]
pub enum ReportUsers {
    #[iden = "report_users"]
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "email"]
    Email,
}

/// `report_customers` read model.
#[derive(Iden, Clone, Copy)]
pub enum ReportCustomers {
    #[iden = "report_customers"]
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "email"]
    Email,
    #[iden = "address"]
    Address,
}

/// `report_billing_categories` read model.
#[derive(Iden, Clone, Copy)]
pub enum ReportBillingCategories {
    #[iden = "report_billing_categories"]
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "hourly_rate"]
    HourlyRate,
}

/// `report_billable_hours` read model.
#[derive(Iden, Clone, Copy)]
pub enum ReportBillableHours {
    #[iden = "report_billable_hours"]
    Table,
    #[iden = "id"]
    Id,
    #[iden = "customer_id"]
    CustomerId,
    #[iden = "user_id"]
    UserId,
    #[iden = "category_id"]
    CategoryId,
    #[iden = "hours"]
    Hours,
    #[iden = "rate_snapshot"]
    RateSnapshot,
    #[iden = "date_logged"]
    DateLogged,
    #[iden = "note"]
    Note,
    #[iden = "created_at"]
    CreatedAt,
}

/// Target DDL for PostgreSQL, matching the services' own migrations.
pub mod postgres {
    pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

    pub const CREATE_CUSTOMERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS customers (
    id UUID PRIMARY KEY,
    name VARCHAR(200) NOT NULL UNIQUE,
    email VARCHAR(255),
    address VARCHAR(500),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

    pub const CREATE_BILLING_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS billing_categories (
    id UUID PRIMARY KEY,
    name VARCHAR(100) NOT NULL UNIQUE,
    description VARCHAR(500),
    hourly_rate NUMERIC(10,2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS billable_hours (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL,
    user_id UUID NOT NULL,
    category_id UUID NOT NULL REFERENCES billing_categories(id),
    hours NUMERIC(5,2) NOT NULL,
    rate_snapshot NUMERIC(10,2) NOT NULL,
    date_logged DATE NOT NULL,
    note VARCHAR(500),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_billable_hours_category ON billable_hours(category_id);
"#;

    pub const CREATE_REPORTING_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS report_users (
    id UUID PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    email VARCHAR(255)
);

CREATE TABLE IF NOT EXISTS report_customers (
    id UUID PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    email VARCHAR(255),
    address VARCHAR(500)
);

CREATE TABLE IF NOT EXISTS report_billing_categories (
    id UUID PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    hourly_rate NUMERIC(10,2) NOT NULL
);

CREATE TABLE IF NOT EXISTS report_billable_hours (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL,
    user_id UUID NOT NULL,
    category_id UUID NOT NULL,
    hours NUMERIC(5,2) NOT NULL,
    rate_snapshot NUMERIC(10,2) NOT NULL,
    date_logged DATE NOT NULL,
    note VARCHAR(500),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;
}

/// Target DDL for SQLite. Money is stored as TEXT so values round-trip
/// exactly.
pub mod sqlite {
    pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

    pub const CREATE_CUSTOMERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS customers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    email TEXT,
    address TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

    pub const CREATE_BILLING_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS billing_categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    hourly_rate TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS billable_hours (
    id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    category_id TEXT NOT NULL,
    hours TEXT NOT NULL,
    rate_snapshot TEXT NOT NULL,
    date_logged TEXT NOT NULL,
    note TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_billable_hours_category ON billable_hours(category_id);
"#;

    pub const CREATE_REPORTING_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS report_users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT
);

CREATE TABLE IF NOT EXISTS report_customers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT,
    address TEXT
);

CREATE TABLE IF NOT EXISTS report_billing_categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    hourly_rate TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS report_billable_hours (
    id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    category_id TEXT NOT NULL,
    hours TEXT NOT NULL,
    rate_snapshot TEXT NOT NULL,
    date_logged TEXT NOT NULL,
    note TEXT,
    created_at TEXT NOT NULL
);
"#;
}

/// Pick the DDL for one target role from a backend's DDL set.
///
/// The source role has no DDL: the legacy schema is never created by this
/// tool.
pub(crate) fn target_ddl(
    role: StoreRole,
    users: &'static str,
    customers: &'static str,
    billing: &'static str,
    reporting: &'static str,
) -> Option<&'static str> {
    match role {
        StoreRole::Source => None,
        StoreRole::Users => Some(users),
        StoreRole::Customers => Some(customers),
        StoreRole::Billing => Some(billing),
        StoreRole::Reporting => Some(reporting),
    }
}
