//! Shared SQLite fixture: a legacy database plus four empty service
//! databases in a temp directory.

#![allow(dead_code)]

use std::sync::Arc;

use billing_migration::config::{Config, StoreConfig, TargetsConfig};
use billing_migration::storage::sql::sqlite::{SqliteSourceStore, SqliteTargetStore};
use billing_migration::storage::{StoreRole, StoreSet};
use sqlx::SqlitePool;
use tempfile::TempDir;

const LEGACY_SCHEMA: &str = r#"
CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    email VARCHAR(255) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL
);
CREATE TABLE customers (
    id INTEGER PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    address VARCHAR(500),
    created_at TIMESTAMP NOT NULL
);
CREATE TABLE billing_categories (
    id INTEGER PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    description VARCHAR(500),
    hourly_rate DECIMAL(10,2) NOT NULL
);
CREATE TABLE billable_hours (
    id INTEGER PRIMARY KEY,
    customer_id BIGINT NOT NULL,
    user_id BIGINT NOT NULL,
    category_id BIGINT NOT NULL,
    hours DECIMAL(8,2) NOT NULL,
    note VARCHAR(1000),
    date_logged DATE NOT NULL,
    created_at TIMESTAMP NOT NULL
);
"#;

const LEGACY_DATA: &str = r#"
INSERT INTO users (id, email, name) VALUES
    (1, 'john.doe@example.com', 'John Doe'),
    (2, 'jane.smith@example.com', 'Jane Smith');

INSERT INTO customers (id, name, email, address, created_at) VALUES
    (1, 'Acme Corp', 'billing@acme.com', '123 Business St', '2025-01-10 09:00:00'),
    (2, 'TechStart Inc', 'finance@techstart.com', '456 Innovation Ave', '2025-01-10 09:00:00'),
    (3, 'MegaCorp Ltd', 'accounts@megacorp.com', '789 Enterprise Blvd', '2025-01-10 09:00:00');

INSERT INTO billing_categories (id, name, description, hourly_rate) VALUES
    (1, 'Development', 'Software development services', 150.00),
    (2, 'Consulting', 'Business consulting services', 200.00),
    (3, 'Support', 'Technical support services', 100.00);

INSERT INTO billable_hours (id, customer_id, user_id, category_id, hours, note, date_logged, created_at) VALUES
    (1, 1, 1, 1, 8.00, 'Backend development', '2025-01-15', '2025-01-15 18:00:00'),
    (2, 1, 2, 2, 4.00, 'Architecture consulting', '2025-01-16', '2025-01-16 18:00:00'),
    (3, 2, 1, 1, 6.00, 'Frontend development', '2025-01-17', '2025-01-17 18:00:00'),
    (4, 3, 2, 3, 3.00, 'Technical support', '2025-01-18', '2025-01-18 18:00:00');
"#;

/// Legacy plus service databases on disk.
pub struct Fixture {
    pub dir: TempDir,
    pub config: Config,
}

impl Fixture {
    /// The standard fixture: 2 users, 3 customers, 3 categories, 4 hours.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let uri = |name: &str| format!("sqlite://{}?mode=rwc", dir.path().join(name).display());

        let mut config = Config {
            source: StoreConfig::new(uri("legacy.db")),
            targets: TargetsConfig {
                users: StoreConfig::new(uri("users.db")),
                customers: StoreConfig::new(uri("customers.db")),
                billing: StoreConfig::new(uri("billing.db")),
                reporting: StoreConfig::new(uri("reporting.db")),
            },
            ..Default::default()
        };
        config.migration.init_target_schema = true;
        config.connection.connect_retries = 0;

        let fixture = Self { dir, config };
        let legacy = fixture.pool(StoreRole::Source).await;
        sqlx::raw_sql(LEGACY_SCHEMA)
            .execute(&legacy)
            .await
            .expect("Failed to create legacy schema");
        sqlx::raw_sql(LEGACY_DATA)
            .execute(&legacy)
            .await
            .expect("Failed to insert legacy data");
        legacy.close().await;

        fixture
    }

    /// A fresh pool on one of the fixture's databases.
    pub async fn pool(&self, role: StoreRole) -> SqlitePool {
        SqlitePool::connect(self.config.uri(role))
            .await
            .expect("Failed to connect to SQLite")
    }

    /// Run a statement against one database.
    pub async fn exec(&self, role: StoreRole, sql: &str) {
        let pool = self.pool(role).await;
        sqlx::raw_sql(sql)
            .execute(&pool)
            .await
            .expect("Failed to execute statement");
        pool.close().await;
    }

    /// Scalar integer query against one database.
    pub async fn scalar(&self, role: StoreRole, sql: &str) -> i64 {
        let pool = self.pool(role).await;
        let value: i64 = sqlx::query_scalar(sql)
            .fetch_one(&pool)
            .await
            .expect("Failed to run scalar query");
        pool.close().await;
        value
    }

    /// Text query returning every row's first column.
    pub async fn texts(&self, role: StoreRole, sql: &str) -> Vec<String> {
        let pool = self.pool(role).await;
        let values: Vec<String> = sqlx::query_scalar(sql)
            .fetch_all(&pool)
            .await
            .expect("Failed to run text query");
        pool.close().await;
        values
    }

    /// Store handles over the fixture databases, with target tables created.
    pub async fn stores(&self) -> StoreSet {
        let users = Arc::new(SqliteTargetStore::new(self.pool(StoreRole::Users).await));
        let customers = Arc::new(SqliteTargetStore::new(self.pool(StoreRole::Customers).await));
        let billing = Arc::new(SqliteTargetStore::new(self.pool(StoreRole::Billing).await));
        let reporting = Arc::new(SqliteTargetStore::new(self.pool(StoreRole::Reporting).await));

        for (role, store) in [
            (StoreRole::Users, &users),
            (StoreRole::Customers, &customers),
            (StoreRole::Billing, &billing),
            (StoreRole::Reporting, &reporting),
        ] {
            store.init(role).await.expect("Failed to create target schema");
        }

        StoreSet {
            source: Arc::new(SqliteSourceStore::new(self.pool(StoreRole::Source).await)),
            users,
            customers,
            billing,
            reporting,
        }
    }
}
