//! Store interfaces for the legacy source and the four service targets.
//!
//! The migration never goes through the services' APIs; it talks to their
//! tables directly through these traits. SQL implementations live in
//! [`sql`], in-memory ones in [`mock`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use rust_decimal::Decimal;

use crate::identity::EntityKind;
use crate::model::{
    LegacyBillableHour, LegacyCategory, LegacyCustomer, LegacyUser, MigratedBillableHour,
    MigratedCategory, MigratedCustomer, MigratedUser, ReportCategory, ReportCustomer, ReportUser,
    RevenueLine,
};

pub mod schema;
pub mod sql;

#[cfg(test)]
pub mod mock;

pub use sql::{connect, SqlPool};

/// Errors raised by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid decimal in column {column}: {value:?}")]
    InvalidDecimal { column: &'static str, value: String },

    #[error("Invalid timestamp in column {column}: {value:?}")]
    InvalidTimestamp { column: &'static str, value: String },

    #[error("Invalid date in column {column}: {value:?}")]
    InvalidDate { column: &'static str, value: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// The five stores a run touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreRole {
    Source,
    Users,
    Customers,
    Billing,
    Reporting,
}

impl StoreRole {
    pub const TARGETS: [StoreRole; 4] = [
        StoreRole::Users,
        StoreRole::Customers,
        StoreRole::Billing,
        StoreRole::Reporting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreRole::Source => "source",
            StoreRole::Users => "user-service",
            StoreRole::Customers => "customer-service",
            StoreRole::Billing => "billing-service",
            StoreRole::Reporting => "reporting-service",
        }
    }
}

impl fmt::Display for StoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read access to the legacy single-schema database.
///
/// Row streams are ordered by legacy id and backed by a database cursor, so
/// memory use does not grow with table size.
#[async_trait]
pub trait SourceStore: Send + Sync {
    fn users(&self) -> BoxStream<'_, Result<LegacyUser>>;

    fn customers(&self) -> BoxStream<'_, Result<LegacyCustomer>>;

    fn categories(&self) -> BoxStream<'_, Result<LegacyCategory>>;

    fn billable_hours(&self) -> BoxStream<'_, Result<LegacyBillableHour>>;

    /// Current hourly rate of every category, keyed by legacy id.
    async fn category_rates(&self) -> Result<HashMap<i64, Decimal>>;

    async fn count(&self, kind: EntityKind) -> Result<u64>;

    /// `(hours, current category rate)` for every billable hour whose
    /// category exists, joined at call time.
    fn revenue_lines(&self) -> BoxStream<'_, Result<RevenueLine>>;
}

/// The user service's schema.
#[async_trait]
pub trait UserTarget: Send + Sync {
    async fn upsert_user(&self, user: &MigratedUser) -> Result<()>;

    async fn count_users(&self) -> Result<u64>;
}

/// The customer service's schema.
#[async_trait]
pub trait CustomerTarget: Send + Sync {
    async fn upsert_customer(&self, customer: &MigratedCustomer) -> Result<()>;

    async fn count_customers(&self) -> Result<u64>;
}

/// The billing service's schema (categories and billable hours).
#[async_trait]
pub trait BillingTarget: Send + Sync {
    async fn upsert_category(&self, category: &MigratedCategory) -> Result<()>;

    async fn upsert_billable_hour(&self, hour: &MigratedBillableHour) -> Result<()>;

    async fn count_categories(&self) -> Result<u64>;

    async fn count_billable_hours(&self) -> Result<u64>;

    /// `(hours, rate_snapshot)` for every migrated billable hour.
    fn revenue_lines(&self) -> BoxStream<'_, Result<RevenueLine>>;

    /// Billable hours whose category id has no matching category row.
    async fn count_orphaned_hours(&self) -> Result<u64>;
}

/// The reporting service's denormalized read model.
#[async_trait]
pub trait ReportingTarget: Send + Sync {
    async fn upsert_report_user(&self, user: &ReportUser) -> Result<()>;

    async fn upsert_report_customer(&self, customer: &ReportCustomer) -> Result<()>;

    async fn upsert_report_category(&self, category: &ReportCategory) -> Result<()>;

    async fn upsert_report_billable_hour(&self, hour: &MigratedBillableHour) -> Result<()>;

    async fn count(&self, kind: EntityKind) -> Result<u64>;
}

/// Handles to all five stores of one run.
#[derive(Clone)]
pub struct StoreSet {
    pub source: Arc<dyn SourceStore>,
    pub users: Arc<dyn UserTarget>,
    pub customers: Arc<dyn CustomerTarget>,
    pub billing: Arc<dyn BillingTarget>,
    pub reporting: Arc<dyn ReportingTarget>,
}

impl StoreSet {
    /// Row count of `kind` in its canonical target schema.
    pub async fn target_count(&self, kind: EntityKind) -> Result<u64> {
        match kind {
            EntityKind::User => self.users.count_users().await,
            EntityKind::Customer => self.customers.count_customers().await,
            EntityKind::Category => self.billing.count_categories().await,
            EntityKind::BillableHour => self.billing.count_billable_hours().await,
        }
    }
}
