//! Row types on both sides of the migration.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

// =============================================================================
// Legacy (source) rows
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyUser {
    pub id: i64,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyCustomer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub hourly_rate: Decimal,
}

/// A logged block of work. The legacy schema records no rate here; revenue
/// was always derived from the category's current rate.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyBillableHour {
    pub id: i64,
    pub customer_id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub hours: Decimal,
    pub note: Option<String>,
    pub date_logged: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Migrated (target) rows
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MigratedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MigratedCustomer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MigratedCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub hourly_rate: Decimal,
}

/// Hourly rate of the referenced category captured at migration time.
///
/// The legacy schema keeps no rate history, so this is the category's rate
/// when the migration ran, not when the hours were logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateSnapshot(pub Decimal);

impl RateSnapshot {
    pub fn rate(&self) -> Decimal {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MigratedBillableHour {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub hours: Decimal,
    pub rate_snapshot: RateSnapshot,
    pub date_logged: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MigratedBillableHour {
    pub fn revenue(&self) -> Decimal {
        self.hours * self.rate_snapshot.rate()
    }
}

// =============================================================================
// Reporting read-model rows
// =============================================================================
//
// Same values as the canonical rows without bookkeeping columns. The
// billable-hour read model is the full migrated row, so it reuses
// `MigratedBillableHour`.

#[derive(Debug, Clone, PartialEq)]
pub struct ReportUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&MigratedUser> for ReportUser {
    fn from(user: &MigratedUser) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportCustomer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
}

impl From<&MigratedCustomer> for ReportCustomer {
    fn from(customer: &MigratedCustomer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            email: customer.email.clone(),
            address: customer.address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportCategory {
    pub id: Uuid,
    pub name: String,
    pub hourly_rate: Decimal,
}

impl From<&MigratedCategory> for ReportCategory {
    fn from(category: &MigratedCategory) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            hourly_rate: category.hourly_rate,
        }
    }
}

/// One `(hours, rate)` pair contributing to a revenue total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevenueLine {
    pub hours: Decimal,
    pub rate: Decimal,
}

impl RevenueLine {
    pub fn amount(&self) -> Decimal {
        self.hours * self.rate
    }
}
