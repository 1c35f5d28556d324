//! Deterministic identity mapping from legacy integer keys to UUIDs.
//!
//! The target schemas are keyed by UUID while the legacy database uses
//! monotonically assigned integers. Every target id is a UUIDv5 of
//! `"<kind>:<legacy id>"` under a fixed namespace, so the same legacy row maps
//! to the same target row in every run without reading back any previously
//! written mapping.
//!
//! These ids differ from the name-based MD5 (v3) ids the legacy migration
//! script produced. Run this tool against empty service databases, not ones
//! that script already populated: its rows would not be matched and the
//! `users.email` and `customers.name` unique constraints would reject the
//! new inserts.

use std::fmt;
use std::sync::LazyLock;

use serde::Serialize;
use uuid::Uuid;

/// Namespace for all migrated identities, derived from DNS-based UUIDv5.
pub static MIGRATION_UUID_NAMESPACE: LazyLock<Uuid> =
    LazyLock::new(|| Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"migration.bigbadmonolith.com"));

/// The four entity kinds carried over from the legacy schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Customer,
    Category,
    BillableHour,
}

impl EntityKind {
    /// All kinds, in canonical migration order.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::User,
        EntityKind::Customer,
        EntityKind::Category,
        EntityKind::BillableHour,
    ];

    /// Identity prefix hashed together with the legacy id.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Customer => "customer",
            EntityKind::Category => "category",
            EntityKind::BillableHour => "billable_hour",
        }
    }

    /// Table name, identical in the legacy schema and the service schemas.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Customer => "customers",
            EntityKind::Category => "billing_categories",
            EntityKind::BillableHour => "billable_hours",
        }
    }

    /// Reporting read-model table name.
    pub fn report_table(&self) -> &'static str {
        match self {
            EntityKind::User => "report_users",
            EntityKind::Customer => "report_customers",
            EntityKind::Category => "report_billing_categories",
            EntityKind::BillableHour => "report_billable_hours",
        }
    }

    /// Target UUID for a legacy id of this kind.
    pub fn identity(&self, legacy_id: i64) -> Uuid {
        IdentityMapper::generate(self.as_str(), legacy_id)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure `(entity kind, legacy id) -> UUID` function.
///
/// Holds no state; two calls with the same input return the same UUID in
/// this process and in any other.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl IdentityMapper {
    /// Hash `entity_kind` and `legacy_id` into a 128-bit identifier.
    pub fn generate(entity_kind: &str, legacy_id: i64) -> Uuid {
        let name = format!("{}:{}", entity_kind, legacy_id);
        Uuid::new_v5(&MIGRATION_UUID_NAMESPACE, name.as_bytes())
    }
}
