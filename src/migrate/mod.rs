//! Table migrators and the orchestrator that sequences them.
//!
//! Every migrator follows the same loop: stream legacy rows in id order,
//! compute the target UUID, upsert the canonical row and its read-model copy,
//! and return the legacy-id mappings it produced. Mappings flow between steps
//! as an [`IdentityMappings`] value owned by the orchestrator.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::MigrationError;
use crate::identity::EntityKind;
use crate::mapping::{IdentityMappings, KindMappings};
use crate::storage::{StorageError, StoreSet};

mod billable_hours;
mod categories;
mod customers;
mod orchestrator;
mod plan;
mod users;

pub use billable_hours::BillableHourMigrator;
pub use categories::CategoryMigrator;
pub use customers::CustomerMigrator;
pub use orchestrator::{MigrationResult, Orchestrator};
pub use plan::MigrationPlan;
pub use users::UserMigrator;

/// Migrates one legacy table into its service schema and the reporting
/// read model.
#[async_trait]
pub trait TableMigrator: Send + Sync {
    /// Entity kind this migrator owns.
    fn kind(&self) -> EntityKind;

    /// Kinds whose mappings must be present in `prior` before this runs.
    fn depends_on(&self) -> &'static [EntityKind] {
        &[]
    }

    /// Migrate every source row of `kind()`.
    ///
    /// Source read and target write failures abort the table. Rows that
    /// cannot be migrated for data reasons are returned as skipped.
    async fn migrate(
        &self,
        stores: &StoreSet,
        prior: &IdentityMappings,
    ) -> Result<TableOutcome, MigrationError>;
}

/// What one migrator did.
#[derive(Debug, Clone, Default)]
pub struct TableOutcome {
    pub migrated: u64,
    pub mappings: KindMappings,
    pub skipped: Vec<SkippedRow>,
}

impl TableOutcome {
    fn record(&mut self, legacy_id: i64, id: uuid::Uuid) {
        self.migrated += 1;
        self.mappings.insert(legacy_id, id);
    }
}

/// A legacy foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForeignRef {
    pub kind: EntityKind,
    pub legacy_id: i64,
}

impl fmt::Display for ForeignRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.legacy_id)
    }
}

/// Why a row was left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// At least one referenced row was never migrated.
    MissingForeignKeyMapping { missing: Vec<ForeignRef> },
    /// The category is mapped but no current rate was loaded for it.
    MissingRate { category_id: i64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingForeignKeyMapping { missing } => {
                let refs: Vec<String> = missing.iter().map(ToString::to_string).collect();
                write!(f, "unmigrated reference {}", refs.join(", "))
            }
            SkipReason::MissingRate { category_id } => {
                write!(f, "no hourly rate for category#{}", category_id)
            }
        }
    }
}

/// A source row that was not migrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub table: EntityKind,
    pub legacy_id: i64,
    #[serde(flatten)]
    pub reason: SkipReason,
}

fn source_read(table: EntityKind) -> impl FnOnce(StorageError) -> MigrationError {
    move |source| MigrationError::SourceRead { table, source }
}

fn target_write(table: EntityKind, legacy_id: i64) -> impl FnOnce(StorageError) -> MigrationError {
    move |source| MigrationError::TargetWrite {
        table,
        legacy_id,
        source,
    }
}
