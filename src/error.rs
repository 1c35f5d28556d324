//! Run-level error taxonomy.

use crate::identity::EntityKind;
use crate::storage::{StorageError, StoreRole};
use crate::validate::ValidationResult;

/// Errors that abort a migration or validation run.
///
/// Orphaned billable hours are not errors; they are reported as skipped rows
/// on the table outcome.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot connect to {store}: {source}")]
    Connection {
        store: StoreRole,
        #[source]
        source: sqlx::Error,
    },

    #[error("Unsupported URI for {store}: {uri}")]
    UnsupportedUri { store: StoreRole, uri: String },

    #[error("Cannot create {store} tables: {source}")]
    SchemaInit {
        store: StoreRole,
        #[source]
        source: StorageError,
    },

    #[error("Failed reading source {table}: {source}")]
    SourceRead {
        table: EntityKind,
        #[source]
        source: StorageError,
    },

    #[error("Failed writing {table} row with legacy id {legacy_id}: {source}")]
    TargetWrite {
        table: EntityKind,
        legacy_id: i64,
        #[source]
        source: StorageError,
    },

    #[error("Validation check {check} failed to read: {source}")]
    ValidationRead {
        check: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("Invalid migration plan: {0}")]
    InvalidPlan(String),

    #[error("Validation failed: {0}")]
    ValidationMismatch(Box<ValidationResult>),
}

impl From<::config::ConfigError> for MigrationError {
    fn from(err: ::config::ConfigError) -> Self {
        MigrationError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;
