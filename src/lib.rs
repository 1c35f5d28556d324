//! Billing Migration - legacy monolith to service schemas
//!
//! Moves the integer-keyed legacy billing database into four UUID-keyed
//! service databases, remaps foreign keys deterministically, backfills each
//! billable hour's rate snapshot, and proves parity afterwards.

#[cfg(not(any(feature = "postgres", feature = "sqlite")))]
compile_error!("enable at least one storage backend: `postgres` or `sqlite`");

pub mod config;
pub mod error;
pub mod identity;
pub mod mapping;
pub mod migrate;
pub mod model;
pub mod runner;
pub mod storage;
pub mod utils;
pub mod validate;

pub use error::MigrationError;
pub use identity::{EntityKind, IdentityMapper};
pub use mapping::IdentityMappings;
pub use migrate::{MigrationPlan, MigrationResult, Orchestrator};
pub use runner::{RunOutcome, Runner};
pub use validate::{ValidationResult, Validator};
