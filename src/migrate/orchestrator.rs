//! Runs a migration plan and aggregates per-table counts.

use std::fmt;

use futures::future::try_join_all;
use serde::Serialize;
use tracing::{info, warn};

use super::{MigrationPlan, SkippedRow, TableMigrator, TableOutcome};
use crate::error::MigrationError;
use crate::identity::EntityKind;
use crate::mapping::IdentityMappings;
use crate::storage::StoreSet;

/// Rows migrated per entity kind in one run.
///
/// Counts are rows read from the source and written to the targets in this
/// run, so a rerun over unchanged data reports the same numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationResult {
    pub users: u64,
    pub customers: u64,
    pub categories: u64,
    pub hours: u64,
    pub skipped: Vec<SkippedRow>,
}

impl MigrationResult {
    pub fn migrated(&self, kind: EntityKind) -> u64 {
        match kind {
            EntityKind::User => self.users,
            EntityKind::Customer => self.customers,
            EntityKind::Category => self.categories,
            EntityKind::BillableHour => self.hours,
        }
    }

    pub fn total(&self) -> u64 {
        self.users + self.customers + self.categories + self.hours
    }

    fn record(&mut self, kind: EntityKind, outcome: &mut TableOutcome) {
        let slot = match kind {
            EntityKind::User => &mut self.users,
            EntityKind::Customer => &mut self.customers,
            EntityKind::Category => &mut self.categories,
            EntityKind::BillableHour => &mut self.hours,
        };
        *slot = outcome.migrated;
        self.skipped.append(&mut outcome.skipped);
    }
}

impl fmt::Display for MigrationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MigrationResult{{users={}, customers={}, categories={}, hours={}, total={}}}",
            self.users,
            self.customers,
            self.categories,
            self.hours,
            self.total()
        )
    }
}

/// Sequences the table migrators and threads identity mappings between them.
///
/// Each call to [`Orchestrator::migrate`] starts from an empty mapping set and
/// drops it on return. There is no cross-table transaction: a failure leaves
/// earlier tables written, and rerunning from scratch is the recovery.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    plan: MigrationPlan,
    concurrent_leaves: bool,
}

impl Orchestrator {
    pub fn new(plan: MigrationPlan) -> Self {
        Self {
            plan,
            concurrent_leaves: false,
        }
    }

    /// Run steps without mutual dependencies concurrently.
    pub fn with_concurrent_leaves(mut self, enabled: bool) -> Self {
        self.concurrent_leaves = enabled;
        self
    }

    pub fn plan(&self) -> &MigrationPlan {
        &self.plan
    }

    pub async fn migrate(&self, stores: &StoreSet) -> Result<MigrationResult, MigrationError> {
        info!(plan = ?self.plan, concurrent = self.concurrent_leaves, "Starting migration");

        let mut mappings = IdentityMappings::new();
        let mut result = MigrationResult::default();

        let waves = if self.concurrent_leaves {
            self.plan.waves()
        } else {
            self.plan.steps().iter().map(|step| vec![step.clone()]).collect()
        };

        for wave in waves {
            let prior = &mappings;
            let outcomes = try_join_all(wave.iter().map(|step| step.migrate(stores, prior))).await?;

            for (step, mut outcome) in wave.iter().zip(outcomes) {
                let kind = step.kind();
                log_step(step.as_ref(), &outcome);
                result.record(kind, &mut outcome);
                mappings = mappings.with(kind, outcome.mappings);
            }
        }

        info!(
            users = result.users,
            customers = result.customers,
            categories = result.categories,
            hours = result.hours,
            total = result.total(),
            skipped = result.skipped.len(),
            "Migration complete"
        );
        Ok(result)
    }
}

fn log_step(step: &dyn TableMigrator, outcome: &TableOutcome) {
    let kind = step.kind();
    if outcome.skipped.is_empty() {
        info!(
            table = %kind,
            migrated = outcome.migrated,
            skipped = 0,
            "Table migrated"
        );
    } else {
        warn!(
            table = %kind,
            migrated = outcome.migrated,
            skipped = outcome.skipped.len(),
            "Table migrated with skipped rows"
        );
    }
}
