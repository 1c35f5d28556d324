//! Wires the five stores, runs the migration, then validates.
//!
//! The targets are independently owned databases with no shared transaction.
//! A run that writes data and then fails validation is reported as failed;
//! nothing is rolled back.

use tracing::{info, warn};

use crate::config::Config;
use crate::error::MigrationError;
use crate::migrate::{MigrationPlan, MigrationResult, Orchestrator};
use crate::storage::{connect, SqlPool, StoreRole, StoreSet};
use crate::validate::{log_report, ValidationResult, Validator};

/// Migration counts plus the parity report of the same run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub migration: MigrationResult,
    pub validation: ValidationResult,
}

impl RunOutcome {
    /// A run succeeds only if validation passes.
    pub fn is_success(&self) -> bool {
        self.validation.is_valid()
    }

    pub fn ensure_valid(self) -> Result<Self, MigrationError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(MigrationError::ValidationMismatch(Box::new(self.validation)))
        }
    }
}

/// Pools opened by one run, closed when the run ends however it ends.
#[derive(Default)]
struct Connections {
    pools: Vec<SqlPool>,
}

impl Connections {
    async fn open(&mut self, role: StoreRole, config: &Config) -> Result<SqlPool, MigrationError> {
        let pool = connect(role, config.uri(role), &config.connection).await?;
        self.pools.push(pool.clone());
        Ok(pool)
    }

    async fn close(self) {
        for pool in &self.pools {
            pool.close().await;
        }
    }
}

pub struct Runner {
    config: Config,
    orchestrator: Orchestrator,
    validator: Validator,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        let orchestrator = Orchestrator::new(MigrationPlan::standard())
            .with_concurrent_leaves(config.migration.concurrent_leaves);
        Self {
            config,
            orchestrator,
            validator: Validator::new(),
        }
    }

    /// Connect, migrate, validate.
    ///
    /// Every store is connected before anything is written, so an
    /// unreachable store aborts the run with no side effects.
    pub async fn run(&self) -> Result<RunOutcome, MigrationError> {
        self.config.validate()?;

        let mut connections = Connections::default();
        let outcome = match self.connect(&mut connections).await {
            Ok(stores) => self.execute(&stores).await,
            Err(err) => Err(err),
        };
        connections.close().await;
        outcome
    }

    /// Migrate then validate against already connected stores.
    ///
    /// Validation runs whatever the migration counts are; only a migration
    /// error prevents it.
    pub async fn execute(&self, stores: &StoreSet) -> Result<RunOutcome, MigrationError> {
        let migration = self.orchestrator.migrate(stores).await?;
        info!(result = %migration, "Migration finished, validating");

        let validation = self.validator.validate(stores).await?;
        log_report(&validation);

        Ok(RunOutcome {
            migration,
            validation,
        })
    }

    async fn connect(&self, connections: &mut Connections) -> Result<StoreSet, MigrationError> {
        let source = connections.open(StoreRole::Source, &self.config).await?;
        let users = connections.open(StoreRole::Users, &self.config).await?;
        let customers = connections.open(StoreRole::Customers, &self.config).await?;
        let billing = connections.open(StoreRole::Billing, &self.config).await?;
        let reporting = connections.open(StoreRole::Reporting, &self.config).await?;

        let users = users.into_target();
        let customers = customers.into_target();
        let billing = billing.into_target();
        let reporting = reporting.into_target();

        if self.config.migration.init_target_schema {
            for (role, target) in [
                (StoreRole::Users, &users),
                (StoreRole::Customers, &customers),
                (StoreRole::Billing, &billing),
                (StoreRole::Reporting, &reporting),
            ] {
                target.init(role).await?;
                info!(store = %role, "Target schema ready");
            }
        } else {
            warn!("Target schema initialization disabled; tables must already exist");
        }

        Ok(StoreSet {
            source: source.into_source(),
            users: users.users(),
            customers: customers.customers(),
            billing: billing.billing(),
            reporting: reporting.reporting(),
        })
    }
}
