//! The ordered list of table migrators a run executes.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::{
    BillableHourMigrator, CategoryMigrator, CustomerMigrator, TableMigrator, UserMigrator,
};
use crate::error::MigrationError;
use crate::identity::EntityKind;

/// Migrators in run order.
///
/// Construction checks that every step's dependencies run before it and
/// that no kind appears twice, so an accepted plan can always be executed
/// front to back.
#[derive(Clone)]
pub struct MigrationPlan {
    steps: Vec<Arc<dyn TableMigrator>>,
}

impl MigrationPlan {
    pub fn new(steps: Vec<Arc<dyn TableMigrator>>) -> Result<Self, MigrationError> {
        let mut seen: HashSet<EntityKind> = HashSet::new();

        for step in &steps {
            let kind = step.kind();
            if let Some(dep) = step.depends_on().iter().find(|dep| !seen.contains(*dep)) {
                return Err(MigrationError::InvalidPlan(format!(
                    "{} must run after {}",
                    kind, dep
                )));
            }
            if !seen.insert(kind) {
                return Err(MigrationError::InvalidPlan(format!(
                    "{} appears more than once",
                    kind
                )));
            }
        }

        Ok(Self { steps })
    }

    /// Users, Customers, Categories, BillableHours.
    pub fn standard() -> Self {
        Self {
            steps: vec![
                Arc::new(UserMigrator),
                Arc::new(CustomerMigrator),
                Arc::new(CategoryMigrator),
                Arc::new(BillableHourMigrator),
            ],
        }
    }

    pub fn steps(&self) -> &[Arc<dyn TableMigrator>] {
        &self.steps
    }

    pub fn kinds(&self) -> Vec<EntityKind> {
        self.steps.iter().map(|step| step.kind()).collect()
    }

    pub fn position(&self, kind: EntityKind) -> Option<usize> {
        self.steps.iter().position(|step| step.kind() == kind)
    }

    /// Consecutive groups of steps that depend only on earlier groups.
    ///
    /// Steps within one wave share no mapping dependency and may run
    /// concurrently; waves must run in order.
    pub fn waves(&self) -> Vec<Vec<Arc<dyn TableMigrator>>> {
        let mut waves: Vec<Vec<Arc<dyn TableMigrator>>> = Vec::new();
        let mut done: HashSet<EntityKind> = HashSet::new();
        let mut current: Vec<Arc<dyn TableMigrator>> = Vec::new();

        for step in &self.steps {
            let ready = step.depends_on().iter().all(|dep| done.contains(dep));
            if !ready {
                done.extend(current.iter().map(|s| s.kind()));
                waves.push(std::mem::take(&mut current));
            }
            current.push(Arc::clone(step));
        }
        if !current.is_empty() {
            waves.push(current);
        }

        waves
    }
}

impl Default for MigrationPlan {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for MigrationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}
