//! Post-migration parity checks.
//!
//! Validation is read-only and independent of the orchestrator: it recomputes
//! everything from the stores, so it can run after a migration, after a
//! crash, or on its own.

use std::fmt;

use futures::stream::BoxStream;
use futures::TryStreamExt;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};

use crate::error::MigrationError;
use crate::identity::EntityKind;
use crate::model::RevenueLine;
use crate::storage::{self, StorageError, StoreSet};

const CHECK_ROW_COUNT: &str = "row_count";
const CHECK_SOURCE_REVENUE: &str = "source_revenue";
const CHECK_TARGET_REVENUE: &str = "target_revenue";
const CHECK_FK_INTEGRITY: &str = "fk_integrity";

/// Source and target row counts of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: EntityKind,
    pub source: u64,
    pub target: u64,
}

impl TableCount {
    pub fn matches(&self) -> bool {
        self.source == self.target
    }
}

/// Outcome of one validation run. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub tables: Vec<TableCount>,
    /// Σ hours × current category rate, joined in the source at validation time.
    pub source_revenue: Decimal,
    /// Σ hours × rate snapshot stored at migration time.
    pub target_revenue: Decimal,
    /// Target billable hours whose category does not exist in the target.
    pub orphaned_hours: u64,
}

impl ValidationResult {
    pub fn row_count_match(&self) -> bool {
        self.tables.iter().all(TableCount::matches)
    }

    /// Exact decimal comparison; scale differences do not matter.
    pub fn revenue_match(&self) -> bool {
        self.source_revenue == self.target_revenue
    }

    pub fn fk_integrity(&self) -> bool {
        self.orphaned_hours == 0
    }

    pub fn is_valid(&self) -> bool {
        self.row_count_match() && self.revenue_match() && self.fk_integrity()
    }

    pub fn table(&self, kind: EntityKind) -> Option<&TableCount> {
        self.tables.iter().find(|t| t.table == kind)
    }

    pub fn mismatched_tables(&self) -> Vec<&TableCount> {
        self.tables.iter().filter(|t| !t.matches()).collect()
    }

    /// Itemized description of every failed check.
    pub fn diagnostics(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .mismatched_tables()
            .into_iter()
            .map(|t| {
                format!(
                    "{}: source has {} rows, target has {}",
                    t.table.table(),
                    t.source,
                    t.target
                )
            })
            .collect();

        if !self.revenue_match() {
            lines.push(format!(
                "revenue: source {} != target {} (difference {})",
                self.source_revenue,
                self.target_revenue,
                self.source_revenue - self.target_revenue
            ));
        }
        if !self.fk_integrity() {
            lines.push(format!(
                "billable_hours: {} rows reference a missing category",
                self.orphaned_hours
            ));
        }

        lines
    }

    /// One JSON object with the raw numbers and derived checks.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "valid": self.is_valid(),
            "row_count_match": self.row_count_match(),
            "revenue_match": self.revenue_match(),
            "fk_integrity": self.fk_integrity(),
            "tables": self.tables,
            "source_revenue": self.source_revenue,
            "target_revenue": self.target_revenue,
            "orphaned_hours": self.orphaned_hours,
        })
    }
}

fn verdict(ok: bool) -> &'static str {
    if ok {
        "OK"
    } else {
        "MISMATCH"
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows {}, revenue {} (source {}, target {}), fk {} ({} orphaned): {}",
            verdict(self.row_count_match()),
            verdict(self.revenue_match()),
            self.source_revenue,
            self.target_revenue,
            verdict(self.fk_integrity()),
            self.orphaned_hours,
            if self.is_valid() { "VALID" } else { "INVALID" }
        )
    }
}

fn read_failed(check: &'static str) -> impl FnOnce(StorageError) -> MigrationError {
    move |source| MigrationError::ValidationRead { check, source }
}

async fn sum_revenue(lines: BoxStream<'_, storage::Result<RevenueLine>>) -> storage::Result<Decimal> {
    lines
        .try_fold(Decimal::ZERO, |total, line| async move {
            Ok(total + line.amount())
        })
        .await
}

/// Computes row-count, revenue and referential-integrity parity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    pub async fn validate(&self, stores: &StoreSet) -> Result<ValidationResult, MigrationError> {
        let mut tables = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            let source = stores
                .source
                .count(kind)
                .await
                .map_err(read_failed(CHECK_ROW_COUNT))?;
            let target = stores
                .target_count(kind)
                .await
                .map_err(read_failed(CHECK_ROW_COUNT))?;
            tables.push(TableCount {
                table: kind,
                source,
                target,
            });
        }

        let source_revenue = sum_revenue(stores.source.revenue_lines())
            .await
            .map_err(read_failed(CHECK_SOURCE_REVENUE))?;
        let target_revenue = sum_revenue(stores.billing.revenue_lines())
            .await
            .map_err(read_failed(CHECK_TARGET_REVENUE))?;

        let orphaned_hours = stores
            .billing
            .count_orphaned_hours()
            .await
            .map_err(read_failed(CHECK_FK_INTEGRITY))?;

        Ok(ValidationResult {
            tables,
            source_revenue,
            target_revenue,
            orphaned_hours,
        })
    }
}

/// Emit the validation report: INFO when valid, ERROR with diagnostics
/// otherwise. Both carry the full report as JSON.
pub fn log_report(result: &ValidationResult) {
    let report = result.to_json().to_string();

    if result.is_valid() {
        info!(
            check = "all",
            source = %result.source_revenue,
            target = %result.target_revenue,
            report = %report,
            "Validation passed"
        );
        return;
    }

    for table in result.mismatched_tables() {
        error!(
            check = CHECK_ROW_COUNT,
            table = %table.table,
            source = table.source,
            target = table.target,
            "Row count mismatch"
        );
    }
    if !result.revenue_match() {
        error!(
            check = "revenue",
            source = %result.source_revenue,
            target = %result.target_revenue,
            "Revenue mismatch"
        );
    }
    if !result.fk_integrity() {
        error!(
            check = CHECK_FK_INTEGRITY,
            orphaned_hours = result.orphaned_hours,
            "Billable hours reference missing categories"
        );
    }
    error!(report = %report, "Validation failed");
}
