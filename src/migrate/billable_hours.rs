//! Billable hours: legacy `billable_hours` into the billing service and
//! `report_billable_hours`, with foreign keys remapped and the rate snapshot
//! backfilled.

use async_trait::async_trait;
use futures::TryStreamExt;
use tracing::{debug, warn};

use super::{
    source_read, target_write, ForeignRef, SkipReason, SkippedRow, TableMigrator, TableOutcome,
};
use crate::error::MigrationError;
use crate::identity::EntityKind;
use crate::mapping::IdentityMappings;
use crate::model::{LegacyBillableHour, MigratedBillableHour, RateSnapshot};
use crate::storage::StoreSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct BillableHourMigrator;

/// Resolve all three foreign keys, or list the ones that have no mapping.
fn resolve_refs(
    hour: &LegacyBillableHour,
    prior: &IdentityMappings,
) -> Result<(uuid::Uuid, uuid::Uuid, uuid::Uuid), Vec<ForeignRef>> {
    let refs = [
        (EntityKind::Customer, hour.customer_id),
        (EntityKind::User, hour.user_id),
        (EntityKind::Category, hour.category_id),
    ];
    let resolved = refs.map(|(kind, legacy_id)| prior.resolve(kind, legacy_id));

    match resolved {
        [Some(customer), Some(user), Some(category)] => Ok((customer, user, category)),
        _ => Err(refs
            .iter()
            .zip(resolved)
            .filter(|(_, id)| id.is_none())
            .map(|(&(kind, legacy_id), _)| ForeignRef { kind, legacy_id })
            .collect()),
    }
}

#[async_trait]
impl TableMigrator for BillableHourMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::BillableHour
    }

    fn depends_on(&self) -> &'static [EntityKind] {
        &[EntityKind::User, EntityKind::Customer, EntityKind::Category]
    }

    async fn migrate(
        &self,
        stores: &StoreSet,
        prior: &IdentityMappings,
    ) -> Result<TableOutcome, MigrationError> {
        let kind = self.kind();
        let mut outcome = TableOutcome::default();

        // One lookup per run, not per row.
        let rates = stores
            .source
            .category_rates()
            .await
            .map_err(source_read(kind))?;
        debug!(categories = rates.len(), "Loaded category rates");

        let mut rows = stores.source.billable_hours();

        while let Some(legacy) = rows.try_next().await.map_err(source_read(kind))? {
            let (customer_id, user_id, category_id) = match resolve_refs(&legacy, prior) {
                Ok(ids) => ids,
                Err(missing) => {
                    warn!(
                        table = %kind,
                        legacy_id = legacy.id,
                        customer_id = legacy.customer_id,
                        user_id = legacy.user_id,
                        category_id = legacy.category_id,
                        missing = ?missing,
                        "Skipping billable hour with unmigrated reference"
                    );
                    outcome.skipped.push(SkippedRow {
                        table: kind,
                        legacy_id: legacy.id,
                        reason: SkipReason::MissingForeignKeyMapping { missing },
                    });
                    continue;
                }
            };

            let Some(rate) = rates.get(&legacy.category_id).copied() else {
                warn!(
                    table = %kind,
                    legacy_id = legacy.id,
                    category_id = legacy.category_id,
                    "Skipping billable hour without a category rate"
                );
                outcome.skipped.push(SkippedRow {
                    table: kind,
                    legacy_id: legacy.id,
                    reason: SkipReason::MissingRate {
                        category_id: legacy.category_id,
                    },
                });
                continue;
            };

            let hour = MigratedBillableHour {
                id: kind.identity(legacy.id),
                customer_id,
                user_id,
                category_id,
                hours: legacy.hours,
                rate_snapshot: RateSnapshot(rate),
                date_logged: legacy.date_logged,
                note: legacy.note,
                created_at: legacy.created_at,
            };

            stores
                .billing
                .upsert_billable_hour(&hour)
                .await
                .map_err(target_write(kind, legacy.id))?;
            stores
                .reporting
                .upsert_report_billable_hour(&hour)
                .await
                .map_err(target_write(kind, legacy.id))?;

            debug!(table = %kind, legacy_id = legacy.id, id = %hour.id, rate = %rate, "Migrated row");
            outcome.record(legacy.id, hour.id);
        }

        Ok(outcome)
    }
}
