//! Billing categories: legacy `billing_categories` into the billing service
//! and `report_billing_categories`.

use async_trait::async_trait;
use futures::TryStreamExt;
use tracing::debug;

use super::{source_read, target_write, TableMigrator, TableOutcome};
use crate::error::MigrationError;
use crate::identity::EntityKind;
use crate::mapping::IdentityMappings;
use crate::model::{MigratedCategory, ReportCategory};
use crate::storage::StoreSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryMigrator;

#[async_trait]
impl TableMigrator for CategoryMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::Category
    }

    async fn migrate(
        &self,
        stores: &StoreSet,
        _prior: &IdentityMappings,
    ) -> Result<TableOutcome, MigrationError> {
        let kind = self.kind();
        let mut outcome = TableOutcome::default();
        let mut rows = stores.source.categories();

        while let Some(legacy) = rows.try_next().await.map_err(source_read(kind))? {
            let category = MigratedCategory {
                id: kind.identity(legacy.id),
                name: legacy.name,
                description: legacy.description,
                hourly_rate: legacy.hourly_rate,
            };

            stores
                .billing
                .upsert_category(&category)
                .await
                .map_err(target_write(kind, legacy.id))?;
            stores
                .reporting
                .upsert_report_category(&ReportCategory::from(&category))
                .await
                .map_err(target_write(kind, legacy.id))?;

            debug!(table = %kind, legacy_id = legacy.id, id = %category.id, "Migrated row");
            outcome.record(legacy.id, category.id);
        }

        Ok(outcome)
    }
}
