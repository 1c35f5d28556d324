//! Customers: legacy `customers` into the customer service and
//! `report_customers`.

use async_trait::async_trait;
use futures::TryStreamExt;
use tracing::debug;

use super::{source_read, target_write, TableMigrator, TableOutcome};
use crate::error::MigrationError;
use crate::identity::EntityKind;
use crate::mapping::IdentityMappings;
use crate::model::{MigratedCustomer, ReportCustomer};
use crate::storage::StoreSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerMigrator;

#[async_trait]
impl TableMigrator for CustomerMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::Customer
    }

    async fn migrate(
        &self,
        stores: &StoreSet,
        _prior: &IdentityMappings,
    ) -> Result<TableOutcome, MigrationError> {
        let kind = self.kind();
        let mut outcome = TableOutcome::default();
        let mut rows = stores.source.customers();

        while let Some(legacy) = rows.try_next().await.map_err(source_read(kind))? {
            // The legacy creation time is business data here, so it is
            // carried over rather than stamped at migration time.
            let customer = MigratedCustomer {
                id: kind.identity(legacy.id),
                name: legacy.name,
                email: legacy.email,
                address: legacy.address,
                created_at: legacy.created_at,
            };

            stores
                .customers
                .upsert_customer(&customer)
                .await
                .map_err(target_write(kind, legacy.id))?;
            stores
                .reporting
                .upsert_report_customer(&ReportCustomer::from(&customer))
                .await
                .map_err(target_write(kind, legacy.id))?;

            debug!(table = %kind, legacy_id = legacy.id, id = %customer.id, "Migrated row");
            outcome.record(legacy.id, customer.id);
        }

        Ok(outcome)
    }
}
