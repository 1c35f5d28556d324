//! Users: legacy `users` into the user service and `report_users`.

use async_trait::async_trait;
use futures::TryStreamExt;
use tracing::debug;

use super::{source_read, target_write, TableMigrator, TableOutcome};
use crate::error::MigrationError;
use crate::identity::EntityKind;
use crate::mapping::IdentityMappings;
use crate::model::{MigratedUser, ReportUser};
use crate::storage::StoreSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct UserMigrator;

#[async_trait]
impl TableMigrator for UserMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::User
    }

    async fn migrate(
        &self,
        stores: &StoreSet,
        _prior: &IdentityMappings,
    ) -> Result<TableOutcome, MigrationError> {
        let kind = self.kind();
        let mut outcome = TableOutcome::default();
        let mut rows = stores.source.users();

        while let Some(legacy) = rows.try_next().await.map_err(source_read(kind))? {
            let user = MigratedUser {
                id: kind.identity(legacy.id),
                name: legacy.name,
                email: legacy.email,
            };

            stores
                .users
                .upsert_user(&user)
                .await
                .map_err(target_write(kind, legacy.id))?;
            stores
                .reporting
                .upsert_report_user(&ReportUser::from(&user))
                .await
                .map_err(target_write(kind, legacy.id))?;

            debug!(table = %kind, legacy_id = legacy.id, id = %user.id, "Migrated row");
            outcome.record(legacy.id, user.id);
        }

        Ok(outcome)
    }
}
