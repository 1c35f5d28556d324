//! Unified SQL target store implementation.
//!
//! One store type serves every target role; which tables exist in its
//! database decides which trait methods are usable. The runner hands each
//! role's pool to its own store instance.

use std::marker::PhantomData;

use super::statements;
use super::SqlDatabase;
use crate::identity::EntityKind;

/// Pre-rendered target read queries.
pub(crate) struct TargetQueries {
    pub counts: [(EntityKind, String); 4],
    pub report_counts: [(EntityKind, String); 4],
    pub revenue_lines: String,
    pub orphaned_hours: String,
}

impl TargetQueries {
    fn render<DB: SqlDatabase>() -> Self {
        Self {
            counts: EntityKind::ALL
                .map(|kind| (kind, DB::build_select(statements::select_count(kind.table())))),
            report_counts: EntityKind::ALL
                .map(|kind| (kind, DB::build_select(statements::select_report_count(kind)))),
            revenue_lines: DB::build_select(statements::select_target_revenue_lines()),
            orphaned_hours: DB::build_select(statements::select_orphaned_hours()),
        }
    }

    pub fn count(&self, kind: EntityKind) -> &str {
        lookup(&self.counts, kind)
    }

    pub fn report_count(&self, kind: EntityKind) -> &str {
        lookup(&self.report_counts, kind)
    }
}

fn lookup(queries: &[(EntityKind, String); 4], kind: EntityKind) -> &str {
    queries
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, sql)| sql.as_str())
        .unwrap_or_default()
}

/// SQL-based implementation of the target store traits.
pub struct SqlTargetStore<DB: SqlDatabase> {
    pool: DB::Pool,
    queries: TargetQueries,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlTargetStore<DB> {
    /// Create a new SQL target store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            queries: TargetQueries::render::<DB>(),
            _marker: PhantomData,
        }
    }
}

/// Macro to implement the target traits for a specific SQL backend.
macro_rules! impl_target_store {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlTargetStore<$db_type> {
            /// Create the tables owned by `role` if they do not exist.
            pub async fn init(
                &self,
                role: crate::storage::StoreRole,
            ) -> crate::storage::Result<()> {
                if let Some(ddl) = <$db_type as SqlDatabase>::target_ddl(role) {
                    sqlx::raw_sql(ddl).execute(&self.pool).await?;
                }
                Ok(())
            }

            // Rendered before any await: sea-query statements are not Send.
            fn render_insert(stmt: sea_query::InsertStatement) -> String {
                <$db_type as SqlDatabase>::build_insert(stmt)
            }

            async fn execute_insert(&self, sql: String) -> crate::storage::Result<()> {
                sqlx::query(&sql).execute(&self.pool).await?;
                Ok(())
            }

            async fn fetch_count(&self, sql: &str) -> crate::storage::Result<u64> {
                use super::codec::RowExt;

                let row = sqlx::query(sql).fetch_one(&self.pool).await?;
                Ok(row.int("n")?.max(0) as u64)
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::UserTarget for SqlTargetStore<$db_type> {
            async fn upsert_user(
                &self,
                user: &crate::model::MigratedUser,
            ) -> crate::storage::Result<()> {
                let sql = Self::render_insert(statements::upsert_user(user, chrono::Utc::now()));
                self.execute_insert(sql).await
            }

            async fn count_users(&self) -> crate::storage::Result<u64> {
                self.fetch_count(self.queries.count(EntityKind::User)).await
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::CustomerTarget for SqlTargetStore<$db_type> {
            async fn upsert_customer(
                &self,
                customer: &crate::model::MigratedCustomer,
            ) -> crate::storage::Result<()> {
                let sql = Self::render_insert(statements::upsert_customer(customer, chrono::Utc::now()));
                self.execute_insert(sql).await
            }

            async fn count_customers(&self) -> crate::storage::Result<u64> {
                self.fetch_count(self.queries.count(EntityKind::Customer))
                    .await
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::BillingTarget for SqlTargetStore<$db_type> {
            async fn upsert_category(
                &self,
                category: &crate::model::MigratedCategory,
            ) -> crate::storage::Result<()> {
                let sql = Self::render_insert(statements::upsert_category(category, chrono::Utc::now()));
                self.execute_insert(sql).await
            }

            async fn upsert_billable_hour(
                &self,
                hour: &crate::model::MigratedBillableHour,
            ) -> crate::storage::Result<()> {
                let sql = Self::render_insert(statements::upsert_billable_hour(hour, chrono::Utc::now()));
                self.execute_insert(sql).await
            }

            async fn count_categories(&self) -> crate::storage::Result<u64> {
                self.fetch_count(self.queries.count(EntityKind::Category))
                    .await
            }

            async fn count_billable_hours(&self) -> crate::storage::Result<u64> {
                self.fetch_count(self.queries.count(EntityKind::BillableHour))
                    .await
            }

            fn revenue_lines(
                &self,
            ) -> futures::stream::BoxStream<'_, crate::storage::Result<crate::model::RevenueLine>>
            {
                use futures::StreamExt;

                sqlx::query(&self.queries.revenue_lines)
                    .fetch(&self.pool)
                    .map(|row| super::codec::decode_revenue_line(&row?))
                    .boxed()
            }

            async fn count_orphaned_hours(&self) -> crate::storage::Result<u64> {
                self.fetch_count(&self.queries.orphaned_hours).await
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::ReportingTarget for SqlTargetStore<$db_type> {
            async fn upsert_report_user(
                &self,
                user: &crate::model::ReportUser,
            ) -> crate::storage::Result<()> {
                let sql = Self::render_insert(statements::upsert_report_user(user));
                self.execute_insert(sql).await
            }

            async fn upsert_report_customer(
                &self,
                customer: &crate::model::ReportCustomer,
            ) -> crate::storage::Result<()> {
                let sql = Self::render_insert(statements::upsert_report_customer(customer));
                self.execute_insert(sql).await
            }

            async fn upsert_report_category(
                &self,
                category: &crate::model::ReportCategory,
            ) -> crate::storage::Result<()> {
                let sql = Self::render_insert(statements::upsert_report_category(category));
                self.execute_insert(sql).await
            }

            async fn upsert_report_billable_hour(
                &self,
                hour: &crate::model::MigratedBillableHour,
            ) -> crate::storage::Result<()> {
                let sql = Self::render_insert(statements::upsert_report_billable_hour(hour));
                self.execute_insert(sql).await
            }

            async fn count(&self, kind: EntityKind) -> crate::storage::Result<u64> {
                self.fetch_count(self.queries.report_count(kind)).await
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_target_store!(super::postgres::Postgres, "postgres");
impl_target_store!(super::sqlite::Sqlite, "sqlite");

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::identity::EntityKind;
    use crate::model::MigratedCategory;
    use crate::storage::sql::sqlite::SqliteTargetStore;
    use crate::storage::{BillingTarget, StoreRole};

    async fn billing_store() -> Arc<SqliteTargetStore> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = Arc::new(SqliteTargetStore::new(pool));
        store.init(StoreRole::Billing).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_upserts_run_on_spawned_tasks() {
        let store = billing_store().await;
        let mut category = MigratedCategory {
            id: EntityKind::Category.identity(1),
            name: "Development".to_string(),
            description: None,
            hourly_rate: Decimal::new(15000, 2),
        };

        let writer = Arc::clone(&store);
        let written = category.clone();
        tokio::spawn(async move { writer.upsert_category(&written).await })
            .await
            .unwrap()
            .unwrap();

        category.name = "Engineering".to_string();
        let writer = Arc::clone(&store);
        tokio::spawn(async move { writer.upsert_category(&category).await })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(store.count_categories().await.unwrap(), 1);
    }
}
