//! Unified SQL SourceStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;

use super::statements;
use super::SqlDatabase;
use crate::identity::EntityKind;

/// Pre-rendered source queries.
///
/// Rendered once per store so that row streams can borrow the SQL text for
/// as long as the cursor is open.
pub(crate) struct SourceQueries {
    pub users: String,
    pub customers: String,
    pub categories: String,
    pub billable_hours: String,
    pub category_rates: String,
    pub revenue_lines: String,
    pub counts: [(EntityKind, String); 4],
}

impl SourceQueries {
    fn render<DB: SqlDatabase>() -> Self {
        Self {
            users: DB::build_select(statements::select_users()),
            customers: DB::build_select(statements::select_customers()),
            categories: DB::build_select(statements::select_categories()),
            billable_hours: DB::build_select(statements::select_billable_hours()),
            category_rates: DB::build_select(statements::select_category_rates()),
            revenue_lines: DB::build_select(statements::select_source_revenue_lines()),
            counts: EntityKind::ALL.map(|kind| (kind, DB::build_select(statements::select_count(kind.table())))),
        }
    }

    pub fn count(&self, kind: EntityKind) -> &str {
        self.counts
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, sql)| sql.as_str())
            .unwrap_or_default()
    }
}

/// SQL-based implementation of SourceStore.
///
/// Reads the legacy single-schema database. Works with any SQL database that
/// implements the `SqlDatabase` trait (PostgreSQL, SQLite).
pub struct SqlSourceStore<DB: SqlDatabase> {
    pool: DB::Pool,
    queries: SourceQueries,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlSourceStore<DB> {
    /// Create a new SQL source store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            queries: SourceQueries::render::<DB>(),
            _marker: PhantomData,
        }
    }
}

/// Macro to implement SourceStore for a specific SQL backend.
macro_rules! impl_source_store {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::SourceStore for SqlSourceStore<$db_type> {
            fn users(
                &self,
            ) -> futures::stream::BoxStream<'_, crate::storage::Result<crate::model::LegacyUser>>
            {
                use futures::StreamExt;

                sqlx::query(&self.queries.users)
                    .fetch(&self.pool)
                    .map(|row| super::codec::decode_user(&row?))
                    .boxed()
            }

            fn customers(
                &self,
            ) -> futures::stream::BoxStream<
                '_,
                crate::storage::Result<crate::model::LegacyCustomer>,
            > {
                use futures::StreamExt;

                sqlx::query(&self.queries.customers)
                    .fetch(&self.pool)
                    .map(|row| super::codec::decode_customer(&row?))
                    .boxed()
            }

            fn categories(
                &self,
            ) -> futures::stream::BoxStream<
                '_,
                crate::storage::Result<crate::model::LegacyCategory>,
            > {
                use futures::StreamExt;

                sqlx::query(&self.queries.categories)
                    .fetch(&self.pool)
                    .map(|row| super::codec::decode_category(&row?))
                    .boxed()
            }

            fn billable_hours(
                &self,
            ) -> futures::stream::BoxStream<
                '_,
                crate::storage::Result<crate::model::LegacyBillableHour>,
            > {
                use futures::StreamExt;

                sqlx::query(&self.queries.billable_hours)
                    .fetch(&self.pool)
                    .map(|row| super::codec::decode_billable_hour(&row?))
                    .boxed()
            }

            async fn category_rates(
                &self,
            ) -> crate::storage::Result<std::collections::HashMap<i64, rust_decimal::Decimal>>
            {
                use super::codec::RowExt;

                let rows = sqlx::query(&self.queries.category_rates)
                    .fetch_all(&self.pool)
                    .await?;

                rows.iter()
                    .map(|row| Ok((row.int("id")?, row.decimal("hourly_rate")?)))
                    .collect()
            }

            async fn count(&self, kind: EntityKind) -> crate::storage::Result<u64> {
                use super::codec::RowExt;

                let row = sqlx::query(self.queries.count(kind))
                    .fetch_one(&self.pool)
                    .await?;
                Ok(row.int("n")?.max(0) as u64)
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
        }
    };
}

// Generate implementations for each SQL backend
impl_source_store!(super::postgres::Postgres, "postgres");
impl_source_store!(super::sqlite::Sqlite, "sqlite");
