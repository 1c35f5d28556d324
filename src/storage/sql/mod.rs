//! Unified SQL storage implementations.
//!
//! This module provides shared implementations for SQL-based stores
//! (PostgreSQL, SQLite). Query construction is backend-neutral sea-query;
//! each backend only decides how statements are rendered and which pool
//! type runs them. Store trait implementations are generated per backend by
//! macros in [`source_store`] and [`target_store`].

mod codec;
mod connect;
mod query;
mod source_store;
mod statements;
mod target_store;

pub use connect::{connect, SqlPool, SqlTarget};
pub use query::SqlDatabase;
pub use source_store::SqlSourceStore;
pub use target_store::SqlTargetStore;

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.

    use sea_query::PostgresQueryBuilder;
    use sqlx::PgPool;

    use crate::storage::schema::{self, postgres as ddl};
    use crate::storage::StoreRole;

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl super::SqlDatabase for Postgres {
        type Pool = PgPool;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn target_ddl(role: StoreRole) -> Option<&'static str> {
            schema::target_ddl(
                role,
                ddl::CREATE_USERS_TABLE,
                ddl::CREATE_CUSTOMERS_TABLE,
                ddl::CREATE_BILLING_TABLES,
                ddl::CREATE_REPORTING_TABLES,
            )
        }
    }

    /// PostgreSQL legacy source.
    pub type PostgresSourceStore = super::SqlSourceStore<Postgres>;

    /// PostgreSQL service target.
    pub type PostgresTargetStore = super::SqlTargetStore<Postgres>;
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.

    use sea_query::SqliteQueryBuilder;
    use sqlx::SqlitePool;

    use crate::storage::schema::{self, sqlite as ddl};
    use crate::storage::StoreRole;

    /// SQLite database marker type.
    pub struct Sqlite;

    impl super::SqlDatabase for Sqlite {
        type Pool = SqlitePool;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn target_ddl(role: StoreRole) -> Option<&'static str> {
            schema::target_ddl(
                role,
                ddl::CREATE_USERS_TABLE,
                ddl::CREATE_CUSTOMERS_TABLE,
                ddl::CREATE_BILLING_TABLES,
                ddl::CREATE_REPORTING_TABLES,
            )
        }
    }

    /// SQLite legacy source.
    pub type SqliteSourceStore = super::SqlSourceStore<Sqlite>;

    /// SQLite service target.
    pub type SqliteTargetStore = super::SqlTargetStore<Sqlite>;
}
