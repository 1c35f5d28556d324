//! Store URI handling and pool construction.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::ConnectionConfig;
use crate::error::MigrationError;
use crate::storage::{
    BillingTarget, CustomerTarget, ReportingTarget, SourceStore, StoreRole, UserTarget,
};
use crate::utils::bootstrap::connect_with_retry;

#[cfg(feature = "postgres")]
use super::postgres::{PostgresSourceStore, PostgresTargetStore};
#[cfg(feature = "sqlite")]
use super::sqlite::{SqliteSourceStore, SqliteTargetStore};

/// A connected pool for one store, tagged with its backend.
#[derive(Clone)]
pub enum SqlPool {
    #[cfg(feature = "postgres")]
    Postgres(sqlx::PgPool),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlx::SqlitePool),
}

/// Backend of a store URI, decided by its scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Postgres,
    Sqlite,
}

fn backend_for(uri: &str) -> Option<Backend> {
    if uri.starts_with("postgres://") || uri.starts_with("postgresql://") {
        Some(Backend::Postgres)
    } else if uri.starts_with("sqlite:") {
        Some(Backend::Sqlite)
    } else {
        None
    }
}

/// Open a pool for `role`, retrying transient connection failures.
///
/// Fails with `MigrationError::Connection` once retries are exhausted, or
/// immediately for errors that a retry cannot fix (bad credentials, bad
/// URI).
pub async fn connect(
    role: StoreRole,
    uri: &str,
    config: &ConnectionConfig,
) -> Result<SqlPool, MigrationError> {
    let backend = backend_for(uri).ok_or_else(|| MigrationError::UnsupportedUri {
        store: role,
        uri: redact(uri),
    })?;

    let max_connections = config.max_connections.max(1);
    let acquire_timeout = Duration::from_secs(config.acquire_timeout_secs);

    let pool = match backend {
        #[cfg(feature = "postgres")]
        Backend::Postgres => {
            let pool = connect_with_retry(role.as_str(), config, || {
                sqlx::postgres::PgPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(acquire_timeout)
                    .connect(uri)
            })
            .await
            .map_err(|source| MigrationError::Connection { store: role, source })?;
            SqlPool::Postgres(pool)
        }
        #[cfg(feature = "sqlite")]
        Backend::Sqlite => {
            let pool = connect_with_retry(role.as_str(), config, || {
                sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(acquire_timeout)
                    .connect(uri)
            })
            .await
            .map_err(|source| MigrationError::Connection { store: role, source })?;
            SqlPool::Sqlite(pool)
        }
        #[allow(unreachable_patterns)]
        _ => {
            return Err(MigrationError::UnsupportedUri {
                store: role,
                uri: redact(uri),
            })
        }
    };

    info!(store = %role, uri = %redact(uri), "Connected");
    Ok(pool)
}

/// Strip credentials from a URI before it is logged.
pub(crate) fn redact(uri: &str) -> String {
    match (uri.find("://"), uri.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &uri[..scheme_end], &uri[at + 1..])
        }
        _ => uri.to_string(),
    }
}

impl SqlPool {
    /// Wrap this pool as the legacy source.
    pub fn into_source(self) -> Arc<dyn SourceStore> {
        match self {
            #[cfg(feature = "postgres")]
            SqlPool::Postgres(pool) => Arc::new(PostgresSourceStore::new(pool)),
            #[cfg(feature = "sqlite")]
            SqlPool::Sqlite(pool) => Arc::new(SqliteSourceStore::new(pool)),
        }
    }

    /// Wrap this pool as a service target.
    pub fn into_target(self) -> SqlTarget {
        match self {
            #[cfg(feature = "postgres")]
            SqlPool::Postgres(pool) => SqlTarget::Postgres(Arc::new(PostgresTargetStore::new(pool))),
            #[cfg(feature = "sqlite")]
            SqlPool::Sqlite(pool) => SqlTarget::Sqlite(Arc::new(SqliteTargetStore::new(pool))),
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            SqlPool::Postgres(pool) => pool.is_closed(),
            #[cfg(feature = "sqlite")]
            SqlPool::Sqlite(pool) => pool.is_closed(),
        }
    }

    pub async fn close(&self) {
        match self {
            #[cfg(feature = "postgres")]
            SqlPool::Postgres(pool) => pool.close().await,
            #[cfg(feature = "sqlite")]
            SqlPool::Sqlite(pool) => pool.close().await,
        }
    }
}

/// A target store of either backend, viewable as any of the target traits.
#[derive(Clone)]
pub enum SqlTarget {
    #[cfg(feature = "postgres")]
    Postgres(Arc<PostgresTargetStore>),
    #[cfg(feature = "sqlite")]
    Sqlite(Arc<SqliteTargetStore>),
}

macro_rules! as_dyn {
    ($self:ident, $trait:path) => {
        match $self {
            #[cfg(feature = "postgres")]
            SqlTarget::Postgres(store) => Arc::clone(store) as Arc<dyn $trait>,
            #[cfg(feature = "sqlite")]
            SqlTarget::Sqlite(store) => Arc::clone(store) as Arc<dyn $trait>,
        }
    };
}

impl SqlTarget {
    /// Create the tables owned by `role` if they do not exist.
    pub async fn init(&self, role: StoreRole) -> Result<(), MigrationError> {
        let result = match self {
            #[cfg(feature = "postgres")]
            SqlTarget::Postgres(store) => store.init(role).await,
            #[cfg(feature = "sqlite")]
            SqlTarget::Sqlite(store) => store.init(role).await,
        };
        result.map_err(|source| MigrationError::SchemaInit { store: role, source })
    }

    pub fn users(&self) -> Arc<dyn UserTarget> {
        as_dyn!(self, UserTarget)
    }

    pub fn customers(&self) -> Arc<dyn CustomerTarget> {
        as_dyn!(self, CustomerTarget)
    }

    pub fn billing(&self) -> Arc<dyn BillingTarget> {
        as_dyn!(self, BillingTarget)
    }

    pub fn reporting(&self) -> Arc<dyn ReportingTarget> {
        as_dyn!(self, ReportingTarget)
    }
}
