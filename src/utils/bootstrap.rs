//! Bootstrap utilities for the migration binary.

use std::future::Future;
use std::time::Duration;

use backon::Retryable;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConnectionConfig, LOG_ENV_VAR, LOG_FORMAT_ENV_VAR};

use super::retry::{connection_backoff, is_retryable_connect_error};

/// Initialize tracing with the MIGRATION_LOG environment variable.
///
/// Defaults to "info" level if MIGRATION_LOG is not set. Set
/// MIGRATION_LOG_FORMAT=json for one JSON object per event.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var(LOG_FORMAT_ENV_VAR)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Connect to a database with exponential backoff retry.
///
/// # Arguments
/// * `store_name` - Human-readable name for logging (e.g., "billing-service")
/// * `config` - Retry bounds
/// * `connect` - Async function that attempts to establish a connection
///
/// # Returns
/// The connection on success, the first non-transient error, or the last
/// error after max retries.
pub async fn connect_with_retry<T, F, Fut>(
    store_name: &str,
    config: &ConnectionConfig,
    connect: F,
) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let result = connect
        .retry(connection_backoff(config))
        .when(is_retryable_connect_error)
        .notify(|err: &sqlx::Error, dur: Duration| {
            warn!(store = %store_name, error = %err, delay = ?dur, "Connection failed, retrying");
        })
        .await;

    if let Err(err) = &result {
        tracing::error!(store = %store_name, error = %err, "Giving up connecting");
    } else {
        info!(store = %store_name, "Connection established");
    }
    result
}
