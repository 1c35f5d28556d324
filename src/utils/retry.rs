//! Retry utilities: backoff builders and retryable error classification.
//!
//! Uses `backon` for exponential backoff with jitter. Only establishing a
//! connection is retried; statement failures abort the run.

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::config::ConnectionConfig;

/// Backoff for database connection retries at startup.
///
/// Delays grow from `retry_min_delay_ms` to `retry_max_delay_ms`, at most
/// `connect_retries` retries, with jitter.
pub fn connection_backoff(config: &ConnectionConfig) -> ExponentialBuilder {
    let min_delay = Duration::from_millis(config.retry_min_delay_ms);
    let max_delay = Duration::from_millis(config.retry_max_delay_ms).max(min_delay);

    ExponentialBuilder::default()
        .with_min_delay(min_delay)
        .with_max_delay(max_delay)
        .with_max_times(config.connect_retries)
        .with_jitter()
}

/// Determines if a connection error is worth retrying.
///
/// Retryable:
/// - I/O errors (refused, reset, DNS not ready yet)
/// - TLS handshake failures
/// - Pool acquire timeout or pool closed
///
/// Non-retryable: configuration, authentication and every database-reported
/// error. Those will never succeed on retry.
pub fn is_retryable_connect_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
    )
}
