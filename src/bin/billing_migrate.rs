//! billing-migrate: one-shot legacy billing migration
//!
//! Copies the legacy monolith database into the user, customer, billing and
//! reporting service databases, then checks row-count, revenue and
//! referential-integrity parity.
//!
//! ## Configuration
//! - `migration.yaml` in the working directory, or the file named by
//!   MIGRATION_CONFIG
//! - MIGRATION__SOURCE__URI, MIGRATION__TARGETS__<ROLE>__URI: store URIs
//! - MIGRATION_LOG: tracing filter (default: info)
//! - MIGRATION_LOG_FORMAT=json: JSON log lines
//!
//! ## Exit status
//! - 0: migration finished and validation passed
//! - 1: validation failed (data has been written)
//! - 2: the run aborted (configuration, connection, read or write error)

use std::process::ExitCode;

use tracing::{error, info};

use billing_migration::config::Config;
use billing_migration::error::MigrationError;
use billing_migration::runner::Runner;
use billing_migration::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match Config::load(None) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            return ExitCode::from(2);
        }
    };

    let outcome = Runner::new(config)
        .run()
        .await
        .and_then(|outcome| outcome.ensure_valid());

    match outcome {
        Ok(outcome) => {
            info!(result = %outcome.migration, validation = %outcome.validation, "Migration succeeded");
            ExitCode::SUCCESS
        }
        Err(MigrationError::ValidationMismatch(result)) => {
            for line in result.diagnostics() {
                eprintln!("{}", line);
            }
            error!(validation = %result, "Migration written but validation failed");
            ExitCode::from(1)
        }
        Err(err) => {
            error!(error = %err, "Migration aborted");
            ExitCode::from(2)
        }
    }
}
