//! Application configuration.
//!
//! One URI per store plus connection and run tuning, loaded from YAML files
//! and environment variables.

use serde::Deserialize;

use crate::error::MigrationError;
use crate::storage::StoreRole;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "migration.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "MIGRATION_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "MIGRATION";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "MIGRATION_LOG";
/// Environment variable selecting the log format (`json` or plain text).
pub const LOG_FORMAT_ENV_VAR: &str = "MIGRATION_LOG_FORMAT";

/// Location of one database.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `postgres://...`, `postgresql://...` or `sqlite:...`.
    pub uri: String,
}

impl StoreConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// The four service databases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TargetsConfig {
    pub users: StoreConfig,
    pub customers: StoreConfig,
    pub billing: StoreConfig,
    pub reporting: StoreConfig,
}

impl TargetsConfig {
    pub fn get(&self, role: StoreRole) -> Option<&StoreConfig> {
        match role {
            StoreRole::Source => None,
            StoreRole::Users => Some(&self.users),
            StoreRole::Customers => Some(&self.customers),
            StoreRole::Billing => Some(&self.billing),
            StoreRole::Reporting => Some(&self.reporting),
        }
    }
}

/// Pool sizing and connection retry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Retries after the first failed connection attempt.
    pub connect_retries: usize,
    pub retry_min_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout_secs: 30,
            connect_retries: 5,
            retry_min_delay_ms: 200,
            retry_max_delay_ms: 5000,
        }
    }
}

/// Run behaviour.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Create the target tables before migrating if they do not exist.
    pub init_target_schema: bool,
    /// Migrate users, customers and categories concurrently.
    pub concurrent_leaves: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Legacy monolith database.
    pub source: StoreConfig,
    /// Service databases.
    pub targets: TargetsConfig,
    pub connection: ConnectionConfig,
    pub migration: MigrationConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `migration.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix, e.g.
    ///    `MIGRATION__TARGETS__BILLING__URI`
    pub fn load(path: Option<&str>) -> Result<Self, MigrationError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// URI configured for `role`.
    pub fn uri(&self, role: StoreRole) -> &str {
        match self.targets.get(role) {
            Some(store) => &store.uri,
            None => &self.source.uri,
        }
    }

    /// Reject configurations that cannot possibly run.
    pub fn validate(&self) -> Result<(), MigrationError> {
        let missing: Vec<&str> = std::iter::once(StoreRole::Source)
            .chain(StoreRole::TARGETS)
            .filter(|role| self.uri(*role).trim().is_empty())
            .map(|role| role.as_str())
            .collect();

        if !missing.is_empty() {
            return Err(MigrationError::Config(format!(
                "missing store URI for {}",
                missing.join(", ")
            )));
        }

        if self.connection.max_connections == 0 {
            return Err(MigrationError::Config(
                "connection.max_connections must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
