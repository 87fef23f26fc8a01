use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),
}

/// Default directory scanned for migration entries.
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Default number of seconds to wait for the migration lock.
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 10;

/// Pool size. One connection is pinned by the migration lock for the whole
/// run; the rest serve bookkeeping writes and the units, which may hold a
/// transaction while also querying the pool.
pub const POOL_MAX_CONNECTIONS: u32 = 5;

/// Database connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl DatabaseConfig {
    /// Check that the settings without a usable default are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingSetting("host"));
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingSetting("database"));
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::MissingSetting("username"));
        }
        Ok(())
    }

    pub fn pool_options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new().max_connections(POOL_MAX_CONNECTIONS)
    }

    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password)
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings for a migration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Directory holding migration entries.
    pub migrations_dir: PathBuf,
    /// How long to wait for another runner to release the lock.
    pub lock_timeout: Duration,
    /// Fail a run whose target matches no migration entry instead of
    /// finishing without doing anything.
    pub strict_target: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            lock_timeout: Duration::from_secs(DEFAULT_LOCK_TIMEOUT_SECS),
            strict_target: false,
        }
    }
}

impl RunnerConfig {
    pub fn with_migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = dir.into();
        self
    }
}

/// Top-level command of the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    Rollback,
    Status,
}

impl Command {
    /// Map a command-line word to a command.
    ///
    /// Returns the command and whether an explicit target is honoured:
    /// unknown words (including an empty one) fall back to a plain `run`
    /// over every pending migration.
    pub fn from_arg(arg: &str) -> (Command, bool) {
        match arg {
            "run" => (Command::Run, true),
            "rollback" => (Command::Rollback, true),
            "status" => (Command::Status, false),
            _ => (Command::Run, false),
        }
    }
}
