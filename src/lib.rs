pub mod config;
pub mod migration;
pub mod store;

// Re-export commonly used types
pub use config::{Command, ConfigError, DatabaseConfig, RunnerConfig};
pub use migration::{
    create_registry, discover, unit_identifier, Migration, MigrationDirection, MigrationError,
    MigrationExecutor, MigrationRecord, MigrationRegistry, MigrationStatus, RunReport,
};
pub use store::{AppliedStore, MemoryStore, MySqlStore, DEFAULT_LOCK_NAME, MIGRATIONS_TABLE};
