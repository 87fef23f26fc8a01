//! Migration system.
//!
//! # Overview
//!
//! - Migration entries are discovered in a directory and ordered by name
//! - Each entry name maps to a unit identifier (`0001_create_users.rs` is
//!   `CreateUsers`) looked up in a `MigrationRegistry`
//! - Each unit implements the `Migration` trait with `up()` and `down()`
//! - The `MigrationExecutor` applies pending units or reverts applied ones,
//!   recording each one in the bookkeeping table as it completes
//! - The first failing unit stops the run; nothing already done is undone
//!
//! # Usage
//!
//! ```ignore
//! let registry = create_registry()?;
//! let store = Arc::new(MySqlStore::new(pool.clone(), config.lock_timeout));
//! let executor = MigrationExecutor::new(registry, store, pool, config);
//! let report = executor.migrate(None).await?;
//! ```

mod bundled;
mod discovery;
mod executor;
mod registry;
mod types;

pub use discovery::discover;
pub use executor::MigrationExecutor;
pub use registry::{unit_identifier, MigrationRegistry};
pub use types::{
    Migration, MigrationDirection, MigrationError, MigrationRecord, MigrationStatus, RunReport,
};

use sqlx::MySqlPool;
use std::sync::Arc;

/// Create the registry holding every unit bundled from `migrations/`.
pub fn create_registry() -> Result<Arc<MigrationRegistry<MySqlPool>>, MigrationError> {
    let mut registry = MigrationRegistry::new();
    bundled::register_bundled(&mut registry)?;
    Ok(Arc::new(registry))
}
