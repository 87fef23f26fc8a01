//! Persistence of the applied-migration set.
//!
//! The bookkeeping table `migrations` holds one row per applied migration
//! (`id` surrogate key, `migration` entry name). A row is inserted after a
//! unit's `up` succeeds and deleted after its `down` succeeds.
//!
//! Bookkeeping writes are not part of the unit's own work: a crash between
//! the two leaves the table out of sync with the schema.

mod memory;
mod mysql;

pub use memory::MemoryStore;
pub use mysql::{MySqlStore, DEFAULT_LOCK_NAME};

use crate::migration::MigrationError;
use async_trait::async_trait;

/// Name of the bookkeeping table.
pub const MIGRATIONS_TABLE: &str = "migrations";

/// Store backing the applied set.
#[async_trait]
pub trait AppliedStore: Send + Sync {
    /// All applied migration names in bookkeeping order.
    ///
    /// Creates the bookkeeping table and returns an empty list when it does
    /// not exist yet.
    async fn load_applied(&self) -> Result<Vec<String>, MigrationError>;

    /// Record `name` as applied. Not idempotent.
    async fn mark_applied(&self, name: &str) -> Result<(), MigrationError>;

    /// Remove every record of `name`.
    async fn mark_reverted(&self, name: &str) -> Result<(), MigrationError>;

    /// Take the exclusive migration lock for this process.
    async fn acquire_lock(&self) -> Result<(), MigrationError>;

    /// Release the migration lock. Releasing a lock that is not held is a no-op.
    async fn release_lock(&self) -> Result<(), MigrationError>;
}
