//! Types for the migration system.

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for migration operations.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Failed to read migrations directory {}: {source}", .path.display())]
    DiscoveryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No migration registered as {identifier} (derived from {name})")]
    UnresolvedUnit { name: String, identifier: String },

    #[error("Migration identifier {0} is already registered")]
    DuplicateIdentifier(String),

    #[error("Migrations {first} and {second} both resolve to {identifier}")]
    AmbiguousIdentifier {
        identifier: String,
        first: String,
        second: String,
    },

    #[error("Migration {0} failed: {1}")]
    MigrationFailed(String, String),

    #[error("Rollback failed for migration {0}: {1}")]
    RollbackFailed(String, String),

    #[error("Migration target {0} does not match any migration")]
    TargetNotFound(String),

    #[error("Could not acquire migration lock {0}")]
    LockUnavailable(String),

    #[error("{0}")]
    UnitError(String),
}

/// A single migration unit.
///
/// A unit owns the connection handle it was constructed with. Both
/// directions must report failures through the returned error; any error
/// aborts the whole run.
///
/// With the MySQL pool, one connection stays checked out by the migration
/// lock while units run, so a unit should not hold more than
/// `POOL_MAX_CONNECTIONS - 2` connections at once.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Human-readable description of what this migration does.
    fn description(&self) -> &str;

    /// Apply the forward change.
    async fn up(&self) -> Result<(), MigrationError>;

    /// Undo the forward change.
    async fn down(&self) -> Result<(), MigrationError>;
}

/// Direction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationDirection {
    /// Apply pending migrations in ascending order.
    Up,
    /// Revert applied migrations in descending order.
    Down,
}

/// One discovered directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    /// Entry name, e.g. `0001_create_users_table.rs`. Sole identity.
    pub name: String,
    pub path: PathBuf,
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub direction: MigrationDirection,
    /// Entry the run was narrowed to, if any.
    pub target: Option<String>,
    /// False when a target was given but no discovered entry carries that name.
    pub target_matched: bool,
    /// Names processed, in execution order.
    pub executed: Vec<String>,
}

/// Applied and pending migrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Applied names in bookkeeping order.
    pub applied: Vec<String>,
    /// Discovered names not yet applied, ascending.
    pub pending: Vec<String>,
}
