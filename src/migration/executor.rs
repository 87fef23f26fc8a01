//! Migration executor reconciling discovered units with the applied set.

use super::discovery::discover;
use super::registry::{unit_identifier, MigrationRegistry};
use super::types::{
    MigrationDirection, MigrationError, MigrationRecord, MigrationStatus, RunReport,
};
use crate::config::RunnerConfig;
use crate::store::AppliedStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Executor for running migrations.
///
/// Owns the connection handle `C` that every resolved unit is constructed
/// with, the store holding the applied set, and the registry of units.
pub struct MigrationExecutor<C> {
    registry: Arc<MigrationRegistry<C>>,
    store: Arc<dyn AppliedStore>,
    connection: C,
    config: RunnerConfig,
}

impl<C: Clone + Send + Sync> MigrationExecutor<C> {
    /// Create a new executor.
    pub fn new(
        registry: Arc<MigrationRegistry<C>>,
        store: Arc<dyn AppliedStore>,
        connection: C,
        config: RunnerConfig,
    ) -> Self {
        Self {
            registry,
            store,
            connection,
            config,
        }
    }

    /// Apply or revert migrations.
    ///
    /// `Up` runs every discovered migration not yet applied, in ascending
    /// order; `Down` reverts every applied one, in descending order. With a
    /// `target` only the entry of that exact name is considered.
    ///
    /// The first unit failure stops the run. Units already processed in this
    /// run keep their new state.
    pub async fn run(
        &self,
        direction: MigrationDirection,
        target: Option<&str>,
    ) -> Result<RunReport, MigrationError> {
        self.store.acquire_lock().await?;

        let outcome = self.run_locked(direction, target).await;

        if let Err(e) = self.store.release_lock().await {
            warn!(error = %e, "Failed to release migration lock");
        }

        outcome
    }

    /// Apply all pending migrations.
    pub async fn migrate(&self, target: Option<&str>) -> Result<RunReport, MigrationError> {
        self.run(MigrationDirection::Up, target).await
    }

    /// Revert all applied migrations.
    pub async fn rollback(&self, target: Option<&str>) -> Result<RunReport, MigrationError> {
        self.run(MigrationDirection::Down, target).await
    }

    async fn run_locked(
        &self,
        direction: MigrationDirection,
        target: Option<&str>,
    ) -> Result<RunReport, MigrationError> {
        info!(dir = %self.config.migrations_dir.display(), "Reading migration files");
        let records = discover(&self.config.migrations_dir, direction).await?;
        check_identifiers(&records)?;

        let target_matched = match target {
            Some(t) => records.iter().any(|r| r.name == t),
            None => true,
        };
        if !target_matched {
            let t = target.unwrap_or_default();
            if self.config.strict_target {
                return Err(MigrationError::TargetNotFound(t.to_string()));
            }
            warn!(migration_target = t, "Migration target matches no migration file");
        }

        let applied = self.store.load_applied().await?;
        let applied: HashSet<&str> = applied.iter().map(String::as_str).collect();

        let mut executed = Vec::new();

        for record in &records {
            if target.is_some_and(|t| t != record.name) {
                continue;
            }

            let is_applied = applied.contains(record.name.as_str());
            let eligible = match direction {
                MigrationDirection::Up => !is_applied,
                MigrationDirection::Down => is_applied,
            };
            if !eligible {
                debug!(migration = %record.name, "Skipping migration");
                continue;
            }

            self.execute(record, direction).await?;
            executed.push(record.name.clone());
        }

        match direction {
            MigrationDirection::Up => {
                info!(count = executed.len(), "Migration completed successfully")
            }
            MigrationDirection::Down => {
                info!(count = executed.len(), "Rollback completed successfully")
            }
        }

        Ok(RunReport {
            direction,
            target: target.map(str::to_string),
            target_matched,
            executed,
        })
    }

    async fn execute(
        &self,
        record: &MigrationRecord,
        direction: MigrationDirection,
    ) -> Result<(), MigrationError> {
        let unit = self.registry.resolve(record, self.connection.clone())?;

        match direction {
            MigrationDirection::Up => {
                info!(migration = %record.name, description = unit.description(), "Executing migration");
                if let Err(e) = unit.up().await {
                    error!(migration = %record.name, error = %e, "Migration failed");
                    return Err(MigrationError::MigrationFailed(record.name.clone(), e.to_string()));
                }
                self.store.mark_applied(&record.name).await?;
                info!(migration = %record.name, "Migration executed successfully");
            }
            MigrationDirection::Down => {
                info!(migration = %record.name, description = unit.description(), "Rolling back migration");
                if let Err(e) = unit.down().await {
                    error!(migration = %record.name, error = %e, "Rollback failed");
                    return Err(MigrationError::RollbackFailed(record.name.clone(), e.to_string()));
                }
                self.store.mark_reverted(&record.name).await?;
                info!(migration = %record.name, "Rollback executed successfully");
            }
        }

        Ok(())
    }

    /// Applied migrations in bookkeeping order and pending ones in ascending
    /// order. Creates the bookkeeping table if it is missing.
    pub async fn status(&self) -> Result<MigrationStatus, MigrationError> {
        let applied = self.store.load_applied().await?;
        let records = discover(&self.config.migrations_dir, MigrationDirection::Up).await?;

        let applied_set: HashSet<&str> = applied.iter().map(String::as_str).collect();
        let pending = records
            .into_iter()
            .filter(|r| !applied_set.contains(r.name.as_str()))
            .map(|r| r.name)
            .collect();

        Ok(MigrationStatus { applied, pending })
    }
}

/// Reject entries that would resolve to the same unit. Entries without a
/// name segment never resolve and are left to fail at resolution.
fn check_identifiers(records: &[MigrationRecord]) -> Result<(), MigrationError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for record in records {
        let identifier = unit_identifier(&record.name);
        if identifier.is_empty() {
            continue;
        }
        if let Some(first) = seen.insert(identifier.clone(), &record.name) {
            let (first, second) = if first < record.name.as_str() {
                (first, record.name.as_str())
            } else {
                (record.name.as_str(), first)
            };
            return Err(MigrationError::AmbiguousIdentifier {
                identifier,
                first: first.to_string(),
                second: second.to_string(),
            });
        }
    }
    Ok(())
}
