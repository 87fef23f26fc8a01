//! Migration registry mapping unit identifiers to constructors.

use super::types::{Migration, MigrationError, MigrationRecord};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Constructor for a migration unit, given the live connection handle.
type UnitFactory<C> = Arc<dyn Fn(C) -> Box<dyn Migration> + Send + Sync>;

/// Derive the unit identifier from a migration entry name.
///
/// The extension is dropped, the name is split on `_`, the leading ordering
/// prefix is discarded and the remaining segments are capitalized and
/// joined: `0001_create_users.sql` becomes `CreateUsers`.
pub fn unit_identifier(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    stem.split('_').skip(1).map(capitalize).collect()
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Registry of all known migration units.
///
/// Units are looked up by the identifier derived from a discovered entry
/// name, then constructed with the connection handle `C`.
pub struct MigrationRegistry<C> {
    factories: HashMap<String, UnitFactory<C>>,
}

impl<C> MigrationRegistry<C> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a unit constructor under `identifier`.
    ///
    /// Each identifier may only be registered once.
    pub fn register<F>(&mut self, identifier: impl Into<String>, factory: F) -> Result<(), MigrationError>
    where
        F: Fn(C) -> Box<dyn Migration> + Send + Sync + 'static,
    {
        let identifier = identifier.into();
        if self.factories.contains_key(&identifier) {
            return Err(MigrationError::DuplicateIdentifier(identifier));
        }
        self.factories.insert(identifier, Arc::new(factory));
        Ok(())
    }

    /// Whether a unit is registered for `identifier`.
    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// All registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = self.factories.keys().cloned().collect();
        identifiers.sort();
        identifiers
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Construct the unit for a discovered record.
    pub fn resolve(
        &self,
        record: &MigrationRecord,
        connection: C,
    ) -> Result<Box<dyn Migration>, MigrationError> {
        let identifier = unit_identifier(&record.name);
        let factory = self
            .factories
            .get(&identifier)
            .ok_or_else(|| MigrationError::UnresolvedUnit {
                name: record.name.clone(),
                identifier: identifier.clone(),
            })?;

        Ok(factory(connection))
    }
}

impl<C> Default for MigrationRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
