#![allow(dead_code)]

use async_trait::async_trait;
use migrate_runner::{
    unit_identifier, AppliedStore, MemoryStore, Migration, MigrationError, MigrationExecutor,
    MigrationRegistry, RunnerConfig,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Connection handle handed to test units: records every call and can be
/// told to make given units fail.
#[derive(Clone, Default)]
pub struct TestDb {
    journal: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl TestDb {
    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn fail(&self, identifier: &str) {
        self.failing.lock().unwrap().insert(identifier.to_string());
    }

    fn record(&self, call: String) -> Result<(), MigrationError> {
        let identifier = call.split(':').nth(1).unwrap_or_default().to_string();
        if self.failing.lock().unwrap().contains(&identifier) {
            return Err(MigrationError::UnitError(format!("{} exploded", identifier)));
        }
        self.journal.lock().unwrap().push(call);
        Ok(())
    }
}

struct RecordingUnit {
    identifier: String,
    db: TestDb,
}

#[async_trait]
impl Migration for RecordingUnit {
    fn description(&self) -> &str {
        &self.identifier
    }

    async fn up(&self) -> Result<(), MigrationError> {
        self.db.record(format!("up:{}", self.identifier))
    }

    async fn down(&self) -> Result<(), MigrationError> {
        self.db.record(format!("down:{}", self.identifier))
    }
}

/// Store whose bookkeeping calls can be made to fail. Everything else is
/// served by the wrapped [`MemoryStore`].
pub struct FailingStore {
    inner: Arc<MemoryStore>,
    fail_load: AtomicBool,
    fail_mark_applied: Mutex<Option<String>>,
}

impl FailingStore {
    fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_load: AtomicBool::new(false),
            fail_mark_applied: Mutex::new(None),
        }
    }

    pub fn fail_load(&self) {
        self.fail_load.store(true, Ordering::SeqCst);
    }

    pub fn fail_mark_applied(&self, name: &str) {
        *self.fail_mark_applied.lock().unwrap() = Some(name.to_string());
    }

    fn broken(what: &str) -> MigrationError {
        MigrationError::DatabaseError(sqlx::Error::Protocol(format!("{} lost connection", what)))
    }
}

#[async_trait]
impl AppliedStore for FailingStore {
    async fn load_applied(&self) -> Result<Vec<String>, MigrationError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(Self::broken("load_applied"));
        }
        self.inner.load_applied().await
    }

    async fn mark_applied(&self, name: &str) -> Result<(), MigrationError> {
        let fails = self.fail_mark_applied.lock().unwrap().as_deref() == Some(name);
        if fails {
            return Err(Self::broken("mark_applied"));
        }
        self.inner.mark_applied(name).await
    }

    async fn mark_reverted(&self, name: &str) -> Result<(), MigrationError> {
        self.inner.mark_reverted(name).await
    }

    async fn acquire_lock(&self) -> Result<(), MigrationError> {
        self.inner.acquire_lock().await
    }

    async fn release_lock(&self) -> Result<(), MigrationError> {
        self.inner.release_lock().await
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub db: TestDb,
    /// Backing store, for inspecting bookkeeping state.
    pub store: Arc<MemoryStore>,
    /// Store the executor talks to.
    pub faults: Arc<FailingStore>,
    pub executor: MigrationExecutor<TestDb>,
}

impl Harness {
    pub async fn applied(&self) -> Vec<String> {
        self.store.load_applied().await.expect("Should load applied set")
    }
}

/// Create a migrations directory holding `entries` and register a recording
/// unit for each entry's identifier.
pub fn harness(entries: &[&str]) -> Harness {
    build(entries, entries, MemoryStore::new(), RunnerConfig::default())
}

/// Like [`harness`] but with control over registered units, store and
/// runner settings.
pub fn build(
    entries: &[&str],
    registered: &[&str],
    store: MemoryStore,
    config: RunnerConfig,
) -> Harness {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    for entry in entries {
        std::fs::write(dir.path().join(entry), "").expect("Should write entry");
    }

    let mut registry = MigrationRegistry::new();
    let mut seen = HashSet::new();
    for entry in registered {
        let identifier = unit_identifier(entry);
        if identifier.is_empty() || !seen.insert(identifier.clone()) {
            continue;
        }
        let label = identifier.clone();
        registry
            .register(identifier, move |db: TestDb| {
                Box::new(RecordingUnit {
                    identifier: label.clone(),
                    db,
                }) as Box<dyn Migration>
            })
            .expect("Should register unit");
    }

    let db = TestDb::default();
    let store = Arc::new(store);
    let faults = Arc::new(FailingStore::new(store.clone()));
    let executor = MigrationExecutor::new(
        Arc::new(registry),
        faults.clone(),
        db.clone(),
        config.with_migrations_dir(dir.path()),
    );

    Harness {
        dir,
        db,
        store,
        faults,
        executor,
    }
}
