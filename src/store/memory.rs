use super::AppliedStore;
use crate::migration::MigrationError;
use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    /// `None` until the bookkeeping table is created.
    rows: Option<Vec<(u64, String)>>,
    next_id: u64,
    locked: bool,
}

/// In-process applied store.
///
/// Behaves like the database store: the table is created on the first
/// `load_applied`, inserts are not deduplicated, and the lock is exclusive.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose table already holds `names`, in order.
    pub fn with_applied<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows: Vec<(u64, String)> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (i as u64 + 1, name.into()))
            .collect();
        let next_id = rows.len() as u64 + 1;

        Self {
            state: Mutex::new(MemoryState {
                rows: Some(rows),
                next_id,
                locked: false,
            }),
        }
    }

    /// Whether the bookkeeping table exists.
    pub async fn table_exists(&self) -> bool {
        self.state.lock().await.rows.is_some()
    }

    /// Raw rows in insertion order, duplicates included.
    pub async fn rows(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .rows
            .iter()
            .flatten()
            .map(|(_, name)| name.clone())
            .collect()
    }

    pub async fn is_locked(&self) -> bool {
        self.state.lock().await.locked
    }
}

#[async_trait]
impl AppliedStore for MemoryStore {
    async fn load_applied(&self) -> Result<Vec<String>, MigrationError> {
        let mut state = self.state.lock().await;
        let rows = state.rows.get_or_insert_with(Vec::new);
        Ok(rows.iter().map(|(_, name)| name.clone()).collect())
    }

    async fn mark_applied(&self, name: &str) -> Result<(), MigrationError> {
        let mut state = self.state.lock().await;
        let id = state.next_id.max(1);
        state.next_id = id + 1;
        state
            .rows
            .get_or_insert_with(Vec::new)
            .push((id, name.to_string()));
        Ok(())
    }

    async fn mark_reverted(&self, name: &str) -> Result<(), MigrationError> {
        let mut state = self.state.lock().await;
        if let Some(rows) = state.rows.as_mut() {
            rows.retain(|(_, applied)| applied != name);
        }
        Ok(())
    }

    async fn acquire_lock(&self) -> Result<(), MigrationError> {
        let mut state = self.state.lock().await;
        if state.locked {
            return Err(MigrationError::LockUnavailable("memory".to_string()));
        }
        state.locked = true;
        Ok(())
    }

    async fn release_lock(&self) -> Result<(), MigrationError> {
        self.state.lock().await.locked = false;
        Ok(())
    }
}
