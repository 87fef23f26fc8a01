use super::{AppliedStore, MIGRATIONS_TABLE};
use crate::migration::MigrationError;
use async_trait::async_trait;
use sqlx::mysql::MySqlPool;
use sqlx::pool::PoolConnection;
use sqlx::MySql;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// SQLSTATE for "base table or view not found".
const TABLE_NOT_FOUND: &str = "42S02";

/// Name of the advisory lock taken with `GET_LOCK`.
pub const DEFAULT_LOCK_NAME: &str = "migrate_runner";

/// MySQL-backed applied store.
///
/// The advisory lock is session scoped, so the connection that took it is
/// kept out of the pool until the lock is released.
pub struct MySqlStore {
    pool: MySqlPool,
    lock_name: String,
    lock_timeout: Duration,
    lock_conn: Mutex<Option<PoolConnection<MySql>>>,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool, lock_timeout: Duration) -> Self {
        Self {
            pool,
            lock_name: DEFAULT_LOCK_NAME.to_string(),
            lock_timeout,
            lock_conn: Mutex::new(None),
        }
    }

    /// Use a different advisory lock name, e.g. to run several independent
    /// migration sets against one server.
    pub fn with_lock_name(mut self, lock_name: impl Into<String>) -> Self {
        self.lock_name = lock_name.into();
        self
    }

    /// `GET_LOCK` takes signed seconds and waits forever on negative values.
    fn lock_timeout_secs(&self) -> i64 {
        i64::try_from(self.lock_timeout.as_secs()).unwrap_or(i64::MAX)
    }

    async fn create_table(&self) -> Result<(), MigrationError> {
        info!(table = MIGRATIONS_TABLE, "Creating bookkeeping table");
        let ddl = format!(
            "CREATE TABLE {MIGRATIONS_TABLE} (
                id INT(11) AUTO_INCREMENT PRIMARY KEY,
                migration VARCHAR(255) NOT NULL
            )"
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }
}

fn is_table_not_found(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(TABLE_NOT_FOUND),
        _ => false,
    }
}

#[async_trait]
impl AppliedStore for MySqlStore {
    async fn load_applied(&self) -> Result<Vec<String>, MigrationError> {
        let query = format!("SELECT migration FROM {MIGRATIONS_TABLE} ORDER BY id");
        match sqlx::query_scalar::<_, String>(&query)
            .fetch_all(&self.pool)
            .await
        {
            Ok(names) => Ok(names),
            Err(e) if is_table_not_found(&e) => {
                self.create_table().await?;
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn mark_applied(&self, name: &str) -> Result<(), MigrationError> {
        let query = format!("INSERT INTO {MIGRATIONS_TABLE} (migration) VALUES (?)");
        sqlx::query(&query).bind(name).execute(&self.pool).await?;
        Ok(())
    }

    async fn mark_reverted(&self, name: &str) -> Result<(), MigrationError> {
        let query = format!("DELETE FROM {MIGRATIONS_TABLE} WHERE migration = ?");
        sqlx::query(&query).bind(name).execute(&self.pool).await?;
        Ok(())
    }

    async fn acquire_lock(&self) -> Result<(), MigrationError> {
        let mut held = self.lock_conn.lock().await;
        if held.is_some() {
            return Ok(());
        }

        let mut conn = self.pool.acquire().await?;
        // 1 = acquired, 0 = timed out, NULL = error
        let acquired: Option<i64> = sqlx::query_scalar("SELECT GET_LOCK(?, ?)")
            .bind(self.lock_name.as_str())
            .bind(self.lock_timeout_secs())
            .fetch_one(&mut *conn)
            .await?;

        if acquired != Some(1) {
            return Err(MigrationError::LockUnavailable(self.lock_name.clone()));
        }

        debug!(lock = %self.lock_name, "Acquired migration lock");
        *held = Some(conn);
        Ok(())
    }

    async fn release_lock(&self) -> Result<(), MigrationError> {
        let Some(mut conn) = self.lock_conn.lock().await.take() else {
            return Ok(());
        };

        let released = sqlx::query("SELECT RELEASE_LOCK(?)")
            .bind(self.lock_name.as_str())
            .execute(&mut *conn)
            .await;

        if let Err(e) = released {
            // Ending the session is the only other way to drop the named lock
            if let Err(close_err) = conn.close().await {
                warn!(lock = %self.lock_name, error = %close_err, "Failed to close lock connection");
            }
            return Err(e.into());
        }

        debug!(lock = %self.lock_name, "Released migration lock");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use sqlx::mysql::MySqlConnectOptions;
    use std::borrow::Cow;
    use std::error::Error as StdError;

    #[derive(Debug, thiserror::Error)]
    #[error("database error {0}")]
    struct CodedError(&'static str);

    impl DatabaseError for CodedError {
        fn message(&self) -> &str {
            "database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn lazy_store(lock_timeout: Duration) -> MySqlStore {
        let pool = MySqlPool::connect_lazy_with(MySqlConnectOptions::new().host("127.0.0.1"));
        MySqlStore::new(pool, lock_timeout)
    }

    #[test]
    fn test_missing_table_is_recoverable() {
        let err = sqlx::Error::Database(Box::new(CodedError("42S02")));
        assert!(is_table_not_found(&err));
    }

    #[test]
    fn test_other_database_errors_are_not_recoverable() {
        // 42000: syntax error or access violation
        let err = sqlx::Error::Database(Box::new(CodedError("42000")));
        assert!(!is_table_not_found(&err));
        assert!(!is_table_not_found(&sqlx::Error::RowNotFound));
        assert!(!is_table_not_found(&sqlx::Error::PoolTimedOut));
    }

    #[tokio::test]
    async fn test_lock_name() {
        let store = lazy_store(Duration::from_secs(1));
        assert_eq!(store.lock_name, DEFAULT_LOCK_NAME);

        let store = store.with_lock_name("tenant_a_migrations");
        assert_eq!(store.lock_name, "tenant_a_migrations");
    }

    #[tokio::test]
    async fn test_lock_timeout_is_clamped() {
        assert_eq!(lazy_store(Duration::from_secs(10)).lock_timeout_secs(), 10);
        assert_eq!(lazy_store(Duration::from_secs(u64::MAX)).lock_timeout_secs(), i64::MAX);
    }
}
