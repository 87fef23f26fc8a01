use crate::migration::{Migration, MigrationError};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Email addresses become unique; existing duplicates make `up` fail.
pub struct AddUsersEmailIndex {
    pool: MySqlPool,
}

impl AddUsersEmailIndex {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Migration for AddUsersEmailIndex {
    fn description(&self) -> &str {
        "Add a unique index on users.email"
    }

    async fn up(&self) -> Result<(), MigrationError> {
        sqlx::query("CREATE UNIQUE INDEX idx_users_email ON users (email)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn down(&self) -> Result<(), MigrationError> {
        sqlx::query("DROP INDEX idx_users_email ON users")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
