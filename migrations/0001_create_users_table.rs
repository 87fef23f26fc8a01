use crate::migration::{Migration, MigrationError};
use async_trait::async_trait;
use sqlx::MySqlPool;

pub struct CreateUsersTable {
    pool: MySqlPool,
}

impl CreateUsersTable {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Migration for CreateUsersTable {
    fn description(&self) -> &str {
        "Create the users table"
    }

    async fn up(&self) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE TABLE users (
                id INT(11) AUTO_INCREMENT PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn down(&self) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE users").execute(&self.pool).await?;
        Ok(())
    }
}
