use crate::migration::{Migration, MigrationError};
use async_trait::async_trait;
use sqlx::MySqlPool;

pub struct CreatePostsTable {
    pool: MySqlPool,
}

impl CreatePostsTable {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Migration for CreatePostsTable {
    fn description(&self) -> &str {
        "Create the posts table referencing users"
    }

    async fn up(&self) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE TABLE posts (
                id INT(11) AUTO_INCREMENT PRIMARY KEY,
                user_id INT(11) NOT NULL,
                title VARCHAR(255) NOT NULL,
                body TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                CONSTRAINT fk_posts_user FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn down(&self) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE posts").execute(&self.pool).await?;
        Ok(())
    }
}
