use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

#[cfg(test)]
mod tests;

pub mod models;
pub mod queries;

pub use models::{Chat, Message, Sender};
pub use queries::{ChatQueries, MessageQueries};

pub type DbPool = Pool<Sqlite>;

/// Chat history store
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    /// Open `metadata.db` inside `config_dir`, creating the directory if needed
    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        Self::new(config_dir.join("metadata.db")).await
    }

    // Chat operations
    pub async fn create_chat(&self, title: Option<&str>) -> Result<String> {
        ChatQueries::create(&self.pool, title).await
    }

    pub async fn list_chats(&self) -> Result<Vec<Chat>> {
        ChatQueries::list_all(&self.pool).await
    }

    pub async fn read_chat(&self, id: &str) -> Result<Option<Chat>> {
        ChatQueries::get_by_id(&self.pool, id).await
    }

    /// Returns false when no chat had that id
    pub async fn delete_chat(&self, id: &str) -> Result<bool> {
        ChatQueries::delete(&self.pool, id).await
    }

    // Message operations
    pub async fn create_message(
        &self,
        chat_id: &str,
        sender: Sender,
        content: &str,
    ) -> Result<Message> {
        MessageQueries::create(&self.pool, chat_id, sender, content).await
    }

    pub async fn get_messages(&self, chat_id: &str, limit: Option<u32>) -> Result<Vec<Message>> {
        MessageQueries::list_recent(&self.pool, chat_id, limit).await
    }
}
