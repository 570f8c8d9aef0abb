
use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

pub struct ChatQueries;

impl ChatQueries {
    /// Insert a chat and return its new UUID
    #[inline]
    pub async fn create(pool: &SqlitePool, title: Option<&str>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let title = title.filter(|t| !t.is_empty());

        sqlx::query("INSERT INTO chat (id, title, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(title)
            .bind(now)
            .bind(now)
            .execute(pool)
            .await
            .context("Failed to create chat")?;

        debug!("Created chat {}", id);
        Ok(id)
    }

    /// All chats, newest first
    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Chat>> {
        sqlx::query_as::<_, Chat>(
            "SELECT id, title, created_at, updated_at FROM chat ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list chats")
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Chat>> {
        sqlx::query_as::<_, Chat>(
            "SELECT id, title, created_at, updated_at FROM chat WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get chat by id")
    }

    /// Delete a chat and, through the foreign key, its messages
    #[inline]
    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM chat WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete chat")?;

        Ok(result.rows_affected() > 0)
    }

    #[inline]
    pub async fn touch(pool: &SqlitePool, id: &str) -> Result<()> {
        sqlx::query("UPDATE chat SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to update chat timestamp")?;
        Ok(())
    }
}

pub struct MessageQueries;

impl MessageQueries {
    #[inline]
    pub async fn create(
        pool: &SqlitePool,
        chat_id: &str,
        sender: Sender,
        content: &str,
    ) -> Result<Message> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            sender,
            content: content.to_string(),
            timestamp: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO messages (id, chat_id, sender, content, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.chat_id)
        .bind(message.sender)
        .bind(&message.content)
        .bind(message.timestamp)
        .execute(pool)
        .await
        .context("Failed to create message")?;

        ChatQueries::touch(pool, chat_id).await?;
        Ok(message)
    }

    /// The `limit` most recent messages of a chat (all when `None`), oldest first
    #[inline]
    pub async fn list_recent(
        pool: &SqlitePool,
        chat_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Message>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map_or(-1, i64::from);

        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, chat_id, sender, content, timestamp
            FROM (
                SELECT rowid AS seq, id, chat_id, sender, content, timestamp
                FROM messages
                WHERE chat_id = ?
                ORDER BY timestamp DESC, seq DESC
                LIMIT ?
            )
            ORDER BY timestamp ASC, seq ASC
            "#,
        )
        .bind(chat_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list messages")
    }
}
