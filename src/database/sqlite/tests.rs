use super::*;
use anyhow::Result;
use std::collections::HashSet;
use tempfile::TempDir;

async fn create_test_database() -> Result<(TempDir, Database)> {
    let temp_dir = TempDir::new()?;
    let database = Database::initialize_from_config_dir(temp_dir.path()).await?;
    Ok((temp_dir, database))
}

#[tokio::test]
async fn integration_schema_migration() -> Result<()> {
    let (temp_dir, database) = create_test_database().await?;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx%'",
    )
    .fetch_all(database.pool())
    .await?;

    let expected_tables: HashSet<&'static str> = ["chat", "messages"].into_iter().collect();
    let actual_tables: HashSet<&str> = tables.iter().map(|t| t.as_str()).collect();
    assert_eq!(actual_tables, expected_tables);
    assert!(temp_dir.path().join("metadata.db").exists());

    Ok(())
}

#[tokio::test]
async fn migrations_are_idempotent() -> Result<()> {
    let (temp_dir, database) = create_test_database().await?;
    let id = database.create_chat(Some("survives")).await?;
    drop(database);

    let reopened = Database::initialize_from_config_dir(temp_dir.path()).await?;
    assert!(reopened.read_chat(&id).await?.is_some());

    Ok(())
}

#[tokio::test]
async fn deleting_chat_cascades_to_messages() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let chat_id = database.create_chat(None).await?;
    database
        .create_message(&chat_id, Sender::User, "what is rust?")
        .await?;
    database
        .create_message(&chat_id, Sender::Assistant, "a language")
        .await?;

    assert!(database.delete_chat(&chat_id).await?);

    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE chat_id = ?")
        .bind(&chat_id)
        .fetch_one(database.pool())
        .await?;
    assert_eq!(orphans, 0);
    assert!(database.read_chat(&chat_id).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn deleting_unknown_chat_reports_false() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;
    assert!(!database.delete_chat("00000000-0000-0000-0000-000000000000").await?);
    Ok(())
}

#[tokio::test]
async fn messages_require_existing_chat() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;
    let result = database
        .create_message("11111111-1111-1111-1111-111111111111", Sender::User, "hi")
        .await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn new_message_touches_chat() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;
    let chat_id = database.create_chat(None).await?;
    let before = database.read_chat(&chat_id).await?.expect("chat");

    let message = database
        .create_message(&chat_id, Sender::User, "ping")
        .await?;

    let after = database.read_chat(&chat_id).await?.expect("chat");
    assert!(after.updated_at >= before.updated_at);
    assert!(after.updated_at >= message.timestamp);
    assert_eq!(database.get_messages(&chat_id, None).await?.len(), 1);

    Ok(())
}
