use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::database::{Chat, Sender};
use crate::server::error::{ApiError, parse_chat_id};
use crate::server::state::AppState;

const CHAT_NOT_FOUND: &str = "Chat not found.";

#[derive(Debug, Default, Deserialize)]
pub struct CreateChatRequest {
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatSummary {
    pub id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Chat> for ChatSummary {
    #[inline]
    fn from(chat: Chat) -> Self {
        Self {
            id: chat.id,
            title: chat.title,
            created_at: chat.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub sender: Sender,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageList {
    pub messages: Vec<MessageView>,
}

async fn existing_chat(state: &AppState, raw_id: &str) -> Result<Chat, ApiError> {
    let id = parse_chat_id(raw_id)?;
    state
        .database
        .read_chat(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(CHAT_NOT_FOUND.to_string()))
}

/// The body is optional; a missing or unreadable body creates an untitled chat
#[inline]
pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<CreateChatRequest>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let chat_id = state.database.create_chat(request.title.as_deref()).await?;

    info!("Created new chat with id {}, title={:?}", chat_id, request.title);
    Ok((StatusCode::CREATED, Json(json!({ "chat_id": chat_id }))))
}

#[inline]
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChatSummary>>, ApiError> {
    let chats = state.database.list_chats().await?;
    Ok(Json(chats.into_iter().map(ChatSummary::from).collect()))
}

#[inline]
pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<String>,
) -> Result<Json<ChatSummary>, ApiError> {
    let chat = existing_chat(&state, &chat_id).await?;
    Ok(Json(chat.into()))
}

/// Messages go with the chat
#[inline]
pub async fn delete_chat(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let chat = existing_chat(&state, &chat_id).await?;
    state.database.delete_chat(&chat.id).await?;

    info!("Deleted chat {}", chat.id);
    Ok(Json(json!({ "status": "ok" })))
}

/// Most recent messages, oldest first
#[inline]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessageList>, ApiError> {
    let chat = existing_chat(&state, &chat_id).await?;
    let messages = state.database.get_messages(&chat.id, query.limit).await?;

    Ok(Json(MessageList {
        messages: messages
            .into_iter()
            .map(|m| MessageView {
                sender: m.sender,
                content: m.content,
            })
            .collect(),
    }))
}
