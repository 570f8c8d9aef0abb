use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::assistant::{Completion, prompt};
use crate::database::Sender;
use crate::server::error::{ApiError, ApiJson, parse_chat_id};
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    pub chat_query: String,
    /// Earlier turns, alternating user and assistant
    #[serde(default)]
    pub chat_history: Option<Vec<String>>,
    #[serde(default)]
    pub chat_id: Option<String>,
}

/// Where the conversation history comes from
#[derive(Debug, PartialEq, Eq)]
pub enum HistorySource {
    Stored(String),
    Inline(Vec<String>),
}

impl CompletionRequest {
    /// Check the query length and pick exactly one history source
    #[inline]
    pub fn validate(self, max_query_length: usize) -> Result<(String, HistorySource), ApiError> {
        if self.chat_query.chars().count() > max_query_length {
            return Err(ApiError::PayloadTooLarge(format!(
                "chat_query length exceeds {} characters",
                max_query_length
            )));
        }

        let chat_id = self.chat_id.filter(|id| !id.is_empty());
        let source = match (chat_id, self.chat_history) {
            (Some(_), Some(history)) if !history.is_empty() => {
                return Err(ApiError::Validation(
                    "You must provide only one of 'chat_id' or 'chat_history', not both."
                        .to_string(),
                ));
            }
            (Some(id), _) => HistorySource::Stored(parse_chat_id(&id)?),
            (None, Some(history)) => {
                if history.len() % 2 != 0 {
                    return Err(ApiError::Validation(
                        "chat_history length must be even".to_string(),
                    ));
                }
                HistorySource::Inline(history)
            }
            (None, None) => {
                return Err(ApiError::Validation(
                    "You must provide one of 'chat_id' or 'chat_history'.".to_string(),
                ));
            }
        };

        Ok((self.chat_query, source))
    }
}

/// Answer a query from the indexed documents.
///
/// With a `chat_id` the stored history is used and both turns are saved.
#[inline]
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CompletionRequest>,
) -> Result<Json<Completion>, ApiError> {
    info!("Chat completions request received");
    let (query, source) = request.validate(state.config.chat.max_query_length)?;

    let completion = match source {
        HistorySource::Inline(history) => {
            let history = prompt::alternating_turns(&history);
            state.assistant.complete(&query, &history).await?
        }
        HistorySource::Stored(chat_id) => {
            if state.database.read_chat(&chat_id).await?.is_none() {
                return Err(ApiError::NotFound("Chat not found".to_string()));
            }

            let stored = state.database.get_messages(&chat_id, None).await?;
            let history = prompt::stored_turns(&stored);
            state
                .database
                .create_message(&chat_id, Sender::User, &query)
                .await?;

            let completion = state.assistant.complete(&query, &history).await?;
            state
                .database
                .create_message(&chat_id, Sender::Assistant, &completion.message)
                .await?;
            completion
        }
    };

    info!("Chat completions request completed");
    Ok(Json(completion))
}
