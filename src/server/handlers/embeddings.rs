use axum::Json;
use axum::extract::{Multipart, State};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::StatusOk;
use crate::crawler::validate_url;
use crate::indexer::{JobGuard, StatusReport, spawn_generation};
use crate::parser::parse_upload;
use crate::server::error::{ApiError, ApiJson};
use crate::server::state::AppState;

pub const BUSY_DETAIL: &str = "A process to generate embeddings is already in progress.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub url: String,
    /// Host the crawl is confined to; defaults to the seed's host
    #[serde(default)]
    pub filter_path: Option<String>,
}

fn acquire(state: &AppState) -> Result<JobGuard, ApiError> {
    state
        .gate
        .try_acquire_owned()
        .ok_or_else(|| ApiError::Conflict(BUSY_DETAIL.to_string()))
}

/// Crawl a site in the background
#[inline]
pub async fn generate(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<GenerateRequest>,
) -> Result<Json<StatusOk>, ApiError> {
    info!("Generate embeddings request received for url: {}", request.url);
    validate_url(&request.url).map_err(|e| ApiError::Validation(e.to_string()))?;

    let guard = acquire(&state)?;
    let generator = Arc::clone(&state.generator);
    spawn_generation(guard, async move {
        generator
            .generate_from_url(&request.url, request.filter_path.as_deref())
            .await
    });

    info!("Embedding generation started");
    Ok(Json(StatusOk::ok()))
}

/// Parse an uploaded file now, index its documents in the background
#[inline]
pub async fn generate_from_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<StatusOk>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        upload = Some((filename, content_type, bytes));
        break;
    }

    let (filename, content_type, bytes) =
        upload.ok_or_else(|| ApiError::Validation("Missing 'file' field".to_string()))?;
    info!(
        "Generate embeddings request received for file {} (content type: {})",
        filename,
        content_type.as_deref().unwrap_or("unknown")
    );

    let documents = tokio::task::spawn_blocking(move || {
        parse_upload(&filename, content_type.as_deref(), &bytes)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Error parsing file: {}", e)))??;

    let guard = acquire(&state)?;
    let generator = Arc::clone(&state.generator);
    spawn_generation(guard, async move {
        generator.generate_from_documents(documents).await
    });

    info!("Embedding generation started");
    Ok(Json(StatusOk::ok()))
}

#[inline]
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    Json(state.gate.report())
}
