use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{chat, completions, embeddings, health};
use super::state::AppState;

/// Largest accepted upload, archives included
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// All routes, mounted under the configured base path
#[inline]
pub fn build_router(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        .route("/embeddings/generate", post(embeddings::generate))
        .route(
            "/embeddings/generateFromFile",
            post(embeddings::generate_from_file).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/embeddings/status", get(embeddings::status))
        .route("/chat", get(chat::list_chats).post(chat::create_chat))
        .route("/chat/completions", post(completions::chat_completions))
        .route("/chat/:chat_id", get(chat::get_chat).delete(chat::delete_chat))
        .route("/chat/:chat_id/messages", get(chat::list_messages))
        .route("/-/healthz", get(health::healthz))
        .route("/-/ready", get(health::ready));

    let base_path = state.config.server.base_path.clone();
    let app = if base_path.is_empty() {
        routes
    } else {
        Router::new().nest(&base_path, routes)
    };

    app.layer(TraceLayer::new_for_http()).with_state(state)
}
