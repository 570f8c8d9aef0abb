pub mod chat;
pub mod completions;
pub mod embeddings;
pub mod health;

use serde::Serialize;

/// `{"statusOk": true}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOk {
    pub status_ok: bool,
}

impl StatusOk {
    #[inline]
    pub fn ok() -> Self {
        Self { status_ok: true }
    }
}
