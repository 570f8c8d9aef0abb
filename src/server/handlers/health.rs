use axum::Json;

use super::StatusOk;

#[inline]
pub async fn healthz() -> Json<StatusOk> {
    Json(StatusOk::ok())
}

#[inline]
pub async fn ready() -> Json<StatusOk> {
    Json(StatusOk::ok())
}
