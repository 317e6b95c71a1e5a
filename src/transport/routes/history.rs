use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::server::AppState;

use super::{not_found, ok};

/// GET /v1/continue
pub async fn get_continue(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("GET /v1/continue");
    ok(state.deps.history.list())
}

/// GET /v1/continue/{code}
///
/// Most recently watched episode of one title, for "continue this title"
/// entry points that only know the code.
pub async fn get_continue_latest(
    Path(code): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::debug!("GET /v1/continue/{}", code);
    match state.deps.history.find_latest(&code.clone().into()) {
        Some(entry) => ok(entry).into_response(),
        None => not_found(
            format!("No watch history for: {}", code),
            format!("/v1/continue/{}", code),
        ),
    }
}

/// DELETE /v1/continue
pub async fn clear_continue(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::info!("DELETE /v1/continue");
    state.deps.history.clear();
    StatusCode::NO_CONTENT
}
