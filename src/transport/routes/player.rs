use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::common::PanlinkError;
use crate::player::manager;
use crate::player::state::PlayerUpdateRequest;
use crate::server::AppState;

use super::not_found;

/// GET /v1/sessions/{sessionId}/player
pub async fn get_player(
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::debug!("GET /v1/sessions/{}/player", session_id);
    match state.session(&session_id) {
        Some(session) => {
            let view = session.read().await.to_player_response();
            Json(view).into_response()
        }
        None => not_found(
            format!("Session not found: {}", session_id),
            format!("/v1/sessions/{}/player", session_id),
        ),
    }
}

/// PATCH /v1/sessions/{sessionId}/player
pub async fn update_player(
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlayerUpdateRequest>,
) -> impl IntoResponse {
    tracing::info!("PATCH /v1/sessions/{}/player", session_id);
    let path = format!("/v1/sessions/{}/player", session_id);
    let Some(session) = state.session(&session_id) else {
        return not_found(format!("Session not found: {}", session_id), path);
    };

    match manager::update_session(&session, &state.deps, body).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(PanlinkError::bad_request(e.to_string(), path)),
        )
            .into_response(),
    }
}

/// POST /v1/sessions/{sessionId}/player/retry
pub async fn retry_player(
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("POST /v1/sessions/{}/player/retry", session_id);
    let path = format!("/v1/sessions/{}/player/retry", session_id);
    let Some(session) = state.session(&session_id) else {
        return not_found(format!("Session not found: {}", session_id), path);
    };

    match manager::retry_session(&session, &state.deps).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(PanlinkError::bad_request(e.to_string(), path)),
        )
            .into_response(),
    }
}

/// DELETE /v1/sessions/{sessionId}
pub async fn destroy_session(
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("DELETE /v1/sessions/{}", session_id);
    if state.destroy_session(&session_id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(
            format!("Session not found: {}", session_id),
            format!("/v1/sessions/{}", session_id),
        )
    }
}
