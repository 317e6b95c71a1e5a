use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    server::AppState,
    transport::{
        middleware::{add_response_headers, check_auth},
        routes::{catalog, history, info, player},
    },
};

const API_V1: &str = "/v1";

pub fn router(state: Arc<AppState>) -> Router {
    let v1_routes = Router::new()
        .route("/languages", get(catalog::get_languages))
        .route("/home", get(catalog::get_home))
        .route("/search", get(catalog::get_search))
        .route("/episodes/{code}", get(catalog::get_episodes))
        .route("/play/{code}/{ep}", get(catalog::get_play))
        .route(
            "/continue",
            get(history::get_continue).delete(history::clear_continue),
        )
        .route("/continue/{code}", get(history::get_continue_latest))
        .route(
            "/sessions/{session_id}/player",
            get(player::get_player).patch(player::update_player),
        )
        .route(
            "/sessions/{session_id}/player/retry",
            post(player::retry_player),
        )
        .route("/sessions/{session_id}", delete(player::destroy_session))
        .route("/info", get(info::get_info));

    Router::new()
        .nest(API_V1, v1_routes)
        .route("/version", get(info::get_version))
        .layer(middleware::from_fn_with_state(state.clone(), check_auth))
        .layer(middleware::from_fn(add_response_headers))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
