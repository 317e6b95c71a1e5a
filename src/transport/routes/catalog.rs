use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::common::types::Language;
use crate::server::AppState;
use crate::upstream::{PlayResolution, ResolutionKey};

use super::{ok, ok_play, upstream_error};

#[derive(Debug, Deserialize)]
pub struct LangQuery {
    pub lang: Option<Language>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub lang: Option<Language>,
}

#[derive(Debug, Deserialize)]
pub struct PlayQuery {
    pub lang: Option<Language>,
    /// Bypass the descriptor cache (the caller saw the cached URL die).
    #[serde(default)]
    pub fresh: bool,
}

/// GET /v1/languages
pub async fn get_languages(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("GET /v1/languages");
    match state.catalog.languages().await {
        Ok(langs) => ok(langs).into_response(),
        Err(e) => upstream_error(&e, "/v1/languages".to_string()),
    }
}

/// GET /v1/home
pub async fn get_home(
    Query(query): Query<LangQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::debug!("GET /v1/home");
    match state.catalog.home(&Language::or_default(query.lang)).await {
        Ok(titles) => ok(titles).into_response(),
        Err(e) => upstream_error(&e, "/v1/home".to_string()),
    }
}

/// GET /v1/search
pub async fn get_search(
    Query(query): Query<SearchQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::debug!("GET /v1/search q={}", query.q);
    match state.catalog.search(&query.q, &Language::or_default(query.lang)).await {
        Ok(titles) => ok(titles).into_response(),
        Err(e) => upstream_error(&e, "/v1/search".to_string()),
    }
}

/// GET /v1/episodes/{code}
pub async fn get_episodes(
    Path(code): Path<String>,
    Query(query): Query<LangQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::debug!("GET /v1/episodes/{}", code);
    match state.catalog.episodes(&code, &Language::or_default(query.lang)).await {
        Ok(eps) => ok(eps).into_response(),
        Err(e) => upstream_error(&e, format!("/v1/episodes/{}", code)),
    }
}

/// GET /v1/play/{code}/{ep}
///
/// Resolves a short-lived play descriptor. `fresh=true` skips the cache
/// and re-primes it; freshness and remaining TTL are reported alongside.
pub async fn get_play(
    Path((code, ep)): Path<(String, u32)>,
    Query(query): Query<PlayQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::debug!("GET /v1/play/{}/{} fresh={}", code, ep, query.fresh);
    let key = ResolutionKey::new(Language::or_default(query.lang), code.clone().into(), ep);

    let resolved = if query.fresh {
        state
            .deps
            .resolution
            .resolve_fresh(&key)
            .await
            .map(|d| (d, false))
    } else {
        state.deps.resolution.resolve_cached(&key).await
    };

    match resolved {
        Ok((descriptor, cached)) => {
            let ttl = PlayResolution::ttl_ms_of(&descriptor);
            ok_play(descriptor, cached, ttl).into_response()
        }
        Err(e) => upstream_error(&e, format!("/v1/play/{}/{}", code, ep)),
    }
}
