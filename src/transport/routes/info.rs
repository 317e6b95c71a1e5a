use axum::response::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub version: String,
    pub build_time: u64,
    pub commit: String,
}

/// GET /version
pub async fn get_version() -> String {
    tracing::debug!("GET /version");
    env!("CARGO_PKG_VERSION").to_string()
}

/// GET /v1/info
pub async fn get_info() -> Json<BuildInfo> {
    tracing::debug!("GET /v1/info");
    Json(BuildInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_time: option_env!("BUILD_TIME")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
        commit: option_env!("GIT_COMMIT").unwrap_or("unknown").to_string(),
    })
}
