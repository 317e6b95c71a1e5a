pub mod catalog;
pub mod history;
pub mod info;
pub mod player;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::common::PanlinkError;
use crate::upstream::UpstreamError;

/// Success envelope every catalog/play endpoint wraps its payload in.
#[derive(Debug, Serialize)]
pub struct ApiOk<T: Serialize> {
    pub ok: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiOk<T>> {
    Json(ApiOk {
        ok: true,
        data,
        cached: None,
        ttl: None,
    })
}

pub fn ok_play<T: Serialize>(data: T, cached: bool, ttl_ms: u64) -> Json<ApiOk<T>> {
    Json(ApiOk {
        ok: true,
        data,
        cached: Some(cached),
        ttl: Some(ttl_ms),
    })
}

/// Map an upstream failure onto the REST error shape. Provider outages
/// become 502 so callers can tell them apart from our own errors.
pub fn upstream_error(err: &UpstreamError, path: String) -> Response {
    let error = match err {
        UpstreamError::NoVariants => PanlinkError::not_found(err.to_string(), path),
        UpstreamError::Status { status: 404, .. } => PanlinkError::not_found(err.to_string(), path),
        _ => PanlinkError::bad_gateway(err.to_string(), path),
    };
    let status =
        StatusCode::from_u16(error.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(error)).into_response()
}

pub fn not_found(message: String, path: String) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(PanlinkError::not_found(message, path)),
    )
        .into_response()
}
