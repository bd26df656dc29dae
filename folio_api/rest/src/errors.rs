use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub fn internal_server_error(err: impl Into<anyhow::Error>) -> Response {
    let err = err.into();
    tracing::error!("internal server error: {err:#}");
    error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

pub fn error(code: StatusCode, error: &'static str) -> Response {
    (
        code,
        Json(ApiError {
            error,
            fields: None,
        }),
    )
        .into_response()
}

/// Like [`error`], but also names the request fields at fault.
pub fn field_error(code: StatusCode, error: &'static str, fields: Vec<&'static str>) -> Response {
    (
        code,
        Json(ApiError {
            error,
            fields: Some(fields),
        }),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<&'static str>>,
}
