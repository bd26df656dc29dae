use axum::{http::StatusCode, response::Response};

use crate::errors::error;

pub mod contact;

pub async fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "Not found")
}
