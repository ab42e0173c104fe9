use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success envelope: `{"status": "success", "message": ..., "data": ...}`.
#[derive(Debug, Serialize)]
pub struct SuccessBody<T> {
    pub status: &'static str,
    pub message: String,
    pub data: T,
}

/// Error envelope: `{"status": "error", "message": ..., "errors": ...}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
    pub errors: String,
}

pub fn success<T: Serialize>(code: StatusCode, message: impl Into<String>, data: T) -> Response {
    (
        code,
        Json(SuccessBody {
            status: "success",
            message: message.into(),
            data,
        }),
    )
        .into_response()
}

pub fn error(code: StatusCode, message: impl Into<String>, errors: impl Into<String>) -> Response {
    (
        code,
        Json(ErrorBody {
            status: "error",
            message: message.into(),
            errors: errors.into(),
        }),
    )
        .into_response()
}
