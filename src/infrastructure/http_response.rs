// HTTP response utilities for JSON message bodies
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// `{ "message": ... }` with the given status
pub fn json_message(status: StatusCode, message: &str) -> Response {
    (status, Json(MessageBody { message, error: None })).into_response()
}

/// `{ "message": ..., "error": ... }` where `error` echoes the underlying cause
pub fn json_error(status: StatusCode, message: &str, error: impl ToString) -> Response {
    let body = MessageBody {
        message,
        error: Some(error.to_string()),
    };
    (status, Json(body)).into_response()
}
