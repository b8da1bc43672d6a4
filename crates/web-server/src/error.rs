// In crates/web-server/src/error.rs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    /// `status` is echoed in the body so callers can tell a failed account apart.
    #[error("{message}")]
    NotFound {
        message: String,
        status: Option<&'static str>,
    },

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Failed to bind server address: {0}")]
    ServerBindError(#[source] std::io::Error),

    #[error("Server stopped unexpectedly: {0}")]
    ServeError(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
}

impl From<engine::Error> for Error {
    fn from(e: engine::Error) -> Self {
        match e {
            engine::Error::InvalidRequest(msg) => Error::BadRequest(msg),
            e @ engine::Error::Forbidden { .. } => Error::Forbidden(e.to_string()),
            e @ engine::Error::NoCachedData { .. } => Error::NotFound {
                message: e.to_string(),
                status: Some("failed"),
            },
            e @ engine::Error::Store(_) => Error::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (code, status) = match &self {
            Error::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            Error::Forbidden(_) => (StatusCode::FORBIDDEN, None),
            Error::NotFound { status, .. } => (StatusCode::NOT_FOUND, *status),
            Error::Internal(_) | Error::ServerBindError(_) | Error::ServeError(_) => {
                tracing::error!(error = %self, "Request failed with an internal error.");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let body = ErrorBody {
            error: self.to_string(),
            status,
        };
        (code, Json(body)).into_response()
    }
}
