use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use serde::Serialize;
use serde_json::Value;
use std::fmt;

pub async fn handler404(path: Uri) -> Error {
    Error::NotFound {
        message: format!("Invalid path: {}", path),
    }
}

/// Uniform `{ data, message, status }` wrapper around every response body.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<V> {
    pub data: V,
    pub message: String,
    pub status: u16,
}

impl<V: Serialize> Envelope<V> {
    pub fn of<S: Into<String>>(status: StatusCode, message: S, data: V) -> Self {
        Self {
            data,
            message: message.into(),
            status: status.as_u16(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Error {
    ValidationFailed { errors: Vec<String> },
    InvalidPayload { message: String },
    NotFound { message: String },
    InternalError { kind: &'static str, message: String },
}

impl Error {
    pub fn student_not_found(id: i64) -> Error {
        Error::NotFound {
            message: format!("Student with id {} not found", id),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::ValidationFailed { .. } | Error::InvalidPayload { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ValidationFailed { errors } => {
                write!(f, "Validation Failed: {}", errors.join("; "))
            }
            Error::InvalidPayload { message } | Error::NotFound { message } => {
                f.write_str(message)
            }
            Error::InternalError { kind, message } => write!(f, "{}: {}", kind, message),
        }
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let envelope = match self {
            Error::ValidationFailed { errors } => {
                Envelope::of(status, "Validation Failed", Value::from(errors))
            }
            Error::InvalidPayload { message } | Error::NotFound { message } => {
                Envelope::of(status, message, Value::Null)
            }
            Error::InternalError { kind, message } => {
                log::error!("{}: {}", kind, message);
                Envelope::of(status, message, Value::from(kind))
            }
        };
        (status, Json(envelope)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::InternalError {
            kind: "DatabaseError",
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidPayload {
            message: rejection.to_string(),
        }
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidPayload {
            message: rejection.to_string(),
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidPayload {
            message: rejection.to_string(),
        }
    }
}
