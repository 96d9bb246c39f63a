use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::result::{Error, ErrorCode, Outcome};

/// Maximum inline reply headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 4;

/// Stack-allocated reply header storage
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// HTTP status for a canonical error code.
///
/// Codes without a dedicated status render as `500`.
#[must_use]
pub fn status_for_code(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Aborted => StatusCode::PRECONDITION_FAILED,
        ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorCode::AlreadyExists
        | ErrorCode::Canceled
        | ErrorCode::DataLoss
        | ErrorCode::DeadlineExceeded
        | ErrorCode::FailedPrecondition
        | ErrorCode::Internal
        | ErrorCode::OutOfRange
        | ErrorCode::Unavailable
        | ErrorCode::Unimplemented
        | ErrorCode::ResourceExhausted => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// HTTP status for a code received by name (e.g. from a downstream JSON body).
/// Names outside the canonical set render as `500`.
#[must_use]
pub fn status_for_code_name(name: &str) -> StatusCode {
    name.parse::<ErrorCode>()
        .map(status_for_code)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// HTTP status for an outcome: `200` on success.
#[must_use]
pub fn status_for_outcome<T>(outcome: &Outcome<T>) -> StatusCode {
    match outcome {
        Outcome::Success(_) => StatusCode::OK,
        Outcome::Failure(e) => status_for_code(e.code),
    }
}

/// Rendered HTTP response: status, headers and a JSON body.
///
/// Boundary layers copy this onto whatever server they run.
#[derive(Debug, Clone, Serialize)]
pub struct HttpReply {
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
}

fn serialize_status<S: serde::Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

impl HttpReply {
    /// Create a JSON reply with the default content type
    #[must_use]
    pub fn json(status: StatusCode, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Render an outcome. The success value becomes the body with `200`; a
    /// failure serializes the [`Error`] with the mapped status.
    ///
    /// A success value that cannot be serialized is reported as `500`.
    #[must_use]
    pub fn from_outcome<T: Serialize>(outcome: &Outcome<T>) -> Self {
        match outcome {
            Outcome::Success(value) => match serde_json::to_value(value) {
                Ok(body) => Self::json(StatusCode::OK, body),
                Err(err) => Self::from_error(&Error::internal(format!(
                    "failed to serialize response: {err}"
                ))),
            },
            Outcome::Failure(e) => Self::from_error(e),
        }
    }

    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        let body = serde_json::to_value(error)
            .unwrap_or_else(|_| serde_json::json!({ "code": error.code.as_str() }));
        Self::json(status_for_code(error.code), body)
    }

    /// Get a header by name (case-insensitive)
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}
