use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Canonical, transport-independent failure classification.
///
/// The set is closed. Transport layers translate a code into their own status
/// space through [`crate::transport`]; handlers never pick HTTP or gRPC codes
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Aborted,
    Canceled,
    DataLoss,
    DeadlineExceeded,
    FailedPrecondition,
    Internal,
    OutOfRange,
    PermissionDenied,
    Unauthenticated,
    Unavailable,
    Unimplemented,
    ResourceExhausted,
}

impl ErrorCode {
    /// Every canonical code, in declaration order.
    pub const ALL: [ErrorCode; 15] = [
        ErrorCode::InvalidArgument,
        ErrorCode::NotFound,
        ErrorCode::AlreadyExists,
        ErrorCode::Aborted,
        ErrorCode::Canceled,
        ErrorCode::DataLoss,
        ErrorCode::DeadlineExceeded,
        ErrorCode::FailedPrecondition,
        ErrorCode::Internal,
        ErrorCode::OutOfRange,
        ErrorCode::PermissionDenied,
        ErrorCode::Unauthenticated,
        ErrorCode::Unavailable,
        ErrorCode::Unimplemented,
        ErrorCode::ResourceExhausted,
    ];

    /// Stable name, identical to the serialized form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "InvalidArgument",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::AlreadyExists => "AlreadyExists",
            ErrorCode::Aborted => "Aborted",
            ErrorCode::Canceled => "Canceled",
            ErrorCode::DataLoss => "DataLoss",
            ErrorCode::DeadlineExceeded => "DeadlineExceeded",
            ErrorCode::FailedPrecondition => "FailedPrecondition",
            ErrorCode::Internal => "Internal",
            ErrorCode::OutOfRange => "OutOfRange",
            ErrorCode::PermissionDenied => "PermissionDenied",
            ErrorCode::Unauthenticated => "Unauthenticated",
            ErrorCode::Unavailable => "Unavailable",
            ErrorCode::Unimplemented => "Unimplemented",
            ErrorCode::ResourceExhausted => "ResourceExhausted",
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a canonical error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownErrorCode(pub String);

impl Display for UnknownErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown error code '{}'", self.0)
    }
}

impl std::error::Error for UnknownErrorCode {}

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownErrorCode(s.to_string()))
    }
}

/// A canonical failure: a code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Error {
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for Error {}

/// Outcome of one dispatch: exactly one of a success value or an [`Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    Success(T),
    Failure(Error),
}

impl<T> Outcome<T> {
    /// Build a success outcome.
    pub fn ok(value: T) -> Self {
        Outcome::Success(value)
    }

    /// Build a failure outcome. See [`fail!`](crate::fail) for the formatted variant.
    pub fn fail(code: ErrorCode, message: impl Into<String>) -> Self {
        Outcome::Failure(Error::new(code, message))
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The success value, `None` on failure.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(v) => Some(v),
            Outcome::Failure(_) => None,
        }
    }

    /// The error, `None` on success.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(e) => Some(e),
        }
    }

    /// The canonical code of a failure.
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        self.error().map(|e| e.code)
    }

    pub fn into_result(self) -> Result<T, Error> {
        match self {
            Outcome::Success(v) => Ok(v),
            Outcome::Failure(e) => Err(e),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success(v) => Outcome::Success(f(v)),
            Outcome::Failure(e) => Outcome::Failure(e),
        }
    }

    pub fn and_then<U, F: FnOnce(T) -> Outcome<U>>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success(v) => f(v),
            Outcome::Failure(e) => Outcome::Failure(e),
        }
    }
}

impl<T, E: Into<Error>> From<Result<T, E>> for Outcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Outcome::Success(v),
            Err(e) => Outcome::Failure(e.into()),
        }
    }
}

impl<T> From<Outcome<T>> for Result<T, Error> {
    fn from(outcome: Outcome<T>) -> Self {
        outcome.into_result()
    }
}

/// Build a failed [`Outcome`] with a formatted message.
///
/// ```
/// use cqs_dispatch::{fail, result::{ErrorCode, Outcome}};
///
/// let id = 7;
/// let outcome: Outcome<()> = fail!(ErrorCode::NotFound, "pet {} does not exist", id);
/// assert_eq!(outcome.error().map(|e| e.message.as_str()), Some("pet 7 does not exist"));
/// ```
#[macro_export]
macro_rules! fail {
    ($code:expr, $($arg:tt)+) => {
        $crate::result::Outcome::Failure($crate::result::Error::new($code, format!($($arg)+)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_is_never_success() {
        for code in [
            ErrorCode::InvalidArgument,
            ErrorCode::Unauthenticated,
            ErrorCode::FailedPrecondition,
            ErrorCode::PermissionDenied,
        ] {
            let r: Outcome<i32> = Outcome::fail(code, "fail");
            assert!(!r.is_success());
            assert!(r.is_failure());
            assert_eq!(r.code(), Some(code));
            assert!(r.value().is_none());
        }
    }

    #[test]
    fn success_has_no_error() {
        let r = Outcome::ok(1);
        assert!(r.is_success());
        assert!(r.error().is_none());
        assert_eq!(r.value(), Some(&1));
    }

    #[test]
    fn fail_macro_formats_message() {
        let r: Outcome<()> = fail!(ErrorCode::OutOfRange, "{} > {}", 10, 5);
        assert_eq!(r.error(), Some(&Error::new(ErrorCode::OutOfRange, "10 > 5")));
    }

    #[test]
    fn code_names_parse_back() {
        for code in ErrorCode::ALL {
            assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(code));
        }
        assert!("Teapot".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn error_serializes_with_code_name() {
        let json = serde_json::to_value(Error::new(ErrorCode::NotFound, "no pet")).unwrap();
        assert_eq!(json, serde_json::json!({"code": "NotFound", "message": "no pet"}));
    }

    #[test]
    fn result_conversions() {
        let ok: Outcome<u8> = Ok::<u8, Error>(3).into();
        assert_eq!(ok.into_result(), Ok(3));
        let err: Result<u8, Error> = Outcome::<u8>::fail(ErrorCode::Aborted, "x").into();
        assert_eq!(err.unwrap_err().code, ErrorCode::Aborted);
        assert_eq!(Outcome::ok(2).map(|v| v * 2).value(), Some(&4));
    }
}
