use tonic::{Code, Status};

use crate::result::{Error, ErrorCode, Outcome};

/// gRPC code for a canonical error code. The mapping is one-to-one.
#[must_use]
pub fn rpc_code(code: ErrorCode) -> Code {
    match code {
        ErrorCode::Aborted => Code::Aborted,
        ErrorCode::ResourceExhausted => Code::ResourceExhausted,
        ErrorCode::AlreadyExists => Code::AlreadyExists,
        ErrorCode::Canceled => Code::Cancelled,
        ErrorCode::DataLoss => Code::DataLoss,
        ErrorCode::DeadlineExceeded => Code::DeadlineExceeded,
        ErrorCode::FailedPrecondition => Code::FailedPrecondition,
        ErrorCode::Internal => Code::Internal,
        ErrorCode::InvalidArgument => Code::InvalidArgument,
        ErrorCode::NotFound => Code::NotFound,
        ErrorCode::OutOfRange => Code::OutOfRange,
        ErrorCode::PermissionDenied => Code::PermissionDenied,
        ErrorCode::Unauthenticated => Code::Unauthenticated,
        ErrorCode::Unavailable => Code::Unavailable,
        ErrorCode::Unimplemented => Code::Unimplemented,
    }
}

/// gRPC code for a code received by name; unrecognised names map to `Unknown`.
#[must_use]
pub fn rpc_code_for_name(name: &str) -> Code {
    name.parse::<ErrorCode>().map(rpc_code).unwrap_or(Code::Unknown)
}

/// Classify a status received from a downstream gRPC call.
///
/// `Ok` and `Unknown` have no canonical counterpart and are treated as `Internal`.
#[must_use]
pub fn code_from_rpc(code: Code) -> ErrorCode {
    match code {
        Code::Cancelled => ErrorCode::Canceled,
        Code::InvalidArgument => ErrorCode::InvalidArgument,
        Code::DeadlineExceeded => ErrorCode::DeadlineExceeded,
        Code::NotFound => ErrorCode::NotFound,
        Code::AlreadyExists => ErrorCode::AlreadyExists,
        Code::PermissionDenied => ErrorCode::PermissionDenied,
        Code::ResourceExhausted => ErrorCode::ResourceExhausted,
        Code::FailedPrecondition => ErrorCode::FailedPrecondition,
        Code::Aborted => ErrorCode::Aborted,
        Code::OutOfRange => ErrorCode::OutOfRange,
        Code::Unimplemented => ErrorCode::Unimplemented,
        Code::Unavailable => ErrorCode::Unavailable,
        Code::DataLoss => ErrorCode::DataLoss,
        Code::Unauthenticated => ErrorCode::Unauthenticated,
        Code::Ok | Code::Unknown | Code::Internal => ErrorCode::Internal,
    }
}

#[must_use]
pub fn to_status(error: &Error) -> Status {
    Status::new(rpc_code(error.code), error.message.clone())
}

impl From<Error> for Status {
    fn from(error: Error) -> Self {
        Status::new(rpc_code(error.code), error.message)
    }
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        Error::new(code_from_rpc(status.code()), status.message())
    }
}

/// Render an outcome as the result type a tonic service method returns.
pub fn into_rpc_result<T>(outcome: Outcome<T>) -> Result<T, Status> {
    outcome.into_result().map_err(Status::from)
}
