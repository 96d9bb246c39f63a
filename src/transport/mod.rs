//! # Transport Module
//!
//! Renders canonical outcomes onto wire protocols.
//!
//! Both tables are total over [`ErrorCode`](crate::result::ErrorCode) and must stay
//! stable: a shipped code is never reassigned to a different status.
//!
//! | Code               | HTTP | gRPC               |
//! |--------------------|------|--------------------|
//! | InvalidArgument    | 400  | INVALID_ARGUMENT   |
//! | NotFound           | 404  | NOT_FOUND          |
//! | Aborted            | 412  | ABORTED            |
//! | Unauthenticated    | 401  | UNAUTHENTICATED    |
//! | PermissionDenied   | 403  | PERMISSION_DENIED  |
//! | everything else    | 500  | same-named code    |
//!
//! Success renders as `200` / `OK`. Code names that are not canonical render as
//! `500` / `UNKNOWN`.

pub mod http;
pub mod rpc;

pub use self::http::{status_for_code, status_for_outcome, HttpReply};
pub use self::rpc::{into_rpc_result, rpc_code, to_status};
