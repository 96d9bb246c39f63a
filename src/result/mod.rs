//! # Result Module
//!
//! Canonical success/failure model shared by every handler.
//!
//! ## Overview
//!
//! Handlers report failures with an [`ErrorCode`] from a closed taxonomy and a
//! message. The code says *what kind* of failure happened and is independent of
//! the wire protocol; [`crate::transport`] turns it into an HTTP status or a gRPC
//! code when a boundary layer writes the response.
//!
//! ```rust
//! use cqs_dispatch::result::{ErrorCode, Outcome};
//!
//! let ok = Outcome::ok(5);
//! assert!(ok.is_success());
//!
//! let failed: Outcome<i32> = Outcome::fail(ErrorCode::InvalidArgument, "b must be positive");
//! assert!(failed.is_failure());
//! assert_eq!(failed.code(), Some(ErrorCode::InvalidArgument));
//! ```
//!
//! ## Invariants
//!
//! - An [`Outcome`] is either `Success` or `Failure`, never both
//! - `is_success()` and `is_failure()` are complements
//! - `value()` is `None` on failure, `error()` is `None` on success

mod core;

pub use core::{Error, ErrorCode, Outcome, UnknownErrorCode};
