//! # Dispatcher Module
//!
//! Routes a request to the handler registered for its operation and runs it
//! on the caller's thread.
//!
//! ## Request Flow
//!
//! 1. Derive a child [`Context`](crate::context::Context), bounded by the
//!    configured maximum latency when one is set
//! 2. Resolve the operation identifier (`Request::handler_id`, or the executor
//!    type name)
//! 3. Look the operation up in the [`HandlerRegistry`](crate::registry::HandlerRegistry)
//! 4. Build a fresh handler for factory entries, or fetch the dependency bundle
//!    for executors
//! 5. Invoke the handler inside `catch_unwind`
//! 6. Log failures with request and correlation identifiers, time successes
//!    when debug logging is on, and cancel the child context
//!
//! ## Error Handling
//!
//! - Missing handlers and type mismatches return [`DispatchError`] with the
//!   canonical `Internal` code
//! - Panics are caught and logged with their payload and a backtrace taken at
//!   the panic site; callers see a generic `Internal` error. A panic hook
//!   keeps contained panics off stderr so the log sink is the only record
//! - Handler errors pass through unchanged
//!
//! ## Timeouts
//!
//! Cancellation is cooperative. Handlers observe the deadline through
//! `Context::check`, `Context::sleep` or `Context::wait_cancelled`; a handler
//! that ignores its context runs to completion.

mod core;
mod log;
mod panic;

pub use core::{DispatchError, Dispatcher, INTERNAL_ERROR_MESSAGE};
pub use log::{DispatchLog, TracingLog};
