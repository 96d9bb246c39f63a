use std::time::Duration;
use tracing::{debug, error, Level};

use crate::context::{Context, ContextError};

/// Sink for the dispatcher's diagnostics.
///
/// Implementations must not fail and must not block the dispatch path.
pub trait DispatchLog: Send + Sync {
    /// A dispatch failed (resolution error or business error).
    fn log_error(&self, ctx: &Context, operation: &str, message: &str);

    /// A handler panicked.
    fn log_panic(&self, ctx: &Context, operation: &str, payload: &str, backtrace: &str);

    /// Elapsed time of a successful dispatch. Only called when
    /// [`debug_enabled`](DispatchLog::debug_enabled) returns true.
    fn log_debug_timed(&self, _ctx: &Context, _operation: &str, _elapsed: Duration) {}

    fn debug_enabled(&self) -> bool {
        false
    }
}

/// Default sink emitting `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

fn deadline_exceeded(ctx: &Context) -> bool {
    ctx.err() == Some(ContextError::DeadlineExceeded)
}

impl DispatchLog for TracingLog {
    fn log_error(&self, ctx: &Context, operation: &str, message: &str) {
        error!(
            request_id = ctx.request_id().unwrap_or_default(),
            correlation_id = ctx.correlation_id().unwrap_or_default(),
            operation = operation,
            deadline_exceeded = deadline_exceeded(ctx),
            "{message}"
        );
    }

    fn log_panic(&self, ctx: &Context, operation: &str, payload: &str, backtrace: &str) {
        error!(
            request_id = ctx.request_id().unwrap_or_default(),
            correlation_id = ctx.correlation_id().unwrap_or_default(),
            operation = operation,
            panic_message = payload,
            backtrace = backtrace,
            "Handler panicked - CRITICAL"
        );
    }

    fn log_debug_timed(&self, ctx: &Context, operation: &str, elapsed: Duration) {
        debug!(
            request_id = ctx.request_id().unwrap_or_default(),
            correlation_id = ctx.correlation_id().unwrap_or_default(),
            operation = operation,
            elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            "Dispatch complete"
        );
    }

    fn debug_enabled(&self) -> bool {
        tracing::enabled!(Level::DEBUG)
    }
}
