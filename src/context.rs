//! # Context Module
//!
//! Request-scoped context passed to every handler: deadline, cooperative
//! cancellation, and the correlation identifiers the logging sink attaches to
//! each line.
//!
//! ## Cancellation
//!
//! Contexts form a tree. Deriving a child with [`Context::with_cancel`] or
//! [`Context::with_timeout`] returns a [`CancelGuard`]; dropping the guard
//! cancels the child and everything derived from it. Cancelling a parent
//! cancels all of its live children.
//!
//! Deadlines are compared against the monotonic clock whenever the context is
//! queried or waited on, so no timer thread is ever started.
//!
//! ```rust
//! use cqs_dispatch::context::{Context, ContextError};
//! use std::time::Duration;
//!
//! let root = Context::background().with_request_id("req-1");
//! let (ctx, _guard) = root.with_timeout(Duration::from_millis(10));
//!
//! // A cooperative handler blocks until the deadline fires
//! assert_eq!(ctx.wait_cancelled(), ContextError::DeadlineExceeded);
//! assert_eq!(ctx.request_id(), Some("req-1"));
//! ```
//!
//! Cancellation is advisory: a handler that never looks at its context keeps
//! running until it returns on its own.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use crate::ids::RequestId;
use crate::result::{Error, ErrorCode};

/// Why a context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// Cancelled explicitly, or by a parent, or by the guard going out of scope
    Canceled,
    /// The deadline elapsed
    DeadlineExceeded,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::Canceled => write!(f, "context canceled"),
            ContextError::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

impl std::error::Error for ContextError {}

impl From<ContextError> for Error {
    fn from(err: ContextError) -> Self {
        let code = match err {
            ContextError::Canceled => ErrorCode::Canceled,
            ContextError::DeadlineExceeded => ErrorCode::DeadlineExceeded,
        };
        Error::new(code, err.to_string())
    }
}

#[derive(Debug, Default)]
struct NodeState {
    reason: Option<ContextError>,
    children: Vec<Weak<Node>>,
}

#[derive(Debug)]
struct Node {
    cancellable: bool,
    deadline: Option<Instant>,
    state: Mutex<NodeState>,
    cond: Condvar,
}

impl Node {
    fn new(cancellable: bool, deadline: Option<Instant>) -> Self {
        Self {
            cancellable,
            deadline,
            state: Mutex::new(NodeState::default()),
            cond: Condvar::new(),
        }
    }

    fn deadline_passed(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    fn err(&self) -> Option<ContextError> {
        if let Some(reason) = self.state.lock().reason {
            return Some(reason);
        }
        self.deadline_passed(Instant::now())
            .then_some(ContextError::DeadlineExceeded)
    }

    fn cancel(&self, reason: ContextError) {
        if !self.cancellable {
            return;
        }
        let (reason, children) = {
            let mut state = self.state.lock();
            if state.reason.is_some() {
                return;
            }
            // A deadline that already fired wins over a later explicit cancel
            let reason = if self.deadline_passed(Instant::now()) {
                ContextError::DeadlineExceeded
            } else {
                reason
            };
            state.reason = Some(reason);
            self.cond.notify_all();
            (reason, std::mem::take(&mut state.children))
        };
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel(reason);
        }
    }

    fn adopt(&self, child: &Arc<Node>) -> Option<ContextError> {
        if !self.cancellable {
            return None;
        }
        let mut state = self.state.lock();
        if let Some(reason) = state.reason {
            return Some(reason);
        }
        state.children.retain(|w| w.strong_count() > 0);
        state.children.push(Arc::downgrade(child));
        None
    }

    /// Block until done, or until `limit` passes. Returns `None` when `limit`
    /// was reached first.
    fn wait(&self, limit: Option<Instant>) -> Option<ContextError> {
        let mut state = self.state.lock();
        loop {
            if let Some(reason) = state.reason {
                return Some(reason);
            }
            let now = Instant::now();
            if self.deadline_passed(now) {
                return Some(ContextError::DeadlineExceeded);
            }
            if limit.is_some_and(|l| now >= l) {
                return None;
            }
            let wake = match (self.deadline, limit) {
                (Some(d), Some(l)) => Some(d.min(l)),
                (d, l) => d.or(l),
            };
            match wake {
                Some(at) => {
                    self.cond.wait_until(&mut state, at);
                }
                None => self.cond.wait(&mut state),
            }
        }
    }
}

/// Request-scoped context. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Context {
    node: Arc<Node>,
    request_id: Option<Arc<str>>,
    correlation_id: Option<Arc<str>>,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// Root context: never cancelled, no deadline, no identifiers.
    #[must_use]
    pub fn background() -> Self {
        Self {
            node: Arc::new(Node::new(false, None)),
            request_id: None,
            correlation_id: None,
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Fill a missing request identifier with a fresh ULID.
    #[must_use]
    pub fn ensure_request_id(self) -> Self {
        if self.request_id.is_some() {
            self
        } else {
            let id = RequestId::new().to_string();
            self.with_request_id(id)
        }
    }

    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// The effective deadline, inherited from the closest ancestor that set one.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.node.deadline
    }

    /// Time left before the deadline; `None` without a deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Why the context is done, or `None` while it is still live.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        self.node.err()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// `Err` once the context is done. Handlers use this with `?` between steps.
    pub fn check(&self) -> Result<(), ContextError> {
        match self.err() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Block until the context is cancelled or its deadline elapses.
    ///
    /// On a context that can never be done (a bare [`Context::background`])
    /// this blocks forever.
    pub fn wait_cancelled(&self) -> ContextError {
        loop {
            if let Some(reason) = self.node.wait(None) {
                return reason;
            }
        }
    }

    /// Sleep for `duration`, waking early if the context is done.
    ///
    /// A duration past the end of the clock sleeps until the context is done.
    pub fn sleep(&self, duration: Duration) -> Result<(), ContextError> {
        let Some(until) = Instant::now().checked_add(duration) else {
            return Err(self.wait_cancelled());
        };
        match self.node.wait(Some(until)) {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// Derive a cancellable child. Dropping the guard cancels it.
    #[must_use]
    pub fn with_cancel(&self) -> (Context, CancelGuard) {
        self.derive(self.node.deadline)
    }

    /// Derive a child that is cancelled `timeout` from now, or earlier if the
    /// parent's deadline comes first. A timeout past the end of the clock adds
    /// no deadline of its own.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> (Context, CancelGuard) {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.with_cancel(),
        }
    }

    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> (Context, CancelGuard) {
        let effective = match self.node.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        self.derive(Some(effective))
    }

    fn derive(&self, deadline: Option<Instant>) -> (Context, CancelGuard) {
        let node = Arc::new(Node::new(true, deadline));
        if let Some(reason) = self.node.adopt(&node) {
            node.cancel(reason);
        }
        let ctx = Context {
            node: Arc::clone(&node),
            request_id: self.request_id.clone(),
            correlation_id: self.correlation_id.clone(),
        };
        (ctx, CancelGuard { node })
    }
}

/// Cancels its context when dropped, on every exit path.
#[must_use = "dropping the guard cancels the context immediately"]
#[derive(Debug)]
pub struct CancelGuard {
    node: Arc<Node>,
}

impl CancelGuard {
    pub fn cancel(&self) {
        self.node.cancel(ContextError::Canceled);
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn background_is_never_done() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        assert!(ctx.deadline().is_none());
        assert_eq!(ctx.sleep(Duration::from_millis(1)), Ok(()));
    }

    #[test]
    fn guard_drop_cancels() {
        let (ctx, guard) = Context::background().with_cancel();
        assert!(!ctx.is_done());
        drop(guard);
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn deadline_fires_without_cancel() {
        let (ctx, _guard) = Context::background().with_timeout(Duration::from_millis(20));
        let start = Instant::now();
        assert_eq!(ctx.wait_cancelled(), ContextError::DeadlineExceeded);
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(ctx.check(), Err(ContextError::DeadlineExceeded));
    }

    #[test]
    fn deadline_survives_later_cancel() {
        let (ctx, guard) = Context::background().with_timeout(Duration::from_millis(1));
        thread::sleep(Duration::from_millis(5));
        drop(guard);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[test]
    fn parent_cancel_reaches_children() {
        let (parent, parent_guard) = Context::background().with_cancel();
        let (child, _child_guard) = parent.with_timeout(Duration::from_secs(60));
        let (grandchild, _g) = child.with_cancel();

        let waiter = thread::spawn(move || grandchild.wait_cancelled());
        thread::sleep(Duration::from_millis(10));
        parent_guard.cancel();

        assert_eq!(waiter.join().unwrap(), ContextError::Canceled);
        assert_eq!(child.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn child_of_cancelled_parent_starts_cancelled() {
        let (parent, guard) = Context::background().with_cancel();
        guard.cancel();
        let (child, _g) = parent.with_cancel();
        assert_eq!(child.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn child_never_outlives_parent_deadline() {
        let (parent, _g) = Context::background().with_timeout(Duration::from_millis(50));
        let (child, _c) = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn sleep_wakes_on_cancel() {
        let (ctx, guard) = Context::background().with_cancel();
        let sleeper = {
            let ctx = ctx.clone();
            thread::spawn(move || ctx.sleep(Duration::from_secs(30)))
        };
        thread::sleep(Duration::from_millis(10));
        drop(guard);
        assert_eq!(sleeper.join().unwrap(), Err(ContextError::Canceled));
    }

    #[test]
    fn huge_timeout_keeps_parent_deadline() {
        let (unbounded, _g) = Context::background().with_timeout(Duration::MAX);
        assert!(unbounded.deadline().is_none());
        assert!(!unbounded.is_done());

        let (parent, _p) = Context::background().with_timeout(Duration::from_secs(60));
        let (child, _c) = parent.with_timeout(Duration::MAX);
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn huge_sleep_waits_for_cancel() {
        let (ctx, guard) = Context::background().with_cancel();
        let sleeper = {
            let ctx = ctx.clone();
            thread::spawn(move || ctx.sleep(Duration::MAX))
        };
        thread::sleep(Duration::from_millis(10));
        drop(guard);
        assert_eq!(sleeper.join().unwrap(), Err(ContextError::Canceled));
    }

    #[test]
    fn identifiers_are_inherited() {
        let root = Context::background()
            .with_request_id("r-1")
            .with_correlation_id("c-1");
        let (child, _g) = root.with_cancel();
        assert_eq!(child.request_id(), Some("r-1"));
        assert_eq!(child.correlation_id(), Some("c-1"));
    }

    #[test]
    fn ensure_request_id_fills_only_missing() {
        let filled = Context::background().ensure_request_id();
        assert!(filled.request_id().is_some());
        let kept = Context::background().with_request_id("keep").ensure_request_id();
        assert_eq!(kept.request_id(), Some("keep"));
    }

    #[test]
    fn context_error_maps_to_canonical_code() {
        assert_eq!(Error::from(ContextError::Canceled).code, ErrorCode::Canceled);
        assert_eq!(
            Error::from(ContextError::DeadlineExceeded).code,
            ErrorCode::DeadlineExceeded
        );
    }
}
