use std::marker::PhantomData;

use crate::context::Context;
use crate::result::{Error, Outcome};

/// A request routed by its self-reported operation identifier.
///
/// The identifier decouples the request's identity from its Rust type, so a
/// request and its handler can be renamed or versioned independently.
pub trait Request: Send + 'static {
    /// The response a successful handler produces for this request
    type Response: Send + 'static;

    /// Operation identifier the dispatcher looks up in the registry
    fn handler_id(&self) -> &str;
}

/// Trait implemented by typed handlers.
///
/// A singleton handler is shared by every dispatch and must be safe for
/// concurrent invocation. Handlers that keep per-call mutable state are
/// registered through a factory instead, which builds a fresh value for each
/// dispatch.
pub trait Handler<R: Request>: Send + Sync + 'static {
    /// Handle a request.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Bounded context; check it (or wait on it) in long-running work
    /// * `req` - The request, owned by the handler for the duration of the call
    fn handle(&self, ctx: &Context, req: R) -> Result<R::Response, Error>;
}

impl<R: Request, H: Handler<R> + ?Sized> Handler<R> for Box<H> {
    fn handle(&self, ctx: &Context, req: R) -> Result<R::Response, Error> {
        (**self).handle(ctx, req)
    }
}

/// Adapter turning a closure into a [`Handler`].
pub struct FnHandler<R, F> {
    f: F,
    _phantom: PhantomData<fn(R)>,
}

impl<R, F> Handler<R> for FnHandler<R, F>
where
    R: Request,
    F: Fn(&Context, R) -> Result<R::Response, Error> + Send + Sync + 'static,
{
    fn handle(&self, ctx: &Context, req: R) -> Result<R::Response, Error> {
        (self.f)(ctx, req)
    }
}

/// Wrap a closure as a handler.
///
/// ```rust
/// use cqs_dispatch::context::Context;
/// use cqs_dispatch::typed::{handler_fn, Handler, Request};
///
/// struct Ping;
/// impl Request for Ping {
///     type Response = &'static str;
///     fn handler_id(&self) -> &str { "ping" }
/// }
///
/// let h = handler_fn(|_ctx: &Context, _req: Ping| Ok("pong"));
/// assert_eq!(h.handle(&Context::background(), Ping).unwrap(), "pong");
/// ```
pub fn handler_fn<R, F>(f: F) -> FnHandler<R, F>
where
    R: Request,
    F: Fn(&Context, R) -> Result<R::Response, Error> + Send + Sync + 'static,
{
    FnHandler {
        f,
        _phantom: PhantomData,
    }
}

/// Self-executing unit keyed by its Rust type.
///
/// The unit carries its own per-call data. The shared dependency bundle it
/// needs is registered once per type and handed to [`Executor::execute`] on
/// every dispatch, so executors never hold collaborators themselves.
pub trait Executor: Send + 'static {
    /// Shared collaborators, registered once and reused for every call
    type Deps: Send + Sync + 'static;
    /// Success value
    type Output: Send + 'static;

    fn execute(self, ctx: &Context, deps: &Self::Deps) -> Outcome<Self::Output>;
}

/// Marker for executors that change state.
pub trait Command: Executor {}

/// Marker for executors that only read state.
pub trait Query: Executor {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ErrorCode;

    struct Double(i64);

    impl Request for Double {
        type Response = i64;
        fn handler_id(&self) -> &str {
            "double"
        }
    }

    #[test]
    fn test_fn_handler() {
        let h = handler_fn(|_ctx: &Context, req: Double| Ok(req.0 * 2));
        assert_eq!(h.handle(&Context::background(), Double(21)), Ok(42));
    }

    #[test]
    fn test_boxed_handler() {
        let h: Box<dyn Handler<Double>> = Box::new(handler_fn(|_ctx: &Context, _req: Double| {
            Err(Error::new(ErrorCode::Unavailable, "down"))
        }));
        let err = h.handle(&Context::background(), Double(1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unavailable);
    }
}
