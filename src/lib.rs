//! # cqs-dispatch
//!
//! In-process request dispatch for command/query services: a registry mapping
//! operation identifiers to handlers, a dispatcher that runs them under a
//! bounded context, a canonical error model, and mappings from that model to
//! HTTP and RPC status codes.
//!
//! ## Architecture
//!
//! - **[`typed`]** - `Request`, `Handler` and `Executor` traits
//! - **[`registry`]** - Operation identifier → handler table (lock-free reads)
//! - **[`dispatcher`]** - Lookup, deadline, panic containment and logging
//! - **[`context`]** - Cancellation tree with deadlines and request identifiers
//! - **[`result`]** - `ErrorCode`, `Error` and `Outcome`
//! - **[`transport`]** - `ErrorCode` → HTTP status / RPC code
//! - **[`runtime_config`]** and **[`logging`]** - Environment-driven setup
//! - **[`metrics`]** - Optional per-operation counters
//!
//! ### Request Handling Flow
//!
//! ```text
//! caller ──► Dispatcher::send(ctx, req)
//!              │  child context (max latency)
//!              │  registry lookup by req.handler_id()
//!              │  factory → fresh handler / singleton
//!              ▼
//!            Handler::handle(ctx, req)  ── panic ──► Internal
//!              │
//!              ▼
//!            Result<Response, DispatchError> ──► transport::{http, rpc}
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use cqs_dispatch::context::Context;
//! use cqs_dispatch::dispatcher::Dispatcher;
//! use cqs_dispatch::registry::HandlerRegistry;
//! use cqs_dispatch::result::{Error, ErrorCode};
//! use cqs_dispatch::runtime_config::DispatcherConfig;
//! use cqs_dispatch::transport::http::status_for_outcome;
//! use cqs_dispatch::typed::{Handler, Request};
//!
//! struct Sum { a: i64, b: i64 }
//!
//! impl Request for Sum {
//!     type Response = i64;
//!     fn handler_id(&self) -> &str { "sum" }
//! }
//!
//! struct SumHandler;
//!
//! impl Handler<Sum> for SumHandler {
//!     fn handle(&self, _ctx: &Context, req: Sum) -> Result<i64, Error> {
//!         Ok(req.a + req.b)
//!     }
//! }
//!
//! let registry = Arc::new(HandlerRegistry::new());
//! registry.register_handler::<Sum, _>("sum", SumHandler)?;
//!
//! let dispatcher = Dispatcher::new(registry, DispatcherConfig::default());
//! let ctx = Context::background().with_request_id("req-1");
//!
//! let outcome = dispatcher.dispatch_request(&ctx, Sum { a: 2, b: 3 });
//! assert_eq!(outcome.value(), Some(&5));
//! assert_eq!(status_for_outcome(&outcome).as_u16(), 200);
//! # Ok::<(), cqs_dispatch::registry::RegistryError>(())
//! ```
//!
//! ## Runtime Considerations
//!
//! Dispatch is synchronous on the caller's thread. Deadlines are cooperative:
//! handlers observe them through their [`Context`](context::Context).

pub mod cli;
pub mod context;
pub mod dispatcher;
pub mod ids;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod result;
pub mod runtime_config;
pub mod transport;
pub mod typed;

pub use context::{CancelGuard, Context, ContextError};
pub use dispatcher::{DispatchError, DispatchLog, Dispatcher, TracingLog};
pub use registry::{HandlerRegistry, OperationId, RegistryError};
pub use result::{Error, ErrorCode, Outcome};
pub use typed::{handler_fn, Command, Executor, Handler, Query, Request};
