//! # Typed Module
//!
//! Handler traits for the two dispatch styles.
//!
//! ## Identifier-keyed requests
//!
//! A [`Request`] names its operation through [`Request::handler_id`] and declares
//! its response type. A [`Handler`] for that request is registered under the same
//! identifier, either as a shared singleton or through a factory producing a
//! fresh handler per dispatch.
//!
//! ```rust
//! use cqs_dispatch::context::Context;
//! use cqs_dispatch::result::Error;
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
//! ```
//!
//! ## Type-keyed executors
//!
//! An [`Executor`] is a command or query value that runs itself. It is keyed by
//! its Rust type and receives the dependency bundle registered for that type.

mod core;

pub use core::*;
