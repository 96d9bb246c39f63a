//! # Registry Module
//!
//! Maps operation identifiers to the logic that executes them.
//!
//! Three kinds of entries are supported:
//!
//! - **Handler**: one shared instance serving every dispatch for an identifier
//! - **Factory**: a constructor producing a fresh handler per dispatch, for
//!   handlers holding per-call mutable state
//! - **Executor**: a self-executing command or query type, keyed by its Rust
//!   type name, with a shared dependency bundle handed to it on each call
//!
//! Registration happens at start-up. Registering an identifier twice is an
//! error and leaves the first registration in place.
//!
//! ## Concurrency
//!
//! Lookups load an `ArcSwap` snapshot and never block. Writers are serialised
//! by a mutex and publish a new snapshot (copy-on-write), so a dispatch in
//! flight always sees a consistent table.
//!
//! ```rust
//! use cqs_dispatch::context::Context;
//! use cqs_dispatch::registry::HandlerRegistry;
//! use cqs_dispatch::result::Error;
//! use cqs_dispatch::typed::{handler_fn, Request};
//!
//! struct Sum { a: i64, b: i64 }
//! impl Request for Sum {
//!     type Response = i64;
//!     fn handler_id(&self) -> &str { "sum" }
//! }
//!
//! let registry = HandlerRegistry::new();
//! registry
//!     .register_handler::<Sum, _>("sum", handler_fn(|_: &Context, r: Sum| Ok::<_, Error>(r.a + r.b)))
//!     .unwrap();
//! assert!(registry.contains("sum"));
//! ```

mod core;

pub use core::{DependencyScope, EntryKind, HandlerRegistry, OperationId, RegistryEntry, RegistryError};
pub(crate) use core::HandlerSlot;
