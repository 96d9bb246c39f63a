//! # CLI Module
//!
//! Command-line front end for inspecting the transport mappings and exercising
//! the dispatcher.
//!
//! ## Commands
//!
//! ### `codes`
//!
//! Print every canonical error code with its HTTP status and RPC code:
//!
//! ```bash
//! cqs-dispatch codes
//! ```
//!
//! ### `sum`
//!
//! Register the demo `sum` handler, dispatch one request and print the HTTP
//! and RPC renderings of the outcome:
//!
//! ```bash
//! cqs-dispatch sum 2 3
//! cqs-dispatch sum 2 3 --delay-ms 50 --max-latency-ms 10   # DeadlineExceeded
//! cqs-dispatch sum 2 3 --operation missing                  # Internal
//! ```

mod commands;

pub use commands::{run_cli, Cli, Commands, SumRequest};
