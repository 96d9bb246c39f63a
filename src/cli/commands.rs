use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use crate::context::Context;
use crate::dispatcher::Dispatcher;
use crate::ids::RequestId;
use crate::logging::{init_logging_with_config, LogConfig};
use crate::registry::HandlerRegistry;
use crate::result::{Error, ErrorCode, Outcome};
use crate::runtime_config::DispatcherConfig;
use crate::transport::http::{status_for_code, HttpReply};
use crate::transport::rpc::{into_rpc_result, rpc_code};
use crate::typed::{Handler, Request};

/// Command-line interface for the dispatch layer
#[derive(Parser)]
#[command(name = "cqs-dispatch")]
#[command(about = "In-process command/query dispatcher", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the error code to HTTP status and RPC code table
    Codes,
    /// Dispatch one request to the demo `sum` handler
    Sum {
        a: i64,
        b: i64,

        /// Per-dispatch deadline in milliseconds (overrides CQS_MAX_LATENCY_MS)
        #[arg(long)]
        max_latency_ms: Option<u64>,

        /// Make the handler wait this long on its context before answering
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,

        /// Operation identifier to send the request to
        #[arg(long, default_value = "sum")]
        operation: String,

        /// Request identifier; a ULID is generated when absent
        #[arg(long, env = "CQS_REQUEST_ID")]
        request_id: Option<String>,

        #[arg(long)]
        correlation_id: Option<String>,
    },
}

/// Demo request adding two integers.
#[derive(Debug, Clone)]
pub struct SumRequest {
    pub a: i64,
    pub b: i64,
    pub delay: Duration,
    pub operation: String,
}

impl Request for SumRequest {
    type Response = i64;

    fn handler_id(&self) -> &str {
        &self.operation
    }
}

struct SumHandler;

impl Handler<SumRequest> for SumHandler {
    fn handle(&self, ctx: &Context, req: SumRequest) -> Result<i64, Error> {
        if !req.delay.is_zero() {
            ctx.sleep(req.delay)?;
        }
        req.a.checked_add(req.b).ok_or_else(|| {
            Error::new(
                ErrorCode::OutOfRange,
                format!("{} + {} overflows a 64-bit integer", req.a, req.b),
            )
        })
    }
}

pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Codes => {
            println!("{:<20} {:>4}  RPC", "CODE", "HTTP");
            for code in ErrorCode::ALL {
                println!(
                    "{:<20} {:>4}  {:?}",
                    code.as_str(),
                    status_for_code(code).as_u16(),
                    rpc_code(code)
                );
            }
            Ok(())
        }
        Commands::Sum {
            a,
            b,
            max_latency_ms,
            delay_ms,
            operation,
            request_id,
            correlation_id,
        } => {
            init_logging_with_config(&LogConfig::from_env())?;

            let mut config = DispatcherConfig::from_env();
            if let Some(ms) = max_latency_ms {
                config = config.with_max_latency(Duration::from_millis(ms));
            }

            let registry = HandlerRegistry::global();
            registry
                .register_handler::<SumRequest, _>("sum", SumHandler)
                .context("registering the sum handler")?;
            let dispatcher = Dispatcher::new(Arc::clone(&registry), config);

            let mut ctx = Context::background()
                .with_request_id(RequestId::from_header_or_new(request_id.as_deref()));
            if let Some(id) = correlation_id {
                ctx = ctx.with_correlation_id(id);
            }

            let outcome: Outcome<i64> = dispatcher.dispatch_request(
                &ctx,
                SumRequest {
                    a,
                    b,
                    delay: Duration::from_millis(delay_ms),
                    operation,
                },
            );

            let reply = HttpReply::from_outcome(&outcome);
            println!("http: {}", serde_json::to_string(&reply)?);
            match into_rpc_result(outcome) {
                Ok(value) => println!("rpc:  Ok {value}"),
                Err(status) => println!("rpc:  {:?} {}", status.code(), status.message()),
            }
            Ok(())
        }
    }
}
