use std::any::type_name;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::log::{DispatchLog, TracingLog};
use super::panic::{contain, install_hook, CaughtPanic};
use crate::context::{CancelGuard, Context};
use crate::metrics::{DispatchMetrics, DispatchStatus};
use crate::registry::{HandlerRegistry, HandlerSlot, OperationId};
use crate::result::{Error, ErrorCode, Outcome};
use crate::runtime_config::DispatcherConfig;
use crate::typed::{Executor, Request};

/// Message returned to callers for faults inside the dispatch layer. Details
/// go to the logs only.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "an error occurred while the server was processing the request";

/// Why a dispatch did not produce a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No entry is registered for the operation
    HandlerNotFound { operation: String },
    /// An entry exists but was registered for a different request or executor type
    UnsupportedHandlerShape {
        operation: String,
        expected: &'static str,
        registered: &'static str,
    },
    /// The handler panicked; `payload` is the panic message
    Panicked { operation: String, payload: String },
    /// The handler returned an error
    Handler(Error),
}

impl DispatchError {
    /// Canonical code: resolution errors and panics are `Internal`, handler
    /// errors keep their own code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            DispatchError::Handler(err) => err.code,
            _ => ErrorCode::Internal,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::HandlerNotFound { operation } => {
                write!(f, "no handler registered for operation '{operation}'")
            }
            DispatchError::UnsupportedHandlerShape {
                operation,
                expected,
                registered,
            } => write!(
                f,
                "handler for operation '{operation}' was registered for {registered}, dispatched with {expected}"
            ),
            DispatchError::Panicked { operation, .. } => {
                write!(f, "handler for operation '{operation}' panicked")
            }
            DispatchError::Handler(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Handler(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DispatchError> for Error {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Handler(err) => err,
            _ => Error::internal(INTERNAL_ERROR_MESSAGE),
        }
    }
}

/// Routes requests to registered handlers on the caller's thread.
///
/// Each dispatch runs under a child of the caller's context. When a maximum
/// latency is configured the child carries that deadline, and it is cancelled
/// as soon as the dispatch returns.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    config: DispatcherConfig,
    log: Arc<dyn DispatchLog>,
    metrics: Option<Arc<DispatchMetrics>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(registry: Arc<HandlerRegistry>, config: DispatcherConfig) -> Self {
        install_hook();
        let metrics = config
            .record_metrics
            .then(|| Arc::new(DispatchMetrics::new()));
        Self {
            registry,
            config,
            log: Arc::new(TracingLog),
            metrics,
        }
    }

    /// Dispatcher over the process-wide registry, configured from the environment.
    pub fn from_global() -> Self {
        Self::new(HandlerRegistry::global(), DispatcherConfig::from_env())
    }

    /// Replace the log sink.
    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn DispatchLog>) -> Self {
        self.log = log;
        self
    }

    /// Record per-operation metrics into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn metrics(&self) -> Option<&Arc<DispatchMetrics>> {
        self.metrics.as_ref()
    }

    /// Dispatch an identifier-keyed request.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`]. Handler errors are returned unchanged inside
    /// [`DispatchError::Handler`].
    pub fn send<R: Request>(&self, ctx: &Context, req: R) -> Result<R::Response, DispatchError> {
        let start = Instant::now();
        let (ctx, _guard) = self.bound(ctx);
        let operation = req.handler_id().to_owned();

        debug!(
            request_id = ctx.request_id().unwrap_or_default(),
            operation = %operation,
            request_type = type_name::<R>(),
            "Dispatching request"
        );

        let entry = match self.registry.lookup(&operation) {
            Some(entry) => entry,
            None => return Err(self.not_found(&ctx, operation, start)),
        };

        let Some(slot) = entry.handler_slot::<R>() else {
            let err = DispatchError::UnsupportedHandlerShape {
                operation: operation.clone(),
                expected: type_name::<R>(),
                registered: entry.type_name(),
            };
            return Err(self.fail(&ctx, &operation, start, err));
        };

        let result = contain(|| match slot {
            HandlerSlot::Singleton(handler) => handler.handle(&ctx, req),
            HandlerSlot::Factory(factory) => factory().handle(&ctx, req),
        });

        self.finish(&ctx, &operation, start, result)
    }

    /// Dispatch an identifier-keyed request, returning an [`Outcome`].
    pub fn dispatch_request<R: Request>(&self, ctx: &Context, req: R) -> Outcome<R::Response> {
        Outcome::from(self.send(ctx, req))
    }

    /// Dispatch a type-keyed executor with its registered dependency bundle.
    pub fn dispatch<E: Executor>(&self, ctx: &Context, executor: E) -> Outcome<E::Output> {
        Outcome::from(self.run_executor(ctx, executor))
    }

    fn run_executor<E: Executor>(&self, ctx: &Context, executor: E) -> Result<E::Output, DispatchError> {
        let start = Instant::now();
        let (ctx, _guard) = self.bound(ctx);
        let operation = OperationId::of::<E>().to_string();

        let entry = match self.registry.lookup(&operation) {
            Some(entry) => entry,
            None => return Err(self.not_found(&ctx, operation, start)),
        };

        let Some(slot) = entry.executor_slot::<E>() else {
            let err = DispatchError::UnsupportedHandlerShape {
                operation: operation.clone(),
                expected: type_name::<E>(),
                registered: entry.type_name(),
            };
            return Err(self.fail(&ctx, &operation, start, err));
        };
        let deps = Arc::clone(&slot.deps);

        let result = contain(|| executor.execute(&ctx, &deps).into_result());

        self.finish(&ctx, &operation, start, result)
    }

    fn bound(&self, parent: &Context) -> (Context, CancelGuard) {
        match self.config.max_latency {
            Some(max) => parent.with_timeout(max),
            None => parent.with_cancel(),
        }
    }

    fn not_found(&self, ctx: &Context, operation: String, start: Instant) -> DispatchError {
        let available: Vec<String> = self
            .registry
            .operations()
            .iter()
            .map(ToString::to_string)
            .collect();
        self.log.log_error(
            ctx,
            &operation,
            &format!("Handler not found - CRITICAL (available operations: {available:?})"),
        );
        self.record(&operation, start, DispatchStatus::Failure);
        DispatchError::HandlerNotFound { operation }
    }

    fn fail(&self, ctx: &Context, operation: &str, start: Instant, err: DispatchError) -> DispatchError {
        self.log.log_error(ctx, operation, &err.to_string());
        self.record(operation, start, DispatchStatus::Failure);
        err
    }

    fn finish<T>(
        &self,
        ctx: &Context,
        operation: &str,
        start: Instant,
        result: Result<Result<T, Error>, CaughtPanic>,
    ) -> Result<T, DispatchError> {
        match result {
            Ok(Ok(value)) => {
                let elapsed = start.elapsed();
                if self.log.debug_enabled() {
                    self.log.log_debug_timed(ctx, operation, elapsed);
                }
                if let Some(metrics) = &self.metrics {
                    metrics.record(operation, elapsed, DispatchStatus::Success);
                }
                Ok(value)
            }
            Ok(Err(err)) => {
                self.log.log_error(ctx, operation, &err.to_string());
                self.record(operation, start, DispatchStatus::Failure);
                Err(DispatchError::Handler(err))
            }
            Err(CaughtPanic { payload, backtrace }) => {
                self.log.log_panic(ctx, operation, &payload, &backtrace);
                self.record(operation, start, DispatchStatus::Panic);
                Err(DispatchError::Panicked {
                    operation: operation.to_owned(),
                    payload,
                })
            }
        }
    }

    fn record(&self, operation: &str, start: Instant, status: DispatchStatus) {
        if let Some(metrics) = &self.metrics {
            metrics.record(operation, start.elapsed(), status);
        }
    }
}
