#![allow(dead_code)]

use cqs_dispatch::context::Context;
use cqs_dispatch::dispatcher::Dispatcher;
use cqs_dispatch::registry::HandlerRegistry;
use cqs_dispatch::result::Error;
use cqs_dispatch::runtime_config::DispatcherConfig;
use cqs_dispatch::typed::{Handler, Request};
use std::sync::Arc;

pub mod log_capture {
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;
    use tracing::subscriber::DefaultGuard;
    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory sink for `tracing_subscriber::fmt` output.
    #[derive(Clone, Default)]
    pub struct CapturedLogs {
        buf: Arc<Mutex<Vec<u8>>>,
    }

    pub struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedWriter;

        fn make_writer(&'a self) -> Self::Writer {
            CapturedWriter(Arc::clone(&self.buf))
        }
    }

    impl CapturedLogs {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.buf.lock()).into_owned()
        }

        pub fn contains(&self, needle: &str) -> bool {
            self.contents().contains(needle)
        }
    }

    /// Capture DEBUG and above on the current thread until the guard drops.
    pub fn capture() -> (CapturedLogs, DefaultGuard) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }
}

pub mod recording_log {
    use cqs_dispatch::context::Context;
    use cqs_dispatch::dispatcher::DispatchLog;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum LogEvent {
        Error {
            request_id: Option<String>,
            operation: String,
            message: String,
        },
        Panic {
            operation: String,
            payload: String,
        },
        Timed {
            operation: String,
        },
    }

    /// `DispatchLog` that keeps every call for later assertions.
    #[derive(Default)]
    pub struct RecordingLog {
        pub events: Mutex<Vec<LogEvent>>,
        pub backtraces: Mutex<Vec<String>>,
        pub debug: bool,
    }

    impl RecordingLog {
        pub fn with_debug() -> Self {
            Self {
                events: Mutex::default(),
                backtraces: Mutex::default(),
                debug: true,
            }
        }

        pub fn events(&self) -> Vec<LogEvent> {
            self.events.lock().clone()
        }

        pub fn backtraces(&self) -> Vec<String> {
            self.backtraces.lock().clone()
        }
    }

    impl DispatchLog for RecordingLog {
        fn log_error(&self, ctx: &Context, operation: &str, message: &str) {
            self.events.lock().push(LogEvent::Error {
                request_id: ctx.request_id().map(str::to_string),
                operation: operation.to_string(),
                message: message.to_string(),
            });
        }

        fn log_panic(&self, _ctx: &Context, operation: &str, payload: &str, backtrace: &str) {
            self.events.lock().push(LogEvent::Panic {
                operation: operation.to_string(),
                payload: payload.to_string(),
            });
            self.backtraces.lock().push(backtrace.to_string());
        }

        fn log_debug_timed(&self, _ctx: &Context, operation: &str, _elapsed: Duration) {
            self.events.lock().push(LogEvent::Timed {
                operation: operation.to_string(),
            });
        }

        fn debug_enabled(&self) -> bool {
            self.debug
        }
    }
}

/// Adds two integers; the running example for dispatch tests.
#[derive(Debug, Clone, Copy)]
pub struct Sum {
    pub a: i64,
    pub b: i64,
}

impl Request for Sum {
    type Response = i64;

    fn handler_id(&self) -> &str {
        "sum"
    }
}

/// Request sent to an identifier nobody registered.
pub struct Missing;

impl Request for Missing {
    type Response = ();

    fn handler_id(&self) -> &str {
        "missing"
    }
}

pub struct SumHandler;

impl Handler<Sum> for SumHandler {
    fn handle(&self, _ctx: &Context, req: Sum) -> Result<i64, Error> {
        Ok(req.a + req.b)
    }
}

/// Fresh registry with `sum` registered.
pub fn sum_registry() -> Arc<HandlerRegistry> {
    let registry = Arc::new(HandlerRegistry::new());
    registry
        .register_handler::<Sum, _>("sum", SumHandler)
        .expect("register sum");
    registry
}

pub fn dispatcher(registry: Arc<HandlerRegistry>) -> Dispatcher {
    Dispatcher::new(registry, DispatcherConfig::default())
}
