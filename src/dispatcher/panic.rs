use once_cell::sync::Lazy;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};

thread_local! {
    // Number of `contain` frames active on this thread
    static CONTAINING: Cell<u32> = const { Cell::new(0) };
    static LAST_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Wraps whatever hook was installed before. Panics raised inside `contain`
/// have their backtrace stashed for the dispatcher and are not printed;
/// everything else goes to the previous hook.
static PANIC_HOOK: Lazy<()> = Lazy::new(|| {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if CONTAINING.with(Cell::get) > 0 {
            let trace = Backtrace::force_capture().to_string();
            LAST_TRACE.with(|t| *t.borrow_mut() = Some(trace));
        } else {
            previous(info);
        }
    }));
});

/// A panic caught at the dispatch boundary.
#[derive(Debug)]
pub(crate) struct CaughtPanic {
    pub(crate) payload: String,
    /// Captured at the panic site
    pub(crate) backtrace: String,
}

pub(crate) fn install_hook() {
    Lazy::force(&PANIC_HOOK);
}

struct Depth;

impl Depth {
    fn enter() -> Self {
        CONTAINING.with(|c| c.set(c.get() + 1));
        Depth
    }
}

impl Drop for Depth {
    fn drop(&mut self) {
        CONTAINING.with(|c| c.set(c.get().saturating_sub(1)));
    }
}

/// Run `f`, converting a panic into [`CaughtPanic`].
pub(crate) fn contain<T>(f: impl FnOnce() -> T) -> Result<T, CaughtPanic> {
    install_hook();
    LAST_TRACE.with(|t| t.borrow_mut().take());
    let result = {
        let _depth = Depth::enter();
        panic::catch_unwind(AssertUnwindSafe(f))
    };
    result.map_err(|panic| CaughtPanic {
        payload: panic_message(panic.as_ref()),
        // Another hook replaced ours; the dispatch frames are the best we have
        backtrace: LAST_TRACE
            .with(|t| t.borrow_mut().take())
            .unwrap_or_else(|| Backtrace::force_capture().to_string()),
    })
}

#[cfg(test)]
pub(crate) fn is_containing() -> bool {
    CONTAINING.with(Cell::get) > 0
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
