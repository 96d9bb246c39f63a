use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::any::{type_name, Any};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::typed::{Executor, Handler, Request};

/// Stable string key naming one logical operation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(Arc<str>);

impl OperationId {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Type-keyed identifier, derived from the Rust type name.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self(Arc::from(type_name::<T>()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for OperationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl From<&str> for OperationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for OperationId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// How a registry entry produces its executable logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// One shared handler instance
    Handler,
    /// A constructor invoked once per dispatch
    Factory,
    /// A type-keyed executor plus its dependency bundle
    Executor,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Handler => write!(f, "handler"),
            EntryKind::Factory => write!(f, "factory"),
            EntryKind::Executor => write!(f, "executor"),
        }
    }
}

/// Errors raised while populating the registry. These are programming errors
/// and should stop start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The identifier already has an entry; the existing entry is kept
    DuplicateRegistration {
        operation: OperationId,
        existing: EntryKind,
    },
    /// Empty operation identifier
    InvalidIdentifier,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateRegistration {
                operation,
                existing,
            } => write!(
                f,
                "duplicated registration detected for operation '{operation}' (already registered as {existing})"
            ),
            RegistryError::InvalidIdentifier => {
                write!(f, "operation identifier must not be empty")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

pub(crate) type BoxedFactory<R> = Arc<dyn Fn() -> Box<dyn Handler<R>> + Send + Sync>;

pub(crate) enum HandlerSlot<R: Request> {
    Singleton(Arc<dyn Handler<R>>),
    Factory(BoxedFactory<R>),
}

pub(crate) struct ExecutorSlot<E: Executor> {
    pub(crate) deps: Arc<E::Deps>,
    _executor: PhantomData<fn() -> E>,
}

/// One registered operation.
///
/// Cloning is cheap; the handler and dependency bundle are shared.
#[derive(Clone)]
pub struct RegistryEntry {
    operation: OperationId,
    kind: EntryKind,
    type_name: &'static str,
    slot: Arc<dyn Any + Send + Sync>,
}

impl RegistryEntry {
    #[must_use]
    pub fn operation(&self) -> &OperationId {
        &self.operation
    }

    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Request (or executor) type the entry was registered for.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn handler_slot<R: Request>(&self) -> Option<&HandlerSlot<R>> {
        self.slot.downcast_ref::<HandlerSlot<R>>()
    }

    pub(crate) fn executor_slot<E: Executor>(&self) -> Option<&ExecutorSlot<E>> {
        self.slot.downcast_ref::<ExecutorSlot<E>>()
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("operation", &self.operation)
            .field("kind", &self.kind)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

type EntryMap = HashMap<OperationId, RegistryEntry>;

static GLOBAL: Lazy<Arc<HandlerRegistry>> = Lazy::new(|| Arc::new(HandlerRegistry::new()));

/// Operation identifier → handler table.
///
/// Reads load an immutable snapshot and never block. Writes take the registry
/// mutex, copy the current map, insert, and publish the new snapshot.
pub struct HandlerRegistry {
    entries: ArcSwap<EntryMap>,
    write_lock: Mutex<()>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("operations", &self.operations())
            .finish()
    }
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Process-wide registry.
    #[must_use]
    pub fn global() -> Arc<HandlerRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Register a shared handler for `id`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateRegistration`] if `id` is taken; the first
    /// registration stays in place.
    pub fn register_handler<R, H>(
        &self,
        id: impl Into<OperationId>,
        handler: H,
    ) -> Result<(), RegistryError>
    where
        R: Request,
        H: Handler<R>,
    {
        let slot: HandlerSlot<R> = HandlerSlot::Singleton(Arc::new(handler));
        self.insert(id.into(), EntryKind::Handler, type_name::<R>(), Arc::new(slot))
    }

    /// Register a factory for `id`. The factory runs once per dispatch so each
    /// call gets its own handler value.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateRegistration`] if `id` is taken.
    pub fn register_factory<R, H, F>(
        &self,
        id: impl Into<OperationId>,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        R: Request,
        H: Handler<R>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let boxed: BoxedFactory<R> = Arc::new(move || Box::new(factory()) as Box<dyn Handler<R>>);
        let slot: HandlerSlot<R> = HandlerSlot::Factory(boxed);
        self.insert(id.into(), EntryKind::Factory, type_name::<R>(), Arc::new(slot))
    }

    /// Register executor type `E` with its dependency bundle. The key is
    /// [`OperationId::of::<E>()`](OperationId::of).
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateRegistration`] if `E` is already registered.
    pub fn register_executor<E: Executor>(&self, deps: Arc<E::Deps>) -> Result<(), RegistryError> {
        let slot = ExecutorSlot::<E> {
            deps,
            _executor: PhantomData,
        };
        self.insert(
            OperationId::of::<E>(),
            EntryKind::Executor,
            type_name::<E>(),
            Arc::new(slot),
        )
    }

    /// Register several executors that share one dependency bundle.
    ///
    /// ```rust
    /// # use std::sync::Arc;
    /// # use cqs_dispatch::context::Context;
    /// # use cqs_dispatch::registry::HandlerRegistry;
    /// # use cqs_dispatch::result::Outcome;
    /// # use cqs_dispatch::typed::Executor;
    /// struct Store;
    /// struct Create;
    /// struct Get;
    /// impl Executor for Create {
    ///     type Deps = Store;
    ///     type Output = ();
    ///     fn execute(self, _: &Context, _: &Store) -> Outcome<()> { Outcome::ok(()) }
    /// }
    /// impl Executor for Get {
    ///     type Deps = Store;
    ///     type Output = ();
    ///     fn execute(self, _: &Context, _: &Store) -> Outcome<()> { Outcome::ok(()) }
    /// }
    ///
    /// let registry = HandlerRegistry::new();
    /// registry
    ///     .with_dependencies(Arc::new(Store))
    ///     .register::<Create>()?
    ///     .register::<Get>()?;
    /// assert_eq!(registry.len(), 2);
    /// # Ok::<(), cqs_dispatch::registry::RegistryError>(())
    /// ```
    pub fn with_dependencies<D: Send + Sync + 'static>(&self, deps: Arc<D>) -> DependencyScope<'_, D> {
        DependencyScope {
            registry: self,
            deps,
        }
    }

    /// Look up an operation. Never blocks on writers.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<RegistryEntry> {
        self.entries.load().get(id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.load().contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered identifiers, sorted.
    #[must_use]
    pub fn operations(&self) -> Vec<OperationId> {
        let mut ops: Vec<OperationId> = self.entries.load().keys().cloned().collect();
        ops.sort();
        ops
    }

    /// Remove every entry. Test isolation only; production code never removes
    /// a registration.
    pub fn reset(&self) {
        let _guard = self.write_lock.lock();
        let removed = self.entries.load().len();
        self.entries.store(Arc::new(HashMap::new()));
        warn!(removed = removed, "Handler registry reset");
    }

    fn insert(
        &self,
        operation: OperationId,
        kind: EntryKind,
        type_name: &'static str,
        slot: Arc<dyn Any + Send + Sync>,
    ) -> Result<(), RegistryError> {
        if operation.as_str().trim().is_empty() {
            error!(kind = %kind, type_name = type_name, "Rejected empty operation identifier");
            return Err(RegistryError::InvalidIdentifier);
        }

        let _guard = self.write_lock.lock();
        let current = self.entries.load_full();

        if let Some(existing) = current.get(&operation) {
            error!(
                operation = %operation,
                kind = %kind,
                existing_kind = %existing.kind,
                "Duplicated handler registration detected"
            );
            return Err(RegistryError::DuplicateRegistration {
                operation,
                existing: existing.kind,
            });
        }

        let mut next: EntryMap = (*current).clone();
        next.insert(
            operation.clone(),
            RegistryEntry {
                operation: operation.clone(),
                kind,
                type_name,
                slot,
            },
        );
        let total = next.len();
        self.entries.store(Arc::new(next));

        info!(
            operation = %operation,
            kind = %kind,
            type_name = type_name,
            total_handlers = total,
            "Handler registered successfully"
        );
        Ok(())
    }
}

/// Builder returned by [`HandlerRegistry::with_dependencies`].
pub struct DependencyScope<'a, D> {
    registry: &'a HandlerRegistry,
    deps: Arc<D>,
}

impl<D: Send + Sync + 'static> DependencyScope<'_, D> {
    /// Register executor `E` with the shared bundle.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateRegistration`] if `E` is already registered.
    pub fn register<E: Executor<Deps = D>>(self) -> Result<Self, RegistryError> {
        self.registry.register_executor::<E>(Arc::clone(&self.deps))?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::result::{Error, Outcome};
    use crate::typed::handler_fn;

    struct Echo(String);

    impl Request for Echo {
        type Response = String;
        fn handler_id(&self) -> &str {
            "echo"
        }
    }

    fn echo_handler() -> impl Handler<Echo> {
        handler_fn(|_ctx: &Context, req: Echo| Ok::<_, Error>(req.0))
    }

    struct Noop;

    impl Executor for Noop {
        type Deps = ();
        type Output = ();
        fn execute(self, _ctx: &Context, _deps: &()) -> Outcome<()> {
            Outcome::ok(())
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = HandlerRegistry::new();
        registry.register_handler::<Echo, _>("echo", echo_handler()).unwrap();

        let entry = registry.lookup("echo").expect("entry");
        assert_eq!(entry.kind(), EntryKind::Handler);
        assert_eq!(entry.operation().as_str(), "echo");
        assert!(entry.handler_slot::<Echo>().is_some());
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let registry = HandlerRegistry::new();
        registry.register_handler::<Echo, _>("echo", echo_handler()).unwrap();
        let err = registry
            .register_factory::<Echo, _, _>("echo", echo_handler)
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateRegistration {
                operation: OperationId::from("echo"),
                existing: EntryKind::Handler,
            }
        );
        assert_eq!(registry.lookup("echo").unwrap().kind(), EntryKind::Handler);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let registry = HandlerRegistry::new();
        assert_eq!(
            registry.register_handler::<Echo, _>("  ", echo_handler()),
            Err(RegistryError::InvalidIdentifier)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_executor_is_type_keyed() {
        let registry = HandlerRegistry::new();
        registry.register_executor::<Noop>(Arc::new(())).unwrap();
        let entry = registry.lookup(type_name::<Noop>()).expect("entry");
        assert_eq!(entry.kind(), EntryKind::Executor);
        assert!(entry.executor_slot::<Noop>().is_some());
        assert!(registry.register_executor::<Noop>(Arc::new(())).is_err());
    }

    #[test]
    fn test_reset_clears() {
        let registry = HandlerRegistry::new();
        registry.register_handler::<Echo, _>("a", echo_handler()).unwrap();
        registry.register_handler::<Echo, _>("b", echo_handler()).unwrap();
        assert_eq!(
            registry.operations(),
            vec![OperationId::from("a"), OperationId::from("b")]
        );
        registry.reset();
        assert!(registry.is_empty());
        registry.register_handler::<Echo, _>("a", echo_handler()).unwrap();
    }

    #[test]
    fn test_snapshot_unaffected_by_later_writes() {
        let registry = HandlerRegistry::new();
        registry.register_handler::<Echo, _>("a", echo_handler()).unwrap();
        let before = registry.lookup("a").unwrap();
        registry.register_handler::<Echo, _>("b", echo_handler()).unwrap();
        assert_eq!(before.operation().as_str(), "a");
        assert!(registry.contains("b"));
    }
}
