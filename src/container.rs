//! Dependency container and its registration/resolution protocol

use crate::{
    Dependency,
    LazyDependency,
    StrongDependency,
    error::Error
};
use self::{
    config::Misuse,
    entry::{Entry, ErasedService, PendingCell, Registration, downcast},
    key::{EntryMap, TypeKey}
};
use std::{
    collections::hash_map,
    fmt::{Debug, Formatter},
    sync::{Arc, Mutex, MutexGuard, PoisonError}
};

pub use config::{ContainerConfig, Diagnostics};

pub mod config;
mod entry;
mod key;

/// Represents a dependency container.
///
/// Holds at most one registration per type. A registration is either
/// a pending builder, that runs on the first resolve, or an already resolved instance.
///
/// Cloning a `Container` produces another handle to the same registrations.
#[derive(Clone)]
pub struct Container {
    /// Shared HashMap of dependency entries
    entries: Arc<Mutex<EntryMap>>,

    /// Container configuration
    config: ContainerConfig
}

impl Debug for Container {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("entries", &self.entries().values().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for Container {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates an empty container with the default configuration
    #[inline]
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Creates an empty container with a specific configuration
    #[inline]
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            entries: Arc::new(Mutex::new(EntryMap::default())),
            config
        }
    }

    /// Returns the container configuration
    #[inline]
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Registers a builder for a strong dependency.
    ///
    /// The builder runs at most once, on the first [`resolve_strong`](Self::resolve_strong).
    /// If `T` already has an entry the call does nothing: a mock stays in place silently,
    /// anything else is reported according to the configured [`Diagnostics`].
    pub fn provide<T, F>(&self, builder: F)
    where
        T: StrongDependency + ?Sized,
        F: Fn() -> Arc<T> + Send + Sync + 'static
    {
        let misuse = match self.entries().entry(TypeKey::of::<T>()) {
            hash_map::Entry::Vacant(vacant) => {
                vacant.insert(Entry::pending(builder));
                None
            },
            hash_map::Entry::Occupied(occupied) => {
                let entry = occupied.get();
                match (entry.is_mock, entry.is_resolved()) {
                    (true, _) => None,
                    (false, true) => Some(Misuse::ProvidedAfterResolve),
                    (false, false) => Some(Misuse::ProvidedTwice),
                }
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(dependency = std::any::type_name::<T>(), ignored = misuse.is_some(), "provided");

        if let Some(misuse) = misuse {
            self.config.diagnostics.report(misuse, std::any::type_name::<T>());
        }
    }

    /// Forces `T` to resolve to `instance`, replacing whatever was registered.
    ///
    /// Works for both strong and lazy dependencies. A later [`provide`](Self::provide)
    /// for `T` never replaces the mock. Overwriting an existing mock or an already resolved
    /// real instance is reported according to the configured [`Diagnostics`],
    /// the overwrite happens in every mode.
    pub fn mock<T, Kind>(&self, instance: Arc<T>)
    where
        T: Dependency<Kind> + ?Sized
    {
        let previous = self.entries()
            .insert(TypeKey::of::<T>(), Entry::mock(instance));

        #[cfg(feature = "tracing")]
        tracing::debug!(dependency = std::any::type_name::<T>(), "mocked");

        let misuse = previous.and_then(|entry| match (entry.is_mock, entry.is_resolved()) {
            (true, _) => Some(Misuse::MockedTwice),
            (false, true) => Some(Misuse::MockedAfterResolve),
            (false, false) => None,
        });

        if let Some(misuse) = misuse {
            self.config.diagnostics.report(misuse, std::any::type_name::<T>());
        }
    }

    /// Resolves a strong dependency and returns a shared pointer.
    ///
    /// Fails with [`Error::NeverProvided`] if nothing was provided or mocked for `T`.
    #[inline]
    pub fn resolve_strong<T>(&self) -> Result<Arc<T>, Error>
    where
        T: StrongDependency + ?Sized
    {
        self.resolve_or_insert_with::<T>(|| None)
    }

    /// Resolves a lazy dependency and returns a shared pointer.
    ///
    /// If nothing was registered for `T`, it is built with [`Default`] and cached.
    ///
    /// While `T::default` runs, `T` is already [`contains`](Self::contains) but not yet
    /// [`is_resolved`](Self::is_resolved). A [`mock`](Self::mock) made in that window is
    /// not reported and is returned instead of the freshly built default.
    #[inline]
    pub fn resolve_lazy<T: LazyDependency>(&self) -> Result<Arc<T>, Error> {
        self.resolve_or_insert_with::<T>(|| Some(Entry::pending(|| Arc::new(T::default()))))
    }

    /// Returns `true` if anything has been provided, mocked or resolved for `T`
    #[inline]
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.entries().contains_key(&TypeKey::of::<T>())
    }

    /// Returns `true` if `T` holds an already built instance
    #[inline]
    pub fn is_resolved<T: ?Sized + 'static>(&self) -> bool {
        self.entries()
            .get(&TypeKey::of::<T>())
            .is_some_and(Entry::is_resolved)
    }

    /// Returns the number of registered dependencies
    #[inline]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns `true` if nothing has been registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Removes every registration.
    ///
    /// Intended for test suites that share a container between runs.
    pub fn reset(&self) {
        // dropped after the lock is released, instances may touch the container on drop
        let _previous = std::mem::take(&mut *self.entries());

        #[cfg(feature = "tracing")]
        tracing::debug!("container reset");
    }

    /// Locks the entries, recovering from poisoning.
    ///
    /// Builders never run under this lock, so the map is always consistent.
    #[inline]
    fn entries(&self) -> MutexGuard<'_, EntryMap> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve_or_insert_with<T>(&self, missing: impl FnOnce() -> Option<Entry>) -> Result<Arc<T>, Error>
    where
        T: ?Sized + Send + Sync + 'static
    {
        let cell = {
            let mut entries = self.entries();
            let entry = match entries.entry(TypeKey::of::<T>()) {
                hash_map::Entry::Occupied(occupied) => occupied.into_mut(),
                hash_map::Entry::Vacant(vacant) => match missing() {
                    Some(entry) => vacant.insert(entry),
                    None => return Err(Error::NeverProvided(std::any::type_name::<T>()))
                }
            };
            match &entry.registration {
                Registration::Resolved(instance) => return downcast::<T>(instance),
                Registration::Pending(cell) => cell.clone()
            }
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(dependency = std::any::type_name::<T>(), "building");

        let instance = downcast::<T>(cell.get_or_build())?;
        self.promote(&cell, instance)
    }

    /// Replaces the pending entry that owns `cell` with its resolved instance.
    ///
    /// If a mock replaced the entry while the builder was running, the mock wins.
    /// If the entry was reset or re-registered, the fresh instance is returned as is.
    fn promote<T>(&self, cell: &Arc<PendingCell>, instance: Arc<T>) -> Result<Arc<T>, Error>
    where
        T: ?Sized + Send + Sync + 'static
    {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(&TypeKey::of::<T>()) else {
            return Ok(instance);
        };
        let owned = matches!(
            &entry.registration,
            Registration::Pending(current) if Arc::ptr_eq(current, cell)
        );
        if owned {
            entry.registration = Registration::Resolved(Box::new(instance.clone()) as ErasedService);
            return Ok(instance);
        }
        match &entry.registration {
            Registration::Pending(_) => Ok(instance),
            Registration::Resolved(current) => downcast::<T>(current)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering}
    };
    use super::{Container, ContainerConfig, Diagnostics, Entry, Error, TypeKey};
    use crate::{LazyDependency, StrongDependency};

    trait Logger: Send + Sync {
        fn name(&self) -> &'static str;
    }

    struct ConsoleLogger;

    impl Logger for ConsoleLogger {
        fn name(&self) -> &'static str {
            "console"
        }
    }

    struct TestLogger;

    impl Logger for TestLogger {
        fn name(&self) -> &'static str {
            "test"
        }
    }

    impl StrongDependency for dyn Logger {}

    #[derive(Debug, Default, PartialEq)]
    struct Clock {
        now: u64
    }

    impl LazyDependency for Clock {}

    #[derive(Debug, PartialEq)]
    struct Database {
        url: String
    }

    impl StrongDependency for Database {}

    static SLOW_CLOCK_GATE: Mutex<()> = Mutex::new(());
    static SLOW_CLOCK_STARTED: AtomicBool = AtomicBool::new(false);

    /// Blocks in `default` until `SLOW_CLOCK_GATE` is released
    #[derive(Debug)]
    struct SlowClock {
        now: u64
    }

    impl Default for SlowClock {
        fn default() -> Self {
            SLOW_CLOCK_STARTED.store(true, Ordering::SeqCst);
            drop(SLOW_CLOCK_GATE.lock().unwrap_or_else(PoisonError::into_inner));
            Self { now: 0 }
        }
    }

    impl LazyDependency for SlowClock {}

    struct DropTracker {
        container: Container,
        dropped: Arc<AtomicBool>
    }

    impl Drop for DropTracker {
        fn drop(&mut self) {
            let _ = self.container.len();
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    impl StrongDependency for DropTracker {}

    fn quiet() -> Container {
        Container::with_config(ContainerConfig::new().with_diagnostics(Diagnostics::Ignore))
    }

    #[test]
    fn it_resolves_provided_dependency_once() {
        let container = Container::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        container.provide::<dyn Logger, _>(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(ConsoleLogger)
        });

        let first = container.resolve_strong::<dyn Logger>().unwrap();
        let second = container.resolve_strong::<dyn Logger>().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "console");
    }

    #[test]
    fn it_does_not_build_until_resolved() {
        let container = Container::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        container.provide(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(Database { url: "db://local".into() })
        });

        assert!(container.contains::<Database>());
        assert!(!container.is_resolved::<Database>());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        container.resolve_strong::<Database>().unwrap();

        assert!(container.is_resolved::<Database>());
    }

    #[test]
    fn it_returns_error_when_resolve_never_provided() {
        let container = Container::new();

        let result = container.resolve_strong::<Database>();

        assert_eq!(result.unwrap_err(), Error::NeverProvided(std::any::type_name::<Database>()));
        assert!(!container.contains::<Database>());
    }

    #[test]
    fn it_resolves_lazy_dependency_with_default() {
        let container = Container::new();

        let clock = container.resolve_lazy::<Clock>().unwrap();
        let again = container.resolve_lazy::<Clock>().unwrap();

        assert_eq!(*clock, Clock::default());
        assert!(Arc::ptr_eq(&clock, &again));
        assert!(container.is_resolved::<Clock>());
    }

    #[test]
    fn it_resolves_mock_instead_of_provided() {
        let container = Container::new();
        container.provide::<dyn Logger, _>(|| Arc::new(ConsoleLogger));

        let mock: Arc<dyn Logger> = Arc::new(TestLogger);
        container.mock(mock.clone());

        let logger = container.resolve_strong::<dyn Logger>().unwrap();

        assert!(Arc::ptr_eq(&logger, &mock));
        assert_eq!(logger.name(), "test");
    }

    #[test]
    fn it_keeps_mock_when_provided_later() {
        let container = Container::new();

        let mock: Arc<dyn Logger> = Arc::new(TestLogger);
        container.mock(mock.clone());
        container.provide::<dyn Logger, _>(|| Arc::new(ConsoleLogger));

        let logger = container.resolve_strong::<dyn Logger>().unwrap();

        assert!(Arc::ptr_eq(&logger, &mock));
    }

    #[test]
    fn it_resolves_mock_for_lazy_dependency() {
        let container = Container::new();

        let mock = Arc::new(Clock { now: 42 });
        container.mock(mock.clone());

        let clock = container.resolve_lazy::<Clock>().unwrap();

        assert!(Arc::ptr_eq(&clock, &mock));
        assert_eq!(clock.now, 42);
    }

    #[test]
    fn it_isolates_keys() {
        let container = Container::new();
        container.provide(|| Arc::new(Database { url: "db://local".into() }));
        container.mock(Arc::new(Clock { now: 1 }));

        let db = container.resolve_strong::<Database>().unwrap();

        assert_eq!(db.url, "db://local");
        assert!(!container.contains::<dyn Logger>());
        assert_eq!(container.resolve_lazy::<Clock>().unwrap().now, 1);
        assert_eq!(container.len(), 2);
    }

    #[test]
    fn it_returns_error_when_stored_instance_has_wrong_type() {
        let container = Container::new();
        container.entries().insert(
            TypeKey::of::<Database>(),
            Entry::mock(Arc::new(Clock::default()))
        );

        let result = container.resolve_strong::<Database>();

        assert_eq!(result.unwrap_err(), Error::WrongType(std::any::type_name::<Database>()));
    }

    #[test]
    fn it_returns_error_when_builder_has_wrong_type() {
        let container = Container::new();
        container.entries().insert(
            TypeKey::of::<Database>(),
            Entry::pending(|| Arc::new(Clock::default()))
        );

        let result = container.resolve_strong::<Database>();

        assert_eq!(result.unwrap_err(), Error::WrongType(std::any::type_name::<Database>()));
        assert!(!container.is_resolved::<Database>());
    }

    #[test]
    fn it_keeps_first_provided_builder() {
        let container = quiet();
        container.provide(|| Arc::new(Database { url: "first".into() }));
        container.provide(|| Arc::new(Database { url: "second".into() }));

        let db = container.resolve_strong::<Database>().unwrap();

        assert_eq!(db.url, "first");
    }

    #[test]
    fn it_overwrites_mock_in_ignore_mode() {
        let container = quiet();
        container.mock(Arc::new(Clock { now: 1 }));
        container.mock(Arc::new(Clock { now: 2 }));

        assert_eq!(container.resolve_lazy::<Clock>().unwrap().now, 2);
    }

    #[test]
    fn it_overwrites_resolved_instance_with_mock_in_ignore_mode() {
        let container = quiet();
        let real = container.resolve_lazy::<Clock>().unwrap();

        let mock = Arc::new(Clock { now: 7 });
        container.mock(mock.clone());

        let clock = container.resolve_lazy::<Clock>().unwrap();

        assert!(!Arc::ptr_eq(&clock, &real));
        assert!(Arc::ptr_eq(&clock, &mock));
    }

    #[test]
    #[should_panic(expected = "dependency has already been provided")]
    fn it_panics_when_provided_twice() {
        let container = Container::with_config(ContainerConfig::new().with_diagnostics(Diagnostics::Panic));
        container.provide(|| Arc::new(Database { url: "first".into() }));
        container.provide(|| Arc::new(Database { url: "second".into() }));
    }

    #[test]
    #[should_panic(expected = "dependency has been provided after it was resolved")]
    fn it_panics_when_provided_after_resolve() {
        let container = Container::with_config(ContainerConfig::new().with_diagnostics(Diagnostics::Panic));
        container.provide(|| Arc::new(Database { url: "first".into() }));
        container.resolve_strong::<Database>().unwrap();
        container.provide(|| Arc::new(Database { url: "second".into() }));
    }

    #[test]
    #[should_panic(expected = "an existing mock has been overwritten")]
    fn it_panics_when_mocked_twice() {
        let container = Container::with_config(ContainerConfig::new().with_diagnostics(Diagnostics::Panic));
        container.mock(Arc::new(Clock { now: 1 }));
        container.mock(Arc::new(Clock { now: 2 }));
    }

    #[test]
    #[should_panic(expected = "dependency has been mocked after it was resolved")]
    fn it_panics_when_mocked_after_resolve() {
        let container = Container::with_config(ContainerConfig::new().with_diagnostics(Diagnostics::Panic));
        container.resolve_lazy::<Clock>().unwrap();
        container.mock(Arc::new(Clock { now: 2 }));
    }

    #[test]
    fn it_applies_mock_before_panicking() {
        let container = Container::with_config(ContainerConfig::new().with_diagnostics(Diagnostics::Panic));
        container.mock(Arc::new(Clock { now: 1 }));

        let handle = container.clone();
        let result = std::panic::catch_unwind(move || handle.mock(Arc::new(Clock { now: 2 })));

        assert!(result.is_err());
        assert_eq!(container.resolve_lazy::<Clock>().unwrap().now, 2);
    }

    #[test]
    fn it_does_not_report_mock_over_pending_builder() {
        let container = Container::with_config(ContainerConfig::new().with_diagnostics(Diagnostics::Panic));
        container.provide::<dyn Logger, _>(|| Arc::new(ConsoleLogger));
        container.mock::<dyn Logger, _>(Arc::new(TestLogger));

        assert_eq!(container.resolve_strong::<dyn Logger>().unwrap().name(), "test");
    }

    #[test]
    fn it_resolves_inner_dependencies_from_builder() {
        let container = Container::new();
        let inner = container.clone();
        container.provide(move || {
            let clock = inner.resolve_lazy::<Clock>().unwrap();
            Arc::new(Database { url: format!("db://{}", clock.now) })
        });

        let db = container.resolve_strong::<Database>().unwrap();

        assert_eq!(db.url, "db://0");
        assert!(container.is_resolved::<Clock>());
    }

    #[test]
    fn it_shares_registrations_between_clones() {
        let container = Container::new();
        let clone = container.clone();

        clone.provide(|| Arc::new(Database { url: "db://shared".into() }));

        assert_eq!(container.resolve_strong::<Database>().unwrap().url, "db://shared");
    }

    #[test]
    fn it_resets_registrations() {
        let container = Container::new();
        container.provide(|| Arc::new(Database { url: "db://local".into() }));
        container.resolve_lazy::<Clock>().unwrap();

        container.reset();

        assert!(container.is_empty());
        assert!(container.resolve_strong::<Database>().is_err());
    }

    #[test]
    fn it_retries_builder_after_panic() {
        let container = Container::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        container.provide(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first build fails");
            }
            Arc::new(Database { url: "db://retry".into() })
        });

        let handle = container.clone();
        let result = std::panic::catch_unwind(move || handle.resolve_strong::<Database>());
        assert!(result.is_err());

        let db = container.resolve_strong::<Database>().unwrap();

        assert_eq!(db.url, "db://retry");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn it_lets_mock_win_over_lazy_default_in_progress() {
        let container = Container::with_config(ContainerConfig::new().with_diagnostics(Diagnostics::Panic));
        let gate = SLOW_CLOCK_GATE.lock().unwrap();

        let resolver = {
            let container = container.clone();
            std::thread::spawn(move || container.resolve_lazy::<SlowClock>().unwrap())
        };
        while !SLOW_CLOCK_STARTED.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }

        assert!(container.contains::<SlowClock>());
        assert!(!container.is_resolved::<SlowClock>());

        let mock = Arc::new(SlowClock { now: 9 });
        container.mock(mock.clone());
        drop(gate);

        let resolved = resolver.join().unwrap();

        assert!(Arc::ptr_eq(&resolved, &mock));
        assert_eq!(container.resolve_lazy::<SlowClock>().unwrap().now, 9);
    }

    #[test]
    fn it_debugs_registered_entries() {
        let container = Container::new();
        container.provide(|| Arc::new(Database { url: "db://local".into() }));
        container.mock(Arc::new(Clock::default()));

        let debug = format!("{container:?}");

        assert!(debug.contains(std::any::type_name::<Database>()));
        assert!(debug.contains("Pending"));
        assert!(debug.contains("is_mock: true"));
    }

    #[test]
    fn it_drops_instances_after_releasing_lock_on_reset() {
        let container = Container::new();
        let dropped = Arc::new(AtomicBool::new(false));
        container.mock(Arc::new(DropTracker {
            container: container.clone(),
            dropped: dropped.clone()
        }));

        container.reset();

        assert!(dropped.load(Ordering::SeqCst));
        assert!(container.is_empty());
    }
}
