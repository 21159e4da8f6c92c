//! The process-wide default container and its shortcut functions

use crate::{Container, Dependency, StrongDependency};
use std::sync::{Arc, OnceLock};

// Created on first access, lives for the rest of the process.
static GLOBAL_CONTAINER: OnceLock<Container> = OnceLock::new();

/// Returns the process-wide default container.
///
/// [`StrongInject::new`](crate::StrongInject::new) and
/// [`LazyInject::new`](crate::LazyInject::new) resolve from it.
/// Code that needs an isolated container should create its own with [`Container::new`].
#[inline]
pub fn global() -> &'static Container {
    GLOBAL_CONTAINER.get_or_init(Container::new)
}

/// Registers a builder for a strong dependency in the global container.
///
/// See [`Container::provide`].
#[inline]
pub fn provide<T, F>(builder: F)
where
    T: StrongDependency + ?Sized,
    F: Fn() -> Arc<T> + Send + Sync + 'static
{
    global().provide(builder);
}

/// Mocks a dependency in the global container.
///
/// See [`Container::mock`].
#[inline]
pub fn mock<T, Kind>(instance: Arc<T>)
where
    T: Dependency<Kind> + ?Sized
{
    global().mock(instance);
}

/// Removes every registration from the global container
#[inline]
pub fn reset() {
    global().reset();
}
