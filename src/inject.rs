//! Injection sites that resolve a dependency once, when the consuming object is constructed

use crate::{
    Container,
    LazyDependency,
    StrongDependency,
    error::Error,
    global
};
use std::{
    fmt::{Debug, Formatter},
    ops::Deref,
    sync::Arc
};

/// Holds a resolved [`StrongDependency`].
///
/// Resolves `T` at construction time and exposes it read-only afterwards.
/// Construction panics if `T` was never provided, use
/// [`try_from_container`](Self::try_from_container) for a recoverable path.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use hypospray::{Container, StrongInject, strong};
///
/// struct Database {
///     url: &'static str
/// }
///
/// strong! { Database }
///
/// struct UserRepository {
///     db: StrongInject<Database>
/// }
///
/// impl UserRepository {
///     fn new(container: &Container) -> Self {
///         Self { db: StrongInject::from_container(container) }
///     }
/// }
///
/// let container = Container::new();
/// container.provide(|| Arc::new(Database { url: "db://local" }));
///
/// let repo = UserRepository::new(&container);
/// assert_eq!(repo.db.url, "db://local");
/// ```
pub struct StrongInject<T: StrongDependency + ?Sized>(Arc<T>);

/// Holds a resolved [`LazyDependency`].
///
/// Resolves `T` at construction time, building it with [`Default`]
/// if nothing was registered, and exposes it read-only afterwards.
pub struct LazyInject<T: LazyDependency>(Arc<T>);

#[allow(clippy::new_without_default)]
impl<T: StrongDependency + ?Sized> StrongInject<T> {
    /// Resolves `T` from the global container.
    ///
    /// # Panics
    /// If `T` was never provided or mocked.
    #[inline]
    #[track_caller]
    pub fn new() -> Self {
        Self::from_container(global())
    }

    /// Resolves `T` from `container`.
    ///
    /// # Panics
    /// If `T` was never provided or mocked.
    #[inline]
    #[track_caller]
    pub fn from_container(container: &Container) -> Self {
        Self::try_from_container(container)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Resolves `T` from `container` and returns an error instead of panicking
    #[inline]
    pub fn try_from_container(container: &Container) -> Result<Self, Error> {
        container
            .resolve_strong::<T>()
            .map(Self)
    }

    /// Returns a reference to the inner [`Arc`]
    #[inline]
    pub fn shared(&self) -> &Arc<T> {
        &self.0
    }

    /// Unwraps the inner [`Arc`]
    #[inline]
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T: LazyDependency> LazyInject<T> {
    /// Resolves `T` from the global container
    #[inline]
    #[track_caller]
    pub fn new() -> Self {
        Self::from_container(global())
    }

    /// Resolves `T` from `container`.
    ///
    /// # Panics
    /// If the instance registered for `T` has an unexpected type.
    #[inline]
    #[track_caller]
    pub fn from_container(container: &Container) -> Self {
        Self::try_from_container(container)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Resolves `T` from `container` and returns an error instead of panicking
    #[inline]
    pub fn try_from_container(container: &Container) -> Result<Self, Error> {
        container
            .resolve_lazy::<T>()
            .map(Self)
    }

    /// Returns a reference to the inner [`Arc`]
    #[inline]
    pub fn shared(&self) -> &Arc<T> {
        &self.0
    }

    /// Unwraps the inner [`Arc`]
    #[inline]
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T: LazyDependency> Default for LazyInject<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StrongDependency + ?Sized> Deref for StrongInject<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: LazyDependency> Deref for LazyInject<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: StrongDependency + ?Sized> Clone for StrongInject<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: LazyDependency> Clone for LazyInject<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: StrongDependency + ?Sized> Debug for StrongInject<T> {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StrongInject")
            .field(&std::any::type_name::<T>())
            .finish()
    }
}

impl<T: LazyDependency> Debug for LazyInject<T> {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LazyInject")
            .field(&std::any::type_name::<T>())
            .finish()
    }
}
