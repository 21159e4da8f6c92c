//! Kinds of dependencies the container can hold

/// Describes a shared dependency that must be provided upfront
/// with [`Container::provide`](crate::Container::provide) or
/// [`Container::mock`](crate::Container::mock) before it is resolved.
///
/// The contract may be a concrete type or a trait object,
/// which binds an interface to its implementation at registration time.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use hypospray::{Container, StrongDependency};
///
/// trait Logger: Send + Sync {
///     fn log(&self, message: &str) -> String;
/// }
///
/// struct ConsoleLogger;
///
/// impl Logger for ConsoleLogger {
///     fn log(&self, message: &str) -> String {
///         format!("[console] {message}")
///     }
/// }
///
/// impl StrongDependency for dyn Logger {}
///
/// let container = Container::new();
/// container.provide::<dyn Logger, _>(|| Arc::new(ConsoleLogger));
///
/// let logger = container.resolve_strong::<dyn Logger>().unwrap();
/// assert_eq!(logger.log("hi"), "[console] hi");
/// ```
pub trait StrongDependency: Send + Sync + 'static {}

/// Describes a shared dependency that builds itself with [`Default`]
/// the first time it is resolved, unless something was mocked for it.
pub trait LazyDependency: Default + Send + Sync + 'static {}

/// Kinds a [`Dependency`] can be registered as
pub mod kind {
    /// Marks a [`StrongDependency`](crate::StrongDependency)
    #[derive(Debug)]
    pub enum Strong {}

    /// Marks a [`LazyDependency`](crate::LazyDependency)
    #[derive(Debug)]
    pub enum Lazy {}
}

mod sealed {
    pub trait Sealed<Kind> {}
}

/// Any type the container may hold: a [`StrongDependency`] or a [`LazyDependency`].
///
/// Implemented automatically and cannot be implemented by hand.
/// A type that is both kinds needs its `Kind` spelled out when mocked,
/// e.g. `container.mock::<Both, kind::Strong>(..)`.
///
/// Only dependencies can be mocked:
/// ```compile_fail
/// use std::sync::Arc;
/// use hypospray::Container;
///
/// struct Plain;
///
/// Container::new().mock(Arc::new(Plain));
/// ```
pub trait Dependency<Kind>: sealed::Sealed<Kind> + Send + Sync + 'static {}

impl<T: StrongDependency + ?Sized> sealed::Sealed<kind::Strong> for T {}
impl<T: StrongDependency + ?Sized> Dependency<kind::Strong> for T {}

impl<T: LazyDependency> sealed::Sealed<kind::Lazy> for T {}
impl<T: LazyDependency> Dependency<kind::Lazy> for T {}

/// A `strong!` macro that implements [`StrongDependency`] for one or more types.
///
/// # Example
/// ```
/// use hypospray::strong;
///
/// trait Logger: Send + Sync {}
/// struct Database;
///
/// strong! {
///     Database,
///     dyn Logger
/// }
/// ```
#[macro_export]
macro_rules! strong {
    ($($ty:ty),* $(,)?) => {
        $(impl $crate::StrongDependency for $ty {})*
    };
}

/// A `lazy!` macro that implements [`LazyDependency`] for one or more [`Default`] types.
///
/// # Example
/// ```
/// use hypospray::lazy;
///
/// #[derive(Default)]
/// struct Clock;
///
/// lazy! { Clock }
/// ```
#[macro_export]
macro_rules! lazy {
    ($($ty:ty),* $(,)?) => {
        $(impl $crate::LazyDependency for $ty {})*
    };
}
