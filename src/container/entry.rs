//! Registration state of a single dependency

use crate::error::Error;
use std::{
    any::Any,
    fmt::{Debug, Formatter},
    sync::{Arc, OnceLock}
};

/// A type-erased `Arc<T>`.
///
/// The `Arc` is boxed rather than coerced to `Arc<dyn Any>`
/// so that `T` may itself be unsized (e.g. `dyn Logger`).
pub(crate) type ErasedService = Box<
    dyn Any
    + Send
    + Sync
>;

type BuilderFn = Box<
    dyn Fn() -> ErasedService
    + Send
    + Sync
>;

/// A deferred builder together with the slot its single result is written to.
///
/// Shared between the map and in-flight resolvers so the builder
/// can run without holding the map lock.
pub(crate) struct PendingCell {
    builder: BuilderFn,
    value: OnceLock<ErasedService>
}

impl PendingCell {
    #[inline]
    pub(crate) fn new<T, F>(builder: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static
    {
        Self {
            builder: Box::new(move || Box::new(builder()) as ErasedService),
            value: OnceLock::new()
        }
    }

    /// Runs the builder on first call, returns the cached result afterwards.
    ///
    /// Concurrent callers block until the first one finishes.
    #[inline]
    pub(crate) fn get_or_build(&self) -> &ErasedService {
        self.value.get_or_init(|| (self.builder)())
    }
}

pub(crate) enum Registration {
    Pending(Arc<PendingCell>),
    Resolved(ErasedService),
}

/// The container's record for one dependency key
pub(crate) struct Entry {
    pub(crate) is_mock: bool,
    pub(crate) type_name: &'static str,
    pub(crate) registration: Registration
}

impl Debug for Entry {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = match self.registration {
            Registration::Pending(_) => "Pending",
            Registration::Resolved(_) => "Resolved",
        };
        f.debug_struct("Entry")
            .field("type_name", &self.type_name)
            .field("is_mock", &self.is_mock)
            .field("registration", &state)
            .finish()
    }
}

impl Entry {
    #[inline]
    pub(crate) fn pending<T, F>(builder: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static
    {
        Self {
            is_mock: false,
            type_name: std::any::type_name::<T>(),
            registration: Registration::Pending(Arc::new(PendingCell::new(builder)))
        }
    }

    #[inline]
    pub(crate) fn mock<T>(instance: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static
    {
        Self {
            is_mock: true,
            type_name: std::any::type_name::<T>(),
            registration: Registration::Resolved(Box::new(instance))
        }
    }

    #[inline]
    pub(crate) fn is_resolved(&self) -> bool {
        matches!(self.registration, Registration::Resolved(_))
    }
}

/// Recovers a typed `Arc<T>` from an erased service.
#[inline]
pub(crate) fn downcast<T>(instance: &ErasedService) -> Result<Arc<T>, Error>
where
    T: ?Sized + Send + Sync + 'static
{
    instance
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or(Error::WrongType(std::any::type_name::<T>()))
}
