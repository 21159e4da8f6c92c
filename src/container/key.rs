//! Keys of the dependency map

use std::{
    any::TypeId,
    collections::HashMap,
    hash::{BuildHasherDefault, Hasher}
};

use super::entry::Entry;

/// Identifies a dependency contract by its [`TypeId`].
///
/// Keys are always derived from a type, never from an instance,
/// so `dyn Logger` and `ConsoleLogger` are two different keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TypeKey(TypeId);

impl TypeKey {
    #[inline]
    pub(crate) fn of<T: ?Sized + 'static>() -> Self {
        Self(TypeId::of::<T>())
    }
}

/// Inner HashMap of dependency entries
pub(crate) type EntryMap = HashMap<
    TypeKey,
    Entry,
    BuildHasherDefault<TypeIdHasher>
>;

#[derive(Default)]
pub(crate) struct TypeIdHasher(u64);

impl Hasher for TypeIdHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[cold]
    fn write(&mut self, _: &[u8]) {
        unreachable!("TypeId calls write_u64");
    }

    #[inline]
    fn write_u64(&mut self, id: u64) {
        self.0 = id;
    }
}
