use core::any::{Any, TypeId};
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::TypeIdMap;
use crate::info::TypeInfo;

// -----------------------------------------------------------------------------
// NonGenericTypeInfoCell

/// Memoization cell for the [`TypeInfo`] of a single non-generic type.
///
/// # Examples
///
/// ```ignore
/// impl Typed for Foo {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
///         CELL.get_or_init(|| TypeInfo::Struct(StructInfo::new::<Self>(..)))
///     }
/// }
/// ```
pub struct NonGenericTypeInfoCell(OnceLock<TypeInfo>);

impl NonGenericTypeInfoCell {
    /// Creates an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored [`TypeInfo`], initializing it on first access.
    pub fn get_or_init(&'static self, f: impl FnOnce() -> TypeInfo) -> &'static TypeInfo {
        self.0.get_or_init(f)
    }
}

// -----------------------------------------------------------------------------
// GenericTypeInfoCell

/// Memoization cell for the [`TypeInfo`]s of one generic type.
///
/// One static cell serves every monomorphization; entries are leaked so the
/// references stay `'static` for the life of the process.
pub struct GenericTypeInfoCell(OnceLock<RwLock<TypeIdMap<&'static TypeInfo>>>);

impl GenericTypeInfoCell {
    /// Creates an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the [`TypeInfo`] for `T`, initializing it on first access.
    pub fn get_or_insert<T: Any>(&self, f: impl FnOnce() -> TypeInfo) -> &'static TypeInfo {
        let mapping = self.0.get_or_init(Default::default);
        let key = TypeId::of::<T>();

        if let Some(info) = mapping
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return info;
        }

        let mut mapping = mapping.write().unwrap_or_else(PoisonError::into_inner);
        // A racing writer may have filled the entry between the guards.
        *mapping.entry(key).or_insert_with(|| Box::leak(Box::new(f())))
    }
}

// -----------------------------------------------------------------------------
// GenericTypePathCell

/// Memoization cell for the composed [type path] of one generic type.
///
/// [type path]: crate::info::TypePath::type_path
pub struct GenericTypePathCell(OnceLock<RwLock<TypeIdMap<&'static str>>>);

impl GenericTypePathCell {
    /// Creates an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the path string for `T`, building it on first access.
    pub fn get_or_insert<T: Any>(&self, f: impl FnOnce() -> String) -> &'static str {
        let mapping = self.0.get_or_init(Default::default);
        let key = TypeId::of::<T>();

        if let Some(path) = mapping
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return path;
        }

        let mut mapping = mapping.write().unwrap_or_else(PoisonError::into_inner);
        *mapping
            .entry(key)
            .or_insert_with(|| Box::leak(f().into_boxed_str()))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::GenericTypePathCell;

    #[test]
    fn path_cell_builds_once() {
        static CELL: GenericTypePathCell = GenericTypePathCell::new();
        let first = CELL.get_or_insert::<Vec<u8>>(|| "demo::Vec<u8>".to_string());
        let second = CELL.get_or_insert::<Vec<u8>>(|| unreachable!());
        assert_eq!(first, "demo::Vec<u8>");
        assert!(core::ptr::eq(first, second));
    }
}
