use core::any::TypeId;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hashbrown::{HashMap, HashSet};

use crate::TypeIdMap;
use crate::info::{TypeInfo, Typed};
use crate::registry::{FromType, GetTypeMeta, TypeMeta, TypeTrait};

// -----------------------------------------------------------------------------
// TypeRegistry

/// A registry of reflected types.
///
/// The central store of type information. [Registering] a type generates a
/// [`TypeMeta`] entry from its [`GetTypeMeta`] implementation (derived by
/// [`#[derive(Reflect)]`](crate::derive::Reflect)), and indexes the type by
/// full path and short name. Wire discriminators resolve through these
/// indices during deserialization.
///
/// # Example
///
/// ```
/// use trellis_reflect::registry::{TypeRegistry, TypeTraitDefault};
///
/// let registry = TypeRegistry::new();
///
/// let make = registry
///     .get_with_type_name("String").unwrap()
///     .get_trait::<TypeTraitDefault>().unwrap();
///
/// let s = make.default().take::<String>().unwrap();
/// assert_eq!(s, "");
/// ```
///
/// [registering]: TypeRegistry::register
pub struct TypeRegistry {
    type_meta_table: TypeIdMap<TypeMeta>,
    type_path_to_id: HashMap<&'static str, TypeId>,
    type_name_to_id: HashMap<&'static str, TypeId>,
    ambiguous_names: HashSet<&'static str>,
}

impl Default for TypeRegistry {
    /// See [`TypeRegistry::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create an empty [`TypeRegistry`].
    pub fn empty() -> Self {
        Self {
            type_meta_table: TypeIdMap::default(),
            type_path_to_id: HashMap::new(),
            type_name_to_id: HashMap::new(),
            ambiguous_names: HashSet::new(),
        }
    }

    /// Create a type registry with default registrations for leaf types.
    ///
    /// - `bool` `char` `String`
    /// - `i8 - i128` `isize`, `u8 - u128` `usize`
    /// - `f32` `f64`
    /// - `jiff::Timestamp` `jiff::SignedDuration`
    /// - `uuid::Uuid` `rust_decimal::Decimal`
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<bool>();
        registry.register::<char>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<u128>();
        registry.register::<usize>();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<i128>();
        registry.register::<isize>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<String>();
        registry.register::<jiff::Timestamp>();
        registry.register::<jiff::SignedDuration>();
        registry.register::<uuid::Uuid>();
        registry.register::<rust_decimal::Decimal>();
        registry
    }

    // The type must **not** already exist in the indices.
    fn add_new_type_indices(
        type_meta: &TypeMeta,
        type_path_to_id: &mut HashMap<&'static str, TypeId>,
        type_name_to_id: &mut HashMap<&'static str, TypeId>,
        ambiguous_names: &mut HashSet<&'static str>,
    ) {
        let ty = type_meta.ty();
        let type_name = ty.name();

        // A short name shared by two types resolves to neither.
        if !ambiguous_names.contains(type_name) {
            if type_name_to_id.contains_key(type_name) {
                type_name_to_id.remove(type_name);
                ambiguous_names.insert(type_name);
            } else {
                type_name_to_id.insert(type_name, ty.id());
            }
        }

        type_path_to_id.insert(ty.path(), ty.id());
    }

    fn register_internal(
        &mut self,
        type_id: TypeId,
        get_type_meta: impl FnOnce() -> TypeMeta,
    ) -> bool {
        if self.type_meta_table.contains_key(&type_id) {
            return false;
        }
        let meta = get_type_meta();
        Self::add_new_type_indices(
            &meta,
            &mut self.type_path_to_id,
            &mut self.type_name_to_id,
            &mut self.ambiguous_names,
        );
        self.type_meta_table.insert(type_id, meta);
        true
    }

    /// Attempts to register the type `T` if it has not been registered yet.
    ///
    /// This also recursively registers type dependencies as specified by
    /// [`GetTypeMeta::register_dependencies`]; for a derived struct,
    /// generally all of its field types.
    ///
    /// # Example
    ///
    /// ```
    /// # use core::any::TypeId;
    /// # use trellis_reflect::{derive::Reflect, registry::TypeRegistry};
    /// #[derive(Reflect)]
    /// struct Foo {
    ///   name: Option<String>,
    ///   value: i32,
    /// }
    ///
    /// let mut registry = TypeRegistry::empty();
    /// registry.register::<Foo>();
    ///
    /// // The main type and its dependencies.
    /// assert!(registry.contains(TypeId::of::<Foo>()));
    /// assert!(registry.contains(TypeId::of::<Option<String>>()));
    /// assert!(registry.contains(TypeId::of::<i32>()));
    /// ```
    pub fn register<T: GetTypeMeta>(&mut self) {
        if self.register_internal(TypeId::of::<T>(), T::get_type_meta) {
            T::register_dependencies(self);
        }
    }

    /// Inserts a prebuilt [`TypeMeta`], overwriting any existing entry.
    ///
    /// Does not register dependencies; use [`register`](Self::register) for
    /// that.
    pub fn insert_type_meta(&mut self, type_meta: TypeMeta) {
        if !self.type_meta_table.contains_key(&type_meta.type_id()) {
            Self::add_new_type_indices(
                &type_meta,
                &mut self.type_path_to_id,
                &mut self.type_name_to_id,
                &mut self.ambiguous_names,
            );
        }
        self.type_meta_table.insert(type_meta.type_id(), type_meta);
    }

    /// Registers every type annotated with `#[reflect(auto_register)]`.
    ///
    /// Equivalent to calling [`register`](Self::register) for each
    /// qualifying type; repeated calls are cheap. Does nothing when the
    /// `auto_register` feature is disabled.
    pub fn auto_register(&mut self) {
        #[cfg(feature = "auto_register")]
        crate::__macro_exports::auto_register::register_all(self);
    }

    /// Registers the type trait `D` for the already-registered type `T`.
    ///
    /// Useful for traits the derive did not request, or for generic types
    /// whose trait impls depend on the concrete parameters.
    ///
    /// # Panics
    ///
    /// Panics if `T` itself is not registered.
    pub fn register_type_trait<T: Typed, D: TypeTrait + FromType<T>>(&mut self) {
        match self.type_meta_table.get_mut(&TypeId::of::<T>()) {
            Some(type_meta) => type_meta.insert_trait(D::from_type()),
            None => panic!(
                "called `TypeRegistry::register_type_trait` for unregistered type `{}`",
                T::type_path(),
            ),
        }
    }

    /// Whether the type with the given [`TypeId`] has been registered.
    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.type_meta_table.contains_key(&type_id)
    }

    /// Returns the [`TypeMeta`] of the type with the given [`TypeId`].
    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&TypeMeta> {
        self.type_meta_table.get(&type_id)
    }

    /// Returns the mutable [`TypeMeta`] of the type with the given
    /// [`TypeId`].
    #[inline]
    pub fn get_mut(&mut self, type_id: TypeId) -> Option<&mut TypeMeta> {
        self.type_meta_table.get_mut(&type_id)
    }

    /// Returns the [`TypeMeta`] of the type with the given [type path].
    ///
    /// [type path]: crate::info::TypePath::type_path
    pub fn get_with_type_path(&self, type_path: &str) -> Option<&TypeMeta> {
        match self.type_path_to_id.get(type_path) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    /// Returns the [`TypeMeta`] of the type with the given [type name].
    ///
    /// Returns `None` if the name is ambiguous or unregistered.
    ///
    /// [type name]: crate::info::TypePath::type_name
    pub fn get_with_type_name(&self, type_name: &str) -> Option<&TypeMeta> {
        match self.type_name_to_id.get(type_name) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    /// Whether the given [type name] matches multiple registered types.
    ///
    /// [type name]: crate::info::TypePath::type_name
    pub fn is_ambiguous(&self, type_name: &str) -> bool {
        self.ambiguous_names.contains(type_name)
    }

    /// Returns the [`TypeTrait`] of type `T` for the given [`TypeId`].
    pub fn get_type_trait<T: TypeTrait>(&self, type_id: TypeId) -> Option<&T> {
        match self.get(type_id) {
            Some(type_meta) => type_meta.get_trait::<T>(),
            None => None,
        }
    }

    /// Returns the [`TypeInfo`] for the given [`TypeId`].
    pub fn get_type_info(&self, type_id: TypeId) -> Option<&'static TypeInfo> {
        self.get(type_id).map(TypeMeta::type_info)
    }

    /// Returns an iterator over the registered [`TypeMeta`]s.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypeMeta> {
        self.type_meta_table.values()
    }
}

// -----------------------------------------------------------------------------
// TypeRegistryArc

/// A [`TypeRegistry`] shared between engines and threads.
#[derive(Clone, Default)]
pub struct TypeRegistryArc {
    /// The wrapped [`TypeRegistry`].
    pub internal: Arc<RwLock<TypeRegistry>>,
}

impl TypeRegistryArc {
    /// Takes a read lock on the underlying [`TypeRegistry`].
    pub fn read(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        self.internal.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the underlying [`TypeRegistry`].
    pub fn write(&self) -> RwLockWriteGuard<'_, TypeRegistry> {
        self.internal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl core::fmt::Debug for TypeRegistryArc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.read().type_path_to_id.keys().fmt(f)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::TypeRegistry;
    use core::any::TypeId;

    #[test]
    fn default_leaves_are_registered() {
        let registry = TypeRegistry::new();
        assert!(registry.contains(TypeId::of::<i32>()));
        assert!(registry.contains(TypeId::of::<String>()));
        assert!(registry.get_with_type_name("String").is_some());
    }

    #[test]
    fn path_lookup() {
        let registry = TypeRegistry::new();
        let meta = registry.get_with_type_path("std::string::String").unwrap();
        assert_eq!(meta.type_id(), TypeId::of::<String>());
    }

    #[cfg(feature = "auto_register")]
    mod auto {
        use super::TypeRegistry;
        use crate::derive::Reflect;

        #[derive(Reflect)]
        #[reflect(type_path = "auto::Probe", auto_register)]
        struct Probe {
            value: u32,
        }

        #[test]
        fn annotated_types_are_collected() {
            let mut registry = TypeRegistry::empty();
            registry.auto_register();
            let meta = registry.get_with_type_path("auto::Probe").unwrap();
            assert_eq!(meta.type_id(), core::any::TypeId::of::<Probe>());
        }
    }
}
