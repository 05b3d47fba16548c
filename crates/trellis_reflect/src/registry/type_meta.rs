use core::any::TypeId;
use core::ops::{Deref, DerefMut};

use crate::TypeIdMap;
use crate::info::{Type, TypeInfo, Typed};
use crate::registry::{TypeRegistry, TypeTrait};

// -----------------------------------------------------------------------------
// TypeMeta

/// Runtime storage for type metadata, registered into the [`TypeRegistry`].
///
/// This includes the [`TypeInfo`] and an open [`TypeTrait`] table.
///
/// An instance can be created with [`TypeMeta::of`], but is usually
/// generated through [`#[derive(Reflect)]`](crate::derive::Reflect), which
/// implements [`GetTypeMeta`].
///
/// # Example
///
/// ```
/// use trellis_reflect::registry::{FromType, TypeMeta, TypeTraitDefault};
///
/// let mut meta = TypeMeta::of::<String>();
/// meta.insert_trait::<TypeTraitDefault>(FromType::<String>::from_type());
///
/// let make = meta.get_trait::<TypeTraitDefault>().unwrap();
/// assert_eq!(make.default().take::<String>().unwrap(), "");
/// ```
pub struct TypeMeta {
    // `Type` is reachable through `TypeInfo`, but nearly every lookup wants
    // it; cache the reference.
    ty: &'static Type,
    type_info: &'static TypeInfo,
    trait_table: TypeIdMap<Box<dyn TypeTrait>>,
}

impl TypeMeta {
    /// Create an empty [`TypeMeta`] for a type.
    #[inline]
    pub fn of<T: Typed>() -> Self {
        let type_info = T::type_info();
        Self {
            ty: type_info.ty(),
            type_info,
            trait_table: TypeIdMap::default(),
        }
    }

    /// Returns the [`TypeInfo`].
    #[inline]
    pub const fn type_info(&self) -> &'static TypeInfo {
        self.type_info
    }

    /// Returns the [`Type`] identity.
    #[inline]
    pub const fn ty(&self) -> &'static Type {
        self.ty
    }

    /// Returns the described type's [`TypeId`].
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.ty.id()
    }

    /// Insert a [`TypeTrait`], replacing any previous instance of `T`.
    #[inline]
    pub fn insert_trait<T: TypeTrait>(&mut self, data: T) {
        self.trait_table.insert(TypeId::of::<T>(), Box::new(data));
    }

    /// Removes a [`TypeTrait`] from the meta.
    pub fn remove_trait<T: TypeTrait>(&mut self) -> Option<Box<dyn TypeTrait>> {
        self.trait_table.remove(&TypeId::of::<T>())
    }

    /// Get a [`TypeTrait`] reference, or `None` if it does not exist.
    #[inline]
    pub fn get_trait<T: TypeTrait>(&self) -> Option<&T> {
        self.get_trait_by_id(TypeId::of::<T>())
            .and_then(<dyn TypeTrait>::downcast_ref)
    }

    /// Get a [`TypeTrait`] reference by its [`TypeId`].
    pub fn get_trait_by_id(&self, type_id: TypeId) -> Option<&dyn TypeTrait> {
        self.trait_table.get(&type_id).map(Deref::deref)
    }

    /// Get a mutable [`TypeTrait`] reference, or `None` if it does not exist.
    #[inline]
    pub fn get_trait_mut<T: TypeTrait>(&mut self) -> Option<&mut T> {
        self.trait_table
            .get_mut(&TypeId::of::<T>())
            .map(DerefMut::deref_mut)
            .and_then(<dyn TypeTrait>::downcast_mut)
    }

    /// Whether the given [`TypeTrait`] is present.
    #[inline]
    pub fn has_trait<T: TypeTrait>(&self) -> bool {
        self.trait_table.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered [`TypeTrait`]s.
    #[inline]
    pub fn trait_len(&self) -> usize {
        self.trait_table.len()
    }
}

impl core::fmt::Debug for TypeMeta {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeMeta")
            .field("type_info", &self.type_info)
            .field("trait_len", &self.trait_len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// GetTypeMeta

/// A trait which allows a type to generate its [`TypeMeta`] for
/// registration into the [`TypeRegistry`].
///
/// Automatically implemented by
/// [`#[derive(Reflect)]`](crate::derive::Reflect).
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `GetTypeMeta` so cannot provide type registration information",
    note = "consider annotating `{Self}` with `#[derive(Reflect)]`"
)]
pub trait GetTypeMeta: Typed {
    /// Returns the default [`TypeMeta`] for this type.
    fn get_type_meta() -> TypeMeta;

    /// Registers other types needed by this type.
    ///
    /// May skip registering the type itself.
    fn register_dependencies(_registry: &mut TypeRegistry) {}
}
