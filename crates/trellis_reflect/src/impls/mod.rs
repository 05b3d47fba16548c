//! Reflection implementations for built-in types.
//!
//! Leaf codecs for scalars, the container impls (`Vec`, maps, `Option`),
//! and the two wrapper types this crate adds to the language's vocabulary:
//! [`Shared`] identity handles and [`DynValue`] polymorphic slots.

// -----------------------------------------------------------------------------
// Modules

mod cells;
mod containers;
mod dynamic;
mod external;
mod scalars;
mod shared;

// -----------------------------------------------------------------------------
// Exports

pub use cells::{GenericTypeInfoCell, GenericTypePathCell, NonGenericTypeInfoCell};
pub use dynamic::DynValue;
pub use shared::Shared;

// -----------------------------------------------------------------------------
// Shared impl macros

/// Implements [`TypePath`](crate::info::TypePath) for a primitive whose
/// path is its bare identifier.
macro_rules! impl_type_path_primitive {
    ($ty:ty) => {
        impl crate::info::TypePath for $ty {
            #[inline]
            fn type_path() -> &'static str {
                stringify!($ty)
            }

            #[inline]
            fn type_name() -> &'static str {
                stringify!($ty)
            }

            #[inline]
            fn type_ident() -> &'static str {
                stringify!($ty)
            }
        }
    };
}

/// Implements [`TypePath`](crate::info::TypePath) for a foreign type with
/// a pinned module path.
macro_rules! impl_type_path_named {
    ($ty:ty, $module:literal, $ident:literal) => {
        impl crate::info::TypePath for $ty {
            #[inline]
            fn type_path() -> &'static str {
                concat!($module, "::", $ident)
            }

            #[inline]
            fn type_name() -> &'static str {
                $ident
            }

            #[inline]
            fn type_ident() -> &'static str {
                $ident
            }

            #[inline]
            fn module_path() -> Option<&'static str> {
                Some($module)
            }
        }
    };
}

/// Implements [`Reflect`](crate::Reflect) for a leaf type.
macro_rules! impl_reflect_leaf {
    ($ty:ty) => {
        impl crate::Reflect for $ty {
            #[inline]
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            #[inline]
            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            #[inline]
            fn into_any(self: Box<Self>) -> Box<dyn ::core::any::Any> {
                self
            }

            #[inline]
            fn as_reflect(&self) -> &dyn crate::Reflect {
                self
            }

            #[inline]
            fn as_reflect_mut(&mut self) -> &mut dyn crate::Reflect {
                self
            }

            #[inline]
            fn into_reflect(self: Box<Self>) -> Box<dyn crate::Reflect> {
                self
            }

            #[inline]
            fn reflect_ref(&self) -> crate::ops::ReflectRef<'_> {
                crate::ops::ReflectRef::Leaf(self)
            }

            #[inline]
            fn reflect_mut(&mut self) -> crate::ops::ReflectMut<'_> {
                crate::ops::ReflectMut::Leaf(self)
            }
        }
    };
}

/// Implements [`GetTypeMeta`](crate::registry::GetTypeMeta) for a leaf
/// type with [`Default`] support.
macro_rules! impl_get_type_meta_leaf {
    ($ty:ty) => {
        impl crate::registry::GetTypeMeta for $ty {
            fn get_type_meta() -> crate::registry::TypeMeta {
                let mut meta = crate::registry::TypeMeta::of::<Self>();
                meta.insert_trait::<crate::registry::TypeTraitDefault>(
                    crate::registry::FromType::<Self>::from_type(),
                );
                meta
            }
        }
    };
}

pub(crate) use impl_get_type_meta_leaf;
pub(crate) use impl_reflect_leaf;
pub(crate) use impl_type_path_named;
pub(crate) use impl_type_path_primitive;
