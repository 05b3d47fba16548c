use core::any::Any;

use crate::info::Typed;

// -----------------------------------------------------------------------------
// Modules

mod default;
mod factory;

// -----------------------------------------------------------------------------
// Exports

pub use default::TypeTraitDefault;
pub use factory::TypeTraitFactory;

// -----------------------------------------------------------------------------
// TypeTrait

/// A per-type capability stored in a [`TypeMeta`]'s trait table.
///
/// Trait tables are the registry's open extension slot: anything a caller
/// wants to attach to a type (alternate factories, default construction,
/// custom hooks) travels as a `TypeTrait` object.
///
/// [`TypeMeta`]: crate::registry::TypeMeta
pub trait TypeTrait: Any + Send + Sync {
    /// Returns the trait object as [`&dyn Any`](Any).
    fn as_any(&self) -> &dyn Any;

    /// Returns the trait object as [`&mut dyn Any`](Any).
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn TypeTrait {
    /// Downcasts to a `&T`, or `None` if the types do not match.
    #[inline]
    pub fn downcast_ref<T: TypeTrait>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcasts to a `&mut T`, or `None` if the types do not match.
    #[inline]
    pub fn downcast_mut<T: TypeTrait>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl<T: Any + Send + Sync> TypeTrait for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// -----------------------------------------------------------------------------
// FromType

/// Trait used to generate a [`TypeTrait`] instance for a concrete type.
///
/// The `#[derive(Reflect)]` macro uses this to build the trait objects it
/// inserts into [`TypeMeta`](crate::registry::TypeMeta).
///
/// # Example
///
/// ```
/// # use trellis_reflect::registry::{FromType, TypeMeta, TypeTraitDefault};
/// let mut meta = TypeMeta::of::<String>();
/// meta.insert_trait::<TypeTraitDefault>(FromType::<String>::from_type());
/// ```
pub trait FromType<T: Typed> {
    fn from_type() -> Self;
}
