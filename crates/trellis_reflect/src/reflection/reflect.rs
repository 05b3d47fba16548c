use core::any::{Any, TypeId};

use crate::info::{DynamicTypePath, DynamicTyped, ReflectKind};
use crate::ops::{ReflectMut, ReflectRef};

// -----------------------------------------------------------------------------
// Reflect

/// The dynamic value trait: every type traveling through the engine
/// implements it, usually via [`#[derive(Reflect)]`](crate::derive::Reflect).
///
/// A `dyn Reflect` knows its runtime type ([`DynamicTyped`]), its stable
/// naming ([`DynamicTypePath`]), and can hand out kind-specific access
/// through [`reflect_ref`]/[`reflect_mut`].
///
/// Unlike most reflection systems, `Reflect` deliberately does **not**
/// require `Send + Sync`: object graphs may contain
/// [`Shared`](crate::Shared) identity handles (`Rc`-based), and every
/// serialize/deserialize call is single-threaded anyway.
///
/// # Examples
///
/// ```
/// use trellis_reflect::{derive::Reflect, Reflect};
/// use trellis_reflect::info::DynamicTypePath;
///
/// #[derive(Reflect)]
/// struct A { value: u64 }
///
/// let a: Box<dyn Reflect> = Box::new(A { value: 1 });
/// assert!(a.is::<A>());
/// assert_eq!(a.reflect_type_ident(), "A");
/// ```
///
/// [`reflect_ref`]: Reflect::reflect_ref
/// [`reflect_mut`]: Reflect::reflect_mut
pub trait Reflect: DynamicTypePath + DynamicTyped + Any {
    /// Returns the value as a [`&dyn Any`](core::any::Any).
    fn as_any(&self) -> &dyn Any;

    /// Returns the value as a [`&mut dyn Any`](core::any::Any).
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the boxed value as a [`Box<dyn Any>`](core::any::Any).
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Upcasts to a [`&dyn Reflect`](Reflect).
    fn as_reflect(&self) -> &dyn Reflect;

    /// Upcasts to a [`&mut dyn Reflect`](Reflect).
    fn as_reflect_mut(&mut self) -> &mut dyn Reflect;

    /// Upcasts the boxed value to a [`Box<dyn Reflect>`](Reflect).
    fn into_reflect(self: Box<Self>) -> Box<dyn Reflect>;

    /// Returns the [`ReflectKind`] of this value.
    #[inline]
    fn reflect_kind(&self) -> ReflectKind {
        self.reflect_ref().kind()
    }

    /// Returns kind-specific read access to this value.
    fn reflect_ref(&self) -> ReflectRef<'_>;

    /// Returns kind-specific write access to this value.
    fn reflect_mut(&mut self) -> ReflectMut<'_>;
}

// -----------------------------------------------------------------------------
// dyn Reflect helpers

impl dyn Reflect {
    /// Whether the underlying value is a `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().type_id() == TypeId::of::<T>()
    }

    /// Downcasts to a `&T`, or `None` if the types do not match.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcasts to a `&mut T`, or `None` if the types do not match.
    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Downcasts the box to a `Box<T>`, returning it unchanged on mismatch.
    pub fn downcast<T: Any>(self: Box<dyn Reflect>) -> Result<Box<T>, Box<dyn Reflect>> {
        if self.is::<T>() {
            // The check above guarantees the downcast succeeds.
            Ok(self.into_any().downcast::<T>().unwrap())
        } else {
            Err(self)
        }
    }

    /// Takes the concrete value out of the box, returning the box unchanged
    /// on mismatch.
    pub fn take<T: Any>(self: Box<dyn Reflect>) -> Result<T, Box<dyn Reflect>> {
        self.downcast::<T>().map(|boxed| *boxed)
    }
}

impl core::fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "dyn Reflect({})", self.reflect_type_path())
    }
}
