use core::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::Reflect;
use crate::impls::{GenericTypeInfoCell, GenericTypePathCell};
use crate::info::{DynamicTypePath, SharedInfo, TypeInfo, TypePath, Typed};
use crate::ops::{ReflectMut, ReflectRef, ReflectShared, SlotError};
use crate::registry::{GetTypeMeta, TypeMeta, TypeRegistry};

// -----------------------------------------------------------------------------
// Shared

/// A reflected identity handle: the unit of object identity in a graph.
///
/// `Shared<T>` wraps `Rc<RefCell<T>>`. Cloning a handle aliases the same
/// value; two fields holding clones of one handle serialize as one full
/// body plus one reference node when preservation is enabled, and
/// deserialize back to handles of one allocation.
///
/// Cyclic graphs are expressed the usual Rust way: an `Option<Shared<T>>`
/// (or a collection of handles) somewhere in the cycle.
///
/// # Examples
///
/// ```
/// use trellis_reflect::{derive::Reflect, Shared};
///
/// #[derive(Reflect)]
/// struct Node {
///     label: String,
/// }
///
/// let a = Shared::new(Node { label: "a".into() });
/// let b = a.clone();
///
/// b.borrow_mut().label = "renamed".into();
/// assert_eq!(a.borrow().label, "renamed");
/// assert!(Shared::ptr_eq(&a, &b));
/// ```
pub struct Shared<T: Reflect + Typed>(Rc<RefCell<T>>);

impl<T: Reflect + Typed> Shared<T> {
    /// Wraps a value into a fresh, unaliased handle.
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Borrows the referenced value.
    ///
    /// Panics if a mutable borrow is active.
    #[inline]
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrows the referenced value.
    ///
    /// Panics if any borrow is active.
    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Whether two handles alias the same allocation.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl<T: Reflect + Typed> Clone for Shared<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Reflect + Typed + Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Reflect + Typed + core::fmt::Debug> core::fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Does not guard against cycles; debug-print acyclic graphs only.
        write!(f, "Shared(")?;
        self.0.borrow().fmt(f)?;
        write!(f, ")")
    }
}

impl<T: Reflect + Typed + PartialEq> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        // Alias check first, so self-comparison never borrows twice.
        Self::ptr_eq(self, other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl<T: Reflect + Typed> TypePath for Shared<T> {
    fn type_path() -> &'static str {
        static CELL: GenericTypePathCell = GenericTypePathCell::new();
        CELL.get_or_insert::<Self>(|| format!("trellis_reflect::Shared<{}>", T::type_path()))
    }

    fn type_name() -> &'static str {
        static CELL: GenericTypePathCell = GenericTypePathCell::new();
        CELL.get_or_insert::<Self>(|| format!("Shared<{}>", T::type_name()))
    }

    fn type_ident() -> &'static str {
        "Shared"
    }

    fn module_path() -> Option<&'static str> {
        Some("trellis_reflect")
    }
}

impl<T: Reflect + Typed> Typed for Shared<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Shared(SharedInfo::new::<Self, T>(|inner| {
                inner
                    .take::<T>()
                    .map(|value| Box::new(Shared::new(value)) as Box<dyn Reflect>)
                    .map_err(|inner| SlotError::Mismatch {
                        expected: T::type_path(),
                        received: inner.reflect_type_path(),
                    })
            }))
        })
    }
}

impl<T: Reflect + Typed> Reflect for Shared<T> {
    #[inline]
    fn as_any(&self) -> &dyn core::any::Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn core::any::Any> {
        self
    }

    #[inline]
    fn as_reflect(&self) -> &dyn Reflect {
        self
    }

    #[inline]
    fn as_reflect_mut(&mut self) -> &mut dyn Reflect {
        self
    }

    #[inline]
    fn into_reflect(self: Box<Self>) -> Box<dyn Reflect> {
        self
    }

    #[inline]
    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Shared(self)
    }

    #[inline]
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Shared(self)
    }
}

impl<T: Reflect + Typed> ReflectShared for Shared<T> {
    #[inline]
    fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    #[inline]
    fn clone_handle(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }

    fn borrow_inner(&self) -> Ref<'_, dyn Reflect> {
        Ref::map(self.0.borrow(), T::as_reflect)
    }

    fn borrow_inner_mut(&self) -> RefMut<'_, dyn Reflect> {
        RefMut::map(self.0.borrow_mut(), T::as_reflect_mut)
    }
}

impl<T: Reflect + Typed + GetTypeMeta> GetTypeMeta for Shared<T> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::Shared;
    use crate::Reflect;
    use crate::info::{DynamicTypePath, ReflectKind};
    use crate::ops::ReflectShared;

    #[test]
    fn identity_follows_allocation() {
        let a = Shared::new(5u32);
        let b = a.clone();
        let c = Shared::new(5u32);

        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn handle_reflects_as_shared() {
        let a = Shared::new(5u32);
        assert_eq!(a.reflect_kind(), ReflectKind::Shared);
        assert_eq!(a.borrow_inner().reflect_type_path(), "u32");
    }
}
