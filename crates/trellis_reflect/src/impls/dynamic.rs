use core::any::Any;

use crate::Reflect;
use crate::impls::NonGenericTypeInfoCell;
use crate::info::{DynamicInfo, DynamicTypePath, TypeInfo, TypePath, Typed};
use crate::ops::{ReflectMut, ReflectRef};
use crate::registry::{GetTypeMeta, TypeMeta};

// -----------------------------------------------------------------------------
// DynValue

/// A polymorphic slot: a value whose concrete type is decided at runtime.
///
/// Declare a field as `DynValue` when different concrete types may occupy
/// it. On the wire the payload travels with a `$type` discriminator, and
/// deserialization resolves it through the registry back to the concrete
/// type.
///
/// # Examples
///
/// ```
/// use trellis_reflect::{derive::Reflect, DynValue};
/// use trellis_reflect::info::DynamicTypePath;
///
/// #[derive(Reflect)]
/// struct Circle { radius: f64 }
///
/// let slot = DynValue::new(Circle { radius: 1.0 });
/// assert!(slot.downcast_ref::<Circle>().is_some());
/// assert_eq!(slot.inner().reflect_type_ident(), "Circle");
/// ```
pub struct DynValue(Box<dyn Reflect>);

impl DynValue {
    /// Wraps a concrete value.
    pub fn new<T: Reflect>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Wraps an already-boxed value.
    #[inline]
    pub fn from_boxed(value: Box<dyn Reflect>) -> Self {
        Self(value)
    }

    /// Returns the payload.
    #[inline]
    pub fn inner(&self) -> &dyn Reflect {
        &*self.0
    }

    /// Returns the payload mutably.
    #[inline]
    pub fn inner_mut(&mut self) -> &mut dyn Reflect {
        &mut *self.0
    }

    /// Unwraps the payload.
    #[inline]
    pub fn into_inner(self) -> Box<dyn Reflect> {
        self.0
    }

    /// Downcasts the payload to a `&T`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl core::fmt::Debug for DynValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "DynValue({})", self.0.reflect_type_path())
    }
}

impl TypePath for DynValue {
    fn type_path() -> &'static str {
        "trellis_reflect::DynValue"
    }

    fn type_name() -> &'static str {
        "DynValue"
    }

    fn type_ident() -> &'static str {
        "DynValue"
    }

    fn module_path() -> Option<&'static str> {
        Some("trellis_reflect")
    }
}

impl Typed for DynValue {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Dynamic(DynamicInfo::new::<Self>(|inner| Box::new(DynValue(inner))))
        })
    }
}

impl Reflect for DynValue {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
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
        ReflectRef::Dynamic(&*self.0)
    }

    #[inline]
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Dynamic(&mut *self.0)
    }
}

impl GetTypeMeta for DynValue {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }
}
