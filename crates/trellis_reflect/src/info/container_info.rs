use crate::Reflect;
use crate::info::{Type, TypeInfo, TypePath};
use crate::ops::{ReflectList, ReflectMap, ReflectOptional, ReflectShared, SlotError};

// -----------------------------------------------------------------------------
// ListInfo

/// Information for a growable sequence type.
///
/// `make` is the default destination factory; the registry's
/// [`TypeTraitFactory`](crate::registry::TypeTraitFactory) can override it
/// per type.
pub struct ListInfo {
    ty: Type,
    element: fn() -> &'static TypeInfo,
    make: fn() -> Box<dyn Reflect>,
}

impl ListInfo {
    /// Creates a new [`ListInfo`] for list type `T` with element type `E`.
    pub fn new<T: ReflectList + TypePath, E: crate::info::Typed>(
        make: fn() -> Box<dyn Reflect>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(),
            element: E::type_info,
            make,
        }
    }

    /// Returns the [`Type`] identity.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns the declared element type.
    #[inline]
    pub fn element(&self) -> &'static TypeInfo {
        (self.element)()
    }

    /// Builds an empty destination collection.
    #[inline]
    pub fn make(&self) -> Box<dyn Reflect> {
        (self.make)()
    }
}

// -----------------------------------------------------------------------------
// MapInfo

/// Information for a keyed collection type.
///
/// Keys must be leaf types carrying a key codec; the engine checks this when
/// the map is first used.
pub struct MapInfo {
    ty: Type,
    key: fn() -> &'static TypeInfo,
    value: fn() -> &'static TypeInfo,
    make: fn() -> Box<dyn Reflect>,
}

impl MapInfo {
    /// Creates a new [`MapInfo`] for map type `T` with entry types `K`/`V`.
    pub fn new<T, K, V>(make: fn() -> Box<dyn Reflect>) -> Self
    where
        T: ReflectMap + TypePath,
        K: crate::info::Typed,
        V: crate::info::Typed,
    {
        Self {
            ty: Type::of::<T>(),
            key: K::type_info,
            value: V::type_info,
            make,
        }
    }

    /// Returns the [`Type`] identity.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns the declared key type.
    #[inline]
    pub fn key(&self) -> &'static TypeInfo {
        (self.key)()
    }

    /// Returns the declared value type.
    #[inline]
    pub fn value(&self) -> &'static TypeInfo {
        (self.value)()
    }

    /// Builds an empty destination map.
    #[inline]
    pub fn make(&self) -> Box<dyn Reflect> {
        (self.make)()
    }
}

// -----------------------------------------------------------------------------
// OptionalInfo

/// Information for an optional type.
pub struct OptionalInfo {
    ty: Type,
    inner: fn() -> &'static TypeInfo,
    make_none: fn() -> Box<dyn Reflect>,
    wrap: fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>, SlotError>,
}

impl OptionalInfo {
    /// Creates a new [`OptionalInfo`] for optional type `T` with inner
    /// type `I`.
    pub fn new<T: ReflectOptional + TypePath, I: crate::info::Typed>(
        make_none: fn() -> Box<dyn Reflect>,
        wrap: fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>, SlotError>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(),
            inner: I::type_info,
            make_none,
            wrap,
        }
    }

    /// Returns the [`Type`] identity.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns the inner type.
    #[inline]
    pub fn inner(&self) -> &'static TypeInfo {
        (self.inner)()
    }

    /// Builds the empty value.
    #[inline]
    pub fn make_none(&self) -> Box<dyn Reflect> {
        (self.make_none)()
    }

    /// Wraps an inner value into the present variant.
    #[inline]
    pub fn wrap(&self, inner: Box<dyn Reflect>) -> Result<Box<dyn Reflect>, SlotError> {
        (self.wrap)(inner)
    }

    /// The wrap function itself, for deferred-reference bookkeeping.
    #[inline]
    pub fn wrap_fn(&self) -> fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>, SlotError> {
        self.wrap
    }
}

// -----------------------------------------------------------------------------
// SharedInfo

/// Information for a [`Shared`](crate::Shared) identity handle type.
pub struct SharedInfo {
    ty: Type,
    inner: fn() -> &'static TypeInfo,
    wrap: fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>, SlotError>,
}

impl SharedInfo {
    /// Creates a new [`SharedInfo`] for handle type `T` with inner type `I`.
    pub fn new<T: ReflectShared + TypePath, I: crate::info::Typed>(
        wrap: fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>, SlotError>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(),
            inner: I::type_info,
            wrap,
        }
    }

    /// Returns the [`Type`] identity.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns the inner type.
    #[inline]
    pub fn inner(&self) -> &'static TypeInfo {
        (self.inner)()
    }

    /// Wraps a freshly built inner value into a new handle.
    #[inline]
    pub fn wrap(&self, inner: Box<dyn Reflect>) -> Result<Box<dyn Reflect>, SlotError> {
        (self.wrap)(inner)
    }
}

// -----------------------------------------------------------------------------
// DynamicInfo

/// Information for the [`DynValue`](crate::DynValue) slot type.
///
/// The slot itself is typeless; the concrete type of its payload travels in
/// the document's discriminator.
pub struct DynamicInfo {
    ty: Type,
    wrap: fn(Box<dyn Reflect>) -> Box<dyn Reflect>,
}

impl DynamicInfo {
    /// Creates a new [`DynamicInfo`] for slot type `T`.
    pub fn new<T: Reflect + TypePath>(wrap: fn(Box<dyn Reflect>) -> Box<dyn Reflect>) -> Self {
        Self {
            ty: Type::of::<T>(),
            wrap,
        }
    }

    /// Returns the [`Type`] identity.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// Wraps a concrete payload into the slot type.
    #[inline]
    pub fn wrap(&self, inner: Box<dyn Reflect>) -> Box<dyn Reflect> {
        (self.wrap)(inner)
    }
}
