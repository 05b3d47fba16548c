use crate::Reflect;
use crate::info::{Type, TypePath};

// -----------------------------------------------------------------------------
// EnumInfo

/// Information for a fieldless enum.
///
/// Such enums travel as their variant name; `from_name` is the inverse
/// lookup, returning `None` for unknown names.
pub struct EnumInfo {
    ty: Type,
    variants: &'static [&'static str],
    from_name: fn(&str) -> Option<Box<dyn Reflect>>,
}

impl EnumInfo {
    /// Creates a new [`EnumInfo`] for enum type `T`.
    pub fn new<T: Reflect + TypePath>(
        variants: &'static [&'static str],
        from_name: fn(&str) -> Option<Box<dyn Reflect>>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(),
            variants,
            from_name,
        }
    }

    /// Returns the [`Type`] identity.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns the variant names in declaration order.
    #[inline]
    pub const fn variants(&self) -> &'static [&'static str] {
        self.variants
    }

    /// Builds the variant with the given name, if it exists.
    #[inline]
    pub fn from_name(&self, name: &str) -> Option<Box<dyn Reflect>> {
        (self.from_name)(name)
    }
}

impl core::fmt::Debug for EnumInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EnumInfo")
            .field("path", &self.ty.path())
            .field("variants", &self.variants)
            .finish()
    }
}
