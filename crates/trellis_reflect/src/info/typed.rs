use crate::info::{TypeInfo, TypePath};

// -----------------------------------------------------------------------------
// Typed

/// A static accessor to compile-time type information.
///
/// Automatically implemented by
/// [`#[derive(Reflect)]`](crate::derive::Reflect), allowing access to type
/// information without an instance of the type.
///
/// # Examples
///
/// ```
/// use trellis_reflect::{derive::Reflect, info::{Typed, TypeInfo}};
///
/// #[derive(Reflect)]
/// struct A { value: u32 }
///
/// let info: &'static TypeInfo = <A as Typed>::type_info();
/// assert_eq!(info.type_name(), "A");
/// ```
///
/// # Manual implementation
///
/// Rarely necessary; the memoization cells in [`crate::impls`]
/// ([`NonGenericTypeInfoCell`], [`GenericTypeInfoCell`]) carry the pattern
/// when it is.
///
/// [`NonGenericTypeInfoCell`]: crate::impls::NonGenericTypeInfoCell
/// [`GenericTypeInfoCell`]: crate::impls::GenericTypeInfoCell
pub trait Typed: TypePath {
    /// Returns the memoized [`TypeInfo`] for this type.
    fn type_info() -> &'static TypeInfo;
}

// -----------------------------------------------------------------------------
// DynamicTyped

/// Dynamic dispatch for types that implement [`Typed`].
///
/// Automatically implemented for every `Typed` type; this is how a
/// `dyn Reflect` value reports its runtime type to the engine.
pub trait DynamicTyped {
    /// Returns the [`TypeInfo`] of the underlying concrete type.
    fn reflect_type_info(&self) -> &'static TypeInfo;
}

impl<T: Typed> DynamicTyped for T {
    #[inline]
    fn reflect_type_info(&self) -> &'static TypeInfo {
        Self::type_info()
    }
}
