// -----------------------------------------------------------------------------
// TypePath

/// A static accessor to type paths and names.
///
/// Provides a stable alternative to [`core::any::type_name`] that works
/// across compiler versions and can be pinned by the user.
///
/// # Methods
///
/// - [`type_path`]: the unique identifier of the type, cannot be duplicated.
/// - [`type_name`]: type name without module path, may be duplicated.
/// - [`type_ident`]: the shortest name, without module path and generics.
/// - [`module_path`]: optional module path.
///
/// Names never carry a leading `::`; manual implementations must uphold
/// this too, since the path is what travels in wire discriminators.
///
/// # Implementation
///
/// Usually implemented through [`#[derive(Reflect)]`](crate::derive::Reflect),
/// which derives the path from the defining module, or takes a pinned one
/// from `#[reflect(type_path = "my_crate::foo::Foo")]`.
///
/// Manual implementations are straightforward for non-generic types:
///
/// ```
/// use trellis_reflect::info::TypePath;
///
/// struct Foo;
///
/// impl TypePath for Foo {
///     fn type_path() -> &'static str { "my_crate::foo::Foo" }
///     fn type_name() -> &'static str { "Foo" }
///     fn type_ident() -> &'static str { "Foo" }
///     fn module_path() -> Option<&'static str> { Some("my_crate::foo") }
/// }
/// ```
///
/// Generic types build their path once through a
/// [`GenericTypePathCell`](crate::impls::GenericTypePathCell).
///
/// [`type_path`]: TypePath::type_path
/// [`type_name`]: TypePath::type_name
/// [`type_ident`]: TypePath::type_ident
/// [`module_path`]: TypePath::module_path
pub trait TypePath: 'static {
    /// Returns the fully qualified path of the type, generics included.
    fn type_path() -> &'static str;

    /// Returns the name of the type, generics included.
    fn type_name() -> &'static str;

    /// Returns the bare identifier of the type.
    fn type_ident() -> &'static str;

    /// Returns the module path of the type, if it has one.
    fn module_path() -> Option<&'static str> {
        None
    }
}

// -----------------------------------------------------------------------------
// DynamicTypePath

/// Dynamic dispatch for [`TypePath`].
///
/// Automatically implemented for every `TypePath` type.
pub trait DynamicTypePath {
    /// See [`TypePath::type_path`].
    fn reflect_type_path(&self) -> &'static str;

    /// See [`TypePath::type_name`].
    fn reflect_type_name(&self) -> &'static str;

    /// See [`TypePath::type_ident`].
    fn reflect_type_ident(&self) -> &'static str;

    /// See [`TypePath::module_path`].
    fn reflect_module_path(&self) -> Option<&'static str>;
}

impl<T: TypePath> DynamicTypePath for T {
    #[inline]
    fn reflect_type_path(&self) -> &'static str {
        Self::type_path()
    }

    #[inline]
    fn reflect_type_name(&self) -> &'static str {
        Self::type_name()
    }

    #[inline]
    fn reflect_type_ident(&self) -> &'static str {
        Self::type_ident()
    }

    #[inline]
    fn reflect_module_path(&self) -> Option<&'static str> {
        Self::module_path()
    }
}
