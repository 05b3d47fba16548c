use core::any::{Any, TypeId};
use core::{error, fmt};

use hashbrown::HashMap;

use crate::Reflect;
use crate::info::{Type, TypeInfo, TypePath, Typed};
use crate::ops::ReflectStruct;

// -----------------------------------------------------------------------------
// NamedField

/// Information for one named struct field.
///
/// # Examples
///
/// ```
/// use trellis_reflect::{derive::Reflect, info::Typed};
///
/// #[derive(Reflect)]
/// struct Foo {
///     field_a: f32,
/// }
///
/// let info = Foo::type_info().as_struct().unwrap();
/// let field = info.field_at(0).unwrap();
///
/// assert!(field.type_is::<f32>());
/// assert_eq!(field.name(), "field_a");
/// ```
#[derive(Clone, Debug)]
pub struct NamedField {
    ty_id: TypeId,
    name: &'static str,
    wire_name: &'static str,
    // `TypeInfo` is created on first access; a function pointer delays it
    // so field types may be declared after their owner.
    type_info: fn() -> &'static TypeInfo,
    readonly: bool,
}

impl NamedField {
    /// Creates a new [`NamedField`] for the given field `name` and type `T`.
    pub const fn new<T: Typed>(name: &'static str) -> Self {
        Self {
            name,
            wire_name: name,
            type_info: T::type_info,
            ty_id: TypeId::of::<T>(),
            readonly: false,
        }
    }

    /// Overrides the name this field travels under in documents.
    pub const fn with_wire_name(mut self, wire_name: &'static str) -> Self {
        self.wire_name = wire_name;
        self
    }

    /// Marks this field as reachable through constructors only.
    pub const fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Returns the `TypeId` of the field's type.
    #[inline]
    pub const fn ty_id(&self) -> TypeId {
        self.ty_id
    }

    /// Check if the given type matches this field's type.
    #[inline]
    pub fn type_is<T: Any>(&self) -> bool {
        self.ty_id == TypeId::of::<T>()
    }

    /// Returns the field name as declared in Rust.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the name this field travels under in documents.
    #[inline]
    pub const fn wire_name(&self) -> &'static str {
        self.wire_name
    }

    /// Whether the field rejects post-construction injection.
    #[inline]
    pub const fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Returns the field's [`TypeInfo`].
    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.type_info)()
    }
}

// -----------------------------------------------------------------------------
// ConstructorArgs

/// The bag of resolved values a constructor consumes.
///
/// Implemented by the deserializer over its collected member values; each
/// `take_arg` marks the slot as consumed so it is not injected twice.
pub trait ConstructorArgs {
    /// Removes and returns the value collected for `name`, if present.
    fn take_arg(&mut self, name: &'static str) -> Option<Box<dyn Reflect>>;
}

// -----------------------------------------------------------------------------
// ConstructError

/// An error raised while invoking a constructor description.
#[derive(Debug)]
pub enum ConstructError {
    /// A parameter had no collected value. Callers check invokability
    /// before invoking, so reaching this means the bag changed underneath.
    MissingArg { name: &'static str },
    /// A collected value did not have the parameter's type.
    ArgType {
        name: &'static str,
        expected: &'static str,
        received: &'static str,
    },
}

impl fmt::Display for ConstructError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArg { name } => {
                write!(f, "constructor parameter `{name}` has no value")
            }
            Self::ArgType {
                name,
                expected,
                received,
            } => {
                write!(
                    f,
                    "constructor parameter `{name}` expected `{expected}`, received `{received}`"
                )
            }
        }
    }
}

impl error::Error for ConstructError {}

// -----------------------------------------------------------------------------
// ConstructorInfo

/// One way to build a value of a struct type.
///
/// Parameters are named after the fields they populate; the invoke function
/// pulls each one out of a [`ConstructorArgs`] bag and runs the underlying
/// constructor. Generated by [`#[derive(Reflect)]`](crate::derive::Reflect),
/// either synthesized from the full field list or taken from
/// `#[reflect(constructor = "fn_name(param, ...)")]` attributes.
pub struct ConstructorInfo {
    params: &'static [&'static str],
    invoke: fn(&mut dyn ConstructorArgs) -> Result<Box<dyn Reflect>, ConstructError>,
}

impl ConstructorInfo {
    /// Creates a new [`ConstructorInfo`].
    pub const fn new(
        params: &'static [&'static str],
        invoke: fn(&mut dyn ConstructorArgs) -> Result<Box<dyn Reflect>, ConstructError>,
    ) -> Self {
        Self { params, invoke }
    }

    /// Returns the parameter names, in declaration order.
    #[inline]
    pub const fn params(&self) -> &'static [&'static str] {
        self.params
    }

    /// Returns the number of parameters.
    #[inline]
    pub const fn param_len(&self) -> usize {
        self.params.len()
    }

    /// Whether every parameter is available according to `available`.
    pub fn invokable(&self, mut available: impl FnMut(&'static str) -> bool) -> bool {
        self.params.iter().all(|name| available(name))
    }

    /// Invokes the constructor, consuming its parameters from `args`.
    #[inline]
    pub fn invoke(
        &self,
        args: &mut dyn ConstructorArgs,
    ) -> Result<Box<dyn Reflect>, ConstructError> {
        (self.invoke)(args)
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("params", &self.params)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// StructInfo

/// A container for compile-time named struct info.
///
/// Fields keep declaration order; lookup by name is O(1). Constructors
/// keep declaration order too, since the deserializer breaks selection
/// ties in their favor.
///
/// # Examples
///
/// ```
/// use trellis_reflect::{derive::Reflect, info::Typed};
///
/// #[derive(Reflect)]
/// struct A {
///     val: f32,
/// }
///
/// let info = <A as Typed>::type_info().as_struct().unwrap();
///
/// assert_eq!(info.field_len(), 1);
/// assert_eq!(info.index_of("val"), Some(0));
/// assert_eq!(info.constructors().len(), 1);
/// ```
pub struct StructInfo {
    ty: Type,
    fields: Box<[NamedField]>,
    field_index: HashMap<&'static str, usize>,
    constructors: Box<[ConstructorInfo]>,
}

impl StructInfo {
    /// Create a new [`StructInfo`].
    ///
    /// The order of `fields` and `constructors` is preserved.
    pub fn new<T: ReflectStruct + TypePath>(
        fields: Vec<NamedField>,
        constructors: Vec<ConstructorInfo>,
    ) -> Self {
        let field_index = fields
            .iter()
            .enumerate()
            .map(|(index, field)| (field.name(), index))
            .collect();

        Self {
            ty: Type::of::<T>(),
            fields: fields.into_boxed_slice(),
            field_index,
            constructors: constructors.into_boxed_slice(),
        }
    }

    /// Returns the [`Type`] identity.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns the [`NamedField`] with the given Rust `name`, if present.
    pub fn field(&self, name: &str) -> Option<&NamedField> {
        self.field_index.get(name).map(|index| &self.fields[*index])
    }

    /// Returns the [`NamedField`] at the given index, if present.
    pub fn field_at(&self, index: usize) -> Option<&NamedField> {
        self.fields.get(index)
    }

    /// Returns an iterator over the fields in declaration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &NamedField> {
        self.fields.iter()
    }

    /// Returns the index for the given field `name`, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.field_index.get(name).copied()
    }

    /// Returns the number of fields.
    #[inline]
    pub fn field_len(&self) -> usize {
        self.fields.len()
    }

    /// Returns the constructor descriptions in declaration order.
    #[inline]
    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }
}

impl fmt::Debug for StructInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructInfo")
            .field("path", &self.ty.path())
            .field("fields", &self.fields)
            .finish()
    }
}
