//! Static type descriptors.
//!
//! Every reflected type exposes one [`TypeInfo`], built on first access and
//! memoized for the life of the process (see
//! [`NonGenericTypeInfoCell`](crate::impls::NonGenericTypeInfoCell)).
//! The engine never inspects Rust types directly; everything it needs
//! (field tables, constructors, container factories, leaf codecs) lives
//! in these descriptors.

use core::any::{Any, TypeId};

// -----------------------------------------------------------------------------
// Modules

mod container_info;
mod enum_info;
mod leaf_info;
mod struct_info;
mod type_path;
mod typed;

// -----------------------------------------------------------------------------
// Exports

pub use container_info::{DynamicInfo, ListInfo, MapInfo, OptionalInfo, SharedInfo};
pub use enum_info::EnumInfo;
pub use leaf_info::{
    KeyForm, LeafError, LeafInfo, NumberKind, NumberLiteral, ScalarForm, ScalarInput,
};
pub use struct_info::{ConstructError, ConstructorArgs, ConstructorInfo, NamedField, StructInfo};
pub use type_path::{DynamicTypePath, TypePath};
pub use typed::{DynamicTyped, Typed};

// -----------------------------------------------------------------------------
// ReflectKind

/// The coarse classification a [`TypeInfo`] falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReflectKind {
    /// A scalar value handled by a leaf codec.
    Leaf,
    /// A fieldless enum, represented by its variant name.
    Enum,
    /// A named-field struct.
    Struct,
    /// A growable sequence.
    List,
    /// A keyed collection.
    Map,
    /// An optional value.
    Optional,
    /// A [`Shared`](crate::Shared) identity handle.
    Shared,
    /// A [`DynValue`](crate::DynValue) slot carrying its concrete type at
    /// runtime.
    Dynamic,
}

impl core::fmt::Display for ReflectKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Leaf => "leaf",
            Self::Enum => "enum",
            Self::Struct => "struct",
            Self::List => "list",
            Self::Map => "map",
            Self::Optional => "optional",
            Self::Shared => "shared",
            Self::Dynamic => "dynamic",
        })
    }
}

// -----------------------------------------------------------------------------
// Type

/// The identity of a reflected type: its [`TypeId`] and naming.
#[derive(Clone, Debug)]
pub struct Type {
    id: TypeId,
    path: &'static str,
    name: &'static str,
    ident: &'static str,
    module_path: Option<&'static str>,
}

impl Type {
    /// Captures the identity of `T`.
    pub fn of<T: TypePath + Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: T::type_path(),
            name: T::type_name(),
            ident: T::type_ident(),
            module_path: T::module_path(),
        }
    }

    /// Returns the [`TypeId`].
    #[inline]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the full type path.
    #[inline]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Returns the type name (no module path).
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the bare identifier.
    #[inline]
    pub const fn ident(&self) -> &'static str {
        self.ident
    }

    /// Returns the module path, if any.
    #[inline]
    pub const fn module_path(&self) -> Option<&'static str> {
        self.module_path
    }

    /// Whether this is the identity of `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

/// Compile-time generated type information.
///
/// Obtained through [`Typed::type_info`] for a static type, or
/// [`DynamicTyped::reflect_type_info`] from a `dyn Reflect` value.
pub enum TypeInfo {
    /// See [`LeafInfo`].
    Leaf(LeafInfo),
    /// See [`EnumInfo`].
    Enum(EnumInfo),
    /// See [`StructInfo`].
    Struct(StructInfo),
    /// See [`ListInfo`].
    List(ListInfo),
    /// See [`MapInfo`].
    Map(MapInfo),
    /// See [`OptionalInfo`].
    Optional(OptionalInfo),
    /// See [`SharedInfo`].
    Shared(SharedInfo),
    /// See [`DynamicInfo`].
    Dynamic(DynamicInfo),
}

macro_rules! impl_kind_accessor {
    ($fn_name:ident, $variant:ident, $info:ty) => {
        #[doc = concat!("Returns the inner [`", stringify!($info), "`], if this is a ", stringify!($variant), " type.")]
        #[inline]
        pub fn $fn_name(&self) -> Option<&$info> {
            match self {
                Self::$variant(info) => Some(info),
                _ => None,
            }
        }
    };
}

impl TypeInfo {
    /// Returns the [`Type`] identity.
    pub fn ty(&self) -> &Type {
        match self {
            Self::Leaf(info) => info.ty(),
            Self::Enum(info) => info.ty(),
            Self::Struct(info) => info.ty(),
            Self::List(info) => info.ty(),
            Self::Map(info) => info.ty(),
            Self::Optional(info) => info.ty(),
            Self::Shared(info) => info.ty(),
            Self::Dynamic(info) => info.ty(),
        }
    }

    /// Returns the [`ReflectKind`] this info describes.
    pub fn kind(&self) -> ReflectKind {
        match self {
            Self::Leaf(_) => ReflectKind::Leaf,
            Self::Enum(_) => ReflectKind::Enum,
            Self::Struct(_) => ReflectKind::Struct,
            Self::List(_) => ReflectKind::List,
            Self::Map(_) => ReflectKind::Map,
            Self::Optional(_) => ReflectKind::Optional,
            Self::Shared(_) => ReflectKind::Shared,
            Self::Dynamic(_) => ReflectKind::Dynamic,
        }
    }

    /// Returns the described type's [`TypeId`].
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.ty().id()
    }

    /// Returns the described type's full path.
    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.ty().path()
    }

    /// Returns the described type's name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.ty().name()
    }

    /// Whether this describes `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.ty().is::<T>()
    }

    impl_kind_accessor!(as_leaf, Leaf, LeafInfo);
    impl_kind_accessor!(as_enum, Enum, EnumInfo);
    impl_kind_accessor!(as_struct, Struct, StructInfo);
    impl_kind_accessor!(as_list, List, ListInfo);
    impl_kind_accessor!(as_map, Map, MapInfo);
    impl_kind_accessor!(as_optional, Optional, OptionalInfo);
    impl_kind_accessor!(as_shared, Shared, SharedInfo);
    impl_kind_accessor!(as_dynamic, Dynamic, DynamicInfo);
}

impl core::fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeInfo")
            .field("kind", &self.kind())
            .field("path", &self.type_path())
            .finish()
    }
}
