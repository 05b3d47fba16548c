//! Kind-specific access traits.
//!
//! [`Reflect::reflect_ref`](crate::Reflect::reflect_ref) and
//! [`Reflect::reflect_mut`](crate::Reflect::reflect_mut) hand out these
//! trait objects so the engine can walk and mutate values without knowing
//! their concrete types.

use core::cell::{Ref, RefMut};
use core::{error, fmt};

use crate::Reflect;
use crate::info::ReflectKind;

// -----------------------------------------------------------------------------
// SlotError

/// An error raised when injecting a value into a slot.
#[derive(Debug)]
pub enum SlotError {
    /// The value's type does not match the slot's declared type.
    Mismatch {
        expected: &'static str,
        received: &'static str,
    },
    /// The slot exists but accepts no post-construction injection.
    ReadOnly { field: &'static str },
    /// The slot name does not exist on the target type.
    UnknownField { field: String },
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch { expected, received } => {
                write!(f, "slot expected `{expected}`, received `{received}`")
            }
            Self::ReadOnly { field } => {
                write!(f, "field `{field}` accepts no setter")
            }
            Self::UnknownField { field } => {
                write!(f, "no field named `{field}`")
            }
        }
    }
}

impl error::Error for SlotError {}

// -----------------------------------------------------------------------------
// Kind traits

/// Field access for named-field structs.
///
/// Implemented by [`#[derive(Reflect)]`](crate::derive::Reflect); the match
/// arms are generated per field, so every accessor is a direct borrow.
pub trait ReflectStruct: Reflect {
    /// Returns a reference to the field named `name`.
    fn field(&self, name: &str) -> Option<&dyn Reflect>;

    /// Returns a mutable reference to the field named `name`.
    ///
    /// Read-only fields are reachable here too; `field_mut` is navigation,
    /// [`set_field`](Self::set_field) is the guarded injection point.
    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Reflect>;

    /// Replaces the field named `name` with `value`.
    fn set_field(&mut self, name: &str, value: Box<dyn Reflect>) -> Result<(), SlotError>;
}

/// Element access for growable sequences.
pub trait ReflectList: Reflect {
    /// Returns the number of elements.
    fn element_len(&self) -> usize;

    /// Returns a reference to the element at `index`.
    fn element(&self, index: usize) -> Option<&dyn Reflect>;

    /// Returns a mutable reference to the element at `index`.
    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;

    /// Appends `value` to the sequence.
    fn push_element(&mut self, value: Box<dyn Reflect>) -> Result<(), SlotError>;
}

/// Entry access for keyed collections.
pub trait ReflectMap: Reflect {
    /// Returns the number of entries.
    fn entry_len(&self) -> usize;

    /// Returns the entry at `index`, in the map's own iteration order.
    fn entry_at(&self, index: usize) -> Option<(&dyn Reflect, &dyn Reflect)>;

    /// Inserts an entry, replacing any previous value under the same key.
    fn insert_entry(
        &mut self,
        key: Box<dyn Reflect>,
        value: Box<dyn Reflect>,
    ) -> Result<(), SlotError>;
}

/// Presence access for optional values.
pub trait ReflectOptional: Reflect {
    /// Returns the inner value, if present.
    fn inner(&self) -> Option<&dyn Reflect>;

    /// Returns the inner value mutably, if present.
    fn inner_mut(&mut self) -> Option<&mut dyn Reflect>;
}

/// Identity access for [`Shared`](crate::Shared) handles.
pub trait ReflectShared: Reflect {
    /// A stable identity for the referenced allocation, unique while any
    /// handle to it is alive.
    fn identity(&self) -> usize;

    /// Clones the handle (not the value) into a fresh box.
    fn clone_handle(&self) -> Box<dyn Reflect>;

    /// Borrows the referenced value.
    ///
    /// Panics if a mutable borrow is active, which the engine's depth-first
    /// walk never produces.
    fn borrow_inner(&self) -> Ref<'_, dyn Reflect>;

    /// Mutably borrows the referenced value.
    ///
    /// Panics if any borrow is active; only used while patching deferred
    /// references, outside any traversal of the same handle.
    fn borrow_inner_mut(&self) -> RefMut<'_, dyn Reflect>;
}

/// Variant access for fieldless enums.
pub trait ReflectEnum: Reflect {
    /// Returns the active variant's name.
    fn variant_name(&self) -> &'static str;
}

// -----------------------------------------------------------------------------
// ReflectRef

/// Kind-dispatched read access to a reflected value.
pub enum ReflectRef<'a> {
    Leaf(&'a dyn Reflect),
    Enum(&'a dyn ReflectEnum),
    Struct(&'a dyn ReflectStruct),
    List(&'a dyn ReflectList),
    Map(&'a dyn ReflectMap),
    Optional(&'a dyn ReflectOptional),
    Shared(&'a dyn ReflectShared),
    /// The payload of a [`DynValue`](crate::DynValue) slot.
    Dynamic(&'a dyn Reflect),
}

impl ReflectRef<'_> {
    /// Returns the [`ReflectKind`] of this access.
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
}

// -----------------------------------------------------------------------------
// ReflectMut

/// Kind-dispatched write access to a reflected value.
pub enum ReflectMut<'a> {
    Leaf(&'a mut dyn Reflect),
    Enum(&'a mut dyn Reflect),
    Struct(&'a mut dyn ReflectStruct),
    List(&'a mut dyn ReflectList),
    Map(&'a mut dyn ReflectMap),
    Optional(&'a mut dyn ReflectOptional),
    Shared(&'a mut dyn ReflectShared),
    /// The payload of a [`DynValue`](crate::DynValue) slot.
    Dynamic(&'a mut dyn Reflect),
}

impl ReflectMut<'_> {
    /// Returns the [`ReflectKind`] of this access.
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
}
