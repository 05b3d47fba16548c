//! The type registry: the engine's type↔name mapping and per-type
//! extension slots.
//!
//! Registration stores one [`TypeMeta`] per type: its [`TypeInfo`] plus an
//! open table of [`TypeTrait`] objects. The registry also indexes types by
//! full path and by short name, which is how wire discriminators resolve
//! back to concrete types.
//!
//! [`TypeInfo`]: crate::info::TypeInfo

// -----------------------------------------------------------------------------
// Modules

mod traits;
mod type_meta;
mod type_registry;

// -----------------------------------------------------------------------------
// Exports

pub use traits::{FromType, TypeTrait, TypeTraitDefault, TypeTraitFactory};
pub use type_meta::{GetTypeMeta, TypeMeta};
pub use type_registry::{TypeRegistry, TypeRegistryArc};
