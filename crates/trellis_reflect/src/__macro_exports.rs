//! Items re-exported for the derive macro's generated code.
//!
//! Not part of the public API; the paths here may change without notice.

pub use crate::info::{
    ConstructError, ConstructorArgs, ConstructorInfo, NamedField, StructInfo, TypeInfo, TypePath,
    Typed,
};
pub use crate::registry::{FromType, GetTypeMeta, TypeMeta, TypeRegistry};
pub use crate::{Reflect, impls};

/// Link-time auto-registration support.
#[cfg(feature = "auto_register")]
pub mod auto_register {
    use crate::registry::TypeRegistry;

    pub use inventory;

    /// One `#[reflect(auto_register)]` type's registration hook.
    pub struct AutoRegistration {
        pub register: fn(&mut TypeRegistry),
    }

    inventory::collect!(AutoRegistration);

    /// Runs every collected registration hook against `registry`.
    pub fn register_all(registry: &mut TypeRegistry) {
        for entry in inventory::iter::<AutoRegistration> {
            (entry.register)(registry);
        }
    }
}
