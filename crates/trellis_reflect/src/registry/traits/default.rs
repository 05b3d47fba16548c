use crate::Reflect;
use crate::info::Typed;
use crate::registry::FromType;

// -----------------------------------------------------------------------------
// TypeTraitDefault

/// [`Default`] support for reflected types.
///
/// Lets the engine build an empty value of a type known only at runtime,
/// the fallback when a document supplies no members and the type declares
/// no zero-parameter constructor.
///
/// # Examples
///
/// ```
/// use trellis_reflect::registry::{TypeRegistry, TypeTraitDefault};
///
/// let registry = TypeRegistry::new();
///
/// let make = registry
///     .get_with_type_name("String").unwrap()
///     .get_trait::<TypeTraitDefault>().unwrap();
///
/// assert_eq!(make.default().take::<String>().unwrap(), "");
/// ```
#[derive(Clone)]
pub struct TypeTraitDefault {
    func: fn() -> Box<dyn Reflect>,
}

impl TypeTraitDefault {
    /// Calls the underlying type's [`Default`].
    #[inline]
    pub fn default(&self) -> Box<dyn Reflect> {
        (self.func)()
    }
}

impl<T: Default + Typed + Reflect> FromType<T> for TypeTraitDefault {
    fn from_type() -> Self {
        Self {
            func: || Box::<T>::default(),
        }
    }
}
