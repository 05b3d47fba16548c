use crate::Reflect;
use crate::info::Typed;
use crate::registry::FromType;

// -----------------------------------------------------------------------------
// TypeTraitFactory

/// A pluggable destination factory for container types.
///
/// The collection and dictionary parsers construct their destination
/// through this trait when it is registered, falling back to the
/// container descriptor's own factory otherwise. Registering it for a
/// preallocating or pooling container type overrides how destinations are
/// created without touching the parser.
#[derive(Clone)]
pub struct TypeTraitFactory {
    func: fn() -> Box<dyn Reflect>,
}

impl TypeTraitFactory {
    /// Creates a factory from an explicit function.
    #[inline]
    pub fn from_fn(func: fn() -> Box<dyn Reflect>) -> Self {
        Self { func }
    }

    /// Builds a fresh destination value.
    #[inline]
    pub fn make(&self) -> Box<dyn Reflect> {
        (self.func)()
    }
}

impl<T: Default + Typed + Reflect> FromType<T> for TypeTraitFactory {
    fn from_type() -> Self {
        Self {
            func: || Box::<T>::default(),
        }
    }
}
