//! Derive support for `trellis_reflect`.
//!
//! See [`Reflect`].

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static REFLECT_ATTRIBUTE_NAME: &str = "reflect";

// -----------------------------------------------------------------------------
// Modules

mod derive_data;
mod impls;

// -----------------------------------------------------------------------------
// Macros

/// Full reflection derivation.
///
/// `#[derive(Reflect)]` implements `TypePath`, `Typed`, `Reflect`,
/// `GetTypeMeta`, and the kind trait matching the item: `ReflectStruct`
/// for named-field structs, `ReflectEnum` for fieldless enums.
///
/// # Type attributes
///
/// - `#[reflect(type_path = "my_crate::foo::Foo")]`: pin the type path so
///   it survives moving the definition.
/// - `#[reflect(default)]`: the type implements [`Default`]; adds a
///   zero-parameter constructor and registers default construction.
/// - `#[reflect(constructor = "fn_name(param, ...)")]`: declare an
///   associated function as a constructor; repeatable, declaration order
///   is the tie-break order during selection. Every parameter must name a
///   reflected field.
/// - `#[reflect(auto_register)]`: submit the type for link-time
///   collection, picked up by `TypeRegistry::auto_register`. Non-generic
///   types only.
///
/// # Field attributes
///
/// - `#[reflect(rename = "wire_name")]`: the name the field travels
///   under in documents.
/// - `#[reflect(readonly)]`: reachable through constructors only; the
///   field rejects post-construction injection.
/// - `#[reflect(ignore)]`: invisible to reflection. The field type must
///   implement [`Default`], which synthesized constructors use to fill it.
///
/// # Constructors
///
/// Without `constructor` attributes a struct gets one synthesized
/// constructor taking every reflected field. With them, the declared
/// constructors are used instead. `#[reflect(default)]` appends a
/// zero-parameter constructor in either case.
///
/// # Example
///
/// ```rust, ignore
/// #[derive(Reflect)]
/// #[reflect(constructor = "new(name)")]
/// #[reflect(constructor = "with_age(name, age)")]
/// struct Person {
///     name: String,
///     #[reflect(readonly)]
///     age: u32,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_data::ReflectDerive::parse(&input) {
        Ok(derive) => impls::expand(&derive).into(),
        Err(err) => err.to_compile_error().into(),
    }
}
