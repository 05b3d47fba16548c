#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Extern Self

// `crate` is used inside the crate itself, while doc tests refer to
// `trellis_reflect`. `extern self` lets generated code use one spelling.
extern crate self as trellis_reflect;

// -----------------------------------------------------------------------------
// Modules

mod reflection;
mod util;

pub mod impls;
pub mod info;
pub mod ops;
pub mod registry;

// -----------------------------------------------------------------------------
// Top-Level exports

pub mod __macro_exports;

pub use impls::{DynValue, Shared};
pub use reflection::Reflect;
pub use trellis_reflect_derive as derive;
pub use util::{TypeIdHasher, TypeIdMap};
