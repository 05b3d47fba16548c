//! The two failure taxonomies.
//!
//! Every error aborts its whole call; the engine never yields a partial
//! graph or partial text.

use thiserror::Error;

use trellis_reflect::info::{ConstructError, LeafError};
use trellis_reflect::ops::SlotError;

use crate::token::{SyntaxError, TokenKind};

// -----------------------------------------------------------------------------
// SerializeError

/// A write-side failure.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// No instructor matches the value's runtime type, which is a
    /// configuration error.
    #[error("no serialization strategy matches type `{type_path}`")]
    NoInstructor { type_path: &'static str },

    /// The recursion ceiling; an unguarded cycle ends here instead of
    /// overflowing the stack.
    #[error(
        "serialization exceeded the depth ceiling of {limit}; \
         enable reference preservation if the graph is cyclic"
    )]
    DepthExceeded { limit: usize },

    /// A leaf codec rejected the value.
    #[error("cannot format value of type `{type_path}`")]
    Leaf {
        type_path: &'static str,
        #[source]
        source: LeafError,
    },

    /// A dictionary key of a type with no key rendering.
    #[error("type `{type_path}` cannot be rendered as an object key")]
    UnsupportedKey { type_path: &'static str },

    /// A dynamic slot holding a payload that cannot carry a discriminator.
    #[error("dynamic payload of type `{type_path}` must be a struct")]
    UnsupportedDynamic { type_path: &'static str },

    /// The output sink failed.
    #[error("output error")]
    Format(#[from] core::fmt::Error),

    /// The byte sink failed (`serialize_to`).
    #[error("sink error")]
    Sink(#[from] std::io::Error),
}

// -----------------------------------------------------------------------------
// DeserializeError

/// A read-side failure.
#[derive(Debug, Error)]
pub enum DeserializeError {
    /// Malformed document, straight from the token stream.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// A structurally valid token in the wrong place.
    #[error("unexpected {found} at byte {pos}, expected {expected}")]
    Unexpected {
        expected: &'static str,
        found: TokenKind,
        pos: usize,
    },

    /// Content after the top-level value.
    #[error("unexpected trailing content at byte {pos}")]
    Trailing { pos: usize },

    /// No parser matches the (token, type) pair, a configuration error.
    #[error("no deserialization strategy matches {token} for type `{type_path}`")]
    NoParser {
        token: TokenKind,
        type_path: &'static str,
    },

    /// A leaf codec rejected the input (range, precision, format).
    #[error("cannot parse value of type `{type_path}`")]
    Leaf {
        type_path: &'static str,
        #[source]
        source: LeafError,
    },

    /// A document key matching no slot, under the `Error` policy.
    #[error("unknown member `{key}` on type `{type_path}`")]
    UnknownKey { key: String, type_path: &'static str },

    /// Two members of one type normalize to the same slot name.
    #[error("members of `{type_path}` collide on normalized name `{name}`")]
    DuplicateSlot { type_path: &'static str, name: String },

    /// No constructor is satisfiable with the collected members.
    #[error("no constructor of `{type_path}` is satisfiable with the supplied members")]
    NoConstructor { type_path: &'static str },

    /// A constructor failed while consuming its parameters.
    #[error("constructing `{type_path}` failed")]
    Construct {
        type_path: &'static str,
        #[source]
        source: ConstructError,
    },

    /// Injecting a leftover member or patching a slot failed.
    #[error("cannot inject member into `{type_path}`")]
    Inject {
        type_path: &'static str,
        #[source]
        source: SlotError,
    },

    /// A read-only slot received a value no constructor consumed.
    #[error("member `{slot}` of `{type_path}` is read-only and was not consumed by a constructor")]
    ReadOnlyLeftover {
        type_path: &'static str,
        slot: &'static str,
    },

    /// An unknown variant name for a fieldless enum.
    #[error("unknown variant `{variant}` for enum `{type_path}`")]
    UnknownVariant {
        type_path: &'static str,
        variant: String,
    },

    /// A `$type` discriminator naming no registered type.
    #[error("cannot resolve type name `{name}`")]
    UnknownTypeName { name: String },

    /// A discriminator naming a type the requested slot cannot hold.
    #[error("type `{found}` cannot be substituted for requested type `{requested}`")]
    TypeMismatch {
        requested: &'static str,
        found: &'static str,
    },

    /// A dynamic slot with no `$type` key.
    #[error("dynamic slot requires a `$type` discriminator")]
    MissingDiscriminator,

    /// A `$ref` to an id never introduced in this call.
    #[error("reference to object id {id}, which was never introduced in this document")]
    UnresolvedReference { id: u64 },

    /// A forward reference in a position that cannot be patched later.
    #[error(
        "forward reference to id {id} cannot be resolved at this position; \
         only struct members may defer"
    )]
    UndeferrableForward { id: u64 },

    /// One id introduced twice in a single call.
    #[error("object id {id} was introduced more than once")]
    DuplicateId { id: u64 },

    /// A metadata key in a position where it has no meaning.
    #[error("metadata key `{key}` is not valid here")]
    UnexpectedMetadata { key: &'static str },

    /// A dictionary keyed by a type with no key codec.
    #[error("type `{type_path}` cannot be used as a dictionary key")]
    UnsupportedKey { type_path: &'static str },

    /// The byte source failed (`deserialize_from`).
    #[error("source error")]
    Source(#[from] std::io::Error),
}
