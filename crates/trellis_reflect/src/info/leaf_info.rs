use core::{error, fmt};

use crate::Reflect;
use crate::info::{Type, TypePath};

// -----------------------------------------------------------------------------
// Scalar transport forms

/// Classification of a numeric literal, derived from the literal's shape.
///
/// A leading `-` makes a literal signed; a fraction or exponent makes it a
/// float. The distinction matters because integer widths validate the
/// decimal text exactly, without a lossy float round-trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberKind {
    Signed,
    Unsigned,
    Float,
}

/// A raw numeric literal as it appeared in the document.
#[derive(Clone, Copy, Debug)]
pub struct NumberLiteral<'a> {
    pub text: &'a str,
    pub kind: NumberKind,
}

/// Scalar input handed to a leaf codec's parse function.
#[derive(Clone, Copy, Debug)]
pub enum ScalarInput<'a> {
    Bool(bool),
    Number(NumberLiteral<'a>),
    Text(&'a str),
}

impl ScalarInput<'_> {
    /// A short description of the input, for error messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
        }
    }
}

/// Scalar output produced by a leaf codec's format function.
///
/// `Number` carries the final textual form and is written raw; `Text` is
/// escaped and quoted by the writer.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarForm {
    Bool(bool),
    Number(String),
    Text(String),
}

/// An object-key rendering of a leaf value.
///
/// `normalize` reports whether the writer must re-normalize the text before
/// emitting it as a key (member names do; data-bearing keys such as map
/// keys must not).
#[derive(Clone, Debug)]
pub struct KeyForm {
    pub text: String,
    pub normalize: bool,
}

// -----------------------------------------------------------------------------
// LeafError

/// An error produced by a leaf codec.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafError {
    /// The input's shape does not fit the leaf type at all.
    UnexpectedInput {
        expected: &'static str,
        received: &'static str,
    },
    /// A numeric literal outside the exact range of the target width.
    OutOfRange {
        type_path: &'static str,
        literal: String,
    },
    /// A number with a nonzero fractional part requested as an integer.
    Fractional {
        type_path: &'static str,
        literal: String,
    },
    /// Text that failed the leaf type's own parser.
    Malformed {
        type_path: &'static str,
        literal: String,
    },
    /// A non-finite float, which JSON cannot carry.
    NonFinite { type_path: &'static str },
}

impl fmt::Display for LeafError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedInput { expected, received } => {
                write!(f, "expected {expected}, received {received}")
            }
            Self::OutOfRange { type_path, literal } => {
                write!(f, "`{literal}` is out of range for `{type_path}`")
            }
            Self::Fractional { type_path, literal } => {
                write!(
                    f,
                    "`{literal}` has a fractional part and cannot become `{type_path}`"
                )
            }
            Self::Malformed { type_path, literal } => {
                write!(f, "`{literal}` is not a valid `{type_path}`")
            }
            Self::NonFinite { type_path } => {
                write!(f, "non-finite `{type_path}` value cannot be written as JSON")
            }
        }
    }
}

impl error::Error for LeafError {}

// -----------------------------------------------------------------------------
// LeafInfo

/// Codec vtable for one scalar type, a fixed leaf plug-in.
///
/// The engine treats leaves as opaque: parsing, formatting, and range
/// enforcement all live behind these function pointers. Key codecs are
/// optional; only types with one can serve as dictionary keys.
pub struct LeafInfo {
    ty: Type,
    parse: fn(ScalarInput<'_>) -> Result<Box<dyn Reflect>, LeafError>,
    format: fn(&dyn Reflect) -> Result<ScalarForm, LeafError>,
    key_encode: Option<fn(&dyn Reflect) -> Result<KeyForm, LeafError>>,
    key_decode: Option<fn(&str) -> Result<Box<dyn Reflect>, LeafError>>,
}

impl LeafInfo {
    /// Creates a new [`LeafInfo`] for `T` without a key codec.
    pub fn new<T: TypePath + 'static>(
        parse: fn(ScalarInput<'_>) -> Result<Box<dyn Reflect>, LeafError>,
        format: fn(&dyn Reflect) -> Result<ScalarForm, LeafError>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(),
            parse,
            format,
            key_encode: None,
            key_decode: None,
        }
    }

    /// Adds a key codec, making `T` usable as a dictionary key.
    pub fn with_key_codec(
        mut self,
        encode: fn(&dyn Reflect) -> Result<KeyForm, LeafError>,
        decode: fn(&str) -> Result<Box<dyn Reflect>, LeafError>,
    ) -> Self {
        self.key_encode = Some(encode);
        self.key_decode = Some(decode);
        self
    }

    /// Returns the [`Type`] identity.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// Parses a scalar input into a boxed value of this leaf type.
    #[inline]
    pub fn parse(&self, input: ScalarInput<'_>) -> Result<Box<dyn Reflect>, LeafError> {
        (self.parse)(input)
    }

    /// Formats a value of this leaf type into its scalar form.
    #[inline]
    pub fn format(&self, value: &dyn Reflect) -> Result<ScalarForm, LeafError> {
        (self.format)(value)
    }

    /// Renders a value of this leaf type as an object key, if supported.
    pub fn encode_key(&self, value: &dyn Reflect) -> Option<Result<KeyForm, LeafError>> {
        self.key_encode.map(|encode| encode(value))
    }

    /// Parses an object key into a value of this leaf type, if supported.
    pub fn decode_key(&self, text: &str) -> Option<Result<Box<dyn Reflect>, LeafError>> {
        self.key_decode.map(|decode| decode(text))
    }

    /// Whether this leaf can serve as a dictionary key.
    #[inline]
    pub fn has_key_codec(&self) -> bool {
        self.key_decode.is_some()
    }
}
