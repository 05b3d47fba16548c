//! Deserializer dispatch.
//!
//! Strategies are tried in list order (first match wins) and cached by
//! `(token kind, requested type)` once matched. The context handed to a
//! parser exposes the token stream, a recursive parse callback, and the
//! call-scoped reference table.

use std::sync::Arc;

use trellis_reflect::Reflect;
use trellis_reflect::info::TypeInfo;

use crate::engine::Engine;
use crate::error::DeserializeError;
use crate::meta::{
    GENERICS_KEY, ID_KEY, PendingCandidate, REF_KEY, ReadSession, TYPE_KEY, VALUES_KEY, WrapFn,
    is_metadata_key,
};
use crate::token::{Token, TokenKind, Tokenizer};

// -----------------------------------------------------------------------------
// Modules

pub(crate) mod parsers;

// -----------------------------------------------------------------------------
// ParseOutcome

/// A successfully parsed value, plus any forward references discovered
/// beneath it that are still waiting for their targets.
pub struct Resolved {
    pub value: Box<dyn Reflect>,
    /// Pending candidates, paths relative to `value`.
    pub pending: Vec<PendingCandidate>,
}

impl Resolved {
    /// A value with nothing pending.
    pub fn plain(value: Box<dyn Reflect>) -> Self {
        Self {
            value,
            pending: Vec::new(),
        }
    }
}

/// The result of one parse step: a value, or a deferred reference.
/// Exactly one of the two, never both.
pub enum ParseOutcome {
    Resolved(Resolved),
    /// A `$ref` to an id not yet registered. `wraps` rebuilds the slot's
    /// declared shape around the handle once the target registers.
    Deferred { awaited: u64, wraps: Vec<WrapFn> },
}

impl From<Resolved> for ParseOutcome {
    fn from(resolved: Resolved) -> Self {
        Self::Resolved(resolved)
    }
}

// -----------------------------------------------------------------------------
// TokenParser

/// A deserialization strategy for one (token kind, target type) family.
pub trait TokenParser: Send + Sync {
    /// The applicability predicate; consulted in list order, first match
    /// wins.
    fn accepts(&self, token: TokenKind, target: &'static TypeInfo) -> bool;

    /// Whether a match may be recorded in the dispatch cache.
    fn cacheable(&self) -> bool {
        true
    }

    /// Parses one value. `token` is the value's first token, already
    /// pulled from the stream.
    fn parse(
        &self,
        cx: &mut ParseCx<'_, '_>,
        token: Token<'_>,
        target: &'static TypeInfo,
    ) -> Result<ParseOutcome, DeserializeError>;
}

/// A polymorphic-switch strategy: takes over parsing of one concrete type
/// after the metadata section named it.
pub trait PolySwitch: Send + Sync {
    /// Parses the remainder of the body. The metadata section has been
    /// consumed (`meta`); `closed` reports whether the closing `}` was
    /// consumed with it.
    fn parse_body(
        &self,
        cx: &mut ParseCx<'_, '_>,
        meta: &MetaSection,
        concrete: &'static TypeInfo,
        closed: bool,
    ) -> Result<ParseOutcome, DeserializeError>;
}

// -----------------------------------------------------------------------------
// TokenCursor

/// The pull cursor over the token stream, with one token of lookahead.
pub struct TokenCursor<'src> {
    tokenizer: Tokenizer<'src>,
    peeked: Option<Token<'src>>,
}

impl<'src> TokenCursor<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            tokenizer: Tokenizer::new(input),
            peeked: None,
        }
    }

    /// Pulls the next token.
    pub fn next(&mut self) -> Result<Token<'src>, DeserializeError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => Ok(self.tokenizer.next_token()?),
        }
    }

    /// Peeks at the next token without consuming it.
    pub fn peek(&mut self) -> Result<&Token<'src>, DeserializeError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.tokenizer.next_token()?);
        }
        Ok(self.peeked.as_ref().expect("just peeked"))
    }

    /// Pulls the next token, failing unless it has the given kind.
    pub fn expect(
        &mut self,
        kind: TokenKind,
        expected: &'static str,
    ) -> Result<Token<'src>, DeserializeError> {
        let token = self.next()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(DeserializeError::Unexpected {
                expected,
                found: token.kind,
                pos: token.pos,
            })
        }
    }

    /// Whether only whitespace remains.
    pub fn at_end(&mut self) -> bool {
        self.peeked.is_none() && self.tokenizer.at_end()
    }

    /// Current byte position.
    pub fn position(&self) -> usize {
        match &self.peeked {
            Some(token) => token.pos,
            None => self.tokenizer.position(),
        }
    }
}

// -----------------------------------------------------------------------------
// ParseCx

/// The context a parser runs with.
pub struct ParseCx<'a, 'src> {
    pub(crate) engine: &'a Engine,
    pub(crate) cursor: &'a mut TokenCursor<'src>,
    pub(crate) session: &'a mut ReadSession,
}

impl<'src> ParseCx<'_, 'src> {
    /// The owning engine.
    pub fn engine(&self) -> &Engine {
        self.engine
    }

    /// The token cursor, for strategies that walk a body themselves.
    pub fn cursor(&mut self) -> &mut TokenCursor<'src> {
        &mut *self.cursor
    }

    /// Normalizes a document key with the engine's normalizer.
    pub fn normalize(&self, key: &str) -> String {
        self.engine.config().key_normalizer.normalize(key)
    }

    /// Pulls the next token and parses it against `target`.
    pub fn parse_next(
        &mut self,
        target: &'static TypeInfo,
    ) -> Result<ParseOutcome, DeserializeError> {
        let token = self.cursor.next()?;
        self.parse_token(token, target)
    }

    /// Dispatches one already-pulled token against `target`.
    pub fn parse_token(
        &mut self,
        token: Token<'_>,
        target: &'static TypeInfo,
    ) -> Result<ParseOutcome, DeserializeError> {
        let parser = self.engine.parser_for(token.kind, target)?;
        parser.parse(self, token, target)
    }

    /// Consumes the next complete value without interpreting it.
    pub fn skip_value(&mut self) -> Result<(), DeserializeError> {
        let token = self.cursor.next()?;
        match token.kind {
            TokenKind::BeginObject | TokenKind::BeginArray => {
                let mut depth = 1usize;
                while depth > 0 {
                    let token = self.cursor.next()?;
                    match token.kind {
                        TokenKind::BeginObject | TokenKind::BeginArray => depth += 1,
                        TokenKind::EndObject | TokenKind::EndArray => depth -= 1,
                        _ => {}
                    }
                }
                Ok(())
            }
            TokenKind::Str
            | TokenKind::SignedInt
            | TokenKind::UnsignedInt
            | TokenKind::Float
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => Ok(()),
            other => Err(DeserializeError::Unexpected {
                expected: "a value",
                found: other,
                pos: token.pos,
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Metadata section

/// The decoded leading metadata keys of a complex value.
#[derive(Default)]
pub struct MetaSection {
    pub ref_id: Option<u64>,
    pub id: Option<u64>,
    pub type_name: Option<String>,
    pub generics: Vec<String>,
    /// `$values` was consumed up to its `:`; the collection body is the
    /// next value on the stream.
    pub values_pending: bool,
}

/// Reads the metadata section after a consumed `{`.
///
/// Returns the section and whether the object's closing `}` was consumed
/// along the way (metadata-only bodies). Stops before the first
/// non-metadata key.
pub(crate) fn read_meta_section(
    cx: &mut ParseCx<'_, '_>,
) -> Result<(MetaSection, bool), DeserializeError> {
    let mut meta = MetaSection::default();

    loop {
        let next_is_meta = {
            let token = cx.cursor.peek()?;
            match token.kind {
                TokenKind::EndObject => {
                    cx.cursor.next()?;
                    return Ok((meta, true));
                }
                TokenKind::Key => is_metadata_key(token.text.as_ref()),
                other => {
                    let pos = token.pos;
                    return Err(DeserializeError::Unexpected {
                        expected: "object key or `}`",
                        found: other,
                        pos,
                    });
                }
            }
        };
        if !next_is_meta {
            return Ok((meta, false));
        }

        let key = cx.cursor.next()?;
        cx.cursor.expect(TokenKind::PairDelim, "`:`")?;

        match key.text.as_ref() {
            REF_KEY => meta.ref_id = Some(parse_object_id(cx)?),
            ID_KEY => meta.id = Some(parse_object_id(cx)?),
            TYPE_KEY => {
                let token = cx.cursor.expect(TokenKind::Str, "type name string")?;
                meta.type_name = Some(token.text.into_owned());
            }
            GENERICS_KEY => {
                cx.cursor.expect(TokenKind::BeginArray, "`[`")?;
                loop {
                    if cx.cursor.peek()?.kind == TokenKind::EndArray {
                        cx.cursor.next()?;
                        break;
                    }
                    let arg = cx.cursor.expect(TokenKind::Str, "type name string")?;
                    meta.generics.push(arg.text.into_owned());
                    if cx.cursor.peek()?.kind == TokenKind::ValueDelim {
                        cx.cursor.next()?;
                    }
                }
            }
            VALUES_KEY => {
                meta.values_pending = true;
                return Ok((meta, false));
            }
            _ => unreachable!("guarded by is_metadata_key"),
        }

        let separator = cx.cursor.next()?;
        match separator.kind {
            TokenKind::ValueDelim => {}
            TokenKind::EndObject => return Ok((meta, true)),
            other => {
                return Err(DeserializeError::Unexpected {
                    expected: "`,` or `}`",
                    found: other,
                    pos: separator.pos,
                });
            }
        }
    }
}

/// Object ids travel as strings (`"1"`) but bare integers are accepted.
fn parse_object_id(cx: &mut ParseCx<'_, '_>) -> Result<u64, DeserializeError> {
    let token = cx.cursor.next()?;
    let parsed = match token.kind {
        TokenKind::Str | TokenKind::UnsignedInt => token.text.parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or(DeserializeError::Unexpected {
        expected: "object id",
        found: token.kind,
        pos: token.pos,
    })
}

// -----------------------------------------------------------------------------
// Default strategy list

/// The built-in parsers, in dispatch order.
pub(crate) fn default_parsers() -> Vec<Arc<dyn TokenParser>> {
    vec![
        Arc::new(parsers::OptionalParser),
        Arc::new(parsers::SharedParser),
        Arc::new(parsers::DynamicParser),
        Arc::new(parsers::LeafParser),
        Arc::new(parsers::EnumParser),
        Arc::new(parsers::ListParser),
        Arc::new(parsers::MapParser),
        Arc::new(parsers::ComplexParser),
    ]
}
