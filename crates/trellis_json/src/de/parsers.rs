//! The built-in token parsers.
//!
//! The complex-object parser owns the hardest logic: the metadata
//! section, slot resolution, constructor selection, leftover injection,
//! and the deferred-reference bookkeeping.

use hashbrown::{HashMap, HashSet};

use trellis_reflect::Reflect;
use trellis_reflect::info::{
    DynamicTyped, ListInfo, MapInfo, NumberKind, NumberLiteral, ScalarInput, StructInfo, TypeInfo,
};
use trellis_reflect::ops::{ReflectMut, ReflectRef, ReflectShared, SlotError};
use trellis_reflect::registry::TypeTraitDefault;

use crate::config::UnknownKeys;
use crate::de::{MetaSection, ParseCx, ParseOutcome, Resolved, TokenParser, read_meta_section};
use crate::describe::{BagArgs, Injectable};
use crate::error::DeserializeError;
use crate::meta::{PathStep, PendingCandidate, REF_KEY, VALUES_KEY, inject_by_path};
use crate::token::{Token, TokenKind};

fn is_scalar_token(token: TokenKind) -> bool {
    matches!(
        token,
        TokenKind::Str
            | TokenKind::SignedInt
            | TokenKind::UnsignedInt
            | TokenKind::Float
            | TokenKind::True
            | TokenKind::False
    )
}

// -----------------------------------------------------------------------------
// LeafParser

/// Scalars through the leaf codecs.
pub(crate) struct LeafParser;

impl TokenParser for LeafParser {
    fn accepts(&self, token: TokenKind, target: &'static TypeInfo) -> bool {
        is_scalar_token(token) && target.as_leaf().is_some()
    }

    fn parse(
        &self,
        _cx: &mut ParseCx<'_, '_>,
        token: Token<'_>,
        target: &'static TypeInfo,
    ) -> Result<ParseOutcome, DeserializeError> {
        let leaf = target.as_leaf().expect("accepted leaf target");
        let input = match token.kind {
            TokenKind::Str => ScalarInput::Text(&token.text),
            TokenKind::True => ScalarInput::Bool(true),
            TokenKind::False => ScalarInput::Bool(false),
            TokenKind::SignedInt => ScalarInput::Number(NumberLiteral {
                text: &token.text,
                kind: NumberKind::Signed,
            }),
            TokenKind::UnsignedInt => ScalarInput::Number(NumberLiteral {
                text: &token.text,
                kind: NumberKind::Unsigned,
            }),
            TokenKind::Float => ScalarInput::Number(NumberLiteral {
                text: &token.text,
                kind: NumberKind::Float,
            }),
            _ => unreachable!("accepted scalar token"),
        };
        let value = leaf.parse(input).map_err(|source| DeserializeError::Leaf {
            type_path: target.type_path(),
            source,
        })?;
        Ok(Resolved::plain(value).into())
    }
}

// -----------------------------------------------------------------------------
// EnumParser

/// Fieldless enums by variant name.
pub(crate) struct EnumParser;

impl TokenParser for EnumParser {
    fn accepts(&self, token: TokenKind, target: &'static TypeInfo) -> bool {
        token == TokenKind::Str && target.as_enum().is_some()
    }

    fn parse(
        &self,
        _cx: &mut ParseCx<'_, '_>,
        token: Token<'_>,
        target: &'static TypeInfo,
    ) -> Result<ParseOutcome, DeserializeError> {
        let info = target.as_enum().expect("accepted enum target");
        match info.from_name(&token.text) {
            Some(value) => Ok(Resolved::plain(value).into()),
            None => Err(DeserializeError::UnknownVariant {
                type_path: target.type_path(),
                variant: token.text.into_owned(),
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// OptionalParser

/// `null` to `None`, anything else to a wrapped inner value.
pub(crate) struct OptionalParser;

impl TokenParser for OptionalParser {
    fn accepts(&self, _token: TokenKind, target: &'static TypeInfo) -> bool {
        target.as_optional().is_some()
    }

    fn parse(
        &self,
        cx: &mut ParseCx<'_, '_>,
        token: Token<'_>,
        target: &'static TypeInfo,
    ) -> Result<ParseOutcome, DeserializeError> {
        let info = target.as_optional().expect("accepted optional target");
        if token.kind == TokenKind::Null {
            return Ok(Resolved::plain(info.make_none()).into());
        }
        match cx.parse_token(token, info.inner())? {
            ParseOutcome::Resolved(resolved) => {
                let value = info
                    .wrap(resolved.value)
                    .map_err(|source| DeserializeError::Inject {
                        type_path: target.type_path(),
                        source,
                    })?;
                Ok(ParseOutcome::Resolved(Resolved {
                    value,
                    pending: resolved.pending,
                }))
            }
            ParseOutcome::Deferred { awaited, mut wraps } => {
                wraps.push(info.wrap_fn());
                Ok(ParseOutcome::Deferred { awaited, wraps })
            }
        }
    }
}

// -----------------------------------------------------------------------------
// ListParser

/// Bare arrays into list destinations.
pub(crate) struct ListParser;

impl TokenParser for ListParser {
    fn accepts(&self, token: TokenKind, target: &'static TypeInfo) -> bool {
        token == TokenKind::BeginArray && target.as_list().is_some()
    }

    fn parse(
        &self,
        cx: &mut ParseCx<'_, '_>,
        _token: Token<'_>,
        target: &'static TypeInfo,
    ) -> Result<ParseOutcome, DeserializeError> {
        let info = target.as_list().expect("accepted list target");
        parse_list_body(cx, info).map(Into::into)
    }
}

/// Parses array elements after a consumed `[`.
pub(crate) fn parse_list_body(
    cx: &mut ParseCx<'_, '_>,
    info: &'static ListInfo,
) -> Result<Resolved, DeserializeError> {
    let type_path = info.ty().path();
    let element_info = info.element();
    let mut list = cx
        .engine
        .make_container(info.ty().id(), || info.make());
    let mut pending = Vec::new();

    loop {
        if cx.cursor.peek()?.kind == TokenKind::EndArray {
            cx.cursor.next()?;
            break;
        }
        let index = match list.reflect_ref() {
            ReflectRef::List(list) => list.element_len(),
            _ => unreachable!("list factory built a list"),
        };
        let token = cx.cursor.next()?;
        match cx.parse_token(token, element_info)? {
            ParseOutcome::Resolved(resolved) => {
                for mut candidate in resolved.pending {
                    candidate.path.push(PathStep::Index(index));
                    pending.push(candidate);
                }
                match list.reflect_mut() {
                    ReflectMut::List(list) => list.push_element(resolved.value).map_err(
                        |source| DeserializeError::Inject { type_path, source },
                    )?,
                    _ => unreachable!("list factory built a list"),
                }
            }
            // A placeholder element cannot exist, so collection elements
            // never defer.
            ParseOutcome::Deferred { awaited, .. } => {
                return Err(DeserializeError::UndeferrableForward { id: awaited });
            }
        }

        let separator = cx.cursor.next()?;
        match separator.kind {
            TokenKind::ValueDelim => {}
            TokenKind::EndArray => break,
            other => {
                return Err(DeserializeError::Unexpected {
                    expected: "`,` or `]`",
                    found: other,
                    pos: separator.pos,
                });
            }
        }
    }

    Ok(Resolved { value: list, pending })
}

// -----------------------------------------------------------------------------
// MapParser

/// Object-shaped documents into keyed collections.
pub(crate) struct MapParser;

impl TokenParser for MapParser {
    fn accepts(&self, token: TokenKind, target: &'static TypeInfo) -> bool {
        token == TokenKind::BeginObject && target.as_map().is_some()
    }

    fn parse(
        &self,
        cx: &mut ParseCx<'_, '_>,
        _token: Token<'_>,
        target: &'static TypeInfo,
    ) -> Result<ParseOutcome, DeserializeError> {
        let info = target.as_map().expect("accepted map target");
        let (meta, closed) = read_meta_section(cx)?;
        if meta.ref_id.is_some() {
            return Err(DeserializeError::UnexpectedMetadata { key: REF_KEY });
        }
        if meta.values_pending {
            return Err(DeserializeError::UnexpectedMetadata { key: VALUES_KEY });
        }
        // A stamped `$id` on a plain map is consumed and discarded;
        // nothing can reference a value type.
        parse_map_body(cx, info, closed).map(Into::into)
    }
}

/// Parses map entries after the metadata section.
pub(crate) fn parse_map_body(
    cx: &mut ParseCx<'_, '_>,
    info: &'static MapInfo,
    closed: bool,
) -> Result<Resolved, DeserializeError> {
    let type_path = info.ty().path();
    let key_info = info.key();
    let key_leaf = key_info
        .as_leaf()
        .filter(|leaf| leaf.has_key_codec())
        .ok_or(DeserializeError::UnsupportedKey {
            type_path: key_info.type_path(),
        })?;
    let value_info = info.value();
    let mut map = cx
        .engine
        .make_container(info.ty().id(), || info.make());

    if !closed {
        loop {
            let token = cx.cursor.next()?;
            match token.kind {
                TokenKind::EndObject => break,
                TokenKind::Key => {
                    let key = key_leaf
                        .decode_key(&token.text)
                        .expect("key codec checked above")
                        .map_err(|source| DeserializeError::Leaf {
                            type_path: key_info.type_path(),
                            source,
                        })?;
                    cx.cursor.expect(TokenKind::PairDelim, "`:`")?;
                    match cx.parse_next(value_info)? {
                        ParseOutcome::Resolved(resolved) => {
                            if let Some(candidate) = resolved.pending.first() {
                                return Err(DeserializeError::UndeferrableForward {
                                    id: candidate.awaited,
                                });
                            }
                            match map.reflect_mut() {
                                ReflectMut::Map(map) => map
                                    .insert_entry(key, resolved.value)
                                    .map_err(|source| DeserializeError::Inject {
                                        type_path,
                                        source,
                                    })?,
                                _ => unreachable!("map factory built a map"),
                            }
                        }
                        ParseOutcome::Deferred { awaited, .. } => {
                            return Err(DeserializeError::UndeferrableForward { id: awaited });
                        }
                    }

                    let separator = cx.cursor.next()?;
                    match separator.kind {
                        TokenKind::ValueDelim => {}
                        TokenKind::EndObject => break,
                        other => {
                            return Err(DeserializeError::Unexpected {
                                expected: "`,` or `}`",
                                found: other,
                                pos: separator.pos,
                            });
                        }
                    }
                }
                other => {
                    return Err(DeserializeError::Unexpected {
                        expected: "object key or `}`",
                        found: other,
                        pos: token.pos,
                    });
                }
            }
        }
    }

    Ok(Resolved::plain(map))
}

// -----------------------------------------------------------------------------
// ComplexParser

/// The struct parser: metadata, slots, constructors, injection.
pub(crate) struct ComplexParser;

impl TokenParser for ComplexParser {
    fn accepts(&self, token: TokenKind, target: &'static TypeInfo) -> bool {
        token == TokenKind::BeginObject && target.as_struct().is_some()
    }

    fn parse(
        &self,
        cx: &mut ParseCx<'_, '_>,
        _token: Token<'_>,
        target: &'static TypeInfo,
    ) -> Result<ParseOutcome, DeserializeError> {
        let (meta, closed) = read_meta_section(cx)?;
        if meta.ref_id.is_some() {
            // Identity lives on `Shared` slots; a plain value cannot be
            // substituted by reference.
            return Err(DeserializeError::UnexpectedMetadata { key: REF_KEY });
        }
        if meta.values_pending {
            return Err(DeserializeError::UnexpectedMetadata { key: VALUES_KEY });
        }

        let (concrete, switch) = resolve_concrete(cx, &meta, target)?;
        if let Some(switch) = switch {
            return switch.parse_body(cx, &meta, concrete, closed);
        }
        let info = concrete.as_struct().expect("resolved struct type");
        parse_struct_body(cx, info, closed).map(Into::into)
    }
}

/// Resolves the metadata section's discriminator against the requested
/// type, honoring registered polymorphic switches.
pub(crate) fn resolve_concrete(
    cx: &ParseCx<'_, '_>,
    meta: &MetaSection,
    requested: &'static TypeInfo,
) -> Result<
    (
        &'static TypeInfo,
        Option<std::sync::Arc<dyn crate::de::PolySwitch>>,
    ),
    DeserializeError,
> {
    if !cx.engine.config().read_type_metadata {
        return Ok((requested, None));
    }
    let Some(name) = &meta.type_name else {
        return Ok((requested, None));
    };

    let concrete = cx.engine.resolve_type_name(name, &meta.generics)?;
    if concrete.type_id() == requested.type_id() {
        Ok((concrete, None))
    } else if let Some(switch) = cx.engine.poly_switch_for(concrete.type_id()) {
        Ok((concrete, Some(switch)))
    } else {
        Err(DeserializeError::TypeMismatch {
            requested: requested.type_path(),
            found: concrete.type_path(),
        })
    }
}

/// Parses member pairs after the metadata section, then constructs and
/// populates the value.
pub(crate) fn parse_struct_body(
    cx: &mut ParseCx<'_, '_>,
    info: &'static StructInfo,
    closed: bool,
) -> Result<Resolved, DeserializeError> {
    let type_path = info.ty().path();
    let desc = cx.engine.creation_for(info)?;
    let mut bag: HashMap<String, Injectable> = HashMap::new();
    let mut pending: Vec<PendingCandidate> = Vec::new();

    // Collect member values, resolving each key against a slot.
    if !closed {
        loop {
            let token = cx.cursor.next()?;
            match token.kind {
                TokenKind::EndObject => break,
                TokenKind::Key => {
                    let raw_key = token.text;
                    cx.cursor.expect(TokenKind::PairDelim, "`:`")?;
                    let normalized = cx.normalize(&raw_key);

                    match desc.slots.get(normalized.as_str()) {
                        None => match cx.engine.config().unknown_keys {
                            UnknownKeys::Error => {
                                return Err(DeserializeError::UnknownKey {
                                    key: raw_key.into_owned(),
                                    type_path,
                                });
                            }
                            UnknownKeys::Skip => cx.skip_value()?,
                        },
                        Some(slot) => {
                            let field = slot.field;
                            match cx.parse_next(field.type_info())? {
                                ParseOutcome::Resolved(resolved) => {
                                    for mut candidate in resolved.pending {
                                        candidate.path.push(PathStep::Field(field.name()));
                                        pending.push(candidate);
                                    }
                                    bag.insert(
                                        normalized,
                                        Injectable {
                                            value: Some(resolved.value),
                                        },
                                    );
                                }
                                ParseOutcome::Deferred { awaited, wraps } => {
                                    // A deferred reference needs a settable
                                    // slot to patch later.
                                    if field.is_readonly() {
                                        return Err(DeserializeError::Inject {
                                            type_path,
                                            source: SlotError::ReadOnly {
                                                field: field.name(),
                                            },
                                        });
                                    }
                                    pending.push(PendingCandidate {
                                        path: vec![PathStep::Field(field.name())],
                                        wraps,
                                        awaited,
                                    });
                                }
                            }
                        }
                    }

                    let separator = cx.cursor.next()?;
                    match separator.kind {
                        TokenKind::ValueDelim => {}
                        TokenKind::EndObject => break,
                        other => {
                            return Err(DeserializeError::Unexpected {
                                expected: "`,` or `}`",
                                found: other,
                                pos: separator.pos,
                            });
                        }
                    }
                }
                other => {
                    return Err(DeserializeError::Unexpected {
                        expected: "object key or `}`",
                        found: other,
                        pos: token.pos,
                    });
                }
            }
        }
    }

    // Select the richest satisfiable constructor; declaration order
    // breaks ties.
    let available: HashSet<String> = bag.keys().cloned().collect();
    let mut value: Box<dyn Reflect> = match desc.select_constructor(&available) {
        Some(ctor) => ctor
            .info
            .invoke(&mut BagArgs {
                bag: &mut bag,
                desc: &desc,
            })
            .map_err(|source| DeserializeError::Construct { type_path, source })?,
        None => {
            let registry = cx.engine.registry().read();
            match registry.get_type_trait::<TypeTraitDefault>(info.ty().id()) {
                Some(default) => default.default(),
                None => return Err(DeserializeError::NoConstructor { type_path }),
            }
        }
    };

    // Inject leftover members the constructor did not consume.
    for (normalized, injectable) in bag.iter_mut() {
        let Some(member) = injectable.value.take() else {
            continue;
        };
        let slot = &desc.slots[normalized.as_str()];
        if slot.field.is_readonly() {
            return Err(DeserializeError::ReadOnlyLeftover {
                type_path,
                slot: slot.field.name(),
            });
        }
        match value.reflect_mut() {
            ReflectMut::Struct(strct) => strct
                .set_field(slot.field.name(), member)
                .map_err(|source| DeserializeError::Inject { type_path, source })?,
            _ => unreachable!("struct descriptions construct structs"),
        }
    }

    // Inject candidates whose targets have registered since; the rest
    // bubble up with the value.
    let mut still_pending = Vec::new();
    for candidate in pending {
        match cx.session.resolve(&candidate)? {
            Some(resolved) => inject_by_path(&mut *value, &candidate.path, resolved)?,
            None => still_pending.push(candidate),
        }
    }

    Ok(Resolved {
        value,
        pending: still_pending,
    })
}

// -----------------------------------------------------------------------------
// DynamicParser

/// Dynamic slots: the discriminator decides the concrete type.
pub(crate) struct DynamicParser;

impl TokenParser for DynamicParser {
    fn accepts(&self, token: TokenKind, target: &'static TypeInfo) -> bool {
        token == TokenKind::BeginObject && target.as_dynamic().is_some()
    }

    fn parse(
        &self,
        cx: &mut ParseCx<'_, '_>,
        _token: Token<'_>,
        target: &'static TypeInfo,
    ) -> Result<ParseOutcome, DeserializeError> {
        let (meta, closed) = read_meta_section(cx)?;
        if meta.ref_id.is_some() {
            return Err(DeserializeError::UnexpectedMetadata { key: REF_KEY });
        }
        parse_dynamic_body(cx, &meta, target, closed).map(Into::into)
    }
}

/// Parses a discriminated body and wraps it into the dynamic slot type.
pub(crate) fn parse_dynamic_body(
    cx: &mut ParseCx<'_, '_>,
    meta: &MetaSection,
    target: &'static TypeInfo,
    closed: bool,
) -> Result<Resolved, DeserializeError> {
    let dynamic = target.as_dynamic().expect("dynamic target");
    if !cx.engine.config().read_type_metadata {
        return Err(DeserializeError::MissingDiscriminator);
    }
    let Some(name) = &meta.type_name else {
        return Err(DeserializeError::MissingDiscriminator);
    };
    let concrete = cx.engine.resolve_type_name(name, &meta.generics)?;

    let resolved = if let Some(switch) = cx.engine.poly_switch_for(concrete.type_id()) {
        match switch.parse_body(cx, meta, concrete, closed)? {
            ParseOutcome::Resolved(resolved) => resolved,
            ParseOutcome::Deferred { awaited, .. } => {
                return Err(DeserializeError::UndeferrableForward { id: awaited });
            }
        }
    } else {
        let info = concrete
            .as_struct()
            .ok_or(DeserializeError::TypeMismatch {
                requested: target.type_path(),
                found: concrete.type_path(),
            })?;
        parse_struct_body(cx, info, closed)?
    };

    Ok(Resolved {
        value: dynamic.wrap(resolved.value),
        pending: resolved.pending,
    })
}

// -----------------------------------------------------------------------------
// SharedParser

/// Identity handles: `$ref` substitution, `$id` registration, deferred
/// forward references.
pub(crate) struct SharedParser;

impl TokenParser for SharedParser {
    fn accepts(&self, _token: TokenKind, target: &'static TypeInfo) -> bool {
        target.as_shared().is_some()
    }

    fn parse(
        &self,
        cx: &mut ParseCx<'_, '_>,
        token: Token<'_>,
        target: &'static TypeInfo,
    ) -> Result<ParseOutcome, DeserializeError> {
        let shared_info = target.as_shared().expect("accepted shared target");
        let inner_info = shared_info.inner();

        match token.kind {
            TokenKind::BeginObject => {
                let (meta, closed) = read_meta_section(cx)?;

                if let Some(awaited) = meta.ref_id {
                    if !closed {
                        cx.cursor.expect(TokenKind::EndObject, "`}` after `$ref`")?;
                    }
                    return match cx.session.lookup(awaited) {
                        Some(handle) => {
                            if handle.as_any().type_id() != target.type_id() {
                                return Err(DeserializeError::TypeMismatch {
                                    requested: target.type_path(),
                                    found: handle.reflect_type_info().type_path(),
                                });
                            }
                            Ok(Resolved::plain(handle).into())
                        }
                        None => Ok(ParseOutcome::Deferred {
                            awaited,
                            wraps: Vec::new(),
                        }),
                    };
                }

                let resolved = match inner_info {
                    TypeInfo::Struct(_) => {
                        let (concrete, switch) = resolve_concrete(cx, &meta, inner_info)?;
                        if let Some(switch) = switch {
                            match switch.parse_body(cx, &meta, concrete, closed)? {
                                ParseOutcome::Resolved(resolved) => resolved,
                                ParseOutcome::Deferred { awaited, .. } => {
                                    return Err(DeserializeError::UndeferrableForward {
                                        id: awaited,
                                    });
                                }
                            }
                        } else {
                            let info = concrete.as_struct().expect("resolved struct type");
                            parse_struct_body(cx, info, closed)?
                        }
                    }
                    TypeInfo::Dynamic(_) => parse_dynamic_body(cx, &meta, inner_info, closed)?,
                    TypeInfo::Map(map_info) => parse_map_body(cx, map_info, closed)?,
                    TypeInfo::List(list_info) => {
                        // Arrays with identity travel in a `$values`
                        // envelope.
                        if !meta.values_pending {
                            let pos = cx.cursor.position();
                            return Err(DeserializeError::Unexpected {
                                expected: "`$values`",
                                found: if closed {
                                    TokenKind::EndObject
                                } else {
                                    TokenKind::Key
                                },
                                pos,
                            });
                        }
                        cx.cursor.expect(TokenKind::BeginArray, "`[`")?;
                        let resolved = parse_list_body(cx, list_info)?;
                        cx.cursor
                            .expect(TokenKind::EndObject, "`}` closing the envelope")?;
                        resolved
                    }
                    _ => {
                        let pos = cx.cursor.position();
                        return Err(DeserializeError::Unexpected {
                            expected: "a scalar shared value",
                            found: TokenKind::BeginObject,
                            pos,
                        });
                    }
                };

                finish_shared(cx, target, resolved, meta.id)
            }
            TokenKind::BeginArray => {
                let list_info = inner_info.as_list().ok_or(DeserializeError::NoParser {
                    token: TokenKind::BeginArray,
                    type_path: target.type_path(),
                })?;
                let resolved = parse_list_body(cx, list_info)?;
                finish_shared(cx, target, resolved, None)
            }
            kind if is_scalar_token(kind) || kind == TokenKind::Null => {
                match cx.parse_token(token, inner_info)? {
                    ParseOutcome::Resolved(resolved) => finish_shared(cx, target, resolved, None),
                    ParseOutcome::Deferred { awaited, .. } => {
                        Err(DeserializeError::UndeferrableForward { id: awaited })
                    }
                }
            }
            other => Err(DeserializeError::NoParser {
                token: other,
                type_path: target.type_path(),
            }),
        }
    }
}

/// Wraps a parsed inner value into its handle, registers identity, and
/// settles the deferred references collected beneath it.
fn finish_shared(
    cx: &mut ParseCx<'_, '_>,
    target: &'static TypeInfo,
    resolved: Resolved,
    id: Option<u64>,
) -> Result<ParseOutcome, DeserializeError> {
    let shared_info = target.as_shared().expect("shared target");
    let handle = shared_info
        .wrap(resolved.value)
        .map_err(|source| DeserializeError::Inject {
            type_path: target.type_path(),
            source,
        })?;
    let shared: &dyn ReflectShared = match handle.reflect_ref() {
        ReflectRef::Shared(shared) => shared,
        _ => unreachable!("shared info wraps into a handle"),
    };

    // Register before settling candidates, so a self-cycle resolves
    // immediately.
    if let Some(id) = id {
        cx.session.register(id, shared)?;
    }

    for candidate in resolved.pending {
        match cx.session.resolve(&candidate)? {
            Some(value) => {
                inject_by_path(&mut *shared.borrow_inner_mut(), &candidate.path, value)?;
            }
            None => {
                let owner = shared.clone_handle();
                cx.session.add_patch(owner, candidate);
            }
        }
    }

    Ok(Resolved::plain(handle).into())
}
