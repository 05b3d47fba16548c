//! The built-in writer instructors.

use trellis_reflect::Reflect;
use trellis_reflect::info::{DynamicTyped, ScalarForm, TypeInfo};
use trellis_reflect::ops::{ReflectList, ReflectMap, ReflectRef, ReflectStruct};

use crate::config::TypeMetadataMode;
use crate::describe::ValueReader;
use crate::engine::Engine;
use crate::error::SerializeError;
use crate::meta::{ID_KEY, REF_KEY, RefDecision, TYPE_KEY, VALUES_KEY, wants_discriminator};
use crate::ser::{WriteCx, WriteInstructor};

// -----------------------------------------------------------------------------
// Shared body writers

/// The leading metadata of one complex body.
pub(crate) struct MetaHeader {
    pub id: Option<u64>,
    pub type_name: Option<String>,
}

/// Writes an object body: metadata keys first, then each member through
/// its value reader, comma-separating all but the last.
pub(crate) fn write_struct_body(
    cx: &mut WriteCx<'_>,
    strct: &dyn ReflectStruct,
    readers: &[ValueReader],
    header: MetaHeader,
) -> Result<(), SerializeError> {
    cx.writer.begin_object()?;
    let mut first = true;

    if let Some(id) = header.id {
        cx.writer.key(ID_KEY, false)?;
        cx.writer.pair_delimiter()?;
        cx.writer.string(&id.to_string())?;
        first = false;
    }
    if let Some(type_name) = &header.type_name {
        if !first {
            cx.writer.value_delimiter()?;
        }
        cx.writer.key(TYPE_KEY, false)?;
        cx.writer.pair_delimiter()?;
        cx.writer.string(type_name)?;
        first = false;
    }

    for reader in readers {
        if !first {
            cx.writer.value_delimiter()?;
        }
        first = false;
        cx.writer.key(reader.wire_name, true)?;
        cx.writer.pair_delimiter()?;
        let member = strct
            .field(reader.field_name)
            .expect("value readers name existing fields");
        cx.write_value(member)?;
    }

    cx.writer.end_object()
}

/// Writes a bare array body.
pub(crate) fn write_list_body(
    cx: &mut WriteCx<'_>,
    list: &dyn ReflectList,
) -> Result<(), SerializeError> {
    cx.writer.begin_array()?;
    for index in 0..list.element_len() {
        if index > 0 {
            cx.writer.value_delimiter()?;
        }
        let element = list.element(index).expect("indexed within len");
        cx.write_value(element)?;
    }
    cx.writer.end_array()
}

/// Writes a map as an object, keys through the leaf key codecs.
pub(crate) fn write_map_body(
    cx: &mut WriteCx<'_>,
    map: &dyn ReflectMap,
    id: Option<u64>,
) -> Result<(), SerializeError> {
    cx.writer.begin_object()?;
    let mut first = true;

    if let Some(id) = id {
        cx.writer.key(ID_KEY, false)?;
        cx.writer.pair_delimiter()?;
        cx.writer.string(&id.to_string())?;
        first = false;
    }

    for index in 0..map.entry_len() {
        let (key, value) = map.entry_at(index).expect("indexed within len");
        if !first {
            cx.writer.value_delimiter()?;
        }
        first = false;

        let key_info = key.reflect_type_info();
        let leaf = key_info
            .as_leaf()
            .ok_or(SerializeError::UnsupportedKey {
                type_path: key_info.type_path(),
            })?;
        match leaf.encode_key(key) {
            Some(form) => {
                let form = form.map_err(|source| SerializeError::Leaf {
                    type_path: key_info.type_path(),
                    source,
                })?;
                cx.writer.key(&form.text, form.normalize)?;
            }
            // No key codec: fall back to the scalar's default string
            // form.
            None => {
                let form = leaf.format(key).map_err(|source| SerializeError::Leaf {
                    type_path: key_info.type_path(),
                    source,
                })?;
                let text = match form {
                    ScalarForm::Text(text) | ScalarForm::Number(text) => text,
                    ScalarForm::Bool(value) => value.to_string(),
                };
                cx.writer.key(&text, false)?;
            }
        }
        cx.writer.pair_delimiter()?;
        cx.write_value(value)?;
    }

    cx.writer.end_object()
}

// -----------------------------------------------------------------------------
// Leaf / enum / optional

/// Scalars through the leaf codecs.
pub(crate) struct LeafInstructor;

impl WriteInstructor for LeafInstructor {
    fn accepts(&self, info: &'static TypeInfo, _engine: &Engine) -> bool {
        info.as_leaf().is_some()
    }

    fn write(
        &self,
        cx: &mut WriteCx<'_>,
        value: &dyn Reflect,
        info: &'static TypeInfo,
    ) -> Result<(), SerializeError> {
        let leaf = info.as_leaf().expect("accepted leaf value");
        let form = leaf.format(value).map_err(|source| SerializeError::Leaf {
            type_path: info.type_path(),
            source,
        })?;
        match form {
            ScalarForm::Bool(true) => cx.writer.primitive("true"),
            ScalarForm::Bool(false) => cx.writer.primitive("false"),
            ScalarForm::Number(text) => cx.writer.primitive(&text),
            ScalarForm::Text(text) => cx.writer.string(&text),
        }
    }
}

/// Fieldless enums as their variant name.
pub(crate) struct EnumInstructor;

impl WriteInstructor for EnumInstructor {
    fn accepts(&self, info: &'static TypeInfo, _engine: &Engine) -> bool {
        info.as_enum().is_some()
    }

    fn write(
        &self,
        cx: &mut WriteCx<'_>,
        value: &dyn Reflect,
        _info: &'static TypeInfo,
    ) -> Result<(), SerializeError> {
        match value.reflect_ref() {
            ReflectRef::Enum(value) => cx.writer.string(value.variant_name()),
            _ => unreachable!("accepted enum value"),
        }
    }
}

/// `None` as null, `Some` transparently.
pub(crate) struct OptionalInstructor;

impl WriteInstructor for OptionalInstructor {
    fn accepts(&self, info: &'static TypeInfo, _engine: &Engine) -> bool {
        info.as_optional().is_some()
    }

    fn write(
        &self,
        cx: &mut WriteCx<'_>,
        value: &dyn Reflect,
        _info: &'static TypeInfo,
    ) -> Result<(), SerializeError> {
        match value.reflect_ref() {
            ReflectRef::Optional(optional) => match optional.inner() {
                Some(inner) => cx.write_value(inner),
                None => cx.writer.null(),
            },
            _ => unreachable!("accepted optional value"),
        }
    }
}

// -----------------------------------------------------------------------------
// Containers

/// Bare arrays.
pub(crate) struct ListInstructor;

impl WriteInstructor for ListInstructor {
    fn accepts(&self, info: &'static TypeInfo, _engine: &Engine) -> bool {
        info.as_list().is_some()
    }

    fn write(
        &self,
        cx: &mut WriteCx<'_>,
        value: &dyn Reflect,
        _info: &'static TypeInfo,
    ) -> Result<(), SerializeError> {
        match value.reflect_ref() {
            ReflectRef::List(list) => write_list_body(cx, list),
            _ => unreachable!("accepted list value"),
        }
    }
}

/// Dictionaries, stamped with an id while preservation is on.
pub(crate) struct MapInstructor;

impl WriteInstructor for MapInstructor {
    fn accepts(&self, info: &'static TypeInfo, _engine: &Engine) -> bool {
        info.as_map().is_some()
    }

    fn write(
        &self,
        cx: &mut WriteCx<'_>,
        value: &dyn Reflect,
        _info: &'static TypeInfo,
    ) -> Result<(), SerializeError> {
        let id = cx
            .engine
            .config()
            .preserve_references
            .then(|| cx.session.fresh_id());
        match value.reflect_ref() {
            ReflectRef::Map(map) => write_map_body(cx, map, id),
            _ => unreachable!("accepted map value"),
        }
    }
}

// -----------------------------------------------------------------------------
// Complex / rule

/// The generic complex-object instructor.
pub(crate) struct ComplexInstructor;

impl WriteInstructor for ComplexInstructor {
    fn accepts(&self, info: &'static TypeInfo, _engine: &Engine) -> bool {
        info.as_struct().is_some()
    }

    fn write(
        &self,
        cx: &mut WriteCx<'_>,
        value: &dyn Reflect,
        info: &'static TypeInfo,
    ) -> Result<(), SerializeError> {
        let strct = match value.reflect_ref() {
            ReflectRef::Struct(strct) => strct,
            _ => unreachable!("accepted struct value"),
        };
        let readers = cx.engine.readers_for(info.as_struct().expect("struct info"));
        let header = plain_header(cx, info);
        write_struct_body(cx, strct, &readers, header)
    }
}

/// A user rule: the pre-filtered reader list for one type.
pub(crate) struct RuleInstructor;

impl WriteInstructor for RuleInstructor {
    fn accepts(&self, info: &'static TypeInfo, engine: &Engine) -> bool {
        info.as_struct().is_some() && engine.has_rule(info.type_id())
    }

    fn write(
        &self,
        cx: &mut WriteCx<'_>,
        value: &dyn Reflect,
        info: &'static TypeInfo,
    ) -> Result<(), SerializeError> {
        let strct = match value.reflect_ref() {
            ReflectRef::Struct(strct) => strct,
            _ => unreachable!("accepted struct value"),
        };
        let readers = cx
            .engine
            .effective_readers(info.as_struct().expect("struct info"));
        let header = plain_header(cx, info);
        write_struct_body(cx, strct, &readers, header)
    }
}

fn plain_header(cx: &mut WriteCx<'_>, info: &'static TypeInfo) -> MetaHeader {
    let config = cx.engine.config();
    let id = config.preserve_references.then(|| cx.session.fresh_id());
    let type_name = wants_discriminator(config.type_metadata, false, info)
        .then(|| cx.engine.type_name_for(info));
    MetaHeader { id, type_name }
}

// -----------------------------------------------------------------------------
// Dynamic

/// Dynamic slots: unwrap and force a discriminator onto the payload.
pub(crate) struct DynamicInstructor;

impl WriteInstructor for DynamicInstructor {
    fn accepts(&self, info: &'static TypeInfo, _engine: &Engine) -> bool {
        info.as_dynamic().is_some()
    }

    fn write(
        &self,
        cx: &mut WriteCx<'_>,
        value: &dyn Reflect,
        _info: &'static TypeInfo,
    ) -> Result<(), SerializeError> {
        let payload = match value.reflect_ref() {
            ReflectRef::Dynamic(payload) => payload,
            _ => unreachable!("accepted dynamic value"),
        };
        let payload_info = payload.reflect_type_info();
        write_discriminated(cx, payload, payload_info, None)
    }
}

/// Writes a payload whose concrete type must travel with it.
fn write_discriminated(
    cx: &mut WriteCx<'_>,
    payload: &dyn Reflect,
    payload_info: &'static TypeInfo,
    id_override: Option<u64>,
) -> Result<(), SerializeError> {
    let strct = match payload.reflect_ref() {
        ReflectRef::Struct(strct) => strct,
        _ => {
            return Err(SerializeError::UnsupportedDynamic {
                type_path: payload_info.type_path(),
            });
        }
    };
    let config = cx.engine.config();
    let id = id_override.or_else(|| config.preserve_references.then(|| cx.session.fresh_id()));
    let type_name = (config.type_metadata != TypeMetadataMode::Off)
        .then(|| cx.engine.type_name_for(payload_info));
    let readers = cx
        .engine
        .effective_readers(payload_info.as_struct().expect("struct payload"));
    write_struct_body(cx, strct, &readers, MetaHeader { id, type_name })
}

// -----------------------------------------------------------------------------
// Shared

/// Identity handles: the entry point into the reference-preservation
/// protocol.
pub(crate) struct SharedInstructor;

impl WriteInstructor for SharedInstructor {
    fn accepts(&self, info: &'static TypeInfo, _engine: &Engine) -> bool {
        info.as_shared().is_some()
    }

    fn write(
        &self,
        cx: &mut WriteCx<'_>,
        value: &dyn Reflect,
        _info: &'static TypeInfo,
    ) -> Result<(), SerializeError> {
        let shared = match value.reflect_ref() {
            ReflectRef::Shared(shared) => shared,
            _ => unreachable!("accepted shared value"),
        };
        let inner = shared.borrow_inner();
        let inner_info = inner.reflect_type_info();

        // Scalar handles serialize transparently; nothing can reference
        // a value with no body to suppress.
        if matches!(
            inner_info,
            TypeInfo::Leaf(_) | TypeInfo::Enum(_) | TypeInfo::Optional(_)
        ) {
            return cx.write_value(&*inner);
        }

        let preserve = cx.engine.config().preserve_references;
        let id = match cx.session.enter_shared(shared.identity(), preserve) {
            RefDecision::Reference(id) => {
                // Already written in this call: reference node only.
                cx.writer.begin_object()?;
                cx.writer.key(REF_KEY, false)?;
                cx.writer.pair_delimiter()?;
                cx.writer.string(&id.to_string())?;
                return cx.writer.end_object();
            }
            RefDecision::Body { id } => id,
        };

        match inner.reflect_ref() {
            ReflectRef::Struct(strct) => {
                let config = cx.engine.config();
                let type_name = wants_discriminator(config.type_metadata, false, inner_info)
                    .then(|| cx.engine.type_name_for(inner_info));
                let readers = cx
                    .engine
                    .effective_readers(inner_info.as_struct().expect("struct info"));
                write_struct_body(cx, strct, &readers, MetaHeader { id, type_name })
            }
            ReflectRef::Dynamic(payload) => {
                let payload_info = payload.reflect_type_info();
                write_discriminated(cx, payload, payload_info, id)
            }
            ReflectRef::Map(map) => write_map_body(cx, map, id),
            ReflectRef::List(list) => match id {
                // Identity on a collection takes the `$values` envelope.
                Some(id) => {
                    cx.writer.begin_object()?;
                    cx.writer.key(ID_KEY, false)?;
                    cx.writer.pair_delimiter()?;
                    cx.writer.string(&id.to_string())?;
                    cx.writer.value_delimiter()?;
                    cx.writer.key(VALUES_KEY, false)?;
                    cx.writer.pair_delimiter()?;
                    write_list_body(cx, list)?;
                    cx.writer.end_object()
                }
                None => write_list_body(cx, list),
            },
            _ => unreachable!("scalar kinds handled above"),
        }
    }
}
