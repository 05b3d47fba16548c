//! The engine: strategy lists, dispatch caches, and the public
//! serialize/deserialize surface.

use core::any::TypeId;
use std::io::{Read, Write};
use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::HashMap;

use trellis_reflect::info::{DynamicTyped, StructInfo, TypeInfo, Typed};
use trellis_reflect::registry::{TypeRegistryArc, TypeTraitFactory};
use trellis_reflect::{Reflect, TypeIdMap};

use crate::config::EngineConfig;
use crate::de::{ParseCx, ParseOutcome, PolySwitch, TokenCursor, TokenParser, default_parsers};
use crate::describe::{CreationDescription, Rule, ValueReader, value_readers};
use crate::error::{DeserializeError, SerializeError};
use crate::meta::{ReadSession, WriteSession};
use crate::ser::{WriteCx, WriteInstructor, default_instructors};
use crate::token::TokenKind;
use crate::writer::{CompactStyle, IndentStyle, JsonTextWriter, WhitespaceStyle};

// -----------------------------------------------------------------------------
// Engine

/// The shared serialization engine.
///
/// Strategy lists are fixed at construction; dispatch caches, creation
/// descriptions, and value-reader lists populate lazily and live for the
/// engine's lifetime. Population takes the exclusive section; hits take
/// the shared one, so concurrent calls against one engine are cheap.
///
/// # Examples
///
/// ```
/// use trellis_json::Engine;
/// use trellis_reflect::{derive::Reflect, registry::TypeRegistryArc};
///
/// #[derive(Reflect, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// let registry = TypeRegistryArc::default();
/// registry.write().register::<Point>();
///
/// let engine = Engine::new(registry);
/// let text = engine.serialize(&Point { x: 1, y: -2 }).unwrap();
/// assert_eq!(text, r#"{"x":1,"y":-2}"#);
///
/// let point: Point = engine.deserialize(&text).unwrap();
/// assert_eq!(point, Point { x: 1, y: -2 });
/// ```
pub struct Engine {
    registry: TypeRegistryArc,
    config: EngineConfig,

    parsers: Vec<Arc<dyn TokenParser>>,
    instructors: Vec<Arc<dyn WriteInstructor>>,
    poly_switches: TypeIdMap<Arc<dyn PolySwitch>>,
    rules: TypeIdMap<Rule>,

    parser_cache: RwLock<HashMap<(TokenKind, TypeId), Arc<dyn TokenParser>>>,
    instructor_cache: RwLock<TypeIdMap<Arc<dyn WriteInstructor>>>,
    creation_cache: RwLock<TypeIdMap<Arc<CreationDescription>>>,
    reader_cache: RwLock<TypeIdMap<Arc<[ValueReader]>>>,
    rule_reader_cache: RwLock<TypeIdMap<Arc<[ValueReader]>>>,
}

impl Engine {
    /// Creates an engine over `registry` with the default configuration.
    pub fn new(registry: TypeRegistryArc) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    /// Creates an engine with an explicit configuration.
    pub fn with_config(registry: TypeRegistryArc, config: EngineConfig) -> Self {
        let parsers = default_parsers();
        let instructors = default_instructors();
        log::debug!(
            "engine ready: {} parsers, {} instructors",
            parsers.len(),
            instructors.len()
        );
        Self {
            registry,
            config,
            parsers,
            instructors,
            poly_switches: TypeIdMap::default(),
            rules: TypeIdMap::default(),
            parser_cache: RwLock::new(HashMap::new()),
            instructor_cache: RwLock::new(TypeIdMap::default()),
            creation_cache: RwLock::new(TypeIdMap::default()),
            reader_cache: RwLock::new(TypeIdMap::default()),
            rule_reader_cache: RwLock::new(TypeIdMap::default()),
        }
    }

    /// The engine's configuration.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The engine's registry.
    #[inline]
    pub fn registry(&self) -> &TypeRegistryArc {
        &self.registry
    }

    /// Installs an allow/deny rule over `T`'s serialized members.
    pub fn add_rule<T: Typed>(&mut self, rule: Rule) {
        self.rules.insert(TypeId::of::<T>(), rule);
    }

    /// Registers a polymorphic-switch strategy for the concrete type `T`.
    pub fn register_poly_switch<T: Typed>(&mut self, switch: Arc<dyn PolySwitch>) {
        self.poly_switches.insert(TypeId::of::<T>(), switch);
    }

    /// Installs a custom parser ahead of the built-in list.
    ///
    /// Order is a correctness-relevant configuration: the first strategy
    /// whose predicate matches wins.
    pub fn push_parser(&mut self, parser: Arc<dyn TokenParser>) {
        self.parsers.insert(0, parser);
    }

    /// Installs a custom instructor ahead of the built-in list.
    pub fn push_instructor(&mut self, instructor: Arc<dyn WriteInstructor>) {
        self.instructors.insert(0, instructor);
    }

    // -------------------------------------------------------------------------
    // Dispatch

    pub(crate) fn parser_for(
        &self,
        token: TokenKind,
        target: &'static TypeInfo,
    ) -> Result<Arc<dyn TokenParser>, DeserializeError> {
        let key = (token, target.type_id());
        if let Some(parser) = self
            .parser_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(parser));
        }

        let parser = self
            .parsers
            .iter()
            .find(|parser| parser.accepts(token, target))
            .ok_or(DeserializeError::NoParser {
                token,
                type_path: target.type_path(),
            })?;

        if parser.cacheable() {
            log::trace!(
                "parser cache insert: {token:?} / `{}`",
                target.type_path()
            );
            self.parser_cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_insert_with(|| Arc::clone(parser));
        }
        Ok(Arc::clone(parser))
    }

    pub(crate) fn instructor_for(
        &self,
        info: &'static TypeInfo,
    ) -> Result<Arc<dyn WriteInstructor>, SerializeError> {
        let key = info.type_id();
        if let Some(instructor) = self
            .instructor_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(instructor));
        }

        let instructor = self
            .instructors
            .iter()
            .find(|instructor| instructor.accepts(info, self))
            .ok_or(SerializeError::NoInstructor {
                type_path: info.type_path(),
            })?;

        if instructor.cacheable() {
            log::trace!("instructor cache insert: `{}`", info.type_path());
            self.instructor_cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_insert_with(|| Arc::clone(instructor));
        }
        Ok(Arc::clone(instructor))
    }

    // -------------------------------------------------------------------------
    // Type analysis caches

    pub(crate) fn creation_for(
        &self,
        info: &'static StructInfo,
    ) -> Result<Arc<CreationDescription>, DeserializeError> {
        let key = info.ty().id();
        if let Some(desc) = self
            .creation_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(desc));
        }

        let desc = Arc::new(CreationDescription::build(
            info,
            self.config.key_normalizer.as_ref(),
        )?);
        Ok(Arc::clone(
            self.creation_cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_insert(desc),
        ))
    }

    pub(crate) fn readers_for(&self, info: &'static StructInfo) -> Arc<[ValueReader]> {
        let key = info.ty().id();
        if let Some(readers) = self
            .reader_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(readers);
        }

        let readers: Arc<[ValueReader]> = value_readers(info).into();
        Arc::clone(
            self.reader_cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_insert(readers),
        )
    }

    /// The reader list with any per-type rule applied.
    pub(crate) fn effective_readers(&self, info: &'static StructInfo) -> Arc<[ValueReader]> {
        let key = info.ty().id();
        let Some(rule) = self.rules.get(&key) else {
            return self.readers_for(info);
        };

        if let Some(readers) = self
            .rule_reader_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(readers);
        }

        let filtered: Arc<[ValueReader]> = rule.filter(&self.readers_for(info)).into();
        Arc::clone(
            self.rule_reader_cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_insert(filtered),
        )
    }

    pub(crate) fn has_rule(&self, type_id: TypeId) -> bool {
        self.rules.contains_key(&type_id)
    }

    pub(crate) fn poly_switch_for(&self, type_id: TypeId) -> Option<Arc<dyn PolySwitch>> {
        self.poly_switches.get(&type_id).map(Arc::clone)
    }

    // -------------------------------------------------------------------------
    // Names and factories

    /// The discriminator text for a type: alias first, else full path.
    pub(crate) fn type_name_for(&self, info: &'static TypeInfo) -> String {
        let path = info.type_path();
        match self.config.aliases.name_for(path) {
            Some(alias) => alias.to_string(),
            None => path.to_string(),
        }
    }

    /// Resolves a discriminator back to a registered type: alias table
    /// first, then registry path, then unambiguous short name.
    pub(crate) fn resolve_type_name(
        &self,
        name: &str,
        generics: &[String],
    ) -> Result<&'static TypeInfo, DeserializeError> {
        let composed;
        let full: &str = if generics.is_empty() {
            name
        } else {
            composed = format!("{name}<{}>", generics.join(", "));
            &composed
        };

        let registry = self.registry.read();
        let resolved = match self.config.aliases.path_for(full) {
            Some(path) => registry.get_with_type_path(path),
            None => registry
                .get_with_type_path(full)
                .or_else(|| registry.get_with_type_name(full)),
        };
        resolved
            .map(|meta| meta.type_info())
            .ok_or_else(|| DeserializeError::UnknownTypeName {
                name: full.to_string(),
            })
    }

    /// Builds a container destination, honoring a registered
    /// [`TypeTraitFactory`] override.
    pub(crate) fn make_container(
        &self,
        type_id: TypeId,
        default: impl FnOnce() -> Box<dyn Reflect>,
    ) -> Box<dyn Reflect> {
        let registry = self.registry.read();
        match registry.get_type_trait::<TypeTraitFactory>(type_id) {
            Some(factory) => factory.make(),
            None => default(),
        }
    }

    // -------------------------------------------------------------------------
    // Public surface: serialize

    /// Serializes a value to JSON text.
    pub fn serialize<T: Reflect>(&self, value: &T) -> Result<String, SerializeError> {
        self.serialize_dyn(value.as_reflect())
    }

    /// Serializes an already-erased value to JSON text.
    pub fn serialize_dyn(&self, value: &dyn Reflect) -> Result<String, SerializeError> {
        let mut out = String::new();
        self.serialize_into(value, &mut out)?;
        Ok(out)
    }

    /// Serializes into a byte sink.
    pub fn serialize_to<W: Write>(
        &self,
        value: &dyn Reflect,
        sink: W,
    ) -> Result<(), SerializeError> {
        let mut adapter = IoAdapter {
            sink,
            error: None,
        };
        let result = self.serialize_into(value, &mut adapter);
        match adapter.error {
            Some(error) => Err(SerializeError::Sink(error)),
            None => result,
        }
    }

    fn serialize_into(
        &self,
        value: &dyn Reflect,
        out: &mut dyn core::fmt::Write,
    ) -> Result<(), SerializeError> {
        let compact = CompactStyle;
        let indented = IndentStyle {
            indent: self.config.indent,
        };
        let style: &dyn WhitespaceStyle = if self.config.pretty { &indented } else { &compact };

        let mut writer = JsonTextWriter::new(out, style, self.config.key_normalizer.as_ref());
        let mut session = WriteSession::new();
        let mut cx = WriteCx {
            engine: self,
            writer: &mut writer,
            session: &mut session,
        };
        cx.write_value(value)
    }

    // -------------------------------------------------------------------------
    // Public surface: deserialize

    /// Deserializes JSON text into a `T`.
    pub fn deserialize<T: Reflect + Typed>(&self, text: &str) -> Result<T, DeserializeError> {
        let value = self.deserialize_dyn(text, T::type_info())?;
        value
            .take::<T>()
            .map_err(|value| DeserializeError::TypeMismatch {
                requested: T::type_path(),
                found: value.reflect_type_info().type_path(),
            })
    }

    /// Deserializes JSON text against a runtime-chosen type.
    pub fn deserialize_dyn(
        &self,
        text: &str,
        target: &'static TypeInfo,
    ) -> Result<Box<dyn Reflect>, DeserializeError> {
        let mut cursor = TokenCursor::new(text);
        let mut session = ReadSession::new();

        let outcome = {
            let mut cx = ParseCx {
                engine: self,
                cursor: &mut cursor,
                session: &mut session,
            };
            let token = cx.cursor.next()?;
            cx.parse_token(token, target)?
        };

        let resolved = match outcome {
            ParseOutcome::Resolved(resolved) => resolved,
            // The top-level value itself never resolved.
            ParseOutcome::Deferred { awaited, .. } => {
                return Err(DeserializeError::UnresolvedReference { id: awaited });
            }
        };
        if let Some(candidate) = resolved.pending.first() {
            return Err(DeserializeError::UnresolvedReference {
                id: candidate.awaited,
            });
        }
        session.finish()?;

        if !cursor.at_end() {
            return Err(DeserializeError::Trailing {
                pos: cursor.position(),
            });
        }
        Ok(resolved.value)
    }

    /// Deserializes from a byte source.
    pub fn deserialize_from<T: Reflect + Typed, R: Read>(
        &self,
        mut source: R,
    ) -> Result<T, DeserializeError> {
        let mut text = String::new();
        source.read_to_string(&mut text)?;
        self.deserialize(&text)
    }
}

// -----------------------------------------------------------------------------
// IoAdapter

/// Bridges `fmt::Write` onto `io::Write`, stashing the first I/O error.
struct IoAdapter<W: Write> {
    sink: W,
    error: Option<std::io::Error>,
}

impl<W: Write> core::fmt::Write for IoAdapter<W> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        match self.sink.write_all(s.as_bytes()) {
            Ok(()) => Ok(()),
            Err(error) => {
                self.error = Some(error);
                Err(core::fmt::Error)
            }
        }
    }
}
