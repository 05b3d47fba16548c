//! Engine configuration.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::writer::{DefaultKeyNormalizer, KeyNormalizer};

// -----------------------------------------------------------------------------
// Modes

/// When the writer emits `$type` discriminators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeMetadataMode {
    /// Never. Documents with dynamic slots stop being self-describing.
    Off,
    /// Only where the declared slot does not pin the concrete type,
    /// i.e. dynamic slots.
    Auto,
    /// On every struct body.
    All,
}

/// What to do with a document key matching no slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnknownKeys {
    /// Fail the call naming the key.
    Error,
    /// Consume and drop the key's value, then continue. The schema-
    /// evolution mode.
    Skip,
}

// -----------------------------------------------------------------------------
// TypeAliases

/// A user-supplied type↔name mapping consulted before registry paths when
/// emitting or resolving discriminators.
#[derive(Clone, Default)]
pub struct TypeAliases {
    name_to_path: HashMap<String, String>,
    path_to_name: HashMap<String, String>,
}

impl TypeAliases {
    /// Maps `alias` to the full type path `path`, both directions.
    pub fn insert(&mut self, alias: impl Into<String>, path: impl Into<String>) {
        let alias = alias.into();
        let path = path.into();
        self.path_to_name.insert(path.clone(), alias.clone());
        self.name_to_path.insert(alias, path);
    }

    /// The wire name for a type path, if aliased.
    pub fn name_for(&self, path: &str) -> Option<&str> {
        self.path_to_name.get(path).map(String::as_str)
    }

    /// The type path for a wire name, if aliased.
    pub fn path_for(&self, name: &str) -> Option<&str> {
        self.name_to_path.get(name).map(String::as_str)
    }
}

// -----------------------------------------------------------------------------
// EngineConfig

/// The enforced floor of the recursion ceiling.
pub const MIN_DEPTH: usize = 3;

/// Default recursion ceiling.
pub const DEFAULT_MAX_DEPTH: usize = 300;

/// Configuration for one [`Engine`](crate::Engine).
#[derive(Clone)]
pub struct EngineConfig {
    /// Track object identity and emit `$id`/`$ref` (default `false`).
    pub preserve_references: bool,
    /// Write-side discriminator policy (default [`TypeMetadataMode::Auto`]).
    pub type_metadata: TypeMetadataMode,
    /// Whether `$type` keys are honored on read; when `false` they are
    /// consumed and the requested type is used (default `true`).
    pub read_type_metadata: bool,
    /// Unknown-key policy (default [`UnknownKeys::Error`]).
    pub unknown_keys: UnknownKeys,
    /// Recursion ceiling on the write side, clamped to at least
    /// [`MIN_DEPTH`] (default [`DEFAULT_MAX_DEPTH`]).
    pub max_depth: usize,
    /// Pretty-print output (default `false`).
    pub pretty: bool,
    /// Indentation unit for pretty output (default two spaces).
    pub indent: &'static str,
    /// Key normalizer shared by writer and slot lookup.
    pub key_normalizer: Arc<dyn KeyNormalizer>,
    /// Discriminator aliases.
    pub aliases: TypeAliases,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preserve_references: false,
            type_metadata: TypeMetadataMode::Auto,
            read_type_metadata: true,
            unknown_keys: UnknownKeys::Error,
            max_depth: DEFAULT_MAX_DEPTH,
            pretty: false,
            indent: "  ",
            key_normalizer: Arc::new(DefaultKeyNormalizer),
            aliases: TypeAliases::default(),
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables reference preservation.
    pub fn preserve_references(mut self, on: bool) -> Self {
        self.preserve_references = on;
        self
    }

    /// Sets the discriminator policy.
    pub fn type_metadata(mut self, mode: TypeMetadataMode) -> Self {
        self.type_metadata = mode;
        self
    }

    /// Sets whether `$type` keys are honored on read.
    pub fn read_type_metadata(mut self, on: bool) -> Self {
        self.read_type_metadata = on;
        self
    }

    /// Sets the unknown-key policy.
    pub fn unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown_keys = policy;
        self
    }

    /// Sets the recursion ceiling; values below [`MIN_DEPTH`] clamp up.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Enables pretty printing.
    pub fn pretty(mut self, on: bool) -> Self {
        self.pretty = on;
        self
    }

    /// Replaces the key normalizer.
    pub fn key_normalizer(mut self, normalizer: Arc<dyn KeyNormalizer>) -> Self {
        self.key_normalizer = normalizer;
        self
    }

    /// Adds a discriminator alias.
    pub fn alias(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.aliases.insert(name, path);
        self
    }

    /// The ceiling actually enforced.
    pub(crate) fn effective_max_depth(&self) -> usize {
        self.max_depth.max(MIN_DEPTH)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{EngineConfig, MIN_DEPTH};

    #[test]
    fn depth_floor_is_enforced() {
        let config = EngineConfig::new().max_depth(0);
        assert_eq!(config.effective_max_depth(), MIN_DEPTH);
    }

    #[test]
    fn aliases_map_both_ways() {
        let config = EngineConfig::new().alias("Person", "demo::Person");
        assert_eq!(config.aliases.name_for("demo::Person"), Some("Person"));
        assert_eq!(config.aliases.path_for("Person"), Some("demo::Person"));
    }
}
