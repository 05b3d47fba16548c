//! Serializer dispatch.
//!
//! Instructors are resolved by the value's runtime type (the writer
//! always knows the concrete type), tried in list order, and cached by
//! `TypeId`. The context carries the low-level writer, the recursive
//! serialize callback, and the call-scoped visited table.

use std::sync::Arc;

use trellis_reflect::Reflect;
use trellis_reflect::info::{DynamicTyped, TypeInfo};

use crate::engine::Engine;
use crate::error::SerializeError;
use crate::meta::WriteSession;
use crate::writer::StructuralWriter;

// -----------------------------------------------------------------------------
// Modules

pub(crate) mod instructors;

// -----------------------------------------------------------------------------
// WriteInstructor

/// A serialization strategy for one category of runtime value.
pub trait WriteInstructor: Send + Sync {
    /// The applicability predicate; consulted in list order, first match
    /// wins.
    fn accepts(&self, info: &'static TypeInfo, engine: &Engine) -> bool;

    /// Whether a match may be recorded in the dispatch cache.
    fn cacheable(&self) -> bool {
        true
    }

    /// Writes one value.
    fn write(
        &self,
        cx: &mut WriteCx<'_>,
        value: &dyn Reflect,
        info: &'static TypeInfo,
    ) -> Result<(), SerializeError>;
}

// -----------------------------------------------------------------------------
// WriteCx

/// The context an instructor runs with.
pub struct WriteCx<'a> {
    pub(crate) engine: &'a Engine,
    pub(crate) writer: &'a mut dyn StructuralWriter,
    pub(crate) session: &'a mut WriteSession,
}

impl WriteCx<'_> {
    /// The owning engine.
    pub fn engine(&self) -> &Engine {
        self.engine
    }

    /// Serializes a nested value, guarded by the recursion ceiling.
    pub fn write_value(&mut self, value: &dyn Reflect) -> Result<(), SerializeError> {
        let limit = self.engine.config().effective_max_depth();
        if self.session.depth >= limit {
            return Err(SerializeError::DepthExceeded { limit });
        }
        self.session.depth += 1;

        let info = value.reflect_type_info();
        let result = self
            .engine
            .instructor_for(info)
            .and_then(|instructor| instructor.write(self, value, info));

        self.session.depth -= 1;
        result
    }
}

// -----------------------------------------------------------------------------
// Default strategy list

/// The built-in instructors, in dispatch order. The rule instructor runs
/// first so a per-type rule shadows the generic complex-object path.
pub(crate) fn default_instructors() -> Vec<Arc<dyn WriteInstructor>> {
    vec![
        Arc::new(instructors::RuleInstructor),
        Arc::new(instructors::LeafInstructor),
        Arc::new(instructors::EnumInstructor),
        Arc::new(instructors::OptionalInstructor),
        Arc::new(instructors::SharedInstructor),
        Arc::new(instructors::DynamicInstructor),
        Arc::new(instructors::ListInstructor),
        Arc::new(instructors::MapInstructor),
        Arc::new(instructors::ComplexInstructor),
    ]
}
