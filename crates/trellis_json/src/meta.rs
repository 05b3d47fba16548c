//! The metadata & reference-preservation protocol.
//!
//! Wire keys, the per-call write/read sessions, and the deferred-reference
//! machinery: pending candidates travel upward with the slot path from
//! their nearest still-under-construction owner, and convert into heap
//! patches once that owner is wrapped into a [`Shared`] handle.
//!
//! [`Shared`]: trellis_reflect::Shared

use hashbrown::HashMap;

use trellis_reflect::Reflect;
use trellis_reflect::info::{DynamicTyped, TypeInfo};
use trellis_reflect::ops::{ReflectMut, ReflectShared, SlotError};

use crate::error::DeserializeError;

// -----------------------------------------------------------------------------
// Wire keys

/// Type discriminator key.
pub const TYPE_KEY: &str = "$type";
/// Generic-type-argument key; accepted on read for interop, never written
/// (Rust type paths carry their arguments textually).
pub const GENERICS_KEY: &str = "$generics";
/// Object identity key.
pub const ID_KEY: &str = "$id";
/// Object reference key.
pub const REF_KEY: &str = "$ref";
/// Collection body key inside an identity envelope.
pub const VALUES_KEY: &str = "$values";

/// Whether a raw document key is part of the metadata section.
pub fn is_metadata_key(key: &str) -> bool {
    matches!(key, TYPE_KEY | GENERICS_KEY | ID_KEY | REF_KEY | VALUES_KEY)
}

// -----------------------------------------------------------------------------
// WriteSession

/// What the write path does at a shared value.
pub enum RefDecision {
    /// Already written in this call: emit `$ref` only, suppress the body.
    Reference(u64),
    /// Emit the body, stamped with this id when preservation is on.
    Body { id: Option<u64> },
}

/// Per-call write state: the visited table and the recursion counter.
pub struct WriteSession {
    visited: HashMap<usize, u64>,
    next_id: u64,
    pub(crate) depth: usize,
}

impl WriteSession {
    pub fn new() -> Self {
        Self {
            visited: HashMap::new(),
            next_id: 1,
            depth: 0,
        }
    }

    /// Stamps the next id without identity tracking. Used for plain
    /// complex bodies, which nothing can reference.
    pub fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The write-path decision for a shared value.
    pub fn enter_shared(&mut self, identity: usize, preserve: bool) -> RefDecision {
        if !preserve {
            return RefDecision::Body { id: None };
        }
        if let Some(id) = self.visited.get(&identity) {
            return RefDecision::Reference(*id);
        }
        let id = self.fresh_id();
        self.visited.insert(identity, id);
        RefDecision::Body { id: Some(id) }
    }
}

// -----------------------------------------------------------------------------
// Pending candidates

/// Wraps a resolved reference into the slot's declared shape, e.g.
/// `Shared<T>` into `Option<Shared<T>>`.
pub type WrapFn = fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>, SlotError>;

/// One step of a slot path, recorded leaf-first.
#[derive(Clone, Debug)]
pub enum PathStep {
    Field(&'static str),
    Index(usize),
}

/// A deferred reference still traveling upward with its slot path.
pub struct PendingCandidate {
    /// Steps from the slot up to the owner currently under construction,
    /// leaf-first.
    pub path: Vec<PathStep>,
    /// Wraps to apply to the resolved handle, innermost first.
    pub wraps: Vec<WrapFn>,
    /// The awaited object id.
    pub awaited: u64,
}

struct HeapPatch {
    /// The shared owner to patch; boxed [`ReflectShared`] handle.
    handle: Box<dyn Reflect>,
    candidate: PendingCandidate,
}

// -----------------------------------------------------------------------------
// ReadSession

/// Per-call read state: the reference table and the patch queue.
pub struct ReadSession {
    refs: HashMap<u64, Box<dyn Reflect>>,
    patches: Vec<HeapPatch>,
}

impl ReadSession {
    pub fn new() -> Self {
        Self {
            refs: HashMap::new(),
            patches: Vec::new(),
        }
    }

    /// A fresh clone of the handle registered under `id`.
    pub fn lookup(&self, id: u64) -> Option<Box<dyn Reflect>> {
        self.refs
            .get(&id)
            .map(|handle| as_shared(handle.as_ref()).clone_handle())
    }

    /// Resolves a candidate's awaited id into an injectable value, wraps
    /// applied, or `None` while the id is still unregistered.
    pub fn resolve(
        &self,
        candidate: &PendingCandidate,
    ) -> Result<Option<Box<dyn Reflect>>, DeserializeError> {
        let Some(value) = self.lookup(candidate.awaited) else {
            return Ok(None);
        };
        apply_wraps(value, &candidate.wraps).map(Some)
    }

    /// Registers `handle` under `id` and applies every patch that was
    /// waiting for it.
    pub fn register(&mut self, id: u64, handle: &dyn ReflectShared) -> Result<(), DeserializeError> {
        if self.refs.contains_key(&id) {
            return Err(DeserializeError::DuplicateId { id });
        }
        self.refs.insert(id, handle.clone_handle());

        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.patches)
            .into_iter()
            .partition(|patch| patch.candidate.awaited == id);
        self.patches = waiting;
        for patch in ready {
            let value = self
                .resolve(&patch.candidate)?
                .expect("registered id resolves");
            let target = as_shared(patch.handle.as_ref());
            inject_by_path(&mut *target.borrow_inner_mut(), &patch.candidate.path, value)?;
        }
        Ok(())
    }

    /// Queues a patch against a shared owner for a still-forward id.
    pub fn add_patch(&mut self, handle: Box<dyn Reflect>, candidate: PendingCandidate) {
        self.patches.push(HeapPatch { handle, candidate });
    }

    /// End-of-call check: every queued patch must have resolved.
    pub fn finish(&self) -> Result<(), DeserializeError> {
        match self.patches.first() {
            Some(patch) => Err(DeserializeError::UnresolvedReference {
                id: patch.candidate.awaited,
            }),
            None => Ok(()),
        }
    }
}

fn as_shared(handle: &dyn Reflect) -> &dyn ReflectShared {
    match handle.reflect_ref() {
        trellis_reflect::ops::ReflectRef::Shared(shared) => shared,
        _ => unreachable!("reference table holds shared handles only"),
    }
}

// -----------------------------------------------------------------------------
// Injection

pub fn apply_wraps(
    value: Box<dyn Reflect>,
    wraps: &[WrapFn],
) -> Result<Box<dyn Reflect>, DeserializeError> {
    let mut value = value;
    for wrap in wraps {
        value = wrap(value).map_err(|source| DeserializeError::Inject {
            type_path: "<deferred reference>",
            source,
        })?;
    }
    Ok(value)
}

/// Walks `path` (leaf-first) down from `target` and sets the final field.
///
/// Navigation descends struct fields and list indices, looking through
/// optional and dynamic wrappers. It never crosses a `Shared` boundary;
/// paths are cut at those by construction.
pub fn inject_by_path(
    target: &mut dyn Reflect,
    path: &[PathStep],
    value: Box<dyn Reflect>,
) -> Result<(), DeserializeError> {
    let mut current = target;
    let mut steps = path.iter().rev().peekable();

    while let Some(step) = steps.next() {
        if steps.peek().is_none() {
            let type_path = current.reflect_type_info().type_path();
            let PathStep::Field(name) = step else {
                return Err(inject_error(type_path, "<index>".to_string()));
            };
            let strct = match current.reflect_mut() {
                ReflectMut::Struct(strct) => strct,
                _ => return Err(inject_error(type_path, name.to_string())),
            };
            return strct
                .set_field(name, value)
                .map_err(|source| DeserializeError::Inject { type_path, source });
        }
        current = descend(current, step)?;
    }
    unreachable!("candidate paths have at least one step")
}

fn inject_error(type_path: &'static str, field: String) -> DeserializeError {
    DeserializeError::Inject {
        type_path,
        source: SlotError::UnknownField { field },
    }
}

/// One navigation step, looking through optional and dynamic wrappers.
fn descend<'a>(
    current: &'a mut dyn Reflect,
    step: &PathStep,
) -> Result<&'a mut dyn Reflect, DeserializeError> {
    let type_path = current.reflect_type_info().type_path();
    match current.reflect_mut() {
        ReflectMut::Optional(optional) => match optional.inner_mut() {
            Some(inner) => descend(inner, step),
            None => Err(inject_error(type_path, "<empty optional>".to_string())),
        },
        ReflectMut::Dynamic(inner) => descend(inner, step),
        ReflectMut::Struct(strct) => match step {
            PathStep::Field(name) => strct
                .field_mut(name)
                .ok_or_else(|| inject_error(type_path, name.to_string())),
            PathStep::Index(_) => Err(inject_error(type_path, "<index>".to_string())),
        },
        ReflectMut::List(list) => match step {
            PathStep::Index(index) => list
                .element_mut(*index)
                .ok_or_else(|| inject_error(type_path, format!("<element {index}>"))),
            PathStep::Field(name) => Err(inject_error(type_path, name.to_string())),
        },
        _ => Err(inject_error(type_path, "<unsupported step>".to_string())),
    }
}

// -----------------------------------------------------------------------------
// Discriminators

/// Whether a body of `info` gets a discriminator, given whether the slot
/// declared it dynamically.
pub fn wants_discriminator(
    mode: crate::config::TypeMetadataMode,
    declared_dynamic: bool,
    info: &'static TypeInfo,
) -> bool {
    use crate::config::TypeMetadataMode;
    match mode {
        TypeMetadataMode::Off => false,
        TypeMetadataMode::Auto => declared_dynamic,
        TypeMetadataMode::All => declared_dynamic || info.as_struct().is_some(),
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{RefDecision, WriteSession};

    #[test]
    fn ids_start_at_one_and_deduplicate() {
        let mut session = WriteSession::new();
        match session.enter_shared(0xA, true) {
            RefDecision::Body { id } => assert_eq!(id, Some(1)),
            RefDecision::Reference(_) => panic!("first visit writes a body"),
        }
        match session.enter_shared(0xA, true) {
            RefDecision::Reference(id) => assert_eq!(id, 1),
            RefDecision::Body { .. } => panic!("second visit references"),
        }
        match session.enter_shared(0xB, true) {
            RefDecision::Body { id } => assert_eq!(id, Some(2)),
            RefDecision::Reference(_) => panic!("new identity writes a body"),
        }
    }

    #[test]
    fn preservation_off_never_tracks() {
        let mut session = WriteSession::new();
        assert!(matches!(
            session.enter_shared(0xA, false),
            RefDecision::Body { id: None }
        ));
        assert!(matches!(
            session.enter_shared(0xA, false),
            RefDecision::Body { id: None }
        ));
    }
}
