//! Type analysis: creation descriptions and value readers.
//!
//! Both are derived from the static descriptors once per type and cached
//! on the engine: the deserialize side as [`CreationDescription`], the
//! serialize side as ordered [`ValueReader`] lists.

use hashbrown::{HashMap, HashSet};

use trellis_reflect::Reflect;
use trellis_reflect::info::{ConstructorArgs, ConstructorInfo, NamedField, StructInfo};

use crate::error::DeserializeError;
use crate::writer::KeyNormalizer;

// -----------------------------------------------------------------------------
// CreationDescription

/// One injectable slot of a struct type.
pub struct Slot {
    pub field: &'static NamedField,
    /// Whether any constructor can consume this slot.
    pub in_constructor: bool,
}

/// A constructor with its parameters resolved to normalized slot names.
pub struct CtorDescription {
    pub info: &'static ConstructorInfo,
    pub normalized_params: Vec<String>,
}

/// The cached blueprint of how a struct type is constructed and populated.
pub struct CreationDescription {
    pub info: &'static StructInfo,
    /// Normalized wire name → slot. Uniqueness is an invariant, enforced
    /// at build time.
    pub slots: HashMap<String, Slot>,
    /// Rust field name → normalized wire name, for constructor parameter
    /// lookup.
    by_field_name: HashMap<&'static str, String>,
    pub constructors: Vec<CtorDescription>,
}

impl CreationDescription {
    /// Builds the description under the engine's normalizer.
    pub fn build(
        info: &'static StructInfo,
        normalizer: &dyn KeyNormalizer,
    ) -> Result<Self, DeserializeError> {
        let mut slots = HashMap::with_capacity(info.field_len());
        let mut by_field_name = HashMap::with_capacity(info.field_len());

        for field in info.iter() {
            let normalized = normalizer.normalize(field.wire_name());
            by_field_name.insert(field.name(), normalized.clone());
            if slots
                .insert(
                    normalized.clone(),
                    Slot {
                        field,
                        in_constructor: false,
                    },
                )
                .is_some()
            {
                return Err(DeserializeError::DuplicateSlot {
                    type_path: info.ty().path(),
                    name: normalized,
                });
            }
        }

        let constructors = info
            .constructors()
            .iter()
            .map(|ctor| CtorDescription {
                info: ctor,
                normalized_params: ctor
                    .params()
                    .iter()
                    .map(|param| by_field_name[param].clone())
                    .collect(),
            })
            .collect::<Vec<_>>();

        for ctor in &constructors {
            for param in &ctor.normalized_params {
                if let Some(slot) = slots.get_mut(param.as_str()) {
                    slot.in_constructor = true;
                }
            }
        }

        Ok(Self {
            info,
            slots,
            by_field_name,
            constructors,
        })
    }

    /// The normalized slot name for a Rust field name.
    pub fn normalized_for_field(&self, field_name: &str) -> Option<&str> {
        self.by_field_name.get(field_name).map(String::as_str)
    }

    /// Selects the constructor with the greatest number of parameters all
    /// present in `available`; ties break toward declaration order.
    pub fn select_constructor(&self, available: &HashSet<String>) -> Option<&CtorDescription> {
        self.constructors
            .iter()
            .filter(|ctor| {
                ctor.normalized_params
                    .iter()
                    .all(|param| available.contains(param.as_str()))
            })
            // `max_by_key` would keep the last of equals; declaration
            // order must win, so scan manually.
            .fold(None, |best: Option<&CtorDescription>, ctor| match best {
                Some(incumbent) if incumbent.normalized_params.len() >= ctor.normalized_params.len() => {
                    Some(incumbent)
                }
                _ => Some(ctor),
            })
    }
}

// -----------------------------------------------------------------------------
// Injectable bag

/// A collected member value; `None` once a constructor consumed it.
pub struct Injectable {
    pub value: Option<Box<dyn Reflect>>,
}

/// The [`ConstructorArgs`] view over the collected members.
pub struct BagArgs<'a> {
    pub bag: &'a mut HashMap<String, Injectable>,
    pub desc: &'a CreationDescription,
}

impl ConstructorArgs for BagArgs<'_> {
    fn take_arg(&mut self, name: &'static str) -> Option<Box<dyn Reflect>> {
        let normalized = self.desc.normalized_for_field(name)?;
        self.bag
            .get_mut(normalized)
            .and_then(|injectable| injectable.value.take())
    }
}

// -----------------------------------------------------------------------------
// ValueReader

/// One member read during serialization.
#[derive(Clone, Copy)]
pub struct ValueReader {
    /// The name written to the document (pre-normalization).
    pub wire_name: &'static str,
    /// The Rust field read through [`ReflectStruct`].
    ///
    /// [`ReflectStruct`]: trellis_reflect::ops::ReflectStruct
    pub field_name: &'static str,
}

/// The default reader list: every field, declaration order.
pub fn value_readers(info: &'static StructInfo) -> Vec<ValueReader> {
    info.iter()
        .map(|field| ValueReader {
            wire_name: field.wire_name(),
            field_name: field.name(),
        })
        .collect()
}

// -----------------------------------------------------------------------------
// Rule

/// A user allow/deny list over the default reader list of one type.
#[derive(Clone)]
pub struct Rule {
    mode: RuleMode,
    names: HashSet<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RuleMode {
    Allow,
    Deny,
}

impl Rule {
    /// Keep only the named members (by wire name).
    pub fn allow<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: RuleMode::Allow,
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Drop the named members (by wire name).
    pub fn deny<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: RuleMode::Deny,
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Applies the rule to a reader list.
    pub fn filter(&self, readers: &[ValueReader]) -> Vec<ValueReader> {
        readers
            .iter()
            .filter(|reader| {
                let listed = self.names.contains(reader.wire_name);
                match self.mode {
                    RuleMode::Allow => listed,
                    RuleMode::Deny => !listed,
                }
            })
            .copied()
            .collect()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::Rule;
    use super::ValueReader;

    #[test]
    fn rules_filter_by_wire_name() {
        let readers = [
            ValueReader {
                wire_name: "name",
                field_name: "name",
            },
            ValueReader {
                wire_name: "age",
                field_name: "age",
            },
        ];

        let allowed = Rule::allow(["name"]).filter(&readers);
        assert_eq!(allowed.len(), 1);
        assert_eq!(allowed[0].wire_name, "name");

        let denied = Rule::deny(["name"]).filter(&readers);
        assert_eq!(denied.len(), 1);
        assert_eq!(denied[0].wire_name, "age");
    }
}
