//! Leaf codecs for the external scalar stack: timestamps, durations,
//! identifiers, and exact decimals.

use crate::Reflect;
use crate::impls::NonGenericTypeInfoCell;
use crate::impls::{impl_reflect_leaf, impl_type_path_named};
use crate::registry::{GetTypeMeta, TypeMeta};
use crate::info::{
    DynamicTypePath, KeyForm, LeafError, LeafInfo, NumberKind, ScalarForm, ScalarInput, TypeInfo,
    Typed,
};

// -----------------------------------------------------------------------------
// Text-form leaves

/// Implements a leaf whose wire form is its `FromStr`/`Display` text.
macro_rules! impl_text_leaf {
    ($ty:ty, $path:literal) => {
        impl Typed for $ty {
            fn type_info() -> &'static TypeInfo {
                static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    TypeInfo::Leaf(LeafInfo::new::<$ty>(
                        |input| match input {
                            ScalarInput::Text(text) => text
                                .parse::<$ty>()
                                .map(|value| Box::new(value) as Box<dyn Reflect>)
                                .map_err(|_| LeafError::Malformed {
                                    type_path: $path,
                                    literal: text.to_string(),
                                }),
                            other => Err(LeafError::UnexpectedInput {
                                expected: "string",
                                received: other.description(),
                            }),
                        },
                        |value| {
                            let value =
                                value.downcast_ref::<$ty>().ok_or(LeafError::UnexpectedInput {
                                    expected: $path,
                                    received: value.reflect_type_path(),
                                })?;
                            Ok(ScalarForm::Text(value.to_string()))
                        },
                    ))
                })
            }
        }
    };
}

impl_type_path_named!(jiff::Timestamp, "jiff", "Timestamp");
impl_reflect_leaf!(jiff::Timestamp);
impl GetTypeMeta for jiff::Timestamp {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }
}
impl_text_leaf!(jiff::Timestamp, "jiff::Timestamp");

impl_type_path_named!(jiff::SignedDuration, "jiff", "SignedDuration");
impl_reflect_leaf!(jiff::SignedDuration);
impl GetTypeMeta for jiff::SignedDuration {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }
}
impl_text_leaf!(jiff::SignedDuration, "jiff::SignedDuration");

// -----------------------------------------------------------------------------
// Uuid

impl_type_path_named!(uuid::Uuid, "uuid", "Uuid");
impl_reflect_leaf!(uuid::Uuid);
impl GetTypeMeta for uuid::Uuid {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }
}

impl Typed for uuid::Uuid {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Leaf(
                LeafInfo::new::<uuid::Uuid>(
                    |input| match input {
                        ScalarInput::Text(text) => text
                            .parse::<uuid::Uuid>()
                            .map(|value| Box::new(value) as Box<dyn Reflect>)
                            .map_err(|_| LeafError::Malformed {
                                type_path: "uuid::Uuid",
                                literal: text.to_string(),
                            }),
                        other => Err(LeafError::UnexpectedInput {
                            expected: "string",
                            received: other.description(),
                        }),
                    },
                    |value| {
                        let value =
                            value
                                .downcast_ref::<uuid::Uuid>()
                                .ok_or(LeafError::UnexpectedInput {
                                    expected: "uuid::Uuid",
                                    received: value.reflect_type_path(),
                                })?;
                        Ok(ScalarForm::Text(value.to_string()))
                    },
                )
                .with_key_codec(
                    |value| {
                        let value =
                            value
                                .downcast_ref::<uuid::Uuid>()
                                .ok_or(LeafError::UnexpectedInput {
                                    expected: "uuid::Uuid",
                                    received: value.reflect_type_path(),
                                })?;
                        Ok(KeyForm {
                            text: value.to_string(),
                            normalize: false,
                        })
                    },
                    |text| {
                        text.parse::<uuid::Uuid>()
                            .map(|value| Box::new(value) as Box<dyn Reflect>)
                            .map_err(|_| LeafError::Malformed {
                                type_path: "uuid::Uuid",
                                literal: text.to_string(),
                            })
                    },
                ),
            )
        })
    }
}

// -----------------------------------------------------------------------------
// Decimal

impl_type_path_named!(rust_decimal::Decimal, "rust_decimal", "Decimal");
impl_reflect_leaf!(rust_decimal::Decimal);
impl GetTypeMeta for rust_decimal::Decimal {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }
}

impl Typed for rust_decimal::Decimal {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Leaf(LeafInfo::new::<rust_decimal::Decimal>(
                |input| {
                    let lit = match input {
                        ScalarInput::Number(lit) => lit,
                        other => {
                            return Err(LeafError::UnexpectedInput {
                                expected: "number",
                                received: other.description(),
                            });
                        }
                    };
                    // `from_str` has no exponent support; scientific
                    // literals take the dedicated constructor.
                    let parsed = if matches!(lit.kind, NumberKind::Float)
                        && lit.text.contains(['e', 'E'])
                    {
                        rust_decimal::Decimal::from_scientific(lit.text)
                    } else {
                        lit.text.parse::<rust_decimal::Decimal>()
                    };
                    parsed
                        .map(|value| Box::new(value) as Box<dyn Reflect>)
                        .map_err(|_| LeafError::OutOfRange {
                            type_path: "rust_decimal::Decimal",
                            literal: lit.text.to_string(),
                        })
                },
                |value| {
                    let value = value.downcast_ref::<rust_decimal::Decimal>().ok_or(
                        LeafError::UnexpectedInput {
                            expected: "rust_decimal::Decimal",
                            received: value.reflect_type_path(),
                        },
                    )?;
                    Ok(ScalarForm::Number(value.to_string()))
                },
            ))
        })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::info::{ScalarForm, ScalarInput, Typed};

    #[test]
    fn timestamp_round_trips_as_text() {
        let leaf = jiff::Timestamp::type_info().as_leaf().unwrap();
        let parsed = leaf
            .parse(ScalarInput::Text("2024-06-19T15:22:45Z"))
            .unwrap();
        let formatted = leaf.format(&*parsed).unwrap();
        assert_eq!(formatted, ScalarForm::Text("2024-06-19T15:22:45Z".into()));
    }

    #[test]
    fn decimal_is_a_number_on_the_wire() {
        use crate::info::{NumberKind, NumberLiteral};

        let leaf = rust_decimal::Decimal::type_info().as_leaf().unwrap();
        let parsed = leaf
            .parse(ScalarInput::Number(NumberLiteral {
                text: "12.340",
                kind: NumberKind::Float,
            }))
            .unwrap();
        assert_eq!(
            leaf.format(&*parsed).unwrap(),
            ScalarForm::Number("12.340".into())
        );
    }
}
