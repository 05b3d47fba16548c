//! Leaf codecs for the standard scalar types.
//!
//! Integer widths narrow from a 64-bit intermediate after validating the
//! literal's decimal text against the exact min/max of the width; the
//! 128-bit widths parse their text directly. A float literal with a
//! nonzero fractional part never becomes an integer.

use crate::Reflect;
use crate::impls::NonGenericTypeInfoCell;
use crate::impls::{
    impl_get_type_meta_leaf, impl_reflect_leaf, impl_type_path_named, impl_type_path_primitive,
};
use crate::info::{
    DynamicTypePath, KeyForm, LeafError, LeafInfo, NumberKind, NumberLiteral, ScalarForm,
    ScalarInput, TypeInfo, Typed,
};

// -----------------------------------------------------------------------------
// Integer intermediates

/// Widens an integer literal to `i128` through the 64-bit intermediates.
pub(super) fn int_literal(
    lit: &NumberLiteral<'_>,
    type_path: &'static str,
) -> Result<i128, LeafError> {
    match lit.kind {
        NumberKind::Signed => lit
            .text
            .parse::<i64>()
            .map(i128::from)
            .map_err(|_| LeafError::OutOfRange {
                type_path,
                literal: lit.text.to_string(),
            }),
        NumberKind::Unsigned => lit
            .text
            .parse::<u64>()
            .map(i128::from)
            .map_err(|_| LeafError::OutOfRange {
                type_path,
                literal: lit.text.to_string(),
            }),
        NumberKind::Float => float_to_int(lit, type_path),
    }
}

/// Accepts float literals whose fractional part is zero, such as `2.0`.
fn float_to_int(lit: &NumberLiteral<'_>, type_path: &'static str) -> Result<i128, LeafError> {
    let value: f64 = lit.text.parse().map_err(|_| LeafError::Malformed {
        type_path,
        literal: lit.text.to_string(),
    })?;
    if value.fract() != 0.0 {
        return Err(LeafError::Fractional {
            type_path,
            literal: lit.text.to_string(),
        });
    }
    if value < i64::MIN as f64 || value > u64::MAX as f64 {
        return Err(LeafError::OutOfRange {
            type_path,
            literal: lit.text.to_string(),
        });
    }
    Ok(value as i128)
}

fn expect_number<'a>(input: ScalarInput<'a>) -> Result<NumberLiteral<'a>, LeafError> {
    match input {
        ScalarInput::Number(lit) => Ok(lit),
        other => Err(LeafError::UnexpectedInput {
            expected: "number",
            received: other.description(),
        }),
    }
}

fn expect_self<'a, T: Reflect>(value: &'a dyn Reflect) -> Result<&'a T, LeafError> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| LeafError::UnexpectedInput {
            expected: core::any::type_name::<T>(),
            received: value.reflect_type_path(),
        })
}

// -----------------------------------------------------------------------------
// Integer widths

macro_rules! impl_int_leaf {
    ($ty:ty) => {
        impl_type_path_primitive!($ty);
        impl_reflect_leaf!($ty);
        impl_get_type_meta_leaf!($ty);

        impl Typed for $ty {
            fn type_info() -> &'static TypeInfo {
                static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    TypeInfo::Leaf(
                        LeafInfo::new::<$ty>(
                            |input| {
                                let lit = expect_number(input)?;
                                let wide = int_literal(&lit, stringify!($ty))?;
                                let value = <$ty>::try_from(wide).map_err(|_| {
                                    LeafError::OutOfRange {
                                        type_path: stringify!($ty),
                                        literal: lit.text.to_string(),
                                    }
                                })?;
                                Ok(Box::new(value))
                            },
                            |value| {
                                let value = expect_self::<$ty>(value)?;
                                Ok(ScalarForm::Number(value.to_string()))
                            },
                        )
                        .with_key_codec(
                            |value| {
                                let value = expect_self::<$ty>(value)?;
                                Ok(KeyForm {
                                    text: value.to_string(),
                                    normalize: false,
                                })
                            },
                            |text| {
                                text.parse::<$ty>()
                                    .map(|value| Box::new(value) as Box<dyn Reflect>)
                                    .map_err(|_| LeafError::Malformed {
                                        type_path: stringify!($ty),
                                        literal: text.to_string(),
                                    })
                            },
                        ),
                    )
                })
            }
        }
    };
}

impl_int_leaf!(i8);
impl_int_leaf!(i16);
impl_int_leaf!(i32);
impl_int_leaf!(i64);
impl_int_leaf!(isize);
impl_int_leaf!(u8);
impl_int_leaf!(u16);
impl_int_leaf!(u32);
impl_int_leaf!(u64);
impl_int_leaf!(usize);

// The 128-bit widths exceed the 64-bit intermediates and parse their text
// directly.
macro_rules! impl_int128_leaf {
    ($ty:ty) => {
        impl_type_path_primitive!($ty);
        impl_reflect_leaf!($ty);
        impl_get_type_meta_leaf!($ty);

        impl Typed for $ty {
            fn type_info() -> &'static TypeInfo {
                static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    TypeInfo::Leaf(
                        LeafInfo::new::<$ty>(
                            |input| {
                                let lit = expect_number(input)?;
                                let value: $ty = match lit.kind {
                                    NumberKind::Float => {
                                        let wide = int_literal(&lit, stringify!($ty))?;
                                        <$ty>::try_from(wide).map_err(|_| {
                                            LeafError::OutOfRange {
                                                type_path: stringify!($ty),
                                                literal: lit.text.to_string(),
                                            }
                                        })?
                                    }
                                    _ => lit.text.parse().map_err(|_| LeafError::OutOfRange {
                                        type_path: stringify!($ty),
                                        literal: lit.text.to_string(),
                                    })?,
                                };
                                Ok(Box::new(value))
                            },
                            |value| {
                                let value = expect_self::<$ty>(value)?;
                                Ok(ScalarForm::Number(value.to_string()))
                            },
                        )
                        .with_key_codec(
                            |value| {
                                let value = expect_self::<$ty>(value)?;
                                Ok(KeyForm {
                                    text: value.to_string(),
                                    normalize: false,
                                })
                            },
                            |text| {
                                text.parse::<$ty>()
                                    .map(|value| Box::new(value) as Box<dyn Reflect>)
                                    .map_err(|_| LeafError::Malformed {
                                        type_path: stringify!($ty),
                                        literal: text.to_string(),
                                    })
                            },
                        ),
                    )
                })
            }
        }
    };
}

impl_int128_leaf!(i128);
impl_int128_leaf!(u128);

// -----------------------------------------------------------------------------
// Floats

macro_rules! impl_float_leaf {
    ($ty:ty) => {
        impl_type_path_primitive!($ty);
        impl_reflect_leaf!($ty);
        impl_get_type_meta_leaf!($ty);

        impl Typed for $ty {
            fn type_info() -> &'static TypeInfo {
                static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    TypeInfo::Leaf(LeafInfo::new::<$ty>(
                        |input| {
                            let lit = expect_number(input)?;
                            let wide: f64 =
                                lit.text.parse().map_err(|_| LeafError::Malformed {
                                    type_path: stringify!($ty),
                                    literal: lit.text.to_string(),
                                })?;
                            let value = wide as $ty;
                            if value.is_infinite() && wide.is_finite() {
                                return Err(LeafError::OutOfRange {
                                    type_path: stringify!($ty),
                                    literal: lit.text.to_string(),
                                });
                            }
                            Ok(Box::new(value))
                        },
                        |value| {
                            let value = expect_self::<$ty>(value)?;
                            if !value.is_finite() {
                                return Err(LeafError::NonFinite {
                                    type_path: stringify!($ty),
                                });
                            }
                            Ok(ScalarForm::Number(value.to_string()))
                        },
                    ))
                })
            }
        }
    };
}

impl_float_leaf!(f32);
impl_float_leaf!(f64);

// -----------------------------------------------------------------------------
// bool / char / String

impl_type_path_primitive!(bool);
impl_reflect_leaf!(bool);
impl_get_type_meta_leaf!(bool);

impl Typed for bool {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Leaf(
                LeafInfo::new::<bool>(
                    |input| match input {
                        ScalarInput::Bool(value) => Ok(Box::new(value)),
                        other => Err(LeafError::UnexpectedInput {
                            expected: "boolean",
                            received: other.description(),
                        }),
                    },
                    |value| {
                        let value = expect_self::<bool>(value)?;
                        Ok(ScalarForm::Bool(*value))
                    },
                )
                .with_key_codec(
                    |value| {
                        let value = expect_self::<bool>(value)?;
                        Ok(KeyForm {
                            text: value.to_string(),
                            normalize: false,
                        })
                    },
                    |text| match text {
                        "true" => Ok(Box::new(true)),
                        "false" => Ok(Box::new(false)),
                        other => Err(LeafError::Malformed {
                            type_path: "bool",
                            literal: other.to_string(),
                        }),
                    },
                ),
            )
        })
    }
}

impl_type_path_primitive!(char);
impl_reflect_leaf!(char);
impl_get_type_meta_leaf!(char);

impl Typed for char {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Leaf(
                LeafInfo::new::<char>(
                    |input| match input {
                        ScalarInput::Text(text) => {
                            let mut chars = text.chars();
                            match (chars.next(), chars.next()) {
                                (Some(value), None) => Ok(Box::new(value)),
                                _ => Err(LeafError::Malformed {
                                    type_path: "char",
                                    literal: text.to_string(),
                                }),
                            }
                        }
                        other => Err(LeafError::UnexpectedInput {
                            expected: "single-character string",
                            received: other.description(),
                        }),
                    },
                    |value| {
                        let value = expect_self::<char>(value)?;
                        Ok(ScalarForm::Text(value.to_string()))
                    },
                )
                .with_key_codec(
                    |value| {
                        let value = expect_self::<char>(value)?;
                        Ok(KeyForm {
                            text: value.to_string(),
                            normalize: false,
                        })
                    },
                    |text| {
                        let mut chars = text.chars();
                        match (chars.next(), chars.next()) {
                            (Some(value), None) => Ok(Box::new(value)),
                            _ => Err(LeafError::Malformed {
                                type_path: "char",
                                literal: text.to_string(),
                            }),
                        }
                    },
                ),
            )
        })
    }
}

impl_type_path_named!(String, "std::string", "String");
impl_reflect_leaf!(String);
impl_get_type_meta_leaf!(String);

impl Typed for String {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Leaf(
                LeafInfo::new::<String>(
                    |input| match input {
                        ScalarInput::Text(text) => Ok(Box::new(text.to_string())),
                        other => Err(LeafError::UnexpectedInput {
                            expected: "string",
                            received: other.description(),
                        }),
                    },
                    |value| {
                        let value = expect_self::<String>(value)?;
                        Ok(ScalarForm::Text(value.clone()))
                    },
                )
                .with_key_codec(
                    |value| {
                        let value = expect_self::<String>(value)?;
                        Ok(KeyForm {
                            text: value.clone(),
                            normalize: false,
                        })
                    },
                    |text| Ok(Box::new(text.to_string())),
                ),
            )
        })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::info::{NumberKind, NumberLiteral, ScalarInput, Typed};

    fn parse_int<T: Typed>(text: &str, kind: NumberKind) -> Result<T, crate::info::LeafError>
    where
        T: 'static,
    {
        let info = T::type_info();
        let leaf = info.as_leaf().unwrap();
        leaf.parse(ScalarInput::Number(NumberLiteral { text, kind }))
            .map(|value| value.take::<T>().unwrap())
    }

    #[test]
    fn exact_width_boundaries() {
        assert_eq!(
            parse_int::<i32>("2147483647", NumberKind::Unsigned).unwrap(),
            i32::MAX
        );
        assert_eq!(
            parse_int::<i32>("-2147483648", NumberKind::Signed).unwrap(),
            i32::MIN
        );
        assert!(parse_int::<i32>("2147483648", NumberKind::Unsigned).is_err());
        assert_eq!(
            parse_int::<i64>("2147483648", NumberKind::Unsigned).unwrap(),
            2_147_483_648
        );
    }

    #[test]
    fn fractional_rejected_for_integers() {
        assert!(parse_int::<i32>("1.5", NumberKind::Float).is_err());
        assert_eq!(parse_int::<i32>("2.0", NumberKind::Float).unwrap(), 2);
    }

    #[test]
    fn unsigned_rejects_negative() {
        assert!(parse_int::<u8>("-1", NumberKind::Signed).is_err());
        assert_eq!(parse_int::<u8>("255", NumberKind::Unsigned).unwrap(), 255);
    }

    #[test]
    fn int128_full_range() {
        assert_eq!(
            parse_int::<u128>("18446744073709551616", NumberKind::Unsigned).unwrap(),
            1u128 << 64
        );
    }
}
