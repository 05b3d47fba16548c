//! Reflection implementations for the standard containers.

use std::collections::{BTreeMap, HashMap};

use crate::Reflect;
use crate::impls::{GenericTypeInfoCell, GenericTypePathCell};
use crate::info::{DynamicTypePath, ListInfo, MapInfo, OptionalInfo, TypeInfo, TypePath, Typed};
use crate::ops::{
    ReflectList, ReflectMap, ReflectMut, ReflectOptional, ReflectRef, SlotError,
};
use crate::registry::{FromType, GetTypeMeta, TypeMeta, TypeRegistry, TypeTraitDefault};

// -----------------------------------------------------------------------------
// Shared pieces

fn mismatch(expected: &'static str, received: Box<dyn Reflect>) -> SlotError {
    SlotError::Mismatch {
        expected,
        received: received.reflect_type_path(),
    }
}

macro_rules! impl_reflect_cast_fns {
    ($variant:ident) => {
        #[inline]
        fn as_any(&self) -> &dyn ::core::any::Any {
            self
        }

        #[inline]
        fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
            self
        }

        #[inline]
        fn into_any(self: Box<Self>) -> Box<dyn ::core::any::Any> {
            self
        }

        #[inline]
        fn as_reflect(&self) -> &dyn Reflect {
            self
        }

        #[inline]
        fn as_reflect_mut(&mut self) -> &mut dyn Reflect {
            self
        }

        #[inline]
        fn into_reflect(self: Box<Self>) -> Box<dyn Reflect> {
            self
        }

        #[inline]
        fn reflect_ref(&self) -> ReflectRef<'_> {
            ReflectRef::$variant(self)
        }

        #[inline]
        fn reflect_mut(&mut self) -> ReflectMut<'_> {
            ReflectMut::$variant(self)
        }
    };
}

// -----------------------------------------------------------------------------
// Vec<T>

impl<T: Reflect + Typed> TypePath for Vec<T> {
    fn type_path() -> &'static str {
        static CELL: GenericTypePathCell = GenericTypePathCell::new();
        CELL.get_or_insert::<Self>(|| format!("std::vec::Vec<{}>", T::type_path()))
    }

    fn type_name() -> &'static str {
        static CELL: GenericTypePathCell = GenericTypePathCell::new();
        CELL.get_or_insert::<Self>(|| format!("Vec<{}>", T::type_name()))
    }

    fn type_ident() -> &'static str {
        "Vec"
    }

    fn module_path() -> Option<&'static str> {
        Some("std::vec")
    }
}

impl<T: Reflect + Typed> Typed for Vec<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::List(ListInfo::new::<Self, T>(|| Box::new(Vec::<T>::new())))
        })
    }
}

impl<T: Reflect + Typed> Reflect for Vec<T> {
    impl_reflect_cast_fns!(List);
}

impl<T: Reflect + Typed> ReflectList for Vec<T> {
    #[inline]
    fn element_len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn element(&self, index: usize) -> Option<&dyn Reflect> {
        self.get(index).map(T::as_reflect)
    }

    #[inline]
    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.get_mut(index).map(T::as_reflect_mut)
    }

    fn push_element(&mut self, value: Box<dyn Reflect>) -> Result<(), SlotError> {
        let value = value
            .take::<T>()
            .map_err(|value| mismatch(T::type_path(), value))?;
        self.push(value);
        Ok(())
    }
}

impl<T: Reflect + Typed + GetTypeMeta> GetTypeMeta for Vec<T> {
    fn get_type_meta() -> TypeMeta {
        let mut meta = TypeMeta::of::<Self>();
        meta.insert_trait::<TypeTraitDefault>(FromType::<Self>::from_type());
        meta
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

// -----------------------------------------------------------------------------
// Maps

macro_rules! impl_reflect_map {
    ($map:ident, $module:literal $(, $extra_bound:path)*) => {
        impl<K, V> TypePath for $map<K, V>
        where
            K: Reflect + Typed $(+ $extra_bound)*,
            V: Reflect + Typed,
        {
            fn type_path() -> &'static str {
                static CELL: GenericTypePathCell = GenericTypePathCell::new();
                CELL.get_or_insert::<Self>(|| {
                    format!(
                        concat!($module, "::", stringify!($map), "<{}, {}>"),
                        K::type_path(),
                        V::type_path()
                    )
                })
            }

            fn type_name() -> &'static str {
                static CELL: GenericTypePathCell = GenericTypePathCell::new();
                CELL.get_or_insert::<Self>(|| {
                    format!(
                        concat!(stringify!($map), "<{}, {}>"),
                        K::type_name(),
                        V::type_name()
                    )
                })
            }

            fn type_ident() -> &'static str {
                stringify!($map)
            }

            fn module_path() -> Option<&'static str> {
                Some($module)
            }
        }

        impl<K, V> Typed for $map<K, V>
        where
            K: Reflect + Typed $(+ $extra_bound)*,
            V: Reflect + Typed,
        {
            fn type_info() -> &'static TypeInfo {
                static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
                CELL.get_or_insert::<Self>(|| {
                    TypeInfo::Map(MapInfo::new::<Self, K, V>(|| {
                        Box::new(<$map<K, V>>::new())
                    }))
                })
            }
        }

        impl<K, V> Reflect for $map<K, V>
        where
            K: Reflect + Typed $(+ $extra_bound)*,
            V: Reflect + Typed,
        {
            impl_reflect_cast_fns!(Map);
        }

        impl<K, V> ReflectMap for $map<K, V>
        where
            K: Reflect + Typed $(+ $extra_bound)*,
            V: Reflect + Typed,
        {
            #[inline]
            fn entry_len(&self) -> usize {
                self.len()
            }

            fn entry_at(&self, index: usize) -> Option<(&dyn Reflect, &dyn Reflect)> {
                self.iter()
                    .nth(index)
                    .map(|(key, value)| (key.as_reflect(), value.as_reflect()))
            }

            fn insert_entry(
                &mut self,
                key: Box<dyn Reflect>,
                value: Box<dyn Reflect>,
            ) -> Result<(), SlotError> {
                let key = key
                    .take::<K>()
                    .map_err(|key| mismatch(K::type_path(), key))?;
                let value = value
                    .take::<V>()
                    .map_err(|value| mismatch(V::type_path(), value))?;
                self.insert(key, value);
                Ok(())
            }
        }

        impl<K, V> GetTypeMeta for $map<K, V>
        where
            K: Reflect + Typed + GetTypeMeta $(+ $extra_bound)*,
            V: Reflect + Typed + GetTypeMeta,
        {
            fn get_type_meta() -> TypeMeta {
                let mut meta = TypeMeta::of::<Self>();
                meta.insert_trait::<TypeTraitDefault>(FromType::<Self>::from_type());
                meta
            }

            fn register_dependencies(registry: &mut TypeRegistry) {
                registry.register::<K>();
                registry.register::<V>();
            }
        }
    };
}

impl_reflect_map!(HashMap, "std::collections", std::hash::Hash, Eq);
impl_reflect_map!(BTreeMap, "std::collections", Ord);

// -----------------------------------------------------------------------------
// Option<T>

impl<T: Reflect + Typed> TypePath for Option<T> {
    fn type_path() -> &'static str {
        static CELL: GenericTypePathCell = GenericTypePathCell::new();
        CELL.get_or_insert::<Self>(|| format!("core::option::Option<{}>", T::type_path()))
    }

    fn type_name() -> &'static str {
        static CELL: GenericTypePathCell = GenericTypePathCell::new();
        CELL.get_or_insert::<Self>(|| format!("Option<{}>", T::type_name()))
    }

    fn type_ident() -> &'static str {
        "Option"
    }

    fn module_path() -> Option<&'static str> {
        Some("core::option")
    }
}

impl<T: Reflect + Typed> Typed for Option<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Optional(OptionalInfo::new::<Self, T>(
                || Box::new(None::<T>),
                |inner| {
                    inner
                        .take::<T>()
                        .map(|value| Box::new(Some(value)) as Box<dyn Reflect>)
                        .map_err(|inner| mismatch(T::type_path(), inner))
                },
            ))
        })
    }
}

impl<T: Reflect + Typed> Reflect for Option<T> {
    impl_reflect_cast_fns!(Optional);
}

impl<T: Reflect + Typed> ReflectOptional for Option<T> {
    #[inline]
    fn inner(&self) -> Option<&dyn Reflect> {
        self.as_ref().map(T::as_reflect)
    }

    #[inline]
    fn inner_mut(&mut self) -> Option<&mut dyn Reflect> {
        self.as_mut().map(T::as_reflect_mut)
    }
}

impl<T: Reflect + Typed + GetTypeMeta> GetTypeMeta for Option<T> {
    fn get_type_meta() -> TypeMeta {
        let mut meta = TypeMeta::of::<Self>();
        meta.insert_trait::<TypeTraitDefault>(FromType::<Self>::from_type());
        meta
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::info::{ReflectKind, TypePath, Typed};
    use crate::ops::ReflectList;

    #[test]
    fn vec_paths_compose() {
        assert_eq!(<Vec<u64> as TypePath>::type_path(), "std::vec::Vec<u64>");
        assert_eq!(<Vec<u64> as TypePath>::type_name(), "Vec<u64>");
        assert_eq!(<Vec<u64> as TypePath>::type_ident(), "Vec");
    }

    #[test]
    fn vec_info_is_list() {
        let info = <Vec<String> as Typed>::type_info();
        assert_eq!(info.kind(), ReflectKind::List);
        let list = info.as_list().unwrap();
        assert_eq!(list.element().type_path(), "std::string::String");
    }

    #[test]
    fn push_rejects_wrong_element() {
        let mut list: Vec<u32> = Vec::new();
        assert!(list.push_element(Box::new(7u32)).is_ok());
        assert!(list.push_element(Box::new("seven".to_string())).is_err());
        assert_eq!(list, vec![7]);
    }
}
