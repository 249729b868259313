//! Bridges between Rust types and materialized values
//!
//! [`Describe`] tells the catalog what shape a Rust type has, and
//! [`FromValue`] pulls the Rust value back out of the materialized graph.
//! Both are implemented for the common standard library types and can be
//! derived for structs with `#[derive(Graft)]`.

use crate::{
    Error, ErrorKind, Instance, ListRef, MapRef, ObjectRef, RawJson, Scalar, ScalarKind,
    TypeCatalog, TypeRef, Value,
};
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// A Rust type with a static description
pub trait Describe {
    /// The type reference the materializer targets for this type
    fn type_ref() -> TypeRef;

    /// Register the descriptors this type relies on
    fn register(catalog: &TypeCatalog) -> Result<(), Error> {
        let _ = catalog;
        Ok(())
    }
}

/// Extraction of a Rust value out of a materialized value.
///
/// Extraction walks the graph by value, so a graph with cycles can only be
/// extracted through [`ObjectRef`] members.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, Error>;
}

fn extract(expected: &'static str, found: &Value) -> Error {
    Error::new(ErrorKind::Extract {
        expected,
        found: found.kind_name(),
    })
}

macro_rules! scalar_impls {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn type_ref() -> TypeRef {
                    TypeRef::Scalar(ScalarKind::$kind)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, Error> {
                    match value {
                        Value::Scalar(x) => match x.convert(ScalarKind::$kind)? {
                            Scalar::$kind(x) => Ok(x),
                            x => Err(extract(ScalarKind::$kind.name(), &Value::Scalar(x))),
                        },
                        x => Err(extract(ScalarKind::$kind.name(), &x)),
                    }
                }
            }
        )*
    };
}

scalar_impls!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    DateTime<Utc> => Date,
);

impl<T: Describe> Describe for Option<T> {
    fn type_ref() -> TypeRef {
        T::type_ref()
    }

    fn register(catalog: &TypeCatalog) -> Result<(), Error> {
        T::register(catalog)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Null | Value::DbNull => Ok(None),
            x => T::from_value(x).map(Some),
        }
    }
}

impl<T: Describe> Describe for Box<T> {
    fn type_ref() -> TypeRef {
        T::type_ref()
    }

    fn register(catalog: &TypeCatalog) -> Result<(), Error> {
        T::register(catalog)
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: Value) -> Result<Self, Error> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn type_ref() -> TypeRef {
        TypeRef::list(T::type_ref())
    }

    fn register(catalog: &TypeCatalog) -> Result<(), Error> {
        T::register(catalog)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, Error> {
        let list = match value {
            Value::List(list) => list,
            x => return Err(extract("list", &x)),
        };

        list.to_vec()
            .into_iter()
            .enumerate()
            .map(|(i, x)| T::from_value(x).map_err(|e| e.at_index(i)))
            .collect()
    }
}

/// Read map entries, converting keys through their scalar value
fn map_entries<K, V, F>(value: Value, mut sink: F) -> Result<(), Error>
where
    K: FromValue,
    V: FromValue,
    F: FnMut(K, V),
{
    let map = match value {
        Value::Map(map) => map,
        x => return Err(extract("map", &x)),
    };

    for (key, value) in map.to_vec() {
        let name = key.to_string();
        let key = K::from_value(Value::Scalar(key)).map_err(|e| e.at_property(&name))?;
        let value = V::from_value(value).map_err(|e| e.at_property(&name))?;
        sink(key, value);
    }

    Ok(())
}

macro_rules! map_impls {
    ($($map:ident where $($bound:path),+;)*) => {
        $(
            impl<K, V> Describe for $map<K, V>
            where
                K: Describe,
                V: Describe,
            {
                fn type_ref() -> TypeRef {
                    TypeRef::map(K::type_ref(), V::type_ref())
                }

                fn register(catalog: &TypeCatalog) -> Result<(), Error> {
                    K::register(catalog)?;
                    V::register(catalog)
                }
            }

            impl<K, V> FromValue for $map<K, V>
            where
                K: FromValue $(+ $bound)+,
                V: FromValue,
            {
                fn from_value(value: Value) -> Result<Self, Error> {
                    let mut result = $map::new();
                    map_entries(value, |k: K, v: V| {
                        result.insert(k, v);
                    })?;
                    Ok(result)
                }
            }
        )*
    };
}

map_impls!(
    HashMap where Eq, Hash;
    BTreeMap where Ord;
    IndexMap where Eq, Hash;
);

impl Describe for serde_json::Value {
    fn type_ref() -> TypeRef {
        TypeRef::Tree
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Tree(x) => Ok(x),
            Value::Null | Value::DbNull => Ok(serde_json::Value::Null),
            Value::Scalar(x) => Ok(scalar_to_tree(x)),
            x => Err(extract("tree", &x)),
        }
    }
}

fn scalar_to_tree(scalar: Scalar) -> serde_json::Value {
    use serde_json::Value as Json;
    match scalar {
        Scalar::Bool(x) => Json::Bool(x),
        Scalar::I8(x) => Json::from(x),
        Scalar::I16(x) => Json::from(x),
        Scalar::I32(x) => Json::from(x),
        Scalar::I64(x) => Json::from(x),
        Scalar::U8(x) => Json::from(x),
        Scalar::U16(x) => Json::from(x),
        Scalar::U32(x) => Json::from(x),
        Scalar::U64(x) => Json::from(x),
        Scalar::F32(x) => Json::from(x),
        Scalar::F64(x) => Json::from(x),
        Scalar::Char(x) => Json::String(x.to_string()),
        Scalar::String(x) => Json::String(x),
        Scalar::Date(x) => Json::String(x.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Scalar::Enum(x) => Json::String(x.name().to_string()),
    }
}

impl Describe for RawJson {
    fn type_ref() -> TypeRef {
        TypeRef::Raw
    }
}

impl FromValue for RawJson {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Raw(x) => Ok(x),
            x => Err(extract("raw json", &x)),
        }
    }
}

impl Describe for Value {
    fn type_ref() -> TypeRef {
        TypeRef::Any
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, Error> {
        Ok(value)
    }
}

/// Shared instances are materialized from untyped data, so a `$type` picks
/// the object's shape
impl Describe for ObjectRef {
    fn type_ref() -> TypeRef {
        TypeRef::Any
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(x) => Ok(x),
            x => Err(extract("object", &x)),
        }
    }
}

impl Describe for ListRef {
    fn type_ref() -> TypeRef {
        TypeRef::list(TypeRef::Any)
    }
}

impl FromValue for ListRef {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::List(x) => Ok(x),
            x => Err(extract("list", &x)),
        }
    }
}

impl Describe for MapRef {
    fn type_ref() -> TypeRef {
        TypeRef::map(TypeRef::Scalar(ScalarKind::String), TypeRef::Any)
    }
}

impl FromValue for MapRef {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Map(x) => Ok(x),
            x => Err(extract("map", &x)),
        }
    }
}

/// Support for code generated by `#[derive(Graft)]`
#[doc(hidden)]
pub mod __private {
    use super::*;

    pub fn object(value: Value) -> Result<ObjectRef, Error> {
        ObjectRef::from_value(value)
    }

    /// Extract a member, treating an unset member as null
    pub fn field<T: FromValue>(instance: &Instance, member: &str) -> Result<T, Error> {
        let value = instance.get(member).cloned().unwrap_or(Value::Null);
        T::from_value(value).map_err(|e| e.at_property(member))
    }

    /// Extract a member, falling back to the default when it is unset or null
    pub fn field_or_default<T: FromValue + Default>(instance: &Instance, member: &str) -> Result<T, Error> {
        match instance.get(member) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(x) => T::from_value(x.clone()).map_err(|e| e.at_property(member)),
        }
    }
}
