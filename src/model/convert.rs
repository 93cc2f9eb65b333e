//! Conversions between [`Value`] and concrete member types

use chrono::NaiveDate;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::any::Any;
use std::path::PathBuf;
use url::Url;

use super::value::{ClassRef, ObjectHandle, Resource, Shared, Value};

/// Result type for value conversions
pub type ConversionResult<T> = Result<T, TypeMismatch>;

/// A value did not have the variant a member expects
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected}, got {actual}")]
pub struct TypeMismatch {
    /// Expected type name
    pub expected: &'static str,
    /// Type name of the rejected value
    pub actual: &'static str,
}

impl TypeMismatch {
    fn new(expected: &'static str, value: &Value) -> Self {
        Self {
            expected,
            actual: value.type_name(),
        }
    }
}

/// Extract a member value from a decoded [`Value`]
pub trait FromValue: Sized {
    /// Convert, failing when the variant does not match
    fn from_value(value: Value) -> ConversionResult<Self>;
}

/// Turn a member value back into a [`Value`]
pub trait IntoValue {
    /// Convert into a dynamic value
    fn into_value(self) -> Value;
}

macro_rules! scalar_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> ConversionResult<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(TypeMismatch::new(stringify!($variant), &other)),
                    }
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    };
}

scalar_conversions! {
    String => String,
    i32 => Integer,
    i64 => Long,
    f64 => Double,
    f32 => Float,
    bool => Boolean,
    NaiveDate => Date,
    PathBuf => File,
    Url => Url,
    ClassRef => Class,
    Resource => Resource,
}

impl FromValue for Value {
    fn from_value(value: Value) -> ConversionResult<Self> {
        Ok(value)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> ConversionResult<Self> {
        match value {
            Value::Empty => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Empty, IntoValue::into_value)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> ConversionResult<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(TypeMismatch::new("List", &other)),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    fn from_value(value: Value) -> ConversionResult<Self> {
        match value {
            Value::Map(items) => items
                .into_iter()
                .map(|(key, item)| T::from_value(item).map(|item| (key, item)))
                .collect(),
            other => Err(TypeMismatch::new("Map", &other)),
        }
    }
}

impl<T: IntoValue> IntoValue for IndexMap<String, T> {
    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(key, item)| (key, item.into_value()))
                .collect(),
        )
    }
}

impl<T: Any + Send> FromValue for Shared<T> {
    fn from_value(value: Value) -> ConversionResult<Self> {
        match value {
            Value::Object(handle) => handle
                .downcast::<Mutex<T>>()
                .map_err(|_| TypeMismatch {
                    expected: std::any::type_name::<T>(),
                    actual: "Object",
                }),
            other => Err(TypeMismatch::new(std::any::type_name::<T>(), &other)),
        }
    }
}

impl<T: Any + Send> IntoValue for Shared<T> {
    fn into_value(self) -> Value {
        let handle: ObjectHandle = self;
        Value::Object(handle)
    }
}
