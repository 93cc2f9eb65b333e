//! URL factory

use url::Url;

use crate::context::Context;
use crate::error::{MappingError, MappingResult};
use crate::model::{Value, ValueType};
use crate::registry::{ValueFactory, unexpected_value};

/// Absolute URLs
pub struct UrlValueFactory;

impl ValueFactory for UrlValueFactory {
    fn value_type(&self) -> ValueType {
        ValueType::Url
    }

    fn deserialize(&self, _context: &Context, value: &str) -> MappingResult<Value> {
        Url::parse(value)
            .map(Value::Url)
            .map_err(|e| MappingError::conversion(value, ValueType::Url, e))
    }

    fn serialize(&self, _context: &Context, value: &Value) -> MappingResult<String> {
        match value {
            Value::Url(url) => Ok(url.as_str().to_string()),
            other => Err(unexpected_value(other, ValueType::Url)),
        }
    }
}
