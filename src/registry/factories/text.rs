//! Text factory

use crate::context::Context;
use crate::error::MappingResult;
use crate::model::{Value, ValueType};
use crate::registry::{ValueFactory, unexpected_value};

/// Identity conversion for text members
pub struct StringValueFactory;

impl ValueFactory for StringValueFactory {
    fn value_type(&self) -> ValueType {
        ValueType::String
    }

    fn deserialize(&self, _context: &Context, value: &str) -> MappingResult<Value> {
        Ok(Value::String(value.to_string()))
    }

    fn serialize(&self, _context: &Context, value: &Value) -> MappingResult<String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(unexpected_value(other, ValueType::String)),
        }
    }
}
