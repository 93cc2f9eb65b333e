//! Class reference factory

use crate::context::Context;
use crate::error::MappingResult;
use crate::model::{Value, ValueType};
use crate::registry::{ValueFactory, unexpected_value};

/// Class names resolved through the context's class loader
pub struct ClassValueFactory;

impl ValueFactory for ClassValueFactory {
    fn value_type(&self) -> ValueType {
        ValueType::Class
    }

    fn deserialize(&self, context: &Context, value: &str) -> MappingResult<Value> {
        context.load_class(value).map(Value::Class)
    }

    fn serialize(&self, _context: &Context, value: &Value) -> MappingResult<String> {
        match value {
            Value::Class(class) => Ok(class.name().to_string()),
            other => Err(unexpected_value(other, ValueType::Class)),
        }
    }
}
