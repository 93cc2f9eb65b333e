use crate::context::Context;
use crate::error::MappingResult;
use crate::model::{Value, ValueType};
use crate::registry::{ValueFactory, unexpected_value};

/// Resource paths resolved against the context's resource root
pub struct ResourceValueFactory;

impl ValueFactory for ResourceValueFactory {
    fn value_type(&self) -> ValueType {
        ValueType::Resource
    }

    fn deserialize(&self, context: &Context, value: &str) -> MappingResult<Value> {
        Ok(Value::Resource(context.resolve_resource(value)))
    }

    fn serialize(&self, _context: &Context, value: &Value) -> MappingResult<String> {
        match value {
            Value::Resource(resource) => Ok(resource.to_string()),
            other => Err(unexpected_value(other, ValueType::Resource)),
        }
    }
}
