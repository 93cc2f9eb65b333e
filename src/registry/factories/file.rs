use std::path::PathBuf;

use crate::context::Context;
use crate::error::MappingResult;
use crate::model::{Value, ValueType};
use crate::registry::{ValueFactory, unexpected_value};

/// File paths; encoding keeps only the final path segment
pub struct FileValueFactory;

impl ValueFactory for FileValueFactory {
    fn value_type(&self) -> ValueType {
        ValueType::File
    }

    fn deserialize(&self, _context: &Context, value: &str) -> MappingResult<Value> {
        Ok(Value::File(PathBuf::from(value)))
    }

    fn serialize(&self, _context: &Context, value: &Value) -> MappingResult<String> {
        match value {
            Value::File(path) => Ok(path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()),
            other => Err(unexpected_value(other, ValueType::File)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_is_lossy() {
        let ctx = Context::new();
        let value = FileValueFactory.deserialize(&ctx, "/var/lib/app/data.bin").unwrap();
        assert_eq!(value, Value::File(PathBuf::from("/var/lib/app/data.bin")));
        assert_eq!(FileValueFactory.serialize(&ctx, &value).unwrap(), "data.bin");
    }
}
