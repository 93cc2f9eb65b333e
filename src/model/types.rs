//! Type descriptors for bound members and value factories

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target type of a binding
///
/// Used as the key of the value factory registry and as the declared type of
/// accessors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Text, decoded as-is
    String,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    Long,
    /// 64-bit float
    Double,
    /// 32-bit float
    Float,
    /// Boolean flag
    Boolean,
    /// Calendar date without time
    Date,
    /// File system path
    File,
    /// Absolute URL
    Url,
    /// Reference to a class resolved through the context's class loader
    Class,
    /// Resource resolved against the context's resource root
    Resource,

    /// Homogeneous list of the inner type
    List(Box<ValueType>),
    /// String-keyed map of the inner type
    Map(Box<ValueType>),
    /// Object built from a registered descriptor
    Object(String),
    /// Host-defined type with its own value factory
    Custom(String),

    /// Unknown member type
    Any,
}

impl ValueType {
    /// Name used in messages and signatures
    pub fn type_name(&self) -> String {
        match self {
            ValueType::String => "String".to_string(),
            ValueType::Integer => "Integer".to_string(),
            ValueType::Long => "Long".to_string(),
            ValueType::Double => "Double".to_string(),
            ValueType::Float => "Float".to_string(),
            ValueType::Boolean => "Boolean".to_string(),
            ValueType::Date => "Date".to_string(),
            ValueType::File => "File".to_string(),
            ValueType::Url => "URL".to_string(),
            ValueType::Class => "Class".to_string(),
            ValueType::Resource => "Resource".to_string(),
            ValueType::List(inner) => format!("List<{}>", inner.type_name()),
            ValueType::Map(inner) => format!("Map<String, {}>", inner.type_name()),
            ValueType::Object(name) | ValueType::Custom(name) => name.clone(),
            ValueType::Any => "Any".to_string(),
        }
    }

    /// True for the types that ship with a built-in value factory
    pub fn is_builtin(&self) -> bool {
        matches!(
            self,
            ValueType::String
                | ValueType::Integer
                | ValueType::Long
                | ValueType::Double
                | ValueType::Float
                | ValueType::Boolean
                | ValueType::Date
                | ValueType::File
                | ValueType::Url
                | ValueType::Class
                | ValueType::Resource
        )
    }

    /// True if values of this type name a class
    pub fn is_class(&self) -> bool {
        match self {
            ValueType::Class => true,
            ValueType::List(inner) | ValueType::Map(inner) => inner.is_class(),
            _ => false,
        }
    }

    /// Element type of a list or map, the type itself otherwise
    pub fn item_type(&self) -> &ValueType {
        match self {
            ValueType::List(inner) | ValueType::Map(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// Error returned when a type name is not one of the built-in names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown value type '{0}'")]
pub struct UnknownValueType(pub String);

impl FromStr for ValueType {
    type Err = UnknownValueType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Ok(ValueType::String),
            "integer" | "int" => Ok(ValueType::Integer),
            "long" => Ok(ValueType::Long),
            "double" => Ok(ValueType::Double),
            "float" => Ok(ValueType::Float),
            "boolean" | "bool" => Ok(ValueType::Boolean),
            "date" => Ok(ValueType::Date),
            "file" | "path" => Ok(ValueType::File),
            "url" => Ok(ValueType::Url),
            "class" => Ok(ValueType::Class),
            "resource" => Ok(ValueType::Resource),
            _ => Err(UnknownValueType(s.to_string())),
        }
    }
}
