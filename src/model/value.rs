//! Core value types exchanged between value factories and accessors

use chrono::NaiveDate;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

use super::types::ValueType;

/// Type-erased handle to a host value or to an object under construction
pub type ObjectHandle = Arc<dyn Any + Send + Sync>;

/// Mapped objects are shared so deferred bindings can still reach them after
/// the load call returned
pub type Shared<T> = Arc<Mutex<T>>;

/// Wrap a value into a [`Shared`] handle
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Dynamic value produced by value factories and consumed by accessors
#[derive(Clone, Debug)]
pub enum Value {
    /// Text value
    String(String),

    /// 32-bit integer
    Integer(i32),

    /// 64-bit integer
    Long(i64),

    /// 64-bit float
    Double(f64),

    /// 32-bit float
    Float(f32),

    /// Boolean value
    Boolean(bool),

    /// Date without time
    Date(NaiveDate),

    /// File system path, not checked for existence
    File(PathBuf),

    /// Absolute URL
    Url(Url),

    /// Resolved class reference
    Class(ClassRef),

    /// Resolved resource
    Resource(Resource),

    /// Items of a node list
    List(Vec<Value>),

    /// Items of a node map, in document order
    Map(IndexMap<String, Value>),

    /// Mapped object or opaque host value
    Object(ObjectHandle),

    /// Null value
    Empty,
}

impl Value {
    /// Name of the variant, used in mismatch messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "String",
            Value::Integer(_) => "Integer",
            Value::Long(_) => "Long",
            Value::Double(_) => "Double",
            Value::Float(_) => "Float",
            Value::Boolean(_) => "Boolean",
            Value::Date(_) => "Date",
            Value::File(_) => "File",
            Value::Url(_) => "URL",
            Value::Class(_) => "Class",
            Value::Resource(_) => "Resource",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Object(_) => "Object",
            Value::Empty => "Empty",
        }
    }

    /// Check whether this is the null value
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Whether this value may be stored in a member declared as `value_type`
    pub fn conforms_to(&self, value_type: &ValueType) -> bool {
        match (self, value_type) {
            (Value::Empty, _) | (_, ValueType::Any) => true,
            (Value::String(_), ValueType::String)
            | (Value::Integer(_), ValueType::Integer)
            | (Value::Long(_), ValueType::Long)
            | (Value::Double(_), ValueType::Double)
            | (Value::Float(_), ValueType::Float)
            | (Value::Boolean(_), ValueType::Boolean)
            | (Value::Date(_), ValueType::Date)
            | (Value::File(_), ValueType::File)
            | (Value::Url(_), ValueType::Url)
            | (Value::Class(_), ValueType::Class)
            | (Value::Resource(_), ValueType::Resource)
            | (Value::Object(_), ValueType::Object(_) | ValueType::Custom(_)) => true,
            (Value::List(items), ValueType::List(inner)) => {
                items.iter().all(|item| item.conforms_to(inner))
            }
            (Value::Map(items), ValueType::Map(inner)) => {
                items.values().all(|item| item.conforms_to(inner))
            }
            _ => false,
        }
    }

    /// Borrow the text of a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the class of a class value
    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Downcast an object value to its concrete type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Value::Object(handle) => handle.clone().downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::File(a), Value::File(b)) => a == b,
            (Value::Url(a), Value::Url(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Resource(a), Value::Resource(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // objects have identity, not value equality
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Empty, Value::Empty) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Long(l) => write!(f, "{l}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::File(p) => write!(f, "{}", p.display()),
            Value::Url(u) => f.write_str(u.as_str()),
            Value::Class(c) => write!(f, "{c}"),
            Value::Resource(r) => write!(f, "{r}"),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Map(items) => {
                let items: Vec<String> = items.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Value::Object(_) => f.write_str("<object>"),
            Value::Empty => f.write_str("<empty>"),
        }
    }
}

/// Reference to a loadable class
///
/// A class is identified by its fully qualified name; when it stands for a
/// Rust type the [`TypeId`] is recorded as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassRef {
    name: Arc<str>,
    type_id: Option<TypeId>,
}

impl ClassRef {
    /// A class known only by name
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            type_id: None,
        }
    }

    /// A class standing for the Rust type `T`
    pub fn of<T: Any>(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            type_id: Some(TypeId::of::<T>()),
        }
    }

    /// Fully qualified class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type id of the Rust type, if any
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    /// Check whether this class stands for `T`
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == Some(TypeId::of::<T>())
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Resource referenced from a document
///
/// Holds the path as written and the URL it resolved to, if the context
/// could resolve it. Resolved resources are equal when their URLs are.
#[derive(Debug, Clone)]
pub struct Resource {
    path: String,
    url: Option<Url>,
}

impl Resource {
    /// Create a resource for `path` resolved to `url`
    pub fn new(path: impl Into<String>, url: Option<Url>) -> Self {
        Self {
            path: path.into(),
            url,
        }
    }

    /// Path as written in the document
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolved location
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Check whether the resource could be resolved
    pub fn is_resolved(&self) -> bool {
        self.url.is_some()
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        match (&self.url, &other.url) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.path == other.path,
            _ => false,
        }
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.url {
            Some(url) => url.hash(state),
            None => self.path.hash(state),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => f.write_str(url.as_str()),
            None => f.write_str(&self.path),
        }
    }
}
