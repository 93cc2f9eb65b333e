//! Value factory registry
//!
//! Value factories convert between XML text and typed [`Value`]s, one
//! factory per [`ValueType`]. A registry is filled once, before any document
//! is loaded, and only read afterwards.

#![warn(missing_docs)]

pub mod factories;

pub use factories::{
    BooleanValueFactory, ClassValueFactory, DateValueFactory, DoubleValueFactory,
    FileValueFactory, FloatValueFactory, IntegerValueFactory, LongValueFactory,
    ResourceValueFactory, StringValueFactory, UrlValueFactory, register_builtin_factories,
};

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::MapperConfig;
use crate::context::Context;
use crate::dom::Element;
use crate::error::{MappingError, MappingResult};
use crate::model::{Value, ValueType};

/// Converter between XML text and values of one type
///
/// Implementations must be pure functions of their arguments so one
/// instance can serve every binding of its type.
pub trait ValueFactory: Send + Sync {
    /// Type this factory produces
    fn value_type(&self) -> ValueType;

    /// Decode `value`
    fn deserialize(&self, context: &Context, value: &str) -> MappingResult<Value>;

    /// Encode `value` back to text
    fn serialize(&self, context: &Context, value: &Value) -> MappingResult<String>;

    /// Decode the text content of `element`
    fn element_value(
        &self,
        context: &Context,
        element: &Element,
        trim: bool,
    ) -> MappingResult<Value> {
        let text = element.text_content();
        self.deserialize(context, if trim { text.trim() } else { &text })
    }

    /// Decode the attribute `name` of `element`; an absent attribute yields `None`
    fn attribute_value(
        &self,
        context: &Context,
        element: &Element,
        name: &str,
    ) -> MappingResult<Option<Value>> {
        element
            .attribute(name)
            .map(|text| self.deserialize(context, text))
            .transpose()
    }
}

/// Error for a value handed to the factory of another type
pub(crate) fn unexpected_value(value: &Value, target_type: ValueType) -> MappingError {
    MappingError::conversion(
        value.to_string(),
        target_type,
        format!("unexpected {} value", value.type_name()),
    )
}

/// Value factories keyed by target type
#[derive(Clone, Default)]
pub struct ValueFactoryRegistry {
    factories: FxHashMap<ValueType, Arc<dyn ValueFactory>>,
}

impl fmt::Debug for ValueFactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<String> = self.factories.keys().map(|t| t.type_name()).collect();
        types.sort();
        f.debug_struct("ValueFactoryRegistry")
            .field("types", &types)
            .finish()
    }
}

impl ValueFactoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in factories
    pub fn standard(config: &MapperConfig) -> Self {
        let mut registry = Self::new();
        register_builtin_factories(&mut registry, config);
        registry
    }

    /// Register `factory` for `value_type`, replacing any previous one
    pub fn register(
        &mut self,
        value_type: ValueType,
        factory: Arc<dyn ValueFactory>,
    ) -> Option<Arc<dyn ValueFactory>> {
        let previous = self.factories.insert(value_type.clone(), factory);
        if previous.is_some() {
            log::debug!("replaced value factory for {value_type}");
        } else {
            log::debug!("registered value factory for {value_type}");
        }
        previous
    }

    /// Register `factory` under the type it declares
    pub fn register_factory<F: ValueFactory + 'static>(&mut self, factory: F) {
        self.register(factory.value_type(), Arc::new(factory));
    }

    /// Factory registered for `value_type`
    pub fn lookup(&self, value_type: &ValueType) -> Option<Arc<dyn ValueFactory>> {
        self.factories.get(value_type).cloned()
    }

    /// Check whether `value_type` has a factory
    pub fn contains(&self, value_type: &ValueType) -> bool {
        self.factories.contains_key(value_type)
    }

    /// Decode `text` as `value_type`
    ///
    /// Returns `Ok(None)` when no factory is registered for the type: an
    /// unsupported type leaves its member unbound instead of failing the load.
    pub fn decode(
        &self,
        context: &Context,
        value_type: &ValueType,
        text: &str,
    ) -> MappingResult<Option<Value>> {
        match self.factories.get(value_type) {
            Some(factory) => factory.deserialize(context, text).map(Some),
            None => Ok(None),
        }
    }

    /// Encode `value` as `value_type`; `Ok(None)` when no factory is registered
    pub fn encode(
        &self,
        context: &Context,
        value_type: &ValueType,
        value: &Value,
    ) -> MappingResult<Option<String>> {
        match self.factories.get(value_type) {
            Some(factory) => factory.serialize(context, value).map(Some),
            None => Ok(None),
        }
    }

    /// Registered types
    pub fn types(&self) -> impl Iterator<Item = &ValueType> {
        self.factories.keys()
    }

    /// Number of registered factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Create a registry with all built-in factories and default settings
pub fn create_standard_registry() -> ValueFactoryRegistry {
    ValueFactoryRegistry::standard(&MapperConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ShoutingFactory;

    impl ValueFactory for ShoutingFactory {
        fn value_type(&self) -> ValueType {
            ValueType::String
        }

        fn deserialize(&self, _context: &Context, value: &str) -> MappingResult<Value> {
            Ok(Value::String(value.to_uppercase()))
        }

        fn serialize(&self, _context: &Context, value: &Value) -> MappingResult<String> {
            Ok(value.to_string().to_lowercase())
        }
    }

    #[test]
    fn test_standard_registry_types() {
        let registry = create_standard_registry();
        assert_eq!(registry.len(), 11);
        for name in [
            "string", "integer", "long", "double", "float", "boolean", "date", "file", "url",
            "class", "resource",
        ] {
            let value_type: ValueType = name.parse().unwrap();
            assert!(registry.contains(&value_type), "missing {name}");
        }
    }

    #[test]
    fn test_decode_integer() {
        let registry = create_standard_registry();
        let ctx = Context::new();
        assert_eq!(
            registry.decode(&ctx, &ValueType::Integer, "42").unwrap(),
            Some(Value::Integer(42))
        );
        let err = registry.decode(&ctx, &ValueType::Integer, "abc").unwrap_err();
        assert!(err.is_conversion());
    }

    #[test]
    fn test_missing_factory_is_silent() {
        let registry = create_standard_registry();
        let ctx = Context::new();
        let custom = ValueType::Custom("Duration".into());
        assert_eq!(registry.decode(&ctx, &custom, "PT5S").unwrap(), None);
        assert_eq!(registry.encode(&ctx, &custom, &Value::Empty).unwrap(), None);
        assert!(registry.lookup(&custom).is_none());
    }

    #[test]
    fn test_register_replaces_factory() {
        let mut registry = create_standard_registry();
        let ctx = Context::new();
        let count = registry.len();

        let previous = registry.register(ValueType::String, Arc::new(ShoutingFactory));
        assert!(previous.is_some());
        assert_eq!(registry.len(), count);
        assert_eq!(
            registry.decode(&ctx, &ValueType::String, "quiet").unwrap(),
            Some(Value::String("QUIET".into()))
        );
    }

    #[test]
    fn test_element_and_attribute_helpers() {
        let registry = create_standard_registry();
        let ctx = Context::new();
        let element = Element::parse(r#"<port default="8080">  9090 </port>"#).unwrap();
        let factory = registry.lookup(&ValueType::Integer).unwrap();

        assert_eq!(factory.element_value(&ctx, &element, true).unwrap(), Value::Integer(9090));
        assert!(factory.element_value(&ctx, &element, false).is_err());
        assert_eq!(
            factory.attribute_value(&ctx, &element, "default").unwrap(),
            Some(Value::Integer(8080))
        );
        assert_eq!(factory.attribute_value(&ctx, &element, "max").unwrap(), None);
    }
}
