//! Mapping session
//!
//! A [`Mapper`] holds the value factory registry, the registered root
//! descriptors, and every deferred member reachable from them. Loads walk
//! a document, map each element whose name has a registered descriptor,
//! and leave class-valued members queued when deferral is on.
//!
//! ```
//! use xmapper::{Context, Mapper, TypeMembers, ValueType};
//!
//! #[derive(Default)]
//! struct Greeting {
//!     text: Option<String>,
//! }
//!
//! let members = TypeMembers::<Greeting>::new("Greeting").field(
//!     "text",
//!     ValueType::String,
//!     |g: &Greeting| g.text.clone(),
//!     |g, v| g.text = v,
//! );
//!
//! let mut mapper = Mapper::new();
//! let descriptor = mapper
//!     .describe::<Greeting>("greeting")
//!     .node("@text", members.field_accessor("text").unwrap())
//!     .unwrap()
//!     .build();
//! mapper.register(descriptor);
//!
//! let mut ctx = Context::new();
//! let greeting = mapper
//!     .load_as::<Greeting>(&mut ctx, r#"<greeting text="hello"/>"#)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(greeting.lock().text.as_deref(), Some("hello"));
//! ```

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::any::Any;
use std::fs;
use std::path::Path as FsPath;
use std::sync::Arc;
use url::Url;

use crate::binding::{DeferredMember, ObjectDescriptor, ObjectDescriptorBuilder};
use crate::config::MapperConfig;
use crate::context::Context;
use crate::dom::Element;
use crate::error::{MappingError, MappingResult};
use crate::model::{ObjectHandle, Shared, ValueType};
use crate::registry::{ValueFactory, ValueFactoryRegistry};

/// Mapping session over a set of registered descriptors
#[derive(Debug)]
pub struct Mapper {
    config: MapperConfig,
    registry: ValueFactoryRegistry,
    roots: IndexMap<String, Arc<ObjectDescriptor>>,
    deferred: Vec<Arc<DeferredMember>>,
    defer_class_loading: bool,
}

impl Mapper {
    /// Create a mapper with the default configuration
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    /// Create a mapper whose built-in factories follow `config`
    pub fn with_config(config: MapperConfig) -> Self {
        let registry = ValueFactoryRegistry::standard(&config);
        let defer_class_loading = config.defer_class_loading;
        Self {
            config,
            registry,
            roots: IndexMap::new(),
            deferred: Vec::new(),
            defer_class_loading,
        }
    }

    /// Create a mapper over a prepared registry
    pub fn with_registry(registry: ValueFactoryRegistry) -> Self {
        Self {
            registry,
            ..Self::new()
        }
    }

    /// Active configuration
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Value factory registry
    pub fn registry(&self) -> &ValueFactoryRegistry {
        &self.registry
    }

    /// Register or replace the factory for `value_type`
    ///
    /// Only descriptors described after this call see the new factory.
    pub fn set_value_factory(
        &mut self,
        value_type: ValueType,
        factory: Arc<dyn ValueFactory>,
    ) -> Option<Arc<dyn ValueFactory>> {
        self.registry.register(value_type, factory)
    }

    /// Start describing `T` with this mapper's factories and trimming
    pub fn describe<T: Default + Send + 'static>(
        &self,
        name: impl Into<String>,
    ) -> ObjectDescriptorBuilder<'_, T> {
        ObjectDescriptor::builder::<T>(name, &self.registry).trim(self.config.trim_text)
    }

    /// Map elements named after `descriptor`
    pub fn register(&mut self, descriptor: Arc<ObjectDescriptor>) {
        for member in descriptor.deferred_members() {
            if !self.deferred.iter().any(|known| Arc::ptr_eq(known, &member)) {
                self.deferred.push(member);
            }
        }
        log::debug!(
            "registered <{}> as {}",
            descriptor.name(),
            descriptor.type_name()
        );
        if let Some(previous) = self.roots.insert(descriptor.name().to_string(), descriptor) {
            log::warn!("descriptor for <{}> replaced", previous.name());
        }
    }

    /// Registered descriptor for elements named `name`
    pub fn descriptor(&self, name: &str) -> Option<&Arc<ObjectDescriptor>> {
        self.roots.get(name)
    }

    /// Registered descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<ObjectDescriptor>> {
        self.roots.values()
    }

    /// Defer class-valued bindings of every following load
    pub fn defer_class_loading(&mut self) {
        self.defer_class_loading = true;
    }

    /// Whether loads defer class-valued bindings
    pub fn is_deferring_class_loading(&self) -> bool {
        self.defer_class_loading
    }

    /// Map the root element of `xml`, if a descriptor is registered for it
    pub fn load(&self, ctx: &mut Context, xml: &str) -> MappingResult<Option<ObjectHandle>> {
        let root = Element::parse(xml)?;
        self.load_element(ctx, &root)
    }

    /// Map `element`, if a descriptor is registered for its name
    pub fn load_element(
        &self,
        ctx: &mut Context,
        element: &Arc<Element>,
    ) -> MappingResult<Option<ObjectHandle>> {
        self.prepare(ctx);
        match self.roots.get(element.name()) {
            Some(descriptor) => descriptor.new_instance(ctx, element).map(Some),
            None => {
                log::debug!("no descriptor registered for <{}>", element.name());
                Ok(None)
            }
        }
    }

    /// Map every registered element of `xml` in document order
    pub fn load_all(&self, ctx: &mut Context, xml: &str) -> MappingResult<Vec<ObjectHandle>> {
        let root = Element::parse(xml)?;
        self.load_all_elements(ctx, &root)
    }

    /// Map every registered element under and including `root`
    ///
    /// The content of a mapped element is left to its descriptor and not
    /// searched for further registered elements.
    pub fn load_all_elements(
        &self,
        ctx: &mut Context,
        root: &Arc<Element>,
    ) -> MappingResult<Vec<ObjectHandle>> {
        self.prepare(ctx);
        let mut matched = Vec::new();
        root.walk(&mut |element: &Arc<Element>| match self.roots.get(element.name()) {
            Some(descriptor) => {
                matched.push((descriptor.clone(), element.clone()));
                false
            }
            None => true,
        });

        matched
            .iter()
            .map(|(descriptor, element)| descriptor.new_instance(ctx, element))
            .collect()
    }

    /// Map the root element of the document at `path`
    ///
    /// Relative resources resolve against the document's directory unless
    /// `ctx` already has a resource root.
    pub fn load_file(
        &self,
        ctx: &mut Context,
        path: impl AsRef<FsPath>,
    ) -> MappingResult<Option<ObjectHandle>> {
        let xml = read_document(ctx, path.as_ref())?;
        self.load(ctx, &xml)
    }

    /// Map every registered element of the document at `path`
    pub fn load_all_file(
        &self,
        ctx: &mut Context,
        path: impl AsRef<FsPath>,
    ) -> MappingResult<Vec<ObjectHandle>> {
        let xml = read_document(ctx, path.as_ref())?;
        self.load_all(ctx, &xml)
    }

    /// Map the root element of `xml` as a `T`
    ///
    /// Returns `None` when the root is not registered or its descriptor
    /// builds another type.
    pub fn load_as<T: Any + Send>(
        &self,
        ctx: &mut Context,
        xml: &str,
    ) -> MappingResult<Option<Shared<T>>> {
        Ok(self.load(ctx, xml)?.and_then(|object| object.downcast::<Mutex<T>>().ok()))
    }

    /// Map every registered element of `xml` that builds a `T`
    pub fn load_all_as<T: Any + Send>(
        &self,
        ctx: &mut Context,
        xml: &str,
    ) -> MappingResult<Vec<Shared<T>>> {
        Ok(self
            .load_all(ctx, xml)?
            .into_iter()
            .filter_map(|object| object.downcast::<Mutex<T>>().ok())
            .collect())
    }

    /// Replay every deferred invocation, in registration order
    ///
    /// Stops at the first failure. Returns the number of invocations
    /// replayed.
    pub fn flush_deferred(&self) -> MappingResult<usize> {
        let mut replayed = 0;
        for member in &self.deferred {
            replayed += member.flush()?;
        }
        Ok(replayed)
    }

    /// Number of queued deferred invocations
    pub fn pending_deferred(&self) -> usize {
        self.deferred.iter().map(|member| member.pending()).sum()
    }

    fn prepare(&self, ctx: &mut Context) {
        if self.defer_class_loading {
            ctx.defer_class_loading();
        }
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

fn read_document(ctx: &mut Context, path: &FsPath) -> MappingResult<String> {
    let xml = fs::read_to_string(path).map_err(|source| MappingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if ctx.resource_root().is_none() {
        let directory = fs::canonicalize(path)
            .ok()
            .and_then(|absolute| absolute.parent().map(FsPath::to_path_buf));
        if let Some(root) = directory.and_then(|dir| Url::from_directory_path(dir).ok()) {
            log::debug!("resolving resources of {} against {}", path.display(), root);
            ctx.set_resource_root(root);
        }
    }
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::TypeMembers;
    use crate::context::ModuleClassLoader;
    use crate::model::ClassRef;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Listener {
        name: Option<String>,
        class: Option<ClassRef>,
    }

    fn mapper() -> Mapper {
        let members = TypeMembers::<Listener>::new("Listener")
            .field("name", ValueType::String, |l: &Listener| l.name.clone(), |l, v| l.name = v)
            .field(
                "class",
                ValueType::Class,
                |l: &Listener| l.class.clone(),
                |l, v| l.class = v,
            );
        let mut mapper = Mapper::new();
        let descriptor = mapper
            .describe::<Listener>("listener")
            .node("@name", members.field_accessor("name").unwrap())
            .unwrap()
            .node("@class", members.field_accessor("class").unwrap())
            .unwrap()
            .build();
        mapper.register(descriptor);
        mapper
    }

    const DOC: &str = r#"<listeners>
        <listener name="first" class="a.First"/>
        <group>
          <listener name="second" class="a.Second">
            <listener name="nested" class="a.Nested"/>
          </listener>
        </group>
      </listeners>"#;

    #[test]
    fn test_load_unregistered_root() {
        let mapper = mapper();
        let mut ctx = Context::new();
        assert!(mapper.load(&mut ctx, DOC).unwrap().is_none());
    }

    #[test]
    fn test_load_all_in_document_order() {
        let loader = Arc::new(ModuleClassLoader::new("bundle"));
        for name in ["a.First", "a.Second", "a.Nested"] {
            loader.define(ClassRef::named(name));
        }
        let mapper = mapper();
        let mut ctx = Context::with_class_loader(loader);
        let listeners = mapper.load_all_as::<Listener>(&mut ctx, DOC).unwrap();

        let names: Vec<_> = listeners
            .iter()
            .map(|l| l.lock().name.clone().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["first".to_string(), "second".to_string()]);
        assert_eq!(
            listeners[1].lock().class.as_ref().map(ClassRef::name),
            Some("a.Second")
        );
    }

    #[test]
    fn test_deferred_session() {
        let loader = Arc::new(ModuleClassLoader::new("bundle"));
        let mut mapper = mapper();
        mapper.defer_class_loading();
        assert!(mapper.is_deferring_class_loading());

        let mut ctx = Context::with_class_loader(loader.clone());
        let listeners = mapper.load_all_as::<Listener>(&mut ctx, DOC).unwrap();
        assert!(ctx.is_deferring_class_loading());
        assert_eq!(mapper.pending_deferred(), 2);
        assert!(listeners.iter().all(|l| l.lock().class.is_none()));
        assert_eq!(listeners[0].lock().name.as_deref(), Some("first"));

        loader.define(ClassRef::named("a.First"));
        loader.define(ClassRef::named("a.Second"));
        assert_eq!(mapper.flush_deferred().unwrap(), 2);
        assert_eq!(mapper.pending_deferred(), 0);
        assert_eq!(
            listeners[0].lock().class.as_ref().map(ClassRef::name),
            Some("a.First")
        );
    }

    #[test]
    fn test_deferred_members_collected_once() {
        let mut mapper = mapper();
        assert_eq!(mapper.deferred.len(), 1);
        let descriptor = mapper.descriptor("listener").cloned().unwrap();
        mapper.register(descriptor);
        assert_eq!(mapper.deferred.len(), 1);
        assert_eq!(mapper.descriptors().count(), 1);
    }

    #[test]
    fn test_malformed_document() {
        let mapper = mapper();
        let err = mapper.load(&mut Context::new(), "<listener").unwrap_err();
        assert!(matches!(err, MappingError::Xml(_)));
    }

    #[test]
    fn test_missing_file() {
        let mapper = mapper();
        let err = mapper
            .load_file(&mut Context::new(), "/nonexistent/listeners.xml")
            .unwrap_err();
        assert!(matches!(err, MappingError::Io { .. }));
    }
}
