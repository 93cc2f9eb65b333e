//! Per-load evaluation context
//!
//! A [`Context`] carries everything a binding needs besides the element it
//! is applied to: the class loader used for class references, the root that
//! relative resources resolve against, the deferral flag, and the stack of
//! objects under construction.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::error::{ClassNotFound, MappingError, MappingResult};
use crate::model::{ClassRef, ObjectHandle, Resource};

/// Strategy used to resolve class names
pub trait ClassLoader: Send + Sync + fmt::Debug {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Resolve a fully qualified class name
    fn load_class(&self, name: &str) -> Result<ClassRef, ClassNotFound>;

    /// Locate a resource bundled with the loaded classes
    fn get_resource(&self, _path: &str) -> Option<Url> {
        None
    }
}

/// Class loader over an explicit set of class definitions
///
/// Definitions can be added at any time through a shared reference, which
/// is what lets deferred class bindings resolve once a module's classes
/// have been defined.
pub struct ModuleClassLoader {
    name: String,
    classes: RwLock<FxHashMap<String, ClassRef>>,
    resource_base: Option<Url>,
}

impl ModuleClassLoader {
    /// Create an empty loader
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: RwLock::new(FxHashMap::default()),
            resource_base: None,
        }
    }

    /// Resolve bundled resources relative to `base`
    pub fn with_resource_base(mut self, base: Url) -> Self {
        self.resource_base = Some(base);
        self
    }

    /// Make a class loadable
    pub fn define(&self, class: ClassRef) {
        log::debug!("{}: defining class {}", self.name, class);
        self.classes.write().insert(class.name().to_string(), class);
    }

    /// Make the Rust type `T` loadable under `name`
    pub fn define_type<T: Any>(&self, name: &str) -> ClassRef {
        let class = ClassRef::of::<T>(name);
        self.define(class.clone());
        class
    }

    /// Check whether `name` is loadable
    pub fn is_defined(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    /// Number of loadable classes
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Check if no class is loadable yet
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}

impl Default for ModuleClassLoader {
    fn default() -> Self {
        Self::new("default")
    }
}

impl fmt::Debug for ModuleClassLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleClassLoader")
            .field("name", &self.name)
            .field("class_count", &self.len())
            .field("resource_base", &self.resource_base)
            .finish()
    }
}

impl ClassLoader for ModuleClassLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_class(&self, name: &str) -> Result<ClassRef, ClassNotFound> {
        self.classes
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ClassNotFound {
                name: name.to_string(),
                loader: self.name.clone(),
            })
    }

    fn get_resource(&self, path: &str) -> Option<Url> {
        self.resource_base.as_ref()?.join(path).ok()
    }
}

/// Evaluation environment for one load call
#[derive(Debug, Clone)]
pub struct Context {
    class_loader: Arc<dyn ClassLoader>,
    resource_root: Option<Url>,
    defer_class_loading: bool,
    objects: Vec<ObjectHandle>,
}

impl Context {
    /// Create a context with an empty class loader
    pub fn new() -> Self {
        Self::with_class_loader(Arc::new(ModuleClassLoader::default()))
    }

    /// Create a context resolving classes through `class_loader`
    pub fn with_class_loader(class_loader: Arc<dyn ClassLoader>) -> Self {
        Self {
            class_loader,
            resource_root: None,
            defer_class_loading: false,
            objects: Vec::new(),
        }
    }

    /// Resolve relative resources against `root`
    pub fn with_resource_root(mut self, root: Url) -> Self {
        self.resource_root = Some(root);
        self
    }

    /// Set the resource root in place
    pub fn set_resource_root(&mut self, root: Url) {
        self.resource_root = Some(root);
    }

    /// Root relative resources resolve against
    pub fn resource_root(&self) -> Option<&Url> {
        self.resource_root.as_ref()
    }

    /// Active class loader
    pub fn class_loader(&self) -> &Arc<dyn ClassLoader> {
        &self.class_loader
    }

    /// Postpone class-valued bindings until they are flushed
    pub fn defer_class_loading(&mut self) {
        self.defer_class_loading = true;
    }

    /// Whether class-valued bindings first used with this context defer
    pub fn is_deferring_class_loading(&self) -> bool {
        self.defer_class_loading
    }

    /// Resolve a class name through the active class loader
    pub fn load_class(&self, name: &str) -> MappingResult<ClassRef> {
        self.class_loader
            .load_class(name)
            .map_err(|source| MappingError::ClassResolution {
                name: name.to_string(),
                source,
            })
    }

    /// Resolve a resource path
    ///
    /// Absolute URLs resolve to themselves, relative paths against the
    /// resource root, or through the class loader when there is no root. An
    /// unresolvable path still yields a [`Resource`], just without a URL.
    pub fn resolve_resource(&self, path: &str) -> Resource {
        let url = match (&self.resource_root, Url::parse(path)) {
            (_, Ok(absolute)) => Some(absolute),
            (Some(root), Err(_)) => root.join(path).ok(),
            (None, Err(_)) => self.class_loader.get_resource(path),
        };
        if url.is_none() {
            log::debug!("resource {path} could not be resolved");
        }
        Resource::new(path, url)
    }

    /// Push the object whose members are being bound
    pub fn push(&mut self, object: ObjectHandle) {
        self.objects.push(object);
    }

    /// Pop the innermost object
    pub fn pop(&mut self) -> Option<ObjectHandle> {
        self.objects.pop()
    }

    /// Object currently being bound
    pub fn current_object(&self) -> Option<&ObjectHandle> {
        self.objects.last()
    }

    /// Object enclosing the current one
    pub fn parent_object(&self) -> Option<&ObjectHandle> {
        self.objects.iter().rev().nth(1)
    }

    /// Nesting depth of the object stack
    pub fn depth(&self) -> usize {
        self.objects.len()
    }

    /// Capture this context for a later replay
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            context: self.clone(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen copy of a [`Context`]
///
/// Holds the loader, resource root, deferral flag and object stack as they
/// were when the snapshot was taken. Nothing done to the live context
/// afterwards is visible here.
#[derive(Debug, Clone)]
pub struct ContextSnapshot {
    context: Context,
}

impl ContextSnapshot {
    /// Deferral flag at capture time
    pub fn is_deferring_class_loading(&self) -> bool {
        self.context.defer_class_loading
    }

    /// Object that was being bound at capture time
    pub fn current_object(&self) -> Option<&ObjectHandle> {
        self.context.current_object()
    }

    /// Nesting depth at capture time
    pub fn depth(&self) -> usize {
        self.context.depth()
    }

    /// Turn the snapshot back into a working context
    pub fn restore(self) -> Context {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_class() {
        let loader = Arc::new(ModuleClassLoader::new("bundle"));
        let ctx = Context::with_class_loader(loader.clone());

        let err = ctx.load_class("org.example.Service").unwrap_err();
        assert!(matches!(err, MappingError::ClassResolution { ref name, .. } if name == "org.example.Service"));

        loader.define(ClassRef::named("org.example.Service"));
        assert_eq!(
            ctx.load_class("org.example.Service").unwrap().name(),
            "org.example.Service"
        );
    }

    #[test]
    fn test_resolve_resource() {
        let root = Url::parse("file:///opt/app/conf/").unwrap();
        let ctx = Context::new().with_resource_root(root);
        let resource = ctx.resolve_resource("schemas/contrib.xsd");
        assert_eq!(resource.to_string(), "file:///opt/app/conf/schemas/contrib.xsd");

        let loader = ModuleClassLoader::new("bundle")
            .with_resource_base(Url::parse("jar:file:///bundle.jar!/").unwrap());
        let ctx = Context::with_class_loader(Arc::new(loader));
        assert!(ctx.resolve_resource("OSGI-INF/x.xml").is_resolved());

        let resource = Context::new().resolve_resource("nowhere.xml");
        assert!(!resource.is_resolved());
        assert_eq!(resource.to_string(), "nowhere.xml");
    }

    #[test]
    fn test_object_stack() {
        let mut ctx = Context::new();
        assert!(ctx.current_object().is_none());

        let outer: ObjectHandle = Arc::new("outer");
        let inner: ObjectHandle = Arc::new("inner");
        ctx.push(outer.clone());
        ctx.push(inner.clone());
        assert!(Arc::ptr_eq(ctx.current_object().unwrap(), &inner));
        assert!(Arc::ptr_eq(ctx.parent_object().unwrap(), &outer));
        assert_eq!(ctx.depth(), 2);

        ctx.pop();
        assert!(ctx.parent_object().is_none());
    }

    #[test]
    fn test_snapshot_is_isolated() {
        let mut ctx = Context::new();
        ctx.push(Arc::new(1_u8));
        let snapshot = ctx.snapshot();

        ctx.defer_class_loading();
        ctx.push(Arc::new(2_u8));

        assert!(!snapshot.is_deferring_class_loading());
        assert_eq!(snapshot.depth(), 1);
        let restored = snapshot.restore();
        assert!(!restored.is_deferring_class_loading());
        assert_eq!(restored.depth(), 1);
    }
}
