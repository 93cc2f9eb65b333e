//! Mapped object descriptors
//!
//! An [`ObjectDescriptor`] knows how to create one target type and which
//! bindings fill it from an element. Descriptors are assembled with
//! [`ObjectDescriptorBuilder`], which resolves value factories up front and
//! wraps every class-valued member so it can take part in deferred class
//! loading.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::accessor::Accessor;
use super::deferred::DeferredMember;
use super::member::{AnnotatedMember, ItemBinding, MemberKind};
use super::Binding;
use crate::context::Context;
use crate::dom::{Element, Path};
use crate::error::MappingResult;
use crate::model::{ObjectHandle, shared};
use crate::registry::ValueFactoryRegistry;

type Constructor = Box<dyn Fn() -> ObjectHandle + Send + Sync>;

/// How to build one target type from an element
pub struct ObjectDescriptor {
    name: String,
    type_name: String,
    create: Constructor,
    bindings: Vec<Binding>,
}

impl ObjectDescriptor {
    /// Start describing `T`, mapped from elements named `name`
    pub fn builder<T: Default + Send + 'static>(
        name: impl Into<String>,
        registry: &ValueFactoryRegistry,
    ) -> ObjectDescriptorBuilder<'_, T> {
        ObjectDescriptorBuilder {
            name: name.into(),
            type_name: short_type_name::<T>().to_string(),
            registry,
            trim: true,
            bindings: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Element name this descriptor maps
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the target type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Bindings in declaration order
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Create an instance and apply every binding to `element`
    ///
    /// The instance is the current object of `ctx` while its bindings run.
    pub fn new_instance(&self, ctx: &mut Context, element: &Arc<Element>) -> MappingResult<ObjectHandle> {
        let object = (self.create)();
        ctx.push(object.clone());
        let result = self
            .bindings
            .iter()
            .try_for_each(|binding| binding.process(ctx, element));
        ctx.pop();
        result?;
        log::trace!("mapped <{}> to {}", element.name(), self.type_name);
        Ok(object)
    }

    /// Deferred members of this descriptor and of every nested descriptor
    pub fn deferred_members(&self) -> Vec<Arc<DeferredMember>> {
        let mut found = Vec::new();
        self.collect_deferred(&mut found);
        found
    }

    fn collect_deferred(&self, found: &mut Vec<Arc<DeferredMember>>) {
        for binding in &self.bindings {
            if let Binding::Deferred(member) = binding
                && !found.iter().any(|known| Arc::ptr_eq(known, member))
            {
                found.push(member.clone());
            }
            if let Some(nested) = binding.member().nested_descriptor() {
                nested.collect_deferred(found);
            }
        }
    }
}

impl fmt::Debug for ObjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDescriptor")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(index) => &full[index + 2..],
        None => full,
    }
}

/// Builder for [`ObjectDescriptor`]
///
/// Each member method resolves the value factory for the accessor's type
/// from the registry. A type without a factory is accepted; the member
/// simply never writes anything.
pub struct ObjectDescriptorBuilder<'a, T> {
    name: String,
    type_name: String,
    registry: &'a ValueFactoryRegistry,
    trim: bool,
    bindings: Vec<Binding>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Default + Send + 'static> ObjectDescriptorBuilder<'a, T> {
    /// Override the reported type name
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Trim element text for the members declared after this call
    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Bind the first match of `path` to `accessor`
    pub fn node(self, path: &str, accessor: Accessor) -> MappingResult<Self> {
        let item = ItemBinding::for_type(self.registry, accessor.value_type());
        self.with_member(path, accessor, MemberKind::Node, item)
    }

    /// Bind the first match of `path`, mapped by `descriptor`
    pub fn node_object(
        self,
        path: &str,
        accessor: Accessor,
        descriptor: &Arc<ObjectDescriptor>,
    ) -> MappingResult<Self> {
        let item = Some(ItemBinding::Object(descriptor.clone()));
        self.with_member(path, accessor, MemberKind::Node, item)
    }

    /// Bind every match of `path` as a list of decoded values
    pub fn node_list(self, path: &str, accessor: Accessor) -> MappingResult<Self> {
        let item = ItemBinding::for_type(self.registry, accessor.value_type().item_type());
        self.with_member(path, accessor, MemberKind::NodeList, item)
    }

    /// Bind every match of `path` as a list of objects mapped by `descriptor`
    pub fn node_list_of(
        self,
        path: &str,
        accessor: Accessor,
        descriptor: &Arc<ObjectDescriptor>,
    ) -> MappingResult<Self> {
        let item = Some(ItemBinding::Object(descriptor.clone()));
        self.with_member(path, accessor, MemberKind::NodeList, item)
    }

    /// Bind every match of `path` as a map keyed by the text at `key`
    pub fn node_map(self, path: &str, key: &str, accessor: Accessor) -> MappingResult<Self> {
        let key = Path::parse(key)?;
        let item = ItemBinding::for_type(self.registry, accessor.value_type().item_type());
        self.with_member(path, accessor, MemberKind::NodeMap { key }, item)
    }

    /// Bind every match of `path` as a map of objects mapped by `descriptor`
    pub fn node_map_of(
        self,
        path: &str,
        key: &str,
        accessor: Accessor,
        descriptor: &Arc<ObjectDescriptor>,
    ) -> MappingResult<Self> {
        let key = Path::parse(key)?;
        let item = Some(ItemBinding::Object(descriptor.clone()));
        self.with_member(path, accessor, MemberKind::NodeMap { key }, item)
    }

    /// Add a member built elsewhere
    pub fn member(mut self, member: AnnotatedMember) -> Self {
        self.bindings.push(Binding::from_member(member));
        self
    }

    /// Finish the descriptor
    pub fn build(self) -> Arc<ObjectDescriptor> {
        log::debug!(
            "described <{}> as {} with {} bindings",
            self.name,
            self.type_name,
            self.bindings.len()
        );
        Arc::new(ObjectDescriptor {
            name: self.name,
            type_name: self.type_name,
            create: Box::new(|| -> ObjectHandle { shared(T::default()) }),
            bindings: self.bindings,
        })
    }

    fn with_member(
        self,
        path: &str,
        accessor: Accessor,
        kind: MemberKind,
        item: Option<ItemBinding>,
    ) -> MappingResult<Self> {
        let trim = self.trim;
        let member = AnnotatedMember::new(Path::parse(path)?, accessor, kind, item).with_trim(trim);
        Ok(self.member(member))
    }
}
