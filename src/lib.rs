//! Declarative XML to object mapping
//!
//! Target types describe which element or attribute each of their members
//! binds to; a [`Mapper`] then turns documents into instances of them. Text
//! is converted by pluggable value factories, one per [`ValueType`], and
//! members that name classes can be postponed until the classes they refer
//! to become loadable.

pub mod binding;
pub mod config;
pub mod context;
pub mod dom;
pub mod error;
pub mod mapper;
pub mod model;
pub mod registry;

pub use binding::{
    Accessor, AnnotatedMember, Binding, BindingMode, DeferredMember, ItemBinding, MemberKind,
    ObjectDescriptor, ObjectDescriptorBuilder, TypeMembers,
};
pub use config::MapperConfig;
pub use context::{ClassLoader, Context, ContextSnapshot, ModuleClassLoader};
pub use dom::{Element, Node, Path};
pub use error::{ClassNotFound, MappingError, MappingResult};
pub use mapper::Mapper;
pub use model::{
    ClassRef, FromValue, IntoValue, ObjectHandle, Resource, Shared, Value, ValueType, shared,
};
pub use registry::{ValueFactory, ValueFactoryRegistry, create_standard_registry};
