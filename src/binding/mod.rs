//! Bindings between document locations and object members
//!
//! A binding is either an [`AnnotatedMember`] that runs immediately or a
//! [`DeferredMember`] wrapping a class-valued one. The builder picks the
//! variant, so callers never wrap members by hand.

#![warn(missing_docs)]

pub mod accessor;
pub mod deferred;
pub mod member;
pub mod object;

pub use accessor::{Accessor, TypeMembers, guess_field_name, guess_getter_name};
pub use deferred::{BindingMode, DeferredMember};
pub use member::{AnnotatedMember, ItemBinding, MemberKind};
pub use object::{ObjectDescriptor, ObjectDescriptorBuilder};

use std::sync::Arc;

use crate::context::Context;
use crate::dom::Element;
use crate::error::MappingResult;

/// Member binding of an object descriptor
#[derive(Debug, Clone)]
pub enum Binding {
    /// Runs as soon as it is processed
    Immediate(Arc<AnnotatedMember>),

    /// Class-valued member that may be postponed
    Deferred(Arc<DeferredMember>),
}

impl Binding {
    /// Wrap `member`, deferring it when it carries class references
    pub fn from_member(member: AnnotatedMember) -> Self {
        if member.is_class_valued() {
            Binding::Deferred(Arc::new(DeferredMember::new(member)))
        } else {
            Binding::Immediate(Arc::new(member))
        }
    }

    /// The underlying member
    pub fn member(&self) -> &AnnotatedMember {
        match self {
            Binding::Immediate(member) => member,
            Binding::Deferred(deferred) => deferred.inner(),
        }
    }

    /// Check whether this binding can be postponed
    pub fn is_deferred(&self) -> bool {
        matches!(self, Binding::Deferred(_))
    }

    /// Apply the binding to `element` for the current object of `ctx`
    pub fn process(&self, ctx: &mut Context, element: &Arc<Element>) -> MappingResult<()> {
        match self {
            Binding::Immediate(member) => member.process(ctx, element),
            Binding::Deferred(deferred) => deferred.process(ctx, element),
        }
    }
}
