//! Annotated members
//!
//! An [`AnnotatedMember`] ties a location pattern to an accessor. Processing
//! it against an element selects the text or elements at the pattern,
//! decodes them with the value factory of the accessor's type (or maps them
//! as nested objects), and writes the result into the object currently under
//! construction.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use super::accessor::Accessor;
use super::object::ObjectDescriptor;
use crate::context::Context;
use crate::dom::{Element, Path};
use crate::error::{MappingError, MappingResult};
use crate::model::{Value, ValueType};
use crate::registry::{ValueFactory, ValueFactoryRegistry};

/// How one selected node becomes a value
#[derive(Clone)]
pub enum ItemBinding {
    /// Decode the node text with a value factory
    Value(Arc<dyn ValueFactory>),

    /// Map the node as a nested object
    Object(Arc<ObjectDescriptor>),
}

impl ItemBinding {
    /// Factory registered for `value_type`, if any
    pub fn for_type(registry: &ValueFactoryRegistry, value_type: &ValueType) -> Option<Self> {
        registry.lookup(value_type).map(ItemBinding::Value)
    }

    fn decode(
        &self,
        ctx: &mut Context,
        path: &Path,
        element: &Arc<Element>,
        trim: bool,
    ) -> MappingResult<Option<Value>> {
        match self {
            ItemBinding::Value(factory) => path
                .text_at(element, trim)
                .map(|text| factory.deserialize(ctx, &text))
                .transpose(),
            ItemBinding::Object(descriptor) => {
                descriptor.new_instance(ctx, element).map(|object| Some(Value::Object(object)))
            }
        }
    }
}

impl fmt::Debug for ItemBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemBinding::Value(factory) => write!(f, "Value({})", factory.value_type()),
            ItemBinding::Object(descriptor) => write!(f, "Object({})", descriptor.name()),
        }
    }
}

/// Shape of the selection a member binds
#[derive(Debug, Clone)]
pub enum MemberKind {
    /// First match only
    Node,

    /// Every match, as a list
    NodeList,

    /// Every match, keyed by the text at `key` relative to the match
    NodeMap {
        /// Key location, relative to each matched element
        key: Path,
    },
}

/// Location pattern bound to an accessor
#[derive(Debug)]
pub struct AnnotatedMember {
    path: Path,
    accessor: Accessor,
    kind: MemberKind,
    item: Option<ItemBinding>,
    trim: bool,
}

impl AnnotatedMember {
    /// Create a member; `item` is `None` when no factory handles the type
    pub fn new(path: Path, accessor: Accessor, kind: MemberKind, item: Option<ItemBinding>) -> Self {
        if item.is_none() {
            log::debug!(
                "no value factory for {}, member {} will be skipped",
                accessor.value_type(),
                accessor
            );
        }
        Self {
            path,
            accessor,
            kind,
            item,
            trim: true,
        }
    }

    /// Keep surrounding whitespace of element text
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Location pattern
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Target accessor
    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    /// Selection shape
    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    /// Descriptor of the nested objects this member maps, if any
    pub fn nested_descriptor(&self) -> Option<&Arc<ObjectDescriptor>> {
        match &self.item {
            Some(ItemBinding::Object(descriptor)) => Some(descriptor),
            _ => None,
        }
    }

    /// Whether the member carries class references
    ///
    /// Both the declared value type and the member's own type count: a
    /// string setter backed by a class field still needs the class loaded.
    pub fn is_class_valued(&self) -> bool {
        self.accessor.value_type().is_class() || self.accessor.member_type().is_class()
    }

    /// Decode the value at this member's location and write it into the
    /// current object
    ///
    /// A member without a factory, whose location matches nothing, or whose
    /// text decodes to the empty value leaves the object untouched.
    pub fn process(&self, ctx: &mut Context, element: &Arc<Element>) -> MappingResult<()> {
        let Some(value) = self.value(ctx, element)? else {
            return Ok(());
        };
        if value.is_empty() {
            log::trace!("{} left unset", self.accessor);
            return Ok(());
        }
        let object = ctx.current_object().cloned().ok_or_else(|| {
            MappingError::invalid_binding(&self.accessor, "no object under construction")
        })?;
        log::trace!("{} <- {}", self.accessor, value);
        self.accessor.write(&object, value)
    }

    /// Decode the value at this member's location without writing it
    pub fn value(&self, ctx: &mut Context, element: &Arc<Element>) -> MappingResult<Option<Value>> {
        let Some(item) = &self.item else {
            return Ok(None);
        };
        match &self.kind {
            MemberKind::Node => match self.path.select_first(element) {
                Some(target) => item.decode(ctx, &self.path, &target, self.trim),
                None => Ok(None),
            },
            MemberKind::NodeList => {
                let mut items = Vec::new();
                for target in self.path.select_all(element) {
                    match item.decode(ctx, &self.path, &target, self.trim)? {
                        Some(value) if !value.is_empty() => items.push(value),
                        _ => {}
                    }
                }
                Ok(Some(Value::List(items)))
            }
            MemberKind::NodeMap { key } => {
                let mut entries = IndexMap::new();
                for target in self.path.select_all(element) {
                    let Some(name) = key.select_text(&target, true) else {
                        log::debug!("{}: entry without key {} skipped", self.accessor, key);
                        continue;
                    };
                    match item.decode(ctx, &self.path, &target, self.trim)? {
                        Some(value) if !value.is_empty() => {
                            entries.insert(name, value);
                        }
                        _ => {}
                    }
                }
                Ok(Some(Value::Map(entries)))
            }
        }
    }
}
