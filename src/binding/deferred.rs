// Copyright 2024 XMapper Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Deferred class-valued members
//!
//! Class references in a document can name classes that are not loadable
//! yet. A [`DeferredMember`] wraps a class-valued member and, when the
//! context it is first used with asks for deferral, queues every invocation
//! instead of running it. [`DeferredMember::flush`] replays the queue in
//! arrival order once the classes are available.
//!
//! The mode is decided exactly once. A wrapper first used without deferral
//! stays immediate for its whole life, and one first used with deferral
//! queues forever after.

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use super::member::AnnotatedMember;
use crate::context::{Context, ContextSnapshot};
use crate::dom::Element;
use crate::error::MappingResult;

/// How a [`DeferredMember`] handles invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    /// Run the wrapped member right away
    Immediate,

    /// Queue invocations until flushed
    Deferred,
}

struct PendingInvoke {
    context: ContextSnapshot,
    element: Arc<Element>,
}

/// Class-valued member whose invocations may be postponed
pub struct DeferredMember {
    inner: AnnotatedMember,
    mode: OnceCell<BindingMode>,
    pending: Mutex<VecDeque<PendingInvoke>>,
}

impl DeferredMember {
    /// Wrap `inner`; the mode is fixed on first use
    pub fn new(inner: AnnotatedMember) -> Self {
        Self {
            inner,
            mode: OnceCell::new(),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Wrapped member
    pub fn inner(&self) -> &AnnotatedMember {
        &self.inner
    }

    /// Mode chosen on first use, `None` before that
    pub fn mode(&self) -> Option<BindingMode> {
        self.mode.get().copied()
    }

    /// Number of queued invocations
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Run or queue one invocation
    pub fn process(&self, ctx: &mut Context, element: &Arc<Element>) -> MappingResult<()> {
        let mode = *self.mode.get_or_init(|| {
            if ctx.is_deferring_class_loading() {
                BindingMode::Deferred
            } else {
                BindingMode::Immediate
            }
        });

        match mode {
            BindingMode::Immediate => self.inner.process(ctx, element),
            BindingMode::Deferred => {
                log::trace!("deferring {}", self.inner.accessor());
                self.pending.lock().push_back(PendingInvoke {
                    context: ctx.snapshot(),
                    element: element.clone(),
                });
                Ok(())
            }
        }
    }

    /// Replay queued invocations in arrival order
    ///
    /// Stops at the first failing invocation and returns its error; that
    /// invocation is consumed and later ones stay queued. Invocations queued
    /// while flushing are replayed in the same pass. Returns the number of
    /// invocations replayed.
    pub fn flush(&self) -> MappingResult<usize> {
        let mut replayed = 0;
        loop {
            // the lock must not be held while the member runs
            let next = self.pending.lock().pop_front();
            let Some(invoke) = next else {
                break;
            };
            let mut ctx = invoke.context.restore();
            self.inner.process(&mut ctx, &invoke.element)?;
            replayed += 1;
        }
        if replayed > 0 {
            log::info!("replayed {} deferred invocations of {}", replayed, self.inner.accessor());
        }
        Ok(replayed)
    }
}

impl fmt::Debug for DeferredMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredMember")
            .field("member", self.inner.accessor())
            .field("mode", &self.mode())
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{ItemBinding, MemberKind, TypeMembers};
    use crate::context::ModuleClassLoader;
    use crate::dom::Path;
    use crate::error::MappingError;
    use crate::model::{ClassRef, ObjectHandle, Shared, ValueType, shared};
    use crate::registry::create_standard_registry;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
    }

    fn recording_member() -> DeferredMember {
        let members = TypeMembers::<Recorder>::new("Recorder").field(
            "seen",
            ValueType::Class,
            |_: &Recorder| None::<ClassRef>,
            |_, _: Option<ClassRef>| {},
        );
        let accessor = members.method_accessor(
            "setSeen",
            ValueType::Class,
            |r: &mut Recorder, class: ClassRef| {
                r.seen.push(class.name().to_string());
                Ok(())
            },
        );
        let registry = create_standard_registry();
        let item = ItemBinding::for_type(&registry, accessor.value_type());
        DeferredMember::new(AnnotatedMember::new(
            Path::parse("@class").unwrap(),
            accessor,
            MemberKind::Node,
            item,
        ))
    }

    fn elements() -> Vec<Arc<Element>> {
        ["a.First", "a.Second", "a.Third"]
            .iter()
            .map(|name| Arc::new(Element::new("item").with_attribute("class", *name)))
            .collect()
    }

    fn context(loader: &Arc<ModuleClassLoader>, deferred: bool) -> (Context, Shared<Recorder>) {
        let mut ctx = Context::with_class_loader(loader.clone());
        if deferred {
            ctx.defer_class_loading();
        }
        let recorder = shared(Recorder::default());
        let handle: ObjectHandle = recorder.clone();
        ctx.push(handle);
        (ctx, recorder)
    }

    fn define_all(loader: &ModuleClassLoader) {
        for name in ["a.First", "a.Second", "a.Third"] {
            loader.define(ClassRef::named(name));
        }
    }

    #[test]
    fn test_immediate_mode_runs_synchronously() {
        let loader = Arc::new(ModuleClassLoader::new("bundle"));
        define_all(&loader);
        let (mut ctx, recorder) = context(&loader, false);
        let member = recording_member();

        for element in elements() {
            member.process(&mut ctx, &element).unwrap();
        }

        assert_eq!(member.mode(), Some(BindingMode::Immediate));
        assert_eq!(member.pending(), 0);
        assert_eq!(recorder.lock().seen, vec!["a.First", "a.Second", "a.Third"]);
        assert_eq!(member.flush().unwrap(), 0);
    }

    #[test]
    fn test_deferred_mode_replays_in_order() {
        let loader = Arc::new(ModuleClassLoader::new("bundle"));
        let (mut ctx, recorder) = context(&loader, true);
        let member = recording_member();

        for element in elements() {
            member.process(&mut ctx, &element).unwrap();
        }
        assert_eq!(member.mode(), Some(BindingMode::Deferred));
        assert_eq!(member.pending(), 3);
        assert!(recorder.lock().seen.is_empty());

        define_all(&loader);
        assert_eq!(member.flush().unwrap(), 3);
        assert_eq!(member.pending(), 0);
        assert_eq!(recorder.lock().seen, vec!["a.First", "a.Second", "a.Third"]);

        // already drained
        assert_eq!(member.flush().unwrap(), 0);
    }

    #[test]
    fn test_mode_is_decided_once() {
        let loader = Arc::new(ModuleClassLoader::new("bundle"));
        define_all(&loader);
        let member = recording_member();

        let (mut immediate, recorder) = context(&loader, false);
        member.process(&mut immediate, &elements()[0]).unwrap();

        let (mut deferring, _) = context(&loader, true);
        member.process(&mut deferring, &elements()[1]).unwrap();

        assert_eq!(member.mode(), Some(BindingMode::Immediate));
        assert_eq!(member.pending(), 0);
        assert_eq!(recorder.lock().seen, vec!["a.First"]);
    }

    #[test]
    fn test_replay_uses_captured_object() {
        let loader = Arc::new(ModuleClassLoader::new("bundle"));
        define_all(&loader);
        let member = recording_member();

        let (mut ctx, first) = context(&loader, true);
        member.process(&mut ctx, &elements()[0]).unwrap();

        // the live context moves on to another object
        ctx.pop();
        let second = shared(Recorder::default());
        let handle: ObjectHandle = second.clone();
        ctx.push(handle);
        member.process(&mut ctx, &elements()[1]).unwrap();

        member.flush().unwrap();
        assert_eq!(first.lock().seen, vec!["a.First"]);
        assert_eq!(second.lock().seen, vec!["a.Second"]);
    }

    #[test]
    fn test_flush_stops_at_first_error() {
        let loader = Arc::new(ModuleClassLoader::new("bundle"));
        let (mut ctx, recorder) = context(&loader, true);
        let member = recording_member();
        for element in elements() {
            member.process(&mut ctx, &element).unwrap();
        }

        loader.define(ClassRef::named("a.First"));
        let err = member.flush().unwrap_err();
        assert!(matches!(err, MappingError::ClassResolution { ref name, .. } if name == "a.Second"));
        assert_eq!(recorder.lock().seen, vec!["a.First"]);
        assert_eq!(member.pending(), 1);

        define_all(&loader);
        assert_eq!(member.flush().unwrap(), 1);
        assert_eq!(recorder.lock().seen, vec!["a.First", "a.Third"]);
    }
}
