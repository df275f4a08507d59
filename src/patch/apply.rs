//! Patch replay.
//!
//! Replay walks a patch with an explicit worklist: the root is pushed, then the head is popped
//! repeatedly. Leaf operations are yielded, [`Patch::AndThen`] pushes its second and first
//! operands back so the first is processed next, and [`Patch::Empty`] is skipped. Chains of any
//! length replay in constant stack space.

use tracing::trace;

use crate::{patch::Patch, registry::Registry, service::Service, tag::CapabilityTag};

/// A leaf operation of a patch, borrowed from it.
#[derive(Debug)]
pub enum PatchOp<'a, T: CapabilityTag> {
    /// Register `service` under `tag`
    AddService(&'a T, &'a Service),
    /// Set the scope slot
    AddScope(Option<&'a Service>),
}

impl<T: CapabilityTag> Clone for PatchOp<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: CapabilityTag> Copy for PatchOp<'_, T> {}

/// Iterator over the leaf operations of a [`Patch`] in application order.
///
/// Created by [`Patch::ops`].
pub struct Ops<'a, T: CapabilityTag> {
    worklist: Vec<&'a Patch<T>>,
}

impl<'a, T: CapabilityTag> Iterator for Ops<'a, T> {
    type Item = PatchOp<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(patch) = self.worklist.pop() {
            match patch {
                Patch::Empty => {}
                Patch::AddService { tag, service } => {
                    return Some(PatchOp::AddService(tag, service));
                }
                Patch::AddScope(scope) => return Some(PatchOp::AddScope(scope.as_ref())),
                Patch::AndThen(first, second) => {
                    self.worklist.push(second);
                    self.worklist.push(first);
                }
            }
        }
        None
    }
}

impl<T: CapabilityTag> Patch<T> {
    /// Iterates the leaf operations of this patch in application order.
    #[must_use]
    pub fn ops(&self) -> Ops<'_, T> {
        Ops {
            worklist: vec![self],
        }
    }

    /// Replays this patch over `registry`.
    ///
    /// Each [`Patch::AddService`] goes through [`Registry::add`] and each [`Patch::AddScope`]
    /// replaces the scope slot. If the outcome is relaxed-equal to `registry`, `registry` itself
    /// is returned so no-op replays keep sharing the input snapshot.
    ///
    /// # Arguments
    ///
    /// * `registry` - The snapshot to transform
    #[must_use]
    pub fn apply(&self, registry: &Registry<T>) -> Registry<T> {
        let mut current = registry.clone();
        let mut replayed = 0_usize;

        for op in self.ops() {
            current = match op {
                PatchOp::AddService(tag, service) => current.add(tag.clone(), service.clone()),
                PatchOp::AddScope(scope) => current.with_scope(scope.cloned()),
            };
            replayed += 1;
        }

        if registry.config().fast_path_equality && current.relaxed_eq(registry) {
            trace!(replayed, "patch replay was a no-op");
            return registry.clone();
        }

        trace!(replayed, "replayed patch");
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::RegistryConfig, tag::Tag, test::scope_handle};

    fn a() -> Tag {
        Tag::new("A")
    }

    #[test]
    fn test_ops_order_follows_composition() {
        let left: Patch = Patch::add_service(Tag::new("1"), Service::new(1))
            .combine(Patch::add_service(Tag::new("2"), Service::new(2)));
        let right: Patch = Patch::add_service(Tag::new("3"), Service::new(3))
            .combine(Patch::add_scope(None));
        let patch = left.combine(Patch::empty()).combine(right);

        let names: Vec<String> = patch
            .ops()
            .map(|op| match op {
                PatchOp::AddService(tag, _) => tag.to_string(),
                PatchOp::AddScope(_) => "scope".to_string(),
            })
            .collect();
        assert_eq!(names, vec!["1", "2", "3", "scope"]);
    }

    #[test]
    fn test_patch_op_is_copy() {
        let patch: Patch = Patch::add_service(a(), Service::new(1));
        let op = patch.ops().next().unwrap();
        let copy = op;

        for op in [op, copy] {
            match op {
                PatchOp::AddService(tag, service) => {
                    assert_eq!(tag, &a());
                    assert_eq!(service, &Service::new(1));
                }
                PatchOp::AddScope(_) => panic!("unexpected scope operation"),
            }
        }
    }

    #[test]
    fn test_apply_add_service() {
        let registry = Registry::empty().add(a(), Service::new(1));
        let patch = Patch::add_service(Tag::new("B"), Service::new(2));

        let patched = patch.apply(&registry);
        assert_eq!(patched.len(), 2);
        assert_eq!(patched.get(&Tag::new("B")), Service::new(2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_apply_scope_set_and_clear() {
        let scope = scope_handle("S");
        let registry = Registry::empty().add(a(), Service::new(1));

        let scoped = Patch::add_scope(Some(scope.clone())).apply(&registry);
        assert!(scoped.scope().unwrap().ptr_eq(&scope));

        let cleared = Patch::add_scope(None).apply(&scoped);
        assert!(cleared.scope().is_none());
    }

    #[test]
    fn test_apply_noop_returns_input() {
        let service = Service::new(1);
        let registry = Registry::empty().add(a(), service.clone());

        let patched = Patch::add_service(a(), service).apply(&registry);
        assert!(patched.ptr_eq(&registry));
        assert!(Patch::Empty.apply(&registry).ptr_eq(&registry));
    }

    #[test]
    fn test_apply_noop_without_fast_path() {
        let service = Service::new(1);
        let registry = Registry::with_config(RegistryConfig::minimal()).add(a(), service.clone());

        let patched = Patch::add_service(a(), service).apply(&registry);
        assert!(!patched.ptr_eq(&registry));
        assert!(patched.relaxed_eq(&registry));
    }

    #[test]
    fn test_apply_long_chain_is_stack_safe() {
        let mut patch: Patch = Patch::empty();
        for i in 0..100_000 {
            patch = patch.combine(Patch::add_service(
                Tag::new(&format!("T{}", i % 64)),
                Service::new(i),
            ));
        }

        let patched = patch.apply(&Registry::empty());
        assert_eq!(patched.len(), 64);
        assert_eq!(patched.get(&Tag::new("T31")), Service::new(99_999));
        assert_eq!(patched.get(&Tag::new("T63")), Service::new(99_967));
    }

    #[test]
    fn test_apply_right_nested_chain() {
        let mut patch: Patch = Patch::empty();
        for i in 0..100_000 {
            patch = Patch::add_service(Tag::new("A"), Service::new(i)).combine(patch);
        }

        let patched = patch.apply(&Registry::empty());
        assert_eq!(patched.get(&a()), Service::new(0));
    }
}
