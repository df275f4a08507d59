//! Snapshot diffing.
//!
//! [`Patch::diff`] reconstructs an edit script from two snapshots without comparing them
//! entry by entry in full. It exploits the fact that associations only grow and keep entries in
//! first-insertion order:
//!
//! 1. When both snapshots share their association storage, only the scope can differ.
//! 2. Otherwise both associations are walked forward with one cursor each. For every new entry,
//!    the old cursor skips ahead to the entry with the same tag. Same tag and same service
//!    reference means the entry is aligned and needs no operation.
//! 3. The first new entry that cannot be aligned (its service changed, or the old cursor ran
//!    out) ends alignment. It and every later new entry become [`Patch::AddService`].
//! 4. A scope that differs by reference becomes a trailing [`Patch::AddScope`].
//!
//! Removals are never represented: an entry present in the old snapshot and absent from the
//! new one leaves no trace in the patch. Registries in this crate only grow along a lineage, and
//! callers rely on patches never removing services.

use tracing::trace;

use crate::{
    patch::Patch,
    registry::Registry,
    service::{same_identity, Service},
    tag::CapabilityTag,
};

impl<T: CapabilityTag> Patch<T> {
    /// Computes the patch that turns `old` into `new`.
    ///
    /// For `new` derived from `old` through `add`/`add_scope` calls,
    /// `Patch::diff(old, new).apply(old)` is relaxed-equal to `new`.
    ///
    /// # Arguments
    ///
    /// * `old` - The snapshot the patch starts from
    /// * `new` - The snapshot the patch leads to
    #[must_use]
    pub fn diff(old: &Registry<T>, new: &Registry<T>) -> Patch<T> {
        let scope_patch = if same_identity(old.scope(), new.scope()) {
            Patch::Empty
        } else {
            Patch::AddScope(new.scope().cloned())
        };

        if old.shares_association(new) {
            return scope_patch;
        }

        let mut previous = old.association().iter();
        let mut aligned = true;
        let mut patch = Patch::Empty;
        let mut added = 0_usize;

        for (tag, service) in new.association().iter() {
            if aligned {
                aligned = advance_to(&mut previous, tag, service);
                if aligned {
                    continue;
                }
                trace!(%tag, "diff alignment broken");
            }

            patch = patch.combine(Patch::add_service(tag.clone(), service.clone()));
            added += 1;
        }

        trace!(added, scope = !scope_patch.is_empty(), "computed registry diff");
        patch.combine(scope_patch)
    }
}

/// Skips `previous` forward to the entry tagged `tag`.
///
/// Returns `true` if such an entry exists and holds the same service reference.
fn advance_to<'a, T, I>(previous: &mut I, tag: &T, service: &Service) -> bool
where
    T: CapabilityTag,
    I: Iterator<Item = (&'a T, &'a Service)>,
{
    previous
        .find(|(old_tag, _)| *old_tag == tag)
        .is_some_and(|(_, old_service)| old_service.ptr_eq(service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{patch::PatchOp, tag::Tag, test::scope_handle};

    fn tag(name: &str) -> Tag {
        Tag::new(name)
    }

    fn added_tags(patch: &Patch) -> Vec<String> {
        patch
            .ops()
            .map(|op| match op {
                PatchOp::AddService(tag, _) => tag.to_string(),
                PatchOp::AddScope(_) => "scope".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let registry = Registry::empty().add(tag("A"), Service::new(1));
        assert!(Patch::diff(&registry, &registry).is_empty());
    }

    #[test]
    fn test_diff_scope_only() {
        let registry = Registry::empty().add(tag("A"), Service::new(1));
        let scope = scope_handle("S");
        let scoped = registry.add_scope(scope.clone());

        let patch = Patch::diff(&registry, &scoped);
        match &patch {
            Patch::AddScope(Some(added)) => assert!(added.ptr_eq(&scope)),
            other => panic!("unexpected patch {other:?}"),
        }

        let cleared = Patch::diff(&scoped, &registry);
        assert!(matches!(cleared, Patch::AddScope(None)));
    }

    #[test]
    fn test_diff_override_and_append() {
        let old = Registry::empty()
            .add(tag("A"), Service::new(1))
            .add(tag("B"), Service::new(2));
        let new = old.add(tag("B"), Service::new(3)).add(tag("C"), Service::new(4));

        let patch = Patch::diff(&old, &new);
        assert_eq!(added_tags(&patch), vec!["B", "C"]);
        assert_eq!(patch.apply(&old), new);
    }

    #[test]
    fn test_diff_break_takes_all_following_entries() {
        let old = Registry::empty()
            .add(tag("A"), Service::new(1))
            .add(tag("B"), Service::new(2))
            .add(tag("C"), Service::new(3));
        let new = old.add(tag("A"), Service::new(10));

        let patch = Patch::diff(&old, &new);
        assert_eq!(added_tags(&patch), vec!["A", "B", "C"]);
        assert!(patch.apply(&old).relaxed_eq(&new));
    }

    #[test]
    fn test_diff_equal_but_distinct_service_is_added() {
        let old = Registry::empty().add(tag("A"), Service::new(1));
        let new = old.add(tag("A"), Service::new(1));

        assert_eq!(added_tags(&Patch::diff(&old, &new)), vec!["A"]);
    }

    #[test]
    fn test_diff_with_scope_change_appends_scope_last() {
        let old = Registry::empty().add(tag("A"), Service::new(1));
        let new = old.add(tag("B"), Service::new(2)).add_scope(scope_handle("S"));

        let patch = Patch::diff(&old, &new);
        assert_eq!(added_tags(&patch), vec!["B", "scope"]);
        assert!(patch.apply(&old).relaxed_eq(&new));
    }

    #[test]
    fn test_diff_skips_old_entries_missing_from_new() {
        let old = Registry::empty()
            .add(tag("A"), Service::new(1))
            .add(tag("B"), Service::new(2))
            .add(tag("C"), Service::new(3));
        let new = old.prune(&[tag("A"), tag("C")].into_iter().collect());

        let patch = Patch::diff(&old, &new);
        assert!(patch.is_empty());
        assert_eq!(patch.apply(&old).len(), 3);
    }

    #[test]
    fn test_diff_old_exhausted() {
        let old = Registry::empty().add(tag("A"), Service::new(1));
        let new = Registry::empty()
            .add(tag("B"), Service::new(2))
            .add(tag("A"), Service::new(1));

        assert_eq!(added_tags(&Patch::diff(&old, &new)), vec!["B", "A"]);
    }
}
