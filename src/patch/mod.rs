//! Edit scripts between registry snapshots.
//!
//! A [`Patch`] is a pure value describing how to turn one registry into another. Patches are
//! produced by [`Patch::diff`] from two snapshots of the same lineage (for example before and
//! after a resource-construction step) and replayed by [`Patch::apply`] onto any registry of the
//! same starting shape, which is much cheaper than a full merge.
//!
//! # Operations
//!
//! The operation set is closed:
//!
//! - [`Patch::Empty`] - The identity
//! - [`Patch::AddService`] - Register a service under a tag
//! - [`Patch::AddScope`] - Replace the scope slot
//! - [`Patch::AndThen`] - Sequential composition
//!
//! Composition is associative and [`Patch::Empty`] is its identity.
//!
//! # Stack Safety
//!
//! Composed patches form trees of arbitrary depth. Traversal ([`Patch::ops`], and therefore
//! [`Patch::apply`]) and destruction both use an explicit worklist, never recursion.
//!
//! # Examples
//!
//! ```rust
//! use capenv::{Patch, Registry, Service, Tag};
//!
//! let old: Registry = Registry::empty()
//!     .add(Tag::new("A"), Service::new(1))
//!     .add(Tag::new("B"), Service::new(2));
//! let new = old
//!     .add(Tag::new("B"), Service::new(3))
//!     .add(Tag::new("C"), Service::new(4));
//!
//! let patch = Patch::diff(&old, &new);
//! assert_eq!(patch.len(), 2);
//! assert_eq!(patch.apply(&old), new);
//! ```

mod apply;
mod diff;

pub use apply::{Ops, PatchOp};

use std::{fmt, sync::Arc};

use strum::IntoStaticStr;

use crate::{
    service::Service,
    tag::{CapabilityTag, Tag},
};

/// A composable transformation between two registry snapshots.
///
/// `Debug` renders the flattened leaf operations in application order.
#[derive(Clone, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Patch<T: CapabilityTag = Tag> {
    /// Leaves the registry untouched.
    Empty,
    /// Registers `service` under `tag`, as [`Registry::add`](crate::Registry::add) does.
    AddService {
        /// The capability to register
        tag: T,
        /// The service to store
        service: Service,
    },
    /// Sets the scope slot, clearing it for `None`.
    AddScope(Option<Service>),
    /// Applies the first patch, then the second.
    AndThen(Arc<Patch<T>>, Arc<Patch<T>>),
}

impl<T: CapabilityTag> Patch<T> {
    /// The identity patch.
    #[must_use]
    pub fn empty() -> Self {
        Patch::Empty
    }

    /// A patch registering `service` under `tag`.
    #[must_use]
    pub fn add_service(tag: T, service: Service) -> Self {
        Patch::AddService { tag, service }
    }

    /// A patch setting the scope slot.
    #[must_use]
    pub fn add_scope(scope: Option<Service>) -> Self {
        Patch::AddScope(scope)
    }

    /// Sequentially composes `self` and `that`.
    ///
    /// Composing with [`Patch::Empty`] on either side returns the other operand unchanged.
    #[must_use]
    pub fn combine(self, that: Patch<T>) -> Patch<T> {
        if matches!(self, Patch::Empty) {
            return that;
        }
        if matches!(that, Patch::Empty) {
            return self;
        }

        Patch::AndThen(Arc::new(self), Arc::new(that))
    }

    /// Returns `true` if the patch performs no operation.
    ///
    /// Agrees with `len() == 0`, including compositions of empty patches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops().next().is_none()
    }

    /// Returns the number of leaf operations in application order.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops().count()
    }

    /// Returns the name of the operation at the root of this patch.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

impl<T: CapabilityTag> fmt::Debug for Patch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ops()).finish()
    }
}

impl<T: CapabilityTag> Default for Patch<T> {
    fn default() -> Self {
        Patch::Empty
    }
}

impl<T: CapabilityTag> Drop for Patch<T> {
    fn drop(&mut self) {
        let Patch::AndThen(first, second) = self else {
            return;
        };

        let mut pending = vec![detach(first), detach(second)];
        while let Some(node) = pending.pop() {
            // Only the last owner unlinks; shared subtrees stay alive for their other owners
            if let Some(mut node) = Arc::into_inner(node) {
                if let Patch::AndThen(first, second) = &mut node {
                    pending.push(detach(first));
                    pending.push(detach(second));
                }
            }
        }
    }
}

fn detach<T: CapabilityTag>(child: &mut Arc<Patch<T>>) -> Arc<Patch<T>> {
    std::mem::replace(child, Arc::new(Patch::Empty))
}
