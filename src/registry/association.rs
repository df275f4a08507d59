//! Insertion-ordered, structurally shared association from capability tags to services.
//!
//! [`OrderedAssociation`] keeps one entry per exact tag. Iteration follows the order of first
//! insertion; replacing the service of an existing tag keeps the entry where it is. Diffing
//! relies on that property to align two snapshots by position.
//!
//! Storage uses `imbl` persistent structures, so copying an association is O(1) and
//! [`updated`](OrderedAssociation::updated) only copies the path to the touched entry.

use imbl::{HashMap as ImHashMap, Vector as ImVector};

use crate::{service::Service, tag::CapabilityTag};

/// Ordered map from capability tag to service with last-write-wins per exact tag.
#[derive(Clone)]
pub struct OrderedAssociation<T: CapabilityTag> {
    /// Entries in first-insertion order
    entries: ImVector<(T, Service)>,
    /// Position of every tag inside `entries`
    positions: ImHashMap<T, usize>,
}

impl<T: CapabilityTag> OrderedAssociation<T> {
    /// Creates an empty association.
    #[must_use]
    pub fn new() -> Self {
        OrderedAssociation {
            entries: ImVector::new(),
            positions: ImHashMap::new(),
        }
    }

    /// Returns a copy with `service` stored under `tag`.
    ///
    /// An existing entry for the exact same tag is replaced in place, otherwise the entry is
    /// appended. `self` is left untouched.
    ///
    /// # Arguments
    ///
    /// * `tag` - The capability to register
    /// * `service` - The service to store under `tag`
    #[must_use]
    pub fn updated(&self, tag: T, service: Service) -> Self {
        let mut next = self.clone();
        next.insert(tag, service);
        next
    }

    /// Stores `service` under `tag` in place.
    ///
    /// # Returns
    ///
    /// `true` if an existing entry was replaced, `false` if a new one was appended.
    pub(crate) fn insert(&mut self, tag: T, service: Service) -> bool {
        if let Some(&position) = self.positions.get(&tag) {
            self.entries.set(position, (tag, service));
            true
        } else {
            self.positions.insert(tag.clone(), self.entries.len());
            self.entries.push_back((tag, service));
            false
        }
    }

    /// Returns the service stored under exactly `tag`, ignoring subtyping.
    #[must_use]
    pub fn get_exact(&self, tag: &T) -> Option<&Service> {
        let position = *self.positions.get(tag)?;
        self.entries.get(position).map(|(_, service)| service)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the association holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if both associations are known to share their entry storage.
    ///
    /// Sharing implies equal contents. A `false` result says nothing about equality: small
    /// associations are stored inline, so their copies never report shared storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || self.entries.ptr_eq(&other.entries)
    }

    /// Iterates entries in insertion order; use `.rev()` for most-recent-first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&T, &Service)> + ExactSizeIterator {
        self.entries.iter().map(|(tag, service)| (tag, service))
    }
}

impl<T: CapabilityTag> Default for OrderedAssociation<T> {
    fn default() -> Self {
        Self::new()
    }
}
