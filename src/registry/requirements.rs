//! Declared requirement sets.
//!
//! A [`Requirements`] value lists the capabilities a consumer of a registry statically depends
//! on. [`Registry::prune`](crate::Registry::prune) narrows a registry down to such a set and
//! [`Registry::union`](crate::Registry::union) uses one to discard irrelevant entries of the
//! right-hand side before merging.

use std::collections::BTreeSet;

use crate::tag::CapabilityTag;

/// An ordered set of required capability tags.
///
/// # Examples
///
/// ```rust
/// use capenv::{Requirements, Tag};
///
/// let shape = Requirements::new()
///     .with(Tag::new("Database"))
///     .with(Tag::scope());
///
/// assert_eq!(shape.len(), 2);
/// assert!(shape.requires_scope());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirements<T: CapabilityTag> {
    tags: BTreeSet<T>,
}

impl<T: CapabilityTag> Requirements<T> {
    /// Creates an empty requirement set.
    #[must_use]
    pub fn new() -> Self {
        Requirements {
            tags: BTreeSet::new(),
        }
    }

    /// Adds a required capability, builder style.
    #[must_use]
    pub fn with(mut self, tag: T) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Adds a required capability.
    ///
    /// # Returns
    ///
    /// `true` if the capability was not required yet.
    pub fn insert(&mut self, tag: T) -> bool {
        self.tags.insert(tag)
    }

    /// Returns `true` if exactly `tag` is required.
    #[must_use]
    pub fn contains(&self, tag: &T) -> bool {
        self.tags.contains(tag)
    }

    /// Returns `true` if the scope capability is required.
    #[must_use]
    pub fn requires_scope(&self) -> bool {
        self.tags.iter().any(CapabilityTag::is_scope)
    }

    /// Iterates the required capabilities in tag order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.tags.iter()
    }

    /// Iterates the required capabilities that select regular service entries.
    ///
    /// Scope capabilities are excluded, they live in the dedicated scope slot. The unit
    /// capability is kept and selects every entry.
    pub(crate) fn selectors(&self) -> impl Iterator<Item = &T> {
        self.tags.iter().filter(|tag| !tag.is_scope())
    }

    /// Returns the number of required capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns `true` if nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl<T: CapabilityTag> Default for Requirements<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CapabilityTag> FromIterator<T> for Requirements<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Requirements {
            tags: iter.into_iter().collect(),
        }
    }
}

impl<T: CapabilityTag> Extend<T> for Requirements<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.tags.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::Tag;

    #[test]
    fn test_requirements_dedup_and_order() {
        let shape: Requirements<Tag> = ["B", "A", "B"].into_iter().map(Tag::new).collect();

        assert_eq!(shape.len(), 2);
        assert_eq!(
            shape.iter().map(Tag::name).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
    }

    #[test]
    fn test_requirements_selectors_skip_scope() {
        let mut shape = Requirements::new()
            .with(Tag::new("A"))
            .with(Tag::unit())
            .with(Tag::scope());
        shape.extend([Tag::new("C")]);

        assert!(shape.requires_scope());
        assert!(shape.contains(&Tag::unit()));
        assert_eq!(
            shape.selectors().map(Tag::name).collect::<Vec<_>>(),
            vec!["A", "Any", "C"]
        );
    }

    #[test]
    fn test_requirements_insert() {
        let mut shape = Requirements::default();
        assert!(shape.is_empty());
        assert!(shape.insert(Tag::new("A")));
        assert!(!shape.insert(Tag::new("A")));
        assert!(!shape.requires_scope());
    }
}
