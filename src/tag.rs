//! Capability tags and the subtype order between them.
//!
//! A capability tag is the key a service is registered under. The registry never inspects
//! tags beyond the [`CapabilityTag`] contract: identity (`Eq`/`Hash`/`Ord`) plus the partial
//! order [`CapabilityTag::is_subtype_of`], which answers whether a service registered under one
//! tag satisfies a request for another.
//!
//! # Key Components
//!
//! - [`CapabilityTag`] - The contract the registry consumes
//! - [`Tag`] - A named tag with an explicit, transitively closed set of supertypes
//!
//! # Distinguished Capabilities
//!
//! Two capabilities are special to the registry:
//!
//! - The **scope** capability ([`Tag::scope`]), whose value is held in a dedicated slot of the
//!   registry instead of the general association.
//! - The **unit** capability ([`Tag::unit`]), the universal "no requirement" capability. Every tag
//!   is a subtype of it, and an empty registry resolves it to the unit service.
//!
//! # Examples
//!
//! ```rust
//! use capenv::Tag;
//!
//! let logging = Tag::new("Logging");
//! let console = Tag::extending("ConsoleLogging", &[&logging]);
//!
//! assert!(console.is_subtype_of(&logging));
//! assert!(!logging.is_subtype_of(&console));
//! assert!(console.is_subtype_of(&Tag::unit()));
//! ```

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

/// Name of the distinguished scope capability used by [`Tag::scope`].
pub const SCOPE_TAG_NAME: &str = "Scope";

/// Name of the universal "no requirement" capability used by [`Tag::unit`].
pub const UNIT_TAG_NAME: &str = "Any";

/// Identifier of a capability, as consumed by [`Registry`](crate::Registry).
///
/// Implementations must make [`is_subtype_of`](Self::is_subtype_of) reflexive and transitive.
/// Lookup behaviour for a predicate violating either property is unspecified.
pub trait CapabilityTag:
    Clone + Eq + Hash + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Returns `true` if a service registered under `self` satisfies a request for `other`.
    fn is_subtype_of(&self, other: &Self) -> bool;

    /// Returns `true` for the scope capability and its subtypes.
    fn is_scope(&self) -> bool;

    /// Returns `true` for the universal "no requirement" capability.
    fn is_unit(&self) -> bool;
}

/// A named capability tag with declared supertypes.
///
/// Tags are identified by name: two tags with the same name are equal, hash identically and
/// order together, regardless of the parents they were declared with. The supertype set is
/// closed transitively at construction, so subtype checks are a single binary search.
///
/// Cloning is a reference count increment.
#[derive(Clone)]
pub struct Tag(Arc<TagInner>);

struct TagInner {
    name: Arc<str>,
    /// Strict supertypes, transitively closed, sorted and deduplicated
    ancestors: Box<[Arc<str>]>,
}

impl Tag {
    /// Creates a tag without declared supertypes.
    ///
    /// # Arguments
    ///
    /// * `name` - The unique name identifying this capability
    #[must_use]
    pub fn new(name: &str) -> Self {
        Tag(Arc::new(TagInner {
            name: Arc::from(name),
            ancestors: Box::new([]),
        }))
    }

    /// Creates a tag that is a subtype of every tag in `parents`, and of all their supertypes.
    ///
    /// # Arguments
    ///
    /// * `name` - The unique name identifying this capability
    /// * `parents` - The direct supertypes of the new tag
    #[must_use]
    pub fn extending(name: &str, parents: &[&Tag]) -> Self {
        let mut ancestors: Vec<Arc<str>> = Vec::new();
        for parent in parents {
            ancestors.push(Arc::clone(&parent.0.name));
            ancestors.extend(parent.0.ancestors.iter().cloned());
        }
        ancestors.sort_unstable();
        ancestors.dedup();

        Tag(Arc::new(TagInner {
            name: Arc::from(name),
            ancestors: ancestors.into_boxed_slice(),
        }))
    }

    /// The distinguished scope capability.
    #[must_use]
    pub fn scope() -> Self {
        Tag::new(SCOPE_TAG_NAME)
    }

    /// The universal "no requirement" capability.
    #[must_use]
    pub fn unit() -> Self {
        Tag::new(UNIT_TAG_NAME)
    }

    /// Returns the name of this tag.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Returns the strict supertypes of this tag in name order.
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        self.0.ancestors.iter().map(AsRef::as_ref)
    }

    /// Returns `true` if a service registered under `self` satisfies a request for `other`.
    ///
    /// Holds when both tags are equal, when `other` is a declared (possibly indirect)
    /// supertype of `self`, or when `other` is the unit capability.
    #[must_use]
    pub fn is_subtype_of(&self, other: &Tag) -> bool {
        self == other
            || other.name() == UNIT_TAG_NAME
            || self
                .0
                .ancestors
                .binary_search_by(|ancestor| ancestor.as_ref().cmp(other.name()))
                .is_ok()
    }
}

impl CapabilityTag for Tag {
    fn is_subtype_of(&self, other: &Self) -> bool {
        Tag::is_subtype_of(self, other)
    }

    fn is_scope(&self) -> bool {
        self.name() == SCOPE_TAG_NAME || self.ancestors().any(|name| name == SCOPE_TAG_NAME)
    }

    fn is_unit(&self) -> bool {
        self.name() == UNIT_TAG_NAME
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::new(name)
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.name.cmp(&other.0.name)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.ancestors.is_empty() {
            write!(f, "Tag({})", self.0.name)
        } else {
            write!(f, "Tag({} <: {})", self.0.name, self.0.ancestors.join(", "))
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}
