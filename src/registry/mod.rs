//! Immutable capability registry.
//!
//! This module provides the [`Registry`], the immutable snapshot that maps capability tags to
//! services. Every computation of an effect runtime carries one registry as its ambient
//! environment; composing computations means merging, pruning or patching registries on hot
//! paths, so every operation here is built to share as much of its input as possible.
//!
//! # Key Components
//!
//! - [`Registry`] - The snapshot: ordered association, lookup cache and scope slot
//! - [`OrderedAssociation`] - Insertion-ordered, persistent entry storage
//! - [`Requirements`] - Declared requirement sets for `prune` and `union`
//!
//! # Lookup
//!
//! [`Registry::get`] resolves a requested tag in this order:
//!
//! 1. The per-snapshot lookup cache
//! 2. The scope slot, for scope capabilities
//! 3. The unit service, for the unit capability on an empty registry
//! 4. A scan of the association in **reverse** insertion order for the first entry whose tag
//!    is a subtype of the requested one, so later registrations shadow earlier ones
//!
//! Successful scans are memoized in the cache of the snapshot they ran against.
//!
//! # Scope Slot
//!
//! Scope values churn once per resource acquisition. They live in a dedicated slot rather than
//! in the association, so replacing the scope keeps both the association and the lookup cache
//! of the previous snapshot.
//!
//! # Thread Safety
//!
//! Registries are immutable and `Send + Sync`. The lookup cache is the only shared mutable
//! state and uses `DashMap`; racing writers store identical resolutions.
//!
//! # Examples
//!
//! ```rust
//! use capenv::{Registry, Requirements, Service, Tag};
//!
//! let a = Tag::new("A");
//! let b = Tag::new("B");
//!
//! let registry: Registry = Registry::empty()
//!     .add(a.clone(), Service::new(1))
//!     .add(b.clone(), Service::new(2));
//!
//! assert_eq!(registry.get(&a), Service::new(1));
//!
//! let pruned = registry.prune(&Requirements::new().with(a.clone()));
//! assert_eq!(pruned.len(), 1);
//! assert!(pruned.try_get(&b).is_err());
//! ```

mod association;
mod cache;
mod requirements;

pub use association::OrderedAssociation;
pub use requirements::Requirements;

use std::{
    any::Any,
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock},
};

use rustc_hash::FxHasher;
use tracing::debug;

use crate::{
    config::RegistryConfig,
    service::{same_identity, Service},
    tag::{CapabilityTag, Tag},
    Error, Result,
};

use cache::LookupCache;

/// An immutable snapshot mapping capability tags to services.
///
/// A `Registry` is a cheap handle: cloning it shares the snapshot, and two clones are
/// reference-identical. Every operation that looks like a mutation returns a new registry and
/// leaves the receiver valid.
///
/// # Equality
///
/// `PartialEq` compares structurally: same scope identity, same size and hash, and the same
/// entries in the same order with deep service equality. [`relaxed_eq`](Self::relaxed_eq)
/// compares services by reference only, which can miss equal registries but never reports
/// unequal ones as equal.
pub struct Registry<T: CapabilityTag = Tag> {
    inner: Arc<RegistryInner<T>>,
}

struct RegistryInner<T: CapabilityTag> {
    association: Arc<OrderedAssociation<T>>,
    cache: Arc<LookupCache<T>>,
    scope: Option<Service>,
    config: RegistryConfig,
    /// Computed on first use from (size, ordered tags, scope identity)
    hash: OnceLock<u64>,
}

impl<T: CapabilityTag> Registry<T> {
    fn from_parts(
        association: Arc<OrderedAssociation<T>>,
        cache: Arc<LookupCache<T>>,
        scope: Option<Service>,
        config: RegistryConfig,
    ) -> Self {
        Registry {
            inner: Arc::new(RegistryInner {
                association,
                cache,
                scope,
                config,
                hash: OnceLock::new(),
            }),
        }
    }

    fn fresh_cache(&self) -> Arc<LookupCache<T>> {
        Arc::new(LookupCache::new(self.inner.config.enable_lookup_cache))
    }

    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry with the given configuration.
    ///
    /// Every registry derived from the result inherits `config`.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self::from_parts(
            Arc::new(OrderedAssociation::new()),
            Arc::new(LookupCache::new(config.enable_lookup_cache)),
            None,
            config,
        )
    }

    /// Returns the configuration of this registry.
    #[must_use]
    pub fn config(&self) -> RegistryConfig {
        self.inner.config
    }

    /// Returns a registry with `service` registered under `tag`.
    ///
    /// An entry for the exact same tag is replaced in place. The result starts with an empty
    /// lookup cache, since the new entry may shadow earlier resolutions. Scope capabilities are
    /// routed to [`add_scope`](Self::add_scope).
    ///
    /// # Arguments
    ///
    /// * `tag` - The capability `service` provides
    /// * `service` - The service instance
    #[must_use]
    pub fn add(&self, tag: T, service: Service) -> Self {
        if tag.is_scope() {
            return self.add_scope(service);
        }

        Self::from_parts(
            Arc::new(self.inner.association.updated(tag, service)),
            self.fresh_cache(),
            self.inner.scope.clone(),
            self.inner.config,
        )
    }

    /// Returns a registry whose scope slot holds `scope`.
    ///
    /// If `scope` is reference-identical to the current scope, the receiver itself is
    /// returned. Otherwise the result shares the association and the lookup cache.
    #[must_use]
    pub fn add_scope(&self, scope: Service) -> Self {
        self.with_scope(Some(scope))
    }

    pub(crate) fn with_scope(&self, scope: Option<Service>) -> Self {
        if same_identity(self.inner.scope.as_ref(), scope.as_ref()) {
            return self.clone();
        }

        Self::from_parts(
            Arc::clone(&self.inner.association),
            Arc::clone(&self.inner.cache),
            scope,
            self.inner.config,
        )
    }

    /// Resolves `tag`, returning `None` when no service satisfies it.
    ///
    /// See the [module documentation](self) for the resolution order.
    #[must_use]
    pub fn get_option(&self, tag: &T) -> Option<Service> {
        let inner = &*self.inner;

        if let Some(hit) = inner.cache.get(tag) {
            return Some(hit);
        }

        if tag.is_scope() {
            if let Some(scope) = &inner.scope {
                return Some(scope.clone());
            }
        }

        if inner.association.is_empty() && tag.is_unit() {
            return Some(Service::unit());
        }

        let found = inner
            .association
            .iter()
            .rev()
            .find(|(candidate, _)| candidate.is_subtype_of(tag))
            .map(|(_, service)| service.clone())?;

        inner.cache.put_if_absent(tag.clone(), found.clone());
        Some(found)
    }

    /// Resolves `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCapability`] if no service satisfies `tag`.
    pub fn try_get(&self, tag: &T) -> Result<Service> {
        self.get_option(tag)
            .ok_or_else(|| missing_capability!(tag, self))
    }

    /// Resolves `tag`.
    ///
    /// # Panics
    ///
    /// A missing capability is a defect: the static requirement tracking that should have
    /// guaranteed its presence was bypassed. The error is logged and the call panics with the
    /// tag and a rendering of the registry.
    #[must_use]
    pub fn get(&self, tag: &T) -> Service {
        match self.try_get(tag) {
            Ok(service) => service,
            Err(error) => defect!(error),
        }
    }

    /// Resolves `tag`, falling back to `default` when no service satisfies it.
    pub fn get_or_else<F>(&self, tag: &T, default: F) -> Service
    where
        F: FnOnce() -> Service,
    {
        self.get_option(tag).unwrap_or_else(default)
    }

    /// Resolves `tag` and downcasts the service to `S`.
    ///
    /// Returns `None` when nothing satisfies `tag` or the service is not an `S`.
    #[must_use]
    pub fn get_as<S: Any + Send + Sync>(&self, tag: &T) -> Option<Arc<S>> {
        self.get_option(tag)?.downcast::<S>()
    }

    /// Returns `true` if some service satisfies `tag`.
    #[must_use]
    pub fn contains(&self, tag: &T) -> bool {
        self.get_option(tag).is_some()
    }

    /// Returns a registry where the service resolved for `tag` is replaced by `f(service)`.
    ///
    /// The new service is registered under exactly `tag`.
    ///
    /// # Panics
    ///
    /// Panics like [`get`](Self::get) when nothing satisfies `tag`.
    #[must_use]
    pub fn update<F>(&self, tag: T, f: F) -> Self
    where
        F: FnOnce(Service) -> Service,
    {
        let current = self.get(&tag);
        self.add(tag, f(current))
    }

    /// Returns a registry that only keeps what `required` asks for.
    ///
    /// An entry is kept if its tag is a subtype of some required tag, so requiring the unit
    /// capability keeps every entry. The scope slot is kept if
    /// a scope capability is required. If nothing would be removed, or the receiver is empty, the
    /// receiver is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PruneViolation`] listing every required capability that no entry
    /// satisfies.
    pub fn try_prune(&self, required: &Requirements<T>) -> Result<Self> {
        if required.is_empty() || self.is_empty() {
            return Ok(self.clone());
        }

        let inner = &*self.inner;
        let missing: Vec<String> = required
            .iter()
            .filter(|tag| !self.satisfies(tag))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(Error::PruneViolation {
                missing: missing.join(", "),
                registry: self.to_string(),
            });
        }

        let mut association = OrderedAssociation::new();
        for (tag, service) in inner.association.iter() {
            if required.selectors().any(|wanted| tag.is_subtype_of(wanted)) {
                association.insert(tag.clone(), service.clone());
            }
        }
        let scope = if required.requires_scope() {
            inner.scope.clone()
        } else {
            None
        };

        if association.len() == inner.association.len()
            && same_identity(scope.as_ref(), inner.scope.as_ref())
        {
            return Ok(self.clone());
        }

        debug!(
            required = required.len(),
            kept = association.len(),
            dropped = inner.association.len() - association.len(),
            "pruned registry"
        );
        Ok(Self::from_parts(
            Arc::new(association),
            self.fresh_cache(),
            scope,
            inner.config,
        ))
    }

    /// Returns a registry that only keeps what `required` asks for.
    ///
    /// # Panics
    ///
    /// A required capability with no satisfying entry is a defect: the declared requirements
    /// and the registry contents disagree. The error is logged and the call panics.
    #[must_use]
    pub fn prune(&self, required: &Requirements<T>) -> Self {
        match self.try_prune(required) {
            Ok(pruned) => pruned,
            Err(error) => defect!(error),
        }
    }

    fn satisfies(&self, tag: &T) -> bool {
        let inner = &*self.inner;
        tag.is_unit()
            || (tag.is_scope() && inner.scope.is_some())
            || inner
                .association
                .iter()
                .any(|(candidate, _)| candidate.is_subtype_of(tag))
    }

    /// Merges `that` into this registry, with `that` winning on tag collisions.
    ///
    /// Entries of `that` replace entries of `self` with the same exact tag and are appended
    /// otherwise. The scope of `that` wins if present. When `self` and `that` are relaxed-equal,
    /// `that` is returned unchanged.
    ///
    /// If no tag of `that` already existed in `self`, the entries of `that` form the tail of the
    /// merged association and every resolution memoized by `that` still holds, so its cache
    /// seeds the result. Otherwise the result starts with an empty cache.
    #[must_use]
    pub fn union_all(&self, that: &Self) -> Self {
        if self.inner.config.fast_path_equality && self.relaxed_eq(that) {
            debug!("union of relaxed-equal registries, reusing right-hand side");
            return that.clone();
        }

        let mut association = (*self.inner.association).clone();
        let mut collided = false;
        for (tag, service) in that.inner.association.iter() {
            collided |= association.insert(tag.clone(), service.clone());
        }

        let scope = that
            .inner
            .scope
            .clone()
            .or_else(|| self.inner.scope.clone());

        let cache = if collided {
            self.fresh_cache()
        } else {
            Arc::new(LookupCache::seeded_from(
                &that.inner.cache,
                self.inner.config.enable_lookup_cache,
            ))
        };

        Self::from_parts(Arc::new(association), cache, scope, self.inner.config)
    }

    /// Merges `that`, narrowed to `shape`, into this registry.
    ///
    /// Equivalent to `self.union_all(&that.prune(shape))`, with the same relaxed-equality fast
    /// path checked before pruning.
    ///
    /// # Panics
    ///
    /// Panics like [`prune`](Self::prune) when `that` does not satisfy `shape`.
    #[must_use]
    pub fn union(&self, that: &Self, shape: &Requirements<T>) -> Self {
        if self.inner.config.fast_path_equality && self.relaxed_eq(that) {
            debug!("union of relaxed-equal registries, reusing right-hand side");
            return that.clone();
        }

        self.union_all(&that.prune(shape))
    }

    /// Returns the number of services, counting a present scope as one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.association.len() + usize::from(self.inner.scope.is_some())
    }

    /// Returns `true` if the registry holds neither services nor a scope.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current scope, if any.
    #[must_use]
    pub fn scope(&self) -> Option<&Service> {
        self.inner.scope.as_ref()
    }

    /// Iterates the service entries in insertion order. The scope is not included.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&T, &Service)> + ExactSizeIterator {
        self.inner.association.iter()
    }

    /// Returns the ordered association backing this registry.
    ///
    /// The scope slot is not part of it. Registries derived through
    /// [`add_scope`](Self::add_scope) share the association of their source.
    #[must_use]
    pub fn association(&self) -> &OrderedAssociation<T> {
        &self.inner.association
    }

    /// Returns `true` if both registries share the same association storage.
    pub(crate) fn shares_association(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner.association, &other.inner.association)
    }

    /// Returns `true` if both handles point to the same snapshot.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Equality comparing services by reference only.
    ///
    /// Cheaper than `==` and conservative: it may report two equal registries as different,
    /// never the other way around.
    #[must_use]
    pub fn relaxed_eq(&self, other: &Self) -> bool {
        self.compare(other, Service::ptr_eq)
    }

    fn compare<F>(&self, other: &Self, same_service: F) -> bool
    where
        F: Fn(&Service, &Service) -> bool,
    {
        if self.ptr_eq(other) {
            return true;
        }

        let (left, right) = (&*self.inner, &*other.inner);
        if !same_identity(left.scope.as_ref(), right.scope.as_ref())
            || left.association.len() != right.association.len()
            || self.hash_code() != other.hash_code()
        {
            return false;
        }

        if self.shares_association(other) {
            return true;
        }

        left.association
            .iter()
            .rev()
            .zip(right.association.iter().rev())
            .all(|((left_tag, left_service), (right_tag, right_service))| {
                left_tag == right_tag && same_service(left_service, right_service)
            })
    }

    fn hash_code(&self) -> u64 {
        *self.inner.hash.get_or_init(|| {
            let mut hasher = FxHasher::default();
            self.inner.association.len().hash(&mut hasher);
            for (tag, _) in self.inner.association.iter() {
                tag.hash(&mut hasher);
            }
            self.inner.scope.as_ref().map(Service::addr).hash(&mut hasher);
            hasher.finish()
        })
    }

    #[cfg(test)]
    pub(crate) fn cached_lookups(&self) -> usize {
        self.inner.cache.len()
    }

    #[cfg(test)]
    pub(crate) fn shares_cache(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner.cache, &other.inner.cache)
    }
}

impl<T: CapabilityTag> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Registry {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: CapabilityTag> Default for Registry<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: CapabilityTag> PartialEq for Registry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other, Service::eq)
    }
}

impl<T: CapabilityTag> Eq for Registry<T> {}

impl<T: CapabilityTag> Hash for Registry<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl<T: CapabilityTag> FromIterator<(T, Service)> for Registry<T> {
    fn from_iter<I: IntoIterator<Item = (T, Service)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Registry::empty(), |registry, (tag, service)| {
                registry.add(tag, service)
            })
    }
}

impl<T: CapabilityTag> Extend<(T, Service)> for Registry<T> {
    fn extend<I: IntoIterator<Item = (T, Service)>>(&mut self, iter: I) {
        for (tag, service) in iter {
            *self = self.add(tag, service);
        }
    }
}

impl<T: CapabilityTag> fmt::Display for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let limit = self.inner.config.render_limit;

        f.write_str("Registry(")?;
        for (index, (tag, service)) in self.iter().take(limit).enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{tag} -> {service:?}")?;
        }

        let hidden = self.inner.association.len().saturating_sub(limit);
        if hidden > 0 {
            if limit > 0 {
                f.write_str(", ")?;
            }
            write!(f, "... {hidden} more")?;
        }

        if let Some(scope) = &self.inner.scope {
            if !self.inner.association.is_empty() {
                f.write_str(", ")?;
            }
            write!(f, "scope -> {scope:?}")?;
        }
        f.write_str(")")
    }
}

impl<T: CapabilityTag> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Entries<'a, T: CapabilityTag>(&'a OrderedAssociation<T>);

        impl<T: CapabilityTag> fmt::Debug for Entries<'_, T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_map().entries(self.0.iter()).finish()
            }
        }

        f.debug_struct("Registry")
            .field("services", &Entries(&self.inner.association))
            .field("scope", &self.inner.scope)
            .field("cache", &self.inner.cache)
            .finish()
    }
}
