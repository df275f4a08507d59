use thiserror::Error;

macro_rules! missing_capability {
    ($tag:expr, $registry:expr) => {
        crate::Error::MissingCapability {
            tag: $tag.to_string(),
            registry: $registry.to_string(),
        }
    };
}

/// The generic Error type, which covers every failure this library can report.
///
/// Both variants describe **defects**: violations of an invariant that static requirement
/// tracking in the caller is supposed to guarantee. They are never retriable. The panicking
/// entry points ([`Registry::get`](crate::Registry::get), [`Registry::prune`](crate::Registry::prune))
/// log the error and abort with its message; the `try_*` variants return it so callers can
/// attach their own context before failing.
///
/// Every variant carries a rendering of the registry involved, truncated according to
/// [`RegistryConfig::render_limit`](crate::RegistryConfig::render_limit).
///
/// # Examples
///
/// ```rust
/// use capenv::{Error, Registry, Tag};
///
/// let registry: Registry = Registry::empty();
/// match registry.try_get(&Tag::new("Database")) {
///     Ok(_) => unreachable!(),
///     Err(Error::MissingCapability { tag, .. }) => assert_eq!(tag, "Database"),
///     Err(e) => panic!("unexpected: {e}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No service in the registry satisfies the requested capability.
    ///
    /// # Fields
    ///
    /// * `tag` - The requested capability
    /// * `registry` - Rendering of the registry that was searched
    #[error("Missing capability - no service satisfies `{tag}` in {registry}")]
    MissingCapability {
        /// The requested capability
        tag: String,
        /// Rendering of the registry that was searched
        registry: String,
    },

    /// A prune was asked to retain capabilities the registry does not provide.
    ///
    /// Indicates a mismatch between a declared requirement set and the actual registry
    /// contents.
    ///
    /// # Fields
    ///
    /// * `missing` - The unsatisfied capabilities, comma separated, in tag order
    /// * `registry` - Rendering of the registry that was pruned
    #[error("Prune invariant violated - required [{missing}] not present in {registry}")]
    PruneViolation {
        /// The unsatisfied capabilities, comma separated, in tag order
        missing: String,
        /// Rendering of the registry that was pruned
        registry: String,
    },
}
