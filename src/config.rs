//! Registry configuration
//!
//! This module provides the knobs that control how a [`Registry`](crate::Registry) trades
//! memory for speed on its hot paths. A configuration is attached to every registry and is
//! inherited by every registry derived from it through `add`, `union`, `prune` or patch replay.

/// Configuration carried by every [`Registry`](crate::Registry)
///
/// None of the options change which service a lookup resolves to; they only decide how much
/// work is memoized or short-circuited along the way, and how much of a registry is rendered
/// into diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Memoize lookup results per registry snapshot (recommended: always true)
    /// When disabled, every lookup rescans the association in reverse insertion order
    pub enable_lookup_cache: bool,

    /// Short-circuit `union`, `union_all` and patch replay on relaxed (reference) equality
    /// Avoids rebuilding a registry when a merge or patch turns out to be a no-op
    pub fast_path_equality: bool,

    /// Maximum number of entries rendered by `Display` and in defect messages (default: 64)
    pub render_limit: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enable_lookup_cache: true,
            fast_path_equality: true,
            render_limit: 64,
        }
    }
}

impl RegistryConfig {
    /// Creates a configuration without lookup memoization
    ///
    /// Useful for registries that are resolved once and thrown away, where populating the
    /// cache costs more than it saves.
    #[must_use]
    pub fn uncached() -> Self {
        Self {
            enable_lookup_cache: false,
            ..Self::default()
        }
    }

    /// Creates a configuration that disables every optimization layer
    ///
    /// Every lookup scans, every merge and replay builds a new registry. Meant for tests and
    /// for isolating optimization bugs; behaviour is otherwise identical.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            enable_lookup_cache: false,
            fast_path_equality: false,
            render_limit: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_config_presets() {
        let default = RegistryConfig::default();
        assert!(default.enable_lookup_cache);
        assert!(default.fast_path_equality);
        assert_eq!(default.render_limit, 64);

        let uncached = RegistryConfig::uncached();
        assert!(!uncached.enable_lookup_cache);
        assert!(uncached.fast_path_equality);

        let minimal = RegistryConfig::minimal();
        assert!(!minimal.enable_lookup_cache);
        assert!(!minimal.fast_path_equality);
        assert_eq!(minimal.render_limit, default.render_limit);
    }
}
