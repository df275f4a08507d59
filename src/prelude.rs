//! # capenv Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits of
//! the capenv library. Import it to build, query, merge and patch registries.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The error type reporting registry defects
pub use crate::Error;

/// The result type used throughout capenv
pub use crate::Result;

/// Configuration attached to every registry
pub use crate::RegistryConfig;

// ================================================================================================
// Registry
// ================================================================================================

/// The immutable capability registry and its declared requirement sets
pub use crate::registry::{Registry, Requirements};

/// Type-erased service values
pub use crate::service::Service;

/// Capability identifiers and their subtype order
pub use crate::tag::{CapabilityTag, Tag};

// ================================================================================================
// Patches
// ================================================================================================

/// Edit scripts between registry snapshots
pub use crate::patch::{Patch, PatchOp};
