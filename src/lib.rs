// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # capenv
//!
//! An immutable, subtype-aware capability registry: the dependency-injection backbone of an
//! effect-execution runtime. Every computation carries one registry as its ambient
//! environment, and composing computations means merging, pruning or incrementally patching
//! registries on hot paths such as fiber resumption and resource acquisition.
//!
//! ## Features
//!
//! - **Structural sharing** - Registries are immutable handles over `imbl` persistent storage;
//!   deriving a new registry copies only what changes
//! - **Subtype-aware lookup** - Requests resolve to the most recently registered service whose
//!   capability is a subtype of the requested one
//! - **Memoized resolution** - Each snapshot carries a concurrent `DashMap` lookup cache
//! - **Snapshot diffing** - [`Patch::diff`] turns two snapshots into an edit script that
//!   [`Patch::apply`] replays without a full merge
//! - **Stack safety** - Patch replay and destruction never recurse
//!
//! ## Quick Start
//!
//! ```rust
//! use capenv::prelude::*;
//!
//! let database = Tag::new("Database");
//! let postgres = Tag::extending("Postgres", &[&database]);
//!
//! let registry: Registry = Registry::empty()
//!     .add(Tag::new("Clock"), Service::new("system clock"))
//!     .add(postgres, Service::new("postgres://localhost"));
//!
//! // Subtype-aware: a Postgres service satisfies a Database request
//! assert_eq!(registry.get(&database), Service::new("postgres://localhost"));
//! ```
//!
//! ## Patching
//!
//! ```rust
//! use capenv::prelude::*;
//!
//! let before: Registry = Registry::empty().add(Tag::new("Clock"), Service::new(0_u64));
//! let after = before.add(Tag::new("Random"), Service::new(42_u64));
//!
//! // Capture the delta once, replay it onto any registry of the same shape
//! let patch = Patch::diff(&before, &after);
//! let other = Registry::empty().add(Tag::new("Clock"), Service::new(7_u64));
//! let patched = patch.apply(&other);
//!
//! assert_eq!(patched.get(&Tag::new("Random")), Service::new(42_u64));
//! assert_eq!(patched.get(&Tag::new("Clock")), Service::new(7_u64));
//! ```
//!
//! ## Architecture
//!
//! - [`tag`] - The [`CapabilityTag`] contract and the bundled [`Tag`] implementation
//! - [`service`] - Type-erased, shared [`Service`] values
//! - [`registry`] - The [`Registry`] snapshot and [`Requirements`] sets
//! - [`patch`] - The [`Patch`] algebra, diffing and replay
//! - [`Error`] and [`Result`] - Defect reporting
//!
//! ## Error Handling
//!
//! Lookups and prunes that cannot be satisfied are defects, not recoverable errors. The
//! panicking entry points log them through `tracing` and abort; the `try_*` variants return
//! them:
//!
//! ```rust
//! use capenv::{Error, Registry, Tag};
//!
//! let registry: Registry = Registry::empty();
//! match registry.try_get(&Tag::new("Clock")) {
//!     Ok(_) => unreachable!(),
//!     Err(Error::MissingCapability { tag, .. }) => println!("missing {}", tag),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber: defects at `error`,
//! prune and union fast paths at `debug`, diff and replay summaries at `trace`.
#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared fixtures for unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use capenv::prelude::*;
///
/// let registry: Registry = Registry::empty().add(Tag::new("A"), Service::new(1));
/// assert_eq!(registry.len(), 1);
/// ```
pub mod prelude;

/// Registry configuration
///
/// See [`RegistryConfig`] for the available options and presets.
pub mod config;

/// Patch algebra over registry snapshots
///
/// This module provides [`Patch`], its diff engine and its stack-safe replay.
///
/// # Key Types
///
/// - [`patch::Patch`] - The closed set of edit operations
/// - [`patch::PatchOp`] - A leaf operation, as yielded by [`Patch::ops`]
/// - [`patch::Ops`] - The worklist iterator behind replay
pub mod patch;

/// The immutable capability registry
///
/// # Key Types
///
/// - [`registry::Registry`] - Immutable snapshot with lookup cache and scope slot
/// - [`registry::OrderedAssociation`] - Insertion-ordered persistent entry storage
/// - [`registry::Requirements`] - Declared requirement sets
pub mod registry;

/// Type-erased service values
pub mod service;

/// Capability identifiers and their subtype order
pub mod tag;

/// `capenv` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `capenv` Error type
///
/// Reports registry defects. See [`Error`] for the variants.
pub use error::Error;

/// Configuration attached to every registry.
pub use config::RegistryConfig;

/// Edit scripts between registry snapshots.
///
/// # Example
///
/// ```rust
/// use capenv::{Patch, Registry, Service, Tag};
///
/// let old: Registry = Registry::empty();
/// let new = old.add(Tag::new("A"), Service::new(1));
/// assert!(Patch::diff(&old, &new).apply(&old).relaxed_eq(&new));
/// ```
pub use patch::Patch;

/// The registry snapshot and its requirement sets.
pub use registry::{Registry, Requirements};

/// Type-erased service values.
pub use service::Service;

/// Capability identifiers.
pub use tag::{CapabilityTag, Tag};
