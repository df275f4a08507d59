//! Shared fixtures for unit tests
//!
//! Provides a small capability hierarchy and scope handles so every module tests subtyping and
//! scope identity against the same shapes.

use crate::{service::Service, tag::Tag};

/// A capability hierarchy used across tests:
///
/// ```text
/// Logging
/// ├── ConsoleLogging
/// └── JsonLogging
/// Database
/// └── Postgres
/// Clock
/// ```
pub struct Hierarchy {
    pub logging: Tag,
    pub console_logging: Tag,
    pub json_logging: Tag,
    pub database: Tag,
    pub postgres: Tag,
    pub clock: Tag,
}

pub fn hierarchy() -> Hierarchy {
    let logging = Tag::new("Logging");
    let database = Tag::new("Database");

    Hierarchy {
        console_logging: Tag::extending("ConsoleLogging", &[&logging]),
        json_logging: Tag::extending("JsonLogging", &[&logging]),
        postgres: Tag::extending("Postgres", &[&database]),
        clock: Tag::new("Clock"),
        logging,
        database,
    }
}

/// Opaque scope value; registries compare scopes by reference only.
#[derive(Debug, PartialEq)]
pub struct ScopeHandle(pub &'static str);

// Helper function to create a fresh scope service
pub fn scope_handle(name: &'static str) -> Service {
    Service::new(ScopeHandle(name))
}
