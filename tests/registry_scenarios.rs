//! Integration tests for registry construction, lookup, pruning and merging.
//!
//! These tests exercise the public API end to end with a small capability hierarchy, the way
//! an effect runtime builds and narrows its environments.

use capenv::{prelude::*, Result};

#[derive(Debug, PartialEq)]
struct ScopeHandle(&'static str);

struct Capabilities {
    logging: Tag,
    console_logging: Tag,
    database: Tag,
    postgres: Tag,
}

fn capabilities() -> Capabilities {
    let logging = Tag::new("Logging");
    let database = Tag::new("Database");
    Capabilities {
        console_logging: Tag::extending("ConsoleLogging", &[&logging]),
        postgres: Tag::extending("Postgres", &[&database]),
        logging,
        database,
    }
}

/// Build, scope, then prune: the lifecycle of an environment handed to a narrower consumer.
#[test]
fn test_build_scope_and_prune() -> Result<()> {
    let a = Tag::new("A");
    let b = Tag::new("B");
    let s1 = Service::new(ScopeHandle("S1"));

    let registry: Registry = Registry::empty()
        .add(a.clone(), Service::new(1))
        .add(b.clone(), Service::new(2))
        .add_scope(s1.clone());

    assert_eq!(registry.len(), 3);
    assert_eq!(registry.try_get(&a)?, Service::new(1));
    assert_eq!(registry.try_get(&b)?, Service::new(2));
    assert!(registry.try_get(&Tag::scope())?.ptr_eq(&s1));

    let pruned = registry.try_prune(&Requirements::new().with(a.clone()))?;
    assert_eq!(pruned.len(), 1);
    assert_eq!(pruned.try_get(&a)?, Service::new(1));
    assert!(matches!(
        pruned.try_get(&b),
        Err(Error::MissingCapability { .. })
    ));

    Ok(())
}

#[test]
#[should_panic(expected = "Missing capability - no service satisfies `B`")]
fn test_get_after_prune_is_defect() {
    let registry: Registry = Registry::empty()
        .add(Tag::new("A"), Service::new(1))
        .add(Tag::new("B"), Service::new(2));

    let pruned = registry.prune(&Requirements::new().with(Tag::new("A")));
    let _ = pruned.get(&Tag::new("B"));
}

#[test]
fn test_add_get_and_overwrite() {
    let tag = Tag::new("Config");
    let base: Registry = Registry::empty().add(Tag::new("Other"), Service::new("other"));

    let once = base.add(tag.clone(), Service::new("v1"));
    assert_eq!(once.get(&tag), Service::new("v1"));

    let twice = once.add(tag.clone(), Service::new("v2"));
    assert_eq!(twice.get(&tag), Service::new("v2"));
    assert_eq!(twice.len(), once.len());
}

/// A later, more specific registration shadows an earlier general one.
#[test]
fn test_subtype_shadowing() {
    let caps = capabilities();
    let registry: Registry = Registry::empty()
        .add(caps.logging.clone(), Service::new("stderr"))
        .add(caps.database.clone(), Service::new("sqlite"))
        .add(caps.console_logging.clone(), Service::new("console"));

    assert_eq!(registry.get(&caps.logging), Service::new("console"));
    assert_eq!(registry.get(&caps.database), Service::new("sqlite"));

    let upgraded = registry.add(caps.postgres.clone(), Service::new("postgres"));
    assert_eq!(upgraded.get(&caps.database), Service::new("postgres"));
    assert_eq!(registry.get(&caps.database), Service::new("sqlite"));
}

#[test]
fn test_union_right_bias() {
    let caps = capabilities();
    let left: Registry = Registry::empty()
        .add(caps.logging.clone(), Service::new("left logging"))
        .add(caps.database.clone(), Service::new("left database"));
    let right: Registry = Registry::empty()
        .add(caps.database.clone(), Service::new("right database"))
        .add(caps.postgres.clone(), Service::new("right postgres"));

    let merged = left.union_all(&right);
    assert_eq!(merged.get(&caps.logging), Service::new("left logging"));
    assert_eq!(merged.get(&caps.postgres), Service::new("right postgres"));

    let narrowed = left.union(&right, &Requirements::new().with(caps.database.clone()));
    assert_eq!(narrowed.len(), 3);
    assert_eq!(narrowed.get(&caps.postgres), Service::new("right postgres"));
}

#[test]
fn test_prune_idempotent() -> Result<()> {
    let caps = capabilities();
    let registry: Registry = Registry::empty()
        .add(caps.console_logging.clone(), Service::new("console"))
        .add(caps.postgres.clone(), Service::new("postgres"))
        .add(Tag::new("Clock"), Service::new("clock"))
        .add_scope(Service::new(ScopeHandle("S")));

    let shape = Requirements::new()
        .with(caps.logging.clone())
        .with(caps.database.clone());

    let once = registry.try_prune(&shape)?;
    let twice = once.try_prune(&shape)?;
    assert_eq!(once, twice);
    assert_eq!(once.len(), 2);
    assert!(once.scope().is_none());

    Ok(())
}

#[test]
fn test_prune_violation_reports_context() {
    let registry: Registry = Registry::empty().add(Tag::new("A"), Service::new(1));

    let error = registry
        .try_prune(&Requirements::new().with(Tag::new("Missing")))
        .unwrap_err();
    let message = error.to_string();
    assert!(message.contains("Missing"));
    assert!(message.contains("A -> 1"));
}

#[test]
fn test_custom_config_is_inherited() {
    let config = RegistryConfig::minimal();
    let registry: Registry = Registry::with_config(config).add(Tag::new("A"), Service::new(1));

    let derived = registry
        .add(Tag::new("B"), Service::new(2))
        .union_all(&Registry::empty())
        .prune(&Requirements::new().with(Tag::new("A")));
    assert_eq!(derived.config(), config);
}
