#![no_main]

use capenv::prelude::*;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, PartialEq)]
struct ScopeHandle(u8);

/// Interprets each byte as a step: the low bit picks `add` or `add_scope`, the rest the tag
/// or scope identity.
fn replay(registry: &Registry, script: &[u8]) -> Registry {
    script.iter().fold(registry.clone(), |registry, byte| {
        if byte & 1 == 0 {
            registry.add(Tag::new(&format!("T{}", (byte >> 1) % 16)), Service::new(*byte))
        } else {
            registry.add_scope(Service::new(ScopeHandle(byte >> 1)))
        }
    })
}

fuzz_target!(|data: &[u8]| {
    let Some((&split, script)) = data.split_first() else {
        return;
    };
    let (base, extension) = script.split_at(usize::from(split).min(script.len()));

    let old = replay(&Registry::empty(), base);
    let new = replay(&old, extension);

    let patched = Patch::diff(&old, &new).apply(&old);
    assert!(patched.relaxed_eq(&new), "{patched} != {new}");
});
