// crates/syncward-core/tests/determinism.rs
// ============================================================================
// Module: Determinism Tests
// Description: Stable diff ordering and serialization.
// Purpose: Ensure equal inputs produce byte-identical diffs regardless of stream order.
// ============================================================================

//! Determinism tests for catalog diffs.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use serde_json::json;
use syncward_core::Catalog;
use syncward_core::CatalogDiff;
use syncward_core::CatalogEntry;
use syncward_core::Stream;
use syncward_core::StreamConfiguration;
use syncward_core::StreamDescriptor;
use syncward_core::compute_diff;
use syncward_core::describe_diff;

fn entry(name: &str, namespace: Option<&str>, fields: &[&str]) -> CatalogEntry {
    let mut properties = serde_json::Map::new();
    for field in fields {
        properties.insert((*field).to_string(), json!({"type": ["null", "string"]}));
    }
    CatalogEntry {
        stream: Stream::new(
            StreamDescriptor::new(name, namespace.map(str::to_string)),
            json!({"type": "object", "properties": properties}),
        ),
        config: StreamConfiguration {
            selected: true,
            ..StreamConfiguration::default()
        },
    }
}

fn catalogs() -> (Vec<CatalogEntry>, Vec<CatalogEntry>) {
    let old = vec![
        entry("users", Some("public"), &["id", "name"]),
        entry("orders", Some("public"), &["id"]),
        entry("events", None, &["id"]),
        entry("audit", Some("archive"), &["id"]),
    ];
    let new = vec![
        entry("users", Some("public"), &["id", "email"]),
        entry("orders", Some("public"), &["id", "total", "currency"]),
        entry("events", None, &["id"]),
        entry("sessions", Some("public"), &["id"]),
    ];
    (old, new)
}

fn diff_of(old: Vec<CatalogEntry>, new: Vec<CatalogEntry>) -> CatalogDiff {
    let old = Catalog::new(old);
    compute_diff(&old, &Catalog::new(new), &old).unwrap()
}

#[test]
fn stream_order_does_not_change_the_diff() {
    let (old, new) = catalogs();
    let forward = diff_of(old.clone(), new.clone());
    let reversed = diff_of(old.into_iter().rev().collect(), new.into_iter().rev().collect());
    assert_eq!(forward, reversed);
    assert_eq!(serde_json::to_vec(&forward).unwrap(), serde_json::to_vec(&reversed).unwrap());
}

#[test]
fn transforms_are_ordered_by_namespace_then_name() {
    let (old, new) = catalogs();
    let diff = diff_of(old, new);
    assert_eq!(
        describe_diff(&diff),
        vec![
            "Removed stream 'archive.audit'",
            "Modified stream 'public.orders': Added fields ['currency', 'total']",
            "Added new stream 'public.sessions'",
            "Modified stream 'public.users': Added fields ['email'], Removed fields ['name']",
        ]
    );
}

#[test]
fn repeated_runs_serialize_identically() {
    let (old, new) = catalogs();
    let first = serde_json::to_string(&diff_of(old.clone(), new.clone())).unwrap();
    for _ in 0 .. 8 {
        let again = serde_json::to_string(&diff_of(old.clone(), new.clone())).unwrap();
        assert_eq!(first, again);
    }
}
