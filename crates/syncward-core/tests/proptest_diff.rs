// crates/syncward-core/tests/proptest_diff.rs
// ============================================================================
// Module: Catalog Diff Property-Based Tests
// Description: Property tests for diff classification and propagation subsets.
// Purpose: Check diff and merge invariants across generated catalogs.
// ============================================================================

//! Property-based tests for catalog diff and propagation invariants.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use proptest::prelude::*;
use serde_json::json;
use syncward_core::Catalog;
use syncward_core::CatalogEntry;
use syncward_core::FieldTransform;
use syncward_core::NonBreakingChangesPreference;
use syncward_core::Stream;
use syncward_core::StreamConfiguration;
use syncward_core::StreamDescriptor;
use syncward_core::StreamTransform;
use syncward_core::compute_diff;
use syncward_core::get_updated_schema;
use syncward_core::should_auto_propagate;

// ============================================================================
// SECTION: Strategies
// ============================================================================

type FieldTypes = BTreeMap<String, &'static str>;

fn field_types() -> impl Strategy<Value = FieldTypes> {
    prop::collection::btree_map(
        "[a-e]",
        prop::sample::select(vec!["string", "integer", "number", "boolean"]),
        0 .. 4,
    )
}

fn catalog_strategy() -> impl Strategy<Value = Catalog> {
    prop::collection::btree_map("[a-d]", (field_types(), any::<bool>()), 0 .. 4).prop_map(
        |streams| {
            Catalog::new(
                streams
                    .into_iter()
                    .map(|(name, (fields, selected))| {
                        let properties: serde_json::Map<String, serde_json::Value> = fields
                            .into_iter()
                            .map(|(field, ty)| (field, json!({"type": ty})))
                            .collect();
                        CatalogEntry {
                            stream: Stream::new(
                                StreamDescriptor::named(name),
                                json!({"type": "object", "properties": properties}),
                            ),
                            config: StreamConfiguration {
                                selected,
                                ..StreamConfiguration::default()
                            },
                        }
                    })
                    .collect(),
            )
        },
    )
}

fn preference_strategy() -> impl Strategy<Value = NonBreakingChangesPreference> {
    prop::sample::select(vec![
        NonBreakingChangesPreference::Ignore,
        NonBreakingChangesPreference::Disable,
        NonBreakingChangesPreference::PropagateColumns,
        NonBreakingChangesPreference::PropagateFully,
    ])
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn descriptors_where(
    transforms: &[StreamTransform],
    keep: fn(&StreamTransform) -> bool,
) -> BTreeSet<StreamDescriptor> {
    transforms.iter().filter(|transform| keep(transform)).map(|t| t.descriptor().clone()).collect()
}

fn is_add(transform: &StreamTransform) -> bool {
    matches!(transform, StreamTransform::AddStream { .. })
}

fn is_remove(transform: &StreamTransform) -> bool {
    matches!(transform, StreamTransform::RemoveStream { .. })
}

fn field_transforms(transform: &StreamTransform) -> Option<&[FieldTransform]> {
    match transform {
        StreamTransform::UpdateStream {
            field_transforms,
            ..
        } => Some(field_transforms),
        _ => None,
    }
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn diff_against_itself_is_empty(catalog in catalog_strategy()) {
        let diff = compute_diff(&catalog, &catalog, &catalog).unwrap();
        prop_assert!(diff.is_empty());
    }

    #[test]
    fn reversed_diff_is_inverted(old in catalog_strategy(), new in catalog_strategy()) {
        let forward = compute_diff(&old, &new, &old).unwrap();
        let backward = compute_diff(&new, &old, &new).unwrap();

        prop_assert_eq!(
            descriptors_where(&forward.transforms, is_add),
            descriptors_where(&backward.transforms, is_remove)
        );
        prop_assert_eq!(
            descriptors_where(&forward.transforms, is_remove),
            descriptors_where(&backward.transforms, is_add)
        );
        prop_assert_eq!(forward.descriptors(), backward.descriptors());

        for transform in &forward.transforms {
            let Some(fields) = field_transforms(transform) else {
                continue;
            };
            let reverse = backward
                .transforms
                .iter()
                .find(|candidate| candidate.descriptor() == transform.descriptor())
                .and_then(field_transforms)
                .unwrap();
            let inverted: Vec<FieldTransform> = fields.iter().map(FieldTransform::inverted).collect();
            prop_assert_eq!(inverted.as_slice(), reverse);
        }
    }

    #[test]
    fn field_additions_never_break_and_removals_always_do(
        old in catalog_strategy(),
        new in catalog_strategy(),
    ) {
        let diff = compute_diff(&old, &new, &old).unwrap();
        for fields in diff.transforms.iter().filter_map(field_transforms) {
            for field in fields {
                if field.is_add() {
                    prop_assert!(!field.breaking);
                }
                if field.is_remove() {
                    prop_assert!(field.breaking);
                }
            }
        }
    }

    #[test]
    fn breaking_diffs_never_auto_propagate(
        old in catalog_strategy(),
        new in catalog_strategy(),
        preference in preference_strategy(),
    ) {
        let diff = compute_diff(&old, &new, &old).unwrap();
        if diff.contains_breaking_change() {
            prop_assert!(!should_auto_propagate(&diff, preference, true));
        }
    }

    #[test]
    fn applied_diff_is_a_subset_of_transforms(
        current in catalog_strategy(),
        new in catalog_strategy(),
        preference in preference_strategy(),
    ) {
        let diff = compute_diff(&current, &new, &current).unwrap();
        let result = get_updated_schema(&current, &new, &diff.transforms, preference, &[]);
        for applied in &result.applied_diff.transforms {
            prop_assert!(diff.transforms.contains(applied));
            prop_assert!(!applied.is_breaking() || is_remove(applied));
        }
        prop_assert_eq!(result.change_description.len(), result.applied_diff.len());
        if preference == NonBreakingChangesPreference::PropagateFully && !diff.contains_breaking_change() {
            prop_assert_eq!(&result.applied_diff, &diff);
        }
    }
}
