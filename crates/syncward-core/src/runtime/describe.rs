// crates/syncward-core/src/runtime/describe.rs
// ============================================================================
// Module: Syncward Change Descriptions
// Description: Human-readable summaries of catalog diffs.
// Purpose: Render stable one-line descriptions for notifications and CLI output.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Each stream transform renders as one line. Field groups appear in the
//! order added, removed, altered, and empty groups are omitted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::CatalogDiff;
use crate::core::FieldTransform;
use crate::core::StreamAttributeTransform;
use crate::core::StreamTransform;

// ============================================================================
// SECTION: Descriptions
// ============================================================================

/// Returns one description line per transform, in diff order.
#[must_use]
pub fn describe_diff(diff: &CatalogDiff) -> Vec<String> {
    diff.transforms.iter().map(describe_transform).collect()
}

/// Returns the description of a single stream transform.
#[must_use]
pub fn describe_transform(transform: &StreamTransform) -> String {
    match transform {
        StreamTransform::AddStream {
            stream_descriptor,
        } => format!("Added new stream '{stream_descriptor}'"),
        StreamTransform::RemoveStream {
            stream_descriptor,
            ..
        } => format!("Removed stream '{stream_descriptor}'"),
        StreamTransform::UpdateStream {
            stream_descriptor,
            field_transforms,
            attribute_transforms,
        } => {
            let groups = field_groups(field_transforms, attribute_transforms);
            format!("Modified stream '{stream_descriptor}': {}", groups.join(", "))
        }
    }
}

/// Renders the non-empty change groups of an update.
fn field_groups(
    field_transforms: &[FieldTransform],
    attribute_transforms: &[StreamAttributeTransform],
) -> Vec<String> {
    let added = quoted_paths(field_transforms, FieldTransform::is_add);
    let removed = quoted_paths(field_transforms, FieldTransform::is_remove);
    let altered = quoted_paths(field_transforms, FieldTransform::is_update);
    let mut groups = Vec::new();
    if !added.is_empty() {
        groups.push(format!("Added fields [{}]", added.join(", ")));
    }
    if !removed.is_empty() {
        groups.push(format!("Removed fields [{}]", removed.join(", ")));
    }
    if !altered.is_empty() {
        groups.push(format!("Altered fields [{}]", altered.join(", ")));
    }
    if !attribute_transforms.is_empty() {
        let labels: Vec<&str> =
            attribute_transforms.iter().map(|transform| transform.change.label()).collect();
        groups.push(format!("Altered stream attributes [{}]", labels.join(", ")));
    }
    groups
}

/// Quotes the paths of transforms matching `keep`.
fn quoted_paths(transforms: &[FieldTransform], keep: fn(&FieldTransform) -> bool) -> Vec<String> {
    transforms
        .iter()
        .filter(|transform| keep(transform))
        .map(|transform| format!("'{}'", transform.field_name))
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
