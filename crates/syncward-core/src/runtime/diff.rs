// crates/syncward-core/src/runtime/diff.rs
// ============================================================================
// Module: Syncward Catalog Diff Engine
// Description: Computes schema and configuration differences between catalogs.
// Purpose: Classify every stream and field change as breaking or non-breaking.
// Dependencies: crate::core, tracing
// ============================================================================

//! ## Overview
//! [`compute_diff`] compares two discovered catalogs. The configured catalog
//! decides relevance: removing a stream breaks a sync only when the stream
//! was selected, and stream attribute changes are judged against the
//! connection's selected configuration. Field removals are always breaking.
//!
//! [`configuration_diff`] compares the sync settings of two configured
//! catalogs, independent of schema changes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tracing::debug;

use crate::core::Catalog;
use crate::core::CatalogDiff;
use crate::core::CatalogError;
use crate::core::FieldPath;
use crate::core::FieldShape;
use crate::core::FieldTransform;
use crate::core::Stream;
use crate::core::StreamAttributeChange;
use crate::core::StreamAttributeTransform;
use crate::core::StreamConfiguration;
use crate::core::StreamDescriptor;
use crate::core::StreamTransform;
use crate::core::SyncMode;
use crate::core::primary_key_set;

// ============================================================================
// SECTION: Schema Diff
// ============================================================================

/// Computes the transforms that turn `old` into `new`.
///
/// # Errors
///
/// Returns [`CatalogError`] when any catalog repeats a stream descriptor.
pub fn compute_diff(
    old: &Catalog,
    new: &Catalog,
    configured: &Catalog,
) -> Result<CatalogDiff, CatalogError> {
    let old_index = old.index()?;
    let new_index = new.index()?;
    let configured_index = configured.index()?;
    let selected_config = |descriptor: &StreamDescriptor| {
        configured_index
            .get(descriptor)
            .map(|entry| &entry.config)
            .filter(|config| config.selected)
    };

    let mut transforms = Vec::new();
    for (descriptor, new_entry) in &new_index {
        match old_index.get(descriptor) {
            None => transforms.push(StreamTransform::AddStream {
                stream_descriptor: (*descriptor).clone(),
            }),
            Some(old_entry) => {
                if let Some(update) =
                    diff_stream(&old_entry.stream, &new_entry.stream, selected_config(*descriptor))
                {
                    transforms.push(update);
                }
            }
        }
    }
    for descriptor in old_index.keys() {
        if !new_index.contains_key(descriptor) {
            transforms.push(StreamTransform::RemoveStream {
                stream_descriptor: (*descriptor).clone(),
                breaking: selected_config(*descriptor).is_some(),
            });
        }
    }

    let diff = CatalogDiff::new(transforms);
    debug!(
        transforms = diff.len(),
        breaking = diff.contains_breaking_change(),
        "computed catalog diff"
    );
    Ok(diff)
}

/// Builds the update transform for a stream present in both catalogs.
fn diff_stream(
    old: &Stream,
    new: &Stream,
    configured: Option<&StreamConfiguration>,
) -> Option<StreamTransform> {
    let field_transforms = diff_fields(&old.fields(), &new.fields());
    let attribute_transforms = diff_attributes(old, new, configured);
    if field_transforms.is_empty() && attribute_transforms.is_empty() {
        return None;
    }
    Some(StreamTransform::UpdateStream {
        stream_descriptor: new.descriptor.clone(),
        field_transforms,
        attribute_transforms,
    })
}

/// Compares flattened field maps.
fn diff_fields(
    old: &BTreeMap<FieldPath, FieldShape>,
    new: &BTreeMap<FieldPath, FieldShape>,
) -> Vec<FieldTransform> {
    let mut transforms = Vec::new();
    for (path, new_shape) in new {
        match old.get(path) {
            None => transforms.push(FieldTransform::add(path.clone(), new_shape.clone())),
            Some(old_shape) if old_shape != new_shape => transforms.push(FieldTransform::update(
                path.clone(),
                old_shape.clone(),
                new_shape.clone(),
            )),
            Some(_) => {}
        }
    }
    for (path, old_shape) in old {
        if !new.contains_key(path) {
            transforms.push(FieldTransform::remove(path.clone(), old_shape.clone()));
        }
    }
    transforms.sort_by(|left, right| left.field_name.cmp(&right.field_name));
    transforms
}

/// Compares stream-level attributes declared by the source.
fn diff_attributes(
    old: &Stream,
    new: &Stream,
    configured: Option<&StreamConfiguration>,
) -> Vec<StreamAttributeTransform> {
    let mut transforms = Vec::new();

    if old.source_defined_primary_key != new.source_defined_primary_key {
        let breaking = configured.is_some_and(|config| {
            config.destination_sync_mode.is_dedup()
                && !new.source_defined_primary_key.is_empty()
                && primary_key_set(&config.primary_key)
                    != primary_key_set(&new.source_defined_primary_key)
        });
        transforms.push(StreamAttributeTransform {
            change: StreamAttributeChange::UpdatePrimaryKey {
                old: old.source_defined_primary_key.clone(),
                new: new.source_defined_primary_key.clone(),
            },
            breaking,
        });
    }

    let old_modes: BTreeSet<SyncMode> = old.supported_sync_modes.iter().copied().collect();
    let new_modes: BTreeSet<SyncMode> = new.supported_sync_modes.iter().copied().collect();
    if old_modes != new_modes {
        let breaking = configured.is_some_and(|config| !new_modes.contains(&config.sync_mode));
        transforms.push(StreamAttributeTransform {
            change: StreamAttributeChange::UpdateSupportedSyncModes {
                old: old_modes,
                new: new_modes,
            },
            breaking,
        });
    }

    if old.default_cursor_field != new.default_cursor_field {
        let breaking = configured.is_some_and(|config| {
            config.sync_mode == SyncMode::Incremental
                && new.source_defined_cursor
                && config.cursor_field == old.default_cursor_field
        });
        transforms.push(StreamAttributeTransform {
            change: StreamAttributeChange::UpdateDefaultCursorField {
                old: old.default_cursor_field.clone(),
                new: new.default_cursor_field.clone(),
            },
            breaking,
        });
    }

    transforms
}

// ============================================================================
// SECTION: Configuration Diff
// ============================================================================

/// Returns the selected streams whose sync settings changed between catalogs.
///
/// Cursor fields compare as ordered lists; primary keys compare as sets.
/// Streams missing from either catalog are ignored.
///
/// # Errors
///
/// Returns [`CatalogError`] when either catalog repeats a stream descriptor.
pub fn configuration_diff(
    old: &Catalog,
    new: &Catalog,
) -> Result<BTreeSet<StreamDescriptor>, CatalogError> {
    let old_index = old.index()?;
    let new_index = new.index()?;
    let changed = new_index
        .iter()
        .filter(|(_, new_entry)| new_entry.config.selected)
        .filter_map(|(descriptor, new_entry)| {
            let old_entry = old_index.get(descriptor)?;
            config_changed(&old_entry.config, &new_entry.config).then(|| (*descriptor).clone())
        })
        .collect();
    Ok(changed)
}

/// Returns true when sync semantics differ between two configurations.
fn config_changed(old: &StreamConfiguration, new: &StreamConfiguration) -> bool {
    old.cursor_field != new.cursor_field
        || old.sync_mode != new.sync_mode
        || old.destination_sync_mode != new.destination_sync_mode
        || primary_key_set(&old.primary_key) != primary_key_set(&new.primary_key)
}
