// crates/syncward-core/src/runtime/propagation.rs
// ============================================================================
// Module: Syncward Propagation Policy
// Description: Decides how detected schema changes reach a connection's sync catalog.
// Purpose: Merge non-breaking changes per user preference and report what was applied.
// Dependencies: crate::core, crate::runtime::describe, serde, tracing
// ============================================================================

//! ## Overview
//! The propagation policy is a pure transformation. Given a diff and the
//! connection's [`NonBreakingChangesPreference`], it decides whether changes
//! are applied automatically, the connection is disabled, or the user is only
//! notified. [`get_updated_schema`] produces the merged catalog plus the
//! applied subset of the diff so callers can announce every detected change
//! while only some were incorporated.
//!
//! Breaking transforms are never applied. Unsupported destination sync modes
//! are resolved by fallback substitution rather than failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::core::Catalog;
use crate::core::CatalogDiff;
use crate::core::CatalogEntry;
use crate::core::DestinationSyncMode;
use crate::core::FieldTransform;
use crate::core::NonBreakingChangesPreference;
use crate::core::StatusReason;
use crate::core::Stream;
use crate::core::StreamAttributeChange;
use crate::core::StreamAttributeTransform;
use crate::core::StreamConfiguration;
use crate::core::StreamTransform;
use crate::core::SyncMode;
use crate::runtime::describe::describe_diff;

// ============================================================================
// SECTION: Decisions
// ============================================================================

/// Returns true when the diff should be applied without user action.
///
/// Requires a non-empty, non-breaking diff, the workspace flag, and a
/// propagating preference.
#[must_use]
pub fn should_auto_propagate(
    diff: &CatalogDiff,
    preference: NonBreakingChangesPreference,
    workspace_auto_propagate_enabled: bool,
) -> bool {
    !diff.is_empty()
        && !diff.contains_breaking_change()
        && workspace_auto_propagate_enabled
        && preference.propagates_columns()
}

/// Outcome of evaluating a detected schema change for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum SchemaChangeDecision {
    /// Nothing changed.
    NoChanges,
    /// Merge the change into the sync catalog.
    Propagate,
    /// Leave the connection untouched and notify.
    NotifyOnly,
    /// Deactivate the connection.
    Disable {
        /// Recorded status reason.
        reason: StatusReason,
    },
}

/// Decides how a connection reacts to `diff`.
#[must_use]
pub fn decide_schema_change(
    diff: &CatalogDiff,
    preference: NonBreakingChangesPreference,
    workspace_auto_propagate_enabled: bool,
) -> SchemaChangeDecision {
    if diff.is_empty() {
        SchemaChangeDecision::NoChanges
    } else if diff.contains_breaking_change() {
        SchemaChangeDecision::Disable {
            reason: StatusReason::SchemaChangesAreBreaking,
        }
    } else if preference == NonBreakingChangesPreference::Disable {
        SchemaChangeDecision::Disable {
            reason: StatusReason::DisableConnectionIfAnySchemaChanges,
        }
    } else if should_auto_propagate(diff, preference, workspace_auto_propagate_enabled) {
        SchemaChangeDecision::Propagate
    } else {
        SchemaChangeDecision::NotifyOnly
    }
}

// ============================================================================
// SECTION: Catalog Merge
// ============================================================================

/// Merged catalog and the transforms that were incorporated into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSchemaResult {
    /// Merged sync catalog.
    pub catalog: Catalog,
    /// Subset of the input transforms applied to the catalog.
    pub applied_diff: CatalogDiff,
    /// Descriptions of the applied transforms.
    pub change_description: Vec<String>,
}

/// Applies `transforms` to `current` using stream definitions from `new`.
///
/// - Added streams join the catalog only under `propagate_fully`.
/// - Removed streams are dropped regardless of preference, breaking or not.
/// - Updated streams take the new definition under `propagate_columns` or
///   `propagate_fully`, keeping the existing configuration.
///
/// Breaking updates and transforms whose stream is missing from the
/// relevant catalog are skipped and excluded from the applied diff.
#[must_use]
pub fn get_updated_schema(
    current: &Catalog,
    new: &Catalog,
    transforms: &[StreamTransform],
    preference: NonBreakingChangesPreference,
    supported_destination_sync_modes: &[DestinationSyncMode],
) -> UpdateSchemaResult {
    let mut merged = current.streams.clone();
    let mut applied = Vec::new();

    for transform in transforms {
        let descriptor = transform.descriptor();
        let is_removal = matches!(transform, StreamTransform::RemoveStream { .. });
        if transform.is_breaking() && !is_removal {
            debug!(stream = %descriptor, "skipping breaking transform");
            continue;
        }
        let incorporated = match transform {
            StreamTransform::AddStream { .. } => {
                let existing = merged.iter().any(|entry| entry.descriptor() == descriptor);
                match new.find(descriptor) {
                    Some(entry) if preference.propagates_streams() && !existing => {
                        let config = ensure_compatible_destination_sync_mode(
                            &entry.stream,
                            default_configuration_for_new_stream(&entry.stream),
                            supported_destination_sync_modes,
                        );
                        merged.push(CatalogEntry {
                            stream: entry.stream.clone(),
                            config,
                        });
                        true
                    }
                    _ => false,
                }
            }
            StreamTransform::RemoveStream { .. } => {
                let before = merged.len();
                merged.retain(|entry| entry.descriptor() != descriptor);
                merged.len() != before
            }
            StreamTransform::UpdateStream {
                field_transforms,
                attribute_transforms,
                ..
            } => {
                let position = merged.iter().position(|entry| entry.descriptor() == descriptor);
                match (position, new.find(descriptor)) {
                    (Some(index), Some(entry)) if preference.propagates_columns() => {
                        let config = updated_configuration(
                            &merged[index].config,
                            &entry.stream,
                            field_transforms,
                            attribute_transforms,
                        );
                        merged[index] = CatalogEntry {
                            stream: entry.stream.clone(),
                            config: ensure_compatible_destination_sync_mode(
                                &entry.stream,
                                config,
                                supported_destination_sync_modes,
                            ),
                        };
                        true
                    }
                    _ => false,
                }
            }
        };
        if incorporated {
            applied.push(transform.clone());
        }
    }

    let applied_diff = CatalogDiff::new(applied);
    let change_description = describe_diff(&applied_diff);
    UpdateSchemaResult {
        catalog: Catalog::new(merged),
        applied_diff,
        change_description,
    }
}

/// Returns the configuration of an existing stream after an update.
fn updated_configuration(
    current: &StreamConfiguration,
    stream: &Stream,
    field_transforms: &[FieldTransform],
    attribute_transforms: &[StreamAttributeTransform],
) -> StreamConfiguration {
    let mut config = current.clone();
    if config.field_selection_enabled {
        for transform in field_transforms {
            if transform.is_add()
                && transform.field_name.is_top_level()
                && !config.selected_fields.contains(&transform.field_name)
            {
                config.selected_fields.push(transform.field_name.clone());
            }
        }
    }
    for transform in attribute_transforms {
        match &transform.change {
            StreamAttributeChange::UpdatePrimaryKey {
                new,
                ..
            } if !new.is_empty() => config.primary_key.clone_from(new),
            StreamAttributeChange::UpdateDefaultCursorField {
                new,
                ..
            } if stream.source_defined_cursor => config.cursor_field.clone_from(new),
            _ => {}
        }
    }
    config
}

// ============================================================================
// SECTION: Sync Mode Defaults
// ============================================================================

/// Returns the configuration given to a newly added stream.
#[must_use]
pub fn default_configuration_for_new_stream(stream: &Stream) -> StreamConfiguration {
    let has_primary_key = !stream.source_defined_primary_key.is_empty();
    let (sync_mode, destination_sync_mode) = if stream.source_defined_cursor && has_primary_key {
        (SyncMode::Incremental, DestinationSyncMode::AppendDedup)
    } else if stream.supports(SyncMode::FullRefresh) || stream.supported_sync_modes.is_empty() {
        (SyncMode::FullRefresh, DestinationSyncMode::Overwrite)
    } else {
        (SyncMode::Incremental, DestinationSyncMode::Append)
    };
    StreamConfiguration {
        sync_mode,
        destination_sync_mode,
        cursor_field: stream.default_cursor_field.clone(),
        primary_key: stream.source_defined_primary_key.clone(),
        selected: true,
        field_selection_enabled: false,
        selected_fields: Vec::new(),
    }
}

/// Returns `config` adjusted to a destination sync mode the destination supports.
///
/// Falls back to full refresh with overwrite when both sides allow it, else to
/// the first mode each side supports. An empty supported list leaves the
/// configuration untouched.
#[must_use]
pub fn ensure_compatible_destination_sync_mode(
    stream: &Stream,
    config: StreamConfiguration,
    supported: &[DestinationSyncMode],
) -> StreamConfiguration {
    let Some(first_supported) = supported.first().copied() else {
        return config;
    };
    if supported.contains(&config.destination_sync_mode) {
        return config;
    }
    let (sync_mode, destination_sync_mode) = if stream.supports(SyncMode::FullRefresh)
        && supported.contains(&DestinationSyncMode::Overwrite)
    {
        (SyncMode::FullRefresh, DestinationSyncMode::Overwrite)
    } else {
        let sync_mode = stream.supported_sync_modes.first().copied().unwrap_or(config.sync_mode);
        warn!(
            stream = %stream.descriptor,
            sync_mode = sync_mode.as_str(),
            destination_sync_mode = first_supported.as_str(),
            "no preferred sync mode pair is supported; using first supported modes"
        );
        (sync_mode, first_supported)
    };
    StreamConfiguration {
        sync_mode,
        destination_sync_mode,
        ..config
    }
}
