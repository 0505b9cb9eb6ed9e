// crates/syncward-core/src/core/diff.rs
// ============================================================================
// Module: Syncward Catalog Diff Model
// Description: Stream, field, and attribute transforms between catalog versions.
// Purpose: Describe schema changes with breaking classification attached.
// Dependencies: serde, crate::core::{catalog, schema}
// ============================================================================

//! ## Overview
//! A [`CatalogDiff`] is an ordered list of [`StreamTransform`] values. Update
//! transforms carry [`FieldTransform`] and [`StreamAttributeTransform`] lists,
//! each tagged `breaking` when applying it would fail or lose data for the
//! existing sync configuration.
//!
//! Invariants:
//! - No stream descriptor appears in more than one transform.
//! - Transforms are ordered by descriptor; field transforms by field path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::catalog::FieldPath;
use crate::core::catalog::StreamDescriptor;
use crate::core::catalog::SyncMode;
use crate::core::schema::FieldShape;

// ============================================================================
// SECTION: Field Transforms
// ============================================================================

/// Kind of change applied to a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldTransformKind {
    /// Field appeared in the new schema.
    AddField {
        /// Shape of the new field.
        shape: FieldShape,
    },
    /// Field vanished from the new schema.
    RemoveField {
        /// Shape of the removed field.
        shape: FieldShape,
    },
    /// Field type annotations changed.
    UpdateFieldSchema {
        /// Shape before the change.
        old_shape: FieldShape,
        /// Shape after the change.
        new_shape: FieldShape,
    },
}

/// Change to one field of an updated stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTransform {
    /// Path of the changed field.
    pub field_name: FieldPath,
    /// Change kind.
    pub transform: FieldTransformKind,
    /// Whether the change breaks the existing sync.
    pub breaking: bool,
}

impl FieldTransform {
    /// Creates a non-breaking field addition.
    #[must_use]
    pub const fn add(field_name: FieldPath, shape: FieldShape) -> Self {
        Self {
            field_name,
            transform: FieldTransformKind::AddField {
                shape,
            },
            breaking: false,
        }
    }

    /// Creates a field removal; removals are always breaking.
    #[must_use]
    pub const fn remove(field_name: FieldPath, shape: FieldShape) -> Self {
        Self {
            field_name,
            transform: FieldTransformKind::RemoveField {
                shape,
            },
            breaking: true,
        }
    }

    /// Creates a type change, breaking unless the new shape widens the old one.
    #[must_use]
    pub fn update(field_name: FieldPath, old_shape: FieldShape, new_shape: FieldShape) -> Self {
        let breaking = !old_shape.widens_to(&new_shape);
        Self {
            field_name,
            transform: FieldTransformKind::UpdateFieldSchema {
                old_shape,
                new_shape,
            },
            breaking,
        }
    }

    /// Returns true for field additions.
    #[must_use]
    pub const fn is_add(&self) -> bool {
        matches!(self.transform, FieldTransformKind::AddField { .. })
    }

    /// Returns true for field removals.
    #[must_use]
    pub const fn is_remove(&self) -> bool {
        matches!(self.transform, FieldTransformKind::RemoveField { .. })
    }

    /// Returns true for type changes.
    #[must_use]
    pub const fn is_update(&self) -> bool {
        matches!(self.transform, FieldTransformKind::UpdateFieldSchema { .. })
    }

    /// Returns the transform seen from the opposite direction.
    #[must_use]
    pub fn inverted(&self) -> Self {
        let field_name = self.field_name.clone();
        match &self.transform {
            FieldTransformKind::AddField {
                shape,
            } => Self::remove(field_name, shape.clone()),
            FieldTransformKind::RemoveField {
                shape,
            } => Self::add(field_name, shape.clone()),
            FieldTransformKind::UpdateFieldSchema {
                old_shape,
                new_shape,
            } => Self::update(field_name, new_shape.clone(), old_shape.clone()),
        }
    }
}

// ============================================================================
// SECTION: Stream Attribute Transforms
// ============================================================================

/// Stream-level attribute change reported alongside field changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamAttributeChange {
    /// Source-defined primary key changed.
    UpdatePrimaryKey {
        /// Key before the change.
        old: Vec<Vec<String>>,
        /// Key after the change.
        new: Vec<Vec<String>>,
    },
    /// Set of supported sync modes changed.
    UpdateSupportedSyncModes {
        /// Modes before the change.
        old: BTreeSet<SyncMode>,
        /// Modes after the change.
        new: BTreeSet<SyncMode>,
    },
    /// Source default cursor changed.
    UpdateDefaultCursorField {
        /// Cursor before the change.
        old: Vec<String>,
        /// Cursor after the change.
        new: Vec<String>,
    },
}

impl StreamAttributeChange {
    /// Returns a short human label for the attribute.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::UpdatePrimaryKey { .. } => "primary key",
            Self::UpdateSupportedSyncModes { .. } => "supported sync modes",
            Self::UpdateDefaultCursorField { .. } => "default cursor field",
        }
    }
}

/// Stream attribute change with breaking classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAttributeTransform {
    /// Attribute change.
    pub change: StreamAttributeChange,
    /// Whether the change breaks the existing sync.
    pub breaking: bool,
}

// ============================================================================
// SECTION: Stream Transforms
// ============================================================================

/// Change to a whole stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transform_type", rename_all = "snake_case")]
pub enum StreamTransform {
    /// Stream appeared in the new catalog.
    AddStream {
        /// Added stream.
        stream_descriptor: StreamDescriptor,
    },
    /// Stream vanished from the new catalog.
    RemoveStream {
        /// Removed stream.
        stream_descriptor: StreamDescriptor,
        /// True when the removed stream was selected for sync.
        breaking: bool,
    },
    /// Stream persisted with field or attribute changes.
    UpdateStream {
        /// Updated stream.
        stream_descriptor: StreamDescriptor,
        /// Field-level changes ordered by path.
        field_transforms: Vec<FieldTransform>,
        /// Stream attribute changes.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        attribute_transforms: Vec<StreamAttributeTransform>,
    },
}

impl StreamTransform {
    /// Returns the descriptor of the affected stream.
    #[must_use]
    pub const fn descriptor(&self) -> &StreamDescriptor {
        match self {
            Self::AddStream {
                stream_descriptor,
            }
            | Self::RemoveStream {
                stream_descriptor,
                ..
            }
            | Self::UpdateStream {
                stream_descriptor,
                ..
            } => stream_descriptor,
        }
    }

    /// Returns true when applying the transform would break the sync.
    #[must_use]
    pub fn is_breaking(&self) -> bool {
        match self {
            Self::AddStream { .. } => false,
            Self::RemoveStream {
                breaking,
                ..
            } => *breaking,
            Self::UpdateStream {
                field_transforms,
                attribute_transforms,
                ..
            } => {
                field_transforms.iter().any(|transform| transform.breaking)
                    || attribute_transforms.iter().any(|transform| transform.breaking)
            }
        }
    }
}

// ============================================================================
// SECTION: Catalog Diff
// ============================================================================

/// Ordered set of stream transforms between two catalogs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDiff {
    /// Stream transforms ordered by descriptor.
    pub transforms: Vec<StreamTransform>,
}

impl CatalogDiff {
    /// Creates a diff, ordering transforms by stream descriptor.
    #[must_use]
    pub fn new(mut transforms: Vec<StreamTransform>) -> Self {
        transforms.sort_by(|left, right| left.descriptor().cmp(right.descriptor()));
        Self {
            transforms,
        }
    }

    /// Returns true when no stream changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Returns the number of changed streams.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Returns true when any transform is breaking.
    #[must_use]
    pub fn contains_breaking_change(&self) -> bool {
        self.transforms.iter().any(StreamTransform::is_breaking)
    }

    /// Returns the descriptors of all changed streams.
    #[must_use]
    pub fn descriptors(&self) -> BTreeSet<&StreamDescriptor> {
        self.transforms.iter().map(StreamTransform::descriptor).collect()
    }
}
