// crates/syncward-core/src/core/connection.rs
// ============================================================================
// Module: Syncward Connection State
// Description: Connection snapshots, preferences, statuses, and patches.
// Purpose: Carry the connection facts engines read and the changes they emit.
// Dependencies: serde, crate::core::{catalog, identifiers}
// ============================================================================

//! ## Overview
//! A [`ConnectionSnapshot`] is a read-only view of a connection supplied by a
//! persistence collaborator. Engine decisions are expressed as a
//! [`ConnectionPatch`]; applying a patch builds a new snapshot and leaves the
//! original untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::catalog::Catalog;
use crate::core::catalog::DestinationSyncMode;
use crate::core::identifiers::CatalogId;
use crate::core::identifiers::ConnectionId;
use crate::core::identifiers::SourceId;
use crate::core::identifiers::WorkspaceId;

// ============================================================================
// SECTION: Preferences and Status
// ============================================================================

/// User preference for handling non-breaking schema changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonBreakingChangesPreference {
    /// Leave the connection unchanged and notify.
    #[default]
    Ignore,
    /// Disable the connection on any schema change.
    Disable,
    /// Apply field-level changes to existing streams.
    PropagateColumns,
    /// Apply field-level changes and add new streams.
    PropagateFully,
}

impl NonBreakingChangesPreference {
    /// Returns true when field changes on existing streams are applied.
    #[must_use]
    pub const fn propagates_columns(self) -> bool {
        matches!(self, Self::PropagateColumns | Self::PropagateFully)
    }

    /// Returns true when new streams are added.
    #[must_use]
    pub const fn propagates_streams(self) -> bool {
        matches!(self, Self::PropagateFully)
    }

    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Disable => "disable",
            Self::PropagateColumns => "propagate_columns",
            Self::PropagateFully => "propagate_fully",
        }
    }
}

/// Connection lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Syncs are scheduled.
    #[default]
    Active,
    /// Syncs are paused.
    Inactive,
    /// Connection is retired.
    Deprecated,
}

/// Reason recorded when Syncward changes a connection's status or warns about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusReason {
    /// Consecutive failures reached the configured limit.
    TooManyConsecutiveFailedJobsInARow,
    /// Only failures were observed across the configured day window.
    OnlyFailedJobsRecently,
    /// The detected schema change is breaking.
    SchemaChangesAreBreaking,
    /// The connection disables itself on any schema change.
    DisableConnectionIfAnySchemaChanges,
}

impl StatusReason {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TooManyConsecutiveFailedJobsInARow => "too_many_consecutive_failed_jobs_in_a_row",
            Self::OnlyFailedJobsRecently => "only_failed_jobs_recently",
            Self::SchemaChangesAreBreaking => "schema_changes_are_breaking",
            Self::DisableConnectionIfAnySchemaChanges => "disable_connection_if_any_schema_changes",
        }
    }
}

// ============================================================================
// SECTION: Snapshots and Patches
// ============================================================================

/// Read-only view of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    /// Connection identifier.
    pub connection_id: ConnectionId,
    /// Source feeding the connection.
    pub source_id: SourceId,
    /// Owning workspace.
    pub workspace_id: WorkspaceId,
    /// Lifecycle status.
    #[serde(default)]
    pub status: ConnectionStatus,
    /// Reason for the last automatic status change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<StatusReason>,
    /// Preference for non-breaking schema changes.
    #[serde(default)]
    pub non_breaking_changes_preference: NonBreakingChangesPreference,
    /// Destination sync modes the destination connector supports.
    #[serde(default)]
    pub supported_destination_sync_modes: Vec<DestinationSyncMode>,
    /// Whether an unresolved breaking schema change is pending.
    #[serde(default)]
    pub breaking_change: bool,
    /// Active sync catalog.
    #[serde(default)]
    pub sync_catalog: Catalog,
    /// Discovered catalog the sync catalog was last merged from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_catalog_id: Option<CatalogId>,
}

impl ConnectionSnapshot {
    /// Returns true when syncs are scheduled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ConnectionStatus::Active
    }
}

/// Partial update of a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPatch {
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ConnectionStatus>,
    /// New status reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<StatusReason>,
    /// New breaking-change flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breaking_change: Option<bool>,
    /// New sync catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_catalog: Option<Catalog>,
    /// New source catalog identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_catalog_id: Option<CatalogId>,
}

impl ConnectionPatch {
    /// Creates a patch that deactivates the connection for `reason`.
    #[must_use]
    pub fn disable(reason: StatusReason) -> Self {
        Self {
            status: Some(ConnectionStatus::Inactive),
            status_reason: Some(reason),
            ..Self::default()
        }
    }

    /// Returns true when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.status_reason.is_none()
            && self.breaking_change.is_none()
            && self.sync_catalog.is_none()
            && self.source_catalog_id.is_none()
    }

    /// Returns a new snapshot with the patch applied to `snapshot`.
    #[must_use]
    pub fn apply(&self, snapshot: &ConnectionSnapshot) -> ConnectionSnapshot {
        ConnectionSnapshot {
            connection_id: snapshot.connection_id.clone(),
            source_id: snapshot.source_id.clone(),
            workspace_id: snapshot.workspace_id.clone(),
            status: self.status.unwrap_or(snapshot.status),
            status_reason: self.status_reason.or(snapshot.status_reason),
            non_breaking_changes_preference: snapshot.non_breaking_changes_preference,
            supported_destination_sync_modes: snapshot.supported_destination_sync_modes.clone(),
            breaking_change: self.breaking_change.unwrap_or(snapshot.breaking_change),
            sync_catalog: self
                .sync_catalog
                .clone()
                .unwrap_or_else(|| snapshot.sync_catalog.clone()),
            source_catalog_id: self
                .source_catalog_id
                .clone()
                .or_else(|| snapshot.source_catalog_id.clone()),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::ConnectionPatch;
    use super::ConnectionSnapshot;
    use super::ConnectionStatus;
    use super::NonBreakingChangesPreference;
    use super::StatusReason;
    use crate::core::catalog::Catalog;

    fn snapshot() -> ConnectionSnapshot {
        ConnectionSnapshot {
            connection_id: "conn-1".into(),
            source_id: "src-1".into(),
            workspace_id: "ws-1".into(),
            status: ConnectionStatus::Active,
            status_reason: None,
            non_breaking_changes_preference: NonBreakingChangesPreference::PropagateColumns,
            supported_destination_sync_modes: Vec::new(),
            breaking_change: false,
            sync_catalog: Catalog::default(),
            source_catalog_id: None,
        }
    }

    #[test]
    fn apply_builds_new_value_and_leaves_original() {
        let original = snapshot();
        let patch = ConnectionPatch::disable(StatusReason::OnlyFailedJobsRecently);
        let patched = patch.apply(&original);
        assert_eq!(patched.status, ConnectionStatus::Inactive);
        assert_eq!(patched.status_reason, Some(StatusReason::OnlyFailedJobsRecently));
        assert_eq!(original.status, ConnectionStatus::Active);
        assert_eq!(patched.non_breaking_changes_preference, original.non_breaking_changes_preference);
    }

    #[test]
    fn empty_patch_is_identity() {
        let original = snapshot();
        let patch = ConnectionPatch::default();
        assert!(patch.is_empty());
        assert_eq!(patch.apply(&original), original);
    }
}
