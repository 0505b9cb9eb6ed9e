// crates/syncward-core/src/interfaces/mod.rs
// ============================================================================
// Module: Syncward Interfaces
// Description: Backend-agnostic collaborators for catalogs, jobs, connections, and alerts.
// Purpose: Define the contract surfaces the coordinators depend on.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces describe how Syncward reads catalogs, job history, and
//! connection state, and how it writes decisions back and alerts users,
//! without embedding any storage or delivery backend. The decision engines
//! never call these traits; only the coordinators in
//! [`crate::runtime::coordinator`] do.
//!
//! Writers must be idempotent: re-applying the same status or catalog is a
//! no-op at the data level.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::Catalog;
use crate::core::CatalogDiff;
use crate::core::CatalogId;
use crate::core::ConnectionId;
use crate::core::ConnectionSnapshot;
use crate::core::ConnectionStatus;
use crate::core::JobOutcomeRecord;
use crate::core::SourceId;
use crate::core::StatusReason;
use crate::core::Timestamp;
use crate::core::WorkspaceId;

// ============================================================================
// SECTION: Catalog Reader
// ============================================================================

/// Discovered catalog together with its persisted identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredCatalog {
    /// Persisted catalog identifier.
    pub catalog_id: CatalogId,
    /// Catalog contents.
    pub catalog: Catalog,
}

/// Catalog reader errors.
#[derive(Debug, Error)]
pub enum CatalogReadError {
    /// Requested catalog does not exist.
    #[error("catalog not found: {0}")]
    NotFound(String),
    /// Reader reported an error.
    #[error("catalog reader error: {0}")]
    Reader(String),
}

/// Supplies catalogs to the diff engine.
pub trait CatalogReader {
    /// Returns the active sync catalog of a connection.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogReadError`] when the catalog cannot be read.
    fn current_catalog(&self, connection_id: &ConnectionId) -> Result<Catalog, CatalogReadError>;

    /// Returns the most recent discovered catalog of a source.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogReadError`] when the catalog cannot be read.
    fn discovered_catalog(&self, source_id: &SourceId)
    -> Result<DiscoveredCatalog, CatalogReadError>;
}

// ============================================================================
// SECTION: Job History Reader
// ============================================================================

/// Job history reader errors.
#[derive(Debug, Error)]
pub enum JobHistoryError {
    /// Reader reported an error.
    #[error("job history reader error: {0}")]
    Reader(String),
}

/// Supplies replication job outcomes to the health engine.
pub trait JobHistoryReader {
    /// Lists replication jobs created at or after `since`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`JobHistoryError`] when history cannot be read.
    fn list_replication_jobs(
        &self,
        connection_id: &ConnectionId,
        since: Timestamp,
    ) -> Result<Vec<JobOutcomeRecord>, JobHistoryError>;

    /// Returns the first replication job ever run for the connection.
    ///
    /// # Errors
    ///
    /// Returns [`JobHistoryError`] when history cannot be read.
    fn first_replication_job(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<JobOutcomeRecord>, JobHistoryError>;

    /// Returns the most recent replication job for the connection.
    ///
    /// # Errors
    ///
    /// Returns [`JobHistoryError`] when history cannot be read.
    fn last_replication_job(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<JobOutcomeRecord>, JobHistoryError>;
}

// ============================================================================
// SECTION: Connection Store
// ============================================================================

/// Connection store errors.
#[derive(Debug, Error)]
pub enum ConnectionStoreError {
    /// Connection does not exist.
    #[error("connection not found: {0}")]
    NotFound(String),
    /// Store reported an error.
    #[error("connection store error: {0}")]
    Store(String),
}

/// Supplies connection snapshots.
pub trait ConnectionReader {
    /// Returns a connection snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionStoreError`] when the connection cannot be read.
    fn connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<ConnectionSnapshot, ConnectionStoreError>;

    /// Returns every connection fed by `source_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionStoreError`] when connections cannot be listed.
    fn connections_for_source(
        &self,
        source_id: &SourceId,
    ) -> Result<Vec<ConnectionSnapshot>, ConnectionStoreError>;
}

/// Applies engine decisions to connections.
pub trait ConnectionWriter {
    /// Sets the connection status and the reason for an automatic change.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionStoreError`] when the write fails.
    fn set_status(
        &self,
        connection_id: &ConnectionId,
        status: ConnectionStatus,
        reason: Option<StatusReason>,
    ) -> Result<(), ConnectionStoreError>;

    /// Replaces the sync catalog and records the discovered catalog it came from.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionStoreError`] when the write fails.
    fn set_sync_catalog(
        &self,
        connection_id: &ConnectionId,
        catalog: &Catalog,
        source_catalog_id: &CatalogId,
    ) -> Result<(), ConnectionStoreError>;

    /// Records whether an unresolved breaking schema change is pending.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionStoreError`] when the write fails.
    fn set_breaking_change(
        &self,
        connection_id: &ConnectionId,
        breaking_change: bool,
    ) -> Result<(), ConnectionStoreError>;
}

// ============================================================================
// SECTION: Notifier
// ============================================================================

/// Channel policy for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationDelivery {
    /// Use the workspace's configured notification settings.
    Configured,
    /// Always send by email, regardless of configured settings.
    ForceEmail,
}

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Delivery failed.
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Sends user-facing alerts. Failures never undo decisions already applied.
pub trait Notifier {
    /// Announces that a connection was disabled automatically.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when delivery fails.
    fn notify_auto_disabled(
        &self,
        connection_id: &ConnectionId,
        reason: StatusReason,
        last_job: &JobOutcomeRecord,
        delivery: NotificationDelivery,
    ) -> Result<(), NotifyError>;

    /// Warns that a connection is at risk of being disabled.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when delivery fails.
    fn notify_disable_warning(
        &self,
        connection_id: &ConnectionId,
        reason: StatusReason,
        last_job: &JobOutcomeRecord,
        delivery: NotificationDelivery,
    ) -> Result<(), NotifyError>;

    /// Announces a detected schema change.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when delivery fails.
    fn notify_schema_change(
        &self,
        connection_id: &ConnectionId,
        diff: &CatalogDiff,
    ) -> Result<(), NotifyError>;
}

// ============================================================================
// SECTION: Feature Flags
// ============================================================================

/// Evaluation context for a feature flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum FlagContext {
    /// Flag evaluated for a workspace.
    Workspace(WorkspaceId),
}

/// Evaluates boolean feature flags.
pub trait FeatureFlagClient {
    /// Returns the flag value for `context`.
    fn bool_variation(&self, flag_key: &str, context: &FlagContext) -> bool;
}
