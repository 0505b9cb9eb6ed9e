// crates/syncward-core/src/runtime/store.rs
// ============================================================================
// Module: Syncward In-Memory Collaborators
// Description: Mutex-backed implementations of the collaborator interfaces.
// Purpose: Provide deterministic collaborators for tests and the CLI.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! These implementations keep state in memory behind `Arc<Mutex<_>>` so
//! clones share one store. They are intended for tests and local runs, not
//! production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use serde::Deserialize;
use serde::Serialize;

use crate::core::Catalog;
use crate::core::CatalogDiff;
use crate::core::CatalogId;
use crate::core::ConnectionId;
use crate::core::ConnectionPatch;
use crate::core::ConnectionSnapshot;
use crate::core::ConnectionStatus;
use crate::core::JobOutcomeRecord;
use crate::core::SourceId;
use crate::core::StatusReason;
use crate::core::Timestamp;
use crate::interfaces::CatalogReadError;
use crate::interfaces::CatalogReader;
use crate::interfaces::ConnectionReader;
use crate::interfaces::ConnectionStoreError;
use crate::interfaces::ConnectionWriter;
use crate::interfaces::DiscoveredCatalog;
use crate::interfaces::FeatureFlagClient;
use crate::interfaces::FlagContext;
use crate::interfaces::JobHistoryError;
use crate::interfaces::JobHistoryReader;
use crate::interfaces::NotificationDelivery;
use crate::interfaces::Notifier;
use crate::interfaces::NotifyError;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Locks a mutex, mapping poisoning to a described error.
fn lock<'a, T, E>(
    mutex: &'a Mutex<T>,
    name: &str,
    to_error: impl FnOnce(String) -> E,
) -> Result<MutexGuard<'a, T>, E> {
    mutex.lock().map_err(|_| to_error(format!("{name} mutex poisoned")))
}

// ============================================================================
// SECTION: Connection Store
// ============================================================================

/// In-memory connection store; also serves each connection's sync catalog.
#[derive(Debug, Default, Clone)]
pub struct InMemoryConnectionStore {
    /// Connections keyed by identifier.
    connections: Arc<Mutex<BTreeMap<ConnectionId, ConnectionSnapshot>>>,
}

impl InMemoryConnectionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a connection.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionStoreError::Store`] when the store mutex is poisoned.
    pub fn insert(&self, snapshot: ConnectionSnapshot) -> Result<(), ConnectionStoreError> {
        let mut guard = lock(&self.connections, "connection store", ConnectionStoreError::Store)?;
        guard.insert(snapshot.connection_id.clone(), snapshot);
        Ok(())
    }

    /// Applies `patch` to an existing connection.
    fn patch(
        &self,
        connection_id: &ConnectionId,
        patch: &ConnectionPatch,
    ) -> Result<(), ConnectionStoreError> {
        let mut guard = lock(&self.connections, "connection store", ConnectionStoreError::Store)?;
        let current = guard
            .get(connection_id)
            .ok_or_else(|| ConnectionStoreError::NotFound(connection_id.to_string()))?;
        let updated = patch.apply(current);
        guard.insert(connection_id.clone(), updated);
        Ok(())
    }
}

impl ConnectionReader for InMemoryConnectionStore {
    fn connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<ConnectionSnapshot, ConnectionStoreError> {
        let guard = lock(&self.connections, "connection store", ConnectionStoreError::Store)?;
        guard
            .get(connection_id)
            .cloned()
            .ok_or_else(|| ConnectionStoreError::NotFound(connection_id.to_string()))
    }

    fn connections_for_source(
        &self,
        source_id: &SourceId,
    ) -> Result<Vec<ConnectionSnapshot>, ConnectionStoreError> {
        let guard = lock(&self.connections, "connection store", ConnectionStoreError::Store)?;
        Ok(guard.values().filter(|snapshot| &snapshot.source_id == source_id).cloned().collect())
    }
}

impl ConnectionWriter for InMemoryConnectionStore {
    fn set_status(
        &self,
        connection_id: &ConnectionId,
        status: ConnectionStatus,
        reason: Option<StatusReason>,
    ) -> Result<(), ConnectionStoreError> {
        self.patch(
            connection_id,
            &ConnectionPatch {
                status: Some(status),
                status_reason: reason,
                ..ConnectionPatch::default()
            },
        )
    }

    fn set_sync_catalog(
        &self,
        connection_id: &ConnectionId,
        catalog: &Catalog,
        source_catalog_id: &CatalogId,
    ) -> Result<(), ConnectionStoreError> {
        self.patch(
            connection_id,
            &ConnectionPatch {
                sync_catalog: Some(catalog.clone()),
                source_catalog_id: Some(source_catalog_id.clone()),
                ..ConnectionPatch::default()
            },
        )
    }

    fn set_breaking_change(
        &self,
        connection_id: &ConnectionId,
        breaking_change: bool,
    ) -> Result<(), ConnectionStoreError> {
        self.patch(
            connection_id,
            &ConnectionPatch {
                breaking_change: Some(breaking_change),
                ..ConnectionPatch::default()
            },
        )
    }
}

// ============================================================================
// SECTION: Catalog Store
// ============================================================================

/// In-memory catalog reader backed by a connection store and discovered catalogs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalogStore {
    /// Connection store supplying sync catalogs.
    connections: InMemoryConnectionStore,
    /// Latest discovered catalog per source.
    discovered: Arc<Mutex<BTreeMap<SourceId, DiscoveredCatalog>>>,
}

impl InMemoryCatalogStore {
    /// Creates a catalog store reading sync catalogs from `connections`.
    #[must_use]
    pub fn new(connections: InMemoryConnectionStore) -> Self {
        Self {
            connections,
            discovered: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Records the latest discovered catalog of a source.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogReadError::Reader`] when the store mutex is poisoned.
    pub fn put_discovered(
        &self,
        source_id: SourceId,
        catalog: DiscoveredCatalog,
    ) -> Result<(), CatalogReadError> {
        let mut guard = lock(&self.discovered, "catalog store", CatalogReadError::Reader)?;
        guard.insert(source_id, catalog);
        Ok(())
    }
}

impl CatalogReader for InMemoryCatalogStore {
    fn current_catalog(&self, connection_id: &ConnectionId) -> Result<Catalog, CatalogReadError> {
        self.connections.connection(connection_id).map(|snapshot| snapshot.sync_catalog).map_err(
            |err| match err {
                ConnectionStoreError::NotFound(id) => CatalogReadError::NotFound(id),
                ConnectionStoreError::Store(message) => CatalogReadError::Reader(message),
            },
        )
    }

    fn discovered_catalog(
        &self,
        source_id: &SourceId,
    ) -> Result<DiscoveredCatalog, CatalogReadError> {
        let guard = lock(&self.discovered, "catalog store", CatalogReadError::Reader)?;
        guard.get(source_id).cloned().ok_or_else(|| CatalogReadError::NotFound(source_id.to_string()))
    }
}

// ============================================================================
// SECTION: Job History
// ============================================================================

/// In-memory job history; records are kept most-recent-first per connection.
#[derive(Debug, Default, Clone)]
pub struct InMemoryJobHistory {
    /// Job records keyed by connection.
    jobs: Arc<Mutex<BTreeMap<ConnectionId, Vec<JobOutcomeRecord>>>>,
}

impl InMemoryJobHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a job, keeping the connection's history sorted most-recent-first.
    ///
    /// # Errors
    ///
    /// Returns [`JobHistoryError::Reader`] when the store mutex is poisoned.
    pub fn record(
        &self,
        connection_id: &ConnectionId,
        job: JobOutcomeRecord,
    ) -> Result<(), JobHistoryError> {
        let mut guard = lock(&self.jobs, "job history", JobHistoryError::Reader)?;
        let jobs = guard.entry(connection_id.clone()).or_default();
        jobs.push(job);
        jobs.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(())
    }
}

impl JobHistoryReader for InMemoryJobHistory {
    fn list_replication_jobs(
        &self,
        connection_id: &ConnectionId,
        since: Timestamp,
    ) -> Result<Vec<JobOutcomeRecord>, JobHistoryError> {
        let guard = lock(&self.jobs, "job history", JobHistoryError::Reader)?;
        Ok(guard
            .get(connection_id)
            .map(|jobs| jobs.iter().filter(|job| job.created_at >= since).cloned().collect())
            .unwrap_or_default())
    }

    fn first_replication_job(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<JobOutcomeRecord>, JobHistoryError> {
        let guard = lock(&self.jobs, "job history", JobHistoryError::Reader)?;
        Ok(guard.get(connection_id).and_then(|jobs| jobs.last().cloned()))
    }

    fn last_replication_job(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<JobOutcomeRecord>, JobHistoryError> {
        let guard = lock(&self.jobs, "job history", JobHistoryError::Reader)?;
        Ok(guard.get(connection_id).and_then(|jobs| jobs.first().cloned()))
    }
}

// ============================================================================
// SECTION: Notifier
// ============================================================================

/// Notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordedNotification {
    /// Connection was disabled.
    AutoDisabled {
        /// Connection identifier.
        connection_id: ConnectionId,
        /// Disable reason.
        reason: StatusReason,
        /// Most recent job.
        job_id: u64,
        /// Delivery policy.
        delivery: NotificationDelivery,
    },
    /// Connection is at risk of being disabled.
    DisableWarning {
        /// Connection identifier.
        connection_id: ConnectionId,
        /// Warning reason.
        reason: StatusReason,
        /// Most recent job.
        job_id: u64,
        /// Delivery policy.
        delivery: NotificationDelivery,
    },
    /// Schema change detected.
    SchemaChange {
        /// Connection identifier.
        connection_id: ConnectionId,
        /// Announced diff.
        diff: CatalogDiff,
    },
}

/// Notifier that records notifications and can simulate delivery failure.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    /// Delivered notifications in send order.
    sent: Arc<Mutex<Vec<RecordedNotification>>>,
    /// When true, every delivery fails.
    failing: bool,
}

impl RecordingNotifier {
    /// Creates a notifier that records every notification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a notifier whose deliveries always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failing: true,
        }
    }

    /// Returns the notifications recorded so far.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Delivery`] when the notifier mutex is poisoned.
    pub fn sent(&self) -> Result<Vec<RecordedNotification>, NotifyError> {
        let guard = lock(&self.sent, "notifier", NotifyError::Delivery)?;
        Ok(guard.clone())
    }

    /// Records a notification unless delivery is configured to fail.
    fn deliver(&self, notification: RecordedNotification) -> Result<(), NotifyError> {
        if self.failing {
            return Err(NotifyError::Delivery("notifier configured to fail".to_string()));
        }
        let mut guard = lock(&self.sent, "notifier", NotifyError::Delivery)?;
        guard.push(notification);
        Ok(())
    }
}

impl Notifier for RecordingNotifier {
    fn notify_auto_disabled(
        &self,
        connection_id: &ConnectionId,
        reason: StatusReason,
        last_job: &JobOutcomeRecord,
        delivery: NotificationDelivery,
    ) -> Result<(), NotifyError> {
        self.deliver(RecordedNotification::AutoDisabled {
            connection_id: connection_id.clone(),
            reason,
            job_id: last_job.job_id,
            delivery,
        })
    }

    fn notify_disable_warning(
        &self,
        connection_id: &ConnectionId,
        reason: StatusReason,
        last_job: &JobOutcomeRecord,
        delivery: NotificationDelivery,
    ) -> Result<(), NotifyError> {
        self.deliver(RecordedNotification::DisableWarning {
            connection_id: connection_id.clone(),
            reason,
            job_id: last_job.job_id,
            delivery,
        })
    }

    fn notify_schema_change(
        &self,
        connection_id: &ConnectionId,
        diff: &CatalogDiff,
    ) -> Result<(), NotifyError> {
        self.deliver(RecordedNotification::SchemaChange {
            connection_id: connection_id.clone(),
            diff: diff.clone(),
        })
    }
}

// ============================================================================
// SECTION: Feature Flags
// ============================================================================

/// Feature flag client with a global default and per-context overrides.
#[derive(Debug, Clone, Default)]
pub struct StaticFeatureFlags {
    /// Value returned when no override matches.
    default_value: bool,
    /// Contexts for which the flag is forced off.
    disabled: BTreeSet<(String, FlagContextKey)>,
}

/// Ordered key form of a [`FlagContext`].
type FlagContextKey = String;

impl StaticFeatureFlags {
    /// Creates a client returning `default_value` for every flag.
    #[must_use]
    pub fn new(default_value: bool) -> Self {
        Self {
            default_value,
            disabled: BTreeSet::new(),
        }
    }

    /// Forces `flag_key` off for `context`.
    #[must_use]
    pub fn with_disabled(mut self, flag_key: &str, context: &FlagContext) -> Self {
        self.disabled.insert((flag_key.to_string(), context_key(context)));
        self
    }
}

/// Renders a context as an ordered key.
fn context_key(context: &FlagContext) -> FlagContextKey {
    match context {
        FlagContext::Workspace(workspace_id) => format!("workspace:{workspace_id}"),
    }
}

impl FeatureFlagClient for StaticFeatureFlags {
    fn bool_variation(&self, flag_key: &str, context: &FlagContext) -> bool {
        if self.disabled.contains(&(flag_key.to_string(), context_key(context))) {
            return false;
        }
        self.default_value
    }
}
