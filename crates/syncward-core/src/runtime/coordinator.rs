// crates/syncward-core/src/runtime/coordinator.rs
// ============================================================================
// Module: Syncward Coordinators
// Description: Orchestration around the diff, propagation, and auto-disable engines.
// Purpose: Read collaborator snapshots, run the pure engines, and apply their decisions.
// Dependencies: crate::{core, interfaces, runtime}, thiserror, tracing
// ============================================================================

//! ## Overview
//! Coordinators receive their collaborators by construction and hold no other
//! state. Each call reads fresh snapshots, runs an engine, writes the
//! decision, and then notifies. Notification failures are logged and never
//! undo a write; write failures are logged and returned, and the next check
//! re-evaluates from scratch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::core::CatalogDiff;
use crate::core::CatalogError;
use crate::core::ConnectionId;
use crate::core::ConnectionStatus;
use crate::core::SourceId;
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
use crate::runtime::auto_disable::AutoDisableLimits;
use crate::runtime::auto_disable::AutoDisableOutcome;
use crate::runtime::auto_disable::evaluate;
use crate::runtime::diff::compute_diff;
use crate::runtime::propagation::SchemaChangeDecision;
use crate::runtime::propagation::decide_schema_change;
use crate::runtime::propagation::get_updated_schema;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Feature flag gating automatic schema propagation per workspace.
pub const AUTO_PROPAGATE_FLAG_KEY: &str = "auto-propagate-schema-changes";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Coordinator errors raised by collaborators or malformed catalogs.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Catalog could not be read.
    #[error(transparent)]
    CatalogRead(#[from] CatalogReadError),
    /// Catalog failed validation.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(#[from] CatalogError),
    /// Connection could not be read or written.
    #[error(transparent)]
    Connection(#[from] ConnectionStoreError),
    /// Job history could not be read.
    #[error(transparent)]
    JobHistory(#[from] JobHistoryError),
}

// ============================================================================
// SECTION: Schema Change Coordinator
// ============================================================================

/// Result of applying a discovered catalog to one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaChangeReport {
    /// Connection evaluated.
    pub connection_id: ConnectionId,
    /// Every detected change.
    pub diff: CatalogDiff,
    /// Decision taken.
    pub decision: SchemaChangeDecision,
    /// Changes merged into the sync catalog.
    pub applied_diff: CatalogDiff,
    /// Descriptions of the merged changes.
    pub change_description: Vec<String>,
    /// Whether a schema change notification was delivered.
    pub notified: bool,
}

/// Applies discovered catalogs to connections.
pub struct SchemaChangeCoordinator<C, S, N, F> {
    /// Catalog reader.
    catalogs: C,
    /// Connection reader and writer.
    connections: S,
    /// User notifier.
    notifier: N,
    /// Feature flag client.
    flags: F,
    /// Flag key gating automatic propagation.
    flag_key: String,
}

impl<C, S, N, F> SchemaChangeCoordinator<C, S, N, F>
where
    C: CatalogReader,
    S: ConnectionReader + ConnectionWriter,
    N: Notifier,
    F: FeatureFlagClient,
{
    /// Creates a coordinator gated by [`AUTO_PROPAGATE_FLAG_KEY`].
    #[must_use]
    pub fn new(catalogs: C, connections: S, notifier: N, flags: F) -> Self {
        Self {
            catalogs,
            connections,
            notifier,
            flags,
            flag_key: AUTO_PROPAGATE_FLAG_KEY.to_string(),
        }
    }

    /// Replaces the flag key gating automatic propagation.
    #[must_use]
    pub fn with_flag_key(mut self, flag_key: impl Into<String>) -> Self {
        self.flag_key = flag_key.into();
        self
    }

    /// Diffs a connection's sync catalog against `discovered` and applies the decision.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError`] when a collaborator read or write fails or
    /// a catalog is malformed. Notification failures are logged only.
    pub fn apply_schema_change(
        &self,
        connection_id: &ConnectionId,
        discovered: &DiscoveredCatalog,
    ) -> Result<SchemaChangeReport, CoordinatorError> {
        let connection = self.connections.connection(connection_id)?;
        let current = self.catalogs.current_catalog(connection_id)?;
        let diff = compute_diff(&current, &discovered.catalog, &current)?;
        let preference = connection.non_breaking_changes_preference;
        let workspace_enabled = self
            .flags
            .bool_variation(&self.flag_key, &FlagContext::Workspace(connection.workspace_id.clone()));
        let decision = decide_schema_change(&diff, preference, workspace_enabled);

        if !diff.is_empty() {
            self.connections
                .set_breaking_change(connection_id, diff.contains_breaking_change())
                .inspect_err(|err| log_write_failure(connection_id, "breaking change flag", err))?;
        }

        let mut applied_diff = CatalogDiff::default();
        let mut change_description = Vec::new();
        match decision {
            SchemaChangeDecision::NoChanges => {
                debug!(connection_id = %connection_id, "no schema changes detected");
            }
            SchemaChangeDecision::Disable {
                reason,
            } => {
                self.connections
                    .set_status(connection_id, ConnectionStatus::Inactive, Some(reason))
                    .inspect_err(|err| log_write_failure(connection_id, "status", err))?;
                info!(
                    connection_id = %connection_id,
                    reason = reason.as_str(),
                    "disabled connection after schema change"
                );
            }
            SchemaChangeDecision::Propagate => {
                let result = get_updated_schema(
                    &current,
                    &discovered.catalog,
                    &diff.transforms,
                    preference,
                    &connection.supported_destination_sync_modes,
                );
                if result.applied_diff.is_empty() {
                    info!(connection_id = %connection_id, "no applicable schema changes to propagate");
                } else {
                    self.connections
                        .set_sync_catalog(connection_id, &result.catalog, &discovered.catalog_id)
                        .inspect_err(|err| log_write_failure(connection_id, "sync catalog", err))?;
                    info!(
                        connection_id = %connection_id,
                        applied = result.applied_diff.len(),
                        detected = diff.len(),
                        "propagated schema changes"
                    );
                }
                applied_diff = result.applied_diff;
                change_description = result.change_description;
            }
            SchemaChangeDecision::NotifyOnly => {
                info!(
                    connection_id = %connection_id,
                    preference = preference.as_str(),
                    workspace_enabled,
                    "not propagating schema changes, notifying only"
                );
            }
        }

        let notified = decision != SchemaChangeDecision::NoChanges
            && self.notify_schema_change(connection_id, &diff);
        Ok(SchemaChangeReport {
            connection_id: connection_id.clone(),
            diff,
            decision,
            applied_diff,
            change_description,
            notified,
        })
    }

    /// Applies the source's latest discovered catalog to each of its active connections.
    ///
    /// Per-connection failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError`] when the discovered catalog or the
    /// connection list cannot be read.
    pub fn apply_for_source(
        &self,
        source_id: &SourceId,
    ) -> Result<Vec<SchemaChangeReport>, CoordinatorError> {
        let discovered = self.catalogs.discovered_catalog(source_id)?;
        discovered.catalog.validate()?;
        let connections = self.connections.connections_for_source(source_id)?;
        let mut reports = Vec::new();
        for connection in connections.iter().filter(|connection| connection.is_active()) {
            match self.apply_schema_change(&connection.connection_id, &discovered) {
                Ok(report) => reports.push(report),
                Err(err) => error!(
                    source_id = %source_id,
                    connection_id = %connection.connection_id,
                    error = %err,
                    "failed to apply schema change"
                ),
            }
        }
        Ok(reports)
    }

    /// Sends a schema change notification, returning whether it was delivered.
    fn notify_schema_change(&self, connection_id: &ConnectionId, diff: &CatalogDiff) -> bool {
        match self.notifier.notify_schema_change(connection_id, diff) {
            Ok(()) => true,
            Err(err) => {
                warn!(connection_id = %connection_id, error = %err, "schema change notification failed");
                false
            }
        }
    }
}

// ============================================================================
// SECTION: Auto-Disable Coordinator
// ============================================================================

/// Runs the auto-disable engine after job completion and applies its outcome.
pub struct AutoDisableCoordinator<J, S, N> {
    /// Job history reader.
    jobs: J,
    /// Connection reader and writer.
    connections: S,
    /// User notifier.
    notifier: N,
    /// Disable thresholds.
    limits: AutoDisableLimits,
}

impl<J, S, N> AutoDisableCoordinator<J, S, N>
where
    J: JobHistoryReader,
    S: ConnectionReader + ConnectionWriter,
    N: Notifier,
{
    /// Creates an auto-disable coordinator.
    #[must_use]
    pub const fn new(jobs: J, connections: S, notifier: N, limits: AutoDisableLimits) -> Self {
        Self {
            jobs,
            connections,
            notifier,
            limits,
        }
    }

    /// Evaluates a connection at `now` and applies the outcome.
    ///
    /// Missing job history is logged and yields [`AutoDisableOutcome::None`].
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError`] when a collaborator read or the status
    /// write fails. Notification failures are logged only.
    pub fn check(
        &self,
        connection_id: &ConnectionId,
        now: Timestamp,
    ) -> Result<AutoDisableOutcome, CoordinatorError> {
        let connection = self.connections.connection(connection_id)?;
        if !connection.is_active() {
            debug!(connection_id = %connection_id, "connection already inactive");
            return Ok(AutoDisableOutcome::None);
        }
        let Some(last_job) = self.jobs.last_replication_job(connection_id)? else {
            error!(connection_id = %connection_id, "auto-disable check without a latest replication job");
            return Ok(AutoDisableOutcome::None);
        };
        let Some(first_job) = self.jobs.first_replication_job(connection_id)? else {
            error!(connection_id = %connection_id, "auto-disable check without any replication job");
            return Ok(AutoDisableOutcome::None);
        };
        let since = now.minus_days(self.limits.max_days_of_only_failed_jobs);
        let jobs = self.jobs.list_replication_jobs(connection_id, since)?;
        let outcome = evaluate(connection.status, &jobs, Some(&first_job), now, &self.limits);

        match outcome {
            AutoDisableOutcome::None => {}
            AutoDisableOutcome::Disable {
                reason,
            } => {
                self.connections
                    .set_status(connection_id, ConnectionStatus::Inactive, Some(reason))
                    .inspect_err(|err| log_write_failure(connection_id, "status", err))?;
                info!(connection_id = %connection_id, reason = reason.as_str(), "auto-disabled connection");
                if let Err(err) = self.notifier.notify_auto_disabled(
                    connection_id,
                    reason,
                    &last_job,
                    NotificationDelivery::Configured,
                ) {
                    warn!(connection_id = %connection_id, error = %err, "auto-disable notification failed");
                }
            }
            AutoDisableOutcome::Warn {
                reason,
            } => {
                info!(connection_id = %connection_id, reason = reason.as_str(), "connection at risk of auto-disable");
                if let Err(err) = self.notifier.notify_disable_warning(
                    connection_id,
                    reason,
                    &last_job,
                    NotificationDelivery::ForceEmail,
                ) {
                    warn!(connection_id = %connection_id, error = %err, "disable warning notification failed");
                }
            }
        }
        Ok(outcome)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Logs a failed connection write.
fn log_write_failure(connection_id: &ConnectionId, what: &str, err: &ConnectionStoreError) {
    error!(connection_id = %connection_id, write = what, error = %err, "connection write failed");
}
