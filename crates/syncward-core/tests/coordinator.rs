// crates/syncward-core/tests/coordinator.rs
// ============================================================================
// Module: Coordinator Tests
// Description: Schema change and auto-disable orchestration over in-memory collaborators.
// Purpose: Validate persisted effects, notifications, and failure handling.
// ============================================================================

//! Coordinator tests using in-memory collaborators.

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
use syncward_core::AUTO_PROPAGATE_FLAG_KEY;
use syncward_core::AutoDisableCoordinator;
use syncward_core::AutoDisableLimits;
use syncward_core::AutoDisableOutcome;
use syncward_core::Catalog;
use syncward_core::CatalogEntry;
use syncward_core::CatalogId;
use syncward_core::ConnectionId;
use syncward_core::ConnectionReader;
use syncward_core::ConnectionSnapshot;
use syncward_core::ConnectionStatus;
use syncward_core::ConnectionStoreError;
use syncward_core::CoordinatorError;
use syncward_core::DiscoveredCatalog;
use syncward_core::FlagContext;
use syncward_core::InMemoryCatalogStore;
use syncward_core::InMemoryConnectionStore;
use syncward_core::InMemoryJobHistory;
use syncward_core::JobOutcomeRecord;
use syncward_core::JobStatus;
use syncward_core::NonBreakingChangesPreference;
use syncward_core::NotificationDelivery;
use syncward_core::RecordedNotification;
use syncward_core::RecordingNotifier;
use syncward_core::SECONDS_PER_DAY;
use syncward_core::SchemaChangeCoordinator;
use syncward_core::SchemaChangeDecision;
use syncward_core::SourceId;
use syncward_core::StaticFeatureFlags;
use syncward_core::StatusReason;
use syncward_core::Stream;
use syncward_core::StreamConfiguration;
use syncward_core::StreamDescriptor;
use syncward_core::Timestamp;
use syncward_core::WorkspaceId;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const SOURCE: &str = "source-1";
const WORKSPACE: &str = "workspace-1";

fn users_catalog(fields: &[&str]) -> Catalog {
    let mut properties = serde_json::Map::new();
    for field in fields {
        properties.insert((*field).to_string(), json!({"type": "string"}));
    }
    Catalog::new(vec![CatalogEntry {
        stream: Stream::new(
            StreamDescriptor::named("users"),
            json!({"type": "object", "properties": properties}),
        ),
        config: StreamConfiguration {
            selected: true,
            ..StreamConfiguration::default()
        },
    }])
}

fn connection(
    id: &str,
    status: ConnectionStatus,
    preference: NonBreakingChangesPreference,
) -> ConnectionSnapshot {
    ConnectionSnapshot {
        connection_id: ConnectionId::new(id),
        source_id: SourceId::new(SOURCE),
        workspace_id: WorkspaceId::new(WORKSPACE),
        status,
        status_reason: None,
        non_breaking_changes_preference: preference,
        supported_destination_sync_modes: Vec::new(),
        breaking_change: false,
        sync_catalog: users_catalog(&["id"]),
        source_catalog_id: None,
    }
}

fn discovered(fields: &[&str]) -> DiscoveredCatalog {
    DiscoveredCatalog {
        catalog_id: CatalogId::new("catalog-2"),
        catalog: users_catalog(fields),
    }
}

type Schema =
    SchemaChangeCoordinator<InMemoryCatalogStore, InMemoryConnectionStore, RecordingNotifier, StaticFeatureFlags>;

fn schema_coordinator(
    connections: &InMemoryConnectionStore,
    notifier: &RecordingNotifier,
    flags: StaticFeatureFlags,
) -> (Schema, InMemoryCatalogStore) {
    let catalogs = InMemoryCatalogStore::new(connections.clone());
    let coordinator =
        SchemaChangeCoordinator::new(catalogs.clone(), connections.clone(), notifier.clone(), flags);
    (coordinator, catalogs)
}

// ============================================================================
// SECTION: Schema Change Coordinator
// ============================================================================

#[test]
fn propagation_persists_catalog_and_notifies() -> Result<(), CoordinatorError> {
    let connections = InMemoryConnectionStore::new();
    connections.insert(connection("conn-1", ConnectionStatus::Active, NonBreakingChangesPreference::PropagateColumns))?;
    let notifier = RecordingNotifier::new();
    let (coordinator, _) = schema_coordinator(&connections, &notifier, StaticFeatureFlags::new(true));
    let id = ConnectionId::new("conn-1");

    let report = coordinator.apply_schema_change(&id, &discovered(&["id", "email"]))?;
    assert_eq!(report.decision, SchemaChangeDecision::Propagate);
    assert_eq!(report.applied_diff, report.diff);
    assert_eq!(report.change_description, vec!["Modified stream 'users': Added fields ['email']"]);
    assert!(report.notified);

    let stored = connections.connection(&id)?;
    assert_eq!(stored.sync_catalog, users_catalog(&["id", "email"]));
    assert_eq!(stored.source_catalog_id, Some(CatalogId::new("catalog-2")));
    assert!(!stored.breaking_change);
    assert_eq!(stored.status, ConnectionStatus::Active);

    let sent = notifier.sent().unwrap();
    assert_eq!(
        sent,
        vec![RecordedNotification::SchemaChange {
            connection_id: id,
            diff: report.diff,
        }]
    );
    Ok(())
}

#[test]
fn breaking_change_disables_connection() -> Result<(), CoordinatorError> {
    let connections = InMemoryConnectionStore::new();
    connections.insert(connection("conn-1", ConnectionStatus::Active, NonBreakingChangesPreference::PropagateFully))?;
    let notifier = RecordingNotifier::new();
    let (coordinator, _) = schema_coordinator(&connections, &notifier, StaticFeatureFlags::new(true));
    let id = ConnectionId::new("conn-1");

    let report = coordinator.apply_schema_change(&id, &discovered(&[]))?;
    assert_eq!(
        report.decision,
        SchemaChangeDecision::Disable {
            reason: StatusReason::SchemaChangesAreBreaking,
        }
    );
    assert!(report.applied_diff.is_empty());

    let stored = connections.connection(&id)?;
    assert_eq!(stored.status, ConnectionStatus::Inactive);
    assert_eq!(stored.status_reason, Some(StatusReason::SchemaChangesAreBreaking));
    assert!(stored.breaking_change);
    assert_eq!(stored.sync_catalog, users_catalog(&["id"]));
    assert_eq!(notifier.sent().unwrap().len(), 1);
    Ok(())
}

#[test]
fn disabled_workspace_flag_leaves_catalog_untouched() -> Result<(), CoordinatorError> {
    let connections = InMemoryConnectionStore::new();
    connections.insert(connection("conn-1", ConnectionStatus::Active, NonBreakingChangesPreference::PropagateFully))?;
    let notifier = RecordingNotifier::new();
    let flags = StaticFeatureFlags::new(true)
        .with_disabled(AUTO_PROPAGATE_FLAG_KEY, &FlagContext::Workspace(WorkspaceId::new(WORKSPACE)));
    let (coordinator, _) = schema_coordinator(&connections, &notifier, flags);
    let id = ConnectionId::new("conn-1");

    let report = coordinator.apply_schema_change(&id, &discovered(&["id", "email"]))?;
    assert_eq!(report.decision, SchemaChangeDecision::NotifyOnly);
    assert!(report.applied_diff.is_empty());
    assert!(report.notified);
    assert_eq!(connections.connection(&id)?.sync_catalog, users_catalog(&["id"]));
    assert_eq!(notifier.sent().unwrap().len(), 1);
    Ok(())
}

#[test]
fn ignore_preference_notifies_without_touching_catalog() -> Result<(), CoordinatorError> {
    let connections = InMemoryConnectionStore::new();
    connections.insert(connection("conn-1", ConnectionStatus::Active, NonBreakingChangesPreference::Ignore))?;
    let notifier = RecordingNotifier::new();
    let (coordinator, _) = schema_coordinator(&connections, &notifier, StaticFeatureFlags::new(true));
    let id = ConnectionId::new("conn-1");

    let report = coordinator.apply_schema_change(&id, &discovered(&["id", "email"]))?;
    assert_eq!(report.decision, SchemaChangeDecision::NotifyOnly);
    assert_eq!(report.diff.len(), 1);
    assert!(report.notified);

    let stored = connections.connection(&id)?;
    assert_eq!(stored.sync_catalog, users_catalog(&["id"]));
    assert_eq!(stored.status, ConnectionStatus::Active);
    assert_eq!(
        notifier.sent().unwrap(),
        vec![RecordedNotification::SchemaChange {
            connection_id: id,
            diff: report.diff,
        }]
    );
    Ok(())
}

#[test]
fn unchanged_catalog_sends_no_notification() -> Result<(), CoordinatorError> {
    let connections = InMemoryConnectionStore::new();
    connections.insert(connection("conn-1", ConnectionStatus::Active, NonBreakingChangesPreference::Ignore))?;
    let notifier = RecordingNotifier::new();
    let (coordinator, _) = schema_coordinator(&connections, &notifier, StaticFeatureFlags::new(true));

    let report = coordinator.apply_schema_change(&ConnectionId::new("conn-1"), &discovered(&["id"]))?;
    assert_eq!(report.decision, SchemaChangeDecision::NoChanges);
    assert!(!report.notified);
    assert!(notifier.sent().unwrap().is_empty());
    Ok(())
}

#[test]
fn failed_notification_keeps_propagated_catalog() -> Result<(), CoordinatorError> {
    let connections = InMemoryConnectionStore::new();
    connections.insert(connection("conn-1", ConnectionStatus::Active, NonBreakingChangesPreference::PropagateColumns))?;
    let notifier = RecordingNotifier::failing();
    let (coordinator, _) = schema_coordinator(&connections, &notifier, StaticFeatureFlags::new(true));
    let id = ConnectionId::new("conn-1");

    let report = coordinator.apply_schema_change(&id, &discovered(&["id", "email"]))?;
    assert!(!report.notified);
    assert_eq!(connections.connection(&id)?.sync_catalog, users_catalog(&["id", "email"]));
    Ok(())
}

#[test]
fn apply_for_source_skips_inactive_connections() -> Result<(), CoordinatorError> {
    let connections = InMemoryConnectionStore::new();
    connections.insert(connection("conn-active", ConnectionStatus::Active, NonBreakingChangesPreference::PropagateColumns))?;
    connections.insert(connection("conn-paused", ConnectionStatus::Inactive, NonBreakingChangesPreference::PropagateColumns))?;
    let notifier = RecordingNotifier::new();
    let (coordinator, catalogs) = schema_coordinator(&connections, &notifier, StaticFeatureFlags::new(true));
    catalogs.put_discovered(SourceId::new(SOURCE), discovered(&["id", "email"]))?;

    let reports = coordinator.apply_for_source(&SourceId::new(SOURCE))?;
    let ids: Vec<&str> = reports.iter().map(|report| report.connection_id.as_str()).collect();
    assert_eq!(ids, vec!["conn-active"]);
    let paused = connections.connection(&ConnectionId::new("conn-paused"))?;
    assert_eq!(paused.sync_catalog, users_catalog(&["id"]));
    Ok(())
}

#[test]
fn unknown_connection_is_reported() {
    let connections = InMemoryConnectionStore::new();
    let notifier = RecordingNotifier::new();
    let (coordinator, _) = schema_coordinator(&connections, &notifier, StaticFeatureFlags::new(true));
    let result = coordinator.apply_schema_change(&ConnectionId::new("missing"), &discovered(&["id"]));
    assert!(matches!(result, Err(CoordinatorError::Connection(ConnectionStoreError::NotFound(_)))));
}

// ============================================================================
// SECTION: Auto-Disable Coordinator
// ============================================================================

const NOW: i64 = 100 * SECONDS_PER_DAY;

fn record_hourly(history: &InMemoryJobHistory, id: &ConnectionId, statuses: &[JobStatus]) {
    for (index, status) in statuses.iter().enumerate() {
        let offset = i64::try_from(index).unwrap() * 3_600;
        let at = Timestamp::from_unix_seconds(NOW - offset);
        let job_id = 50 - u64::try_from(index).unwrap();
        history.record(id, JobOutcomeRecord::new(job_id, *status, at, at)).unwrap();
    }
}

fn auto_disable_setup(
    statuses: &[JobStatus],
    notifier: &RecordingNotifier,
) -> (AutoDisableCoordinator<InMemoryJobHistory, InMemoryConnectionStore, RecordingNotifier>, InMemoryConnectionStore) {
    let connections = InMemoryConnectionStore::new();
    connections
        .insert(connection("conn-1", ConnectionStatus::Active, NonBreakingChangesPreference::Ignore))
        .unwrap();
    let history = InMemoryJobHistory::new();
    record_hourly(&history, &ConnectionId::new("conn-1"), statuses);
    let coordinator = AutoDisableCoordinator::new(
        history,
        connections.clone(),
        notifier.clone(),
        AutoDisableLimits::new(4, 14),
    );
    (coordinator, connections)
}

#[test]
fn failure_streak_disables_and_notifies() -> Result<(), CoordinatorError> {
    use JobStatus::Failed;
    use JobStatus::Succeeded;
    let notifier = RecordingNotifier::new();
    let (coordinator, connections) =
        auto_disable_setup(&[Failed, Failed, Failed, Failed, Succeeded], &notifier);
    let id = ConnectionId::new("conn-1");

    let outcome = coordinator.check(&id, Timestamp::from_unix_seconds(NOW))?;
    assert!(outcome.disable());
    let stored = connections.connection(&id)?;
    assert_eq!(stored.status, ConnectionStatus::Inactive);
    assert_eq!(stored.status_reason, Some(StatusReason::TooManyConsecutiveFailedJobsInARow));
    assert_eq!(
        notifier.sent().unwrap(),
        vec![RecordedNotification::AutoDisabled {
            connection_id: id.clone(),
            reason: StatusReason::TooManyConsecutiveFailedJobsInARow,
            job_id: 50,
            delivery: NotificationDelivery::Configured,
        }]
    );

    let again = coordinator.check(&id, Timestamp::from_unix_seconds(NOW))?;
    assert_eq!(again, AutoDisableOutcome::None);
    Ok(())
}

#[test]
fn failed_notification_does_not_undo_disable() -> Result<(), CoordinatorError> {
    use JobStatus::Failed;
    let notifier = RecordingNotifier::failing();
    let (coordinator, connections) = auto_disable_setup(&[Failed, Failed, Failed, Failed], &notifier);
    let id = ConnectionId::new("conn-1");

    let outcome = coordinator.check(&id, Timestamp::from_unix_seconds(NOW))?;
    assert!(outcome.disable());
    assert_eq!(connections.connection(&id)?.status, ConnectionStatus::Inactive);
    Ok(())
}

#[test]
fn warning_forces_email_and_keeps_connection_active() -> Result<(), CoordinatorError> {
    use JobStatus::Failed;
    use JobStatus::Succeeded;
    let notifier = RecordingNotifier::new();
    let (coordinator, connections) = auto_disable_setup(&[Failed, Failed, Succeeded], &notifier);
    let id = ConnectionId::new("conn-1");

    let outcome = coordinator.check(&id, Timestamp::from_unix_seconds(NOW))?;
    assert_eq!(
        outcome,
        AutoDisableOutcome::Warn {
            reason: StatusReason::TooManyConsecutiveFailedJobsInARow,
        }
    );
    assert_eq!(connections.connection(&id)?.status, ConnectionStatus::Active);
    assert_eq!(
        notifier.sent().unwrap(),
        vec![RecordedNotification::DisableWarning {
            connection_id: id,
            reason: StatusReason::TooManyConsecutiveFailedJobsInARow,
            job_id: 50,
            delivery: NotificationDelivery::ForceEmail,
        }]
    );
    Ok(())
}

#[test]
fn missing_job_history_is_no_action() -> Result<(), CoordinatorError> {
    let notifier = RecordingNotifier::new();
    let (coordinator, connections) = auto_disable_setup(&[], &notifier);
    let id = ConnectionId::new("conn-1");

    let outcome = coordinator.check(&id, Timestamp::from_unix_seconds(NOW))?;
    assert_eq!(outcome, AutoDisableOutcome::None);
    assert_eq!(connections.connection(&id)?.status, ConnectionStatus::Active);
    assert!(notifier.sent().unwrap().is_empty());
    Ok(())
}
