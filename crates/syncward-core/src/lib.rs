// crates/syncward-core/src/lib.rs
// ============================================================================
// Module: Syncward Core Library
// Description: Public API surface for the Syncward core.
// Purpose: Expose catalog types, collaborator interfaces, and decision engines.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Syncward decides how a connection reacts to a changed source schema and to
//! a run of failed sync jobs. The catalog diff engine classifies schema
//! changes as breaking or non-breaking, the propagation policy merges the
//! changes a connection's preference allows, and the auto-disable engine
//! warns about or disables persistently failing connections. Engines are
//! deterministic and backend-agnostic; storage, job execution, and delivery
//! integrate through the traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::CatalogReadError;
pub use interfaces::CatalogReader;
pub use interfaces::ConnectionReader;
pub use interfaces::ConnectionStoreError;
pub use interfaces::ConnectionWriter;
pub use interfaces::DiscoveredCatalog;
pub use interfaces::FeatureFlagClient;
pub use interfaces::FlagContext;
pub use interfaces::JobHistoryError;
pub use interfaces::JobHistoryReader;
pub use interfaces::NotificationDelivery;
pub use interfaces::Notifier;
pub use interfaces::NotifyError;
pub use runtime::AUTO_PROPAGATE_FLAG_KEY;
pub use runtime::AutoDisableCoordinator;
pub use runtime::AutoDisableLimits;
pub use runtime::AutoDisableOutcome;
pub use runtime::CoordinatorError;
pub use runtime::FailureStreak;
pub use runtime::InMemoryCatalogStore;
pub use runtime::InMemoryConnectionStore;
pub use runtime::InMemoryJobHistory;
pub use runtime::RecordedNotification;
pub use runtime::RecordingNotifier;
pub use runtime::SchemaChangeCoordinator;
pub use runtime::SchemaChangeDecision;
pub use runtime::SchemaChangeReport;
pub use runtime::StaticFeatureFlags;
pub use runtime::UpdateSchemaResult;
pub use runtime::compute_diff;
pub use runtime::configuration_diff;
pub use runtime::decide_schema_change;
pub use runtime::default_configuration_for_new_stream;
pub use runtime::describe_diff;
pub use runtime::describe_transform;
pub use runtime::ensure_compatible_destination_sync_mode;
pub use runtime::evaluate;
pub use runtime::get_updated_schema;
pub use runtime::should_auto_propagate;
pub use runtime::warning_previously_sent;
