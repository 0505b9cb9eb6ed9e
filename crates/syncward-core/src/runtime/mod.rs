// crates/syncward-core/src/runtime/mod.rs
// ============================================================================
// Module: Syncward Runtime
// Description: Decision engines, coordinators, and in-memory collaborators.
// Purpose: Turn catalog and job snapshots into propagation and health decisions.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! The diff, propagation, and auto-disable engines are pure functions: given
//! identical inputs they return identical outputs and perform no I/O. The
//! coordinators bracket them with collaborator reads and writes.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod auto_disable;
pub mod coordinator;
pub mod describe;
pub mod diff;
pub mod propagation;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auto_disable::AutoDisableLimits;
pub use auto_disable::AutoDisableOutcome;
pub use auto_disable::FailureStreak;
pub use auto_disable::evaluate;
pub use auto_disable::warning_previously_sent;
pub use coordinator::AUTO_PROPAGATE_FLAG_KEY;
pub use coordinator::AutoDisableCoordinator;
pub use coordinator::CoordinatorError;
pub use coordinator::SchemaChangeCoordinator;
pub use coordinator::SchemaChangeReport;
pub use describe::describe_diff;
pub use describe::describe_transform;
pub use diff::compute_diff;
pub use diff::configuration_diff;
pub use propagation::SchemaChangeDecision;
pub use propagation::UpdateSchemaResult;
pub use propagation::decide_schema_change;
pub use propagation::default_configuration_for_new_stream;
pub use propagation::ensure_compatible_destination_sync_mode;
pub use propagation::get_updated_schema;
pub use propagation::should_auto_propagate;
pub use store::InMemoryCatalogStore;
pub use store::InMemoryConnectionStore;
pub use store::InMemoryJobHistory;
pub use store::RecordedNotification;
pub use store::RecordingNotifier;
pub use store::StaticFeatureFlags;
