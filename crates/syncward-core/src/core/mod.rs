// crates/syncward-core/src/core/mod.rs
// ============================================================================
// Module: Syncward Core Types
// Description: Plain data model for catalogs, diffs, connections, and jobs.
// Purpose: Share one deterministic vocabulary across engines and collaborators.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types carry no behavior beyond construction helpers and validation.
//! Engines in [`crate::runtime`] consume them; collaborators in
//! [`crate::interfaces`] produce and persist them.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod catalog;
pub mod connection;
pub mod diff;
pub mod identifiers;
pub mod job;
pub mod schema;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::Catalog;
pub use catalog::CatalogEntry;
pub use catalog::CatalogError;
pub use catalog::DestinationSyncMode;
pub use catalog::FieldPath;
pub use catalog::Stream;
pub use catalog::StreamConfiguration;
pub use catalog::StreamDescriptor;
pub use catalog::SyncMode;
pub use catalog::primary_key_set;
pub use connection::ConnectionPatch;
pub use connection::ConnectionSnapshot;
pub use connection::ConnectionStatus;
pub use connection::NonBreakingChangesPreference;
pub use connection::StatusReason;
pub use diff::CatalogDiff;
pub use diff::FieldTransform;
pub use diff::FieldTransformKind;
pub use diff::StreamAttributeChange;
pub use diff::StreamAttributeTransform;
pub use diff::StreamTransform;
pub use identifiers::CatalogId;
pub use identifiers::ConnectionId;
pub use identifiers::SourceId;
pub use identifiers::WorkspaceId;
pub use job::JobOutcomeRecord;
pub use job::JobStatus;
pub use schema::FieldShape;
pub use schema::flatten_fields;
pub use time::SECONDS_PER_DAY;
pub use time::Timestamp;
