// crates/syncward-core/src/core/job.rs
// ============================================================================
// Module: Syncward Job History
// Description: Immutable job outcome records read by the health engine.
// Purpose: Model replication job outcomes without persistence details.
// Dependencies: serde, crate::core::time
// ============================================================================

//! ## Overview
//! Job outcome records are historical facts owned by the job subsystem.
//! Readers return them most-recent-first; the health engine never re-sorts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Job Records
// ============================================================================

/// Terminal or in-flight status of a replication job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Queued and not started.
    Pending,
    /// Currently running.
    Running,
    /// Attempt failed and will be retried.
    Incomplete,
    /// Finished unsuccessfully.
    Failed,
    /// Finished successfully.
    Succeeded,
    /// Cancelled by a user or the system.
    Cancelled,
}

/// Outcome of one replication job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcomeRecord {
    /// Job identifier.
    #[serde(default)]
    pub job_id: u64,
    /// Job status.
    pub status: JobStatus,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

impl JobOutcomeRecord {
    /// Creates a job record.
    #[must_use]
    pub const fn new(
        job_id: u64,
        status: JobStatus,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            job_id,
            status,
            created_at,
            updated_at,
        }
    }

    /// Returns true for failed jobs.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == JobStatus::Failed
    }

    /// Returns true for succeeded jobs.
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        self.status == JobStatus::Succeeded
    }
}
