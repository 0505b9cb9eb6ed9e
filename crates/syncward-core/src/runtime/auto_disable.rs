// crates/syncward-core/src/runtime/auto_disable.rs
// ============================================================================
// Module: Syncward Auto-Disable Engine
// Description: Classifies a connection's recent job history as healthy, at risk, or failing.
// Purpose: Decide when to warn about or disable a connection after sustained failure.
// Dependencies: crate::core, serde, tracing
// ============================================================================

//! ## Overview
//! [`evaluate`] walks a connection's replication jobs (most recent first) and
//! counts consecutive failures up to the most recent success. Two limits
//! apply: a maximum failure streak and a maximum number of days with only
//! failed jobs. Reaching half of either limit produces a warning; reaching
//! the limit disables the connection.
//!
//! Warning state is not persisted. [`warning_previously_sent`] re-derives
//! whether the current streak already crossed the day-based warning threshold
//! at the previous failure, so a streak warns at most once.
//!
//! Preconditions:
//! - `jobs` is sorted most-recent-first by creation time and restricted to
//!   replication jobs inside the day window; the engine does not re-sort.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::core::ConnectionStatus;
use crate::core::JobOutcomeRecord;
use crate::core::StatusReason;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Limits and Outcomes
// ============================================================================

/// Thresholds for automatic disabling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoDisableLimits {
    /// Consecutive failures that disable a connection.
    pub max_failed_jobs_in_a_row: u32,
    /// Days of only failed jobs that disable a connection.
    pub max_days_of_only_failed_jobs: u32,
}

impl AutoDisableLimits {
    /// Creates limits.
    #[must_use]
    pub const fn new(max_failed_jobs_in_a_row: u32, max_days_of_only_failed_jobs: u32) -> Self {
        Self {
            max_failed_jobs_in_a_row,
            max_days_of_only_failed_jobs,
        }
    }

    /// Failure streak that triggers a warning (half the limit, rounded down).
    #[must_use]
    pub const fn warn_jobs(&self) -> u32 {
        self.max_failed_jobs_in_a_row / 2
    }

    /// Failing days that trigger a warning (half the limit, rounded down).
    #[must_use]
    pub const fn warn_days(&self) -> u32 {
        self.max_days_of_only_failed_jobs / 2
    }
}

/// Decision produced by [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AutoDisableOutcome {
    /// No action.
    None,
    /// Warn the user; the connection stays active.
    Warn {
        /// Threshold that was approached.
        reason: StatusReason,
    },
    /// Deactivate the connection.
    Disable {
        /// Threshold that was reached.
        reason: StatusReason,
    },
}

impl AutoDisableOutcome {
    /// Returns true when the connection must be disabled.
    #[must_use]
    pub const fn disable(&self) -> bool {
        matches!(self, Self::Disable { .. })
    }

    /// Returns true when a warning must be sent.
    #[must_use]
    pub const fn warn(&self) -> bool {
        matches!(self, Self::Warn { .. })
    }

    /// Returns the reason attached to a warning or disable.
    #[must_use]
    pub const fn reason(&self) -> Option<StatusReason> {
        match self {
            Self::None => None,
            Self::Warn {
                reason,
            }
            | Self::Disable {
                reason,
            } => Some(*reason),
        }
    }
}

/// Consecutive failures counted from the most recent job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureStreak {
    /// Failed jobs before the most recent success.
    pub failures: u32,
    /// Update time of the most recent success, if any.
    pub last_success: Option<Timestamp>,
}

impl FailureStreak {
    /// Counts failed jobs until the first success; other statuses are skipped.
    #[must_use]
    pub fn scan(jobs: &[JobOutcomeRecord]) -> Self {
        let mut failures: u32 = 0;
        for job in jobs {
            if job.is_failed() {
                failures = failures.saturating_add(1);
            } else if job.is_succeeded() {
                return Self {
                    failures,
                    last_success: Some(job.updated_at),
                };
            }
        }
        Self {
            failures,
            last_success: None,
        }
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates a connection's job history against `limits` at time `now`.
///
/// Inactive connections and connections without a first job yield
/// [`AutoDisableOutcome::None`].
#[must_use]
pub fn evaluate(
    status: ConnectionStatus,
    jobs: &[JobOutcomeRecord],
    first_job: Option<&JobOutcomeRecord>,
    now: Timestamp,
    limits: &AutoDisableLimits,
) -> AutoDisableOutcome {
    if status != ConnectionStatus::Active {
        return AutoDisableOutcome::None;
    }
    let Some(first_job) = first_job else {
        return AutoDisableOutcome::None;
    };

    let streak = FailureStreak::scan(jobs);
    let previously_warned = warning_previously_sent(jobs, &streak, first_job, limits);

    if streak.failures == 0 {
        return AutoDisableOutcome::None;
    }
    if streak.failures >= limits.max_failed_jobs_in_a_row {
        return AutoDisableOutcome::Disable {
            reason: StatusReason::TooManyConsecutiveFailedJobsInARow,
        };
    }
    if streak.failures == limits.warn_jobs() && !previously_warned {
        return AutoDisableOutcome::Warn {
            reason: StatusReason::TooManyConsecutiveFailedJobsInARow,
        };
    }

    // Day-based checks measure from the first job's creation.
    let days_since_first_job = now.whole_days_since(first_job.created_at);
    if days_since_first_job >= i64::from(limits.max_days_of_only_failed_jobs)
        && streak.last_success.is_none()
    {
        return AutoDisableOutcome::Disable {
            reason: StatusReason::OnlyFailedJobsRecently,
        };
    }

    if previously_warned || streak.failures > limits.warn_jobs() {
        debug!(failures = streak.failures, "disable warning already sent for this streak");
        return AutoDisableOutcome::None;
    }

    let warn_days = i64::from(limits.warn_days());
    let success_is_stale =
        streak.last_success.is_none_or(|success| now.whole_days_since(success) >= warn_days);
    if days_since_first_job >= warn_days && success_is_stale {
        return AutoDisableOutcome::Warn {
            reason: StatusReason::OnlyFailedJobsRecently,
        };
    }
    AutoDisableOutcome::None
}

/// Returns true when the day-based warning already fired for the current streak.
///
/// Looks at the previous failed job (skipping the most recent one) and checks
/// whether it was already at least `warn_days` past the last success, or past
/// the first job when no success exists.
#[must_use]
pub fn warning_previously_sent(
    jobs: &[JobOutcomeRecord],
    streak: &FailureStreak,
    first_job: &JobOutcomeRecord,
    limits: &AutoDisableLimits,
) -> bool {
    if streak.failures <= 1 || jobs.len() <= 1 {
        return false;
    }
    let Some(previous_failure) =
        jobs.iter().skip(1).find(|job| job.is_failed()).or_else(|| jobs.last())
    else {
        return false;
    };
    let baseline = streak.last_success.unwrap_or(first_job.updated_at);
    previous_failure.updated_at.whole_days_since(baseline) >= i64::from(limits.warn_days())
}
