// crates/syncward-cli/src/main_tests.rs
// ============================================================================
// Module: Syncward CLI Unit Tests
// Description: Unit tests for argument parsing, bounded reads, and reports.
// Purpose: Validate command wiring without spawning the binary.
// Dependencies: syncward-cli, syncward-core, tempfile
// ============================================================================

//! ## Overview
//! Exercises the pure report builders and input helpers used by each command.

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

use std::io::Write;

use clap::Parser;
use serde_json::json;
use syncward_config::SyncwardConfig;
use syncward_core::AutoDisableLimits;
use syncward_core::AutoDisableOutcome;
use syncward_core::Catalog;
use syncward_core::CatalogEntry;
use syncward_core::ConnectionStatus;
use syncward_core::DestinationSyncMode;
use syncward_core::JobOutcomeRecord;
use syncward_core::JobStatus;
use syncward_core::NonBreakingChangesPreference;
use syncward_core::SchemaChangeDecision;
use syncward_core::StatusReason;
use syncward_core::Stream;
use syncward_core::StreamConfiguration;
use syncward_core::StreamDescriptor;
use syncward_core::Timestamp;

use super::Cli;
use super::Commands;
use super::PreferenceArg;
use super::ReadLimitError;
use super::StatusArg;
use super::auto_disable_report;
use super::canonical_json_bytes;
use super::diff_report;
use super::propagate_report;
use super::read_bytes_with_limit;
use super::resolve_workspace_flag;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const HOUR: i64 = 3_600;
const NOW: i64 = 90 * 24 * HOUR;

fn users_catalog(fields: &[&str]) -> Catalog {
    let properties: serde_json::Map<String, serde_json::Value> =
        fields.iter().map(|field| ((*field).to_string(), json!({"type": "string"}))).collect();
    let stream = Stream::new(
        StreamDescriptor::named("users"),
        json!({"type": "object", "properties": properties}),
    );
    Catalog::new(vec![CatalogEntry {
        stream,
        config: StreamConfiguration {
            selected: true,
            ..StreamConfiguration::default()
        },
    }])
}

fn failed_hourly(count: i64) -> Vec<JobOutcomeRecord> {
    (0..count)
        .map(|index| {
            let at = Timestamp::from_unix_seconds(NOW - index * HOUR);
            JobOutcomeRecord::new(u64::try_from(count - index).unwrap(), JobStatus::Failed, at, at)
        })
        .collect()
}

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

#[test]
fn propagate_arguments_parse_mode_lists() {
    let cli = Cli::try_parse_from([
        "syncward",
        "propagate",
        "--current",
        "current.json",
        "--new",
        "new.json",
        "--preference",
        "propagate-columns",
        "--destination-modes",
        "append,overwrite",
        "--workspace",
        "ws-1",
        "--workspace-flag",
        "false",
    ])
    .unwrap();
    let Commands::Propagate(command) = cli.command else {
        panic!("expected propagate command");
    };
    assert_eq!(command.preference, PreferenceArg::PropagateColumns);
    assert_eq!(command.destination_modes.len(), 2);
    assert_eq!(command.workspace.as_deref(), Some("ws-1"));
    assert_eq!(command.workspace_flag, Some(false));
}

#[test]
fn auto_disable_status_defaults_to_active() {
    let cli = Cli::try_parse_from([
        "syncward",
        "--config",
        "custom.toml",
        "auto-disable",
        "--jobs",
        "jobs.json",
    ])
    .unwrap();
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("custom.toml")));
    let Commands::AutoDisable(command) = cli.command else {
        panic!("expected auto-disable command");
    };
    assert_eq!(command.status, StatusArg::Active);
    assert!(command.now.is_none());
}

#[test]
fn unknown_preference_is_rejected() {
    let result = Cli::try_parse_from([
        "syncward",
        "propagate",
        "--current",
        "a.json",
        "--new",
        "b.json",
        "--preference",
        "always",
    ]);
    assert!(result.is_err());
}

// ============================================================================
// SECTION: Bounded Reads
// ============================================================================

#[test]
fn read_bytes_with_limit_accepts_small_files() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{\"streams\": []}").unwrap();
    let bytes = read_bytes_with_limit(file.path(), 64).unwrap();
    assert_eq!(bytes, b"{\"streams\": []}");
}

#[test]
fn read_bytes_with_limit_rejects_oversized_files() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[b'x'; 32]).unwrap();
    let err = read_bytes_with_limit(file.path(), 16).unwrap_err();
    assert!(matches!(
        err,
        ReadLimitError::TooLarge {
            size: 32,
            limit: 16
        }
    ));
}

#[test]
fn read_bytes_with_limit_reports_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_bytes_with_limit(&dir.path().join("missing.json"), 16).unwrap_err();
    assert!(matches!(err, ReadLimitError::Io(_)));
}

// ============================================================================
// SECTION: Reports
// ============================================================================

#[test]
fn diff_report_describes_field_changes() {
    let old = users_catalog(&["id", "name"]);
    let new = users_catalog(&["id", "email"]);
    let report = diff_report(&old, &new, None).unwrap();
    assert!(report.breaking);
    assert_eq!(
        report.descriptions,
        vec!["Modified stream 'users': Added fields ['email'], Removed fields ['name']".to_string()]
    );
}

#[test]
fn propagate_report_applies_added_fields() {
    let current = users_catalog(&["id"]);
    let new = users_catalog(&["id", "email"]);
    let report = propagate_report(
        &current,
        &new,
        NonBreakingChangesPreference::PropagateColumns,
        &[DestinationSyncMode::Overwrite],
        true,
    )
    .unwrap();
    assert_eq!(report.decision, SchemaChangeDecision::Propagate);
    let result = report.result.unwrap();
    assert_eq!(result.applied_diff.len(), 1);
    assert_eq!(result.catalog, new);
}

#[test]
fn propagate_report_respects_workspace_flag() {
    let current = users_catalog(&["id"]);
    let new = users_catalog(&["id", "email"]);
    let report = propagate_report(
        &current,
        &new,
        NonBreakingChangesPreference::PropagateFully,
        &[DestinationSyncMode::Overwrite],
        false,
    )
    .unwrap();
    assert_eq!(report.decision, SchemaChangeDecision::NotifyOnly);
    assert!(report.result.is_none());
}

#[test]
fn disabled_workspace_blocks_propagation() {
    let config = SyncwardConfig::from_toml_str(
        "[propagation]\ndisabled_workspaces = [\"ws-blocked\"]\nflag_key = \"custom-flag\"\n",
    )
    .unwrap();
    assert!(!resolve_workspace_flag(None, Some("ws-blocked"), &config));
    assert!(resolve_workspace_flag(None, Some("ws-open"), &config));
    assert!(resolve_workspace_flag(None, None, &config));
    assert!(resolve_workspace_flag(Some(true), Some("ws-blocked"), &config));

    let current = users_catalog(&["id"]);
    let new = users_catalog(&["id", "email"]);
    let report = propagate_report(
        &current,
        &new,
        NonBreakingChangesPreference::PropagateColumns,
        &[DestinationSyncMode::Overwrite],
        resolve_workspace_flag(None, Some("ws-blocked"), &config),
    )
    .unwrap();
    assert_eq!(report.decision, SchemaChangeDecision::NotifyOnly);
    assert!(report.result.is_none());
}

#[test]
fn global_switch_applies_without_workspace() {
    let config =
        SyncwardConfig::from_toml_str("[propagation]\nauto_propagate_enabled = false\n").unwrap();
    assert!(!resolve_workspace_flag(None, None, &config));
    assert!(!resolve_workspace_flag(None, Some("ws-open"), &config));
    assert!(resolve_workspace_flag(Some(true), None, &config));
}

#[test]
fn auto_disable_report_counts_streak() {
    let jobs = failed_hourly(5);
    let limits = AutoDisableLimits::new(5, 14);
    let report = auto_disable_report(
        ConnectionStatus::Active,
        &jobs,
        jobs.last(),
        Timestamp::from_unix_seconds(NOW),
        limits,
    );
    assert_eq!(report.consecutive_failures, 5);
    assert_eq!(
        report.outcome,
        AutoDisableOutcome::Disable {
            reason: StatusReason::TooManyConsecutiveFailedJobsInARow
        }
    );
}

#[test]
fn canonical_output_sorts_keys() {
    let bytes = canonical_json_bytes(&json!({"b": 1, "a": [true]})).unwrap();
    assert_eq!(bytes, br#"{"a":[true],"b":1}"#);
}
