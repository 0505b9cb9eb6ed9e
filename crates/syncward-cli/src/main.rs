// crates/syncward-cli/src/main.rs
// ============================================================================
// Module: Syncward CLI Entry Point
// Description: Command dispatcher for catalog diffing, propagation, and auto-disable checks.
// Purpose: Run the Syncward engines over JSON inputs and emit canonical JSON.
// Dependencies: clap, serde, serde_jcs, syncward-config, syncward-core, thiserror, time, tracing
// ============================================================================

//! ## Overview
//! The Syncward CLI evaluates the engines offline. Every command reads JSON
//! inputs with a hard size limit and writes one canonical JSON document to
//! stdout. Errors are written to stderr and yield a failure exit code.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod logging;
#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use serde::de::DeserializeOwned;
use syncward_config::SyncwardConfig;
use syncward_core::AutoDisableLimits;
use syncward_core::AutoDisableOutcome;
use syncward_core::Catalog;
use syncward_core::CatalogDiff;
use syncward_core::CatalogError;
use syncward_core::ConnectionStatus;
use syncward_core::DestinationSyncMode;
use syncward_core::FailureStreak;
use syncward_core::JobOutcomeRecord;
use syncward_core::NonBreakingChangesPreference;
use syncward_core::SchemaChangeDecision;
use syncward_core::StreamDescriptor;
use syncward_core::Timestamp;
use syncward_core::UpdateSchemaResult;
use syncward_core::WorkspaceId;
use syncward_core::compute_diff;
use syncward_core::configuration_diff;
use syncward_core::decide_schema_change;
use syncward_core::describe_diff;
use syncward_core::evaluate;
use syncward_core::get_updated_schema;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a catalog JSON input.
const MAX_CATALOG_BYTES: usize = 16 * 1024 * 1024;
/// Maximum size of a job history JSON input.
const MAX_JOBS_BYTES: usize = 8 * 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "syncward", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to `SYNCWARD_CONFIG` or ./syncward.toml).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Diff two discovered catalogs.
    Diff(DiffCommand),
    /// List selected streams whose sync settings changed.
    ConfigDiff(ConfigDiffCommand),
    /// Decide and apply a schema change to a sync catalog.
    Propagate(PropagateCommand),
    /// Evaluate a job history against the auto-disable limits.
    AutoDisable(AutoDisableCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `diff`.
#[derive(Args, Debug)]
struct DiffCommand {
    /// Previous catalog JSON.
    #[arg(long, value_name = "FILE")]
    old: PathBuf,
    /// Newly discovered catalog JSON.
    #[arg(long, value_name = "FILE")]
    new: PathBuf,
    /// Configured catalog JSON (defaults to the previous catalog).
    #[arg(long, value_name = "FILE")]
    configured: Option<PathBuf>,
}

/// Arguments for `config-diff`.
#[derive(Args, Debug)]
struct ConfigDiffCommand {
    /// Previous configured catalog JSON.
    #[arg(long, value_name = "FILE")]
    old: PathBuf,
    /// New configured catalog JSON.
    #[arg(long, value_name = "FILE")]
    new: PathBuf,
}

/// Arguments for `propagate`.
#[derive(Args, Debug)]
struct PropagateCommand {
    /// Current sync catalog JSON.
    #[arg(long, value_name = "FILE")]
    current: PathBuf,
    /// Newly discovered catalog JSON.
    #[arg(long, value_name = "FILE")]
    new: PathBuf,
    /// Preference for non-breaking changes.
    #[arg(long, value_enum)]
    preference: PreferenceArg,
    /// Destination sync modes the destination supports.
    #[arg(long = "destination-modes", value_enum, value_delimiter = ',')]
    destination_modes: Vec<DestinationModeArg>,
    /// Workspace evaluated against the configured propagation gate.
    #[arg(long, value_name = "ID")]
    workspace: Option<String>,
    /// Workspace auto-propagation flag; overrides the configured gate.
    #[arg(long = "workspace-flag", value_name = "BOOL")]
    workspace_flag: Option<bool>,
}

/// Arguments for `auto-disable`.
#[derive(Args, Debug)]
struct AutoDisableCommand {
    /// Job history JSON array, most recent first.
    #[arg(long, value_name = "FILE")]
    jobs: PathBuf,
    /// Evaluation time in unix seconds (defaults to now).
    #[arg(long, value_name = "SECS")]
    now: Option<i64>,
    /// Connection status.
    #[arg(long, value_enum, default_value = "active")]
    status: StatusArg,
    /// First job ever run for the connection (defaults to the oldest listed job).
    #[arg(long = "first-job", value_name = "FILE")]
    first_job: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the resolved configuration.
    Validate,
    /// Print the effective configuration.
    Show,
}

/// Non-breaking change preference argument.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum PreferenceArg {
    /// Notify only.
    Ignore,
    /// Disable on any change.
    Disable,
    /// Propagate field changes.
    PropagateColumns,
    /// Propagate field changes and new streams.
    PropagateFully,
}

impl From<PreferenceArg> for NonBreakingChangesPreference {
    fn from(value: PreferenceArg) -> Self {
        match value {
            PreferenceArg::Ignore => Self::Ignore,
            PreferenceArg::Disable => Self::Disable,
            PreferenceArg::PropagateColumns => Self::PropagateColumns,
            PreferenceArg::PropagateFully => Self::PropagateFully,
        }
    }
}

/// Destination sync mode argument.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum DestinationModeArg {
    /// Append records.
    Append,
    /// Replace the table.
    Overwrite,
    /// Append and deduplicate by primary key.
    AppendDedup,
    /// Replace and deduplicate by primary key.
    OverwriteDedup,
}

impl From<DestinationModeArg> for DestinationSyncMode {
    fn from(value: DestinationModeArg) -> Self {
        match value {
            DestinationModeArg::Append => Self::Append,
            DestinationModeArg::Overwrite => Self::Overwrite,
            DestinationModeArg::AppendDedup => Self::AppendDedup,
            DestinationModeArg::OverwriteDedup => Self::OverwriteDedup,
        }
    }
}

/// Connection status argument.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum StatusArg {
    /// Syncs are scheduled.
    Active,
    /// Syncs are paused.
    Inactive,
    /// Connection is retired.
    Deprecated,
}

impl From<StatusArg> for ConnectionStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Active => Self::Active,
            StatusArg::Inactive => Self::Inactive,
            StatusArg::Deprecated => Self::Deprecated,
        }
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Output of `diff`.
#[derive(Debug, Serialize)]
struct DiffReport {
    /// Detected transforms.
    diff: CatalogDiff,
    /// Whether any transform is breaking.
    breaking: bool,
    /// One description per transform.
    descriptions: Vec<String>,
}

/// Output of `config-diff`.
#[derive(Debug, Serialize)]
struct ConfigDiffReport {
    /// Streams whose sync settings changed.
    changed_streams: BTreeSet<StreamDescriptor>,
}

/// Output of `propagate`.
#[derive(Debug, Serialize)]
struct PropagateReport {
    /// Decision for the detected change.
    decision: SchemaChangeDecision,
    /// Detected transforms.
    diff: CatalogDiff,
    /// Merge result when the change is propagated.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<UpdateSchemaResult>,
}

/// Output of `auto-disable`.
#[derive(Debug, Serialize)]
struct AutoDisableReport {
    /// Engine decision.
    outcome: AutoDisableOutcome,
    /// Consecutive failures since the last success.
    consecutive_failures: u32,
    /// Limits the history was judged against.
    limits: AutoDisableLimits,
}

/// Output of `config validate`.
#[derive(Debug, Serialize)]
struct ConfigValidReport {
    /// Always `valid`; invalid configs fail before output.
    status: &'static str,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

impl From<CatalogError> for CliError {
    fn from(err: CatalogError) -> Self {
        Self::new(format!("invalid catalog: {err}"))
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors raised while reading bounded inputs.
#[derive(Debug, Error)]
enum ReadLimitError {
    /// I/O failure.
    #[error("{0}")]
    Io(std::io::Error),
    /// Input exceeds the size limit.
    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = SyncwardConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(err.to_string()))?;
    logging::init(&config.logging).map_err(|err| CliError::new(format!("logging init failed: {err}")))?;
    debug!(command = command_name(&cli.command), "dispatching command");

    match cli.command {
        Commands::Diff(command) => command_diff(&command),
        Commands::ConfigDiff(command) => command_config_diff(&command),
        Commands::Propagate(command) => command_propagate(&command, &config),
        Commands::AutoDisable(command) => command_auto_disable(&command, &config),
        Commands::Config {
            command,
        } => command_config(&command, &config),
    }
}

/// Returns the subcommand label used in logs.
const fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Diff(_) => "diff",
        Commands::ConfigDiff(_) => "config-diff",
        Commands::Propagate(_) => "propagate",
        Commands::AutoDisable(_) => "auto-disable",
        Commands::Config {
            ..
        } => "config",
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs `diff`.
fn command_diff(command: &DiffCommand) -> CliResult<ExitCode> {
    let old: Catalog = read_json(&command.old, "old catalog", MAX_CATALOG_BYTES)?;
    let new: Catalog = read_json(&command.new, "new catalog", MAX_CATALOG_BYTES)?;
    let configured = match &command.configured {
        Some(path) => Some(read_json::<Catalog>(path, "configured catalog", MAX_CATALOG_BYTES)?),
        None => None,
    };
    let report = diff_report(&old, &new, configured.as_ref())?;
    write_canonical_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the `diff` report; the previous catalog doubles as configuration when none is given.
fn diff_report(old: &Catalog, new: &Catalog, configured: Option<&Catalog>) -> CliResult<DiffReport> {
    let diff = compute_diff(old, new, configured.unwrap_or(old))?;
    Ok(DiffReport {
        breaking: diff.contains_breaking_change(),
        descriptions: describe_diff(&diff),
        diff,
    })
}

/// Runs `config-diff`.
fn command_config_diff(command: &ConfigDiffCommand) -> CliResult<ExitCode> {
    let old: Catalog = read_json(&command.old, "old catalog", MAX_CATALOG_BYTES)?;
    let new: Catalog = read_json(&command.new, "new catalog", MAX_CATALOG_BYTES)?;
    let report = ConfigDiffReport {
        changed_streams: configuration_diff(&old, &new)?,
    };
    write_canonical_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Runs `propagate`.
fn command_propagate(command: &PropagateCommand, config: &SyncwardConfig) -> CliResult<ExitCode> {
    let current: Catalog = read_json(&command.current, "current catalog", MAX_CATALOG_BYTES)?;
    let new: Catalog = read_json(&command.new, "new catalog", MAX_CATALOG_BYTES)?;
    let modes: Vec<DestinationSyncMode> =
        command.destination_modes.iter().copied().map(DestinationSyncMode::from).collect();
    let workspace_flag =
        resolve_workspace_flag(command.workspace_flag, command.workspace.as_deref(), config);
    let report =
        propagate_report(&current, &new, command.preference.into(), &modes, workspace_flag)?;
    write_canonical_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Resolves the auto-propagation flag for `propagate`.
///
/// An explicit flag wins. A workspace is checked against the configured
/// flag key and disabled workspaces; otherwise the global switch applies.
fn resolve_workspace_flag(
    explicit: Option<bool>,
    workspace: Option<&str>,
    config: &SyncwardConfig,
) -> bool {
    let resolved = explicit.unwrap_or_else(|| match workspace {
        Some(workspace) => config.is_workspace_enabled(&WorkspaceId::new(workspace)),
        None => config.propagation.auto_propagate_enabled,
    });
    debug!(workspace = workspace.unwrap_or("-"), enabled = resolved, "resolved auto-propagation flag");
    resolved
}

/// Builds the `propagate` report.
fn propagate_report(
    current: &Catalog,
    new: &Catalog,
    preference: NonBreakingChangesPreference,
    destination_modes: &[DestinationSyncMode],
    workspace_flag: bool,
) -> CliResult<PropagateReport> {
    let diff = compute_diff(current, new, current)?;
    let decision = decide_schema_change(&diff, preference, workspace_flag);
    let result = (decision == SchemaChangeDecision::Propagate).then(|| {
        get_updated_schema(current, new, &diff.transforms, preference, destination_modes)
    });
    Ok(PropagateReport {
        decision,
        diff,
        result,
    })
}

/// Runs `auto-disable`.
fn command_auto_disable(
    command: &AutoDisableCommand,
    config: &SyncwardConfig,
) -> CliResult<ExitCode> {
    let jobs: Vec<JobOutcomeRecord> = read_json(&command.jobs, "job history", MAX_JOBS_BYTES)?;
    let first_job = match &command.first_job {
        Some(path) => Some(read_json::<JobOutcomeRecord>(path, "first job", MAX_JOBS_BYTES)?),
        None => jobs.last().cloned(),
    };
    let now = Timestamp::from_unix_seconds(
        command.now.unwrap_or_else(|| OffsetDateTime::now_utc().unix_timestamp()),
    );
    let report =
        auto_disable_report(command.status.into(), &jobs, first_job.as_ref(), now, config.limits());
    write_canonical_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the `auto-disable` report.
fn auto_disable_report(
    status: ConnectionStatus,
    jobs: &[JobOutcomeRecord],
    first_job: Option<&JobOutcomeRecord>,
    now: Timestamp,
    limits: AutoDisableLimits,
) -> AutoDisableReport {
    AutoDisableReport {
        outcome: evaluate(status, jobs, first_job, now, &limits),
        consecutive_failures: FailureStreak::scan(jobs).failures,
        limits,
    }
}

/// Runs `config` subcommands.
fn command_config(command: &ConfigCommand, config: &SyncwardConfig) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => write_canonical_json(&ConfigValidReport {
            status: "valid",
        })?,
        ConfigCommand::Show => write_canonical_json(config)?,
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads and parses a bounded JSON input.
fn read_json<T: DeserializeOwned>(path: &Path, kind: &str, max_bytes: usize) -> CliResult<T> {
    let bytes = read_bytes_with_limit(path, max_bytes).map_err(|err| {
        CliError::new(format!("failed to read {kind} {}: {err}", path.display()))
    })?;
    serde_json::from_slice(&bytes).map_err(|err| {
        CliError::new(format!("failed to parse {kind} {}: {err}", path.display()))
    })
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes canonical JSON to stdout followed by a newline.
fn write_canonical_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = canonical_json_bytes(value)?;
    bytes.push(b'\n');
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Serializes a value as RFC 8785 canonical JSON.
fn canonical_json_bytes<T: Serialize>(value: &T) -> CliResult<Vec<u8>> {
    serde_jcs::to_vec(value).map_err(|err| CliError::new(format!("failed to serialize output: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
