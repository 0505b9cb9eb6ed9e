// crates/syncward-config/src/config.rs
// ============================================================================
// Module: Syncward Configuration
// Description: Configuration loading and validation for Syncward.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: syncward-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Resolution order is the explicit path, then `SYNCWARD_CONFIG`, then
//! `./syncward.toml`; when none of these apply the defaults are used.
//! Threshold environment overrides are applied after parsing and before
//! validation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use syncward_core::AUTO_PROPAGATE_FLAG_KEY;
use syncward_core::AutoDisableLimits;
use syncward_core::FeatureFlagClient;
use syncward_core::FlagContext;
use syncward_core::StaticFeatureFlags;
use syncward_core::WorkspaceId;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "syncward.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SYNCWARD_CONFIG";
/// Environment override for the day-based disable threshold.
pub const MAX_DAYS_ENV_VAR: &str = "SYNCWARD_MAX_DAYS_OF_ONLY_FAILED_JOBS";
/// Environment override for the failure-streak disable threshold.
pub const MAX_JOBS_ENV_VAR: &str = "SYNCWARD_MAX_FAILED_JOBS_IN_A_ROW";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of workspaces with propagation switched off.
pub(crate) const MAX_DISABLED_WORKSPACES: usize = 4096;
/// Default days of only failed jobs before a connection is disabled.
pub(crate) const DEFAULT_MAX_DAYS_OF_ONLY_FAILED_JOBS: u32 = 14;
/// Default consecutive failed jobs before a connection is disabled.
pub(crate) const DEFAULT_MAX_FAILED_JOBS_IN_A_ROW: u32 = 20;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Syncward configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncwardConfig {
    /// Auto-disable thresholds.
    #[serde(default)]
    pub auto_disable: AutoDisableConfig,
    /// Schema propagation gate.
    #[serde(default)]
    pub propagation: PropagationConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SyncwardConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading, overrides, or validation fail.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match resolve_path(path)? {
            Some(resolved) => Self::read(&resolved)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a config file without applying overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let file = File::open(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        let size = file.metadata().map_err(|err| ConfigError::Io(err.to_string()))?.len();
        let limit = u64::try_from(MAX_CONFIG_FILE_SIZE).unwrap_or(u64::MAX);
        if size > limit {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let mut bytes = Vec::new();
        file.take(limit.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies threshold overrides looked up by environment variable name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an override is not an unsigned integer.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(MAX_DAYS_ENV_VAR) {
            self.auto_disable.max_days_of_only_failed_jobs = parse_override(MAX_DAYS_ENV_VAR, &value)?;
        }
        if let Some(value) = lookup(MAX_JOBS_ENV_VAR) {
            self.auto_disable.max_failed_jobs_in_a_row = parse_override(MAX_JOBS_ENV_VAR, &value)?;
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auto_disable.validate()?;
        self.propagation.validate()?;
        Ok(())
    }

    /// Returns the auto-disable limits.
    #[must_use]
    pub const fn limits(&self) -> AutoDisableLimits {
        AutoDisableLimits::new(
            self.auto_disable.max_failed_jobs_in_a_row,
            self.auto_disable.max_days_of_only_failed_jobs,
        )
    }

    /// Returns true when automatic propagation is allowed for `workspace_id`.
    ///
    /// Evaluates `propagation.flag_key` against [`Self::feature_flags`].
    #[must_use]
    pub fn is_workspace_enabled(&self, workspace_id: &WorkspaceId) -> bool {
        self.feature_flags().bool_variation(
            &self.propagation.flag_key,
            &FlagContext::Workspace(workspace_id.clone()),
        )
    }

    /// Builds a feature flag client reflecting the propagation settings.
    #[must_use]
    pub fn feature_flags(&self) -> StaticFeatureFlags {
        self.propagation.disabled_workspaces.iter().fold(
            StaticFeatureFlags::new(self.propagation.auto_propagate_enabled),
            |flags, workspace_id| {
                flags.with_disabled(
                    &self.propagation.flag_key,
                    &FlagContext::Workspace(workspace_id.clone()),
                )
            },
        )
    }
}

/// Auto-disable thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoDisableConfig {
    /// Days of only failed jobs before a connection is disabled.
    pub max_days_of_only_failed_jobs: u32,
    /// Consecutive failed jobs before a connection is disabled.
    pub max_failed_jobs_in_a_row: u32,
}

impl Default for AutoDisableConfig {
    fn default() -> Self {
        Self {
            max_days_of_only_failed_jobs: DEFAULT_MAX_DAYS_OF_ONLY_FAILED_JOBS,
            max_failed_jobs_in_a_row: DEFAULT_MAX_FAILED_JOBS_IN_A_ROW,
        }
    }
}

impl AutoDisableConfig {
    /// Validates thresholds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_days_of_only_failed_jobs == 0 {
            return Err(ConfigError::Invalid(
                "auto_disable.max_days_of_only_failed_jobs must be at least 1".to_string(),
            ));
        }
        if self.max_failed_jobs_in_a_row == 0 {
            return Err(ConfigError::Invalid(
                "auto_disable.max_failed_jobs_in_a_row must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Workspace gate for automatic schema propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropagationConfig {
    /// Global switch for automatic propagation.
    pub auto_propagate_enabled: bool,
    /// Workspaces where propagation is switched off.
    pub disabled_workspaces: Vec<WorkspaceId>,
    /// Feature flag key consulted per workspace.
    pub flag_key: String,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            auto_propagate_enabled: true,
            disabled_workspaces: Vec::new(),
            flag_key: AUTO_PROPAGATE_FLAG_KEY.to_string(),
        }
    }
}

impl PropagationConfig {
    /// Validates the workspace gate.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.flag_key.trim().is_empty() {
            return Err(ConfigError::Invalid("propagation.flag_key must be non-empty".to_string()));
        }
        if self.disabled_workspaces.len() > MAX_DISABLED_WORKSPACES {
            return Err(ConfigError::Invalid(
                "too many propagation.disabled_workspaces entries".to_string(),
            ));
        }
        if self.disabled_workspaces.iter().any(|workspace| workspace.as_str().trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "propagation.disabled_workspaces entries must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level emitted when `RUST_LOG` is unset.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Debug detail.
    Debug,
    /// Decisions and lifecycle events.
    #[default]
    Info,
    /// Recoverable failures.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Returns the filter directive for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI, environment, or the working directory.
///
/// Returns `None` when no path was requested and the default file is absent.
fn resolve_path(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default_path = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default_path.is_file().then_some(default_path))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Parses an unsigned threshold override.
fn parse_override(name: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::Invalid(format!("{name} must be an unsigned integer")))
}
