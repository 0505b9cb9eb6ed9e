// crates/syncward-cli/src/logging.rs
// ============================================================================
// Module: Syncward CLI Logging
// Description: Installs the tracing subscriber for CLI runs.
// Purpose: Route structured engine logs to stderr in text or JSON form.
// Dependencies: syncward-config, tracing-subscriber
// ============================================================================

//! ## Overview
//! Logs always go to stderr so stdout carries only command output. `RUST_LOG`
//! takes precedence over the configured level.

use syncward_config::LogFormat;
use syncward_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns the subscriber error message when a global subscriber is already set.
pub(crate) fn init(config: &LoggingConfig) -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|err| err.to_string())
}
