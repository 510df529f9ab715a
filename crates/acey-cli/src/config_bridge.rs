//! Bridge from `acey_config::Config` to telemetry and logger settings.

use std::path::Path;

use acey_audit::LoggerConfig;
use acey_config::Config;
use acey_telemetry::LogConfig;

/// Load the config file if one was given, otherwise defaults plus `ACEY_*` env vars.
pub(crate) fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_file(path)?,
        None => Config::from_toml_str("")?,
    };
    Ok(config)
}

/// Logging settings, with `--verbose` forcing debug.
pub(crate) fn to_log_config(config: &Config, verbose: bool) -> LogConfig {
    let mut log_config = LogConfig::from(&config.logging);
    if verbose {
        "debug".clone_into(&mut log_config.level);
    }
    log_config
}

/// Logger settings for inspecting an export.
///
/// The inspecting logger is never persisted, so it is mutable and starts in
/// standard mode; a signing key given on the command line wins over the file.
pub(crate) fn inspector_config(
    config: &Config,
    signature_key: Option<&str>,
) -> anyhow::Result<LoggerConfig> {
    let mut logger_config = LoggerConfig::from_section(&config.audit)?
        .with_mode(acey_audit::AuditMode::Standard)
        .with_immutable(false);
    if let Some(secret) = signature_key {
        logger_config = logger_config.with_signature_key(secret);
    }
    Ok(logger_config)
}
