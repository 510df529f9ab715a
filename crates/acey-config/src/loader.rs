//! Config file loading.
//!
//! 1. Read and parse the TOML file
//! 2. Apply `ACEY_*` env var fallbacks for unset fields
//! 3. Deserialize into [`Config`] (missing sections take defaults)
//! 4. Validate

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Load and validate a single config file.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    let config = parse(&content, &path.display().to_string(), &collect_env_vars())?;
    info!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Parse and validate config text, using the process environment for fallbacks.
///
/// # Errors
///
/// Returns a [`ConfigError`] on malformed TOML or failed validation.
pub fn from_toml_str(content: &str) -> ConfigResult<Config> {
    parse(content, "<inline>", &collect_env_vars())
}

/// Parse and validate config text with an explicit environment snapshot.
///
/// # Errors
///
/// Returns a [`ConfigError`] on malformed TOML or failed validation.
pub fn from_toml_str_with_env<S: ::std::hash::BuildHasher>(
    content: &str,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Config> {
    parse(content, "<inline>", env_vars)
}

fn parse<S: ::std::hash::BuildHasher>(
    content: &str,
    origin: &str,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Config> {
    let parse_err = |source| ConfigError::ParseError {
        path: origin.to_owned(),
        source,
    };

    let mut tree: toml::Value = toml::from_str(content).map_err(parse_err)?;
    let applied = apply_env_fallbacks(&mut tree, env_vars);
    if applied > 0 {
        debug!(count = applied, "env var fallbacks applied");
    }

    let config: Config = tree.try_into().map_err(parse_err)?;
    validate::validate(&config)?;
    Ok(config)
}
