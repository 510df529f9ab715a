//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only fill fields the config
//! file left unset. This keeps secrets out of files without letting the
//! environment silently change a checked-in policy.

use std::collections::HashMap;

use tracing::debug;

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "ACEY_AUDIT_MODE",
        field_path: "audit.mode",
    },
    EnvMapping {
        var_name: "ACEY_AUDIT_ENCRYPTION_KEY",
        field_path: "audit.encryption_key",
    },
    EnvMapping {
        var_name: "ACEY_AUDIT_SIGNATURE_KEY",
        field_path: "audit.signature_key",
    },
    EnvMapping {
        var_name: "ACEY_AUDIT_RETENTION_DAYS",
        field_path: "audit.retention_days",
    },
    EnvMapping {
        var_name: "ACEY_LOG_LEVEL",
        field_path: "logging.level",
    },
];

/// Snapshot the `ACEY_*` environment variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("ACEY_"))
        .collect()
}

/// Apply fallbacks to every mapped field missing from `root`.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    root: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if field_is_set(root, mapping.field_path) {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            set_field(root, mapping.field_path, coerce(mapping.field_path, val));
            count = count.saturating_add(1);
        }
    }

    count
}

fn field_is_set(root: &toml::Value, path: &str) -> bool {
    let mut current = root;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let Some((section, key)) = path.split_once('.') else {
        return;
    };
    let Some(table) = root.as_table_mut() else {
        return;
    };
    let section_value = table
        .entry(section.to_owned())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    if let Some(section_table) = section_value.as_table_mut() {
        section_table.insert(key.to_owned(), value);
    }
}

fn coerce(path: &str, raw: &str) -> toml::Value {
    if path == "audit.retention_days"
        && let Ok(days) = raw.trim().parse::<i64>()
    {
        return toml::Value::Integer(days);
    }
    toml::Value::String(raw.to_owned())
}
