#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Configuration for the Acey audit ledger.
//!
//! # Usage
//!
//! ```rust,no_run
//! use acey_config::Config;
//!
//! let config = Config::load_file(std::path::Path::new("acey.toml")).unwrap();
//! println!("audit mode: {}", config.audit.mode);
//! ```
//!
//! # Precedence
//!
//! 1. Values in the config file
//! 2. `ACEY_*` environment variables, only for fields the file left unset
//! 3. Embedded defaults
//!
//! # Design
//!
//! This crate has **no dependencies on other internal acey crates**.
//! Conversion to domain types happens in `acey-audit`.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Parse and validate config text.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] on malformed TOML or failed validation.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        loader::from_toml_str(content)
    }
}
