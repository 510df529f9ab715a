//! Acey Telemetry - Logging setup for the audit ledger tools.
//!
//! The ledger crates only emit `tracing` events; this crate installs the
//! subscriber that renders them.
//!
//! # Example
//!
//! ```rust,no_run
//! use acey_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), acey_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("acey_audit=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("ledger tooling started");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
