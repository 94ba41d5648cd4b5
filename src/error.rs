//! Custom error types for the crate.
//!
//! This module defines the primary error type, `DaqError`. Using the `thiserror`
//! crate, it gives every layer (registry, facade, transports, configuration) a single
//! and consistent error vocabulary that callers can match on.
//!
//! ## Error Hierarchy
//!
//! - **Definition errors** (`DuplicateParameter`, `RegistrySealed`, `InvalidDefinition`):
//!   raised while building a parameter table. These indicate a programming or table
//!   error, never a device problem.
//! - **Direction errors** (`UnknownParameter`, `WriteOnlyParameter`, `ReadOnlyParameter`):
//!   raised before any transport interaction when a name is missing or the requested
//!   operation does not exist for it.
//! - **`Validation`**: a value outside the declared domain. Carries the parameter
//!   name, the rejected value and a description of the legal domain. Validation runs
//!   strictly before formatting, so a rejected value never reaches the wire.
//! - **Wire errors** (`Transport`, `Timeout`, `UnexpectedReply`, `Io`): surfaced
//!   unmodified and never retried. A retried SET could apply a state change twice.
//! - **`Config`**: wraps [`ConfigError`](crate::config::ConfigError).

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Convenience alias for results using the crate error type.
pub type AppResult<T> = std::result::Result<T, DaqError>;

/// Every failure the library can report.
#[derive(Error, Debug)]
pub enum DaqError {
    /// No parameter or function with this name.
    #[error("Unknown parameter: '{0}'")]
    UnknownParameter(String),

    /// A get on a parameter that has no query.
    #[error("Parameter '{0}' is write-only (no query command)")]
    WriteOnlyParameter(String),

    /// A set on a parameter that has no set template.
    #[error("Parameter '{0}' is read-only (no set command)")]
    ReadOnlyParameter(String),

    /// A value outside the parameter's domain. Nothing was sent.
    #[error("Invalid value '{value}' for parameter '{name}': must be {domain}")]
    Validation {
        /// Parameter the value was meant for.
        name: String,
        /// The rejected value as given.
        value: String,
        /// The legal domain, in words.
        domain: String,
    },

    /// A name that is already registered; the first entry is kept.
    #[error("Parameter '{0}' is already registered")]
    DuplicateParameter(String),

    /// Registration after the first device operation.
    #[error("Registry is sealed; cannot register '{0}' after the first device operation")]
    RegistrySealed(String),

    /// A malformed parameter or function definition.
    #[error("Invalid definition for '{name}': {reason}")]
    InvalidDefinition {
        /// Offending parameter or function name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The link failed, closed, or can no longer be trusted.
    #[error("Transport error: {0}")]
    Transport(String),

    /// No complete answer before the deadline.
    #[error("No reply to '{command}' within {timeout:?}")]
    Timeout {
        /// The command whose round trip expired.
        command: String,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// A reply that does not decode for its command.
    #[error("Unexpected reply '{reply}' to '{command}': {reason}")]
    UnexpectedReply {
        /// The command that was answered.
        command: String,
        /// The reply line.
        reply: String,
        /// Why it could not be decoded.
        reason: String,
    },

    /// Underlying stream I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DaqError {
    /// True for errors raised before the transport was touched.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            DaqError::UnknownParameter(_)
                | DaqError::WriteOnlyParameter(_)
                | DaqError::ReadOnlyParameter(_)
                | DaqError::Validation { .. }
                | DaqError::DuplicateParameter(_)
                | DaqError::RegistrySealed(_)
                | DaqError::InvalidDefinition { .. }
        )
    }
}
