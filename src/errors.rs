// src/errors.rs

//! Crate-wide error type.
//!
//! Every primitive returns one of these instead of exiting. Turning an error
//! into process termination is the job of `main.rs` alone.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("{operation} not available on this platform")]
    UnsupportedPlatform { operation: &'static str },

    #[error("failed to create {what}: {source}")]
    PrimitiveCreation {
        what: String,
        #[source]
        source: std::io::Error,
    },

    #[error("secret delivery through pipe {path} failed: {source}")]
    PipeDelivery {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not resolve user '{username}': {reason}")]
    IdentityResolution { username: String, reason: String },

    #[error("could not switch to user '{username}': {reason}")]
    IdentitySwitch { username: String, reason: String },

    #[error("invalid environment entry on line {line}: {reason}")]
    InvalidEnvironment { line: usize, reason: String },

    #[error("invalid pipe name '{0}': must be a single plain file name")]
    InvalidPipeName(String),

    #[error("pipe write cancelled: {0}")]
    Cancelled(crate::pipe::CancelReason),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExecError {
    pub(crate) fn unsupported(operation: &'static str) -> Self {
        ExecError::UnsupportedPlatform { operation }
    }

    pub(crate) fn creation(what: impl Into<String>, source: std::io::Error) -> Self {
        ExecError::PrimitiveCreation {
            what: what.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecError>;
