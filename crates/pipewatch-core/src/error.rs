//! Error types for PipeWatch operations.
//!
//! This module defines [`WatchError`], the error enum shared by all PipeWatch
//! crates. Errors are designed for visibility: no silent failures, clear
//! actionable messages surfaced to the user.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`WatchError`].
pub type Result<T> = std::result::Result<T, WatchError>;

/// Error type for all PipeWatch operations.
///
/// Configuration errors are fatal before the poll loop starts (the process
/// exits non-zero); they never occur mid-loop. Terminal errors abort the
/// session. Fetch-layer failures are represented separately in
/// `pipewatch-fetch` so the loop can degrade per entity instead of aborting.
#[derive(Debug, Error)]
pub enum WatchError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file not found
    #[error("Configuration not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file is invalid YAML
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    /// Missing required configuration field
    #[error("Missing required config field: {field}")]
    ConfigMissingField { field: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Terminal Errors
    // =========================================================================
    /// A cursor-addressed write to the terminal failed
    #[error("Terminal write failed: {message}")]
    TerminalWrite { message: String },

    /// Restoring the cursor on shutdown failed
    #[error("Failed to restore terminal: {message}")]
    TerminalRestore { message: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (bug in PipeWatch)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl WatchError {
    /// Create an I/O error.
    pub fn io(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a ConfigNotFound error.
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create a configuration validation error.
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a terminal write error from an underlying I/O failure.
    pub fn terminal_write(source: std::io::Error) -> Self {
        Self::TerminalWrite {
            message: source.to_string(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error (fatal before the loop starts).
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. }
                | Self::ConfigInvalid { .. }
                | Self::ConfigValidation { .. }
                | Self::ConfigMissingField { .. }
        )
    }

    /// Returns actionable guidance for the user.
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound { .. } => {
                Some("Create ~/.pipewatch/config.yaml or pass --config with a path")
            }
            Self::ConfigInvalid { .. } => {
                Some("Check YAML syntax - run 'pipewatch config' to see detailed errors")
            }
            Self::ConfigValidation { .. } => {
                Some("Add at least one pipeline or build project to the config")
            }
            Self::TerminalWrite { .. } | Self::TerminalRestore { .. } => {
                Some("Try running in a different terminal")
            }
            _ => None,
        }
    }
}
