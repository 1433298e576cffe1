//! Error types for Quest Packet.

use thiserror::Error;

use crate::types::TaskStatus;

/// Result type alias using Quest Packet's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Quest Packet.
///
/// Evaluation faults raised by sandboxed code are deliberately absent here:
/// they never leave the sandbox as errors and are reported through
/// [`ExecutionResult`](crate::types::ExecutionResult) instead.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Registry Errors
    // =========================================================================
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Duplicate task: {0}")]
    DuplicateTask(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Invalid content item: {0}")]
    InvalidItem(String),

    #[error("Duplicate content item: {0}")]
    DuplicateItem(String),

    // =========================================================================
    // State Errors
    // =========================================================================
    #[error("Illegal transition for {task}: {from} -> {to}")]
    InvalidTransition {
        task: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    // =========================================================================
    // Host Errors
    // =========================================================================
    #[error("Host call failed: {0}")]
    Host(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an invalid task error.
    pub fn invalid_task(msg: impl Into<String>) -> Self {
        Self::InvalidTask(msg.into())
    }

    /// Create an invalid content item error.
    pub fn invalid_item(msg: impl Into<String>) -> Self {
        Self::InvalidItem(msg.into())
    }

    /// Create a host call error.
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
