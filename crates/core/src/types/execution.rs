use serde::{Deserialize, Serialize};

// =============================================================================
// Execution Types
// =============================================================================

/// Outcome of one sandboxed execution request.
///
/// Exactly one variant is produced per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// Evaluation finished without a fault; carries a fixed confirmation.
    Success(String),
    /// Evaluation raised a fault; carries the fault's description.
    Failure(String),
}

impl ExecutionResult {
    /// Create a success result.
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success(message.into())
    }

    /// Create a failure result.
    pub fn failure(description: impl Into<String>) -> Self {
        Self::Failure(description.into())
    }

    /// Whether the execution succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Render the result as the text handed back to the host.
    ///
    /// `Success(m)` renders as `m`; `Failure(e)` renders as `failure_prefix`
    /// followed by `e`.
    pub fn render(&self, failure_prefix: &str) -> String {
        match self {
            Self::Success(message) => message.clone(),
            Self::Failure(description) => format!("{}{}", failure_prefix, description),
        }
    }
}
