//! Evaluation faults.
//!
//! A fault is anything raised while evaluating a payload. Faults never cross
//! the [`ExecutionSandbox`](crate::ExecutionSandbox) boundary as errors; they
//! are rendered into [`ExecutionResult::Failure`](quest_packet_core::ExecutionResult).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fault raised during evaluation, described by an exception-style kind
/// and a message. Renders as `Kind: message`, or `Kind` alone when the
/// message is empty.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}", describe(.kind, .message))]
pub struct EvalFault {
    pub kind: String,
    pub message: String,
}

impl EvalFault {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn syntax(message: impl fmt::Display, line: usize, column: usize) -> Self {
        Self::new(
            "SyntaxError",
            format!("{} (line {}, column {})", message, line, column),
        )
    }

    pub fn name_error(name: &str) -> Self {
        Self::new("NameError", format!("name '{}' is not defined", name))
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new("TypeError", message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new("ValueError", message)
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        Self::new("ZeroDivisionError", message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Self::new("IndexError", message)
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        Self::new("OverflowError", message)
    }

    pub fn memory(message: impl Into<String>) -> Self {
        Self::new("MemoryError", message)
    }

    pub fn recursion(message: impl Into<String>) -> Self {
        Self::new("RecursionError", message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new("RuntimeError", message)
    }

    /// A fault the engine itself produced, e.g. a caught panic.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("InternalError", message)
    }
}

fn describe(kind: &str, message: &str) -> String {
    if message.is_empty() {
        kind.to_string()
    } else {
        format!("{}: {}", kind, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(EvalFault::value_error("boom").to_string(), "ValueError: boom");
        assert_eq!(EvalFault::new("KeyError", "").to_string(), "KeyError");
        assert_eq!(
            EvalFault::syntax("invalid syntax", 2, 5).to_string(),
            "SyntaxError: invalid syntax (line 2, column 5)"
        );
    }

    #[test]
    fn test_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(EvalFault::runtime("stalled"));
        assert_eq!(err.to_string(), "RuntimeError: stalled");
        assert!(err.source().is_none());
    }
}
