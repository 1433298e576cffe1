//! Sandbox evaluation engines.
//!
//! This module provides the `SandboxEngine` trait and the script-language
//! implementation. An engine only evaluates; turning its verdict into an
//! [`ExecutionResult`](quest_packet_core::ExecutionResult) is the job of the
//! [`ExecutionSandbox`](crate::ExecutionSandbox).

use std::collections::{HashMap, VecDeque};
use std::panic;
use std::sync::Mutex;
use std::thread;

use crate::fault::EvalFault;
use crate::script::builtins::{globals, Global};
use crate::script::{Interpreter, ProgramParser};

// =============================================================================
// Sandbox Engine Trait
// =============================================================================

/// Trait for evaluation backends.
///
/// Each call to [`evaluate`](SandboxEngine::evaluate) must run in a fresh
/// scope: nothing bound by one payload may be visible to the next.
pub trait SandboxEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Evaluate `code`, returning the fault it raised, if any.
    fn evaluate(&self, code: &str) -> Result<(), EvalFault>;
}

// =============================================================================
// Script Engine
// =============================================================================

/// Stack reserved for each script evaluation.
///
/// Parsing and evaluation recurse once per bracket level and once per
/// expression level. This budget covers
/// [`NESTING_DEPTH_CEILING`](quest_packet_core::config::NESTING_DEPTH_CEILING)
/// brackets and [`MAX_EXPR_DEPTH`](crate::script::parser::MAX_EXPR_DEPTH)
/// expression levels in an unoptimised build, whatever thread the caller
/// runs on.
pub const EVAL_STACK_BYTES: usize = 32 * 1024 * 1024;

/// Engine for the built-in statement language.
///
/// The global namespace is built once and shared read-only; every evaluation
/// gets its own [`Interpreter`] and therefore its own scope. Evaluations run
/// on a dedicated thread sized by [`EVAL_STACK_BYTES`].
pub struct ScriptEngine {
    globals: HashMap<&'static str, Global>,
    parser: ProgramParser,
}

impl ScriptEngine {
    /// Create an engine that rejects bracket nesting beyond `max_nesting_depth`.
    pub fn new(max_nesting_depth: usize) -> Self {
        Self {
            globals: globals(),
            parser: ProgramParser::new(max_nesting_depth),
        }
    }

    /// Parse and run `code` on the current thread.
    fn evaluate_in_place(&self, code: &str) -> Result<(), EvalFault> {
        let program = self.parser.parse(code)?;
        let mut interpreter = Interpreter::new(&self.globals);
        let outcome = interpreter.run(&program);
        tracing::trace!(
            statements = program.len(),
            printed = interpreter.printed(),
            "Script evaluated"
        );
        outcome
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new(quest_packet_core::config::SandboxSettings::default().max_nesting_depth)
    }
}

impl SandboxEngine for ScriptEngine {
    fn name(&self) -> &str {
        "script"
    }

    fn evaluate(&self, code: &str) -> Result<(), EvalFault> {
        thread::scope(|scope| {
            let worker = thread::Builder::new()
                .name("script-eval".into())
                .stack_size(EVAL_STACK_BYTES)
                .spawn_scoped(scope, || self.evaluate_in_place(code))
                .map_err(|e| {
                    EvalFault::internal(format!("failed to start evaluation thread: {}", e))
                })?;
            // Hand panics to the caller so the sandbox reports them.
            worker
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload))
        })
    }
}

// =============================================================================
// Mock Engine (for testing hosts without the script language)
// =============================================================================

/// Engine returning scripted verdicts.
///
/// Responses are consumed in order; once exhausted every payload succeeds.
/// A payload equal to the configured panic trigger makes the engine panic,
/// which lets callers exercise fault containment.
#[derive(Default)]
pub struct MockEngine {
    responses: Mutex<VecDeque<Result<(), EvalFault>>>,
    received: Mutex<Vec<String>>,
    panic_on: Option<String>,
}

impl MockEngine {
    /// Create a mock engine with predefined verdicts.
    pub fn new(responses: Vec<Result<(), EvalFault>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    /// Panic when asked to evaluate `payload`.
    pub fn panicking_on(mut self, payload: impl Into<String>) -> Self {
        self.panic_on = Some(payload.into());
        self
    }

    /// Payloads evaluated so far, in order.
    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .map(|received| received.clone())
            .unwrap_or_default()
    }
}

impl SandboxEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn evaluate(&self, code: &str) -> Result<(), EvalFault> {
        if let Ok(mut received) = self.received.lock() {
            received.push(code.to_string());
        }
        if self.panic_on.as_deref() == Some(code) {
            panic!("mock engine asked to fail on {:?}", code);
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front())
            .unwrap_or(Ok(()))
    }
}

// =============================================================================
// Tests
// =============================================================================
