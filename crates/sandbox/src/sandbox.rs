//! The execution boundary.
//!
//! [`ExecutionSandbox`] is the only way payloads reach an engine. Whatever
//! happens inside the engine, `execute` returns an [`ExecutionResult`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use quest_packet_core::config::SandboxSettings;
use quest_packet_core::ExecutionResult;

use crate::engine::{SandboxEngine, ScriptEngine};
use crate::fault::EvalFault;

/// Runs payloads on an engine and converts every outcome into a result.
pub struct ExecutionSandbox {
    engine: Arc<dyn SandboxEngine>,
    settings: SandboxSettings,
}

impl ExecutionSandbox {
    pub fn new(engine: Arc<dyn SandboxEngine>, settings: SandboxSettings) -> Self {
        Self { engine, settings }
    }

    /// Sandbox backed by a [`ScriptEngine`] sized from `settings`.
    pub fn with_script_engine(settings: SandboxSettings) -> Self {
        let engine = Arc::new(ScriptEngine::new(settings.max_nesting_depth));
        Self::new(engine, settings)
    }

    pub fn settings(&self) -> &SandboxSettings {
        &self.settings
    }

    pub fn engine(&self) -> &Arc<dyn SandboxEngine> {
        &self.engine
    }

    /// Evaluate `code` in a fresh scope.
    ///
    /// The control payload is answered before any evaluation. Oversized
    /// payloads are refused. Faults and engine panics become
    /// [`ExecutionResult::Failure`]; nothing propagates to the caller.
    pub fn execute(&self, code: &str) -> ExecutionResult {
        if code == self.settings.control_payload {
            tracing::debug!("Control payload received");
            return ExecutionResult::success(self.settings.control_message.clone());
        }

        if code.len() > self.settings.max_payload_bytes {
            let fault = EvalFault::memory(format!(
                "payload of {} bytes exceeds the {} byte limit",
                code.len(),
                self.settings.max_payload_bytes
            ));
            tracing::warn!(bytes = code.len(), kind = %fault.kind, "Payload refused");
            return ExecutionResult::failure(fault.to_string());
        }

        let engine = &self.engine;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| engine.evaluate(code)))
            .unwrap_or_else(|payload| Err(EvalFault::internal(panic_message(&*payload))));

        match outcome {
            Ok(()) => {
                tracing::debug!(engine = engine.name(), bytes = code.len(), "Payload executed");
                ExecutionResult::success(self.settings.success_message.clone())
            }
            Err(fault) => {
                tracing::warn!(
                    engine = engine.name(),
                    bytes = code.len(),
                    kind = %fault.kind,
                    "Payload raised a fault: {}",
                    fault.message
                );
                ExecutionResult::failure(fault.to_string())
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("engine panicked: {}", detail)
}
