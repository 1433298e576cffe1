#![deny(unused)]
//! Execution Sandbox for Quest Packet.
//!
//! This crate evaluates untrusted code payloads sent by the host. Every
//! payload runs in a scope created for it alone and discarded afterwards, and
//! every fault it raises is caught at the [`ExecutionSandbox`] boundary and
//! returned as an [`ExecutionResult`](quest_packet_core::ExecutionResult).
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │  Agent Facade (run)                    │
//! │    ↓ execute(code)                     │
//! ├────────────────────────────────────────┤
//! │  ExecutionSandbox                      │
//! │    control payload, size guard,        │
//! │    panic containment                   │
//! │    ↓ evaluate(code)                    │
//! ├────────────────────────────────────────┤
//! │  SandboxEngine (ScriptEngine)          │
//! │    own-stack thread: parse →           │
//! │    fresh Interpreter → drop            │
//! └────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use quest_packet_core::config::SandboxSettings;
//! use quest_packet_sandbox::ExecutionSandbox;
//!
//! let sandbox = ExecutionSandbox::with_script_engine(SandboxSettings::default());
//! assert!(sandbox.execute("x = 1 + 1").is_success());
//! assert!(!sandbox.execute("raise ValueError('boom')").is_success());
//! ```

pub mod engine;
pub mod fault;
pub mod sandbox;
pub mod script;

pub use engine::{MockEngine, SandboxEngine, ScriptEngine};
pub use fault::EvalFault;
pub use sandbox::ExecutionSandbox;
