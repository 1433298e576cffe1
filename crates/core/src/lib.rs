#![deny(unused)]
//! Core types, traits, and error definitions for Quest Packet.
//!
//! This crate provides the building blocks shared by the execution sandbox,
//! the task state machine and the agent facade: the quest and content data
//! model, the host capability traits, the error type and the layered
//! configuration.

pub mod config;
pub mod error;
pub mod mocks;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::*;
pub use types::*;
