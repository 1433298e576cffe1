#![deny(unused)]
//! Agent facade for Quest Packet.
//!
//! [`QuestAgent`] wires the host collaborators, the task state machine and the
//! execution sandbox together behind three entry points: `initialize`,
//! `on_visit` and `run`.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use quest_packet_agent::QuestAgent;
//! use quest_packet_core::mocks::RecordingHost;
//!
//! let host = Arc::new(RecordingHost::new());
//! let agent = QuestAgent::builder().with_host(host.clone()).build().unwrap();
//!
//! agent.initialize();
//! assert_eq!(agent.on_visit("https://google.com").len(), 1);
//! assert_eq!(agent.run("x = 1 + 1"), "Code executed successfully");
//! ```

pub mod agent;
pub mod builder;

pub use agent::QuestAgent;
pub use builder::QuestAgentBuilder;
