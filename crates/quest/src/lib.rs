#![deny(unused)]
//! Task State Machine for Quest Packet.
//!
//! Tasks move one way through their lifecycle (`PENDING → COMPLETED`). Host
//! events are matched against each task's [`VisitTrigger`](quest_packet_core::VisitTrigger)
//! and every status change comes back as a [`Transition`] carrying the
//! notification for the player.

pub mod machine;
pub mod matcher;

pub use machine::{QuestEvent, TaskStateMachine, Transition};
pub use matcher::LocatorMatcher;
