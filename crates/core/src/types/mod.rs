//! Domain types shared by the sandbox, the quest state machine and the agent.

pub mod content;
pub mod execution;
pub mod task;

pub use content::*;
pub use execution::*;
pub use task::*;
