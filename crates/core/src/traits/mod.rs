//! Host capability traits.
//!
//! The agent does not implement these services; the host runtime injects
//! implementations at construction time.

pub mod host;

pub use host::*;
