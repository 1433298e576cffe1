//! A small statement language with Python-flavoured syntax.
//!
//! Supported: assignment (plain and augmented), `del`, `pass`, `assert`,
//! `raise`, and expressions over `None`, booleans, 64-bit integers, floats,
//! strings and lists. Calls are limited to the builtins and exception classes
//! in [`builtins`]. There are no imports, loops or function definitions, so
//! every payload terminates in time linear in its length.

pub mod ast;
pub mod builtins;
pub mod interpreter;
pub mod parser;
pub mod value;

pub use interpreter::Interpreter;
pub use parser::ProgramParser;
pub use value::Value;
