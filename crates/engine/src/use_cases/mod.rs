//! Use cases - sequences of actions driven through a session.

pub mod script;

pub use script::{ScriptEngine, ScriptError, SequenceHandle, SequenceReport, SequenceStatus};
