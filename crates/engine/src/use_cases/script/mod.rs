//! Command sequences, background execution and macro logs.

mod command;
mod engine;
mod error;
mod macro_log;

pub use command::{parse_line, parse_script, ScriptCommand};
pub use engine::{
    ScriptEngine, SequenceHandle, SequenceReport, SequenceStatus, COMPLETED_MESSAGE,
};
pub use error::{MacroError, ScriptError};
pub use macro_log::{load_replay, read_macro, MacroEntry, MacroRecorder};
