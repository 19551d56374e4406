//! Script engine errors.

use std::path::PathBuf;

use crate::requests::RequestError;

/// Errors reading or writing a macro log.
#[derive(Debug, thiserror::Error)]
pub enum MacroError {
    #[error("Macro log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Macro log line {line}: {message}")]
    Malformed { line: usize, message: String },
}

impl MacroError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }
}

/// Errors that stop a sequence from starting or from finishing.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("A sequence is already running")]
    AlreadyRunning,
    #[error("Usage error: {0}")]
    Usage(String),
    #[error("Could not read script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Sequence task ended abnormally: {0}")]
    Aborted(String),
    #[error(transparent)]
    Macro(#[from] MacroError),
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl ScriptError {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }
}
