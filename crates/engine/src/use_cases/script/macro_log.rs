//! Append-only macro log.
//!
//! JSON Lines, one entry per request that went over the wire, in dispatch
//! order. Replay rebuilds each request from its action id and checks that it
//! would send exactly what was recorded.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::infrastructure::ports::{ClockPort, FormParams, TransportRequest};
use crate::requests::registry;

use super::command::ScriptCommand;
use super::error::MacroError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroEntry {
    pub seq: u64,
    pub action: String,
    pub endpoint: String,
    pub params: FormParams,
    /// `false` for steps recorded under `try`. Older logs lack the field.
    #[serde(default = "aborts_by_default")]
    pub abort_on_failure: bool,
    pub recorded_at: DateTime<Utc>,
}

fn aborts_by_default() -> bool {
    true
}

impl MacroEntry {
    /// Turn the entry back into a command, refusing drift from the recording.
    pub fn to_command(&self, line: usize) -> Result<ScriptCommand, MacroError> {
        let action = registry::lookup(&self.action).ok_or_else(|| {
            MacroError::malformed(line, format!("unknown action '{}'", self.action))
        })?;
        let rebuilt = action.create().build();
        if rebuilt.endpoint != self.endpoint || rebuilt.params != self.params {
            return Err(MacroError::malformed(
                line,
                format!("'{}' no longer builds the recorded request", self.action),
            ));
        }
        let command = ScriptCommand::new(line, action);
        Ok(if self.abort_on_failure {
            command
        } else {
            command.tolerating_failure()
        })
    }
}

/// Writes macro entries to a file as they are dispatched.
pub struct MacroRecorder {
    path: PathBuf,
    file: File,
    clock: Arc<dyn ClockPort>,
    next_seq: u64,
}

impl MacroRecorder {
    /// Create (or truncate) the log at `path`.
    pub fn create(path: impl Into<PathBuf>, clock: Arc<dyn ClockPort>) -> Result<Self, MacroError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| MacroError::io(&path, e))?;
        tracing::info!(path = %path.display(), "Macro recording started");
        Ok(Self {
            path,
            file,
            clock,
            next_seq: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries_written(&self) -> u64 {
        self.next_seq
    }

    pub fn record(
        &mut self,
        action: &str,
        sent: &TransportRequest,
        abort_on_failure: bool,
    ) -> Result<(), MacroError> {
        let entry = MacroEntry {
            seq: self.next_seq,
            action: action.to_string(),
            endpoint: sent.endpoint.clone(),
            params: sent.params.clone(),
            abort_on_failure,
            recorded_at: self.clock.now(),
        };
        let line = serde_json::to_string(&entry)
            .map_err(|e| MacroError::malformed(0, e.to_string()))?;
        writeln!(self.file, "{}", line)
            .and_then(|_| self.file.flush())
            .map_err(|e| MacroError::io(&self.path, e))?;
        self.next_seq += 1;
        tracing::debug!(seq = entry.seq, action, "Macro entry recorded");
        Ok(())
    }
}

/// Read every entry of a macro log, in file order.
pub fn read_macro(path: &Path) -> Result<Vec<MacroEntry>, MacroError> {
    let file = File::open(path).map_err(|e| MacroError::io(path, e))?;
    let mut entries = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| MacroError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: MacroEntry = serde_json::from_str(&line)
            .map_err(|e| MacroError::malformed(index + 1, e.to_string()))?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Read a macro log and turn it into replayable commands.
pub fn load_replay(path: &Path) -> Result<Vec<ScriptCommand>, MacroError> {
    read_macro(path)?
        .iter()
        .enumerate()
        .map(|(index, entry)| entry.to_command(index + 1))
        .collect()
}
