//! Script source parsing.
//!
//! One command per line:
//!
//! ```text
//! # comment
//! rest 3
//! try toast
//! campground
//! ```
//!
//! A whole script is parsed before anything is dispatched, so a typo on
//! line 40 never leaves lines 1-39 half applied.

use crate::requests::{registry, ActionRequest, ActionSpec};

use super::error::ScriptError;

const TRY_KEYWORD: &str = "try";

/// One parsed line: an action, a repeat count and its failure policy.
#[derive(Debug, Clone)]
pub struct ScriptCommand {
    pub line: usize,
    action: &'static ActionSpec,
    pub count: u32,
    /// Stop the sequence when this command fails. Cleared by `try`.
    pub abort_on_failure: bool,
}

impl ScriptCommand {
    pub fn new(line: usize, action: &'static ActionSpec) -> Self {
        Self {
            line,
            action,
            count: 1,
            abort_on_failure: true,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn tolerating_failure(mut self) -> Self {
        self.abort_on_failure = false;
        self
    }

    pub fn action_id(&self) -> &'static str {
        self.action.id
    }

    /// A fresh request for one repetition.
    pub fn create_request(&self) -> Box<dyn ActionRequest> {
        self.action.create()
    }
}

/// Parse one line. Blank lines and comments yield `None`.
pub fn parse_line(line: usize, text: &str) -> Result<Option<ScriptCommand>, ScriptError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    let mut words = text.split_whitespace().peekable();
    let tolerant = words
        .next_if(|w| w.eq_ignore_ascii_case(TRY_KEYWORD))
        .is_some();

    let Some(action_id) = words.next() else {
        return Err(ScriptError::syntax(line, "expected an action after 'try'"));
    };
    let action = registry::lookup(action_id).ok_or_else(|| {
        let known: Vec<_> = registry::action_ids().collect();
        ScriptError::syntax(
            line,
            format!(
                "unknown action '{}' (known: {})",
                action_id,
                known.join(", ")
            ),
        )
    })?;

    let mut command = ScriptCommand::new(line, action);
    if let Some(count) = words.next() {
        let count: u32 = count
            .parse()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ScriptError::syntax(line, format!("invalid count '{}'", count)))?;
        command = command.with_count(count);
    }
    if let Some(extra) = words.next() {
        return Err(ScriptError::syntax(
            line,
            format!("unexpected '{}' after command", extra),
        ));
    }
    if tolerant {
        command = command.tolerating_failure();
    }

    Ok(Some(command))
}

/// Parse a whole script. Line numbers start at 1.
pub fn parse_script(source: &str) -> Result<Vec<ScriptCommand>, ScriptError> {
    let mut commands = Vec::new();
    for (index, text) in source.lines().enumerate() {
        if let Some(command) = parse_line(index + 1, text)? {
            commands.push(command);
        }
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_counts_policies_and_comments() {
        let commands = parse_script("# warm up\ncampground\n\nrest 3\ntry TOAST\n").unwrap();

        let summary: Vec<_> = commands
            .iter()
            .map(|c| (c.line, c.action_id(), c.count, c.abort_on_failure))
            .collect();
        assert_eq!(
            summary,
            vec![
                (2, "campground", 1, true),
                (4, "rest", 3, true),
                (5, "toast", 1, false),
            ]
        );
    }

    #[test]
    fn unknown_action_reports_its_line() {
        let err = parse_script("rest\njuggle 2\n").unwrap_err();
        match err {
            ScriptError::Syntax { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("juggle"));
            }
            other => panic!("Expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_counts_and_trailing_words() {
        assert!(matches!(
            parse_line(1, "rest 0"),
            Err(ScriptError::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            parse_line(3, "rest many"),
            Err(ScriptError::Syntax { line: 3, .. })
        ));
        assert!(parse_line(4, "rest 2 now").is_err());
        assert!(parse_line(5, "try").is_err());
    }

    #[test]
    fn command_creates_fresh_requests() {
        let command = parse_line(1, "relax").unwrap().unwrap();
        assert_eq!(command.create_request().action_id(), "relax");
    }
}
