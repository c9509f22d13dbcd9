//! Text input: scripted sessions and interactive stdin lines.
//!
//! A script is one `<seconds> <action>` pair per line, in session time.
//! Blank lines and `#` comments are skipped. Actions are the logical input
//! names (`forward`, `turn_left`, `turn_right`, `turn_about`, `confirm`, or
//! their aliases) plus `abort`. Inputs land on the first tick that reaches
//! their time; like key presses, they are dropped if the avatar is still
//! moving then.

use abcd_core::LogicalInput;
use anyhow::{bail, Context, Result};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptAction {
    Input(LogicalInput),
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptEntry {
    pub at: Duration,
    pub action: ScriptAction,
}

pub fn parse_script(text: &str) -> Result<Vec<ScriptEntry>> {
    let mut entries: Vec<ScriptEntry> = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let line_no = number + 1;

        let mut parts = line.split_whitespace();
        let (Some(time), Some(action), None) = (parts.next(), parts.next(), parts.next()) else {
            bail!("line {}: expected '<seconds> <action>', got '{}'", line_no, line);
        };

        let secs: f64 = time
            .parse()
            .with_context(|| format!("line {}: bad time '{}'", line_no, time))?;
        if !secs.is_finite() || secs < 0.0 {
            bail!("line {}: time must be a non-negative number", line_no);
        }
        let at = Duration::from_secs_f64(secs);
        if let Some(previous) = entries.last() {
            if at < previous.at {
                bail!("line {}: time {} goes backwards", line_no, secs);
            }
        }

        let action = if action.eq_ignore_ascii_case("abort") {
            ScriptAction::Abort
        } else {
            let input = action
                .parse::<LogicalInput>()
                .map_err(|e| anyhow::anyhow!("line {}: {}", line_no, e))?;
            ScriptAction::Input(input)
        };
        entries.push(ScriptEntry { at, action });
    }
    Ok(entries)
}

/// One line typed on stdin during `run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    Inputs(Vec<LogicalInput>),
    Quit,
}

/// `q`/`quit` ends the session; a full input name is one input; anything
/// else is read key by key (`wwd c`).
pub fn parse_line(line: &str) -> LineCommand {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("q") || trimmed.eq_ignore_ascii_case("quit") {
        return LineCommand::Quit;
    }
    if trimmed.is_empty() {
        let inputs = if line.contains(' ') {
            vec![LogicalInput::Confirm]
        } else {
            Vec::new()
        };
        return LineCommand::Inputs(inputs);
    }
    if trimmed.len() > 1 {
        if let Ok(input) = trimmed.parse::<LogicalInput>() {
            return LineCommand::Inputs(vec![input]);
        }
    }

    let inputs = line
        .trim_end_matches(|c: char| c == '\r' || c == '\n')
        .chars()
        .filter_map(|key| {
            let input = LogicalInput::from_key(key);
            if input.is_none() {
                tracing::debug!("Ignoring key {:?}", key);
            }
            input
        })
        .collect();
    LineCommand::Inputs(inputs)
}
