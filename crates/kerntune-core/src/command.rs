//! Subprocess execution with captured output.
//!
//! Commands are always a fixed program plus explicit arguments; there is no
//! shell anywhere in this crate. Captured stdout is split into lines and
//! passed through the JSON text escaper, so output is safe to embed in a
//! reply whatever bytes the tool produced.

use std::process::Command;

use kerntune_ipc::escape_text;

use crate::services::error::ServiceError;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Escaped stdout lines, in order.
    pub lines: Vec<String>,
}

impl CommandOutput {
    /// Plain-text mode: lines joined with a newline separator.
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }

    pub fn first_line(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }
}

/// Run `program` with `args`, requiring a zero exit status.
///
/// A spawn failure or non-zero exit maps to [`ServiceError::Command`] with
/// whatever output was captured.
pub fn run(program: &str, args: &[&str]) -> Result<CommandOutput, ServiceError> {
    let rendered = render(program, args);
    let out = Command::new(program)
        .args(args)
        .output()
        .map_err(|err| ServiceError::Command {
            command: rendered.clone(),
            output: vec![format!("spawn failed: {err}")],
        })?;

    let mut lines = capture_lines(&out.stdout);
    if !out.status.success() {
        lines.extend(capture_lines(&out.stderr));
        return Err(ServiceError::Command {
            command: rendered,
            output: lines,
        });
    }
    Ok(CommandOutput { lines })
}

fn render(program: &str, args: &[&str]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}

fn capture_lines(bytes: &[u8]) -> Vec<String> {
    let mut lines: Vec<String> = bytes.split(|&b| b == b'\n').map(escape_text).collect();
    // A trailing newline produces one empty trailing entry; drop it.
    if lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}
