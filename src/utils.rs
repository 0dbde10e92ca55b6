//! Utility functions for supervisor command execution.

use crate::error::{JobError, Result};
use std::process::{Command, Stdio};
use tracing::debug;

/// Result of running a supervisor command
#[derive(Debug)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub return_code: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.return_code == 0
    }

    /// Combined stdout and stderr, trimmed, as the supervisor printed it.
    pub fn combined_output(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => String::new(),
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }

    /// Diagnostic text for error reporting, falling back to the exit code.
    pub fn diagnostic(&self) -> String {
        let output = self.combined_output();
        if output.is_empty() {
            format!("exit status {}", self.return_code)
        } else {
            format!("exit status {}: {}", self.return_code, output)
        }
    }
}

/// Execute a command and capture stdout, stderr, and return code.
///
/// A non-zero return code is not an error here; callers decide what it means.
pub fn run_command(program: &str, args: &[&str]) -> Result<CommandResult> {
    debug!(program, ?args, "running command");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| JobError::Io {
            program: program.to_string(),
            source,
        })?;

    let result = CommandResult {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        return_code: output.status.code().unwrap_or(-1),
    };

    debug!(program, return_code = result.return_code, "command finished");
    Ok(result)
}

/// Execute a command with the terminal attached and return its exit code.
pub fn run_passthrough(program: &str, args: &[&str]) -> Result<i32> {
    debug!(program, ?args, "running passthrough command");

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| JobError::Io {
            program: program.to_string(),
            source,
        })?;

    Ok(status.code().unwrap_or(-1))
}

/// Parse `Key=Value` lines as printed by `systemctl show`.
pub fn parse_show_output(output: &str, key: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (k, v) = line.trim().split_once('=')?;
        (k == key).then(|| v.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_show_output() {
        let output = "LoadState=loaded\nActiveState=failed\n";
        assert_eq!(
            parse_show_output(output, "ActiveState"),
            Some("failed".to_string())
        );
        assert_eq!(
            parse_show_output(output, "LoadState"),
            Some("loaded".to_string())
        );
        assert_eq!(parse_show_output(output, "SubState"), None);
    }

    #[test]
    fn test_diagnostic_falls_back_to_exit_code() {
        let result = CommandResult {
            stdout: String::new(),
            stderr: "  \n".to_string(),
            return_code: 5,
        };
        assert_eq!(result.diagnostic(), "exit status 5");
    }

    #[test]
    fn test_combined_output_joins_streams() {
        let result = CommandResult {
            stdout: "out\n".to_string(),
            stderr: "err\n".to_string(),
            return_code: 1,
        };
        assert_eq!(result.combined_output(), "out\nerr");
        assert!(!result.success());
    }

    #[test]
    fn test_run_command_captures_output() {
        let result = run_command("echo", &["hello"]).unwrap();
        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn test_run_command_missing_program() {
        let err = run_command("/nonexistent/bgjob-test-binary", &[]).unwrap_err();
        assert!(matches!(err, JobError::Io { .. }));
    }
}
