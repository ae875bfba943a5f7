//! Syntax checking through an external interpreter.
//!
//! The snippet goes to the interpreter on stdin and is only handed to
//! `ast.parse`, so nothing in it is imported or run.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::checker::{SyntaxChecker, SyntaxIssue};
use crate::error::CheckerError;

const PARSE_SCRIPT: &str = r#"
import ast, sys
data = sys.stdin.buffer.read()
try:
    ast.parse(data, "<snippet>")
except SyntaxError as e:
    print("error\t%d\t%d\t%s" % (e.lineno or 1, e.offset or 0, e.msg))
except ValueError as e:
    print("error\t1\t0\t%s" % e)
else:
    print("ok")
"#;

pub struct InterpreterChecker {
    program: String,
}

impl InterpreterChecker {
    pub fn new(program: impl Into<String>) -> Self {
        InterpreterChecker {
            program: program.into(),
        }
    }

    /// Whether the program can be started at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }

    fn io_error(&self, source: std::io::Error) -> CheckerError {
        CheckerError::Io {
            program: self.program.clone(),
            source,
        }
    }
}

impl Default for InterpreterChecker {
    fn default() -> Self {
        InterpreterChecker::new("python3")
    }
}

impl SyntaxChecker for InterpreterChecker {
    fn name(&self) -> &str {
        &self.program
    }

    fn check(&self, source: &str) -> Result<Option<SyntaxIssue>, CheckerError> {
        let mut child = Command::new(&self.program)
            .arg("-c")
            .arg(PARSE_SCRIPT)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CheckerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // The script reads all of stdin before printing anything.
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .map_err(|e| self.io_error(e))?;
        }
        let output = child.wait_with_output().map_err(|e| self.io_error(e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_reply(stdout.trim_end()) {
            Some(reply) if output.status.success() => Ok(reply),
            _ => Err(CheckerError::UnexpectedOutput {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}

/// `ok` or `error<TAB>line<TAB>column<TAB>message`.
fn parse_reply(reply: &str) -> Option<Option<SyntaxIssue>> {
    if reply == "ok" {
        return Some(None);
    }
    let mut fields = reply.splitn(4, '\t');
    if fields.next()? != "error" {
        return None;
    }
    let line = fields.next()?.parse().ok()?;
    let column = fields.next()?.parse().ok()?;
    let message = fields.next()?.to_string();
    Some(Some(SyntaxIssue {
        line,
        column,
        message,
    }))
}
