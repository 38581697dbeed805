//! External process execution
//!
//! Every external program (in practice: helm) is started through a
//! [`ProcessRunner`]. `SystemRunner` spawns real processes, `MockRunner`
//! records invocations and answers from scripted handlers.

mod mock;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use console::style;

use crate::error::{Error, Result};

pub use mock::MockRunner;

/// Replacement for the secret value in logged command lines
pub const REDACTED: &str = "*****";

/// A single external program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory, the caller's current directory when `None`
    pub dir: Option<PathBuf>,
    /// Capture standard output instead of forwarding it
    pub capture_stdout: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
            capture_stdout: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    /// First argument, e.g. `fetch` for `helm fetch ...`
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Value following `flag`, if present
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// `program arg1 arg2 ...`
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Command line with every occurrence of `secret` replaced by [`REDACTED`]
    pub fn redacted(&self, secret: Option<&str>) -> String {
        redact(&self.command_line(), secret)
    }
}

/// Replace every occurrence of `secret` in `line`; an empty secret is a no-op
pub fn redact(line: &str, secret: Option<&str>) -> String {
    match secret {
        Some(secret) if !secret.is_empty() => line.replace(secret, REDACTED),
        _ => line.to_string(),
    }
}

/// Forward a child's captured standard error with `secret` redacted
pub fn echo_stderr<W: Write>(
    out: &mut W,
    stderr: &[u8],
    secret: Option<&str>,
) -> std::io::Result<()> {
    if stderr.is_empty() {
        return Ok(());
    }
    let text = redact(&String::from_utf8_lossy(stderr), secret);
    out.write_all(text.as_bytes())?;
    out.flush()
}

/// Capability to run external programs synchronously
pub trait ProcessRunner: Send + Sync {
    /// Run to completion. Returns captured standard output when
    /// `capture_stdout` is set, an empty buffer otherwise.
    fn run(&self, invocation: &Invocation) -> Result<Vec<u8>>;
}

/// Runs programs with `std::process::Command`
#[derive(Debug, Default, Clone)]
pub struct SystemRunner {
    secret: Option<String>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value to hide from logged command lines
    pub fn with_secret(mut self, secret: Option<String>) -> Self {
        self.secret = secret.filter(|s| !s.is_empty());
        self
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<Vec<u8>> {
        let line = invocation.redacted(self.secret.as_deref());
        println!("{}", style(&line).magenta());
        tracing::debug!(command = %line, dir = ?invocation.dir, "executing");

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stderr(Stdio::piped());
        if let Some(dir) = &invocation.dir {
            command.current_dir(dir);
        }
        if invocation.capture_stdout {
            command.stdout(Stdio::piped());
        } else {
            command.stdout(Stdio::inherit());
        }

        let output = command.output().map_err(|e| Error::Execution {
            command: line.clone(),
            exit_code: None,
            stderr: e.to_string(),
        })?;

        if let Err(e) = echo_stderr(
            &mut std::io::stderr(),
            &output.stderr,
            self.secret.as_deref(),
        ) {
            tracing::warn!(command = %line, error = %e, "failed to forward stderr");
        }

        if !output.status.success() {
            tracing::debug!(command = %line, status = ?output.status.code(), "command failed");
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Execution {
                command: line,
                exit_code: output.status.code(),
                stderr: redact(stderr.trim(), self.secret.as_deref()),
            });
        }

        Ok(output.stdout)
    }
}
