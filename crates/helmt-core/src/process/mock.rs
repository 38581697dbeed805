//! Scripted process runner for tests

use std::collections::HashMap;
use std::sync::Mutex;

use super::{Invocation, ProcessRunner};
use crate::error::{Error, Result};

type Handler = Box<dyn Fn(&Invocation) -> Result<Vec<u8>> + Send + Sync>;

/// Records every invocation instead of spawning processes
///
/// Responses are scripted per subcommand (the first argument). Unscripted
/// subcommands succeed with empty output.
#[derive(Default)]
pub struct MockRunner {
    secret: Option<String>,
    handlers: HashMap<String, Handler>,
    calls: Mutex<Vec<Invocation>>,
    logged: Mutex<Vec<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value to hide from logged command lines
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into()).filter(|s| !s.is_empty());
        self
    }

    /// Answer invocations of `subcommand` with `handler`
    pub fn on<F>(mut self, subcommand: &str, handler: F) -> Self
    where
        F: Fn(&Invocation) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.handlers.insert(subcommand.to_string(), Box::new(handler));
        self
    }

    /// Make invocations of `subcommand` exit with `exit_code`
    pub fn fail(self, subcommand: &str, exit_code: i32, stderr: &str) -> Self {
        let stderr = stderr.to_string();
        self.on(subcommand, move |inv| {
            Err(Error::Execution {
                command: inv.command_line(),
                exit_code: Some(exit_code),
                stderr: stderr.clone(),
            })
        })
    }

    /// Invocations in the order they were run
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Unredacted command lines in the order they were run
    pub fn command_lines(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(Invocation::command_line)
            .collect()
    }

    /// Command lines as they would have been logged
    pub fn logged_lines(&self) -> Vec<String> {
        self.logged.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, invocation: &Invocation) -> Result<Vec<u8>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }
        if let Ok(mut logged) = self.logged.lock() {
            logged.push(invocation.redacted(self.secret.as_deref()));
        }

        match invocation
            .subcommand()
            .and_then(|sub| self.handlers.get(sub))
        {
            Some(handler) => handler(invocation),
            None => Ok(Vec::new()),
        }
    }
}
