//! Error types for chart rendering

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Failed to create temporary directory: {0}")]
    WorkDir(#[source] std::io::Error),

    /// External process returned non-zero or could not be started.
    /// `command` is the redacted command line.
    #[error("{}", execution_message(.command, .exit_code, .stderr))]
    Execution {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Unexpected content in temporary directory {dir}: {reason}")]
    Fetch { dir: PathBuf, reason: String },

    #[error("helm template failed: {0}")]
    Render(#[source] Box<Error>),

    #[error("Failed to generate kustomization in {path}: {source}")]
    Kustomization {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk rendered output: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to move rendered chart to {target}: {source}")]
    Relocation {
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn execution_message(command: &str, exit_code: &Option<i32>, stderr: &str) -> String {
    let mut message = match exit_code {
        Some(code) => format!("`{}` exited with status {}", command, code),
        None => format!("`{}` could not be run", command),
    };
    if !stderr.is_empty() {
        message.push_str(": ");
        message.push_str(stderr);
    }
    message
}

pub type Result<T> = std::result::Result<T, Error>;
