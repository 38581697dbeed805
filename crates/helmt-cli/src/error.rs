//! CLI error types with exit code handling

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Descriptor is missing a required field
    #[error("Validation failed: {message}")]
    #[diagnostic(code(helmt::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Descriptor could not be parsed
    #[error("Invalid descriptor: {message}")]
    #[diagnostic(code(helmt::descriptor))]
    Descriptor {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// `helm template` failed
    #[error("{message}")]
    #[diagnostic(code(helmt::template))]
    Template {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(helmt::io))]
    Io { message: String },

    /// Settings file could not be loaded
    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(helmt::config))]
    Config { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(helmt::error))]
    Other {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Descriptor { .. } => exit_codes::DESCRIPTOR_ERROR,
            CliError::Template { .. } => exit_codes::TEMPLATE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Config { .. } => exit_codes::ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<helmt_core::Error> for CliError {
    fn from(err: helmt_core::Error) -> Self {
        use helmt_core::Error;

        let message = err.to_string();
        match err {
            Error::MissingField { field } => CliError::Validation {
                message,
                help: Some(format!(
                    "add `{}` to the chart descriptor (required: chart, version, repository, releaseName)",
                    field
                )),
            },
            Error::Parse { .. } => CliError::Descriptor {
                message,
                help: Some("the chart descriptor must be a YAML mapping".to_string()),
            },
            Error::Render(_) => CliError::Template {
                message,
                help: Some("check the values files and apiVersions passed to helm".to_string()),
            },
            Error::Read { .. }
            | Error::Io(_)
            | Error::WorkDir(_)
            | Error::Kustomization { .. }
            | Error::Walk(_) => CliError::Io { message },
            Error::Execution { exit_code: None, .. } => CliError::Other {
                message,
                help: Some("is helm installed and on PATH? use --helm to point at it".to_string()),
            },
            Error::Execution { .. } | Error::Fetch { .. } | Error::Relocation { .. } => {
                CliError::Other {
                    message,
                    help: None,
                }
            }
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_maps_to_validation() {
        let err = CliError::from(helmt_core::Error::MissingField { field: "chart" });
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_ERROR);
        assert_eq!(err.to_string(), "Validation failed: Missing required field: chart");
    }

    #[test]
    fn test_render_maps_to_template() {
        let err = CliError::from(helmt_core::Error::Render(Box::new(
            helmt_core::Error::Execution {
                command: "helm template".to_string(),
                exit_code: Some(1),
                stderr: String::new(),
            },
        )));
        assert_eq!(err.exit_code(), exit_codes::TEMPLATE_ERROR);
    }

    #[test]
    fn test_unlaunchable_helm_has_help() {
        let err = CliError::from(helmt_core::Error::Execution {
            command: "helm version".to_string(),
            exit_code: None,
            stderr: "No such file or directory".to_string(),
        });
        assert_eq!(err.exit_code(), exit_codes::ERROR);
        assert!(matches!(err, CliError::Other { help: Some(_), .. }));
    }

    #[test]
    fn test_unreadable_descriptor_maps_to_io() {
        let err = CliError::from(helmt_core::Error::Read {
            path: "helm-chart.yaml".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        });
        assert_eq!(err.exit_code(), exit_codes::IO_ERROR);
    }
}
