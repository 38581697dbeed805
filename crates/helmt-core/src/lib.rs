//! helmt core - fetch a chart with helm, render it, and post-process the output
//!
//! This crate provides the building blocks of the `helmt` command:
//! - `ChartDescriptor`: the `helm-chart.yaml` file describing what to render
//! - `ProcessRunner`: the capability used to invoke external programs
//! - `Helm`: argument assembly for `helm fetch`, `helm template` and `helm show chart`
//! - `kustomize`: generation of a `kustomization.yaml` listing rendered resources
//! - `Pipeline`: the end-to-end run, staged in a scoped working directory

pub mod descriptor;
pub mod error;
pub mod helm;
pub mod kustomize;
pub mod pipeline;
pub mod process;

pub use descriptor::{ChartDescriptor, PostProcess};
pub use error::{Error, Result};
pub use helm::{Credentials, Helm, RenderRequest, is_oci};
pub use pipeline::{Pipeline, Report, Stage};
pub use process::{Invocation, MockRunner, ProcessRunner, REDACTED, SystemRunner};
