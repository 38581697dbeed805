//! End-to-end run: load descriptor, fetch, render, post-process, relocate
//!
//! All intermediate files live in a scoped working directory which is removed
//! when the run ends, whatever the outcome.

use std::fmt;
use std::path::{Path, PathBuf};

use console::style;

use crate::descriptor::ChartDescriptor;
use crate::error::{Error, Result};
use crate::helm::{Credentials, Helm, RenderRequest};
use crate::kustomize;
use crate::process::ProcessRunner;

/// Progress of a run. A failure at any stage other than
/// `MetadataAttempted` moves the run to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    DescriptorLoaded,
    VersionChecked,
    Fetched,
    Rendered,
    MetadataAttempted,
    PostProcessed,
    Relocated,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::DescriptorLoaded => "descriptor loaded",
            Stage::VersionChecked => "version checked",
            Stage::Fetched => "fetched",
            Stage::Rendered => "rendered",
            Stage::MetadataAttempted => "metadata attempted",
            Stage::PostProcessed => "post-processed",
            Stage::Relocated => "relocated",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct Report {
    pub stage: Stage,
    pub descriptor: ChartDescriptor,
    /// File name of the fetched package
    pub package: String,
    /// Where the rendered chart ended up
    pub target: PathBuf,
    /// Set when `Chart.yaml` could not be retrieved
    pub metadata_warning: Option<String>,
    pub kustomization: bool,
}

/// Renders one chart descriptor
pub struct Pipeline<'r> {
    runner: &'r dyn ProcessRunner,
    helm_binary: String,
    credentials: Credentials,
    scratch_root: PathBuf,
}

impl<'r> Pipeline<'r> {
    pub fn new(runner: &'r dyn ProcessRunner) -> Self {
        Self {
            runner,
            helm_binary: "helm".to_string(),
            credentials: Credentials::default(),
            scratch_root: PathBuf::from("."),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_helm_binary(mut self, binary: impl Into<String>) -> Self {
        self.helm_binary = binary.into();
        self
    }

    /// Directory in which the working directory is created. Keep it on the
    /// same filesystem as the output directory so the final move is a rename.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    /// Run the whole sequence for the descriptor at `descriptor_path`
    pub fn run(&self, descriptor_path: &Path) -> Result<Report> {
        let work_dir = tempfile::Builder::new()
            .prefix("helmt")
            .tempdir_in(&self.scratch_root)
            .map_err(Error::WorkDir)?;
        tracing::debug!(work_dir = %work_dir.path().display(), "created working directory");

        let mut stage = Stage::Init;
        let result = self.run_in(work_dir.path(), descriptor_path, &mut stage);
        if let Err(e) = &result {
            tracing::debug!(last = %stage, to = %Stage::Failed, error = %e, "run failed");
        }
        result
        // work_dir dropped here, removing everything staged in it
    }

    /// Runs every step, leaving the last stage reached in `stage`
    fn run_in(
        &self,
        work_dir: &Path,
        descriptor_path: &Path,
        stage: &mut Stage,
    ) -> Result<Report> {
        let mut advance = |next: Stage| {
            tracing::debug!(from = %stage, to = %next, "stage");
            *stage = next;
        };

        let descriptor = ChartDescriptor::load(descriptor_path)?;
        advance(Stage::DescriptorLoaded);

        let helm = Helm::new(self.runner).with_binary(&self.helm_binary);
        helm.version()?;
        advance(Stage::VersionChecked);

        let package = helm.fetch(
            work_dir,
            &descriptor.repository,
            &descriptor.chart,
            &descriptor.version,
            &self.credentials,
        )?;
        advance(Stage::Fetched);

        let package_path = work_dir.join(&package);
        let request = RenderRequest {
            namespace: descriptor.namespace(),
            skip_crds: descriptor.skip_crds,
            values_files: &descriptor.values_files,
            api_versions: &descriptor.api_versions,
            ..RenderRequest::new(&descriptor.release_name, &package_path, work_dir)
        };
        helm.template(&request)?;
        advance(Stage::Rendered);

        let metadata_warning = match helm.download_metadata(
            work_dir,
            &descriptor.chart,
            &descriptor.repository,
            &descriptor.version,
        ) {
            Ok(_) => None,
            Err(e) => {
                let warning = format!("Could not retrieve Chart.yaml ({})", e);
                eprintln!("{} {}", style("Warning:").yellow().bold(), warning);
                Some(warning)
            }
        };
        advance(Stage::MetadataAttempted);

        let rendered = work_dir.join(&descriptor.chart);
        let kustomization = descriptor.post_process.generate_kustomization;
        if kustomization {
            kustomize::generate(&rendered)?;
        }
        advance(Stage::PostProcessed);

        let target = descriptor.target_path();
        relocate(&rendered, &target)?;
        advance(Stage::Relocated);

        advance(Stage::Done);
        Ok(Report {
            stage: Stage::Done,
            descriptor,
            package,
            target,
            metadata_warning,
            kustomization,
        })
    }
}

/// Replace whatever is at `target` with `rendered`
fn relocate(rendered: &Path, target: &Path) -> Result<()> {
    let wrap = |source| Error::Relocation {
        target: target.to_path_buf(),
        source,
    };

    match std::fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(target).map_err(wrap)?,
        Ok(_) => std::fs::remove_file(target).map_err(wrap)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(wrap(e)),
    }

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(wrap)?;
    }
    std::fs::rename(rendered, target).map_err(wrap)?;

    tracing::debug!(from = %rendered.display(), to = %target.display(), "moved rendered chart");
    Ok(())
}
