//! `kustomization.yaml` generation for rendered charts

use std::io::Write;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";

const HEADER: &str = "apiVersion: kustomize.config.k8s.io/v1beta1\nkind: Kustomization\nresources:\n";

/// Relative paths of every regular file below `directory`, sorted, excluding
/// the root `kustomization.yaml`. Separators are always `/`.
pub fn resources(directory: &Path) -> Result<Vec<String>> {
    let mut resources = Vec::new();

    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = match entry.path().strip_prefix(directory) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        if rel == Path::new(KUSTOMIZATION_FILE) {
            continue;
        }

        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        resources.push(rel);
    }

    resources.sort();
    Ok(resources)
}

/// Render the manifest body for `resources`
pub fn render(resources: &[String]) -> String {
    let mut out = String::from(HEADER);
    for resource in resources {
        out.push_str("  - ");
        out.push_str(resource);
        out.push('\n');
    }
    out
}

/// Write `<directory>/kustomization.yaml` listing every rendered file
pub fn generate(directory: &Path) -> Result<PathBuf> {
    let resources = resources(directory)?;
    let path = directory.join(KUSTOMIZATION_FILE);

    let write = || -> std::io::Result<()> {
        let mut file = std::fs::File::create(&path)?;
        file.write_all(render(&resources).as_bytes())?;
        file.flush()
    };
    write().map_err(|source| Error::Kustomization {
        path: directory.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), resources = resources.len(), "wrote kustomization");
    Ok(path)
}
