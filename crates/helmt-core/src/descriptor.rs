//! Chart descriptor (`helm-chart.yaml`) loading and validation
//!
//! ```yaml
//! chart: jenkins
//! version: 2.0.0
//! repository: https://kubernetes-charts.storage.googleapis.com
//! releaseName: jenkins
//! namespace: jenkins
//! valuesFiles:
//!   - values1.yaml
//!   - values2.yaml
//! skipCRDs: false
//! outputDirectory: manifests
//! apiVersions:
//!   - monitoring.coreos.com/v1
//! postProcess:
//!   generateKustomization: true
//! ```
//!
//! `name`, `values` and `outputDir` are accepted as older spellings of
//! `releaseName`, `valuesFiles` and `outputDirectory`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// A chart to fetch from a repository and render with `helm template`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDescriptor {
    /// Chart name within the repository
    #[serde(default, deserialize_with = "scalar_string")]
    pub chart: String,

    /// Chart version, passed through to helm untouched
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,

    /// Repository URL, either `https://...` or `oci://...`
    #[serde(default, deserialize_with = "scalar_string")]
    pub repository: String,

    /// Release name used by `helm template`
    #[serde(default, alias = "name", deserialize_with = "scalar_string")]
    pub release_name: String,

    #[serde(default)]
    pub namespace: Option<String>,

    /// Values files, later entries override earlier ones
    #[serde(default, alias = "values")]
    pub values_files: Vec<String>,

    #[serde(default, rename = "skipCRDs")]
    pub skip_crds: bool,

    #[serde(default, alias = "outputDir")]
    pub output_directory: Option<PathBuf>,

    #[serde(default)]
    pub api_versions: Vec<String>,

    #[serde(default)]
    pub post_process: PostProcess,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostProcess {
    #[serde(default)]
    pub generate_kustomization: bool,
}

impl ChartDescriptor {
    /// Read, parse and validate a descriptor file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let descriptor = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content).map_err(|source| Error::Parse {
                path: path.to_path_buf(),
                source,
            })?
        };

        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Check that the required fields are present, reporting the first missing one
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("chart", &self.chart),
            ("version", &self.version),
            ("repository", &self.repository),
            ("releaseName", &self.release_name),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::MissingField { field });
            }
        }
        Ok(())
    }

    /// Namespace, if one was given and is not blank
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    /// Directory the rendered chart is moved into (`<outputDirectory>/<chart>`)
    pub fn target_path(&self) -> PathBuf {
        let base = match &self.output_directory {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => PathBuf::from("."),
        };
        base.join(&self.chart)
    }
}

/// Accept any YAML scalar as a string so that `version: 1.0` is not rejected
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string, found {:?}",
            other
        ))),
    }
}
