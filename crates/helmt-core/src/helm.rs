//! helm invocations: version check, chart fetch, template rendering and metadata
//!
//! Argument order is fixed so that a given descriptor always produces the
//! same command lines.

use std::path::{Path, PathBuf};

use console::style;

use crate::error::{Error, Result};
use crate::process::{Invocation, ProcessRunner};

const OCI_SCHEME: &str = "oci://";
const PACKAGE_EXTENSION: &str = "tgz";

/// Whether `repository` is an OCI registry reference
pub fn is_oci(repository: &str) -> bool {
    repository.starts_with(OCI_SCHEME)
}

/// Optional chart repository credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self {
            username: username.filter(|u| !u.is_empty()),
            password: password.filter(|p| !p.is_empty()),
        }
    }
}

/// Everything `helm template` needs
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub release_name: &'a str,
    pub package: &'a Path,
    pub namespace: Option<&'a str>,
    pub skip_crds: bool,
    pub values_files: &'a [String],
    pub output_dir: &'a Path,
    pub api_versions: &'a [String],
}

impl<'a> RenderRequest<'a> {
    pub fn new(release_name: &'a str, package: &'a Path, output_dir: &'a Path) -> Self {
        Self {
            release_name,
            package,
            namespace: None,
            skip_crds: false,
            values_files: &[],
            output_dir,
            api_versions: &[],
        }
    }
}

/// Arguments for `helm fetch`
pub fn fetch_args(
    destination: &Path,
    repository: &str,
    chart: &str,
    version: &str,
    credentials: &Credentials,
) -> Vec<String> {
    let oci = is_oci(repository);
    let mut args = vec!["fetch".to_string()];

    if oci {
        args.push(format!("{}/{}", repository, chart));
    } else {
        args.push("--repo".to_string());
        args.push(repository.to_string());
    }
    args.push("--version".to_string());
    args.push(version.to_string());
    args.push("--destination".to_string());
    args.push(destination.display().to_string());

    if let Some(username) = &credentials.username {
        args.push("--username".to_string());
        args.push(username.clone());
    }
    if let Some(password) = &credentials.password {
        args.push("--password".to_string());
        args.push(password.clone());
    }

    if !oci {
        args.push(chart.to_string());
    }
    args
}

/// Arguments for `helm template`
pub fn template_args(request: &RenderRequest<'_>) -> Vec<String> {
    let mut args = vec![
        "template".to_string(),
        request.release_name.to_string(),
        request.package.display().to_string(),
    ];

    if let Some(namespace) = request.namespace.filter(|ns| !ns.is_empty()) {
        args.push("--namespace".to_string());
        args.push(namespace.to_string());
    }
    if !request.skip_crds {
        args.push("--include-crds".to_string());
    }
    args.push("--skip-tests".to_string());
    for values in request.values_files {
        args.push("--values".to_string());
        args.push(values.clone());
    }
    args.push("--output-dir".to_string());
    args.push(request.output_dir.display().to_string());
    for api_version in request.api_versions {
        args.push("--api-versions".to_string());
        args.push(api_version.clone());
    }
    args
}

/// Arguments for `helm show chart`
pub fn show_chart_args(chart: &str, repository: &str, version: &str) -> Vec<String> {
    let mut args = vec!["show".to_string(), "chart".to_string()];
    if is_oci(repository) {
        args.push(format!("{}/{}", repository, chart));
    } else {
        args.push(chart.to_string());
        args.push("--repo".to_string());
        args.push(repository.to_string());
    }
    args.push("--version".to_string());
    args.push(version.to_string());
    args
}

/// helm driven through a [`ProcessRunner`]
pub struct Helm<'r> {
    runner: &'r dyn ProcessRunner,
    binary: String,
}

impl<'r> Helm<'r> {
    pub fn new(runner: &'r dyn ProcessRunner) -> Self {
        Self {
            runner,
            binary: "helm".to_string(),
        }
    }

    /// Use a different helm executable
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(&self.binary)
    }

    /// `helm version`, used to check that helm is available
    pub fn version(&self) -> Result<()> {
        self.runner.run(&self.invocation().arg("version"))?;
        Ok(())
    }

    /// Download the chart package into `work_dir` and return its file name
    pub fn fetch(
        &self,
        work_dir: &Path,
        repository: &str,
        chart: &str,
        version: &str,
        credentials: &Credentials,
    ) -> Result<String> {
        let args = fetch_args(work_dir, repository, chart, version, credentials);
        self.runner.run(&self.invocation().args(args))?;

        let package = find_chart_package(work_dir, chart, version)?;
        println!("{}", style(format!("downloaded {}", package)).magenta());
        Ok(package)
    }

    /// Render the chart package into `request.output_dir`
    pub fn template(&self, request: &RenderRequest<'_>) -> Result<()> {
        self.runner
            .run(&self.invocation().args(template_args(request)))
            .map_err(|e| Error::Render(Box::new(e)))?;
        Ok(())
    }

    /// Fetch `Chart.yaml` of the remote chart and write it to
    /// `<work_dir>/<chart>/Chart.yaml`
    pub fn download_metadata(
        &self,
        work_dir: &Path,
        chart: &str,
        repository: &str,
        version: &str,
    ) -> Result<PathBuf> {
        // helm prefers a local directory named like the chart over the remote
        // one (helm/helm#6864), so run outside the output directory.
        let invocation = self
            .invocation()
            .args(show_chart_args(chart, repository, version))
            .current_dir(std::env::temp_dir())
            .capture_stdout();
        let metadata = self.runner.run(&invocation)?;

        let target = work_dir.join(chart).join("Chart.yaml");
        std::fs::write(&target, metadata)?;
        Ok(target)
    }
}

/// Locate the package written by `helm fetch`
///
/// The expected `<name>-<version>.tgz` wins; otherwise there must be exactly
/// one archive in the directory.
pub fn find_chart_package(dir: &Path, chart: &str, version: &str) -> Result<String> {
    let name = chart.rsplit('/').next().unwrap_or(chart);
    let expected = format!("{}-{}.{}", name, version, PACKAGE_EXTENSION);
    if dir.join(&expected).is_file() {
        return Ok(expected);
    }

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == PACKAGE_EXTENSION) {
            candidates.push(entry.file_name().to_string_lossy().to_string());
        }
    }

    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(Error::Fetch {
            dir: dir.to_path_buf(),
            reason: "no chart package found".to_string(),
        }),
        n => {
            candidates.sort();
            Err(Error::Fetch {
                dir: dir.to_path_buf(),
                reason: format!("{} chart packages found: {}", n, candidates.join(", ")),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::MockRunner;
    use tempfile::TempDir;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fetch_args_conventional_repository() {
        let args = fetch_args(
            Path::new("/tmp/helmt1"),
            "https://example/charts",
            "jenkins",
            "2.0.0",
            &Credentials::default(),
        );
        assert_eq!(
            args.join(" "),
            "fetch --repo https://example/charts --version 2.0.0 --destination /tmp/helmt1 jenkins"
        );
    }

    #[test]
    fn test_fetch_args_oci_repository() {
        let args = fetch_args(
            Path::new("/tmp/helmt1"),
            "oci://registry.example/charts",
            "jenkins",
            "2.0.0",
            &Credentials::new(Some("admin".to_string()), Some("pw".to_string())),
        );
        assert_eq!(
            args.join(" "),
            "fetch oci://registry.example/charts/jenkins --version 2.0.0 --destination /tmp/helmt1 --username admin --password pw"
        );
    }

    #[test]
    fn test_fetch_args_skip_empty_credentials() {
        let creds = Credentials::new(Some(String::new()), Some(String::new()));
        let args = fetch_args(Path::new("d"), "https://r", "c", "1", &creds);
        assert!(!args.contains(&"--username".to_string()));
        assert!(!args.contains(&"--password".to_string()));
    }

    #[test]
    fn test_template_args_minimal() {
        let request = RenderRequest::new(
            "something",
            Path::new("tmp/jenkins-2.0.0.tgz"),
            Path::new("tmp"),
        );
        assert_eq!(
            template_args(&request).join(" "),
            "template something tmp/jenkins-2.0.0.tgz --include-crds --skip-tests --output-dir tmp"
        );
    }

    #[test]
    fn test_template_args_full() {
        let values = strings(&["values1.yaml", "values2.yaml"]);
        let api_versions = strings(&["a/v1", "b/v1"]);
        let request = RenderRequest {
            release_name: "jenkins",
            package: Path::new("tmp/syncier-jenkins-5.6.0.tgz"),
            namespace: Some("jenkins"),
            skip_crds: false,
            values_files: &values,
            output_dir: Path::new("tmp"),
            api_versions: &api_versions,
        };
        assert_eq!(
            template_args(&request).join(" "),
            "template jenkins tmp/syncier-jenkins-5.6.0.tgz --namespace jenkins --include-crds --skip-tests --values values1.yaml --values values2.yaml --output-dir tmp --api-versions a/v1 --api-versions b/v1"
        );
    }

    #[test]
    fn test_template_args_skip_crds() {
        let request = RenderRequest {
            skip_crds: true,
            ..RenderRequest::new("r", Path::new("p.tgz"), Path::new("o"))
        };
        assert!(!template_args(&request).contains(&"--include-crds".to_string()));
    }

    #[test]
    fn test_show_chart_args() {
        assert_eq!(
            show_chart_args("jenkins", "https://example/charts", "2.0.0").join(" "),
            "show chart jenkins --repo https://example/charts --version 2.0.0"
        );
        assert_eq!(
            show_chart_args("jenkins", "oci://registry.example/charts", "2.0.0").join(" "),
            "show chart oci://registry.example/charts/jenkins --version 2.0.0"
        );
    }

    #[test]
    fn test_find_chart_package_prefers_expected_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("jenkins-2.0.0.tgz"), b"").unwrap();
        std::fs::write(dir.path().join("other-1.0.0.tgz"), b"").unwrap();
        assert_eq!(
            find_chart_package(dir.path(), "stable/jenkins", "2.0.0").unwrap(),
            "jenkins-2.0.0.tgz"
        );
    }

    #[test]
    fn test_find_chart_package_single_archive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("renamed.tgz"), b"").unwrap();
        std::fs::write(dir.path().join("README.md"), b"").unwrap();
        assert_eq!(
            find_chart_package(dir.path(), "jenkins", "2.0.0").unwrap(),
            "renamed.tgz"
        );
    }

    #[test]
    fn test_find_chart_package_unexpected_content() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            find_chart_package(dir.path(), "jenkins", "2.0.0"),
            Err(Error::Fetch { .. })
        ));

        std::fs::write(dir.path().join("a.tgz"), b"").unwrap();
        std::fs::write(dir.path().join("b.tgz"), b"").unwrap();
        assert!(matches!(
            find_chart_package(dir.path(), "jenkins", "2.0.0"),
            Err(Error::Fetch { .. })
        ));
    }

    #[test]
    fn test_version_invocation() {
        let runner = MockRunner::new();
        Helm::new(&runner).version().unwrap();
        assert_eq!(runner.command_lines(), vec!["helm version"]);
    }

    #[test]
    fn test_custom_binary() {
        let runner = MockRunner::new();
        Helm::new(&runner).with_binary("helm3").version().unwrap();
        assert_eq!(runner.command_lines(), vec!["helm3 version"]);
    }

    #[test]
    fn test_template_failure_is_wrapped() {
        let runner = MockRunner::new().fail("template", 1, "parse error");
        let request = RenderRequest::new("r", Path::new("p.tgz"), Path::new("o"));
        let err = Helm::new(&runner).template(&request).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
        assert!(err.to_string().starts_with("helm template failed:"));
    }

    #[test]
    fn test_download_metadata_writes_chart_yaml() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("jenkins")).unwrap();
        let runner =
            MockRunner::new().on("show", |_| Ok(b"name: jenkins\nversion: 2.0.0\n".to_vec()));

        let written = Helm::new(&runner)
            .download_metadata(dir.path(), "jenkins", "https://example/charts", "2.0.0")
            .unwrap();

        assert_eq!(written, dir.path().join("jenkins").join("Chart.yaml"));
        assert_eq!(
            std::fs::read_to_string(&written).unwrap(),
            "name: jenkins\nversion: 2.0.0\n"
        );
        let invocation = &runner.invocations()[0];
        assert!(invocation.capture_stdout);
        assert_eq!(invocation.dir.as_deref(), Some(std::env::temp_dir().as_path()));
    }
}
