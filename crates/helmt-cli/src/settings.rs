//! User settings
//!
//! Read from `--config <path>` or `~/.helmt.yaml`. Command-line flags and
//! `HELMT_*` environment variables take precedence over the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CliError, Result};

const DEFAULT_FILE_NAME: &str = ".helmt.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Chart repository username
    #[serde(default)]
    pub username: Option<String>,

    /// Chart repository password
    #[serde(default)]
    pub password: Option<String>,

    /// helm executable
    #[serde(default)]
    pub helm: Option<String>,

    /// File the settings were read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `explicit` or from the default location.
    ///
    /// A missing default file yields empty settings; an explicit file that
    /// cannot be read is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut settings: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                CliError::config(format!("failed to parse {}: {}", path.display(), e))
            })?
        };
        settings.source = Some(path.to_path_buf());
        Ok(settings)
    }

    /// `~/.helmt.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_FILE_NAME))
    }

    /// Flag/environment value if set, settings file value otherwise
    pub fn resolve(flag: Option<String>, file: Option<&String>) -> Option<String> {
        flag.filter(|v| !v.is_empty())
            .or_else(|| file.filter(|v| !v.is_empty()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("helmt.yaml");
        std::fs::write(
            &path,
            "username: admin\npassword: pw\nhelm: /usr/local/bin/helm\n",
        )
        .unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.username.as_deref(), Some("admin"));
        assert_eq!(settings.password.as_deref(), Some("pw"));
        assert_eq!(settings.helm.as_deref(), Some("/usr/local/bin/helm"));
        assert_eq!(settings.source, Some(path));
    }

    #[test]
    fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("helmt.yaml");
        std::fs::write(&path, "").unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.username, None);
        assert_eq!(settings.source, Some(path));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Settings::load(Some(dir.path().join("absent.yaml").as_path())).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("helmt.yaml");
        std::fs::write(&path, "username: [oops\n").unwrap();
        assert!(Settings::load(Some(path.as_path())).is_err());
    }

    #[test]
    fn test_resolve_precedence() {
        let file = "from-file".to_string();
        assert_eq!(
            Settings::resolve(Some("from-flag".to_string()), Some(&file)),
            Some("from-flag".to_string())
        );
        assert_eq!(
            Settings::resolve(Some(String::new()), Some(&file)),
            Some("from-file".to_string())
        );
        assert_eq!(Settings::resolve(None, Some(&file)), Some("from-file".to_string()));
        assert_eq!(Settings::resolve(None, None), None);
    }
}
