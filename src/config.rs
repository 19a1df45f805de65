//! Optional YAML configuration.
//!
//! Looked up at the processed root as `inco.yaml`, then `.inco.yaml`. Every
//! field has a default, so a missing file is the same as an empty one.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{IncoError, Result};

/// Config file names tried at the root, in order.
pub const CONFIG_FILES: &[&str] = &["inco.yaml", ".inco.yaml"];

fn default_cache_dir() -> String {
    ".inco_cache".to_string()
}

fn default_ignore_file() -> String {
    ".incoignore".to_string()
}

fn default_skip_dirs() -> Vec<String> {
    vec!["vendor".to_string(), "testdata".to_string()]
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    /// Shadow and manifest directory, relative to the root.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    /// Name of the per-directory ignore file.
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,
    /// Glob patterns for root-relative paths to skip (e.g. "**/gen/**").
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Directory names never descended into. Hidden directories are
    /// always skipped.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            ignore_file: default_ignore_file(),
            excluded_paths: Vec::new(),
            skip_dirs: default_skip_dirs(),
        }
    }
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| IncoError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content, path)
    }

    fn parse_str(content: &str, path: &Path) -> Result<Self> {
        let invalid = |message: String| IncoError::Config {
            path: path.to_path_buf(),
            message,
        };
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| invalid(e.to_string()))?
        };
        config.validate().map_err(invalid)?;
        Ok(config)
    }

    /// Load the config found at `root`, or the defaults.
    pub fn discover(root: &Path) -> Result<Self> {
        match Self::find(root) {
            Some(path) => Self::parse_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Path of the first config file present at `root`.
    pub fn find(root: &Path) -> Option<PathBuf> {
        CONFIG_FILES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.cache_dir.trim().is_empty() {
            return Err("cache_dir must not be empty".to_string());
        }
        if self.ignore_file.trim().is_empty() || self.ignore_file.contains('/') {
            return Err(format!("invalid ignore_file {:?}", self.ignore_file));
        }
        for pattern in &self.excluded_paths {
            Glob::new(pattern)
                .map_err(|e| format!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
        }
        Ok(())
    }

    /// Compiled `excluded_paths`.
    pub fn exclusions(&self) -> GlobSet {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            if let Ok(glob) = Glob::new(pattern) {
                builder.add(glob);
            }
        }
        builder.build().unwrap_or_else(|_| GlobSet::empty())
    }

    /// Absolute cache directory for `root`.
    pub fn cache_dir_in(&self, root: &Path) -> PathBuf {
        root.join(&self.cache_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
cache_dir: build/inco
excluded_paths:
  - "**/gen/**"
skip_dirs: [vendor]
"#;
        let config = Config::parse_str(yaml, Path::new("inco.yaml")).unwrap();
        assert_eq!(config.cache_dir, "build/inco");
        assert_eq!(config.ignore_file, ".incoignore");
        assert_eq!(config.skip_dirs, vec!["vendor"]);
        assert!(config.exclusions().is_match("api/gen/types.go"));
        assert!(!config.exclusions().is_match("api/types.go"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::parse_str("", Path::new("inco.yaml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.skip_dirs, vec!["vendor", "testdata"]);
    }

    #[test]
    fn test_invalid_config() {
        let err = Config::parse_str("excluded_paths: [\"a[\"]\n", Path::new("inco.yaml"))
            .unwrap_err();
        assert!(err.to_string().contains("excluded_paths"));
        assert!(Config::parse_str("cache_dir: [1, 2]\n", Path::new("inco.yaml")).is_err());
    }

    #[test]
    fn test_discover() {
        let temp = TempDir::new().unwrap();
        assert_eq!(Config::discover(temp.path()).unwrap(), Config::default());

        fs::write(temp.path().join(".inco.yaml"), "cache_dir: .shadow\n").unwrap();
        assert_eq!(Config::discover(temp.path()).unwrap().cache_dir, ".shadow");

        fs::write(temp.path().join("inco.yaml"), "cache_dir: .first\n").unwrap();
        assert_eq!(Config::discover(temp.path()).unwrap().cache_dir, ".first");
    }
}
