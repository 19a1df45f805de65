//! Shadow files and the overlay manifest.
//!
//! Each rewritten file is stored in the cache directory as
//! `<stem>_<hash>.go`, where `<hash>` is the first 12 hex digits of the
//! SHA-256 of its content. The manifest maps original absolute paths to
//! shadow absolute paths in the `go build -overlay` format:
//!
//! ```json
//! {
//!   "Replace": {
//!     "/abs/pkg/file.go": "/abs/.inco_cache/file_0123456789ab.go"
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{IncoError, Result};

/// Manifest file name inside the cache directory.
pub const MANIFEST_FILE: &str = "overlay.json";

/// Hex digits of the content hash kept in shadow names.
const HASH_PREFIX: usize = 12;

/// Original-to-shadow path mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "Replace")]
    pub replace: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, original: &Path, shadow: &Path) {
        self.replace.insert(
            original.display().to_string(),
            shadow.display().to_string(),
        );
    }

    pub fn len(&self) -> usize {
        self.replace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replace.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the manifest to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?).map_err(|source| IncoError::WriteManifest {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Hex SHA-256 of `content`.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Shadow file name for `original` holding `content`.
pub fn shadow_name(original: &Path, content: &str) -> String {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let hash = content_hash(content);
    format!("{stem}_{}.go", &hash[..HASH_PREFIX])
}

/// Writes shadow files, creating the cache directory on first use.
#[derive(Debug)]
pub struct ShadowWriter {
    dir: PathBuf,
    created: bool,
}

impl ShadowWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            created: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store `content` as the shadow of `original`, returning its path.
    pub fn write(&mut self, original: &Path, content: &str) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(shadow_name(original, content));
        fs::write(&path, content).map_err(|source| IncoError::WriteShadow {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Write the manifest into the cache directory.
    pub fn write_manifest(&mut self, manifest: &Manifest) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(MANIFEST_FILE);
        manifest.write(&path)?;
        Ok(path)
    }

    fn ensure_dir(&mut self) -> Result<()> {
        if !self.created {
            fs::create_dir_all(&self.dir).map_err(|source| IncoError::CreateCacheDir {
                path: self.dir.clone(),
                source,
            })?;
            self.created = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_shadow_name_is_deterministic() {
        let a = shadow_name(Path::new("/src/pkg/handler.go"), "package pkg\n");
        let b = shadow_name(Path::new("/other/handler.go"), "package pkg\n");
        assert_eq!(a, b);
        assert!(a.starts_with("handler_"));
        assert!(a.ends_with(".go"));
        assert_eq!(a.len(), "handler_".len() + HASH_PREFIX + ".go".len());
        assert_ne!(a, shadow_name(Path::new("/src/pkg/handler.go"), "package x\n"));
    }

    #[test]
    fn test_manifest_json_shape() {
        let mut manifest = Manifest::new();
        manifest.record(Path::new("/src/b.go"), Path::new("/c/b_1.go"));
        manifest.record(Path::new("/src/a.go"), Path::new("/c/a_1.go"));
        assert_eq!(
            manifest.to_json().unwrap(),
            "{\n  \"Replace\": {\n    \"/src/a.go\": \"/c/a_1.go\",\n    \"/src/b.go\": \"/c/b_1.go\"\n  }\n}"
        );
    }

    #[test]
    fn test_writer_creates_dir_lazily() {
        let temp = TempDir::new().unwrap();
        let cache = temp.path().join(".inco_cache");
        let mut writer = ShadowWriter::new(&cache);
        assert!(!cache.exists());

        let path = writer
            .write(Path::new("/src/main.go"), "package main\n")
            .unwrap();
        assert!(cache.is_dir());
        assert_eq!(fs::read_to_string(&path).unwrap(), "package main\n");
        assert_eq!(path.parent().unwrap(), cache);
    }
}
