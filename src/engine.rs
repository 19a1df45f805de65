//! Pipeline orchestration.
//!
//! [`Engine::run`] selects files under the root and, for each one, loads
//! (once per directory) a [`PackageContext`], injects guards, re-syncs
//! line numbers and writes the shadow file. The manifest is written once at
//! the end, and only when at least one shadow was produced. The first fatal
//! error aborts the run before the manifest is written.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{IncoError, Result};
use crate::inject::Injector;
use crate::manifest::{Manifest, ShadowWriter, MANIFEST_FILE};
use crate::oracle::package::PackageIndex;
use crate::oracle::PackageOracle;
use crate::remap::remap;
use crate::select::FileSelector;
use crate::syntax::{GoParser, SourceFile};

/// Parsed non-test files of one directory plus their declaration index.
pub struct PackageContext {
    pub dir: PathBuf,
    pub files: Vec<SourceFile>,
    pub index: PackageIndex,
}

impl PackageContext {
    /// Parse every non-test `.go` file in `dir`.
    pub fn load(parser: &GoParser, dir: &Path) -> Result<Self> {
        let read_err = |source| IncoError::Read {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if path.is_file() && name.ends_with(".go") && !name.ends_with("_test.go") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        let mut broken = Vec::new();
        for path in paths {
            let source = fs::read_to_string(&path).map_err(|source| IncoError::Read {
                path: path.clone(),
                source,
            })?;
            let file = parser.parse(&path, source)?;
            if file.has_errors() {
                broken.push(path.display().to_string());
            }
            files.push(file);
        }
        if !broken.is_empty() {
            warn!(
                "{}: syntax errors in {}; type resolution may be incomplete",
                dir.display(),
                broken.join(", ")
            );
        }

        let index = PackageIndex::build(&files);
        debug!(
            "{}: loaded package {} ({} file(s))",
            dir.display(),
            index.name.as_deref().unwrap_or("?"),
            files.len()
        );
        Ok(Self {
            dir: dir.to_path_buf(),
            files,
            index,
        })
    }

    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn oracle(&self) -> PackageOracle<'_> {
        PackageOracle::new(&self.index, &self.files)
    }

    /// Shadow text for `path`; `None` when the file holds no directives.
    pub fn render(&self, parser: &GoParser, path: &Path) -> Result<Option<String>> {
        let file = self.file(path).ok_or_else(|| IncoError::FileNotInPackage {
            path: path.to_path_buf(),
        })?;
        let oracle = self.oracle();
        let Some(injection) = Injector::new(&oracle, parser).inject(file)? else {
            return Ok(None);
        };
        Ok(Some(remap(
            &injection.generated,
            &file.path,
            &injection.reference,
            &injection.stripped,
        )))
    }
}

/// Contract compiler rooted at one directory.
pub struct Engine {
    root: PathBuf,
    config: Config,
    cache_dir: PathBuf,
    parser: GoParser,
    manifest: Manifest,
    packages: HashMap<PathBuf, PackageContext>,
}

impl Engine {
    /// Engine for `root`, configured from the config file found there.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = canonical_root(root.as_ref())?;
        let config = Config::discover(&root)?;
        Ok(Self::build(root, config))
    }

    pub fn with_config(root: impl AsRef<Path>, config: Config) -> Result<Self> {
        let root = canonical_root(root.as_ref())?;
        Ok(Self::build(root, config))
    }

    fn build(root: PathBuf, config: Config) -> Self {
        let cache_dir = config.cache_dir_in(&root);
        Self {
            root,
            config,
            cache_dir,
            parser: GoParser::new(),
            manifest: Manifest::new(),
            packages: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.cache_dir.join(MANIFEST_FILE)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Process every selected file and write the manifest.
    pub fn run(&mut self) -> Result<Manifest> {
        let files = FileSelector::new(&self.root, &self.config).collect()?;
        debug!("{} file(s) selected under {}", files.len(), self.root.display());

        let mut writer = ShadowWriter::new(&self.cache_dir);
        let result = files
            .iter()
            .try_for_each(|path| self.process_file(path, &mut writer).map(|_| ()));
        self.packages.clear();
        result?;

        if self.manifest.is_empty() {
            debug!("no contracts found under {}", self.root.display());
        } else {
            let path = writer.write_manifest(&self.manifest)?;
            info!(
                "overlay written to {} ({} file(s) mapped)",
                path.display(),
                self.manifest.len()
            );
        }
        Ok(self.manifest.clone())
    }

    /// Generate the shadow of one file, recording it in the manifest.
    ///
    /// Returns the shadow path, or `None` for a file without directives.
    pub fn process_file(&mut self, path: &Path, writer: &mut ShadowWriter) -> Result<Option<PathBuf>> {
        let dir = path.parent().unwrap_or(&self.root).to_path_buf();
        let context = match self.packages.entry(dir) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let context = PackageContext::load(&self.parser, entry.key())?;
                entry.insert(context)
            }
        };

        let Some(shadow) = context.render(&self.parser, path)? else {
            return Ok(None);
        };
        let shadow_path = writer.write(path, &shadow)?;
        debug!("{} -> {}", path.display(), shadow_path.display());
        self.manifest.record(path, &shadow_path);
        Ok(Some(shadow_path))
    }

    /// Remove the cache directory. Returns whether it existed.
    pub fn clean(&self) -> Result<bool> {
        if !self.cache_dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.cache_dir).map_err(|source| IncoError::RemoveCacheDir {
            path: self.cache_dir.clone(),
            source,
        })?;
        info!("removed {}", self.cache_dir.display());
        Ok(true)
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    root.canonicalize().map_err(|source| IncoError::Read {
        path: root.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for (name, content) in files {
            let path = temp.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        temp
    }

    #[test]
    fn test_package_context_indexes_siblings() {
        let temp = setup(&[
            ("a.go", "package p\n\ntype User struct{}\n"),
            ("b.go", "package p\n\nfunc Load() (*User, error) { return nil, nil }\n"),
            ("b_test.go", "package p\n"),
        ]);
        let context = PackageContext::load(&GoParser::new(), temp.path()).unwrap();
        assert_eq!(context.files.len(), 2);
        assert!(context.index.type_decl("User").is_some());
        assert!(context.index.func("Load").is_some());
        assert!(context.file(&temp.path().join("b.go")).is_some());
    }

    #[test]
    fn test_render_unknown_file() {
        let temp = setup(&[("a.go", "package p\n")]);
        let context = PackageContext::load(&GoParser::new(), temp.path()).unwrap();
        let err = context
            .render(&GoParser::new(), &temp.path().join("missing.go"))
            .unwrap_err();
        assert!(matches!(err, IncoError::FileNotInPackage { .. }));
    }

    #[test]
    fn test_clean() {
        let temp = setup(&[(
            "main.go",
            "package main\n\nfunc f(x int) {\n\t// @require x > 0\n\tprintln(x)\n}\n",
        )]);
        let mut engine = Engine::new(temp.path()).unwrap();
        engine.run().unwrap();
        assert!(engine.cache_dir().is_dir());
        assert!(engine.clean().unwrap());
        assert!(!engine.cache_dir().exists());
        assert!(!engine.clean().unwrap());
    }

    #[test]
    fn test_config_cache_dir() {
        let temp = setup(&[
            ("inco.yaml", "cache_dir: build/shadow\n"),
            (
                "main.go",
                "package main\n\nfunc f(s string) {\n\t// @require -nd s\n\tprintln(s)\n}\n",
            ),
        ]);
        let mut engine = Engine::new(temp.path()).unwrap();
        let manifest = engine.run().unwrap();
        assert_eq!(manifest.len(), 1);
        assert!(engine.manifest_path().ends_with("build/shadow/overlay.json"));
        assert!(engine.manifest_path().is_file());
    }
}
