//! Source file selection.
//!
//! Walks the root in sorted order and yields every non-test `.go` file,
//! skipping hidden directories, configured `skip_dirs`, the cache directory,
//! `excluded_paths` globs and anything matched by an ignore file.
//!
//! Ignore files are read per directory and apply only below it. Rules:
//!
//! - blank lines and `#` comments are skipped;
//! - a trailing `/` limits a rule to directories;
//! - a rule containing `/` is a path relative to the ignore file's
//!   directory, matching that path and everything under it;
//! - any other rule is a glob on the entry's file name.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher, GlobSet};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::{IncoError, Result};

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    matcher: GlobMatcher,
    dir_only: bool,
    anchored: bool,
}

impl Rule {
    fn matches(&self, relative: &str, is_dir: bool) -> bool {
        if self.anchored {
            if relative.starts_with(&format!("{}/", self.pattern)) {
                return true;
            }
            if self.dir_only && !is_dir {
                return false;
            }
            return relative == self.pattern || self.matcher.is_match(relative);
        }
        if self.dir_only && !is_dir {
            return false;
        }
        let name = relative.rsplit('/').next().unwrap_or(relative);
        self.matcher.is_match(name)
    }
}

/// Rules of one ignore file.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    base: PathBuf,
    rules: Vec<Rule>,
}

impl IgnoreRules {
    /// Parse ignore rules for directory `base`; `None` when there are none.
    pub fn parse(base: &Path, content: &str, source: &Path) -> Result<Option<Self>> {
        let mut rules = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let dir_only = line.ends_with('/');
            let pattern = line.trim_end_matches('/').trim_start_matches("./");
            if pattern.is_empty() {
                continue;
            }
            let anchored = pattern.contains('/');
            let glob = GlobBuilder::new(pattern)
                .literal_separator(anchored)
                .build()
                .map_err(|source_err| IncoError::IgnorePattern {
                    pattern: line.to_string(),
                    path: source.to_path_buf(),
                    source: source_err,
                })?;
            rules.push(Rule {
                pattern: pattern.to_string(),
                matcher: glob.compile_matcher(),
                dir_only,
                anchored,
            });
        }

        if rules.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            base: base.to_path_buf(),
            rules,
        }))
    }

    /// Load `dir/<file_name>`, if present.
    pub fn load(dir: &Path, file_name: &str) -> Result<Option<Self>> {
        let path = dir.join(file_name);
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|source| IncoError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(dir, &content, &path)
    }

    /// Whether a `/`-separated path relative to the base is ignored.
    pub fn matches(&self, relative: &str, is_dir: bool) -> bool {
        self.rules.iter().any(|rule| rule.matches(relative, is_dir))
    }

    /// Whether `path` (below the base) is ignored.
    pub fn matches_path(&self, path: &Path, is_dir: bool) -> bool {
        match path.strip_prefix(&self.base) {
            Ok(relative) if !relative.as_os_str().is_empty() => {
                self.matches(&slash_path(relative), is_dir)
            }
            _ => false,
        }
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Collects the Go files to process under a root.
pub struct FileSelector<'c> {
    root: PathBuf,
    config: &'c Config,
    exclusions: GlobSet,
    cache_dir: PathBuf,
}

impl<'c> FileSelector<'c> {
    pub fn new(root: &Path, config: &'c Config) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            exclusions: config.exclusions(),
            cache_dir: config.cache_dir_in(root),
        }
    }

    fn skip_dir(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.')
            || self.config.skip_dirs.iter().any(|d| *d == name)
            || entry.path() == self.cache_dir
    }

    fn is_source(entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        name.ends_with(".go") && !name.ends_with("_test.go")
    }

    fn excluded(&self, path: &Path) -> bool {
        !self.exclusions.is_empty()
            && path
                .strip_prefix(&self.root)
                .is_ok_and(|relative| self.exclusions.is_match(slash_path(relative)))
    }

    /// All selected files, in walk order.
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        let mut ignores: Vec<IgnoreRules> = Vec::new();
        let mut failure: Option<IncoError> = None;
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let is_dir = entry.file_type().is_dir();
                if entry.depth() > 0 {
                    if is_dir && self.skip_dir(entry) {
                        return false;
                    }
                    if ignores.iter().any(|i| i.matches_path(entry.path(), is_dir)) {
                        debug!("{}: ignored", entry.path().display());
                        return false;
                    }
                }
                if is_dir {
                    match IgnoreRules::load(entry.path(), &self.config.ignore_file) {
                        Ok(Some(rules)) => ignores.push(rules),
                        Ok(None) => {}
                        Err(e) => {
                            failure.get_or_insert(e);
                        }
                    }
                }
                true
            });

        for entry in walker {
            let entry = entry.map_err(|source| IncoError::Walk {
                path: source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone()),
                source,
            })?;
            if entry.file_type().is_file()
                && Self::is_source(&entry)
                && !self.excluded(entry.path())
            {
                files.push(entry.into_path());
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(files),
        }
    }
}
