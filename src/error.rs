//! Error types for the contract compiler.
//!
//! Malformed directives and type-resolution gaps are not errors: the parser
//! simply declines them and the generator falls back to syntactic rules.
//! Everything here aborts the current run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while generating shadow files.
#[derive(Error, Debug)]
pub enum IncoError {
    #[error("failed to create cache directory {path}: {source}")]
    CreateCacheDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write shadow file {path}: {source}")]
    WriteShadow {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write manifest {path}: {source}")]
    WriteManifest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove cache directory {path}: {source}")]
    RemoveCacheDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to load Go grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("invalid tree-sitter query: {0}")]
    Query(#[from] tree_sitter::QueryError),
    #[error("failed to parse {path}")]
    Parse { path: PathBuf },
    #[error("{location}: invalid {what} expression `{expr}`")]
    InvalidExpression {
        what: &'static str,
        expr: String,
        location: String,
    },
    #[error("{path} is not part of the package loaded for its directory")]
    FileNotInPackage { path: PathBuf },
    #[error("invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },
    #[error("invalid ignore pattern `{pattern}` in {path}: {source}")]
    IgnorePattern {
        pattern: String,
        path: PathBuf,
        #[source]
        source: globset::Error,
    },
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, IncoError>;
