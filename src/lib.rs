//! inco - contract directives for Go.
//!
//! Go sources carry contracts as comments: `// @require <expr>` and
//! `// @require -nd a, b` state preconditions, `// @must` turns an ignored
//! error into a checked one. inco compiles them into guard code in shadow
//! copies of each file and writes an overlay manifest so `go build -overlay`
//! picks the shadows up. The originals are never modified, and `//line`
//! markers keep compiler diagnostics pointing at original line numbers.
//!
//! # Architecture
//!
//! The codebase uses tree-sitter for AST-based analysis:
//!
//! - `directive`: comment text to [`directive::Directive`]
//! - `syntax`: tree-sitter-go front end, scopes and expression checks
//! - `oracle`: declaration index answering type questions syntactically
//! - `codegen`: guard text for preconditions and error checks
//! - `inject`: anchors directives to statements and rewrites the file
//! - `remap`: `//line` markers after injected code
//! - `manifest`: content-addressed shadow files and `overlay.json`
//! - `select` / `config`: which files are processed, and how
//! - `engine`: the pipeline over a module root

pub mod cli;
pub mod codegen;
pub mod config;
pub mod directive;
pub mod engine;
pub mod error;
pub mod inject;
pub mod manifest;
pub mod oracle;
pub mod remap;
pub mod select;
pub mod syntax;

pub use config::Config;
pub use directive::{Directive, Kind};
pub use engine::{Engine, PackageContext};
pub use error::{IncoError, Result};
pub use manifest::Manifest;
