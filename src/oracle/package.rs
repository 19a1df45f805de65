//! Package-wide declaration index.
//!
//! Built once per directory from every non-test file of the package, so
//! types, functions and methods declared in sibling files resolve too.

use std::collections::HashMap;
use std::ops::Range;

use tree_sitter::Node;

use crate::syntax::scope::{specs, type_parameters, Signature, TypeParam};
use crate::syntax::types::{Shape, TypeExpr};
use crate::syntax::{field_children, named_children, SourceFile};

/// A package-level type declaration.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub underlying: TypeExpr,
}

/// Where a package-level value gets its type from.
#[derive(Debug, Clone)]
pub enum ValueType {
    Declared(TypeExpr),
    /// Position `index` of `count` names bound to the expression list at
    /// `range` in file `file`.
    Inferred {
        file: usize,
        range: Range<usize>,
        index: usize,
        count: usize,
    },
}

/// Declarations of one package.
#[derive(Debug, Default)]
pub struct PackageIndex {
    pub name: Option<String>,
    types: HashMap<String, TypeDecl>,
    funcs: HashMap<String, Signature>,
    methods: HashMap<(String, String), Signature>,
    values: HashMap<String, ValueType>,
    imports: HashMap<String, String>,
}

impl PackageIndex {
    /// Index all top-level declarations of `files`.
    pub fn build(files: &[SourceFile]) -> Self {
        let mut index = PackageIndex::default();
        for (file_idx, file) in files.iter().enumerate() {
            if index.name.is_none() {
                index.name = file.package_name().map(String::from);
            }
            for decl in named_children(file.root()) {
                index.add_declaration(file_idx, file, decl);
            }
            if let Ok(imports) = file.imports() {
                for import in imports {
                    index
                        .imports
                        .insert(import.local_name().to_string(), import.path.clone());
                }
            }
        }
        index
    }

    fn add_declaration(&mut self, file_idx: usize, file: &SourceFile, decl: Node<'_>) {
        match decl.kind() {
            "type_declaration" => {
                for spec in named_children(decl) {
                    if !matches!(spec.kind(), "type_spec" | "type_alias") {
                        continue;
                    }
                    let (Some(name), Some(ty)) = (
                        spec.child_by_field_name("name"),
                        spec.child_by_field_name("type"),
                    ) else {
                        continue;
                    };
                    let name = file.text(name).to_string();
                    let type_params = spec
                        .child_by_field_name("type_parameters")
                        .map(|list| type_parameters(list, file))
                        .unwrap_or_default();
                    self.types.insert(
                        name.clone(),
                        TypeDecl {
                            name,
                            type_params,
                            underlying: TypeExpr::from_node(ty, file),
                        },
                    );
                }
            }
            "function_declaration" => {
                if let Some(name) = decl.child_by_field_name("name") {
                    self.funcs.insert(
                        file.text(name).to_string(),
                        Signature::from_function(decl, file),
                    );
                }
            }
            "method_declaration" => {
                let Some(name) = decl.child_by_field_name("name") else {
                    return;
                };
                let signature = Signature::from_function(decl, file);
                let Some(base) = signature
                    .receiver
                    .as_ref()
                    .and_then(|r| receiver_base(&r.ty))
                else {
                    return;
                };
                self.methods
                    .insert((base, file.text(name).to_string()), signature);
            }
            "var_declaration" | "const_declaration" => {
                self.add_values(file_idx, file, decl);
            }
            _ => {}
        }
    }

    fn add_values(&mut self, file_idx: usize, file: &SourceFile, decl: Node<'_>) {
        // Constants without a type or value repeat the previous spec (iota).
        let mut previous: Option<(Option<TypeExpr>, Option<Range<usize>>)> = None;
        let is_const = decl.kind() == "const_declaration";

        for spec in specs(decl) {
            let names = field_children(spec, "name");
            let count = names.len();
            let mut declared = spec
                .child_by_field_name("type")
                .map(|t| TypeExpr::from_node(t, file));
            let mut values = spec.child_by_field_name("value").map(|v| v.byte_range());

            if is_const && declared.is_none() && values.is_none() {
                if let Some((ty, range)) = &previous {
                    declared = ty.clone();
                    values = range.clone();
                }
            }
            previous = Some((declared.clone(), values.clone()));

            for (index, name) in names.into_iter().enumerate() {
                let value = match (&declared, &values) {
                    (Some(ty), _) => ValueType::Declared(ty.clone()),
                    (None, Some(range)) => ValueType::Inferred {
                        file: file_idx,
                        range: range.clone(),
                        index,
                        count,
                    },
                    (None, None) => continue,
                };
                self.values.insert(file.text(name).to_string(), value);
            }
        }
    }

    pub fn type_decl(&self, name: &str) -> Option<&TypeDecl> {
        self.types.get(name)
    }

    pub fn func(&self, name: &str) -> Option<&Signature> {
        self.funcs.get(name)
    }

    pub fn method(&self, receiver: &str, name: &str) -> Option<&Signature> {
        self.methods.get(&(receiver.to_string(), name.to_string()))
    }

    pub fn value(&self, name: &str) -> Option<&ValueType> {
        self.values.get(name)
    }

    /// Import path for a local package name.
    pub fn import_path(&self, local: &str) -> Option<&str> {
        self.imports.get(local).map(String::as_str)
    }

    /// Whether `receiver` declares an `Error() string` method.
    pub fn has_error_method(&self, receiver: &str) -> bool {
        self.method(receiver, "Error").is_some_and(|sig| {
            sig.params.is_empty() && sig.results.len() == 1 && sig.results[0].ty.text == "string"
        })
    }
}

/// Receiver base type name: `T` for `T`, `*T`, `T[K]` and `*T[K]`.
fn receiver_base(ty: &TypeExpr) -> Option<String> {
    match &ty.deref().shape {
        Shape::Named {
            qualifier: None,
            name,
            ..
        } => Some(name.clone()),
        _ => None,
    }
}
