//! Enclosing-function scopes.
//!
//! A [`Scope`] describes what is visible at a byte position inside a
//! function body: the innermost function's signature plus every parameter
//! and local declared before that position, innermost first.

use tree_sitter::Node;

use super::types::{Shape, TypeExpr};
use super::{field_children, is_function, named_children, SourceFile};

/// A parameter or result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

/// A type parameter. The constraint is absent for type parameters
/// introduced by a generic receiver (`func (s *Stack[T]) ...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub name: String,
    pub constraint: Option<TypeExpr>,
}

/// A function, method or function literal signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub type_params: Vec<TypeParam>,
    pub receiver: Option<Param>,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

impl Signature {
    /// Extract the signature of a `function_declaration`, `method_declaration`
    /// or `func_literal` node.
    pub fn from_function(node: Node<'_>, file: &SourceFile) -> Self {
        let mut signature = Signature {
            type_params: node
                .child_by_field_name("type_parameters")
                .map(|list| type_parameters(list, file))
                .unwrap_or_default(),
            receiver: node
                .child_by_field_name("receiver")
                .and_then(|list| parameters(list, file).into_iter().next()),
            params: node
                .child_by_field_name("parameters")
                .map(|list| parameters(list, file))
                .unwrap_or_default(),
            results: Vec::new(),
        };

        if let Some(result) = node.child_by_field_name("result") {
            signature.results = if result.kind() == "parameter_list" {
                parameters(result, file)
            } else {
                vec![Param {
                    name: None,
                    ty: TypeExpr::from_node(result, file),
                }]
            };
        }

        // Type parameters declared by a generic receiver type.
        if let Some(receiver) = &signature.receiver {
            if let Shape::Named { args, .. } = &receiver.ty.deref().shape {
                for arg in args {
                    if let Some(name) = arg.local_name() {
                        signature.type_params.push(TypeParam {
                            name: name.to_string(),
                            constraint: None,
                        });
                    }
                }
            }
        }

        signature
    }

    /// True when every result position carries a name.
    pub fn results_all_named(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.name.is_some())
    }
}

/// Parameters of a `parameter_list`, one entry per declared name.
pub fn parameters(list: Node<'_>, file: &SourceFile) -> Vec<Param> {
    let mut params = Vec::new();
    for decl in named_children(list) {
        let variadic = decl.kind() == "variadic_parameter_declaration";
        if decl.kind() != "parameter_declaration" && !variadic {
            continue;
        }
        let Some(ty_node) = decl.child_by_field_name("type") else {
            continue;
        };
        let mut ty = TypeExpr::from_node(ty_node, file);
        if variadic {
            ty = TypeExpr {
                text: format!("[]{}", ty.text),
                shape: Shape::Slice(Box::new(ty)),
            };
        }

        let names = field_children(decl, "name");
        if names.is_empty() {
            params.push(Param { name: None, ty });
        } else {
            for name in names {
                params.push(Param {
                    name: Some(file.text(name).to_string()),
                    ty: ty.clone(),
                });
            }
        }
    }
    params
}

/// Type parameters of a `type_parameter_list`.
pub fn type_parameters(list: Node<'_>, file: &SourceFile) -> Vec<TypeParam> {
    let mut params = Vec::new();
    for decl in named_children(list) {
        if !matches!(
            decl.kind(),
            "type_parameter_declaration" | "parameter_declaration"
        ) {
            continue;
        }
        let constraint = decl
            .child_by_field_name("type")
            .map(|n| TypeExpr::from_node(n, file));
        for name in field_children(decl, "name") {
            params.push(TypeParam {
                name: file.text(name).to_string(),
                constraint: constraint.clone(),
            });
        }
    }
    params
}

/// Where a visible name gets its type from.
#[derive(Debug, Clone)]
pub enum Origin<'t> {
    /// Explicitly typed (`var x T`, parameters, results).
    Declared(TypeExpr),
    /// Position `index` of `count` names bound to the expression list `values`.
    Value {
        values: Node<'t>,
        index: usize,
        count: usize,
    },
    /// Key of a `range` over `over`.
    RangeKey(Node<'t>),
    /// Value of a `range` over `over`.
    RangeValue(Node<'t>),
}

/// A name visible in a scope.
#[derive(Debug, Clone)]
pub struct Binding<'t> {
    pub name: String,
    pub origin: Origin<'t>,
}

/// Names visible at a position inside a function.
pub struct Scope<'t> {
    pub file: &'t SourceFile,
    /// Byte position the scope was taken at.
    pub position: usize,
    /// Signature of the innermost enclosing function.
    pub signature: Option<Signature>,
    /// Visible bindings, innermost first.
    bindings: Vec<Binding<'t>>,
}

impl<'t> Scope<'t> {
    /// The scope at package level: nothing local is visible.
    pub fn package_level(file: &'t SourceFile) -> Self {
        Self {
            file,
            position: 0,
            signature: None,
            bindings: Vec::new(),
        }
    }

    /// The scope visible at `position`.
    pub fn at(file: &'t SourceFile, position: usize) -> Self {
        let mut scope = Self::package_level(file);
        scope.position = position;

        let Some(start) = file.root().descendant_for_byte_range(position, position) else {
            return scope;
        };

        let mut node = start;
        while let Some(parent) = node.parent() {
            match parent.kind() {
                "block" | "statement_list" | "expression_case" | "default_case" | "type_case"
                | "communication_case" => {
                    let mut earlier: Vec<Node<'t>> = named_children(parent)
                        .into_iter()
                        .filter(|s| s.end_byte() <= position)
                        .collect();
                    earlier.reverse();
                    for statement in earlier {
                        scope.declare_statement(statement);
                    }
                }
                "if_statement" | "expression_switch_statement" | "type_switch_statement" => {
                    if let Some(init) = parent.child_by_field_name("initializer") {
                        if init.end_byte() <= position {
                            scope.declare_statement(init);
                        }
                    }
                }
                "for_statement" => {
                    for clause in named_children(parent) {
                        if clause.end_byte() > position {
                            continue;
                        }
                        match clause.kind() {
                            "range_clause" => scope.declare_range(clause),
                            "for_clause" => {
                                if let Some(init) = clause.child_by_field_name("initializer") {
                                    scope.declare_statement(init);
                                }
                            }
                            _ => {}
                        }
                    }
                }
                _ if is_function(parent) => {
                    let signature = Signature::from_function(parent, file);
                    for param in signature
                        .receiver
                        .iter()
                        .chain(&signature.params)
                        .chain(&signature.results)
                    {
                        if let Some(name) = &param.name {
                            scope.bindings.push(Binding {
                                name: name.clone(),
                                origin: Origin::Declared(param.ty.clone()),
                            });
                        }
                    }
                    if scope.signature.is_none() {
                        scope.signature = Some(signature);
                    }
                }
                _ => {}
            }
            node = parent;
        }

        scope
    }

    /// Record names declared by one statement.
    fn declare_statement(&mut self, statement: Node<'t>) {
        match statement.kind() {
            "short_var_declaration" => {
                let (Some(left), Some(right)) = (
                    statement.child_by_field_name("left"),
                    statement.child_by_field_name("right"),
                ) else {
                    return;
                };
                let names = named_children(left);
                let count = names.len();
                for (index, name) in names.into_iter().enumerate() {
                    self.push(
                        name,
                        Origin::Value {
                            values: right,
                            index,
                            count,
                        },
                    );
                }
            }
            "var_declaration" | "const_declaration" => {
                for spec in specs(statement) {
                    let names = field_children(spec, "name");
                    let count = names.len();
                    let declared = spec
                        .child_by_field_name("type")
                        .map(|t| TypeExpr::from_node(t, self.file));
                    let values = spec.child_by_field_name("value");
                    for (index, name) in names.into_iter().enumerate() {
                        let origin = match (&declared, values) {
                            (Some(ty), _) => Origin::Declared(ty.clone()),
                            (None, Some(values)) => Origin::Value {
                                values,
                                index,
                                count,
                            },
                            (None, None) => continue,
                        };
                        self.push(name, origin);
                    }
                }
            }
            _ => {}
        }
    }

    /// Record the names bound by a `range` clause.
    fn declare_range(&mut self, clause: Node<'t>) {
        let (Some(left), Some(right)) = (
            clause.child_by_field_name("left"),
            clause.child_by_field_name("right"),
        ) else {
            return;
        };
        let names = named_children(left);
        if let Some(key) = names.first() {
            self.push(*key, Origin::RangeKey(right));
        }
        if let Some(value) = names.get(1) {
            self.push(*value, Origin::RangeValue(right));
        }
    }

    fn push(&mut self, name: Node<'t>, origin: Origin<'t>) {
        if name.kind() != "identifier" {
            return;
        }
        let name = self.file.text(name);
        if name == "_" {
            return;
        }
        self.bindings.push(Binding {
            name: name.to_string(),
            origin,
        });
    }

    /// Innermost binding for `name`.
    pub fn lookup(&self, name: &str) -> Option<&Binding<'t>> {
        self.bindings.iter().find(|b| b.name == name)
    }

    /// Type parameter `name` of the innermost function.
    pub fn type_param(&self, name: &str) -> Option<&TypeParam> {
        self.signature
            .as_ref()?
            .type_params
            .iter()
            .find(|p| p.name == name)
    }
}

/// `var_spec`/`const_spec` nodes of a declaration, looking through spec lists.
pub fn specs(declaration: Node<'_>) -> Vec<Node<'_>> {
    let mut found = Vec::new();
    for child in named_children(declaration) {
        match child.kind() {
            "var_spec" | "const_spec" => found.push(child),
            "var_spec_list" | "const_spec_list" => found.extend(
                named_children(child)
                    .into_iter()
                    .filter(|s| matches!(s.kind(), "var_spec" | "const_spec")),
            ),
            _ => {}
        }
    }
    found
}
