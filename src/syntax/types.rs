//! Syntactic Go type expressions.
//!
//! A [`TypeExpr`] keeps the type's source spelling (used verbatim in
//! generated code such as `T{}` or `*new(T)`) alongside a coarse shape
//! that the type oracle classifies.

use tree_sitter::Node;

use super::{field_children, named_children, SourceFile};

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name; embedded fields are named after their type.
    pub name: String,
    pub ty: TypeExpr,
}

/// Structure of a type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// `int`, `Foo`, `pkg.Foo`, `Foo[T]`.
    Named {
        qualifier: Option<String>,
        name: String,
        args: Vec<TypeExpr>,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Chan(Box<TypeExpr>),
    Func,
    Interface {
        /// Method names with the text of their signature after the name.
        methods: Vec<(String, String)>,
        /// Embedded types and type-set terms.
        elems: Vec<TypeExpr>,
    },
    Struct(Vec<Field>),
    /// `A | B` in a constraint.
    Union(Vec<TypeExpr>),
    /// `~T` in a constraint.
    Approx(Box<TypeExpr>),
    Unknown,
}

/// A type expression with its source spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    pub text: String,
    pub shape: Shape,
}

impl TypeExpr {
    pub fn named(name: &str) -> Self {
        Self {
            text: name.to_string(),
            shape: Shape::Named {
                qualifier: None,
                name: name.to_string(),
                args: Vec::new(),
            },
        }
    }

    pub fn unknown(text: &str) -> Self {
        Self {
            text: text.to_string(),
            shape: Shape::Unknown,
        }
    }

    pub fn pointer_to(inner: TypeExpr) -> Self {
        Self {
            text: format!("*{}", inner.text),
            shape: Shape::Pointer(Box::new(inner)),
        }
    }

    /// Unqualified name for `Named` shapes.
    pub fn local_name(&self) -> Option<&str> {
        match &self.shape {
            Shape::Named {
                qualifier: None,
                name,
                ..
            } => Some(name),
            _ => None,
        }
    }

    /// Strip one level of pointer indirection.
    pub fn deref(&self) -> &TypeExpr {
        match &self.shape {
            Shape::Pointer(inner) => inner,
            _ => self,
        }
    }

    /// Build from a tree-sitter type node.
    pub fn from_node(node: Node<'_>, file: &SourceFile) -> Self {
        let text = file.text(node).to_string();
        let child = |field: &str| {
            node.child_by_field_name(field)
                .map(|n| Box::new(Self::from_node(n, file)))
                .unwrap_or_else(|| Box::new(Self::unknown("")))
        };
        let first_named = || {
            named_children(node)
                .into_iter()
                .find(|n| n.kind() != "comment")
                .map(|n| Box::new(Self::from_node(n, file)))
                .unwrap_or_else(|| Box::new(Self::unknown("")))
        };

        let shape = match node.kind() {
            "type_identifier" | "identifier" | "package_identifier" => Shape::Named {
                qualifier: None,
                name: text.clone(),
                args: Vec::new(),
            },
            "qualified_type" => Shape::Named {
                qualifier: node
                    .child_by_field_name("package")
                    .map(|n| file.text(n).to_string()),
                name: node
                    .child_by_field_name("name")
                    .map(|n| file.text(n).to_string())
                    .unwrap_or_default(),
                args: Vec::new(),
            },
            "generic_type" => {
                let base = child("type");
                let args = node
                    .child_by_field_name("type_arguments")
                    .map(|list| {
                        named_children(list)
                            .into_iter()
                            .map(|arg| Self::from_node(arg, file))
                            .collect()
                    })
                    .unwrap_or_default();
                match base.shape {
                    Shape::Named {
                        qualifier, name, ..
                    } => Shape::Named {
                        qualifier,
                        name,
                        args,
                    },
                    _ => Shape::Unknown,
                }
            }
            "pointer_type" => Shape::Pointer(first_named()),
            "slice_type" => Shape::Slice(child("element")),
            "array_type" | "implicit_length_array_type" => Shape::Array(child("element")),
            "map_type" => Shape::Map(child("key"), child("value")),
            "channel_type" => Shape::Chan(child("value")),
            "function_type" => Shape::Func,
            "interface_type" => interface_shape(node, file),
            "struct_type" => Shape::Struct(struct_fields(node, file)),
            "parenthesized_type" => return *first_named(),
            "negated_type" => Shape::Approx(first_named()),
            "type_elem" | "constraint_elem" | "type_constraint" | "union_type" => {
                let mut terms = Vec::new();
                collect_terms(node, file, &mut terms);
                if terms.len() == 1 {
                    return terms.remove(0);
                }
                Shape::Union(terms)
            }
            "constraint_term" => {
                let inner = first_named();
                if text.trim_start().starts_with('~') {
                    Shape::Approx(inner)
                } else {
                    return *inner;
                }
            }
            _ => Shape::Unknown,
        };

        Self { text, shape }
    }

    /// Build from type text such as `*os.File` or `[]byte`.
    ///
    /// Covers the spellings used by the built-in library tables; anything
    /// else is `Unknown`.
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        let shape = if let Some(inner) = text.strip_prefix('*') {
            Shape::Pointer(Box::new(Self::from_text(inner)))
        } else if let Some(inner) = text.strip_prefix("[]") {
            Shape::Slice(Box::new(Self::from_text(inner)))
        } else if let Some(rest) = text.strip_prefix("map[") {
            match rest.find(']') {
                Some(close) => Shape::Map(
                    Box::new(Self::from_text(&rest[..close])),
                    Box::new(Self::from_text(&rest[close + 1..])),
                ),
                None => Shape::Unknown,
            }
        } else if let Some(inner) = text.strip_prefix("chan ") {
            Shape::Chan(Box::new(Self::from_text(inner)))
        } else if text.starts_with("func(") {
            Shape::Func
        } else if text == "interface{}" {
            Shape::Interface {
                methods: Vec::new(),
                elems: Vec::new(),
            }
        } else if !text.is_empty()
            && text
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            match text.split_once('.') {
                Some((qualifier, name)) => Shape::Named {
                    qualifier: Some(qualifier.to_string()),
                    name: name.to_string(),
                    args: Vec::new(),
                },
                None => Shape::Named {
                    qualifier: None,
                    name: text.to_string(),
                    args: Vec::new(),
                },
            }
        } else {
            Shape::Unknown
        };

        Self {
            text: text.to_string(),
            shape,
        }
    }
}

fn collect_terms(node: Node<'_>, file: &SourceFile, terms: &mut Vec<TypeExpr>) {
    for child in named_children(node) {
        match child.kind() {
            "comment" => {}
            "union_type" | "type_elem" | "constraint_elem" => collect_terms(child, file, terms),
            _ => terms.push(TypeExpr::from_node(child, file)),
        }
    }
}

fn interface_shape(node: Node<'_>, file: &SourceFile) -> Shape {
    let mut methods = Vec::new();
    let mut elems = Vec::new();

    for child in named_children(node) {
        match child.kind() {
            "method_elem" | "method_spec" => {
                if let Some(name) = child.child_by_field_name("name") {
                    let signature = file.source[name.end_byte()..child.end_byte()].trim();
                    methods.push((file.text(name).to_string(), normalize_space(signature)));
                }
            }
            "comment" => {}
            _ => elems.push(TypeExpr::from_node(child, file)),
        }
    }

    Shape::Interface { methods, elems }
}

fn struct_fields(node: Node<'_>, file: &SourceFile) -> Vec<Field> {
    let Some(list) = named_children(node)
        .into_iter()
        .find(|n| n.kind() == "field_declaration_list")
    else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    for decl in named_children(list) {
        if decl.kind() != "field_declaration" {
            continue;
        }
        let Some(ty_node) = decl.child_by_field_name("type") else {
            continue;
        };
        let ty = TypeExpr::from_node(ty_node, file);
        let names = field_children(decl, "name");
        if names.is_empty() {
            // Embedded field: named after its type.
            let name = match &ty.deref().shape {
                Shape::Named { name, .. } => name.clone(),
                _ => ty.text.clone(),
            };
            fields.push(Field { name, ty });
        } else {
            for name in names {
                fields.push(Field {
                    name: file.text(name).to_string(),
                    ty: ty.clone(),
                });
            }
        }
    }
    fields
}

/// Collapse runs of whitespace to single spaces.
pub fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::GoParser;
    use std::path::Path;

    /// Parse `type X <spelling>` and return X's type expression.
    fn type_of(spelling: &str) -> TypeExpr {
        let source = format!("package p\n\ntype X {spelling}\n");
        let file = GoParser::new()
            .parse(Path::new("/work/t.go"), source)
            .unwrap();
        let root = file.root();
        let decl = named_children(root)
            .into_iter()
            .find(|n| n.kind() == "type_declaration")
            .unwrap();
        let spec = named_children(decl)[0];
        let node = spec.child_by_field_name("type").unwrap();
        TypeExpr::from_node(node, &file)
    }

    #[test]
    fn test_basic_shapes() {
        assert_eq!(type_of("int").local_name(), Some("int"));
        assert!(matches!(type_of("*User").shape, Shape::Pointer(_)));
        assert!(matches!(type_of("[]string").shape, Shape::Slice(_)));
        assert!(matches!(type_of("[4]byte").shape, Shape::Array(_)));
        assert!(matches!(type_of("map[string]int").shape, Shape::Map(_, _)));
        assert!(matches!(type_of("chan int").shape, Shape::Chan(_)));
        assert!(matches!(type_of("func(int) error").shape, Shape::Func));
    }

    #[test]
    fn test_qualified_and_generic() {
        match type_of("time.Duration").shape {
            Shape::Named {
                qualifier, name, ..
            } => {
                assert_eq!(qualifier.as_deref(), Some("time"));
                assert_eq!(name, "Duration");
            }
            other => panic!("unexpected shape {other:?}"),
        }
        match type_of("Box[int]").shape {
            Shape::Named { name, args, .. } => {
                assert_eq!(name, "Box");
                assert_eq!(args.len(), 1);
                assert_eq!(args[0].text, "int");
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_struct_fields() {
        let ty = type_of("struct {\n\tName string\n\tTags []string\n\tBase\n}");
        let Shape::Struct(fields) = ty.shape else {
            panic!("expected struct");
        };
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "Tags", "Base"]);
    }

    #[test]
    fn test_interface_methods() {
        let ty = type_of("interface {\n\tError() string\n}");
        let Shape::Interface { methods, .. } = ty.shape else {
            panic!("expected interface");
        };
        assert_eq!(methods, vec![("Error".to_string(), "() string".to_string())]);
    }

    #[test]
    fn test_from_text() {
        let ty = TypeExpr::from_text("*os.File");
        assert!(matches!(ty.deref().shape, Shape::Named { .. }));
        assert_eq!(TypeExpr::from_text("error").local_name(), Some("error"));
        assert!(matches!(
            TypeExpr::from_text("[]byte").shape,
            Shape::Slice(_)
        ));
        assert!(matches!(
            TypeExpr::from_text("map[string]int").shape,
            Shape::Map(_, _)
        ));
    }
}
