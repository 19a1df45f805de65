//! Static type oracle.
//!
//! The generator never looks at declarations itself; it asks a
//! [`TypeOracle`] for the type of a name or expression and whether a type
//! is error-like. [`PackageOracle`] answers from a syntactic index of the
//! package plus a table of well-known library signatures. Anything it
//! cannot resolve comes back as `None` or [`TypeCategory::Unknown`], and
//! callers fall back to syntactic rules.

pub mod package;
pub mod stdlib;

use std::cell::Cell;

use tree_sitter::Node;

use crate::syntax::scope::{Binding, Origin, Scope};
use crate::syntax::types::{Shape, TypeExpr};
use crate::syntax::{named_children, SourceFile};
use package::{PackageIndex, ValueType};

/// Maximum nesting of type lookups before giving up.
const MAX_DEPTH: usize = 24;

/// Zero-value category of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    /// Pointer, slice, map, channel, function or interface.
    Nilable,
    String,
    Integer,
    Float,
    Complex,
    Bool,
    /// Struct or array.
    Aggregate { comparable: bool },
    /// Type parameter; comparable when its constraint allows `==`.
    TypeParam { comparable: bool },
    Unknown,
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoType {
    pub expr: TypeExpr,
    pub category: TypeCategory,
}

impl GoType {
    /// Human-readable name of the zero value, used in violation messages.
    pub fn zero_description(&self) -> &'static str {
        match self.category {
            TypeCategory::Nilable | TypeCategory::Unknown => "nil",
            TypeCategory::String => "empty string",
            TypeCategory::Integer | TypeCategory::Float | TypeCategory::Complex => "zero",
            TypeCategory::Bool => "false",
            TypeCategory::Aggregate { .. } | TypeCategory::TypeParam { .. } => "zero value",
        }
    }
}

/// Static type resolution consumed by the generator and injector.
pub trait TypeOracle {
    /// Declared type of `name` as seen from `scope`.
    fn resolve_variable_type(&self, scope: &Scope<'_>, name: &str) -> Option<GoType>;

    /// Whether values of `ty` are errors.
    fn is_error_like_type(&self, ty: &GoType) -> bool;

    /// Classify a type expression written in `scope`.
    fn classify(&self, scope: &Scope<'_>, ty: &TypeExpr) -> GoType;

    /// Types produced by `expr` (a node of `scope.file`), one per value.
    ///
    /// A call returning a tuple yields one entry per result; an expression
    /// list yields one entry per element. Unresolvable positions are `None`;
    /// an empty vector means the arity itself is unknown.
    fn expression_types(&self, scope: &Scope<'_>, expr: Node<'_>) -> Vec<Option<GoType>>;
}

/// Oracle backed by a package index.
pub struct PackageOracle<'p> {
    index: &'p PackageIndex,
    files: &'p [SourceFile],
    depth: Cell<usize>,
}

impl<'p> PackageOracle<'p> {
    pub fn new(index: &'p PackageIndex, files: &'p [SourceFile]) -> Self {
        Self {
            index,
            files,
            depth: Cell::new(0),
        }
    }

    /// Run `f` one level deeper, or return `fallback` past [`MAX_DEPTH`].
    fn guarded<T>(&self, fallback: T, f: impl FnOnce() -> T) -> T {
        let depth = self.depth.get();
        if depth >= MAX_DEPTH {
            return fallback;
        }
        self.depth.set(depth + 1);
        let result = f();
        self.depth.set(depth);
        result
    }

    /// `path.Name` key for a qualified identifier.
    fn qualified_key(&self, qualifier: &str, name: &str) -> String {
        let path = self.index.import_path(qualifier).unwrap_or(qualifier);
        format!("{path}.{name}")
    }

    /// Whether `name` refers to an imported package rather than a value.
    fn is_package_name(&self, scope: &Scope<'_>, name: &str) -> bool {
        scope.lookup(name).is_none()
            && self.index.value(name).is_none()
            && self.index.import_path(name).is_some()
    }

    fn basic(&self, scope: &Scope<'_>, name: &str) -> Option<GoType> {
        Some(self.classify(scope, &TypeExpr::named(name)))
    }

    /// Underlying type of a package-declared named type.
    fn underlying(&self, ty: &TypeExpr) -> TypeExpr {
        let mut current = ty.clone();
        for _ in 0..8 {
            let Some(decl) = current.local_name().and_then(|n| self.index.type_decl(n)) else {
                break;
            };
            current = decl.underlying.clone();
        }
        current
    }

    fn binding_type(&self, scope: &Scope<'_>, binding: &Binding<'_>) -> Option<GoType> {
        match &binding.origin {
            Origin::Declared(ty) => Some(self.classify(scope, ty)),
            Origin::Value {
                values,
                index,
                count,
            } => {
                let at = Scope::at(scope.file, values.start_byte());
                let types = self.expression_types(&at, *values);
                self.pick(&at, types, *values, *index, *count)
            }
            Origin::RangeKey(over) | Origin::RangeValue(over) => {
                let at = Scope::at(scope.file, over.start_byte());
                let over_ty = self.single_type(&at, *over)?;
                let is_key = matches!(binding.origin, Origin::RangeKey(_));
                let element = match self.underlying(over_ty.expr.deref()).shape {
                    Shape::Slice(elem) | Shape::Array(elem) => {
                        if is_key {
                            TypeExpr::named("int")
                        } else {
                            *elem
                        }
                    }
                    Shape::Map(key, value) => {
                        if is_key {
                            *key
                        } else {
                            *value
                        }
                    }
                    Shape::Chan(elem) if is_key => *elem,
                    Shape::Named { name, .. } if name == "string" => {
                        TypeExpr::named(if is_key { "int" } else { "rune" })
                    }
                    _ => return None,
                };
                Some(self.classify(&at, &element))
            }
        }
    }

    /// Select position `index` of `count` bound names from `types`.
    fn pick(
        &self,
        scope: &Scope<'_>,
        mut types: Vec<Option<GoType>>,
        values: Node<'_>,
        index: usize,
        count: usize,
    ) -> Option<GoType> {
        if types.len() == count {
            return types.swap_remove(index);
        }
        // Comma-ok forms: v, ok := m[k] / x.(T) / <-ch
        if types.len() == 1 && count == 2 {
            let single = named_children(values)
                .into_iter()
                .find(|n| n.kind() != "comment")?;
            let comma_ok = matches!(
                single.kind(),
                "index_expression" | "type_assertion_expression" | "unary_expression"
            );
            if comma_ok {
                return if index == 0 {
                    types.swap_remove(0)
                } else {
                    self.basic(scope, "bool")
                };
            }
        }
        None
    }

    fn package_value_type(&self, name: &str) -> Option<GoType> {
        match self.index.value(name)? {
            ValueType::Declared(ty) => {
                let file = self.files.first()?;
                Some(self.classify(&Scope::package_level(file), ty))
            }
            ValueType::Inferred {
                file,
                range,
                index,
                count,
            } => {
                let file = self.files.get(*file)?;
                let values = file
                    .root()
                    .descendant_for_byte_range(range.start, range.end)?;
                let scope = Scope::package_level(file);
                let types = self.expression_types(&scope, values);
                if values.kind() == "expression_list" {
                    self.pick(&scope, types, values, *index, *count)
                } else if *count == types.len() {
                    types.into_iter().nth(*index).flatten()
                } else {
                    None
                }
            }
        }
    }

    /// Type of a single-valued expression.
    fn single_type(&self, scope: &Scope<'_>, node: Node<'_>) -> Option<GoType> {
        self.guarded(None, || self.single_type_inner(scope, node))
    }

    fn single_type_inner(&self, scope: &Scope<'_>, node: Node<'_>) -> Option<GoType> {
        let file = scope.file;
        let text = file.text(node);
        match node.kind() {
            "true" | "false" => self.basic(scope, "bool"),
            "nil" => None,
            "iota" | "int_literal" => self.basic(scope, "int"),
            "float_literal" => self.basic(scope, "float64"),
            "imaginary_literal" => self.basic(scope, "complex128"),
            "rune_literal" => self.basic(scope, "rune"),
            "interpreted_string_literal" | "raw_string_literal" => self.basic(scope, "string"),
            "identifier" => match text {
                "true" | "false" => self.basic(scope, "bool"),
                "nil" => None,
                _ => self.resolve_variable_type(scope, text),
            },
            "parenthesized_expression" => named_children(node)
                .into_iter()
                .find(|n| n.kind() != "comment")
                .and_then(|inner| self.single_type(scope, inner)),
            "composite_literal" => node
                .child_by_field_name("type")
                .map(|t| self.classify(scope, &TypeExpr::from_node(t, file))),
            "func_literal" => Some(GoType {
                expr: TypeExpr::unknown("func()"),
                category: TypeCategory::Nilable,
            }),
            "unary_expression" => {
                let operator = node
                    .child_by_field_name("operator")
                    .map(|o| file.text(o))
                    .unwrap_or("");
                let operand = node.child_by_field_name("operand")?;
                match operator {
                    "!" => self.basic(scope, "bool"),
                    "&" => {
                        let inner = self.single_type(scope, operand)?;
                        Some(self.classify(scope, &TypeExpr::pointer_to(inner.expr)))
                    }
                    "*" => {
                        let inner = self.single_type(scope, operand)?;
                        match inner.expr.shape {
                            Shape::Pointer(target) => Some(self.classify(scope, &target)),
                            _ => None,
                        }
                    }
                    "<-" => {
                        let inner = self.single_type(scope, operand)?;
                        match self.underlying(&inner.expr).shape {
                            Shape::Chan(elem) => Some(self.classify(scope, &elem)),
                            _ => None,
                        }
                    }
                    _ => self.single_type(scope, operand),
                }
            }
            "binary_expression" => {
                let operator = node
                    .child_by_field_name("operator")
                    .map(|o| file.text(o))
                    .unwrap_or("");
                match operator {
                    "==" | "!=" | "<" | "<=" | ">" | ">=" | "&&" | "||" => {
                        self.basic(scope, "bool")
                    }
                    _ => {
                        let left = node.child_by_field_name("left")?;
                        self.single_type(scope, left).or_else(|| {
                            let right = node.child_by_field_name("right")?;
                            self.single_type(scope, right)
                        })
                    }
                }
            }
            "call_expression" => {
                let mut results = self.call_results(scope, node);
                if results.len() == 1 {
                    results.swap_remove(0)
                } else {
                    None
                }
            }
            "selector_expression" => self.selector_type(scope, node),
            "index_expression" => {
                let operand = node.child_by_field_name("operand")?;
                let operand_ty = self.single_type(scope, operand)?;
                let element = match self.underlying(operand_ty.expr.deref()).shape {
                    Shape::Slice(elem) | Shape::Array(elem) => *elem,
                    Shape::Map(_, value) => *value,
                    Shape::Named { name, .. } if name == "string" => TypeExpr::named("byte"),
                    _ => return None,
                };
                Some(self.classify(scope, &element))
            }
            "slice_expression" => {
                let operand = node.child_by_field_name("operand")?;
                self.single_type(scope, operand)
            }
            "type_assertion_expression" | "type_conversion_expression" => node
                .child_by_field_name("type")
                .map(|t| self.classify(scope, &TypeExpr::from_node(t, file))),
            _ => None,
        }
    }

    /// Type of `operand.field`: a library variable or a struct field.
    fn selector_type(&self, scope: &Scope<'_>, node: Node<'_>) -> Option<GoType> {
        let file = scope.file;
        let operand = node.child_by_field_name("operand")?;
        let field = file.text(node.child_by_field_name("field")?);

        if operand.kind() == "identifier" && self.is_package_name(scope, file.text(operand)) {
            let key = self.qualified_key(file.text(operand), field);
            let spelled = stdlib::package_var(&key)?;
            return Some(self.classify(scope, &TypeExpr::from_text(spelled)));
        }

        let operand_ty = self.single_type(scope, operand)?;
        match self.underlying(operand_ty.expr.deref()).shape {
            Shape::Struct(fields) => fields
                .into_iter()
                .find(|f| f.name == field)
                .map(|f| self.classify(&Scope::package_level(file), &f.ty)),
            _ => None,
        }
    }

    /// Result types of a call.
    fn call_results(&self, scope: &Scope<'_>, call: Node<'_>) -> Vec<Option<GoType>> {
        let file = scope.file;
        let Some(function) = call.child_by_field_name("function") else {
            return Vec::new();
        };
        let args: Vec<Node<'_>> = call
            .child_by_field_name("arguments")
            .map(named_children)
            .unwrap_or_default()
            .into_iter()
            .filter(|n| n.kind() != "comment")
            .collect();

        match function.kind() {
            "identifier" => {
                let name = file.text(function);
                if scope.lookup(name).is_some() {
                    return Vec::new();
                }
                match name {
                    "new" => args
                        .first()
                        .map(|t| {
                            let inner = TypeExpr::from_node(*t, file);
                            vec![Some(self.classify(scope, &TypeExpr::pointer_to(inner)))]
                        })
                        .unwrap_or_default(),
                    "make" => args
                        .first()
                        .map(|t| vec![Some(self.classify(scope, &TypeExpr::from_node(*t, file)))])
                        .unwrap_or_default(),
                    "len" | "cap" | "copy" => vec![self.basic(scope, "int")],
                    "append" | "min" | "max" => {
                        vec![args.first().and_then(|a| self.single_type(scope, *a))]
                    }
                    "recover" => vec![self.basic(scope, "any")],
                    _ if stdlib::is_builtin_type(name)
                        || self.index.type_decl(name).is_some()
                        || scope.type_param(name).is_some() =>
                    {
                        vec![Some(self.classify(scope, &TypeExpr::named(name)))]
                    }
                    _ => match self.index.func(name) {
                        Some(signature) => signature
                            .results
                            .iter()
                            .map(|r| Some(self.classify(scope, &r.ty)))
                            .collect(),
                        None => Vec::new(),
                    },
                }
            }
            "selector_expression" => {
                let (Some(operand), Some(field)) = (
                    function.child_by_field_name("operand"),
                    function.child_by_field_name("field"),
                ) else {
                    return Vec::new();
                };
                let field = file.text(field);

                if operand.kind() == "identifier" && self.is_package_name(scope, file.text(operand))
                {
                    let key = self.qualified_key(file.text(operand), field);
                    return stdlib::function_results(&key)
                        .map(|results| {
                            results
                                .iter()
                                .map(|r| Some(self.classify(scope, &TypeExpr::from_text(r))))
                                .collect()
                        })
                        .unwrap_or_default();
                }

                let Some(receiver) = self.single_type(scope, operand) else {
                    return Vec::new();
                };
                let Some(base) = receiver.expr.deref().local_name().map(String::from) else {
                    return Vec::new();
                };
                match self.index.method(&base, field) {
                    Some(signature) => {
                        let package_scope = Scope::package_level(file);
                        signature
                            .results
                            .iter()
                            .map(|r| Some(self.classify(&package_scope, &r.ty)))
                            .collect()
                    }
                    None => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    fn category(&self, scope: &Scope<'_>, ty: &TypeExpr) -> TypeCategory {
        self.guarded(TypeCategory::Unknown, || match &ty.shape {
            Shape::Pointer(_)
            | Shape::Slice(_)
            | Shape::Map(_, _)
            | Shape::Chan(_)
            | Shape::Func
            | Shape::Interface { .. } => TypeCategory::Nilable,
            Shape::Array(elem) => TypeCategory::Aggregate {
                comparable: self.comparable(scope, elem),
            },
            Shape::Struct(fields) => TypeCategory::Aggregate {
                comparable: fields.iter().all(|f| self.comparable(scope, &f.ty)),
            },
            Shape::Named {
                qualifier: None,
                name,
                ..
            } => {
                if let Some(constraint) = self.type_param_constraint(scope, name) {
                    return TypeCategory::TypeParam {
                        comparable: constraint
                            .is_some_and(|c| self.constraint_comparable(scope, &c)),
                    };
                }
                if let Some(category) = stdlib::builtin_category(name) {
                    return category;
                }
                match self.index.type_decl(name) {
                    Some(decl) => {
                        let package_scope = Scope::package_level(scope.file);
                        self.category(&package_scope, &decl.underlying)
                    }
                    None => TypeCategory::Unknown,
                }
            }
            Shape::Named {
                qualifier: Some(qualifier),
                name,
                ..
            } => stdlib::qualified_category(&self.qualified_key(qualifier, name))
                .unwrap_or(TypeCategory::Unknown),
            Shape::Union(_) | Shape::Approx(_) | Shape::Unknown => TypeCategory::Unknown,
        })
    }

    /// Whether values of `ty` support `==`.
    fn comparable(&self, scope: &Scope<'_>, ty: &TypeExpr) -> bool {
        self.guarded(true, || match &ty.shape {
            Shape::Slice(_) | Shape::Map(_, _) | Shape::Func => false,
            Shape::Array(elem) => self.comparable(scope, elem),
            Shape::Struct(fields) => fields.iter().all(|f| self.comparable(scope, &f.ty)),
            Shape::Named {
                qualifier: None,
                name,
                ..
            } => {
                if let Some(constraint) = self.type_param_constraint(scope, name) {
                    return constraint.is_some_and(|c| self.constraint_comparable(scope, &c));
                }
                match self.index.type_decl(name) {
                    Some(decl) => {
                        self.comparable(&Scope::package_level(scope.file), &decl.underlying)
                    }
                    None => true,
                }
            }
            Shape::Named {
                qualifier: Some(qualifier),
                name,
                ..
            } => !matches!(
                stdlib::qualified_category(&self.qualified_key(qualifier, name)),
                Some(TypeCategory::Aggregate { comparable: false })
            ),
            _ => true,
        })
    }

    /// Constraint of type parameter `name`, if `name` is one.
    ///
    /// The inner `None` marks a type parameter whose constraint is unknown.
    fn type_param_constraint(&self, scope: &Scope<'_>, name: &str) -> Option<Option<TypeExpr>> {
        let param = scope.type_param(name)?;
        if let Some(constraint) = &param.constraint {
            return Some(Some(constraint.clone()));
        }

        // Introduced by a generic receiver: take the constraint declared
        // at the same position on the receiver's type.
        let receiver = scope.signature.as_ref()?.receiver.as_ref();
        let from_receiver = receiver.and_then(|r| match &r.ty.deref().shape {
            Shape::Named {
                name: base, args, ..
            } => {
                let position = args.iter().position(|a| a.local_name() == Some(name))?;
                self.index
                    .type_decl(base)?
                    .type_params
                    .get(position)?
                    .constraint
                    .clone()
            }
            _ => None,
        });
        Some(from_receiver)
    }

    /// Whether every type in a constraint's type set supports `==`.
    fn constraint_comparable(&self, scope: &Scope<'_>, constraint: &TypeExpr) -> bool {
        self.guarded(false, || match &constraint.shape {
            Shape::Named {
                qualifier: None,
                name,
                ..
            } => match name.as_str() {
                "comparable" => true,
                "any" => false,
                _ => match stdlib::builtin_category(name) {
                    Some(TypeCategory::Nilable) => false,
                    Some(_) => true,
                    None => self.index.type_decl(name).is_some_and(|decl| {
                        self.constraint_comparable(
                            &Scope::package_level(scope.file),
                            &decl.underlying,
                        )
                    }),
                },
            },
            Shape::Named {
                qualifier: Some(qualifier),
                name,
                ..
            } => stdlib::is_comparable_constraint(&self.qualified_key(qualifier, name)),
            Shape::Approx(inner) => self.comparable(scope, inner),
            Shape::Union(terms) => {
                !terms.is_empty() && terms.iter().all(|t| self.constraint_comparable(scope, t))
            }
            Shape::Interface { elems, .. } => {
                elems.iter().any(|e| self.constraint_comparable(scope, e))
            }
            Shape::Array(_) | Shape::Struct(_) | Shape::Pointer(_) | Shape::Chan(_) => {
                self.comparable(scope, constraint)
            }
            _ => false,
        })
    }

    fn error_like(&self, ty: &TypeExpr) -> bool {
        self.guarded(false, || match &ty.shape {
            Shape::Named {
                qualifier: None,
                name,
                ..
            } => {
                name == "error"
                    || self.index.has_error_method(name)
                    || self
                        .index
                        .type_decl(name)
                        .is_some_and(|decl| {
                            matches!(decl.underlying.shape, Shape::Interface { .. })
                                && self.error_like(&decl.underlying)
                        })
            }
            Shape::Named {
                qualifier: Some(qualifier),
                name,
                ..
            } => stdlib::is_error_type(&self.qualified_key(qualifier, name)),
            Shape::Pointer(inner) => inner.local_name() != Some("error") && self.error_like(inner),
            Shape::Interface { methods, .. } => methods
                .iter()
                .any(|(name, signature)| name == "Error" && signature == "() string"),
            _ => false,
        })
    }
}

impl TypeOracle for PackageOracle<'_> {
    fn resolve_variable_type(&self, scope: &Scope<'_>, name: &str) -> Option<GoType> {
        match scope.lookup(name) {
            Some(binding) => self.guarded(None, || self.binding_type(scope, binding)),
            None => self.guarded(None, || self.package_value_type(name)),
        }
    }

    fn is_error_like_type(&self, ty: &GoType) -> bool {
        self.error_like(&ty.expr)
    }

    fn classify(&self, scope: &Scope<'_>, ty: &TypeExpr) -> GoType {
        GoType {
            expr: ty.clone(),
            category: self.category(scope, ty),
        }
    }

    fn expression_types(&self, scope: &Scope<'_>, expr: Node<'_>) -> Vec<Option<GoType>> {
        match expr.kind() {
            "expression_list" => {
                let items: Vec<_> = named_children(expr)
                    .into_iter()
                    .filter(|n| n.kind() != "comment")
                    .collect();
                if items.len() == 1 {
                    self.expression_types(scope, items[0])
                } else {
                    items
                        .into_iter()
                        .map(|item| self.single_type(scope, item))
                        .collect()
                }
            }
            "call_expression" => self.guarded(Vec::new(), || self.call_results(scope, expr)),
            _ => vec![self.single_type(scope, expr)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::GoParser;
    use std::path::Path;

    const SOURCE: &str = r#"package store

import (
	"errors"
	"os"
)

type User struct {
	Name string
	Age  int
}

type Bag struct {
	Items []string
}

type ID string

type MyError struct{}

func (e *MyError) Error() string { return "boom" }

var ErrNotFound = errors.New("not found")

func Load(id ID) (*User, error) {
	return nil, nil
}

func validate() *MyError { return nil }

func (u *User) Rename(name string) (bool, error) {
	return true, nil
}

func Handle(u *User, name string, count int, ok bool, c float64, p User, b Bag, id ID, items []int, fn func(), m map[string]int, ch chan int, e error) {
	f, _ := os.Open(name)
	loaded, err := Load(id)
	changed, rerr := u.Rename(name)
	v := validate()
	x := 3
	// here
	_, _, _, _, _, _, _, _ = f, loaded, err, changed, rerr, v, x, ErrNotFound
}

func Max[T comparable, A any](a T, other A) T {
	// generic
	return a
}
"#;

    fn setup() -> (Vec<SourceFile>, PackageIndex) {
        let file = GoParser::new()
            .parse(Path::new("/pkg/store.go"), SOURCE.to_string())
            .unwrap();
        let files = vec![file];
        let index = PackageIndex::build(&files);
        (files, index)
    }

    fn category_of(oracle: &PackageOracle<'_>, scope: &Scope<'_>, name: &str) -> TypeCategory {
        oracle
            .resolve_variable_type(scope, name)
            .map(|t| t.category)
            .unwrap_or(TypeCategory::Unknown)
    }

    #[test]
    fn test_parameter_categories() {
        let (files, index) = setup();
        let oracle = PackageOracle::new(&index, &files);
        let position = files[0].source.find("// here").unwrap();
        let scope = Scope::at(&files[0], position);

        assert_eq!(category_of(&oracle, &scope, "u"), TypeCategory::Nilable);
        assert_eq!(category_of(&oracle, &scope, "name"), TypeCategory::String);
        assert_eq!(category_of(&oracle, &scope, "count"), TypeCategory::Integer);
        assert_eq!(category_of(&oracle, &scope, "ok"), TypeCategory::Bool);
        assert_eq!(category_of(&oracle, &scope, "c"), TypeCategory::Float);
        assert_eq!(
            category_of(&oracle, &scope, "p"),
            TypeCategory::Aggregate { comparable: true }
        );
        assert_eq!(
            category_of(&oracle, &scope, "b"),
            TypeCategory::Aggregate { comparable: false }
        );
        assert_eq!(category_of(&oracle, &scope, "id"), TypeCategory::String);
        assert_eq!(category_of(&oracle, &scope, "items"), TypeCategory::Nilable);
        assert_eq!(category_of(&oracle, &scope, "fn"), TypeCategory::Nilable);
        assert_eq!(category_of(&oracle, &scope, "m"), TypeCategory::Nilable);
        assert_eq!(category_of(&oracle, &scope, "ch"), TypeCategory::Nilable);
        assert_eq!(category_of(&oracle, &scope, "e"), TypeCategory::Nilable);
        assert!(oracle.resolve_variable_type(&scope, "missing").is_none());
    }

    #[test]
    fn test_inferred_locals() {
        let (files, index) = setup();
        let oracle = PackageOracle::new(&index, &files);
        let position = files[0].source.find("// here").unwrap();
        let scope = Scope::at(&files[0], position);

        let f = oracle.resolve_variable_type(&scope, "f").unwrap();
        assert_eq!(f.expr.text, "*os.File");
        let err = oracle.resolve_variable_type(&scope, "err").unwrap();
        assert!(oracle.is_error_like_type(&err));
        let loaded = oracle.resolve_variable_type(&scope, "loaded").unwrap();
        assert_eq!(loaded.expr.text, "*User");
        let changed = oracle.resolve_variable_type(&scope, "changed").unwrap();
        assert_eq!(changed.category, TypeCategory::Bool);
        let x = oracle.resolve_variable_type(&scope, "x").unwrap();
        assert_eq!(x.category, TypeCategory::Integer);
    }

    #[test]
    fn test_error_likeness() {
        let (files, index) = setup();
        let oracle = PackageOracle::new(&index, &files);
        let scope = Scope::package_level(&files[0]);

        let custom = oracle.classify(&scope, &TypeExpr::from_text("*MyError"));
        assert!(oracle.is_error_like_type(&custom));
        let plain = oracle.classify(&scope, &TypeExpr::from_text("*User"));
        assert!(!oracle.is_error_like_type(&plain));
        let sentinel = oracle.resolve_variable_type(&scope, "ErrNotFound").unwrap();
        assert!(oracle.is_error_like_type(&sentinel));
    }

    #[test]
    fn test_type_parameters() {
        let (files, index) = setup();
        let oracle = PackageOracle::new(&index, &files);
        let position = files[0].source.find("// generic").unwrap();
        let scope = Scope::at(&files[0], position);

        assert_eq!(
            category_of(&oracle, &scope, "a"),
            TypeCategory::TypeParam { comparable: true }
        );
        assert_eq!(
            category_of(&oracle, &scope, "other"),
            TypeCategory::TypeParam { comparable: false }
        );
    }

    #[test]
    fn test_call_tuple_types() {
        let (files, index) = setup();
        let oracle = PackageOracle::new(&index, &files);
        let file = &files[0];
        let position = file.source.find("loaded, err :=").unwrap();
        let statement = file
            .root()
            .descendant_for_byte_range(position, position)
            .unwrap();
        let statement = std::iter::successors(Some(statement), |n| n.parent())
            .find(|n| n.kind() == "short_var_declaration")
            .unwrap();
        let right = statement.child_by_field_name("right").unwrap();
        let scope = Scope::at(file, statement.start_byte());

        let types = oracle.expression_types(&scope, right);
        assert_eq!(types.len(), 2);
        assert!(!oracle.is_error_like_type(types[0].as_ref().unwrap()));
        assert!(oracle.is_error_like_type(types[1].as_ref().unwrap()));
    }

    #[test]
    fn test_zero_descriptions() {
        let ty = |category| GoType {
            expr: TypeExpr::unknown("T"),
            category,
        };
        assert_eq!(ty(TypeCategory::Nilable).zero_description(), "nil");
        assert_eq!(ty(TypeCategory::String).zero_description(), "empty string");
        assert_eq!(ty(TypeCategory::Integer).zero_description(), "zero");
        assert_eq!(ty(TypeCategory::Bool).zero_description(), "false");
    }
}
