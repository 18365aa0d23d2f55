//! # TYPE HIERARCHY
//!
//! Declared supertypes of known classes. Supplies the two questions the matcher
//! cannot answer structurally: "what is the closure of this type" and "is this
//! type assignable to that bound".

use crate::errors::ContainerResult;
use crate::types::descriptor::{TypeDescriptor, WildcardBound, OBJECT};
use crate::types::parser::TypeParser;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// **TYPE DECLARATION**
///
/// A class or interface with its type parameter names and direct supertypes.
/// Supertypes may reference the declaration's own parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub supertypes: Vec<TypeDescriptor>,
}

impl TypeDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            supertypes: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, parameters: &[&str]) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            supertypes: Vec::new(),
        }
    }

    /// Adds a direct supertype written in descriptor syntax, e.g. `AbstractList<E>`.
    pub fn extends(mut self, supertype: &str) -> ContainerResult<Self> {
        let parsed = TypeParser::for_parameters(&self.parameters).parse(supertype)?;
        self.supertypes.push(parsed);
        Ok(self)
    }

    pub fn with_supertype(mut self, supertype: TypeDescriptor) -> Self {
        self.supertypes.push(supertype);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    declarations: HashMap<String, TypeDeclaration>,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, declaration: TypeDeclaration) {
        self.declarations
            .insert(declaration.name.clone(), declaration);
    }

    pub fn declaration(&self, name: &str) -> Option<&TypeDeclaration> {
        self.declarations.get(name)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// **TYPE CLOSURE**
    ///
    /// The type itself followed by every transitive supertype, with type arguments
    /// substituted through the chain. A raw use of a generic type yields erased
    /// supertypes. `Object` is always last for reference types.
    pub fn closure(&self, ty: &TypeDescriptor) -> Vec<TypeDescriptor> {
        let start = ty.normalized();
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            for supertype in self.direct_supertypes(&current) {
                queue.push_back(supertype);
            }
            if !current.is_object() {
                out.push(current);
            }
        }
        out.push(TypeDescriptor::object());
        out
    }

    fn direct_supertypes(&self, ty: &TypeDescriptor) -> Vec<TypeDescriptor> {
        let (raw, args) = match ty {
            TypeDescriptor::Class(raw) => (raw, None),
            TypeDescriptor::Parameterized { raw, args } => (raw, Some(args)),
            TypeDescriptor::Variable { .. } => {
                return ty.upper_bounds().iter().map(TypeDescriptor::normalized).collect()
            }
            _ => return Vec::new(),
        };
        let Some(declaration) = self.declarations.get(raw) else {
            return Vec::new();
        };

        match args {
            Some(args) if args.len() == declaration.parameters.len() => {
                let bindings: HashMap<String, TypeDescriptor> = declaration
                    .parameters
                    .iter()
                    .cloned()
                    .zip(args.iter().cloned())
                    .collect();
                declaration
                    .supertypes
                    .iter()
                    .map(|s| s.substitute(&bindings).normalized())
                    .collect()
            }
            _ if declaration.parameters.is_empty() => declaration
                .supertypes
                .iter()
                .map(TypeDescriptor::normalized)
                .collect(),
            _ => declaration
                .supertypes
                .iter()
                .map(|s| s.erased().normalized())
                .collect(),
        }
    }

    /// **ASSIGNABILITY**
    ///
    /// Whether a value of type `from` may be assigned to a location of type `to`,
    /// following reference widening, generic containment and covariant arrays.
    pub fn is_assignable(&self, to: &TypeDescriptor, from: &TypeDescriptor) -> bool {
        let to = to.normalized();
        let from = from.normalized();

        if to == from {
            return true;
        }

        match (&to, &from) {
            (_, TypeDescriptor::Variable { .. }) => from
                .upper_bounds()
                .iter()
                .any(|bound| self.is_assignable(&to, bound)),
            (TypeDescriptor::Variable { .. }, _) => to
                .upper_bounds()
                .iter()
                .all(|bound| self.is_assignable(bound, &from)),
            (_, TypeDescriptor::Wildcard(WildcardBound::Extends(bound))) => {
                self.is_assignable(&to, bound)
            }
            (_, TypeDescriptor::Wildcard(_)) => to.is_object(),
            (TypeDescriptor::Wildcard(_), _) => self.contains(&to, &from),
            (TypeDescriptor::Class(name), _) if name == OBJECT => !from.is_primitive(),
            (TypeDescriptor::Array(to_component), TypeDescriptor::Array(from_component)) => {
                if to_component.is_primitive() || from_component.is_primitive() {
                    to_component == from_component
                } else {
                    self.is_assignable(to_component, from_component)
                }
            }
            (TypeDescriptor::Class(raw), _) => self
                .closure(&from)
                .iter()
                .any(|s| s.raw_name().as_deref() == Some(raw.as_str())),
            (TypeDescriptor::Parameterized { raw, args }, _) => {
                self.closure(&from).iter().any(|supertype| match supertype {
                    TypeDescriptor::Class(s_raw) => s_raw == raw,
                    TypeDescriptor::Parameterized {
                        raw: s_raw,
                        args: s_args,
                    } => {
                        s_raw == raw
                            && s_args.len() == args.len()
                            && args
                                .iter()
                                .zip(s_args)
                                .all(|(t_arg, s_arg)| self.contains(t_arg, s_arg))
                    }
                    _ => false,
                })
            }
            _ => false,
        }
    }

    /// Type argument containment: `List<? extends Number>` contains `List<Integer>`.
    pub fn contains(&self, to_arg: &TypeDescriptor, from_arg: &TypeDescriptor) -> bool {
        match to_arg {
            TypeDescriptor::Wildcard(WildcardBound::Unbounded) => true,
            TypeDescriptor::Wildcard(WildcardBound::Extends(bound)) => match from_arg {
                TypeDescriptor::Wildcard(WildcardBound::Extends(inner)) => {
                    self.is_assignable(bound, inner)
                }
                TypeDescriptor::Wildcard(_) => bound.is_object(),
                other => self.is_assignable(bound, other),
            },
            TypeDescriptor::Wildcard(WildcardBound::Super(bound)) => match from_arg {
                TypeDescriptor::Wildcard(WildcardBound::Super(inner)) => {
                    self.is_assignable(inner, bound)
                }
                TypeDescriptor::Wildcard(_) => false,
                other => self.is_assignable(other, bound),
            },
            exact => exact.normalized() == from_arg.normalized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers() -> TypeHierarchy {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.declare(TypeDeclaration::new("Number"));
        hierarchy.declare(TypeDeclaration::new("Integer").extends("Number").unwrap());
        hierarchy.declare(TypeDeclaration::new("Long").extends("Number").unwrap());
        hierarchy.declare(TypeDeclaration::generic("Collection", &["E"]));
        hierarchy.declare(
            TypeDeclaration::generic("List", &["E"])
                .extends("Collection<E>")
                .unwrap(),
        );
        hierarchy.declare(
            TypeDeclaration::generic("ArrayList", &["E"])
                .extends("List<E>")
                .unwrap(),
        );
        hierarchy.declare(
            TypeDeclaration::new("IntList")
                .extends("ArrayList<Integer>")
                .unwrap(),
        );
        hierarchy
    }

    fn ty(text: &str) -> TypeDescriptor {
        TypeDescriptor::parse(text).unwrap()
    }

    #[test]
    fn test_closure_substitutes_arguments() {
        let hierarchy = numbers();
        let closure = hierarchy.closure(&ty("IntList"));
        assert_eq!(
            closure,
            vec![
                ty("IntList"),
                ty("ArrayList<Integer>"),
                ty("List<Integer>"),
                ty("Collection<Integer>"),
                ty("Object"),
            ]
        );
    }

    #[test]
    fn test_closure_of_raw_generic_is_erased() {
        let hierarchy = numbers();
        let closure = hierarchy.closure(&ty("ArrayList"));
        assert!(closure.contains(&ty("List")));
        assert!(closure.contains(&ty("Collection")));
    }

    #[test]
    fn test_closure_of_unknown_type() {
        let hierarchy = TypeHierarchy::new();
        assert_eq!(
            hierarchy.closure(&ty("Widget")),
            vec![ty("Widget"), ty("Object")]
        );
    }

    #[test]
    fn test_class_assignability() {
        let hierarchy = numbers();
        assert!(hierarchy.is_assignable(&ty("Number"), &ty("Integer")));
        assert!(!hierarchy.is_assignable(&ty("Integer"), &ty("Number")));
        assert!(hierarchy.is_assignable(&ty("Object"), &ty("Integer")));
        assert!(hierarchy.is_assignable(&ty("Number"), &ty("int")));
    }

    #[test]
    fn test_generic_assignability() {
        let hierarchy = numbers();
        assert!(hierarchy.is_assignable(&ty("List<Integer>"), &ty("IntList")));
        assert!(hierarchy.is_assignable(&ty("Collection<? extends Number>"), &ty("IntList")));
        assert!(!hierarchy.is_assignable(&ty("List<Number>"), &ty("IntList")));
        assert!(hierarchy.is_assignable(&ty("List<? super Integer>"), &ty("List<Number>")));
        assert!(hierarchy.is_assignable(&ty("List"), &ty("ArrayList<Long>")));
    }

    #[test]
    fn test_array_assignability() {
        let hierarchy = numbers();
        assert!(hierarchy.is_assignable(&ty("Number[]"), &ty("Integer[]")));
        assert!(!hierarchy.is_assignable(&ty("long[]"), &ty("int[]")));
        assert!(!hierarchy.is_assignable(&ty("Integer[]"), &ty("int[]")));
        assert!(hierarchy.is_assignable(&ty("Object"), &ty("int[]")));
    }

    #[test]
    fn test_variable_bounds() {
        let hierarchy = numbers();
        let t = TypeDescriptor::variable("T", vec![ty("Integer")]);
        assert!(hierarchy.is_assignable(&ty("Number"), &t));
        assert!(hierarchy.is_assignable(&t, &ty("Integer")));
        assert!(!hierarchy.is_assignable(&t, &ty("Long")));
    }
}
