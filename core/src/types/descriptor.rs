use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Root of every reference type closure.
pub const OBJECT: &str = "Object";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    /// Reference type a primitive boxes to.
    pub fn wrapper(self) -> &'static str {
        match self {
            Primitive::Boolean => "Boolean",
            Primitive::Byte => "Byte",
            Primitive::Char => "Character",
            Primitive::Short => "Short",
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "boolean" => Some(Primitive::Boolean),
            "byte" => Some(Primitive::Byte),
            "char" => Some(Primitive::Char),
            "short" => Some(Primitive::Short),
            "int" => Some(Primitive::Int),
            "long" => Some(Primitive::Long),
            "float" => Some(Primitive::Float),
            "double" => Some(Primitive::Double),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<TypeDescriptor>),
    Super(Box<TypeDescriptor>),
}

/// **TYPE DESCRIPTOR**
///
/// **PURPOSE**: Structural description of a bean type or a requested type.
/// **GUARANTEE**: Structural equality and hashing, so descriptors can key caches.
///
/// Wildcards are only meaningful as type arguments. Type variables carry their
/// declared upper bounds; an empty bound list means `Object`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeDescriptor {
    Primitive(Primitive),
    Class(String),
    Parameterized {
        raw: String,
        args: Vec<TypeDescriptor>,
    },
    Array(Box<TypeDescriptor>),
    Wildcard(WildcardBound),
    Variable {
        name: String,
        bounds: Vec<TypeDescriptor>,
    },
}

impl TypeDescriptor {
    pub fn class(name: impl Into<String>) -> Self {
        TypeDescriptor::Class(name.into())
    }

    pub fn object() -> Self {
        TypeDescriptor::Class(OBJECT.to_string())
    }

    pub fn parameterized(raw: impl Into<String>, args: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Parameterized {
            raw: raw.into(),
            args,
        }
    }

    pub fn array(component: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(component))
    }

    /// `?`
    pub fn wildcard() -> Self {
        TypeDescriptor::Wildcard(WildcardBound::Unbounded)
    }

    /// `? extends bound`
    pub fn extends(bound: TypeDescriptor) -> Self {
        TypeDescriptor::Wildcard(WildcardBound::Extends(Box::new(bound)))
    }

    /// `? super bound`
    pub fn super_of(bound: TypeDescriptor) -> Self {
        TypeDescriptor::Wildcard(WildcardBound::Super(Box::new(bound)))
    }

    pub fn variable(name: impl Into<String>, bounds: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Variable {
            name: name.into(),
            bounds,
        }
    }

    /// Shorthand for `TypeParser` with no type variables in scope.
    pub fn parse(text: &str) -> crate::errors::ContainerResult<Self> {
        super::parser::TypeParser::new().parse(text)
    }

    /// **NORMALIZATION**
    ///
    /// Boxes primitives, collapses argument-less parameterizations to plain classes
    /// and normalizes type arguments. Primitive array components stay primitive:
    /// `int[]` and `Integer[]` are distinct types.
    pub fn normalized(&self) -> TypeDescriptor {
        match self {
            TypeDescriptor::Primitive(p) => TypeDescriptor::Class(p.wrapper().to_string()),
            TypeDescriptor::Parameterized { raw, args } if args.is_empty() => {
                TypeDescriptor::Class(raw.clone())
            }
            TypeDescriptor::Parameterized { raw, args } => TypeDescriptor::Parameterized {
                raw: raw.clone(),
                args: args.iter().map(TypeDescriptor::normalized).collect(),
            },
            TypeDescriptor::Array(component) => match component.as_ref() {
                TypeDescriptor::Primitive(_) => self.clone(),
                other => TypeDescriptor::Array(Box::new(other.normalized())),
            },
            TypeDescriptor::Wildcard(WildcardBound::Extends(bound)) => {
                TypeDescriptor::Wildcard(WildcardBound::Extends(Box::new(bound.normalized())))
            }
            TypeDescriptor::Wildcard(WildcardBound::Super(bound)) => {
                TypeDescriptor::Wildcard(WildcardBound::Super(Box::new(bound.normalized())))
            }
            TypeDescriptor::Variable { name, bounds } => TypeDescriptor::Variable {
                name: name.clone(),
                bounds: bounds.iter().map(TypeDescriptor::normalized).collect(),
            },
            TypeDescriptor::Class(_) | TypeDescriptor::Wildcard(WildcardBound::Unbounded) => {
                self.clone()
            }
        }
    }

    /// Raw class name used for indexing. `None` for wildcards and type variables.
    pub fn raw_name(&self) -> Option<String> {
        match self {
            TypeDescriptor::Primitive(p) => Some(p.wrapper().to_string()),
            TypeDescriptor::Class(name) => Some(name.clone()),
            TypeDescriptor::Parameterized { raw, .. } => Some(raw.clone()),
            TypeDescriptor::Array(component) => match component.as_ref() {
                TypeDescriptor::Primitive(p) => Some(format!("{}[]", p.keyword())),
                other => other.raw_name().map(|name| format!("{}[]", name)),
            },
            TypeDescriptor::Wildcard(_) | TypeDescriptor::Variable { .. } => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, TypeDescriptor::Class(name) if name == OBJECT)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, TypeDescriptor::Wildcard(_))
    }

    /// A type variable without bounds, or bounded only by `Object`.
    pub fn is_unbounded_variable(&self) -> bool {
        match self {
            TypeDescriptor::Variable { bounds, .. } => bounds.iter().all(TypeDescriptor::is_object),
            _ => false,
        }
    }

    pub fn is_object_or_unbounded_variable(&self) -> bool {
        self.is_object() || self.is_unbounded_variable()
    }

    /// Declared upper bounds of a type variable, defaulting to `Object`.
    pub fn upper_bounds(&self) -> Vec<TypeDescriptor> {
        match self {
            TypeDescriptor::Variable { bounds, .. } if !bounds.is_empty() => bounds.clone(),
            TypeDescriptor::Variable { .. } => vec![TypeDescriptor::object()],
            TypeDescriptor::Wildcard(WildcardBound::Extends(bound)) => vec![bound.as_ref().clone()],
            TypeDescriptor::Wildcard(_) => vec![TypeDescriptor::object()],
            other => vec![other.clone()],
        }
    }

    /// Replaces type variables by name.
    pub fn substitute(&self, bindings: &HashMap<String, TypeDescriptor>) -> TypeDescriptor {
        match self {
            TypeDescriptor::Variable { name, .. } => match bindings.get(name) {
                Some(actual) => actual.clone(),
                None => self.clone(),
            },
            TypeDescriptor::Parameterized { raw, args } => TypeDescriptor::Parameterized {
                raw: raw.clone(),
                args: args.iter().map(|arg| arg.substitute(bindings)).collect(),
            },
            TypeDescriptor::Array(component) => {
                TypeDescriptor::Array(Box::new(component.substitute(bindings)))
            }
            TypeDescriptor::Wildcard(WildcardBound::Extends(bound)) => TypeDescriptor::Wildcard(
                WildcardBound::Extends(Box::new(bound.substitute(bindings))),
            ),
            TypeDescriptor::Wildcard(WildcardBound::Super(bound)) => TypeDescriptor::Wildcard(
                WildcardBound::Super(Box::new(bound.substitute(bindings))),
            ),
            TypeDescriptor::Primitive(_)
            | TypeDescriptor::Class(_)
            | TypeDescriptor::Wildcard(WildcardBound::Unbounded) => self.clone(),
        }
    }

    /// Erasure: drops type arguments, replaces variables by their first bound.
    pub fn erased(&self) -> TypeDescriptor {
        match self {
            TypeDescriptor::Parameterized { raw, .. } => TypeDescriptor::Class(raw.clone()),
            TypeDescriptor::Variable { bounds, .. } => bounds
                .first()
                .map(TypeDescriptor::erased)
                .unwrap_or_else(TypeDescriptor::object),
            TypeDescriptor::Array(component) => TypeDescriptor::Array(Box::new(component.erased())),
            TypeDescriptor::Wildcard(_) => TypeDescriptor::object(),
            TypeDescriptor::Primitive(_) | TypeDescriptor::Class(_) => self.clone(),
        }
    }

    /// Whether the type can appear at the top level of a bean type or a request.
    pub fn is_legal_top_level(&self) -> bool {
        match self {
            TypeDescriptor::Wildcard(_) => false,
            TypeDescriptor::Parameterized { args, .. } => {
                args.iter().all(|arg| !arg.contains_nested_wildcard())
            }
            TypeDescriptor::Array(component) => component.is_legal_top_level(),
            _ => true,
        }
    }

    // A wildcard may be a direct type argument but never an array component.
    fn contains_nested_wildcard(&self) -> bool {
        match self {
            TypeDescriptor::Wildcard(WildcardBound::Unbounded) => false,
            TypeDescriptor::Wildcard(WildcardBound::Extends(bound))
            | TypeDescriptor::Wildcard(WildcardBound::Super(bound)) => bound.is_wildcard(),
            TypeDescriptor::Parameterized { args, .. } => {
                args.iter().any(TypeDescriptor::contains_nested_wildcard)
            }
            TypeDescriptor::Array(component) => component.is_wildcard(),
            _ => false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(p) => write!(f, "{}", p.keyword()),
            TypeDescriptor::Class(name) => write!(f, "{}", name),
            TypeDescriptor::Parameterized { raw, args } => {
                write!(f, "{}<", raw)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            TypeDescriptor::Array(component) => write!(f, "{}[]", component),
            TypeDescriptor::Wildcard(WildcardBound::Unbounded) => write!(f, "?"),
            TypeDescriptor::Wildcard(WildcardBound::Extends(bound)) => {
                write!(f, "? extends {}", bound)
            }
            TypeDescriptor::Wildcard(WildcardBound::Super(bound)) => write!(f, "? super {}", bound),
            TypeDescriptor::Variable { name, .. } => write!(f, "{}", name),
        }
    }
}
