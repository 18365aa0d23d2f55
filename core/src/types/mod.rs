//! # TYPE MODEL
//!
//! **STRUCTURAL TYPES, HIERARCHY AND ASSIGNABILITY**
//!
//! Bean types and requested types are plain data (`TypeDescriptor`). The
//! hierarchy supplies declared supertypes; the matcher applies the bean
//! assignability rules on top of it.

pub mod descriptor;
pub mod hierarchy;
pub mod matcher;
pub mod parser;

pub use descriptor::{Primitive, TypeDescriptor, WildcardBound, OBJECT};
pub use hierarchy::{TypeDeclaration, TypeHierarchy};
pub use matcher::TypeMatcher;
pub use parser::TypeParser;
