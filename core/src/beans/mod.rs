//! # BEAN MODEL
//!
//! Metadata records describing beans and decorators, the scope vocabulary and the
//! injection points beans declare.

pub mod decorator;
pub mod injection;
pub mod metadata;
pub mod scope;

pub use decorator::{DecorateFn, DecoratorBuilder, DecoratorMetadata};
pub use injection::{Delivery, InjectionPoint};
pub use metadata::{
    downcast, BeanBuilder, BeanId, BeanMetadata, ConstructionStrategy, CreateFn, DisposeFn,
    Instance, ProduceFn, TypeSpec,
};
pub use scope::ScopeKind;
