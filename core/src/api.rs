pub use crate::beans::{
    downcast, BeanBuilder, BeanId, BeanMetadata, ConstructionStrategy, DecoratorMetadata,
    Delivery, InjectionPoint, Instance, ScopeKind,
};
pub use crate::config::ContainerConfig;
pub use crate::container::{Container, Deployment, Extension};
pub use crate::context::{
    ClientProxy, ContextHandle, ContextualLookup, CreationContext, DefaultProxyFactory,
    ProxyFactory, ScopeStore,
};
pub use crate::errors::{error_codes, ContainerError, ContainerResult, DisposalFailure};
pub use crate::qualifiers::{MemberValue, Qualifier, QualifierSet};
pub use crate::registry::BeanRegistry;
pub use crate::resolution::{CacheStats, Resolution, ResolutionKey, ResolutionOutcome};
pub use crate::types::{TypeDeclaration, TypeDescriptor};
