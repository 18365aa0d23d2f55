use crate::beans::{downcast, BeanMetadata, Instance};
use crate::context::handle::ContextHandle;
use crate::context::instance::CreationalContext;
use crate::errors::ContainerResult;
use crate::qualifiers::QualifierSet;
use crate::types::TypeDescriptor;
use std::any::Any;
use std::sync::Arc;

/// **CREATION CONTEXT**
///
/// Handed to bean factories, producers and decorators. Every lookup made through
/// it belongs to the construction chain of the bean being built, and dependent
/// instances it creates are destroyed together with that bean.
pub struct CreationContext<'a> {
    handle: &'a ContextHandle,
    bean: &'a Arc<BeanMetadata>,
    creational: CreationalContext,
}

impl<'a> CreationContext<'a> {
    pub(crate) fn new(handle: &'a ContextHandle, bean: &'a Arc<BeanMetadata>) -> Self {
        Self {
            handle,
            bean,
            creational: CreationalContext::new(),
        }
    }

    /// The bean under construction.
    pub fn bean(&self) -> &BeanMetadata {
        self.bean
    }

    pub fn handle(&self) -> &'a ContextHandle {
        self.handle
    }

    /// Contextual reference: a client proxy for normal-scoped beans, the instance otherwise.
    pub fn reference(
        &mut self,
        required_type: &TypeDescriptor,
        qualifiers: &QualifierSet,
    ) -> ContainerResult<Instance> {
        let target = self.handle.resolve_unique(required_type, qualifiers)?;
        self.reference_to(&target)
    }

    pub fn reference_to(&mut self, bean: &Arc<BeanMetadata>) -> ContainerResult<Instance> {
        if bean.scope().is_normal() {
            return Ok(self.handle.client_proxy(bean));
        }
        self.handle.get_or_create_in(bean, Some(&mut self.creational))
    }

    /// The contextual instance itself, never a proxy.
    pub fn instance(
        &mut self,
        required_type: &TypeDescriptor,
        qualifiers: &QualifierSet,
    ) -> ContainerResult<Instance> {
        let target = self.handle.resolve_unique(required_type, qualifiers)?;
        self.handle.get_or_create_in(&target, Some(&mut self.creational))
    }

    pub fn instance_as<T: Any + Send + Sync>(
        &mut self,
        required_type: &TypeDescriptor,
        qualifiers: &QualifierSet,
    ) -> ContainerResult<Arc<T>> {
        let target = self.handle.resolve_unique(required_type, qualifiers)?;
        let instance = self
            .handle
            .get_or_create_in(&target, Some(&mut self.creational))?;
        downcast(target.id().as_str(), instance)
    }

    /// Instance of the unqualified bean of the given type, parsed from text.
    pub fn lookup<T: Any + Send + Sync>(&mut self, required_type: &str) -> ContainerResult<Arc<T>> {
        let required_type = TypeDescriptor::parse(required_type)?;
        self.instance_as(&required_type, &QualifierSet::new())
    }

    /// References to every matching bean, in registration order.
    pub fn all(
        &mut self,
        required_type: &TypeDescriptor,
        qualifiers: &QualifierSet,
    ) -> ContainerResult<Vec<Instance>> {
        let targets = self.handle.resolve_all(required_type, qualifiers)?;
        targets
            .iter()
            .map(|target| self.reference_to(target))
            .collect()
    }

    /// Dependent instances created so far for the bean under construction.
    pub fn dependents(&self) -> usize {
        self.creational.len()
    }

    pub(crate) fn into_creational(self) -> CreationalContext {
        self.creational
    }

    /// Tears down dependents of a construction that did not complete.
    pub(crate) fn discard(self) {
        for failure in self.creational.destroy() {
            log::warn!(
                "Disposal failed while discarding partial construction of {}: {}",
                self.bean.id(),
                failure
            );
        }
    }
}
