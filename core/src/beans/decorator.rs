use crate::beans::metadata::{BeanId, Instance, TypeSpec};
use crate::context::CreationContext;
use crate::errors::{error_codes, ContainerError, ContainerResult};
use crate::qualifiers::{Qualifier, QualifierSet};
use crate::types::TypeDescriptor;
use std::fmt;
use std::sync::Arc;

/// Wraps the delegate instance and returns the decorated one.
pub type DecorateFn =
    Arc<dyn Fn(Instance, &mut CreationContext<'_>) -> ContainerResult<Instance> + Send + Sync>;

/// **DECORATOR METADATA**
///
/// Applies to every bean having a type matched by `delegate_type` and qualifiers
/// matched by `delegate_qualifiers`. Enabled only when it carries a priority.
#[derive(Clone)]
pub struct DecoratorMetadata {
    id: BeanId,
    delegate_type: TypeDescriptor,
    delegate_qualifiers: QualifierSet,
    priority: Option<i32>,
    decorate: DecorateFn,
}

impl DecoratorMetadata {
    pub fn builder(id: impl Into<String>) -> DecoratorBuilder {
        DecoratorBuilder {
            id: id.into(),
            delegate_type: None,
            delegate_qualifiers: Vec::new(),
            priority: None,
            decorate: None,
        }
    }

    pub fn id(&self) -> &BeanId {
        &self.id
    }

    pub fn delegate_type(&self) -> &TypeDescriptor {
        &self.delegate_type
    }

    pub fn delegate_qualifiers(&self) -> &QualifierSet {
        &self.delegate_qualifiers
    }

    pub fn priority(&self) -> Option<i32> {
        self.priority
    }

    pub fn is_enabled(&self) -> bool {
        self.priority.is_some()
    }

    pub fn apply(
        &self,
        delegate: Instance,
        ctx: &mut CreationContext<'_>,
    ) -> ContainerResult<Instance> {
        (self.decorate)(delegate, ctx)
    }
}

impl fmt::Debug for DecoratorMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorMetadata")
            .field("id", &self.id)
            .field("delegate_type", &self.delegate_type)
            .field("delegate_qualifiers", &self.delegate_qualifiers)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

pub struct DecoratorBuilder {
    id: String,
    delegate_type: Option<TypeSpec>,
    delegate_qualifiers: Vec<Qualifier>,
    priority: Option<i32>,
    decorate: Option<DecorateFn>,
}

impl DecoratorBuilder {
    pub fn delegate(mut self, ty: impl Into<TypeSpec>) -> Self {
        self.delegate_type = Some(ty.into());
        self
    }

    pub fn delegate_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.delegate_qualifiers.push(qualifier);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn decorate<F>(mut self, decorate: F) -> Self
    where
        F: Fn(Instance, &mut CreationContext<'_>) -> ContainerResult<Instance>
            + Send
            + Sync
            + 'static,
    {
        self.decorate = Some(Arc::new(decorate));
        self
    }

    pub fn build(self) -> ContainerResult<DecoratorMetadata> {
        let invalid = |reason: &str| {
            ContainerError::definition(
                error_codes::INVALID_DECORATOR,
                format!("decorator '{}' {}", self.id, reason),
            )
        };

        if self.id.trim().is_empty() {
            return Err(ContainerError::definition(
                error_codes::EMPTY_BEAN_ID,
                "decorator identifier must not be empty",
            ));
        }
        let delegate_type = self
            .delegate_type
            .ok_or_else(|| invalid("declares no delegate type"))?
            .resolve()?
            .normalized();
        if !delegate_type.is_legal_top_level() {
            return Err(invalid("declares an illegal delegate type"));
        }
        let decorate = self
            .decorate
            .ok_or_else(|| invalid("declares no decorate function"))?;

        Ok(DecoratorMetadata {
            id: BeanId::new(self.id),
            delegate_type,
            delegate_qualifiers: self.delegate_qualifiers.into_iter().collect(),
            priority: self.priority,
            decorate,
        })
    }
}
