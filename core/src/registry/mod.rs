//! # BEAN REGISTRY
//!
//! **TWO-PHASE CATALOGUE OF BEAN METADATA**
//!
//! Mutable while the deployment registers beans, read-only after [`BeanRegistry::freeze`].
//! Freezing validates specialization, settles which alternatives are enabled and
//! builds the raw-type index resolution runs against.

mod specialization;

use crate::beans::{BeanId, BeanMetadata, ConstructionStrategy, DecoratorMetadata};
use crate::errors::{error_codes, ContainerError, ContainerResult};
use crate::resolution::precedence;
use crate::types::{TypeDeclaration, TypeDescriptor, TypeHierarchy};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct BeanRegistry {
    hierarchy: Arc<TypeHierarchy>,
    beans: Vec<Arc<BeanMetadata>>,
    index: HashMap<BeanId, usize>,
    decorators: Vec<Arc<DecoratorMetadata>>,
    enabled_alternatives: HashSet<String>,
    frozen: bool,
    // Settled by freeze().
    active: Vec<bool>,
    by_type: HashMap<String, Vec<usize>>,
    by_name: HashMap<String, Vec<usize>>,
}

impl BeanRegistry {
    pub fn new() -> Self {
        Self::with_hierarchy(TypeHierarchy::new())
    }

    pub fn with_hierarchy(hierarchy: TypeHierarchy) -> Self {
        Self {
            hierarchy: Arc::new(hierarchy),
            beans: Vec::new(),
            index: HashMap::new(),
            decorators: Vec::new(),
            enabled_alternatives: HashSet::new(),
            frozen: false,
            active: Vec::new(),
            by_type: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    fn ensure_mutable(&self, operation: &str) -> ContainerResult<()> {
        if self.frozen {
            return Err(ContainerError::configuration(
                error_codes::REGISTRY_FROZEN,
                format!("cannot {} after the registry is frozen", operation),
            ));
        }
        Ok(())
    }

    pub fn declare_type(&mut self, declaration: TypeDeclaration) -> ContainerResult<()> {
        self.ensure_mutable("declare a type")?;
        Arc::make_mut(&mut self.hierarchy).declare(declaration);
        Ok(())
    }

    /// Enables an alternative by bean identifier or bean-class raw name.
    pub fn enable_alternative(&mut self, selector: impl Into<String>) -> ContainerResult<()> {
        self.ensure_mutable("enable an alternative")?;
        self.enabled_alternatives.insert(selector.into());
        Ok(())
    }

    pub fn register(&mut self, bean: BeanMetadata) -> ContainerResult<Arc<BeanMetadata>> {
        self.ensure_mutable("register a bean")?;
        if self.index.contains_key(bean.id()) {
            return Err(ContainerError::definition(
                error_codes::DUPLICATE_BEAN,
                format!("bean '{}' is already registered", bean.id()),
            ));
        }

        let bean = if bean.derives_types() {
            let mut types = self.type_closure(bean.bean_class());
            types.extend(bean.types().iter().cloned());
            bean.with_types(types)
        } else {
            bean
        };

        log::debug!("Registering bean {}", bean);
        let bean = Arc::new(bean);
        self.index.insert(bean.id().clone(), self.beans.len());
        self.beans.push(Arc::clone(&bean));
        Ok(bean)
    }

    pub fn register_decorator(
        &mut self,
        decorator: DecoratorMetadata,
    ) -> ContainerResult<Arc<DecoratorMetadata>> {
        self.ensure_mutable("register a decorator")?;
        if self.decorators.iter().any(|d| d.id() == decorator.id()) {
            return Err(ContainerError::definition(
                error_codes::DUPLICATE_BEAN,
                format!("decorator '{}' is already registered", decorator.id()),
            ));
        }
        log::debug!("Registering decorator {}", decorator.id());
        let decorator = Arc::new(decorator);
        self.decorators.push(Arc::clone(&decorator));
        Ok(decorator)
    }

    /// **FREEZE**
    ///
    /// Ends the registration phase. Fails with a definition error on broken
    /// specialization links, unknown producer declaring beans or ambiguous bean names.
    pub fn freeze(&mut self) -> ContainerResult<()> {
        self.ensure_mutable("freeze")?;

        for bean in &self.beans {
            if let ConstructionStrategy::Producer { declaring_bean, .. } = bean.strategy() {
                if !self.index.contains_key(declaring_bean) {
                    return Err(ContainerError::definition(
                        error_codes::DECLARING_BEAN_MISSING,
                        format!(
                            "producer bean '{}' is declared on unknown bean '{}'",
                            bean.id(),
                            declaring_bean
                        ),
                    ));
                }
            }
        }

        let enabled: Vec<bool> = self
            .beans
            .iter()
            .map(|bean| self.alternative_enabled(bean))
            .collect();
        let excluded = specialization::validate(&self.beans, &self.index, &enabled)?;

        let active: Vec<bool> = enabled
            .iter()
            .enumerate()
            .map(|(position, on)| *on && !excluded.contains(&position))
            .collect();

        let mut by_type: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, bean) in self.beans.iter().enumerate() {
            if !active[position] {
                continue;
            }
            for raw in bean.types().iter().filter_map(TypeDescriptor::raw_name) {
                let slot = by_type.entry(raw).or_default();
                if slot.last() != Some(&position) {
                    slot.push(position);
                }
            }
            if let Some(name) = bean.name() {
                by_name.entry(name.to_string()).or_default().push(position);
            }
        }

        for (name, positions) in &by_name {
            if positions.len() < 2 {
                continue;
            }
            let candidates: Vec<Arc<BeanMetadata>> =
                positions.iter().map(|&p| Arc::clone(&self.beans[p])).collect();
            let survivors = precedence::tie_break(candidates);
            if survivors.len() > 1 {
                let ids: Vec<String> = survivors.iter().map(|b| b.id().to_string()).collect();
                return Err(ContainerError::definition(
                    error_codes::AMBIGUOUS_NAME,
                    format!("bean name '{}' is shared by {}", name, ids.join(", ")),
                ));
            }
        }

        self.active = active;
        self.by_type = by_type;
        self.by_name = by_name;
        self.frozen = true;

        log::info!(
            "Bean registry frozen: {} beans ({} active), {} decorators",
            self.beans.len(),
            self.active.iter().filter(|on| **on).count(),
            self.decorators.len()
        );
        Ok(())
    }

    fn alternative_enabled(&self, bean: &BeanMetadata) -> bool {
        if !bean.is_alternative() || bean.priority().is_some() {
            return true;
        }
        self.enabled_alternatives.contains(bean.id().as_str())
            || bean
                .bean_class()
                .raw_name()
                .is_some_and(|raw| self.enabled_alternatives.contains(&raw))
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.beans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }

    pub fn bean(&self, id: &str) -> Option<&Arc<BeanMetadata>> {
        self.index.get(id).map(|&position| &self.beans[position])
    }

    /// Every registered bean in registration order, including disabled ones.
    pub fn beans(&self) -> impl Iterator<Item = &Arc<BeanMetadata>> {
        self.beans.iter()
    }

    /// Beans taking part in resolution: enabled and not specialized away.
    pub fn active_beans(&self) -> impl Iterator<Item = &Arc<BeanMetadata>> {
        self.beans
            .iter()
            .enumerate()
            .filter(|(position, _)| self.active.get(*position).copied().unwrap_or(false))
            .map(|(_, bean)| bean)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.index
            .get(id)
            .and_then(|&position| self.active.get(position).copied())
            .unwrap_or(false)
    }

    /// Whether `specializer` specializes `specialized`, directly or through a chain.
    pub fn is_specialized_by(&self, specialized: &BeanId, specializer: &BeanId) -> bool {
        let mut current = self.bean(specializer.as_str()).and_then(|b| b.specializes());
        let mut steps = 0;
        while let Some(target) = current {
            if target == specialized {
                return true;
            }
            steps += 1;
            if steps > self.beans.len() {
                return false;
            }
            current = self.bean(target.as_str()).and_then(|b| b.specializes());
        }
        false
    }

    /// **CANDIDATE PRE-FILTER**
    ///
    /// Active beans having a type with the requested raw name, in registration order.
    /// Requests without a raw name (type variables) fall back to every active bean.
    pub fn candidates_for(&self, required: &TypeDescriptor) -> Vec<Arc<BeanMetadata>> {
        match required.normalized().raw_name() {
            Some(raw) => self
                .by_type
                .get(&raw)
                .map(|positions| {
                    positions
                        .iter()
                        .map(|&position| Arc::clone(&self.beans[position]))
                        .collect()
                })
                .unwrap_or_default(),
            None => self.active_beans().cloned().collect(),
        }
    }

    /// Active beans carrying the given bean name, in registration order.
    pub fn named(&self, name: &str) -> Vec<Arc<BeanMetadata>> {
        self.by_name
            .get(name)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&position| Arc::clone(&self.beans[position]))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn decorators(&self) -> &[Arc<DecoratorMetadata>] {
        &self.decorators
    }

    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }

    pub fn shared_hierarchy(&self) -> Arc<TypeHierarchy> {
        Arc::clone(&self.hierarchy)
    }

    pub fn type_closure(&self, ty: &TypeDescriptor) -> Vec<TypeDescriptor> {
        self.hierarchy.closure(ty)
    }
}

impl Default for BeanRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qualifiers::Qualifier;

    fn bean(id: &str) -> BeanMetadata {
        BeanMetadata::builder(id).value(id.to_string()).build().unwrap()
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = BeanRegistry::new();
        registry.register(bean("a")).unwrap();
        let err = registry.register(bean("a")).unwrap_err();
        assert_eq!(err.code(), Some(error_codes::DUPLICATE_BEAN));
    }

    #[test]
    fn test_mutation_after_freeze() {
        let mut registry = BeanRegistry::new();
        registry.register(bean("a")).unwrap();
        registry.freeze().unwrap();

        let err = registry.register(bean("b")).unwrap_err();
        assert!(matches!(err, ContainerError::Configuration { .. }));
        assert_eq!(err.code(), Some(error_codes::REGISTRY_FROZEN));
        assert!(registry.freeze().is_err());
    }

    #[test]
    fn test_candidates_by_raw_type() {
        let mut registry = BeanRegistry::new();
        registry
            .register(
                BeanMetadata::builder("names")
                    .bean_class("NameList")
                    .typed("List<String>")
                    .value(Vec::<String>::new())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry.register(bean("other")).unwrap();
        registry.freeze().unwrap();

        let list = registry.candidates_for(&TypeDescriptor::parse("List<Integer>").unwrap());
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id().as_str(), "names");

        let everything = registry.candidates_for(&TypeDescriptor::object());
        assert_eq!(everything.len(), 2);
        assert!(registry.candidates_for(&TypeDescriptor::class("Missing")).is_empty());
    }

    #[test]
    fn test_derived_types_use_hierarchy() {
        let mut registry = BeanRegistry::new();
        registry
            .declare_type(TypeDeclaration::new("FileStore").extends("Store").unwrap())
            .unwrap();
        let registered = registry
            .register(
                BeanMetadata::builder("files")
                    .bean_class("FileStore")
                    .derive_types()
                    .value(0u8)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        assert!(registered.types().contains(&TypeDescriptor::class("Store")));
        assert_eq!(registered.types().last(), Some(&TypeDescriptor::object()));
    }

    #[test]
    fn test_disabled_alternative_dropped_at_freeze() {
        let mut registry = BeanRegistry::new();
        registry
            .register(
                BeanMetadata::builder("mock")
                    .bean_class("MockMailer")
                    .typed("Mailer")
                    .alternative()
                    .value(1u8)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                BeanMetadata::builder("stub")
                    .bean_class("StubMailer")
                    .typed("Mailer")
                    .alternative()
                    .value(2u8)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry.enable_alternative("StubMailer").unwrap();
        registry.freeze().unwrap();

        assert!(!registry.is_active("mock"));
        assert!(registry.is_active("stub"));
    }

    #[test]
    fn test_specialization_validation() {
        let mut registry = BeanRegistry::new();
        registry
            .register(
                BeanMetadata::builder("b")
                    .typed("Service")
                    .specializes("missing")
                    .value(1u8)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let err = registry.freeze().unwrap_err();
        assert_eq!(err.code(), Some(error_codes::SPECIALIZED_BEAN_MISSING));

        let mut registry = BeanRegistry::new();
        registry
            .register(BeanMetadata::builder("a").typed("Service").value(1u8).build().unwrap())
            .unwrap();
        registry
            .register(
                BeanMetadata::builder("b")
                    .qualifier(Qualifier::new("Red"))
                    .typed("Service")
                    .typed("a")
                    .specializes("a")
                    .value(2u8)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let err = registry.freeze().unwrap_err();
        assert_eq!(err.code(), Some(error_codes::SPECIALIZATION_QUALIFIERS));
    }

    #[test]
    fn test_specialization_cycle() {
        let mut registry = BeanRegistry::new();
        registry
            .register(
                BeanMetadata::builder("a")
                    .bean_class("Impl")
                    .specializes("b")
                    .value(1u8)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                BeanMetadata::builder("b")
                    .bean_class("Impl")
                    .specializes("a")
                    .value(2u8)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let err = registry.freeze().unwrap_err();
        assert_eq!(err.code(), Some(error_codes::SPECIALIZATION_CYCLE));
    }

    #[test]
    fn test_ambiguous_bean_name() {
        let mut registry = BeanRegistry::new();
        registry
            .register(BeanMetadata::builder("x").named("mailer").value(1u8).build().unwrap())
            .unwrap();
        registry
            .register(BeanMetadata::builder("y").named("mailer").value(2u8).build().unwrap())
            .unwrap();
        let err = registry.freeze().unwrap_err();
        assert_eq!(err.code(), Some(error_codes::AMBIGUOUS_NAME));
    }

    #[test]
    fn test_named_lookup_only_sees_active_beans() {
        let mut registry = BeanRegistry::new();
        registry
            .register(BeanMetadata::builder("smtp").named("mailer").value(1u8).build().unwrap())
            .unwrap();
        registry
            .register(
                BeanMetadata::builder("mock")
                    .named("mockMailer")
                    .alternative()
                    .value(2u8)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry.freeze().unwrap();

        let mailers = registry.named("mailer");
        assert_eq!(mailers.len(), 1);
        assert_eq!(mailers[0].id().as_str(), "smtp");
        assert!(registry.named("mockMailer").is_empty());
        assert!(registry.named("missing").is_empty());
    }

    #[test]
    fn test_type_closure_follows_declarations() {
        let mut registry = BeanRegistry::new();
        registry
            .declare_type(TypeDeclaration::new("FileStore").extends("Store").unwrap())
            .unwrap();
        let closure = registry.type_closure(&TypeDescriptor::class("FileStore"));
        assert_eq!(closure.first(), Some(&TypeDescriptor::class("FileStore")));
        assert!(closure.contains(&TypeDescriptor::class("Store")));
        assert_eq!(closure.last(), Some(&TypeDescriptor::object()));
    }

    #[test]
    fn test_unknown_declaring_bean() {
        let mut registry = BeanRegistry::new();
        registry
            .register(
                BeanMetadata::builder("conn")
                    .producer("pool", |pool, _| Ok(pool.clone()))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let err = registry.freeze().unwrap_err();
        assert_eq!(err.code(), Some(error_codes::DECLARING_BEAN_MISSING));
    }
}
