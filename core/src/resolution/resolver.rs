use crate::beans::{BeanId, BeanMetadata, DecoratorMetadata};
use crate::errors::{ContainerError, ContainerResult};
use crate::qualifiers::{Qualifier, QualifierMatcher, QualifierSet};
use crate::registry::BeanRegistry;
use crate::resolution::cache::{CacheStats, ResolutionCache};
use crate::resolution::key::{Resolution, ResolutionKey, ResolutionOutcome};
use crate::resolution::precedence;
use crate::types::{TypeDescriptor, TypeMatcher};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// **TYPESAFE RESOLVER**
///
/// **PURPOSE**: Maps a `(type, qualifiers)` request onto the beans of a frozen registry.
/// **GUARANTEE**: Deterministic. The same key always yields the same outcome, computed once.
///
/// Steps for a unique lookup:
/// 1. raw-type pre-filter from the registry index
/// 2. type and qualifier match
/// 3. drop beans specialized by another candidate
/// 4. with several left, keep alternatives only when there are any
/// 5. with several left, a strict priority maximum wins
/// 6. classify as `Unique`, `Ambiguous` or `Unsatisfied`
///
/// Collection lookups return the step 3 set and skip the tie-breaks.
pub struct TypeSafeResolver {
    registry: Arc<BeanRegistry>,
    types: TypeMatcher,
    qualifiers: QualifierMatcher,
    cache: ResolutionCache,
    decorators: RwLock<HashMap<BeanId, Arc<Vec<Arc<DecoratorMetadata>>>>>,
}

impl TypeSafeResolver {
    pub fn new(registry: Arc<BeanRegistry>, relaxed_raw_types: bool) -> Self {
        let types = TypeMatcher::with_raw_mode(registry.shared_hierarchy(), relaxed_raw_types);
        Self {
            registry,
            types,
            qualifiers: QualifierMatcher::new(),
            cache: ResolutionCache::new(),
            decorators: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &BeanRegistry {
        &self.registry
    }

    pub fn type_matcher(&self) -> &TypeMatcher {
        &self.types
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Cached resolution for a key; fails with `NotDeployed` before the registry is frozen.
    pub fn resolve(&self, key: &ResolutionKey) -> ContainerResult<Arc<Resolution>> {
        if !self.registry.is_frozen() {
            return Err(ContainerError::NotDeployed {
                key: key.to_string(),
            });
        }
        Ok(self.cache.get_or_compute(key, |key| self.compute(key)))
    }

    pub fn resolve_unique(
        &self,
        required_type: &TypeDescriptor,
        qualifiers: &QualifierSet,
    ) -> ContainerResult<Arc<BeanMetadata>> {
        self.resolve(&ResolutionKey::new(required_type.clone(), qualifiers))?
            .unique()
    }

    /// Every matching non-specialized bean, in registration order.
    pub fn resolve_all(
        &self,
        required_type: &TypeDescriptor,
        qualifiers: &QualifierSet,
    ) -> ContainerResult<Vec<Arc<BeanMetadata>>> {
        Ok(self
            .resolve(&ResolutionKey::new(required_type.clone(), qualifiers))?
            .candidates
            .clone())
    }

    /// **NAME RESOLUTION**
    ///
    /// A bean name is carried as a `Named` qualifier, so this is a typed lookup of
    /// `Object` with that qualifier and follows the same rules.
    pub fn resolve_by_name(&self, name: &str) -> ContainerResult<Arc<BeanMetadata>> {
        let qualifiers = QualifierSet::of([Qualifier::named(name)]);
        self.resolve_unique(&TypeDescriptor::object(), &qualifiers)
    }

    /// **DECORATOR RESOLUTION**
    ///
    /// Enabled decorators whose delegate type matches one of the bean's types and
    /// whose delegate qualifiers match the bean's qualifiers, by ascending priority.
    /// The first entry is the outermost decorator.
    pub fn resolve_decorators(&self, bean: &BeanMetadata) -> Arc<Vec<Arc<DecoratorMetadata>>> {
        if let Some(found) = self.decorators.read().get(bean.id()) {
            return Arc::clone(found);
        }

        let mut matching: Vec<Arc<DecoratorMetadata>> = self
            .registry
            .decorators()
            .iter()
            .filter(|d| d.is_enabled())
            .filter(|d| self.types.matches(d.delegate_type(), bean.types()))
            .filter(|d| self.qualifiers.matches(d.delegate_qualifiers(), bean.qualifiers()))
            .cloned()
            .collect();
        matching.sort_by_key(|d| d.priority());

        let matching = Arc::new(matching);
        Arc::clone(
            self.decorators
                .write()
                .entry(bean.id().clone())
                .or_insert(matching),
        )
    }

    fn compute(&self, key: &ResolutionKey) -> Resolution {
        let matched: Vec<Arc<BeanMetadata>> = self
            .registry
            .candidates_for(key.required_type())
            .into_iter()
            .filter(|bean| self.types.matches(key.required_type(), bean.types()))
            .filter(|bean| self.qualifiers.matches(key.qualifiers(), bean.qualifiers()))
            .collect();

        let candidates = self.exclude_specialized(matched);
        let outcome = ResolutionOutcome::classify(precedence::tie_break(candidates.clone()));

        match &outcome {
            ResolutionOutcome::Unique(bean) => {
                log::debug!("Resolved {} to bean {}", key, bean.id())
            }
            ResolutionOutcome::Ambiguous(beans) => {
                log::debug!("Resolution of {} is ambiguous: {} candidates", key, beans.len())
            }
            ResolutionOutcome::Unsatisfied => log::debug!("Resolution of {} is unsatisfied", key),
        }

        Resolution {
            key: key.clone(),
            candidates,
            outcome,
        }
    }

    fn exclude_specialized(&self, candidates: Vec<Arc<BeanMetadata>>) -> Vec<Arc<BeanMetadata>> {
        candidates
            .iter()
            .filter(|bean| {
                !candidates.iter().any(|other| {
                    other.id() != bean.id()
                        && self.registry.is_specialized_by(bean.id(), other.id())
                })
            })
            .cloned()
            .collect()
    }
}
