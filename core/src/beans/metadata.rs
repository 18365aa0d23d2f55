use crate::beans::injection::InjectionPoint;
use crate::beans::scope::ScopeKind;
use crate::context::CreationContext;
use crate::errors::{error_codes, ContainerError, ContainerResult};
use crate::qualifiers::{Qualifier, QualifierSet};
use crate::types::TypeDescriptor;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Type-erased bean instance shared between stores, proxies and callers.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Builds an instance; dependencies are looked up through the creation context.
pub type CreateFn =
    Arc<dyn Fn(&mut CreationContext<'_>) -> ContainerResult<Instance> + Send + Sync>;

/// Produces an instance from the declaring bean's instance.
pub type ProduceFn =
    Arc<dyn Fn(&Instance, &mut CreationContext<'_>) -> ContainerResult<Instance> + Send + Sync>;

/// Releases an instance; an `Err` is recorded as a disposal failure.
pub type DisposeFn = Arc<dyn Fn(&Instance) -> Result<(), String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeanId(String);

impl BeanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BeanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for BeanId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BeanId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Clone)]
pub enum ConstructionStrategy {
    Constructor(CreateFn),
    Producer {
        declaring_bean: BeanId,
        produce: ProduceFn,
    },
    Synthetic(CreateFn),
}

impl fmt::Debug for ConstructionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructionStrategy::Constructor(_) => f.write_str("Constructor"),
            ConstructionStrategy::Producer { declaring_bean, .. } => f
                .debug_struct("Producer")
                .field("declaring_bean", declaring_bean)
                .finish_non_exhaustive(),
            ConstructionStrategy::Synthetic(_) => f.write_str("Synthetic"),
        }
    }
}

/// Type given either as a descriptor or as text parsed at `build()`.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    Descriptor(TypeDescriptor),
    Text(String),
}

impl TypeSpec {
    pub fn resolve(self) -> ContainerResult<TypeDescriptor> {
        match self {
            TypeSpec::Descriptor(descriptor) => Ok(descriptor),
            TypeSpec::Text(text) => TypeDescriptor::parse(&text),
        }
    }
}

impl From<TypeDescriptor> for TypeSpec {
    fn from(descriptor: TypeDescriptor) -> Self {
        TypeSpec::Descriptor(descriptor)
    }
}

impl From<&str> for TypeSpec {
    fn from(text: &str) -> Self {
        TypeSpec::Text(text.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(text: String) -> Self {
        TypeSpec::Text(text)
    }
}

/// **BEAN METADATA**
///
/// **PURPOSE**: Immutable record describing one bean.
/// **GUARANTEE**: Qualifiers are normalized (`Default` when unqualified, always `Any`)
/// and the type closure always ends with `Object`. Never mutated once registered.
#[derive(Clone)]
pub struct BeanMetadata {
    id: BeanId,
    bean_class: TypeDescriptor,
    types: Vec<TypeDescriptor>,
    qualifiers: QualifierSet,
    scope: ScopeKind,
    alternative: bool,
    priority: Option<i32>,
    specializes: Option<BeanId>,
    name: Option<String>,
    injection_points: Vec<InjectionPoint>,
    strategy: ConstructionStrategy,
    disposer: Option<DisposeFn>,
    derive_types: bool,
}

impl BeanMetadata {
    pub fn builder(id: impl Into<String>) -> BeanBuilder {
        BeanBuilder::new(id)
    }

    pub fn id(&self) -> &BeanId {
        &self.id
    }

    pub fn bean_class(&self) -> &TypeDescriptor {
        &self.bean_class
    }

    /// Type closure in declaration order, `Object` last.
    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    pub fn qualifiers(&self) -> &QualifierSet {
        &self.qualifiers
    }

    pub fn scope(&self) -> &ScopeKind {
        &self.scope
    }

    pub fn is_alternative(&self) -> bool {
        self.alternative
    }

    pub fn priority(&self) -> Option<i32> {
        self.priority
    }

    pub fn specializes(&self) -> Option<&BeanId> {
        self.specializes.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn injection_points(&self) -> &[InjectionPoint] {
        &self.injection_points
    }

    pub fn strategy(&self) -> &ConstructionStrategy {
        &self.strategy
    }

    pub fn disposer(&self) -> Option<&DisposeFn> {
        self.disposer.as_ref()
    }

    /// Whether the registry should extend the closure from the type hierarchy.
    pub fn derives_types(&self) -> bool {
        self.derive_types
    }

    pub(crate) fn with_types(mut self, types: Vec<TypeDescriptor>) -> Self {
        self.types = close_types(types);
        self.derive_types = false;
        self
    }
}

impl fmt::Debug for BeanMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanMetadata")
            .field("id", &self.id)
            .field("bean_class", &self.bean_class)
            .field("types", &self.types)
            .field("qualifiers", &self.qualifiers)
            .field("scope", &self.scope)
            .field("alternative", &self.alternative)
            .field("priority", &self.priority)
            .field("specializes", &self.specializes)
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .field("disposer", &self.disposer.is_some())
            .finish()
    }
}

impl fmt::Display for BeanMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ({})", self.id, self.bean_class, self.scope)
    }
}

// Normalized, deduplicated, in order, `Object` moved to the end.
fn close_types(types: Vec<TypeDescriptor>) -> Vec<TypeDescriptor> {
    let mut closed: Vec<TypeDescriptor> = Vec::with_capacity(types.len() + 1);
    for ty in types.into_iter().map(|t| t.normalized()) {
        if !ty.is_object() && !closed.contains(&ty) {
            closed.push(ty);
        }
    }
    closed.push(TypeDescriptor::object());
    closed
}

pub struct BeanBuilder {
    id: String,
    bean_class: Option<TypeSpec>,
    types: Vec<TypeSpec>,
    qualifiers: Vec<Qualifier>,
    scope: Option<ScopeKind>,
    alternative: bool,
    priority: Option<i32>,
    specializes: Option<BeanId>,
    name: Option<String>,
    injection_points: Vec<InjectionPoint>,
    strategy: Option<ConstructionStrategy>,
    shared_value: bool,
    disposer: Option<DisposeFn>,
    derive_types: bool,
}

impl BeanBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bean_class: None,
            types: Vec::new(),
            qualifiers: Vec::new(),
            scope: None,
            alternative: false,
            priority: None,
            specializes: None,
            name: None,
            injection_points: Vec::new(),
            strategy: None,
            shared_value: false,
            disposer: None,
            derive_types: false,
        }
    }

    /// Implementation class; always part of the type closure.
    pub fn bean_class(mut self, ty: impl Into<TypeSpec>) -> Self {
        self.bean_class = Some(ty.into());
        self
    }

    /// Additional bean type.
    pub fn typed(mut self, ty: impl Into<TypeSpec>) -> Self {
        self.types.push(ty.into());
        self
    }

    /// Extend the closure with the bean class's declared supertypes at registration.
    pub fn derive_types(mut self) -> Self {
        self.derive_types = true;
        self
    }

    pub fn qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// Bean name; also adds the matching `Named` qualifier.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Defaults to `Dependent`, or `Singleton` for `value()` beans.
    pub fn scope(mut self, scope: ScopeKind) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn alternative(mut self) -> Self {
        self.alternative = true;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn specializes(mut self, bean: impl Into<String>) -> Self {
        self.specializes = Some(BeanId::new(bean));
        self
    }

    pub fn injects(mut self, point: InjectionPoint) -> Self {
        self.injection_points.push(point);
        self
    }

    pub fn constructor<F>(mut self, create: F) -> Self
    where
        F: Fn(&mut CreationContext<'_>) -> ContainerResult<Instance> + Send + Sync + 'static,
    {
        self.strategy = Some(ConstructionStrategy::Constructor(Arc::new(create)));
        self.shared_value = false;
        self
    }

    pub fn producer<F>(mut self, declaring_bean: impl Into<String>, produce: F) -> Self
    where
        F: Fn(&Instance, &mut CreationContext<'_>) -> ContainerResult<Instance>
            + Send
            + Sync
            + 'static,
    {
        self.strategy = Some(ConstructionStrategy::Producer {
            declaring_bean: BeanId::new(declaring_bean),
            produce: Arc::new(produce),
        });
        self.shared_value = false;
        self
    }

    pub fn synthetic<F>(mut self, create: F) -> Self
    where
        F: Fn(&mut CreationContext<'_>) -> ContainerResult<Instance> + Send + Sync + 'static,
    {
        self.strategy = Some(ConstructionStrategy::Synthetic(Arc::new(create)));
        self.shared_value = false;
        self
    }

    /// Synthetic bean always handing out the same prebuilt value. The value is
    /// shared, so the bean cannot be `Dependent`; without an explicit scope it is
    /// a `Singleton`.
    pub fn value<T: Any + Send + Sync>(self, value: T) -> Self {
        let instance: Instance = Arc::new(value);
        let mut builder = self.synthetic(move |_| Ok(instance.clone()));
        builder.shared_value = true;
        builder
    }

    pub fn disposer<F>(mut self, dispose: F) -> Self
    where
        F: Fn(&Instance) -> Result<(), String> + Send + Sync + 'static,
    {
        self.disposer = Some(Arc::new(dispose));
        self
    }

    pub fn build(self) -> ContainerResult<BeanMetadata> {
        if self.id.trim().is_empty() {
            return Err(ContainerError::definition(
                error_codes::EMPTY_BEAN_ID,
                "bean identifier must not be empty",
            ));
        }
        let id = BeanId::new(self.id);

        let strategy = self.strategy.ok_or_else(|| {
            ContainerError::definition(
                error_codes::MISSING_CONSTRUCTION,
                format!("bean '{}' declares no construction strategy", id),
            )
        })?;

        let bean_class = match self.bean_class {
            Some(spec) => spec.resolve()?,
            None => TypeDescriptor::class(id.as_str()),
        }
        .normalized();

        let mut types = vec![bean_class.clone()];
        for spec in self.types {
            types.push(spec.resolve()?);
        }
        for ty in &types {
            if !ty.is_legal_top_level() || matches!(ty, TypeDescriptor::Variable { .. }) {
                return Err(ContainerError::definition(
                    error_codes::INVALID_TYPE,
                    format!("bean '{}' declares illegal bean type {}", id, ty),
                ));
            }
        }

        let mut qualifiers: QualifierSet = self.qualifiers.into_iter().collect();
        let name = match (self.name, qualifiers.name().map(str::to_string)) {
            (Some(explicit), _) => {
                qualifiers.insert(Qualifier::named(explicit.clone()));
                Some(explicit)
            }
            (None, from_qualifier) => from_qualifier,
        };

        let scope = match self.scope {
            Some(ScopeKind::Dependent) if self.shared_value => {
                return Err(ContainerError::definition(
                    error_codes::DEPENDENT_VALUE,
                    format!("bean '{}' shares one value but is declared dependent", id),
                ))
            }
            Some(scope) => scope,
            None if self.shared_value => ScopeKind::Singleton,
            None => ScopeKind::Dependent,
        };

        if self.specializes.as_ref() == Some(&id) {
            return Err(ContainerError::definition(
                error_codes::SPECIALIZATION_CYCLE,
                format!("bean '{}' specializes itself", id),
            ));
        }

        Ok(BeanMetadata {
            id,
            bean_class,
            types: close_types(types),
            qualifiers: qualifiers.normalized_for_bean(),
            scope,
            alternative: self.alternative,
            priority: self.priority,
            specializes: self.specializes,
            name,
            injection_points: self.injection_points,
            strategy,
            disposer: self.disposer,
            derive_types: self.derive_types,
        })
    }
}

/// Downcasts an instance to its concrete type.
pub fn downcast<T: Any + Send + Sync>(bean: &str, instance: Instance) -> ContainerResult<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| ContainerError::InstanceType {
            bean: bean.to_string(),
            expected: std::any::type_name::<T>(),
        })
}
