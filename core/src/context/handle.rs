use crate::beans::{downcast, BeanId, BeanMetadata, ConstructionStrategy, Instance, ScopeKind};
use crate::container::{Container, ContainerInner};
use crate::context::creation::CreationContext;
use crate::context::instance::{ContextualInstance, CreationalContext};
use crate::context::store::{self, ScopeStore};
use crate::errors::{error_codes, ContainerError, ContainerResult, DisposalFailure};
use crate::qualifiers::QualifierSet;
use crate::types::TypeDescriptor;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// **CONTEXT HANDLE**
///
/// **PURPOSE**: The scope stores visible to one execution (a request, a job, a test)
/// plus the construction chain of whatever that execution is currently building.
/// **GUARANTEE**: Application and singleton stores are shared through the container;
/// request, session and custom stores are bound here explicitly.
///
/// A handle belongs to one execution at a time. Share the [`Container`] across
/// threads and give each execution its own handle.
pub struct ContextHandle {
    id: u64,
    container: Arc<ContainerInner>,
    bound: RwLock<HashMap<ScopeKind, Arc<ScopeStore>>>,
    session_id: Mutex<Option<String>>,
    chain: Mutex<Vec<BeanId>>,
    dependents: Mutex<Vec<ContextualInstance>>,
}

// Pops the construction chain when a construction ends, however it ends.
struct ChainFrame<'a> {
    chain: &'a Mutex<Vec<BeanId>>,
}

impl Drop for ChainFrame<'_> {
    fn drop(&mut self) {
        self.chain.lock().pop();
    }
}

impl ContextHandle {
    pub(crate) fn new(container: Arc<ContainerInner>) -> Self {
        let id = store::next_owner();
        log::debug!("Creating ContextHandle {}", id);
        Self {
            id,
            container,
            bound: RwLock::new(HashMap::new()),
            session_id: Mutex::new(None),
            chain: Mutex::new(Vec::new()),
            dependents: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn container(&self) -> Container {
        Container::from_inner(Arc::clone(&self.container))
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_id.lock().clone()
    }

    // **SCOPE LIFECYCLE**

    /// Binds a fresh store for a request or custom scope.
    pub fn activate(&self, scope: ScopeKind) -> ContainerResult<()> {
        match &scope {
            ScopeKind::Dependent => {
                return Err(ContainerError::configuration(
                    error_codes::NOT_ACTIVATABLE,
                    "the dependent scope has no store to activate",
                ))
            }
            ScopeKind::Application | ScopeKind::Singleton => {
                return Err(ContainerError::ContextAlreadyActive {
                    scope: scope.to_string(),
                })
            }
            ScopeKind::Session => {
                return Err(ContainerError::configuration(
                    error_codes::NOT_ACTIVATABLE,
                    "sessions are activated with activate_session(id)",
                ))
            }
            ScopeKind::Custom(name) if !self.container.config.declares_scope(name) => {
                return Err(ContainerError::configuration(
                    error_codes::UNKNOWN_SCOPE,
                    format!("custom scope '{}' is not declared", name),
                ))
            }
            ScopeKind::Request | ScopeKind::Custom(_) => {}
        }

        let mut bound = self.bound.write();
        if bound.contains_key(&scope) {
            return Err(ContainerError::ContextAlreadyActive {
                scope: scope.to_string(),
            });
        }
        log::debug!("ContextHandle {}: Activating {} scope", self.id, scope);
        bound.insert(scope.clone(), Arc::new(ScopeStore::new(scope)));
        Ok(())
    }

    /// Binds the store of the given session, creating it on first use.
    pub fn activate_session(&self, session_id: &str) -> ContainerResult<()> {
        let mut bound = self.bound.write();
        if bound.contains_key(&ScopeKind::Session) {
            return Err(ContainerError::ContextAlreadyActive {
                scope: ScopeKind::Session.to_string(),
            });
        }
        let store = self.container.session_store(session_id)?;
        log::debug!("ContextHandle {}: Activating session {}", self.id, session_id);
        bound.insert(ScopeKind::Session, store);
        *self.session_id.lock() = Some(session_id.to_string());
        Ok(())
    }

    /// Unbinds a session store without destroying it.
    pub fn suspend(&self, scope: &ScopeKind) -> ContainerResult<()> {
        if scope != &ScopeKind::Session {
            return Err(ContainerError::configuration(
                error_codes::NOT_ACTIVATABLE,
                format!("only the session scope can be suspended, not {}", scope),
            ));
        }
        self.bound
            .write()
            .remove(scope)
            .ok_or_else(|| ContainerError::ContextNotActive {
                scope: scope.to_string(),
            })?;
        *self.session_id.lock() = None;
        Ok(())
    }

    /// Unbinds the scope's store and destroys every instance it holds.
    pub fn deactivate(&self, scope: &ScopeKind) -> ContainerResult<()> {
        if scope.is_container_owned() || scope == &ScopeKind::Dependent {
            return Err(ContainerError::configuration(
                error_codes::NOT_ACTIVATABLE,
                format!("the {} scope is not deactivated through a context handle", scope),
            ));
        }
        let store = self
            .bound
            .write()
            .remove(scope)
            .ok_or_else(|| ContainerError::ContextNotActive {
                scope: scope.to_string(),
            })?;
        if scope == &ScopeKind::Session {
            if let Some(session_id) = self.session_id.lock().take() {
                self.container.end_session(&session_id);
            }
        }
        log::debug!("ContextHandle {}: Deactivating {} scope", self.id, scope);
        store.destroy_all()
    }

    pub fn is_active(&self, scope: &ScopeKind) -> bool {
        match scope {
            ScopeKind::Dependent => true,
            ScopeKind::Application | ScopeKind::Singleton => self
                .container
                .shared_store(scope)
                .is_some_and(|store| store.is_active()),
            _ => self.bound.read().contains_key(scope),
        }
    }

    /// Store currently serving the scope for this handle.
    pub fn store(&self, scope: &ScopeKind) -> ContainerResult<Arc<ScopeStore>> {
        let not_active = || ContainerError::ContextNotActive {
            scope: scope.to_string(),
        };
        match scope {
            ScopeKind::Dependent => Err(not_active()),
            ScopeKind::Application | ScopeKind::Singleton => {
                self.container.shared_store(scope).ok_or_else(not_active)
            }
            _ => self.bound.read().get(scope).cloned().ok_or_else(not_active),
        }
    }

    // **RESOLUTION**

    pub fn resolve_unique(
        &self,
        required_type: &TypeDescriptor,
        qualifiers: &QualifierSet,
    ) -> ContainerResult<Arc<BeanMetadata>> {
        self.container.resolver.resolve_unique(required_type, qualifiers)
    }

    pub fn resolve_all(
        &self,
        required_type: &TypeDescriptor,
        qualifiers: &QualifierSet,
    ) -> ContainerResult<Vec<Arc<BeanMetadata>>> {
        self.container.resolver.resolve_all(required_type, qualifiers)
    }

    // **INSTANCES**

    /// Contextual instance of the bean. Dependent instances are owned by this handle
    /// until [`ContextHandle::destroy`] or [`ContextHandle::close`].
    pub fn get_or_create(&self, bean: &Arc<BeanMetadata>) -> ContainerResult<Instance> {
        self.get_or_create_in(bean, None)
    }

    pub fn get_or_create_as<T: Any + Send + Sync>(
        &self,
        bean: &Arc<BeanMetadata>,
    ) -> ContainerResult<Arc<T>> {
        downcast(bean.id().as_str(), self.get_or_create(bean)?)
    }

    /// Contextual reference: a client proxy for normal-scoped beans, the instance otherwise.
    pub fn reference(
        &self,
        required_type: &TypeDescriptor,
        qualifiers: &QualifierSet,
    ) -> ContainerResult<Instance> {
        let bean = self.resolve_unique(required_type, qualifiers)?;
        if bean.scope().is_normal() {
            return Ok(self.client_proxy(&bean));
        }
        self.get_or_create(&bean)
    }

    pub fn instance(
        &self,
        required_type: &TypeDescriptor,
        qualifiers: &QualifierSet,
    ) -> ContainerResult<Instance> {
        let bean = self.resolve_unique(required_type, qualifiers)?;
        self.get_or_create(&bean)
    }

    pub fn instance_as<T: Any + Send + Sync>(
        &self,
        required_type: &TypeDescriptor,
        qualifiers: &QualifierSet,
    ) -> ContainerResult<Arc<T>> {
        let bean = self.resolve_unique(required_type, qualifiers)?;
        self.get_or_create_as(&bean)
    }

    /// Instance of the unqualified bean of the given type, parsed from text.
    pub fn lookup<T: Any + Send + Sync>(&self, required_type: &str) -> ContainerResult<Arc<T>> {
        let required_type = TypeDescriptor::parse(required_type)?;
        self.instance_as(&required_type, &QualifierSet::new())
    }

    /// **DESTROY**
    ///
    /// Dependent instances are matched by identity among those this handle owns;
    /// other scopes destroy the store's instance when it is the one given.
    /// Returns `false` when nothing was destroyed: the dependent belongs to another
    /// handle or parent instance, or the store no longer holds that instance.
    pub fn destroy(&self, bean: &BeanMetadata, instance: &Instance) -> ContainerResult<bool> {
        if bean.scope() == &ScopeKind::Dependent {
            let owned = {
                let mut dependents = self.dependents.lock();
                dependents
                    .iter()
                    .position(|d| Arc::ptr_eq(d.instance(), instance))
                    .map(|position| dependents.remove(position))
            };
            return match owned {
                Some(entry) => into_result(entry.destroy()).map(|_| true),
                None => {
                    log::debug!(
                        "ContextHandle {}: {} instance is not owned here, not destroyed",
                        self.id,
                        bean.id()
                    );
                    Ok(false)
                }
            };
        }

        let store = self.store(bean.scope())?;
        match store.get(bean.id()) {
            Some(held) if Arc::ptr_eq(&held, instance) || is_proxy_of(instance, bean) => {
                store.destroy(bean.id())
            }
            _ => {
                log::debug!(
                    "ContextHandle {}: {} instance is no longer current, not destroyed",
                    self.id,
                    bean.id()
                );
                Ok(false)
            }
        }
    }

    /// Destroys the dependent instances this handle created directly.
    pub fn release_dependents(&self) -> ContainerResult<()> {
        let owned: Vec<ContextualInstance> = std::mem::take(&mut *self.dependents.lock());
        into_result(
            owned
                .into_iter()
                .rev()
                .flat_map(ContextualInstance::destroy)
                .collect(),
        )
    }

    /// **CLOSE**
    ///
    /// Ends the execution: releases dependents, deactivates request and custom
    /// scopes and suspends the session. Failures are collected across all of them.
    pub fn close(&self) -> ContainerResult<()> {
        let mut failures = Vec::new();
        let mut collect = |result: ContainerResult<()>| match result {
            Ok(()) => Ok(()),
            Err(ContainerError::Disposal { failures: more }) => {
                failures.extend(more);
                Ok(())
            }
            Err(other) => Err(other),
        };

        collect(self.release_dependents())?;
        let scopes: Vec<ScopeKind> = self.bound.read().keys().cloned().collect();
        for scope in scopes {
            if scope == ScopeKind::Session {
                self.suspend(&scope)?;
            } else {
                collect(self.deactivate(&scope))?;
            }
        }
        into_result(failures)
    }

    // **CONSTRUCTION**

    pub(crate) fn client_proxy(&self, bean: &Arc<BeanMetadata>) -> Instance {
        self.container.proxies.proxy_for(bean)
    }

    fn circular(&self, bean: &BeanId) -> ContainerError {
        let mut chain: Vec<String> = self.chain.lock().iter().map(ToString::to_string).collect();
        chain.push(bean.to_string());
        ContainerError::CircularConstruction { chain }
    }

    fn in_chain(&self, bean: &BeanId) -> bool {
        self.chain.lock().contains(bean)
    }

    fn enter(&self, bean: &BeanId) -> ContainerResult<ChainFrame<'_>> {
        let mut chain = self.chain.lock();
        if chain.contains(bean) {
            drop(chain);
            return Err(self.circular(bean));
        }
        chain.push(bean.clone());
        Ok(ChainFrame { chain: &self.chain })
    }

    /// Instance for `bean` within the current construction chain. Dependent
    /// instances go to `parent` when given, otherwise to this handle.
    pub(crate) fn get_or_create_in(
        &self,
        bean: &Arc<BeanMetadata>,
        parent: Option<&mut CreationalContext>,
    ) -> ContainerResult<Instance> {
        if self.in_chain(bean.id()) {
            return Err(self.circular(bean.id()));
        }

        if bean.scope() == &ScopeKind::Dependent {
            let entry = self.construct(bean)?;
            let instance = Arc::clone(entry.instance());
            match parent {
                Some(parent) => parent.add_dependent(entry),
                None => self.dependents.lock().push(entry),
            }
            return Ok(instance);
        }

        let store = self.store(bean.scope())?;
        store.get_or_create(bean, self.id, || self.construct(bean))
    }

    fn construct(&self, bean: &Arc<BeanMetadata>) -> ContainerResult<ContextualInstance> {
        let _frame = self.enter(bean.id())?;
        log::trace!("ContextHandle {}: Constructing {}", self.id, bean.id());

        let mut ctx = CreationContext::new(self, bean);
        let raw = match self.run_strategy(bean, &mut ctx) {
            Ok(raw) => raw,
            Err(err) => {
                ctx.discard();
                return Err(err);
            }
        };

        let decorators = self.container.resolver.resolve_decorators(bean);
        let mut instance = Arc::clone(&raw);
        for decorator in decorators.iter().rev() {
            match guarded(bean, || decorator.apply(instance.clone(), &mut ctx)) {
                Ok(decorated) => instance = decorated,
                Err(err) => {
                    ctx.discard();
                    return Err(err);
                }
            }
        }

        Ok(ContextualInstance::new(
            Arc::clone(bean),
            instance,
            raw,
            ctx.into_creational(),
        ))
    }

    fn run_strategy(
        &self,
        bean: &Arc<BeanMetadata>,
        ctx: &mut CreationContext<'_>,
    ) -> ContainerResult<Instance> {
        match bean.strategy() {
            ConstructionStrategy::Constructor(create) | ConstructionStrategy::Synthetic(create) => {
                guarded(bean, || create(ctx))
            }
            ConstructionStrategy::Producer {
                declaring_bean,
                produce,
            } => {
                let declaring = self
                    .container
                    .registry
                    .bean(declaring_bean.as_str())
                    .cloned()
                    .ok_or_else(|| {
                        ContainerError::construction(
                            bean.id().as_str(),
                            format!("declaring bean '{}' is not registered", declaring_bean),
                        )
                    })?;

                if declaring.scope() == &ScopeKind::Dependent {
                    let mut scratch = CreationalContext::new();
                    let owner = self.get_or_create_in(&declaring, Some(&mut scratch))?;
                    let produced = guarded(bean, || produce(&owner, ctx));
                    for failure in scratch.destroy() {
                        log::warn!("Disposal of declaring bean failed: {}", failure);
                    }
                    produced
                } else {
                    let owner = self.get_or_create_in(&declaring, None)?;
                    guarded(bean, || produce(&owner, ctx))
                }
            }
        }
    }
}

impl Drop for ContextHandle {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("ContextHandle {}: Closing on drop failed: {}", self.id, err);
        }
    }
}

impl std::fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextHandle")
            .field("id", &self.id)
            .field("bound", &self.bound.read().keys().collect::<Vec<_>>())
            .field("session_id", &*self.session_id.lock())
            .finish()
    }
}

// Factory panics become construction errors so the store slot and chain unwind cleanly.
fn guarded<F>(bean: &BeanMetadata, f: F) -> ContainerResult<Instance>
where
    F: FnOnce() -> ContainerResult<Instance>,
{
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        Err(ContainerError::construction(
            bean.id().as_str(),
            "factory panicked",
        ))
    })
}

fn is_proxy_of(instance: &Instance, bean: &BeanMetadata) -> bool {
    instance
        .downcast_ref::<crate::context::proxy::ClientProxy>()
        .is_some_and(|proxy| proxy.bean().id() == bean.id())
}

fn into_result(failures: Vec<DisposalFailure>) -> ContainerResult<()> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(ContainerError::Disposal { failures })
    }
}
