//! # CONTAINER
//!
//! **DEPLOYED REGISTRY, RESOLVER AND SHARED STORES**
//!
//! A [`Container`] is produced by [`Deployment::deploy`] and is cheap to clone.
//! Executions obtain a [`ContextHandle`] from it to activate their scopes and
//! look beans up.

pub mod deployment;
pub mod extension;
pub(crate) mod validator;

pub use deployment::Deployment;
pub use extension::Extension;

use crate::beans::{BeanMetadata, Instance, ScopeKind};
use crate::config::ContainerConfig;
use crate::context::{ContextHandle, ProxyCache, ProxyFactory, ScopeStore};
use crate::errors::{ContainerError, ContainerResult, DisposalFailure};
use crate::qualifiers::QualifierSet;
use crate::registry::BeanRegistry;
use crate::resolution::{CacheStats, Resolution, ResolutionKey, TypeSafeResolver};
use crate::types::TypeDescriptor;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct ContainerInner {
    pub(crate) config: ContainerConfig,
    pub(crate) registry: Arc<BeanRegistry>,
    pub(crate) resolver: TypeSafeResolver,
    pub(crate) proxies: ProxyCache,
    application: Arc<ScopeStore>,
    singleton: Arc<ScopeStore>,
    sessions: Mutex<HashMap<String, Arc<ScopeStore>>>,
}

impl ContainerInner {
    pub(crate) fn shared_store(&self, scope: &ScopeKind) -> Option<Arc<ScopeStore>> {
        match scope {
            ScopeKind::Application => Some(Arc::clone(&self.application)),
            ScopeKind::Singleton => Some(Arc::clone(&self.singleton)),
            _ => None,
        }
    }

    pub(crate) fn session_store(&self, session_id: &str) -> ContainerResult<Arc<ScopeStore>> {
        if !self.application.is_active() {
            return Err(ContainerError::ContextNotActive {
                scope: ScopeKind::Session.to_string(),
            });
        }
        let mut sessions = self.sessions.lock();
        Ok(Arc::clone(
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(ScopeStore::new(ScopeKind::Session))),
        ))
    }

    pub(crate) fn end_session(&self, session_id: &str) {
        self.sessions.lock().remove(session_id);
    }
}

#[derive(Debug, Serialize)]
struct BeanSummary {
    id: String,
    bean_class: String,
    types: Vec<String>,
    qualifiers: String,
    scope: String,
    name: Option<String>,
    alternative: bool,
    priority: Option<i32>,
    specializes: Option<String>,
    active: bool,
}

#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    pub(crate) fn new(
        registry: BeanRegistry,
        config: ContainerConfig,
        proxy_factory: Arc<dyn ProxyFactory>,
    ) -> Self {
        let registry = Arc::new(registry);
        let resolver = TypeSafeResolver::new(Arc::clone(&registry), config.relaxed_raw_types);
        Self {
            inner: Arc::new(ContainerInner {
                config,
                registry,
                resolver,
                proxies: ProxyCache::new(proxy_factory),
                application: Arc::new(ScopeStore::new(ScopeKind::Application)),
                singleton: Arc::new(ScopeStore::new(ScopeKind::Singleton)),
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<ContainerInner>) -> Self {
        Self { inner }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &BeanRegistry {
        &self.inner.registry
    }

    pub fn resolver(&self) -> &TypeSafeResolver {
        &self.inner.resolver
    }

    /// Handle for a new execution; only the container-owned scopes are active on it.
    pub fn new_context(&self) -> ContextHandle {
        ContextHandle::new(Arc::clone(&self.inner))
    }

    pub fn bean(&self, id: &str) -> Option<Arc<BeanMetadata>> {
        self.inner.registry.bean(id).cloned()
    }

    pub fn resolve(&self, key: &ResolutionKey) -> ContainerResult<Arc<Resolution>> {
        self.inner.resolver.resolve(key)
    }

    pub fn resolve_unique(
        &self,
        required_type: &TypeDescriptor,
        qualifiers: &QualifierSet,
    ) -> ContainerResult<Arc<BeanMetadata>> {
        self.inner.resolver.resolve_unique(required_type, qualifiers)
    }

    pub fn resolve_all(
        &self,
        required_type: &TypeDescriptor,
        qualifiers: &QualifierSet,
    ) -> ContainerResult<Vec<Arc<BeanMetadata>>> {
        self.inner.resolver.resolve_all(required_type, qualifiers)
    }

    pub fn resolve_by_name(&self, name: &str) -> ContainerResult<Arc<BeanMetadata>> {
        self.inner.resolver.resolve_by_name(name)
    }

    /// The cached client proxy of a normal-scoped bean.
    pub fn client_proxy(&self, bean: &Arc<BeanMetadata>) -> Instance {
        self.inner.proxies.proxy_for(bean)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.resolver.cache_stats()
    }

    pub fn active_sessions(&self) -> usize {
        self.inner.sessions.lock().len()
    }

    /// Ends one session from outside any handle, destroying its store.
    pub fn invalidate_session(&self, session_id: &str) -> ContainerResult<()> {
        let store = self.inner.sessions.lock().remove(session_id);
        match store {
            Some(store) => store.destroy_all(),
            None => Ok(()),
        }
    }

    /// **SHUTDOWN**
    ///
    /// Destroys every session, then the application store, then the singleton
    /// store. Failures are collected across all of them.
    pub fn shutdown(&self) -> ContainerResult<()> {
        log::info!("Shutting down container");
        let sessions: Vec<Arc<ScopeStore>> = self
            .inner
            .sessions
            .lock()
            .drain()
            .map(|(_, store)| store)
            .collect();

        let mut failures: Vec<DisposalFailure> = Vec::new();
        let stores = sessions
            .iter()
            .chain([&self.inner.application, &self.inner.singleton]);
        for store in stores {
            match store.destroy_all() {
                Ok(()) => {}
                Err(ContainerError::Disposal { failures: more }) => failures.extend(more),
                Err(other) => return Err(other),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ContainerError::Disposal { failures })
        }
    }

    /// **DESCRIBE**
    ///
    /// JSON summary of the deployed beans and resolution cache, for diagnostics.
    pub fn describe(&self) -> serde_json::Value {
        let registry = &self.inner.registry;
        let beans: Vec<BeanSummary> = registry
            .beans()
            .map(|bean| BeanSummary {
                id: bean.id().to_string(),
                bean_class: bean.bean_class().to_string(),
                types: bean.types().iter().map(ToString::to_string).collect(),
                qualifiers: bean.qualifiers().to_string(),
                scope: bean.scope().to_string(),
                name: bean.name().map(str::to_string),
                alternative: bean.is_alternative(),
                priority: bean.priority(),
                specializes: bean.specializes().map(ToString::to_string),
                active: registry.is_active(bean.id().as_str()),
            })
            .collect();

        serde_json::json!({
            "beans": beans,
            "decorators": registry
                .decorators()
                .iter()
                .map(|d| d.id().to_string())
                .collect::<Vec<_>>(),
            "cache": self.cache_stats(),
            "client_proxies": self.inner.proxies.len(),
            "sessions": self.active_sessions(),
        })
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("beans", &self.inner.registry.len())
            .field("cache", &self.cache_stats())
            .finish()
    }
}
