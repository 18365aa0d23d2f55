use crate::beans::{downcast, BeanId, BeanMetadata, Instance};
use crate::context::handle::ContextHandle;
use crate::errors::ContainerResult;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What a client proxy forwards to: the current instance of one normal-scoped bean
/// in whatever store the caller's handle has active.
#[derive(Clone)]
pub struct ContextualLookup {
    bean: Arc<BeanMetadata>,
}

impl ContextualLookup {
    pub fn new(bean: Arc<BeanMetadata>) -> Self {
        Self { bean }
    }

    pub fn bean(&self) -> &Arc<BeanMetadata> {
        &self.bean
    }

    pub fn get(&self, handle: &ContextHandle) -> ContainerResult<Instance> {
        handle.get_or_create_in(&self.bean, None)
    }
}

/// **PROXY FACTORY**
///
/// Builds the client proxy object injected in place of a normal-scoped bean.
/// Implementations wrap the lookup in whatever handle type their callers expect.
pub trait ProxyFactory: Send + Sync {
    fn make_client_proxy(&self, lookup: ContextualLookup) -> Instance;
}

/// **CLIENT PROXY**
///
/// Resolves its bean afresh on every access, so it never pins an instance of a
/// store that may since have been destroyed.
#[derive(Clone)]
pub struct ClientProxy {
    lookup: ContextualLookup,
}

impl ClientProxy {
    pub fn new(lookup: ContextualLookup) -> Self {
        Self { lookup }
    }

    pub fn bean(&self) -> &Arc<BeanMetadata> {
        self.lookup.bean()
    }

    pub fn get(&self, handle: &ContextHandle) -> ContainerResult<Instance> {
        self.lookup.get(handle)
    }

    pub fn get_as<T: Any + Send + Sync>(&self, handle: &ContextHandle) -> ContainerResult<Arc<T>> {
        downcast(self.bean().id().as_str(), self.get(handle)?)
    }

    pub fn with<T, R, F>(&self, handle: &ContextHandle, f: F) -> ContainerResult<R>
    where
        T: Any + Send + Sync,
        F: FnOnce(&T) -> R,
    {
        let target = self.get_as::<T>(handle)?;
        Ok(f(target.as_ref()))
    }
}

impl fmt::Debug for ClientProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientProxy")
            .field("bean", self.bean().id())
            .finish()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProxyFactory;

impl ProxyFactory for DefaultProxyFactory {
    fn make_client_proxy(&self, lookup: ContextualLookup) -> Instance {
        Arc::new(ClientProxy::new(lookup))
    }
}

/// One proxy per bean for the life of the container.
pub(crate) struct ProxyCache {
    factory: Arc<dyn ProxyFactory>,
    proxies: RwLock<HashMap<BeanId, Instance>>,
}

impl ProxyCache {
    pub(crate) fn new(factory: Arc<dyn ProxyFactory>) -> Self {
        Self {
            factory,
            proxies: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn proxy_for(&self, bean: &Arc<BeanMetadata>) -> Instance {
        if let Some(proxy) = self.proxies.read().get(bean.id()) {
            return Arc::clone(proxy);
        }
        let mut proxies = self.proxies.write();
        Arc::clone(proxies.entry(bean.id().clone()).or_insert_with(|| {
            log::debug!("Creating client proxy for bean {}", bean.id());
            self.factory
                .make_client_proxy(ContextualLookup::new(Arc::clone(bean)))
        }))
    }

    pub(crate) fn len(&self) -> usize {
        self.proxies.read().len()
    }
}
