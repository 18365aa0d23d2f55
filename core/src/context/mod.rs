//! # CONTEXTUAL LIFECYCLE
//!
//! **SCOPE STORES, CONSTRUCTION CHAINS AND CLIENT PROXIES**
//!
//! A [`ContextHandle`] binds the stores one execution sees. Instances are built
//! on first use inside the store of their scope, torn down with the store, and
//! reached through client proxies when their scope is a normal one.

pub mod creation;
pub mod handle;
pub mod instance;
pub mod proxy;
pub mod store;

pub use creation::CreationContext;
pub use handle::ContextHandle;
pub use instance::{ContextualInstance, CreationalContext};
pub use proxy::{ClientProxy, ContextualLookup, DefaultProxyFactory, ProxyFactory};
pub(crate) use proxy::ProxyCache;
pub use store::ScopeStore;
