use crate::beans::{BeanId, BeanMetadata, Instance, ScopeKind};
use crate::context::instance::ContextualInstance;
use crate::errors::{ContainerError, ContainerResult, DisposalFailure};
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static STORE_IDS: AtomicU64 = AtomicU64::new(1);
static OWNER_IDS: AtomicU64 = AtomicU64::new(1);

/// Blocked owner -> (owner it waits for, bean it waits on), across every store.
static WAITING: Lazy<Mutex<HashMap<u64, (u64, BeanId)>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Identifier for a construction owner; unique across the process.
pub(crate) fn next_owner() -> u64 {
    OWNER_IDS.fetch_add(1, Ordering::Relaxed)
}

// Records that `waiter` blocks on `holder`'s construction of `bean`, unless the
// holder already waits on the waiter, directly or through other owners. In that
// case nobody could ever finish, and the bean chain of the cycle is returned.
fn register_wait(waiter: u64, holder: u64, bean: &BeanId) -> Result<(), Vec<String>> {
    let mut waiting = WAITING.lock();
    let mut chain = vec![bean.to_string()];
    let mut current = holder;
    while let Some((next, awaited)) = waiting.get(&current) {
        chain.push(awaited.to_string());
        if *next == waiter {
            chain.push(bean.to_string());
            return Err(chain);
        }
        current = *next;
    }
    waiting.insert(waiter, (holder, bean.clone()));
    Ok(())
}

fn clear_wait(waiter: u64) {
    WAITING.lock().remove(&waiter);
}

enum Slot {
    /// A construction chain owned by the handle `owner` is building the instance.
    Constructing { owner: u64 },
    Ready { seq: u64, entry: ContextualInstance },
}

struct StoreState {
    slots: HashMap<BeanId, Slot>,
    next_seq: u64,
    active: bool,
}

/// **SCOPE STORE**
///
/// **PURPOSE**: Instances of one scope occurrence, at most one per bean.
/// **GUARANTEE**: Concurrent callers asking for a bean under construction wait for
/// it instead of building a second one. Destruction runs newest first and every
/// instance is destroyed exactly once.
pub struct ScopeStore {
    id: u64,
    scope: ScopeKind,
    state: Mutex<StoreState>,
    constructed: Condvar,
}

impl ScopeStore {
    pub fn new(scope: ScopeKind) -> Self {
        let id = STORE_IDS.fetch_add(1, Ordering::Relaxed);
        log::debug!("Creating {} store {}", scope, id);
        Self {
            id,
            scope,
            state: Mutex::new(StoreState {
                slots: HashMap::new(),
                next_seq: 0,
                active: true,
            }),
            constructed: Condvar::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn scope(&self) -> &ScopeKind {
        &self.scope
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Number of ready instances.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, bean: &BeanId) -> Option<Instance> {
        match self.state.lock().slots.get(bean) {
            Some(Slot::Ready { entry, .. }) => Some(Arc::clone(entry.instance())),
            _ => None,
        }
    }

    fn not_active(&self) -> ContainerError {
        ContainerError::ContextNotActive {
            scope: self.scope.to_string(),
        }
    }

    /// **GET OR CREATE**
    ///
    /// Returns the held instance, waits while another owner constructs it, or
    /// claims the slot and runs `create`. A failed construction leaves the slot empty.
    ///
    /// Waiting on an owner that is itself blocked on the caller, in this store or
    /// any other, fails with `CircularConstruction` instead of blocking.
    pub fn get_or_create<F>(
        &self,
        bean: &BeanMetadata,
        owner: u64,
        create: F,
    ) -> ContainerResult<Instance>
    where
        F: FnOnce() -> ContainerResult<ContextualInstance>,
    {
        let seq = {
            let mut state = self.state.lock();
            loop {
                if !state.active {
                    return Err(self.not_active());
                }
                match state.slots.get(bean.id()) {
                    Some(Slot::Ready { entry, .. }) => return Ok(Arc::clone(entry.instance())),
                    Some(Slot::Constructing { owner: holder }) if *holder == owner => {
                        return Err(ContainerError::CircularConstruction {
                            chain: vec![bean.id().to_string(), bean.id().to_string()],
                        });
                    }
                    Some(Slot::Constructing { owner: holder }) => {
                        let holder = *holder;
                        if let Err(chain) = register_wait(owner, holder, bean.id()) {
                            log::debug!(
                                "Owner {} would deadlock waiting on owner {} for {}",
                                owner,
                                holder,
                                bean.id()
                            );
                            return Err(ContainerError::CircularConstruction { chain });
                        }
                        self.constructed.wait(&mut state);
                        clear_wait(owner);
                    }
                    None => break,
                }
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state
                .slots
                .insert(bean.id().clone(), Slot::Constructing { owner });
            seq
        };

        let created = create();

        let mut discarded = None;
        let result = {
            let mut state = self.state.lock();
            state.slots.remove(bean.id());
            match created {
                Ok(entry) if state.active => {
                    let instance = Arc::clone(entry.instance());
                    state
                        .slots
                        .insert(bean.id().clone(), Slot::Ready { seq, entry });
                    Ok(instance)
                }
                Ok(entry) => {
                    discarded = Some(entry);
                    Err(self.not_active())
                }
                Err(err) => Err(err),
            }
        };
        self.constructed.notify_all();

        if let Some(entry) = discarded {
            for failure in entry.destroy() {
                log::warn!("Discarding instance for inactive {} store: {}", self.scope, failure);
            }
        }
        result
    }

    /// Destroys one bean's instance. `Ok(false)` when the store holds none.
    pub fn destroy(&self, bean: &BeanId) -> ContainerResult<bool> {
        let entry = {
            let mut state = self.state.lock();
            match state.slots.get(bean) {
                Some(Slot::Ready { .. }) => match state.slots.remove(bean) {
                    Some(Slot::Ready { entry, .. }) => Some(entry),
                    _ => None,
                },
                _ => None,
            }
        };

        match entry {
            Some(entry) => {
                let failures = entry.destroy();
                if failures.is_empty() {
                    Ok(true)
                } else {
                    Err(ContainerError::Disposal { failures })
                }
            }
            None => Ok(false),
        }
    }

    /// **DESTROY ALL**
    ///
    /// Deactivates the store and destroys every held instance, newest first.
    /// Continues past failures and reports them together.
    pub fn destroy_all(&self) -> ContainerResult<()> {
        let mut entries: Vec<(u64, ContextualInstance)> = {
            let mut state = self.state.lock();
            state.active = false;
            let ready: Vec<BeanId> = state
                .slots
                .iter()
                .filter(|(_, slot)| matches!(slot, Slot::Ready { .. }))
                .map(|(id, _)| id.clone())
                .collect();
            ready
                .into_iter()
                .filter_map(|id| match state.slots.remove(&id) {
                    Some(Slot::Ready { seq, entry }) => Some((seq, entry)),
                    _ => None,
                })
                .collect()
        };
        self.constructed.notify_all();

        entries.sort_by(|a, b| b.0.cmp(&a.0));
        log::debug!(
            "Destroying {} store {} with {} instance(s)",
            self.scope,
            self.id,
            entries.len()
        );

        let failures: Vec<DisposalFailure> = entries
            .into_iter()
            .flat_map(|(_, entry)| entry.destroy())
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ContainerError::Disposal { failures })
        }
    }
}

impl std::fmt::Debug for ScopeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeStore")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("instances", &self.len())
            .finish()
    }
}
