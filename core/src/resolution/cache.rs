use crate::resolution::key::{Resolution, ResolutionKey};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// **RESOLUTION CACHE**
///
/// **PURPOSE**: One computed resolution per key, never invalidated.
/// **GUARANTEE**: Concurrent callers racing on the same missing key may both compute,
/// but only the first stored entry is ever handed out.
#[derive(Default)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<ResolutionKey, Arc<Resolution>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute<F>(&self, key: &ResolutionKey, compute: F) -> Arc<Resolution>
    where
        F: FnOnce(&ResolutionKey) -> Resolution,
    {
        if let Some(found) = self.entries.read().get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::trace!("Resolution cache hit for {}", key);
            return Arc::clone(found);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = Arc::new(compute(key));
        let mut entries = self.entries.write();
        Arc::clone(entries.entry(key.clone()).or_insert(computed))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
