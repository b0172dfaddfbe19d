//! Singleton cache.
//!
//! Holds the values built by singleton registrations, keyed by the id the
//! caller *requested* (which may differ from the registration that built
//! it when overrides are involved). The cache only grows while the
//! container is active and is emptied as a whole on shutdown.

use std::collections::HashMap;

use tracing::trace;

use crate::key::ServiceId;
use crate::registry::BoxedService;

/// Requested id → already built value.
#[derive(Default)]
pub(crate) struct SingletonCache {
    storage: HashMap<ServiceId, BoxedService>,
}

impl SingletonCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ServiceId) -> Option<&BoxedService> {
        self.storage.get(id)
    }

    pub fn insert(&mut self, id: ServiceId, value: BoxedService) {
        trace!(key = %id, "Caching singleton");
        self.storage.insert(id, value);
    }

    /// Drops every cached value.
    pub fn clear(&mut self) {
        trace!(cached = self.storage.len(), "Clearing singleton cache");
        self.storage.clear();
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }
}

impl std::fmt::Debug for SingletonCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.storage.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn stores_by_id() {
        let mut cache = SingletonCache::new();
        cache.insert(ServiceId::of::<u32>(), Box::new(7u32));

        let hit = cache.get(&ServiceId::of::<u32>()).unwrap();
        assert_eq!(hit.downcast_ref::<u32>(), Some(&7));
        assert!(cache.get(&ServiceId::of::<u64>()).is_none());
    }

    #[test]
    fn insert_replaces() {
        let mut cache = SingletonCache::new();
        cache.insert(ServiceId::of::<u32>(), Box::new(1u32));
        cache.insert(ServiceId::of::<u32>(), Box::new(2u32));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&ServiceId::of::<u32>()).unwrap().downcast_ref::<u32>(), Some(&2));
    }

    #[test]
    fn clear_drops_values() {
        let shared = Arc::new(());
        let mut cache = SingletonCache::new();
        cache.insert(ServiceId::of::<Arc<()>>(), Box::new(shared.clone()));
        assert_eq!(Arc::strong_count(&shared), 2);

        cache.clear();
        assert_eq!(cache.len(), 0);
        assert_eq!(Arc::strong_count(&shared), 1);

        // clearing twice is harmless
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
