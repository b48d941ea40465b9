use dashmap::DashMap;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct CachedEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Upper bound for a configured TTL.
const MAX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// TTL cache of detail views keyed by entity id. Mutations made through this process
/// invalidate only the id they touched; changes made by the worker or `mailingctl` show up
/// once the entry expires.
#[derive(Debug, Clone)]
pub struct DetailCache<V> {
    entries: Arc<DashMap<Uuid, CachedEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> DetailCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl: ttl.min(MAX_TTL),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<V> {
        if let Some(cached) = self.entries.get(&id) {
            if cached.expires_at > Instant::now() {
                return Some(cached.value.clone());
            }
        }

        self.entries
            .remove_if(&id, |_, cached| cached.expires_at <= Instant::now());
        None
    }

    /// Also sweeps expired entries, so ids read once do not pile up.
    pub fn insert(&self, id: Uuid, value: V) {
        let now = Instant::now();
        let Some(expires_at) = now.checked_add(self.ttl).filter(|_| !self.ttl.is_zero()) else {
            return;
        };

        self.entries.retain(|_, cached| cached.expires_at > now);
        self.entries.insert(id, CachedEntry { value, expires_at });
    }

    pub fn invalidate(&self, id: Uuid) {
        self.entries.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
