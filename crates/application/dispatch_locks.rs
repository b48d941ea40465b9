use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Keyed async locks so that dispatches of the same mailing run one at a time within a
/// process. Entries are dropped once nobody holds or waits for them.
#[derive(Debug, Default, Clone)]
pub struct DispatchLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl DispatchLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, mailing_id: Uuid) -> DispatchGuard {
        let lock = Arc::clone(self.locks.entry(mailing_id).or_default().value());
        let guard = lock.lock_owned().await;

        DispatchGuard {
            mailing_id,
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    pub fn held(&self) -> usize {
        self.locks.len()
    }
}

pub struct DispatchGuard {
    mailing_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map itself still references the mutex: no holder, no waiter.
        self.locks
            .remove_if(&self.mailing_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn second_acquire_of_same_mailing_waits() {
        let locks = DispatchLocks::new();
        let mailing_id = Uuid::new_v4();

        let first = locks.acquire(mailing_id).await;
        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.acquire(mailing_id)).await;
        assert!(blocked.is_err());

        drop(first);
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(mailing_id)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn different_mailings_do_not_contend() {
        let locks = DispatchLocks::new();

        let _first = locks.acquire(Uuid::new_v4()).await;
        let other =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(Uuid::new_v4())).await;

        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn released_locks_are_removed() {
        let locks = DispatchLocks::new();

        let guard = locks.acquire(Uuid::new_v4()).await;
        assert_eq!(locks.held(), 1);

        drop(guard);
        assert_eq!(locks.held(), 0);
    }
}
