use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = Arc<Mutex<HashMap<String, Slot>>>;

static GLOBAL: LazyLock<KeyedMutex> = LazyLock::new(KeyedMutex::default);

/// Named locks: holders of the same key exclude each other, different keys
/// proceed concurrently.
#[derive(Debug, Default, Clone)]
pub struct KeyedMutex {
    locks: LockMap,
}

/// One key's lock and the number of guards, held or still waiting, on it.
#[derive(Debug, Default)]
struct Slot {
    lock: Arc<AsyncMutex<()>>,
    users: usize,
}

/// Releases the key when dropped, including while still waiting.
#[derive(Debug)]
pub struct KeyedGuard {
    key: String,
    locks: LockMap,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedMutex {
    /// The process-wide instance shared by all resources.
    pub fn global() -> &'static KeyedMutex {
        &GLOBAL
    }

    pub async fn lock(&self, key: &str) -> KeyedGuard {
        let entry = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = locks.entry(key.to_string()).or_default();
            slot.users += 1;
            Arc::clone(&slot.lock)
        };
        // Built before the wait so a cancelled waiter still gives up its slot.
        let mut held = KeyedGuard {
            key: key.to_string(),
            locks: Arc::clone(&self.locks),
            guard: None,
        };
        tracing::trace!(key, "waiting for lock");
        held.guard = Some(entry.lock_owned().await);
        held
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = locks.get_mut(&self.key) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                locks.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let mutex = KeyedMutex::default();
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let mutex = mutex.clone();
            let active = Arc::clone(&active);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                let _guard = mutex.lock("Projects-1").await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(mutex.is_empty());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let mutex = KeyedMutex::default();
        let _first = mutex.lock("Projects-1").await;
        let second = tokio::time::timeout(Duration::from_millis(100), mutex.lock("Projects-2")).await;
        assert!(second.is_ok());
        assert_eq!(mutex.len(), 2);
    }

    #[tokio::test]
    async fn test_waiter_blocks_until_release() {
        let mutex = KeyedMutex::default();
        let guard = mutex.lock("TagSets-1").await;
        let blocked = tokio::time::timeout(Duration::from_millis(20), mutex.lock("TagSets-1")).await;
        assert!(blocked.is_err());
        drop(guard);
        let acquired = tokio::time::timeout(Duration::from_millis(100), mutex.lock("TagSets-1")).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_entry_removed_after_last_guard() {
        let mutex = KeyedMutex::default();
        {
            let _guard = mutex.lock("LibraryVariableSets-1").await;
            assert_eq!(mutex.len(), 1);
        }
        assert!(mutex.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_releases_entry() {
        let mutex = KeyedMutex::default();
        let holder = mutex.lock("Projects-3").await;

        let waiter = {
            let mutex = mutex.clone();
            tokio::spawn(async move {
                let _guard = mutex.lock("Projects-3").await;
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(mutex.len(), 1);

        drop(holder);
        waiter.abort();
        let _ = waiter.await;

        assert!(mutex.is_empty());
    }

    #[tokio::test]
    async fn test_timed_out_waiter_does_not_outlive_holder() {
        let mutex = KeyedMutex::default();
        let holder = mutex.lock("Environments-2").await;
        let timed_out = tokio::time::timeout(Duration::from_millis(10), mutex.lock("Environments-2")).await;
        assert!(timed_out.is_err());
        assert_eq!(mutex.len(), 1);

        drop(holder);
        assert!(mutex.is_empty());
    }
}
