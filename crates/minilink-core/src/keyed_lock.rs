use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async mutual exclusion scoped to a string key.
///
/// Callers locking different keys never wait on each other. A key's mutex is
/// created on first use and dropped from the map once nobody holds or awaits
/// it, so the map only grows with the number of contended keys.
#[derive(Debug, Default)]
pub struct KeyedMutex {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the lock for `key` is free and takes it.
    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let mutex = Arc::clone(self.locks.entry(key.to_owned()).or_default().value());
        let guard = mutex.lock_owned().await;

        KeyedGuard {
            owner: self,
            key: key.to_owned(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently locked or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Holds the lock for one key; releases it on drop.
#[derive(Debug)]
pub struct KeyedGuard<'a> {
    owner: &'a KeyedMutex,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        // Release first so the map holds the last reference when uncontended.
        drop(self.guard.take());
        self.owner
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = Arc::new(KeyedMutex::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("http://a.com").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedMutex::new();
        let _a = locks.lock("http://a.com").await;

        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("http://b.com")).await;
        assert!(b.is_ok(), "locking another key should not wait");
    }

    #[tokio::test]
    async fn released_keys_are_forgotten() {
        let locks = KeyedMutex::new();
        {
            let _guard = locks.lock("http://a.com").await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }
}
