// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named advisory mutexes.
//!
//! One lock per category, not per row: two reservation requests on disjoint
//! patterns still run one after the other.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// Serializes every Lease Engine mutation.
pub const RESERVATIONS: &str = "reservations";
/// Serializes every Message Dispatcher mutation.
pub const MESSAGES: &str = "messages";
/// Serializes link creation.
pub const LINKS: &str = "links";

/// Registry of named async mutexes. Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct NamedLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl NamedLocks {
    /// An empty registry. Locks are created on first use.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &str) -> Arc<Mutex<()>> {
        self.locks.entry(name.to_string()).or_default().clone()
    }

    /// Wait for the named lock and hold it until the guard drops.
    pub async fn acquire(&self, name: &str) -> OwnedMutexGuard<()> {
        trace!(lock = name, "acquiring");
        let guard = self.slot(name).lock_owned().await;
        trace!(lock = name, "acquired");
        guard
    }

    /// Run `fut` while holding the named lock.
    pub async fn with_lock<F, T>(&self, name: &str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let _guard = self.acquire(name).await;
        fut.await
    }

    /// Whether someone currently holds the named lock.
    pub fn is_held(&self, name: &str) -> bool {
        self.locks
            .get(name)
            .is_some_and(|slot| slot.try_lock().is_err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn is_held_tracks_guard_lifetime() {
        let locks = NamedLocks::new();
        assert!(!locks.is_held(RESERVATIONS));

        let guard = locks.acquire(RESERVATIONS).await;
        assert!(locks.is_held(RESERVATIONS));
        assert!(!locks.is_held(MESSAGES));

        drop(guard);
        assert!(!locks.is_held(RESERVATIONS));
    }

    #[tokio::test]
    async fn with_lock_returns_the_future_output() {
        let locks = NamedLocks::new();
        let value = locks.with_lock(MESSAGES, async { 41 + 1 }).await;
        assert_eq!(value, 42);
        assert!(!locks.is_held(MESSAGES));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_name_serializes_callers() {
        let locks = NamedLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                locks
                    .with_lock(RESERVATIONS, async {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_names_do_not_block_each_other() {
        let locks = NamedLocks::new();
        let _reservations = locks.acquire(RESERVATIONS).await;
        let messages = tokio::time::timeout(Duration::from_millis(100), locks.acquire(MESSAGES)).await;
        assert!(messages.is_ok());
    }
}
