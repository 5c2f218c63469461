// Copyright (C) 2026 the sharded-gateway contributors. This program is free
// software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation,
// version 3.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program. If not, see <https://www.gnu.org/licenses/>.

//! Per-clientId handler serialization (§5): the worker pool runs many
//! handlers concurrently, but two events for the same client must never
//! execute their bodies at the same time, or a `moveCharacter` racing a
//! `disconnectClient` could resurrect a character the other just flushed
//! and evicted. One `parking_lot::Mutex` per client id, held for the
//! handler's whole body, gives that ordering without serializing unrelated
//! clients against each other.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

#[derive(Default)]
pub struct ClientLocks {
    locks: RwLock<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ClientLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, client_id: i64) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().get(&client_id) {
            return lock.clone();
        }
        self.locks.write().entry(client_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Blocks until no other handler is running for `client_id`, then
    /// returns a guard that keeps it locked until dropped.
    pub fn acquire(&self, client_id: i64) -> ClientGuard {
        let lock = self.lock_for(client_id);
        ClientGuard { lock }
    }
}

/// Holds the per-client lock for the lifetime of a handler invocation.
/// `'static` to let the dispatcher move it into a `rayon::spawn` closure
/// alongside the event.
pub struct ClientGuard {
    lock: Arc<Mutex<()>>,
}

impl ClientGuard {
    pub fn hold(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn same_client_id_serializes_across_threads() {
        let locks = Arc::new(ClientLocks::new());
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let concurrent = concurrent.clone();
                let max_seen = max_seen.clone();
                std::thread::spawn(move || {
                    let guard = locks.acquire(1);
                    let _held = guard.hold();
                    let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(5));
                    concurrent.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn different_client_ids_run_concurrently() {
        let locks = Arc::new(ClientLocks::new());
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let locks = locks.clone();
                let concurrent = concurrent.clone();
                let max_seen = max_seen.clone();
                std::thread::spawn(move || {
                    let guard = locks.acquire(i);
                    let _held = guard.hold();
                    let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    concurrent.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(max_seen.load(Ordering::SeqCst) > 1);
    }
}
