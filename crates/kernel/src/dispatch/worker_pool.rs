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

//! The fixed-size handler worker pool (§4.9): a `rayon::ThreadPool` sized
//! to the machine rather than to any one queue, fed by the three dispatch
//! loops in [`crate::dispatch::dispatcher`].

use std::thread::available_parallelism;

pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    pub fn new() -> Self {
        let workers = available_parallelism().map(|n| n.get()).unwrap_or(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("gateway-worker-{i}"))
            .build()
            .expect("failed to build handler worker pool");
        Self { pool }
    }

    pub fn with_workers(workers: usize) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("gateway-worker-{i}"))
            .build()
            .expect("failed to build handler worker pool");
        Self { pool }
    }

    pub fn spawn(&self, job: impl FnOnce() + Send + 'static) {
        self.pool.spawn(job);
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn spawned_jobs_all_run() {
        let pool = WorkerPool::with_workers(2);
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = flume::unbounded();
        for _ in 0..20 {
            let counter = counter.clone();
            let tx = tx.clone();
            pool.spawn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = tx.send(());
            });
        }
        for _ in 0..20 {
            rx.recv_timeout(std::time::Duration::from_secs(2)).unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }
}
