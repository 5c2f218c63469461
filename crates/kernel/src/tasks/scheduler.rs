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

//! A min-heap of recurring [`Task`]s driven by a dedicated named thread
//! (§4.2). The thread waits on a `Condvar` with a timeout equal to the
//! heap top's `next_run_time - now`; a `Schedule` that lands an earlier
//! task notifies the condvar so the sleeping worker wakes early instead of
//! running out its old deadline.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gateway_common::Task;
use parking_lot::{Condvar, Mutex};
use tracing::{error, trace};

fn run_logging_panics(task: &mut Task) {
    let task_id = task.id;
    if let Err(panic) = task.run_catching() {
        let msg = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(task_id, %msg, "scheduled task panicked, re-arming");
    }
}

struct Inner {
    heap: Mutex<BinaryHeap<Reverse<Task>>>,
    cv: Condvar,
    running: AtomicBool,
    next_id: AtomicU64,
    /// Shared stop flags keyed by task id, so `remove` need not scan or
    /// rebuild the heap the way the original's `removeTask` does — lazy
    /// deletion happens naturally when the flagged task is popped.
    stop_flags: Mutex<HashMap<u64, Arc<AtomicBool>>>,
}

/// A handle to the running scheduler. Cloning shares the same heap and
/// worker thread.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn start() -> Self {
        let inner = Arc::new(Inner {
            heap: Mutex::new(BinaryHeap::new()),
            cv: Condvar::new(),
            running: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
            stop_flags: Mutex::new(HashMap::new()),
        });

        let thread_inner = inner.clone();
        std::thread::Builder::new()
            .name("gateway-scheduler".to_string())
            .spawn(move || run(thread_inner))
            .expect("failed to spawn scheduler thread");

        Self { inner }
    }

    /// Schedules `job` to run every `interval`, starting one interval from
    /// now. Returns an id usable with [`Scheduler::remove`].
    pub fn schedule(&self, interval: Duration, job: impl FnMut() + Send + 'static) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let task = Task::new(id, interval, job);
        self.inner.stop_flags.lock().insert(id, task.stop_flag());

        let mut heap = self.inner.heap.lock();
        let is_new_earliest = heap.peek().is_none_or(|Reverse(top)| task.next_run_time < top.next_run_time);
        heap.push(Reverse(task));
        drop(heap);

        if is_new_earliest {
            self.inner.cv.notify_all();
        }
        id
    }

    /// Marks the task stopped; it is dropped the next time the scheduler
    /// thread pops it off the heap.
    pub fn remove(&self, id: u64) {
        if let Some(flag) = self.inner.stop_flags.lock().remove(&id) {
            flag.store(true, Ordering::Release);
            self.inner.cv.notify_all();
        }
    }

    pub fn stop(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        self.inner.cv.notify_all();
    }
}

fn run(inner: Arc<Inner>) {
    let mut heap = inner.heap.lock();
    while inner.running.load(Ordering::SeqCst) {
        if heap.is_empty() {
            inner.cv.wait(&mut heap);
            continue;
        }

        let Reverse(top) = heap.peek().expect("checked non-empty above");
        if top.is_stopped() {
            heap.pop();
            continue;
        }

        let now = std::time::Instant::now();
        if now >= top.next_run_time {
            let Reverse(mut task) = heap.pop().expect("checked non-empty above");
            parking_lot::MutexGuard::unlocked(&mut heap, || {
                trace!(task_id = task.id, "running scheduled task");
                run_logging_panics(&mut task);
            });
            heap.push(Reverse(task));
            inner.cv.notify_all();
        } else {
            let wait_for = top.next_run_time - now;
            let timeout_result = inner.cv.wait_for(&mut heap, wait_for);
            if timeout_result.timed_out() {
                // Loop back around: either the top task is now due, or a
                // spurious wake occurred and we'll just re-check the wait.
            }
        }
    }
}
