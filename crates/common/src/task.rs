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

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A recurring job owned by the scheduler's min-heap. Compares only on
/// `next_run_time` (ascending) so a `BinaryHeap<Reverse<Task>>` pops the
/// soonest-due task first.
pub struct Task {
    pub id: u64,
    pub interval: Duration,
    pub next_run_time: Instant,
    stop_flag: Arc<AtomicBool>,
    job: Box<dyn FnMut() + Send>,
}

impl Task {
    pub fn new(id: u64, interval: Duration, job: impl FnMut() + Send + 'static) -> Self {
        Self {
            id,
            interval,
            next_run_time: Instant::now() + interval,
            stop_flag: Arc::new(AtomicBool::new(false)),
            job: Box::new(job),
        }
    }

    /// A handle callers can use to ask the scheduler to drop this task
    /// (lazy deletion: the heap entry is skipped on pop rather than
    /// removed in place).
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    /// Runs the job once and advances `next_run_time` by `interval`,
    /// measured from the run rather than the old deadline so a slow task
    /// cannot schedule itself into a backlog.
    pub fn run(&mut self) {
        (self.job)();
        self.next_run_time = Instant::now() + self.interval;
    }

    /// Runs the job, catching a panic so one failing task can't take the
    /// scheduler thread down with it. `next_run_time` advances either way
    /// so a panicking task is re-armed rather than retried in a tight
    /// loop. Returns the panic payload, if any, for the caller to log.
    pub fn run_catching(&mut self) -> Result<(), Box<dyn std::any::Any + Send>> {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (self.job)()));
        self.next_run_time = Instant::now() + self.interval;
        result
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("interval", &self.interval)
            .field("next_run_time", &self.next_run_time)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.next_run_time == other.next_run_time
    }
}

impl Eq for Task {}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Task {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.next_run_time.cmp(&other.next_run_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn run_invokes_job_and_reschedules() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let mut task = Task::new(1, Duration::from_millis(10), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let before = task.next_run_time;
        task.run();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(task.next_run_time >= before);
    }

    #[test]
    fn stop_flag_is_observable_after_clone() {
        let task = Task::new(1, Duration::from_secs(1), || {});
        let flag = task.stop_flag();
        assert!(!task.is_stopped());
        flag.store(true, Ordering::Release);
        assert!(task.is_stopped());
    }

    #[test]
    fn ordering_is_by_next_run_time() {
        let soon = Task::new(1, Duration::from_secs(1), || {});
        std::thread::sleep(Duration::from_millis(5));
        let later = Task::new(2, Duration::from_secs(100), || {});
        assert!(soon < later);
    }
}
