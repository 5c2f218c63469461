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

//! A many-producer, many-consumer FIFO of `Event`s (§4.3). Priority between
//! event classes is expressed by standing up three independent queues
//! (client-bound, chunk-bound, ping) rather than by priority within one —
//! see [`EventQueues`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gateway_common::Event;

/// Poll interval for a closed-queue check between `recv_timeout` attempts.
/// `Close()` is observed within one tick of this, not instantaneously —
/// close enough for a shutdown path that already waits on thread joins.
const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Thread-safe FIFO backed by `flume`, shared across every clone via a
/// `closed` flag so `Close()` affects all producers and consumers
/// regardless of how many handles have been cloned out.
#[derive(Clone)]
pub struct EventQueue {
    sender: flume::Sender<Event>,
    receiver: flume::Receiver<Event>,
    closed: Arc<AtomicBool>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver, closed: Arc::new(AtomicBool::new(false)) }
    }

    pub fn push(&self, event: Event) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let _ = self.sender.send(event);
    }

    pub fn push_batch(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.push(event);
        }
    }

    /// Blocks until an event is available or the queue is closed, in which
    /// case it returns `None` (the original's `Pop` returning `false`).
    pub fn pop(&self) -> Option<Event> {
        loop {
            match self.receiver.recv_timeout(CLOSE_POLL_INTERVAL) {
                Ok(event) => return Some(event),
                Err(flume::RecvTimeoutError::Timeout) => {
                    if self.closed.load(Ordering::Acquire) {
                        return None;
                    }
                }
                Err(flume::RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Blocks until at least one event is available, then drains up to
    /// `max` without blocking further. Returns `None` once closed and
    /// drained.
    pub fn pop_batch(&self, max: usize) -> Option<Vec<Event>> {
        let first = self.pop()?;
        let mut batch = Vec::with_capacity(max);
        batch.push(first);
        while batch.len() < max {
            match self.receiver.try_recv() {
                Ok(event) => batch.push(event),
                Err(_) => break,
            }
        }
        Some(batch)
    }

    /// Marks the queue closed. Blocked `pop`/`pop_batch` callers observe
    /// this within `CLOSE_POLL_INTERVAL` and return `None`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// The three priority lanes of §4.3/§4.9: client-bound, chunk-bound, and
/// ping. Kept as a bundle so the dispatcher can hold one handle instead of
/// three loose queues.
#[derive(Clone, Default)]
pub struct EventQueues {
    pub client_bound: EventQueue,
    pub chunk_bound: EventQueue,
    pub ping: EventQueue,
}

impl EventQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close_all(&self) {
        self.client_bound.close();
        self.chunk_bound.close();
        self.ping.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_common::{EventPayload, EventType};

    fn ev(client_id: i64) -> Event {
        Event::new(EventType::PingClient, client_id, EventPayload::Empty, None)
    }

    #[test]
    fn push_batch_then_pop_batch_preserves_order() {
        let q = EventQueue::new();
        let batch: Vec<Event> = (0..5).map(ev).collect();
        q.push_batch(batch.clone());
        let popped = q.pop_batch(5).unwrap();
        let ids: Vec<i64> = popped.iter().map(|e| e.client_id).collect();
        let expected: Vec<i64> = batch.iter().map(|e| e.client_id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn pop_batch_caps_at_max_leaving_remainder_queued() {
        let q = EventQueue::new();
        q.push_batch((0..10).map(ev));
        let first = q.pop_batch(4).unwrap();
        assert_eq!(first.len(), 4);
        assert_eq!(q.len(), 6);
    }

    #[test]
    fn closed_queue_wakes_blocked_pop_with_none() {
        let q = EventQueue::new();
        let q2 = q.clone();
        let handle = std::thread::spawn(move || q2.pop());
        std::thread::sleep(Duration::from_millis(10));
        q.close();
        assert!(handle.join().unwrap().is_none());
    }

    #[test]
    fn push_after_close_is_dropped() {
        let q = EventQueue::new();
        q.close();
        q.push(ev(1));
        assert_eq!(q.len(), 0);
    }
}
