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

//! Wires the three priority queues to the worker pool (§4.3/§4.9): one
//! named OS thread per queue blocks on `pop_batch`, and for every event in
//! the batch submits a job to the pool that acquires the event's
//! per-client lock, runs the matching handler, and releases it.

use std::sync::Arc;
use std::thread::JoinHandle;

use gateway_common::Event;
use tracing::info;

use crate::dispatch::handlers::handle_event;
use crate::dispatch::locks::ClientLocks;
use crate::dispatch::sinks::{CharacterFlusher, CharacterLoader, ChunkSink, ClientSink};
use crate::dispatch::worker_pool::WorkerPool;
use crate::queue::{EventQueue, EventQueues};
use crate::Caches;

#[derive(Clone)]
struct Sinks {
    client: Arc<dyn ClientSink>,
    chunk: Arc<dyn ChunkSink>,
    loader: Arc<dyn CharacterLoader>,
    flusher: Arc<dyn CharacterFlusher>,
}

pub struct Dispatcher {
    caches: Arc<Caches>,
    queues: EventQueues,
    pool: Arc<WorkerPool>,
    client_locks: Arc<ClientLocks>,
    sinks: Sinks,
    event_batch_size: usize,
    ping_batch_size: usize,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        caches: Arc<Caches>,
        queues: EventQueues,
        client_sink: Arc<dyn ClientSink>,
        chunk_sink: Arc<dyn ChunkSink>,
        loader: Arc<dyn CharacterLoader>,
        flusher: Arc<dyn CharacterFlusher>,
        event_batch_size: usize,
        ping_batch_size: usize,
    ) -> Self {
        Self {
            caches,
            queues,
            pool: Arc::new(WorkerPool::new()),
            client_locks: Arc::new(ClientLocks::new()),
            sinks: Sinks { client: client_sink, chunk: chunk_sink, loader, flusher },
            event_batch_size: event_batch_size.max(1),
            ping_batch_size: ping_batch_size.max(1),
        }
    }

    /// Spawns the three dispatch loop threads and returns a handle to join
    /// them on shutdown. The loops exit on their own once
    /// `EventQueues::close_all` is called and each queue drains.
    pub fn start(&self) -> DispatcherHandles {
        let client_bound = self.spawn_loop("gateway-dispatch-client", self.queues.client_bound.clone(), self.event_batch_size);
        let chunk_bound = self.spawn_loop("gateway-dispatch-chunk", self.queues.chunk_bound.clone(), self.event_batch_size);
        let ping = self.spawn_loop("gateway-dispatch-ping", self.queues.ping.clone(), self.ping_batch_size);
        DispatcherHandles { client_bound, chunk_bound, ping }
    }

    fn spawn_loop(&self, name: &'static str, queue: EventQueue, batch_size: usize) -> JoinHandle<()> {
        let caches = self.caches.clone();
        let pool = self.pool.clone();
        let client_locks = self.client_locks.clone();
        let sinks = self.sinks.clone();

        std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Some(batch) = queue.pop_batch(batch_size) {
                    for event in batch {
                        submit(&pool, &caches, &client_locks, &sinks, event);
                    }
                }
                info!(loop_name = name, "dispatch loop exiting, queue closed");
            })
            .expect("failed to spawn dispatch loop thread")
    }
}

fn submit(pool: &WorkerPool, caches: &Arc<Caches>, client_locks: &Arc<ClientLocks>, sinks: &Sinks, event: Event) {
    let caches = caches.clone();
    let client_locks = client_locks.clone();
    let sinks = sinks.clone();
    pool.spawn(move || {
        let guard = client_locks.acquire(event.client_id);
        let _held = guard.hold();
        handle_event(&event, &caches, sinks.client.as_ref(), sinks.chunk.as_ref(), sinks.loader.as_ref(), sinks.flusher.as_ref());
    });
}

/// Join handles for the three dispatch loops, returned by
/// [`Dispatcher::start`]. Call [`EventQueues::close_all`] first, then join
/// these, so every in-flight job has a chance to finish before the process
/// exits.
pub struct DispatcherHandles {
    pub client_bound: JoinHandle<()>,
    pub chunk_bound: JoinHandle<()>,
    pub ping: JoinHandle<()>,
}

impl DispatcherHandles {
    pub fn join(self) {
        let _ = self.client_bound.join();
        let _ = self.chunk_bound.join();
        let _ = self.ping.join();
    }
}
