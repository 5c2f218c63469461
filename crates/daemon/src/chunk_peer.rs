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

//! The single, long-lived outbound link to the chunk server (§4.8).
//! Grounded on the original `ChunkServerWorker`'s connect/reconnect loop:
//! one socket, reconnected under exponential backoff on failure, giving up
//! and exiting the process once `max_retry_count` is exhausted (§7
//! `Fatal`). Every outbound frame is serialized through one channel so two
//! handlers forwarding concurrently never interleave partial writes.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gateway_codec::{ChunkFrame, GatewayCodec};
use gateway_kernel::dispatch::{route_frame, ChunkSink};
use gateway_kernel::{Caches, EventQueues};
use parking_lot::RwLock;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Framed;
use tracing::{error, info, warn};

#[derive(Default)]
pub struct ChunkPeer {
    sender: RwLock<Option<mpsc::UnboundedSender<ChunkFrame>>>,
}

impl ChunkPeer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn set_sender(&self, sender: Option<mpsc::UnboundedSender<ChunkFrame>>) {
        *self.sender.write() = sender;
    }

    /// Connects to `host:port`, reconnecting under exponential backoff
    /// (`retry_base_seconds * 2^attempt`) whenever the link drops. Exits
    /// the process after `max_retry_count` consecutive failed attempts —
    /// there is no sense running a gateway with no chunk server behind it.
    /// Sets the matching `Chunk` row's `socket_addr` (§3, §4.8) for the
    /// duration of each live connection, so `ChunkCache` lookups reflect
    /// reality instead of always reporting no live socket.
    pub async fn run(
        self: Arc<Self>,
        host: String,
        port: u16,
        retry_base_seconds: u64,
        max_retry_count: u32,
        queues: EventQueues,
        caches: Arc<Caches>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let addr = format!("{host}:{port}");
        let mut attempt: u32 = 0;
        let target_chunk_id = caches.chunks.find_by_address(&host, port).map(|c| c.id);

        loop {
            if *shutdown.borrow() {
                return;
            }

            match TcpStream::connect(&addr).await {
                Ok(stream) => {
                    attempt = 0;
                    info!(%addr, "connected to chunk server");
                    let peer_addr = stream.peer_addr().ok();
                    if let Some(id) = target_chunk_id {
                        caches.chunks.set_socket(id, peer_addr);
                    }
                    self.clone().drive(stream, queues.clone(), &mut shutdown).await;
                    self.set_sender(None);
                    if let Some(id) = target_chunk_id {
                        caches.chunks.set_socket(id, None);
                    }
                    if *shutdown.borrow() {
                        return;
                    }
                    warn!(%addr, "chunk server connection lost, reconnecting");
                }
                Err(err) => {
                    attempt += 1;
                    if attempt > max_retry_count {
                        error!(%addr, attempts = attempt, error = %err, "exhausted chunk server reconnect attempts, exiting");
                        std::process::exit(1);
                    }
                    let backoff = Duration::from_secs(retry_base_seconds.saturating_mul(1 << attempt.min(16)));
                    warn!(%addr, attempt, backoff_secs = backoff.as_secs(), error = %err, "chunk server connect failed, retrying");
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Runs one connection's writer and reader halves until either closes
    /// or shutdown is signaled.
    async fn drive(self: Arc<Self>, stream: TcpStream, queues: EventQueues, shutdown: &mut watch::Receiver<bool>) {
        let framed = Framed::new(stream, GatewayCodec::new());
        let (mut write, mut read) = framed.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<ChunkFrame>();
        self.set_sender(Some(tx));

        let writer = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if write.send(frame).await.is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                decoded = read.next() => {
                    match decoded {
                        Some(Ok(raw)) => {
                            route_frame(&raw, true, None, &queues);
                        }
                        Some(Err(err)) => {
                            warn!(error = %err, "chunk link read error");
                            break;
                        }
                        None => break,
                    }
                }
            }
        }
        writer.abort();
    }
}

impl ChunkSink for ChunkPeer {
    fn send(&self, frame: String) {
        let sender = self.sender.read().clone();
        match sender {
            Some(sender) => {
                if sender.send(ChunkFrame(frame)).is_err() {
                    warn!("chunk write channel closed, dropping frame");
                }
            }
            None => warn!("no live chunk server connection, dropping frame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_with_no_connection_does_not_panic() {
        let peer = ChunkPeer::new();
        peer.send("hello".to_string());
    }

    #[test]
    fn send_delivers_through_the_current_sender() {
        let peer = ChunkPeer::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<ChunkFrame>();
        peer.set_sender(Some(tx));

        peer.send("hello".to_string());

        let frame = rx.try_recv().expect("frame delivered");
        assert_eq!(frame.0, "hello");
    }

    #[test]
    fn backoff_grows_exponentially_and_is_capped() {
        let backoff_for = |attempt: u32| Duration::from_secs(5u64.saturating_mul(1 << attempt.min(16)));

        assert_eq!(backoff_for(1), Duration::from_secs(10));
        assert_eq!(backoff_for(2), Duration::from_secs(20));
        assert_eq!(backoff_for(3), Duration::from_secs(40));
        // The shift is capped at 16 so a long string of failures can't overflow it.
        assert_eq!(backoff_for(100), backoff_for(16));
    }
}
