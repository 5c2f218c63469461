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

//! The client-facing TCP frontend (§4.7): one acceptor loop handing each
//! accepted socket to a per-connection read/write pair, and a
//! `ClientRegistry` that implements `ClientSink` over those connections'
//! write halves. Adapted from `telnet-host`'s `Listener`/`TcpConnection`
//! split — `Framed::split()` into a `SplitSink`/`SplitStream`, a
//! `tokio::select!` race between shutdown and the read half, one task per
//! connection.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use gateway_codec::{ClientFrame, GatewayCodec};
use gateway_common::{Event, EventPayload, EventType};
use gateway_kernel::dispatch::{route_frame, ClientSink};
use gateway_kernel::{Caches, EventQueues};
use parking_lot::RwLock;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Framed;
use tracing::{info, warn};

/// Implements `ClientSink` over every live connection's outbound channel.
/// Sending to a socket that has since disconnected is not an error here —
/// the per-connection task's own exit path is what unregisters it, and a
/// handler racing that exit just finds nothing to send to.
#[derive(Default)]
pub struct ClientRegistry {
    senders: RwLock<HashMap<SocketAddr, mpsc::UnboundedSender<ClientFrame>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, socket: SocketAddr, sender: mpsc::UnboundedSender<ClientFrame>) {
        self.senders.write().insert(socket, sender);
    }

    fn unregister(&self, socket: &SocketAddr) {
        self.senders.write().remove(socket);
    }
}

impl ClientSink for ClientRegistry {
    fn send(&self, socket: SocketAddr, frame: String) {
        let sender = self.senders.read().get(&socket).cloned();
        match sender {
            Some(sender) => {
                if sender.send(ClientFrame(frame)).is_err() {
                    warn!(%socket, "client write channel closed, dropping frame");
                }
            }
            None => warn!(%socket, "no live connection for socket, dropping frame"),
        }
    }
}

/// Accepts connections on `listener` until `shutdown` flips to `true`,
/// spawning one task per accepted socket. Returns once the listener loop
/// itself has exited — in-flight per-connection tasks are not waited on
/// here, matching `telnet-host::listen`'s fire-and-forget `tokio::spawn`
/// per accepted connection.
pub async fn run_acceptor(
    listener: TcpListener,
    queues: EventQueues,
    caches: Arc<Caches>,
    registry: Arc<ClientRegistry>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("client acceptor shutting down");
                    break;
                }
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer_addr)) => {
                        let queues = queues.clone();
                        let caches = caches.clone();
                        let registry = registry.clone();
                        tokio::spawn(async move {
                            handle_connection(stream, peer_addr, queues, caches, registry).await;
                        });
                    }
                    Err(err) => warn!(error = %err, "failed to accept client connection"),
                }
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, queues: EventQueues, caches: Arc<Caches>, registry: Arc<ClientRegistry>) {
    info!(%peer_addr, "client connected");
    let framed = Framed::new(stream, GatewayCodec::new());
    let (mut write, mut read) = framed.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<ClientFrame>();
    registry.register(peer_addr, tx);

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if write.send(frame).await.is_err() {
                break;
            }
        }
    });

    while let Some(decoded) = read.next().await {
        match decoded {
            Ok(raw) => {
                route_frame(&raw, false, Some(peer_addr), &queues);
            }
            Err(err) => {
                warn!(%peer_addr, error = %err, "client read error, closing connection");
                break;
            }
        }
    }

    registry.unregister(&peer_addr);
    writer.abort();
    enqueue_disconnect(peer_addr, &caches, &queues);
    info!(%peer_addr, "client disconnected");
}

/// A TCP-level disconnect isn't a wire frame, so it can't go through
/// `route_frame`. Build both disconnect events directly: the client-bound
/// one carries the origin socket, the chunk-bound one doesn't need it
/// since the chunk peer has no per-client addressing. §4.7: both events
/// are always enqueued, even for a socket that never completed
/// `joinGame` — `clientId` falls back to 0 in that case.
fn enqueue_disconnect(peer_addr: SocketAddr, caches: &Arc<Caches>, queues: &EventQueues) {
    let client_id = caches.clients.get_by_socket(&peer_addr).map(|c| c.client_id).unwrap_or(0);
    queues
        .client_bound
        .push(Event::new(EventType::DisconnectClient, client_id, EventPayload::Empty, Some(peer_addr)));
    queues
        .chunk_bound
        .push(Event::new(EventType::DisconnectClientChunk, client_id, EventPayload::Empty, None));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn socket(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    #[test]
    fn send_to_unregistered_socket_does_not_panic() {
        let registry = ClientRegistry::new();
        registry.send(socket(9000), "hello".to_string());
    }

    #[test]
    fn send_to_registered_socket_delivers_frame() {
        let registry = ClientRegistry::new();
        let addr = socket(9001);
        let (tx, mut rx) = mpsc::unbounded_channel::<ClientFrame>();
        registry.register(addr, tx);

        registry.send(addr, "hello".to_string());

        let frame = rx.try_recv().expect("frame delivered");
        assert_eq!(frame.0, "hello");
    }

    #[test]
    fn unregister_stops_further_delivery() {
        let registry = ClientRegistry::new();
        let addr = socket(9002);
        let (tx, mut rx) = mpsc::unbounded_channel::<ClientFrame>();
        registry.register(addr, tx);
        registry.unregister(&addr);

        registry.send(addr, "too late".to_string());

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn enqueue_disconnect_still_fires_both_events_with_client_id_zero_for_unjoined_socket() {
        let caches = Arc::new(Caches::default());
        let queues = EventQueues::new();

        enqueue_disconnect(socket(9003), &caches, &queues);

        let client_event = queues.client_bound.pop().expect("client-bound disconnect enqueued");
        assert_eq!(client_event.client_id, 0);
        let chunk_event = queues.chunk_bound.pop().expect("chunk-bound disconnect enqueued");
        assert_eq!(chunk_event.client_id, 0);
    }
}
