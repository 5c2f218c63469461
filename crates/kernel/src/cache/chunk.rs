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

//! The Chunk cache (§4.5). Loaded fully from the database at startup;
//! read-mostly thereafter. Only one chunk peer is actually connected at a
//! time in this gateway (§4.8), but the cache still holds every known
//! chunk server record so `getConnectedCharacters`-style lookups can
//! resolve a `chunkId` to its coordinates without a DB round trip.

use std::collections::HashMap;
use std::net::SocketAddr;

use gateway_common::Chunk;
use parking_lot::RwLock;

#[derive(Default)]
struct Inner {
    by_id: HashMap<i64, Chunk>,
    by_socket: HashMap<SocketAddr, i64>,
}

/// Invariant: for every `c` in `by_id` with `c.socket_addr == Some(s)`,
/// `by_socket[s] == c.id` (§3: "Chunk ... Indexed by id and by socket,
/// same dual-index invariant" as `Client`, see `ClientCache`). Most rows
/// have no live socket at all — only the one the gateway is currently
/// connected to (§4.8) does, and `ChunkPeer` is the sole writer of that
/// field via [`ChunkCache::set_socket`].
#[derive(Default)]
pub struct ChunkCache {
    inner: RwLock<Inner>,
}

impl ChunkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chunk_id: i64) -> Chunk {
        self.inner.read().by_id.get(&chunk_id).cloned().unwrap_or_default()
    }

    pub fn get_by_socket(&self, socket: &SocketAddr) -> Option<Chunk> {
        let inner = self.inner.read();
        let chunk_id = *inner.by_socket.get(socket)?;
        inner.by_id.get(&chunk_id).cloned()
    }

    pub fn get_all(&self) -> Vec<Chunk> {
        self.inner.read().by_id.values().cloned().collect()
    }

    pub fn upsert(&self, chunk: Chunk) {
        let mut inner = self.inner.write();
        if let Some(previous) = inner.by_id.get(&chunk.id) {
            if let Some(prev_socket) = previous.socket_addr {
                if previous.socket_addr != chunk.socket_addr {
                    inner.by_socket.remove(&prev_socket);
                }
            }
        }
        if let Some(socket) = chunk.socket_addr {
            inner.by_socket.insert(socket, chunk.id);
        }
        inner.by_id.insert(chunk.id, chunk);
    }

    pub fn remove(&self, chunk_id: i64) -> Option<Chunk> {
        let mut inner = self.inner.write();
        let chunk = inner.by_id.remove(&chunk_id)?;
        if let Some(socket) = chunk.socket_addr {
            inner.by_socket.remove(&socket);
        }
        Some(chunk)
    }

    pub fn load_all(&self, chunks: impl IntoIterator<Item = Chunk>) {
        let mut inner = self.inner.write();
        inner.by_id.clear();
        inner.by_socket.clear();
        for chunk in chunks {
            if let Some(socket) = chunk.socket_addr {
                inner.by_socket.insert(socket, chunk.id);
            }
            inner.by_id.insert(chunk.id, chunk);
        }
    }

    /// Finds the configured chunk row whose `ip`/`port` match the
    /// chunk-peer's connect target, so `ChunkPeer` can learn which `id` to
    /// attach its live socket to once connected (§4.8).
    pub fn find_by_address(&self, ip: &str, port: u16) -> Option<Chunk> {
        self.inner.read().by_id.values().find(|c| c.ip == ip && c.port == port).cloned()
    }

    /// Sets (or clears, with `None`) the live socket for `chunk_id`,
    /// maintaining the dual-index invariant the same way [`Self::upsert`]
    /// does. A no-op if `chunk_id` isn't cached.
    pub fn set_socket(&self, chunk_id: i64, socket: Option<SocketAddr>) {
        let mut inner = self.inner.write();
        let Some(previous_socket) = inner.by_id.get(&chunk_id).map(|c| c.socket_addr) else {
            return;
        };
        if let Some(prev) = previous_socket {
            inner.by_socket.remove(&prev);
        }
        if let Some(new_socket) = socket {
            inner.by_socket.insert(new_socket, chunk_id);
        }
        if let Some(chunk) = inner.by_id.get_mut(&chunk_id) {
            chunk.socket_addr = socket;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn socket(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    #[test]
    fn load_all_replaces_prior_contents() {
        let cache = ChunkCache::new();
        cache.upsert(Chunk { id: 1, ..Default::default() });
        cache.load_all(vec![Chunk { id: 2, ..Default::default() }]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).id, 0, "stale entry must not survive a reload");
        assert_eq!(cache.get(2).id, 2);
    }

    #[test]
    fn dual_index_consistency_holds_after_upsert_with_socket() {
        let cache = ChunkCache::new();
        let addr = socket(9500);
        cache.upsert(Chunk { id: 1, ip: "127.0.0.1".into(), port: 9500, socket_addr: Some(addr), ..Default::default() });
        assert_eq!(cache.get(1).socket_addr, Some(addr));
        assert_eq!(cache.get_by_socket(&addr).map(|c| c.id), Some(1));
    }

    #[test]
    fn set_socket_updates_both_indexes_and_can_clear() {
        let cache = ChunkCache::new();
        cache.upsert(Chunk { id: 1, ip: "127.0.0.1".into(), port: 9501, ..Default::default() });
        let addr = socket(9501);

        cache.set_socket(1, Some(addr));
        assert_eq!(cache.get_by_socket(&addr).map(|c| c.id), Some(1));
        assert_eq!(cache.get(1).socket_addr, Some(addr));

        cache.set_socket(1, None);
        assert_eq!(cache.get_by_socket(&addr), None);
        assert_eq!(cache.get(1).socket_addr, None);
    }

    #[test]
    fn set_socket_on_reconnect_drops_the_previous_mapping() {
        let cache = ChunkCache::new();
        cache.upsert(Chunk { id: 1, ip: "127.0.0.1".into(), port: 9502, ..Default::default() });
        let first = socket(9502);
        let second = socket(9503);

        cache.set_socket(1, Some(first));
        cache.set_socket(1, Some(second));

        assert_eq!(cache.get_by_socket(&first), None);
        assert_eq!(cache.get_by_socket(&second).map(|c| c.id), Some(1));
    }

    #[test]
    fn find_by_address_matches_ip_and_port() {
        let cache = ChunkCache::new();
        cache.upsert(Chunk { id: 7, ip: "10.0.0.5".into(), port: 9000, ..Default::default() });
        assert_eq!(cache.find_by_address("10.0.0.5", 9000).map(|c| c.id), Some(7));
        assert!(cache.find_by_address("10.0.0.5", 9001).is_none());
    }

    #[test]
    fn set_socket_is_a_noop_for_unknown_chunk() {
        let cache = ChunkCache::new();
        cache.set_socket(99, Some(socket(9999)));
        assert!(cache.get_by_socket(&socket(9999)).is_none());
    }
}
