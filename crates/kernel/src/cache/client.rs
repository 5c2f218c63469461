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

//! The Client cache (§4.5). Clients begin life empty at startup and are
//! populated per-connection on `joinGame`. Dual-indexed by `client_id` and
//! by socket address so the frontend can resolve a disconnecting socket
//! back to a client id, and handlers can resolve a client id back to the
//! socket to reply on.

use std::collections::HashMap;
use std::net::SocketAddr;

use gateway_common::Client;
use parking_lot::RwLock;

#[derive(Default)]
struct Inner {
    by_id: HashMap<i64, Client>,
    by_socket: HashMap<SocketAddr, i64>,
}

/// Invariant: for every `c` in `by_id`, `by_socket[c.socket_addr] == c.client_id`.
/// Both maps are mutated together under one write-lock region so that
/// invariant never observes a half-updated state from another thread.
#[derive(Default)]
pub struct ClientCache {
    inner: RwLock<Inner>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, client_id: i64) -> Option<Client> {
        self.inner.read().by_id.get(&client_id).cloned()
    }

    pub fn get_by_socket(&self, socket: &SocketAddr) -> Option<Client> {
        let inner = self.inner.read();
        let client_id = *inner.by_socket.get(socket)?;
        inner.by_id.get(&client_id).cloned()
    }

    pub fn get_all(&self) -> Vec<Client> {
        self.inner.read().by_id.values().cloned().collect()
    }

    pub fn upsert(&self, client: Client) {
        let mut inner = self.inner.write();
        if let Some(previous) = inner.by_id.get(&client.client_id) {
            if previous.socket_addr != client.socket_addr {
                inner.by_socket.remove(&previous.socket_addr);
            }
        }
        inner.by_socket.insert(client.socket_addr, client.client_id);
        inner.by_id.insert(client.client_id, client);
    }

    pub fn remove(&self, client_id: i64) -> Option<Client> {
        let mut inner = self.inner.write();
        let client = inner.by_id.remove(&client_id)?;
        inner.by_socket.remove(&client.socket_addr);
        Some(client)
    }

    pub fn remove_by_socket(&self, socket: &SocketAddr) -> Option<Client> {
        let mut inner = self.inner.write();
        let client_id = inner.by_socket.remove(socket)?;
        inner.by_id.remove(&client_id)
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
    use pretty_assertions::assert_eq;

    fn client(id: i64, port: u16) -> Client {
        Client::new(id, "hash".to_string(), format!("127.0.0.1:{port}").parse().unwrap())
    }

    #[test]
    fn dual_index_consistency_holds_after_upsert() {
        let cache = ClientCache::new();
        let c = client(1, 9001);
        cache.upsert(c.clone());
        assert_eq!(cache.get(1), Some(c.clone()));
        assert_eq!(cache.get_by_socket(&c.socket_addr), Some(c));
    }

    #[test]
    fn remove_by_socket_clears_both_indexes() {
        let cache = ClientCache::new();
        let c = client(2, 9002);
        cache.upsert(c.clone());
        let removed = cache.remove_by_socket(&c.socket_addr).unwrap();
        assert_eq!(removed.client_id, 2);
        assert_eq!(cache.get(2), None);
        assert_eq!(cache.get_by_socket(&c.socket_addr), None);
    }

    #[test]
    fn reinserting_same_client_at_new_socket_drops_old_socket_mapping() {
        let cache = ClientCache::new();
        let c1 = client(3, 9003);
        cache.upsert(c1.clone());
        let mut c2 = client(3, 9004);
        c2.client_id = 3;
        cache.upsert(c2.clone());
        assert_eq!(cache.get_by_socket(&c1.socket_addr), None);
        assert_eq!(cache.get_by_socket(&c2.socket_addr), Some(c2));
    }
}
