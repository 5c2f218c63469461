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

use std::net::SocketAddr;

/// A live TCP client. Created on a successful `joinGame`, destroyed on
/// disconnect. `socket_addr` is the dual-index key used by the client
/// cache's socket -> clientId lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub client_id: i64,
    pub session_key: String,
    pub socket_addr: SocketAddr,
    pub character_id: i64,
}

impl Client {
    pub fn new(client_id: i64, session_key: String, socket_addr: SocketAddr) -> Self {
        Self { client_id, session_key, socket_addr, character_id: 0 }
    }
}
