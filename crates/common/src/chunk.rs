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

/// A peer chunk-server registration: the bounded region of the world that
/// peer simulates, plus the socket it is reachable on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    pub id: i64,
    pub ip: String,
    pub port: u16,
    pub pos_x: f32,
    pub pos_y: f32,
    pub pos_z: f32,
    pub size_x: f32,
    pub size_y: f32,
    pub size_z: f32,
    pub socket_addr: Option<SocketAddr>,
}
