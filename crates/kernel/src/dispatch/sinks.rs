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

//! Small service interfaces injected into [`crate::dispatch::Dispatcher`] at
//! construction (§9). Handlers need to write frames back to a client
//! socket, forward a frame to the chunk peer, and occasionally touch
//! Postgres — but `gateway-kernel` has no socket and no SQL dependency of
//! its own. Rather than give the dispatcher a back-pointer into
//! `gateway-daemon`'s network and database layers (a cycle: daemon owns
//! the dispatcher, dispatcher would own daemon's transports), the daemon
//! implements these traits over its real connections and hands trait
//! objects down instead.

use std::net::SocketAddr;

use gateway_common::Character;

/// Writes one framed response to a connected client, addressed by socket
/// since that's what every event carries regardless of whether the client
/// has joined a character yet. A missing/closed socket is not an error
/// here — the implementation logs and drops, matching a disconnect race
/// that the frontend's own disconnect handling will already be unwinding.
pub trait ClientSink: Send + Sync {
    fn send(&self, socket: SocketAddr, frame: String);
}

/// Forwards one frame to the single outbound chunk-server link. The
/// implementation serializes concurrent sends (§4.8) so two handlers
/// racing to forward never interleave partial frames on the wire.
pub trait ChunkSink: Send + Sync {
    fn send(&self, frame: String);
}

/// Loads a character by id from Postgres, bridging the dispatcher's
/// synchronous, rayon-pool-driven handlers with the daemon's async
/// `gateway-db` repository. Returns `Character::default()` (the `id == 0`
/// `CacheMiss` sentinel, §7) on a database error as well as a genuine
/// miss — a handler can't tell the two apart, and it would refuse the join
/// either way.
pub trait CharacterLoader: Send + Sync {
    fn load_character(&self, character_id: i64) -> Character;
}

/// Flushes one character to Postgres outside the periodic scheduler tick
/// — used on disconnect (§5's "the Character row is flushed once"
/// scenario), where waiting for the next tick would needlessly widen the
/// window for a lost update. Implementations clear the cache's dirty flag
/// themselves via `CharacterCache::clear_dirty_if_unchanged` after a
/// successful write.
pub trait CharacterFlusher: Send + Sync {
    fn flush(&self, character: Character);
}
